//! Observable events emitted by the fault distributor.
//!
//! Events are explicit and typed; the logger only ever sees their
//! string names.

use std::fmt;

/// Observable events in faultline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Distributor lifecycle
    /// Dispatch worker started
    DistributorStart,
    /// Shutdown requested
    ShutdownStart,
    /// Worker joined, no further handler invocations
    ShutdownComplete,

    // Fault bus
    /// A fault was queued by a reporter
    FaultReported,
    /// A fault clear was queued by a reporter
    FaultClearReported,
    /// A handler was registered
    HandlerRegistered,
    /// The default crash handler was installed under `Unknown`
    DefaultHandlerInstalled,
    /// A dispatch round began
    DispatchBegin,
    /// A dispatch round finished
    DispatchComplete,
    /// A batch was dropped because the partition latch is set
    DispatchSuppressed,
    /// A same-batch duplicate fault was dropped
    DuplicateFaultDropped,
    /// A handler acknowledged a fault
    FaultHandled,
    /// A fault reached the default handler (FATAL)
    FaultUnhandled,
    /// A handler returned an error or panicked (FATAL)
    HandlerFailed,
    /// A handler gave up because shutdown was requested while it ran
    HandlerStoppedByShutdown,

    // Partition policy
    /// A partition policy decision was made
    PartitionDecision,
    /// This node is on the losing side of a split (FATAL)
    PartitionDetected,
    /// Partition snapshot directory verified
    SnapshotDirVerified,
    /// Partition snapshot directory unusable
    SnapshotDirInvalid,

    // Process
    /// Local node is being crashed deliberately (FATAL)
    CrashLocalNode,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::DistributorStart => "FAULT_DISTRIBUTOR_START",
            Event::ShutdownStart => "FAULT_DISTRIBUTOR_SHUTDOWN_BEGIN",
            Event::ShutdownComplete => "FAULT_DISTRIBUTOR_SHUTDOWN_COMPLETE",

            Event::FaultReported => "FAULT_REPORTED",
            Event::FaultClearReported => "FAULT_CLEAR_REPORTED",
            Event::HandlerRegistered => "FAULT_HANDLER_REGISTERED",
            Event::DefaultHandlerInstalled => "FAULT_DEFAULT_HANDLER_INSTALLED",
            Event::DispatchBegin => "FAULT_DISPATCH_BEGIN",
            Event::DispatchComplete => "FAULT_DISPATCH_COMPLETE",
            Event::DispatchSuppressed => "FAULT_DISPATCH_SUPPRESSED",
            Event::DuplicateFaultDropped => "FAULT_DUPLICATE_DROPPED",
            Event::FaultHandled => "FAULT_HANDLED",
            Event::FaultUnhandled => "FAULT_UNHANDLED",
            Event::HandlerFailed => "FAULT_HANDLER_FAILED",
            Event::HandlerStoppedByShutdown => "FAULT_HANDLER_STOPPED_BY_SHUTDOWN",

            Event::PartitionDecision => "PARTITION_DECISION",
            Event::PartitionDetected => "PARTITION_DETECTED",
            Event::SnapshotDirVerified => "PARTITION_SNAPSHOT_DIR_VERIFIED",
            Event::SnapshotDirInvalid => "PARTITION_SNAPSHOT_DIR_INVALID",

            Event::CrashLocalNode => "CRASH_LOCAL_NODE",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Event::FaultUnhandled
                | Event::HandlerFailed
                | Event::PartitionDetected
                | Event::CrashLocalNode
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
