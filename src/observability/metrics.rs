//! Fault distribution counters
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters for one fault distributor.
///
/// Relaxed ordering throughout: counters are read for diagnostics and tests,
/// never used to synchronize anything.
#[derive(Debug, Default)]
pub struct FaultMetrics {
    faults_reported: AtomicU64,
    clears_reported: AtomicU64,
    batches_dispatched: AtomicU64,
    batches_suppressed: AtomicU64,
    duplicates_dropped: AtomicU64,
    handler_invocations: AtomicU64,
    handler_failures: AtomicU64,
    partition_decisions: AtomicU64,
    partitions_detected: AtomicU64,
}

impl FaultMetrics {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment_faults_reported(&self) {
        self.faults_reported.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_clears_reported(&self) {
        self.clears_reported.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_batches_dispatched(&self) {
        self.batches_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_batches_suppressed(&self) {
        self.batches_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_duplicates_dropped(&self) {
        self.duplicates_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_handler_invocations(&self) {
        self.handler_invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_handler_failures(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_partition_decisions(&self) {
        self.partition_decisions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_partitions_detected(&self) {
        self.partitions_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of every counter
    pub fn snapshot(&self) -> FaultMetricsSnapshot {
        FaultMetricsSnapshot {
            faults_reported: self.faults_reported.load(Ordering::Relaxed),
            clears_reported: self.clears_reported.load(Ordering::Relaxed),
            batches_dispatched: self.batches_dispatched.load(Ordering::Relaxed),
            batches_suppressed: self.batches_suppressed.load(Ordering::Relaxed),
            duplicates_dropped: self.duplicates_dropped.load(Ordering::Relaxed),
            handler_invocations: self.handler_invocations.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            partition_decisions: self.partition_decisions.load(Ordering::Relaxed),
            partitions_detected: self.partitions_detected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`FaultMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultMetricsSnapshot {
    /// Faults accepted by `report_fault`
    pub faults_reported: u64,
    /// Clears accepted by `report_fault_cleared`
    pub clears_reported: u64,
    /// Dispatch rounds that reached handler lookup
    pub batches_dispatched: u64,
    /// Drained batches discarded because the partition latch was set
    pub batches_suppressed: u64,
    /// Same-batch duplicate reports dropped
    pub duplicates_dropped: u64,
    /// Individual `fault_occurred` / `fault_cleared` calls
    pub handler_invocations: u64,
    /// Handler calls that returned an error or panicked
    pub handler_failures: u64,
    /// Calls to `make_partition_policy_decision`
    pub partition_decisions: u64,
    /// Decisions that returned `PartitionDetection`
    pub partitions_detected: u64,
}
