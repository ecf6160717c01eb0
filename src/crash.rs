//! Local node crash primitive
//!
//! Every fatal path in the fault subsystem ends here: the default handler,
//! a failing fault handler, and the losing side of a partition decision.
//!
//! [`ProcessCrash`] terminates immediately via `std::process::abort()`:
//! no cleanup, no unwinding, no catching. [`RecordingCrash`] records
//! requests instead, so the fatal paths can be exercised in tests.

use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};

use crate::observability::{log_event_with_fields, Event};

/// Capability to crash the local node.
pub trait CrashHandler: Send + Sync {
    /// Terminate the local node.
    ///
    /// `dump_diagnostics` asks the implementation to emit whatever extra
    /// state it can before exiting. `cause` is the error that made the crash
    /// necessary, when there is one.
    fn crash_local_node(
        &self,
        reason: &str,
        dump_diagnostics: bool,
        cause: Option<&(dyn Error + 'static)>,
    );
}

/// Crash by aborting the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCrash;

impl CrashHandler for ProcessCrash {
    fn crash_local_node(
        &self,
        reason: &str,
        dump_diagnostics: bool,
        cause: Option<&(dyn Error + 'static)>,
    ) {
        let cause = cause.map(|e| e.to_string()).unwrap_or_default();
        log_event_with_fields(
            Event::CrashLocalNode,
            &[
                ("cause", &cause),
                ("dump_diagnostics", if dump_diagnostics { "true" } else { "false" }),
                ("reason", reason),
            ],
        );
        if dump_diagnostics {
            eprintln!("[CRASH] {}", std::backtrace::Backtrace::force_capture());
        }
        std::process::abort();
    }
}

/// One recorded crash request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashRecord {
    /// Reason passed by the caller
    pub reason: String,
    /// Whether diagnostics were requested
    pub dump_diagnostics: bool,
    /// Rendered cause, if any
    pub cause: Option<String>,
}

/// Crash handler that records requests instead of exiting.
///
/// Cloning shares the underlying record list.
#[derive(Debug, Default, Clone)]
pub struct RecordingCrash {
    records: Arc<Mutex<Vec<CrashRecord>>>,
}

impl RecordingCrash {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Crash requests received so far.
    pub fn records(&self) -> Vec<CrashRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of crash requests received so far.
    pub fn count(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl CrashHandler for RecordingCrash {
    fn crash_local_node(
        &self,
        reason: &str,
        dump_diagnostics: bool,
        cause: Option<&(dyn Error + 'static)>,
    ) {
        log_event_with_fields(Event::CrashLocalNode, &[("reason", reason), ("recorded", "true")]);
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CrashRecord {
                reason: reason.to_string(),
                dump_diagnostics,
                cause: cause.map(|e| e.to_string()),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_recording_crash_records_requests() {
        let crash = RecordingCrash::new();
        let shared = crash.clone();

        let cause = io::Error::new(io::ErrorKind::Other, "disk gone");
        crash.crash_local_node("snapshot failed", true, Some(&cause));
        crash.crash_local_node("unhandled fault", false, None);

        let records = shared.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reason, "snapshot failed");
        assert!(records[0].dump_diagnostics);
        assert_eq!(records[0].cause.as_deref(), Some("disk gone"));
        assert_eq!(records[1].cause, None);
        assert_eq!(shared.count(), 2);
    }
}
