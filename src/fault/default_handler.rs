//! Default fault handler
//!
//! Installed under `Unknown` when a fault arrives that nothing is registered
//! to handle. Every fault it sees is logged at FATAL, then the local node is
//! crashed. No retry, no partial continuation.

use std::sync::Arc;

use super::errors::HandlerResult;
use super::handler::{FaultBatch, FaultHandler};
use crate::crash::CrashHandler;
use crate::observability::{log_event_with_fields, Event};

/// Log-and-crash handler.
pub struct DefaultFaultHandler {
    crash: Arc<dyn CrashHandler>,
}

impl DefaultFaultHandler {
    /// Create a handler that crashes through `crash`.
    pub fn new(crash: Arc<dyn CrashHandler>) -> Self {
        Self { crash }
    }
}

impl FaultHandler for DefaultFaultHandler {
    fn name(&self) -> &str {
        "default-fault-handler"
    }

    fn fault_occurred(&self, batch: &FaultBatch<'_>) -> HandlerResult<()> {
        for fault in batch.iter() {
            let description = fault.to_string();
            let detected_at = fault.detected_at().to_rfc3339();
            log_event_with_fields(
                Event::FaultUnhandled,
                &[
                    ("description", &description),
                    ("detected_at", &detected_at),
                    ("kind", fault.kind().as_str()),
                ],
            );
        }
        let reason = format!(
            "{} unhandled {} fault(s); no handler registered",
            batch.len(),
            batch.kind()
        );
        self.crash.crash_local_node(&reason, true, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crash::RecordingCrash;
    use crate::fault::handler::HandlerId;
    use crate::fault::types::{Fault, FaultKind};
    use crate::membership::SiteId;
    use std::collections::HashSet;

    #[test]
    fn test_crashes_once_per_batch() {
        let crash = RecordingCrash::new();
        let handler = DefaultFaultHandler::new(Arc::new(crash.clone()));

        let faults: HashSet<Fault> = [
            Fault::site_failure([SiteId(1)]),
            Fault::site_failure([SiteId(2)]),
        ]
        .into_iter()
        .collect();
        let batch = FaultBatch::new(HandlerId(0), FaultKind::SiteFailure, &faults);

        handler.fault_occurred(&batch).unwrap();

        let records = crash.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].dump_diagnostics);
        assert!(records[0].reason.contains("2 unhandled SiteFailure"));
    }

    #[test]
    fn test_clears_are_ignored() {
        let crash = RecordingCrash::new();
        let handler = DefaultFaultHandler::new(Arc::new(crash.clone()));

        let faults: HashSet<Fault> = [Fault::unknown("gone")].into_iter().collect();
        let batch = FaultBatch::new(HandlerId(0), FaultKind::Unknown, &faults);

        handler.fault_cleared(&batch).unwrap();
        assert_eq!(crash.count(), 0);
    }
}
