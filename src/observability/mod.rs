//! Observability for faultline
//!
//! - Structured logging (JSON lines)
//! - Monotonic counters per distributor
//! - Typed lifecycle events
//!
//! Observability describes what happened; it never decides what happens.
//!
//! ```ignore
//! use faultline::observability::{log_event_with_fields, Event, Logger};
//!
//! Logger::warn("PARTITION_UNKNOWN_SITES", &[("sites", "[700]")]);
//! log_event_with_fields(Event::PartitionDecision, &[("verdict", "NodeFailure")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{FaultMetrics, FaultMetricsSnapshot};

#[cfg(test)]
pub(crate) use logger::capture_log;

/// Log a lifecycle event with fields.
///
/// Fatal events are logged at FATAL, everything else at INFO.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
