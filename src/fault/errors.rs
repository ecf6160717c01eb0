//! # Fault Errors
//!
//! Error types for the fault distribution subsystem.

use thiserror::Error;

use super::handler::HandlerId;
use super::types::FaultKind;

/// Result type for distributor operations
pub type FaultResult<T> = Result<T, FaultError>;

/// Result type returned by fault handlers
pub type HandlerResult<T> = Result<T, FaultError>;

/// Fault subsystem errors
#[derive(Debug, Error)]
pub enum FaultError {
    /// A handler could not process a batch. Fatal for the local node.
    #[error("fault handler '{handler}' failed on {kind} faults: {message}")]
    HandlerFailed {
        /// Handler name
        handler: String,
        /// Kind being dispatched
        kind: FaultKind,
        /// Failure description
        message: String,
    },

    /// A handler panicked. Fatal for the local node.
    #[error("fault handler '{handler}' panicked on {kind} faults: {message}")]
    HandlerPanicked {
        /// Handler name
        handler: String,
        /// Kind being dispatched
        kind: FaultKind,
        /// Panic payload, when it was a string
        message: String,
    },

    /// The distributor has been shut down
    #[error("fault distributor is shut down")]
    ShutDown,

    /// No registration with this id exists
    #[error("unknown fault handler: {0}")]
    UnknownHandler(HandlerId),

    /// The dispatch worker thread could not be started
    #[error("failed to start fault dispatch worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

impl FaultError {
    /// Convenience constructor for handler implementations.
    pub fn handler_failed(
        handler: impl Into<String>,
        kind: FaultKind,
        message: impl Into<String>,
    ) -> Self {
        Self::HandlerFailed {
            handler: handler.into(),
            kind,
            message: message.into(),
        }
    }

    /// Whether this error must bring down the local node.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::HandlerFailed { .. } | Self::HandlerPanicked { .. } | Self::WorkerSpawn(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_failure_is_fatal() {
        let err = FaultError::handler_failed("catalog", FaultKind::NodeFailure, "catalog locked");
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "fault handler 'catalog' failed on NodeFailure faults: catalog locked"
        );
    }

    #[test]
    fn test_shutdown_is_not_fatal() {
        assert!(!FaultError::ShutDown.is_fatal());
        assert!(!FaultError::UnknownHandler(HandlerId(9)).is_fatal());
        assert_eq!(
            FaultError::UnknownHandler(HandlerId(9)).to_string(),
            "unknown fault handler: handler-9"
        );
    }
}
