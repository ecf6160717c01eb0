//! CLI-specific error types
//!
//! Every CLI error ends the process with exit code 1.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::partition::SnapshotDirError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Request on stdin is missing or malformed
    InvalidRequest,
    /// Partition snapshot directory unusable
    SnapshotDirInvalid,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "FAULTLINE_CLI_CONFIG_ERROR",
            Self::IoError => "FAULTLINE_CLI_IO_ERROR",
            Self::InvalidRequest => "FAULTLINE_CLI_INVALID_REQUEST",
            Self::SnapshotDirInvalid => "FAULTLINE_CLI_SNAPSHOT_DIR_INVALID",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Bad request
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    /// Snapshot directory check failed
    pub fn snapshot_dir_invalid(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::SnapshotDirInvalid, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(format!("{} ({})", e.message, e.kind.code()))
    }
}

impl From<SnapshotDirError> for CliError {
    fn from(e: SnapshotDirError) -> Self {
        Self::snapshot_dir_invalid(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
