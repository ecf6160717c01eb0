//! Configuration Error Types
//!
//! Configuration errors are fatal at startup. Nothing is guessed or
//! defaulted around a malformed file.

use std::fmt;

/// Configuration error
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// Error kind
    pub kind: ConfigErrorKind,
    /// Error message
    pub message: String,
}

/// Configuration error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// File could not be read
    Unreadable,
    /// File is not valid JSON for the config schema
    Malformed,
    /// A value is out of range or inconsistent
    Invalid,
}

impl ConfigErrorKind {
    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unreadable => "FAULTLINE_CONFIG_UNREADABLE",
            Self::Malformed => "FAULTLINE_CONFIG_MALFORMED",
            Self::Invalid => "FAULTLINE_CONFIG_INVALID",
        }
    }
}

impl ConfigError {
    /// Create a new configuration error.
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// File could not be read.
    pub fn unreadable(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Unreadable, message)
    }

    /// File could not be parsed.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Malformed, message)
    }

    /// A value failed validation.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Invalid, message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
