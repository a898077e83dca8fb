//! Error types for sourcebuf primitives

use thiserror::Error;

/// Error type for core primitive operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid configuration value
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration {
        /// Configuration field or variable name
        field: String,
        /// Reason the value was rejected
        reason: String,
    },

    /// Required configuration was not provided
    #[error("Missing required configuration: {field}")]
    MissingConfiguration {
        /// Name of the missing field
        field: String,
    },

    /// Interval whose start lies after its end
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange {
        /// Interval start
        start: String,
        /// Interval end
        end: String,
    },
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> String {
        match self {
            CoreError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION".to_string(),
            CoreError::MissingConfiguration { .. } => "MISSING_CONFIGURATION".to_string(),
            CoreError::InvalidRange { .. } => "INVALID_RANGE".to_string(),
        }
    }
}
