//! Core error types for focusdeck-core.
//!
//! Validation errors are rejected synchronously before any state mutation.
//! Backend and stale-reference failures inside tick paths are absorbed
//! locally and never propagate out of a tick.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusdeck-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Backend collaborator errors
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Configured focus duration does not fit in the remaining budget
    #[error(
        "Focus duration of {focus_seconds}s exceeds the remaining planned \
         time of {remaining_seconds}s; shorten the focus duration or extend \
         the task budget"
    )]
    FocusExceedsBudget {
        focus_seconds: u64,
        remaining_seconds: u64,
    },

    /// Non-positive duration or cycle count
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Command targeted a task that does not exist
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// Command is not valid in the scheduler's current state
    #[error("Invalid in state {state}: {message}")]
    InvalidState { state: String, message: String },
}

/// Backend collaborator errors.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Request could not be sent or the response could not be read
    #[error("Request to {endpoint} failed: {message}")]
    RequestFailed { endpoint: String, message: String },

    /// Server answered with a non-success status
    #[error("Server error from {endpoint} (HTTP {status})")]
    ServerStatus { endpoint: String, status: u16 },

    /// Response body did not have the expected shape
    #[error("Malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_else(|| "<unknown>".into());
        BackendError::RequestFailed {
            endpoint,
            message: err.to_string(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
