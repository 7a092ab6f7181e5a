//! Core error types for fokus-core.
//!
//! This module defines the error hierarchy using thiserror. Only the storage
//! and config layers return these to callers; the timer rejects invalid
//! transitions with [`TimerError`] and otherwise never fails.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for fokus-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rejected timer transitions
    #[error("{0}")]
    Timer(#[from] TimerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Could not resolve or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// Stored value could not be decoded
    #[error("Corrupt value under '{key}': {message}")]
    Corrupt { key: String, message: String },
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Timer transitions the state machine refuses.
///
/// The display strings are meant to be shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Duration or category change attempted mid-interval
    #[error("Timer is running; stop it before changing the {what}")]
    Busy { what: &'static str },

    /// A prompt answer arrived with no matching prompt open
    #[error("No {expected} prompt is open")]
    NoPendingPrompt { expected: &'static str },

    /// Zero or out-of-range duration
    #[error("Invalid duration: {minutes} minutes")]
    InvalidDuration { minutes: u32 },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_message_is_user_facing() {
        let err = TimerError::Busy { what: "duration" };
        assert_eq!(
            err.to_string(),
            "Timer is running; stop it before changing the duration"
        );
    }

    #[test]
    fn timer_error_converts_into_core_error() {
        let err: CoreError = TimerError::InvalidDuration { minutes: 0 }.into();
        assert!(matches!(err, CoreError::Timer(_)));
        assert_eq!(err.to_string(), "Invalid duration: 0 minutes");
    }
}
