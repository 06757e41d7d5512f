//! Core error types for beermatik-core.
//!
//! Internal helpers propagate these with `?`; the public session-store and
//! scheduler operations catch them at the operation boundary and degrade to
//! defaults or no-ops, so callers never see a storage failure as a panic.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for beermatik-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Alert backend errors
    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing store
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A read or write against the store failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A write was rejected by the backend
    #[error("Write rejected for key '{0}'")]
    WriteRejected(String),

    /// Value encoding failed before it reached the store
    #[error("Encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Platform alert primitive errors.
///
/// Permission denial is not an error -- it is a normal boolean outcome of
/// `request_permission`.
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Alert backend error: {0}")]
    Backend(String),
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

impl From<rusqlite::Error> for AlertError {
    fn from(err: rusqlite::Error) -> Self {
        AlertError::Backend(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
