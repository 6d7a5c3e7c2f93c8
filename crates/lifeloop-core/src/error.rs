//! Core error types for lifeloop-core.
//!
//! Errors are grouped by how callers must treat them: validation failures are
//! surfaced to the user, remote and scheduling failures are logged and the
//! operation degrades, cache failures are reported to whoever asked for I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for lifeloop-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Local cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Remote data source errors
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Notification scheduling errors
    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors. These are raised synchronously and must be shown to the
/// end user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or blank
    #[error("Missing required field '{0}'")]
    MissingField(String),

    /// The operation needs a signed-in user
    #[error("No authenticated session")]
    NotAuthenticated,

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },
}

/// Local cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to open the backing database
    #[error("Failed to open cache at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Cache query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Cache is locked")]
    Locked,

    /// Stored blob could not be decoded
    #[error("Corrupt cache entry '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// Transient remote errors (network, auth). Callers degrade to cached data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Network or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// The backend rejected the session
    #[error("Authentication required")]
    AuthenticationRequired,

    /// No remote is configured (offline mode)
    #[error("Remote unavailable")]
    Unavailable,

    /// The backend returned rows the engine could not read
    #[error("Malformed response for '{collection}': {message}")]
    Malformed { collection: String, message: String },
}

/// Notification scheduling errors. Never fatal for a scheduling pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// The OS refused notification permission
    #[error("Notification permission denied")]
    PermissionDenied,

    /// A single trigger could not be registered
    #[error("Failed to register trigger '{tag}': {message}")]
    RegistrationFailed { tag: String, message: String },

    /// Cancelling previously registered triggers failed
    #[error("Failed to cancel triggers: {0}")]
    CancelFailed(String),
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

    /// Home/config directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseLocked => {
                CacheError::Locked
            }
            _ => CacheError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_into_core_error() {
        let err: CoreError = ValidationError::MissingField("title".into()).into();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation error: Missing required field 'title'"
        );
    }

    #[test]
    fn rusqlite_errors_map_to_query_failed() {
        let err: CacheError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, CacheError::QueryFailed(_)));
    }
}
