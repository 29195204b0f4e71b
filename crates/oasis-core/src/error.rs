//! Core error types for oasis-core.
//!
//! Every collaborator has its own `thiserror` enum; `CoreError` wraps them
//! for callers that just want to propagate with `?`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for oasis-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Preferences store errors
    #[error("Preferences error: {0}")]
    Store(#[from] StoreError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Auth collaborator errors
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Remote persistence errors
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while persisting or restoring the preferences record.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Backend(String),

    #[error("stored preferences are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("stored preferences use schema version {found}, newest supported is {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),
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
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Auth collaborator errors. The `Display` text is shown to the user as-is.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please enter a valid email address.")]
    InvalidEmail(String),

    #[error("Auth endpoint is not configured. Set remote.base_url first.")]
    NotConfigured,

    #[error("Login link rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid login callback: {0}")]
    InvalidCallback(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Could not store session: {0}")]
    Storage(#[from] DatabaseError),
}

/// Remote persistence errors. Callers on the fire-and-forget path only log them.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("remote store is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Value outside an allowed range
    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
