//! Storage error types.

use std::time::Duration;

use crate::config::DriverKind;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while configuring disks or running storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Invalid or incomplete disk configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Driver kind is unknown or not compiled in.
    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// No disk is registered under the requested name.
    #[error("disk not found: {0}")]
    DiskNotFound(String),

    /// File or object not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid object path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Signed URL expiry outside of the range the backend accepts.
    #[error("invalid expiry {expires_in:?}: must be between {min:?} and {max:?}")]
    InvalidExpiry {
        /// Requested expiry.
        expires_in: Duration,
        /// Shortest accepted expiry.
        min: Duration,
        /// Longest accepted expiry.
        max: Duration,
    },

    /// The object changed between reading its etag and using it.
    #[error("precondition failed: {0}")]
    ConditionNotMatch(String),

    /// Local I/O failure outside of the backend client.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(opendal::Error),
}

impl StorageError {
    /// Creates a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new unsupported driver error.
    pub fn unsupported_driver(name: impl Into<String>) -> Self {
        Self::UnsupportedDriver(name.into())
    }

    /// Creates a new error for a driver kind disabled at compile time.
    pub fn driver_disabled(kind: DriverKind) -> Self {
        Self::UnsupportedDriver(format!(
            "driver `{kind}` is not enabled, rebuild with the `{kind}` feature"
        ))
    }

    /// Creates a new disk not found error.
    pub fn disk_not_found(name: impl Into<String>) -> Self {
        Self::DiskNotFound(name.into())
    }

    /// Creates a new not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Creates a new invalid path error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Returns whether this error means the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns whether this error comes from configuration rather than an operation.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::UnsupportedDriver(_) | Self::DiskNotFound(_)
        )
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            ErrorKind::ConditionNotMatch => Self::ConditionNotMatch(err.to_string()),
            ErrorKind::ConfigInvalid => Self::Config(err.to_string()),
            _ => Self::Backend(err),
        }
    }
}
