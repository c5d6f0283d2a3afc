use chrono::{DateTime, Utc};

/// Errors from image store operations.
///
/// Missing and expired records are not errors; see [`crate::Lookup`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store or reaper was constructed with unusable settings.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    /// Creation time plus the expiration window is not a representable date.
    #[error("expiry for a record created at {0} is out of range")]
    ExpiryOutOfRange(DateTime<Utc>),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
