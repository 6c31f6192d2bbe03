//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
///
/// Disk failures on the write path are never surfaced through this type;
/// the store logs and absorbs them. What remains are caller errors (bad
/// keys, values that cannot be represented as JSON) and read-side
/// conversion failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Key is empty or would escape the storage root.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Sequence counter cannot be advanced any further.
    #[error("counter overflow: {0}")]
    CounterOverflow(String),
}
