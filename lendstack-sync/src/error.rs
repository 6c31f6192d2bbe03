//! Error types for the sync layer.

use crate::report::SyncReport;
use lendstack_model::ModelError;
use lendstack_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The remote mirror answered with a non-success status.
    #[error("remote mirror returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// Timeout.
    #[error("operation timed out")]
    Timeout,

    /// The remote mirror could not be reached for a whole batch.
    ///
    /// Carries the counts accumulated before the batch was abandoned.
    #[error("remote mirror unreachable ({report})")]
    Unreachable { report: Box<SyncReport> },

    /// A local record could not be mapped to a remote row.
    #[error("record mapping failed: {0}")]
    Mapping(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local repository error.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Local key-value store error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// True when the error says nothing about the record and everything
    /// about the path to the mirror: no response, a timeout, or a gateway
    /// status.
    pub fn is_connectivity(&self) -> bool {
        match self {
            SyncError::Network(_) | SyncError::Timeout | SyncError::Unreachable { .. } => true,
            SyncError::Remote { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SyncError::Timeout
        } else {
            SyncError::Network(e.to_string())
        }
    }
}
