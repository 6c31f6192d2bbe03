//! Error types for the model layer.

use lendstack_storage::StorageError;
use lendstack_types::{EntityKind, RecordId};
use thiserror::Error;

/// Result type for repository operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No record with this id in the repository.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: RecordId },

    /// The key-value store rejected the operation.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A JSON body could not be turned into a record.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl ModelError {
    /// True for the not-found case, which callers surface as a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound { .. })
    }
}
