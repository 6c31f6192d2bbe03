//! Core type definitions for lendstack.
//!
//! This crate defines the small set of types shared by every layer of the
//! loan-administration backend:
//! - [`EntityKind`], the closed set of entity types with their storage keys,
//!   counter keys and remote table names
//! - [`RecordId`], the small integer identifier handed out per entity type
//! - [`Timestamps`], the `createdAt`/`updatedAt` pair every record carries
//!
//! Entity schemas themselves live in `lendstack-model`.

mod ids;
mod kind;
mod timestamp;

pub use ids::RecordId;
pub use kind::EntityKind;
pub use timestamp::Timestamps;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown entity type: {0}")]
    UnknownEntityKind(String),

    #[error("invalid record id: {0}")]
    InvalidRecordId(String),
}
