//! Entity model for lendstack.
//!
//! Defines the records the backend administers and the repositories that own
//! them:
//! - [`Record`]: what every entity shares (integer id, timestamps, a kind)
//! - [`Enquiry`], [`Document`], [`Staff`], [`Transaction`], [`Notification`]
//! - [`Repository`]: the authoritative in-memory list for one entity type,
//!   persisted to the key-value store on every mutation
//! - [`EntityRepository`]: the JSON-level, type-erased view used by the
//!   sync layer and the HTTP surface
//! - [`ChangeSink`]: hook notified after each persisted mutation
//! - [`Repositories`]: one repository per entity type, built at startup

mod entities;
mod erased;
mod error;
mod record;
mod registry;
mod repository;
pub mod seed;

pub use entities::{
    Document, DocumentStatus, Enquiry, EnquiryStatus, Notification, NotificationChannel, Staff,
    StaffRole, Transaction, TransactionKind, TransactionStatus,
};
pub use erased::EntityRepository;
pub use error::{ModelError, ModelResult};
pub use record::{ChangeSink, NoopSink, Record};
pub use registry::Repositories;
pub use repository::Repository;
