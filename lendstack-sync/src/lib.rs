//! Remote mirror synchronization for lendstack.
//!
//! Local repositories are authoritative; the remote relational store only
//! ever receives best-effort copies.
//!
//! ## Components
//!
//! - **Mirror**: the [`RemoteMirror`] contract, with a PostgREST client
//!   ([`RestMirror`]) and an in-process table store ([`MemoryMirror`])
//! - **Mapping**: local camelCase record JSON to snake_case remote rows
//! - **Synchronizer**: idempotent upserts per record, full passes per type
//!   with per-record failure tolerance, clear-then-resync
//! - **Ledger**: last attempt / last clean sync per type
//! - **Status**: local vs remote counts and the health rule
//! - **Dispatcher**: bounded worker pool behind the repositories'
//!   [`ChangeSink`](lendstack_model::ChangeSink) hook
//! - **Scheduler**: periodic full pass behind a single-flight guard
//!
//! # Example
//!
//! ```
//! use lendstack_model::Repositories;
//! use lendstack_storage::KvStore;
//! use lendstack_sync::{MemoryMirror, SyncConfig, Synchronizer};
//! use std::sync::Arc;
//!
//! let repos = Arc::new(Repositories::open(Arc::new(KvStore::in_memory())).unwrap());
//! let sync = Synchronizer::new(repos, Arc::new(MemoryMirror::new()), SyncConfig::default());
//! assert_eq!(sync.mirror().provider_name(), "in-memory");
//! ```

mod config;
mod dispatcher;
mod error;
mod ledger;
pub mod mapping;
pub mod mirror;
mod report;
mod scheduler;
mod status;
mod synchronizer;

pub use config::SyncConfig;
pub use dispatcher::{DispatchCounts, SyncDispatcher, SyncJob};
pub use error::{SyncError, SyncResult};
pub use ledger::{LedgerEntry, SyncLedger};
pub use mirror::{MemoryMirror, Predicate, RemoteMirror, RestMirror, RestMirrorConfig};
pub use report::{RecordFailure, SyncReport};
pub use scheduler::{PeriodicSync, run_cycle};
pub use status::{
    EntityStatus, STATUS_SNAPSHOT_KEY, StatusReporter, StorageSummary, SyncSummary, is_healthy,
};
pub use synchronizer::{CONFLICT_KEY, Synchronizer};
