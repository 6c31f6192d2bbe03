//! Local persistence layer for lendstack.
//!
//! Provides the authoritative local storage every entity repository sits on.
//!
//! # Architecture
//!
//! - [`KvStore`] keeps JSON values in an in-process cache and mirrors each
//!   key to `<root>/<key>.json` on a best-effort basis
//! - [`StorageLocation`] picks the root once per process from deployment
//!   signals (read-only platforms run memory-only)
//! - [`SequenceAllocator`] hands out per-type integer ids from counters
//!   stored in the same [`KvStore`]
//!
//! The cache is authoritative for any key it holds. The disk copy is read
//! only on a cache miss, which in practice means the first read of a key
//! after a process restart.

mod error;
mod kv;
mod location;
mod sequence;

pub use error::{StorageError, StorageResult};
pub use kv::KvStore;
pub use location::{PlatformSignals, StorageConfig, StorageLocation, StorageMode};
pub use sequence::SequenceAllocator;
