//! Remote relational store that receives copies of local state.
//!
//! The synchronizer only needs upsert-by-key, count, lookup by id and
//! filtered delete, so that is the whole contract.

pub mod memory;
pub mod rest;

pub use memory::MemoryMirror;
pub use rest::{RestMirror, RestMirrorConfig};

use crate::error::SyncResult;
use async_trait::async_trait;
use serde_json::Value;

/// Row filter for [`RemoteMirror::delete_where`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Every row in the table.
    All,
    /// The row whose `id` equals the value.
    IdEq(u64),
    /// Every row whose `id` is not listed. An empty list means every row.
    IdNotIn(Vec<u64>),
}

/// Abstract remote mirror interface.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Returns the name of the mirror provider.
    fn provider_name(&self) -> &'static str;

    /// Cheap round trip used to tell "unreachable" from "record rejected".
    async fn ping(&self) -> SyncResult<()>;

    /// Inserts `row`, or replaces the row with the same `conflict_key` value.
    async fn upsert(&self, table: &str, row: &Value, conflict_key: &str) -> SyncResult<()>;

    /// Number of rows in `table`.
    async fn select_count(&self, table: &str) -> SyncResult<u64>;

    /// The row with `id`, if any.
    async fn select_by_id(&self, table: &str, id: u64) -> SyncResult<Option<Value>>;

    /// Deletes every row matching `predicate`.
    async fn delete_where(&self, table: &str, predicate: &Predicate) -> SyncResult<()>;
}
