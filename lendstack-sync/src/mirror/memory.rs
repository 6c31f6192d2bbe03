//! In-process mirror, used when no remote is configured and in tests.

use super::{Predicate, RemoteMirror};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

type Table = BTreeMap<u64, Value>;

/// Table store held in memory, with switches for simulating failures.
#[derive(Default)]
pub struct MemoryMirror {
    tables: RwLock<HashMap<String, Table>>,
    rejected: RwLock<HashSet<(String, u64)>>,
    offline: AtomicBool,
    upserts: AtomicU64,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes upserts of `id` into `table` fail with a server error.
    pub fn reject_upserts(&self, table: &str, id: u64) {
        self.rejected
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((table.to_string(), id));
    }

    pub fn clear_rejections(&self) {
        self.rejected
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Rows of `table`, ordered by id.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Upsert calls that reached the table, successful or not.
    pub fn upsert_calls(&self) -> u64 {
        self.upserts.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> SyncResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(SyncError::Network("memory mirror is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteMirror for MemoryMirror {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn ping(&self) -> SyncResult<()> {
        self.ensure_online()
    }

    async fn upsert(&self, table: &str, row: &Value, conflict_key: &str) -> SyncResult<()> {
        self.ensure_online()?;
        self.upserts.fetch_add(1, Ordering::SeqCst);

        let key = row
            .get(conflict_key)
            .and_then(Value::as_u64)
            .ok_or_else(|| SyncError::Remote {
                status: 400,
                message: format!("row has no integer {conflict_key}"),
            })?;

        let rejected = self
            .rejected
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(table.to_string(), key));
        if rejected {
            return Err(SyncError::Remote {
                status: 500,
                message: format!("simulated failure for {table}/{key}"),
            });
        }

        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(table.to_string())
            .or_default()
            .insert(key, row.clone());
        Ok(())
    }

    async fn select_count(&self, table: &str) -> SyncResult<u64> {
        self.ensure_online()?;
        Ok(self.rows(table).len() as u64)
    }

    async fn select_by_id(&self, table: &str, id: u64) -> SyncResult<Option<Value>> {
        self.ensure_online()?;
        Ok(self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .and_then(|t| t.get(&id).cloned()))
    }

    async fn delete_where(&self, table: &str, predicate: &Predicate) -> SyncResult<()> {
        self.ensure_online()?;
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(rows) = tables.get_mut(table) {
            match predicate {
                Predicate::All => rows.clear(),
                Predicate::IdEq(id) => {
                    rows.remove(id);
                }
                Predicate::IdNotIn(keep) => rows.retain(|id, _| keep.contains(id)),
            }
        }
        Ok(())
    }
}
