//! Pushes repository state to the remote mirror.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::ledger::SyncLedger;
use crate::mapping;
use crate::mirror::{Predicate, RemoteMirror};
use crate::report::SyncReport;
use lendstack_model::Repositories;
use lendstack_types::{EntityKind, RecordId};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Upsert-by-id column on every remote table.
pub const CONFLICT_KEY: &str = "id";

/// Mirrors local repositories into a [`RemoteMirror`].
///
/// Full passes (`sync_all`, `clear_and_sync_all`, `sync_everything`) are
/// serialized by one async mutex, so an on-demand pass and the periodic
/// pass never overlap. Pushes of a record's current state
/// ([`sync_current`](Self::sync_current) and every full pass) hold a
/// per-record lock across read and write, so the last push of a record
/// always carries its latest local state.
pub struct Synchronizer {
    repos: Arc<Repositories>,
    mirror: Arc<dyn RemoteMirror>,
    config: SyncConfig,
    ledger: Arc<SyncLedger>,
    full_pass: Mutex<()>,
    record_locks: RecordLocks,
}

impl Synchronizer {
    pub fn new(repos: Arc<Repositories>, mirror: Arc<dyn RemoteMirror>, config: SyncConfig) -> Self {
        Self {
            repos,
            mirror,
            config,
            ledger: Arc::new(SyncLedger::new()),
            full_pass: Mutex::new(()),
            record_locks: RecordLocks::default(),
        }
    }

    pub fn repositories(&self) -> &Arc<Repositories> {
        &self.repos
    }

    pub fn mirror(&self) -> &Arc<dyn RemoteMirror> {
        &self.mirror
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<SyncLedger> {
        &self.ledger
    }

    // ── Single records ───────────────────────────────────────────

    /// Upserts one record, given in its local JSON form.
    ///
    /// Idempotent: the row is replaced by id, so repeating the call leaves
    /// the remote row unchanged.
    pub async fn sync_one(&self, kind: EntityKind, record: &Value) -> SyncResult<RecordId> {
        let (id, row) = mapping::to_remote_row(kind, record)?;
        self.bounded(self.mirror.upsert(kind.remote_table(), &row, CONFLICT_KEY))
            .await?;
        debug!(entity_type = %kind, %id, "Record mirrored");
        Ok(id)
    }

    /// Deletes one record remotely.
    pub async fn remove_one(&self, kind: EntityKind, id: RecordId) -> SyncResult<()> {
        self.bounded(
            self.mirror
                .delete_where(kind.remote_table(), &Predicate::IdEq(id.get())),
        )
        .await?;
        debug!(entity_type = %kind, %id, "Remote record removed");
        Ok(())
    }

    /// Mirrors the record's current local state: upserts it when it exists,
    /// deletes the remote row when it has been removed locally.
    pub async fn sync_current(&self, kind: EntityKind, id: RecordId) -> SyncResult<()> {
        let _record = self.record_locks.lock(kind, id).await;
        let current = self.repos.get(kind).find_json(id);
        match current {
            Ok(record) => self.sync_one(kind, &record).await.map(|_| ()),
            Err(e) if e.is_not_found() => self.remove_one(kind, id).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Upserts the record's current local state. Returns `false` without
    /// touching the mirror when the record has been removed locally.
    async fn push_if_present(&self, kind: EntityKind, id: RecordId) -> SyncResult<bool> {
        let _record = self.record_locks.lock(kind, id).await;
        let current = self.repos.get(kind).find_json(id);
        match current {
            Ok(record) => {
                self.sync_one(kind, &record).await?;
                Ok(true)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Row count of `kind`'s remote table. Read-only.
    pub async fn remote_count(&self, kind: EntityKind) -> SyncResult<u64> {
        self.bounded(self.mirror.select_count(kind.remote_table()))
            .await
    }

    // ── Full passes ──────────────────────────────────────────────

    /// Pushes every record of `kind`, tolerating per-record failures.
    ///
    /// Fails only with [`SyncError::Unreachable`] (mirror down before or
    /// during the batch) or a local repository error.
    pub async fn sync_all(&self, kind: EntityKind) -> SyncResult<SyncReport> {
        let _pass = self.full_pass.lock().await;
        self.sync_all_locked(kind).await
    }

    /// Deletes the remote rows of `kind` outside the protected ids, then
    /// pushes every local record.
    pub async fn clear_and_sync_all(&self, kind: EntityKind) -> SyncResult<SyncReport> {
        let _pass = self.full_pass.lock().await;
        self.probe(kind).await?;

        let protected = self.config.protected_ids_for(kind);
        let predicate = if protected.is_empty() {
            Predicate::All
        } else {
            Predicate::IdNotIn(protected.to_vec())
        };
        self.bounded(self.mirror.delete_where(kind.remote_table(), &predicate))
            .await?;
        info!(entity_type = %kind, ?protected, "Cleared remote table");

        self.sync_all_locked(kind).await
    }

    /// Full pass over every entity type, in [`EntityKind::ALL`] order.
    ///
    /// Stops at the first type for which the mirror is unreachable.
    pub async fn sync_everything(&self) -> SyncResult<Vec<SyncReport>> {
        let _pass = self.full_pass.lock().await;
        self.sync_everything_locked().await
    }

    /// Like [`sync_everything`](Self::sync_everything), but returns `None`
    /// instead of waiting when another full pass is running.
    pub async fn try_sync_everything(&self) -> Option<SyncResult<Vec<SyncReport>>> {
        let _pass = self.full_pass.try_lock().ok()?;
        Some(self.sync_everything_locked().await)
    }

    async fn sync_everything_locked(&self) -> SyncResult<Vec<SyncReport>> {
        let mut reports = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            reports.push(self.sync_all_locked(kind).await?);
        }
        Ok(reports)
    }

    async fn sync_all_locked(&self, kind: EntityKind) -> SyncResult<SyncReport> {
        let ids: Vec<Option<RecordId>> = self
            .repos
            .get(kind)
            .snapshot()?
            .iter()
            .map(RecordId::from_json)
            .collect();
        self.probe(kind).await?;

        let mut report = SyncReport::begin(kind);
        let mut consecutive_connectivity_failures = 0usize;
        let delay = self.config.record_delay();
        let mut pushed_any = false;

        for id in ids {
            if pushed_any && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let result = match id {
                Some(id) => self.push_if_present(kind, id).await,
                None => Err(SyncError::Mapping(format!("{kind} record has no integer id"))),
            };
            match result {
                Ok(false) => {
                    debug!(entity_type = %kind, id = id.map(|id| id.get()), "Record removed during full sync, skipping");
                }
                Ok(true) => {
                    pushed_any = true;
                    report.record_success();
                    consecutive_connectivity_failures = 0;
                }
                Err(e) => {
                    pushed_any = true;
                    warn!(
                        entity_type = %kind,
                        id = id.map(|id| id.get()),
                        "Record sync failed: {e}"
                    );
                    if e.is_connectivity() {
                        consecutive_connectivity_failures += 1;
                    } else {
                        consecutive_connectivity_failures = 0;
                    }
                    report.record_failure(id, &e);

                    if report.succeeded == 0
                        && consecutive_connectivity_failures >= self.config.max_consecutive_failures
                    {
                        let report = report.abort();
                        self.ledger.record(&report);
                        warn!(entity_type = %kind, "Remote mirror unreachable, abandoning batch: {report}");
                        return Err(SyncError::Unreachable {
                            report: Box::new(report),
                        });
                    }
                }
            }
        }

        let report = report.finish();
        self.ledger.record(&report);
        info!(entity_type = %kind, "Full sync finished: {report}");
        Ok(report)
    }

    /// Fails with [`SyncError::Unreachable`] and an empty, aborted report
    /// when the mirror does not answer a ping.
    async fn probe(&self, kind: EntityKind) -> SyncResult<()> {
        match self.bounded(self.mirror.ping()).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_connectivity() => {
                let report = SyncReport::begin(kind).abort();
                self.ledger.record(&report);
                warn!(entity_type = %kind, provider = self.mirror.provider_name(), "Remote mirror unreachable: {e}");
                Err(SyncError::Unreachable {
                    report: Box::new(report),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Applies the per-call timeout.
    async fn bounded<T>(&self, call: impl Future<Output = SyncResult<T>>) -> SyncResult<T> {
        tokio::time::timeout(self.config.request_timeout(), call)
            .await
            .map_err(|_| SyncError::Timeout)?
    }
}

/// Async lock per `(kind, id)`. Entries are dropped once nobody holds or
/// waits on them.
#[derive(Default)]
struct RecordLocks {
    locks: StdMutex<HashMap<(EntityKind, RecordId), Arc<Mutex<()>>>>,
}

impl RecordLocks {
    async fn lock(&self, kind: EntityKind, id: RecordId) -> RecordGuard<'_> {
        let lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((kind, id))
            .or_default()
            .clone();
        RecordGuard {
            locks: self,
            key: (kind, id),
            guard: Some(lock.lock_owned().await),
        }
    }
}

struct RecordGuard<'a> {
    locks: &'a RecordLocks,
    key: (EntityKind, RecordId),
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RecordGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Waiters clone the Arc under the map lock, so a count of one means
        // the map holds the only reference.
        if locks.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.key);
        }
    }
}
