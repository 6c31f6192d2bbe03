//! Generic entity repository.

use crate::error::{ModelError, ModelResult};
use crate::record::{ChangeSink, NoopSink, Record};
use lendstack_storage::{KvStore, SequenceAllocator};
use lendstack_types::{EntityKind, RecordId, Timestamps};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Authoritative in-memory list of one entity type.
///
/// Reads never touch the store. Every mutation updates the list and writes
/// the whole list under [`EntityKind::storage_key`] before returning; the
/// write lock is held across both so the persisted order matches the
/// in-memory order. The [`ChangeSink`] is notified afterwards, outside the
/// lock.
///
/// Stored entries that fail to deserialize are kept aside and written back
/// after the readable records on every persist, so they are never lost.
pub struct Repository<T: Record> {
    records: RwLock<Vec<T>>,
    unreadable: Vec<Value>,
    store: Arc<KvStore>,
    ids: Arc<SequenceAllocator>,
    sink: RwLock<Arc<dyn ChangeSink>>,
}

impl<T: Record> Repository<T> {
    /// Loads the list from the store, seeding it with `seed` when the store
    /// has nothing (or an empty list) under this type's key. A list whose
    /// entries are all unreadable is not empty and is never seeded over.
    pub fn open(
        store: Arc<KvStore>,
        ids: Arc<SequenceAllocator>,
        seed: Vec<T>,
    ) -> ModelResult<Self> {
        let kind = T::KIND;
        let raw: Vec<Value> = store.load(kind.storage_key(), Vec::<Value>::new())?;
        let stored_nothing = raw.is_empty();

        let mut records = Vec::with_capacity(raw.len());
        let mut unreadable = Vec::new();
        for value in raw {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(entity_type = %kind, id = ?RecordId::from_json(&value), "Keeping unreadable stored record aside: {e}");
                    unreadable.push(value);
                }
            }
        }

        if stored_nothing && !seed.is_empty() {
            info!(entity_type = %kind, count = seed.len(), "Seeding sample records");
            store.save(kind.storage_key(), &seed)?;
            records = seed;
        }

        let max_id = records
            .iter()
            .map(|r| r.id().get())
            .chain(unreadable.iter().filter_map(RecordId::from_json).map(|id| id.get()))
            .max();
        if let Some(max_id) = max_id {
            ids.observe(kind.as_str(), max_id)?;
        }

        debug!(entity_type = %kind, count = records.len(), unreadable = unreadable.len(), "Repository loaded");
        Ok(Self {
            records: RwLock::new(records),
            unreadable,
            store,
            ids,
            sink: RwLock::new(Arc::new(NoopSink)),
        })
    }

    /// The entity type of this repository.
    pub fn kind(&self) -> EntityKind {
        T::KIND
    }

    /// Replaces the mutation hook.
    pub fn set_sink(&self, sink: Arc<dyn ChangeSink>) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = sink;
    }

    // ── Reads ────────────────────────────────────────────────────

    pub fn find_all(&self) -> Vec<T> {
        self.read().clone()
    }

    pub fn find_one(&self, id: RecordId) -> Option<T> {
        self.read().iter().find(|r| r.id() == id).cloned()
    }

    /// Like [`find_one`](Self::find_one), but absent ids are an error.
    pub fn get(&self, id: RecordId) -> ModelResult<T> {
        self.find_one(id)
            .ok_or(ModelError::NotFound { kind: T::KIND, id })
    }

    pub fn find_by(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.read().iter().filter(|r| predicate(*r)).cloned().collect()
    }

    /// Records whose top-level JSON field `field` equals `value`.
    ///
    /// Field names are the camelCase JSON names (`loanType`, `enquiryId`).
    pub fn find_by_field(&self, field: &str, value: &Value) -> Vec<T> {
        self.find_by(|record| {
            serde_json::to_value(record)
                .ok()
                .and_then(|json| json.get(field).cloned())
                .is_some_and(|found| &found == value)
        })
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Inserts `draft` with a freshly allocated id and current timestamps.
    ///
    /// Whatever id and timestamps the draft carried are overwritten.
    pub fn create(&self, mut draft: T) -> ModelResult<T> {
        let id = RecordId::new(self.ids.next(T::KIND.as_str()));
        draft.set_id(id);
        *draft.timestamps_mut() = Timestamps::now();

        {
            let mut records = self.write();
            records.push(draft.clone());
            self.persist(&records)?;
        }

        info!(entity_type = %T::KIND, %id, "Record created");
        self.notify_saved(&draft);
        Ok(draft)
    }

    /// Applies `change` to the record with `id` and bumps `updatedAt`.
    ///
    /// The id and `createdAt` are restored after `change` runs, so a closure
    /// cannot move a record to a different id.
    pub fn update(&self, id: RecordId, change: impl FnOnce(&mut T)) -> ModelResult<T> {
        let updated = {
            let mut records = self.write();
            let record = records
                .iter_mut()
                .find(|r| r.id() == id)
                .ok_or(ModelError::NotFound { kind: T::KIND, id })?;

            let created_at = record.timestamps().created_at;
            change(record);
            record.set_id(id);
            record.timestamps_mut().created_at = created_at;
            record.timestamps_mut().touch();

            let updated = record.clone();
            self.persist(&records)?;
            updated
        };

        debug!(entity_type = %T::KIND, %id, "Record updated");
        self.notify_saved(&updated);
        Ok(updated)
    }

    /// Removes and returns the record with `id`.
    pub fn remove(&self, id: RecordId) -> ModelResult<T> {
        let removed = {
            let mut records = self.write();
            let index = records
                .iter()
                .position(|r| r.id() == id)
                .ok_or(ModelError::NotFound { kind: T::KIND, id })?;
            let removed = records.remove(index);
            self.persist(&records)?;
            removed
        };

        info!(entity_type = %T::KIND, %id, "Record removed");
        self.current_sink().record_removed(T::KIND, id);
        Ok(removed)
    }

    /// Writes the current list to the store. Used at shutdown.
    pub fn flush(&self) -> ModelResult<()> {
        let records = self.read();
        self.persist(&records)
    }

    // ── Internals ────────────────────────────────────────────────

    fn persist(&self, records: &[T]) -> ModelResult<()> {
        if self.unreadable.is_empty() {
            self.store.save(T::KIND.storage_key(), records)?;
            return Ok(());
        }

        let mut all = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()?;
        all.extend(self.unreadable.iter().cloned());
        self.store.save(T::KIND.storage_key(), &all)?;
        Ok(())
    }

    fn notify_saved(&self, record: &T) {
        match serde_json::to_value(record) {
            Ok(json) => self.current_sink().record_saved(T::KIND, record.id(), json),
            Err(e) => warn!(entity_type = %T::KIND, id = %record.id(), "Cannot encode record for sync: {e}"),
        }
    }

    fn current_sink(&self) -> Arc<dyn ChangeSink> {
        self.sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}
