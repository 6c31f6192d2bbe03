//! Per-type integer id allocation backed by the key-value store.

use crate::error::{StorageError, StorageResult};
use crate::kv::KvStore;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

const COUNTER_SUFFIX: &str = "_counter";

/// Modulus of the degraded-mode id.
const FALLBACK_MODULUS: i64 = 100;

/// Issues small, monotonically increasing ids per entity type.
///
/// Each counter lives in the [`KvStore`] at `<type>_counter` and holds the
/// last id handed out. Allocation is read-increment-write under a per-type
/// mutex, so concurrent callers on a multi-threaded runtime never observe
/// the same value.
pub struct SequenceAllocator {
    store: Arc<KvStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    fallbacks: AtomicU64,
}

impl SequenceAllocator {
    /// Creates an allocator over `store`.
    pub fn new(store: Arc<KvStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Returns the next id for `entity_type`.
    ///
    /// Never fails. When the counter cannot be read or written the id is
    /// derived from the clock (`now mod 100`) and may collide; this degraded
    /// path is logged under the `lendstack::counter_fallback` target.
    pub fn next(&self, entity_type: &str) -> u64 {
        let lock = self.lock_for(entity_type);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        match self.advance(entity_type) {
            Ok(id) => {
                debug!(entity_type, id, "Allocated id");
                id
            }
            Err(e) => {
                let id = fallback_id();
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                warn!(
                    target: "lendstack::counter_fallback",
                    entity_type,
                    id,
                    "Counter unavailable, using timestamp-derived id: {e}"
                );
                id
            }
        }
    }

    /// Last id handed out for `entity_type`, or 0 if none.
    pub fn current(&self, entity_type: &str) -> StorageResult<u64> {
        Ok(self.store.get::<u64>(&counter_key(entity_type))?.unwrap_or(0))
    }

    /// Administrative override: the next allocation returns `start_value`.
    pub fn reset(&self, entity_type: &str, start_value: u64) -> StorageResult<()> {
        let lock = self.lock_for(entity_type);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.store
            .save(&counter_key(entity_type), &start_value.saturating_sub(1))?;
        info!(entity_type, start_value, "Counter reset");
        Ok(())
    }

    /// Raises the counter so that it is at least `id`.
    ///
    /// Used when records with pre-assigned ids (seed data, imports) enter a
    /// repository, so later allocations never reuse them.
    pub fn observe(&self, entity_type: &str, id: u64) -> StorageResult<()> {
        let lock = self.lock_for(entity_type);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let key = counter_key(entity_type);
        let current = self.store.get::<u64>(&key)?.unwrap_or(0);
        if id > current {
            self.store.save(&key, &id)?;
            debug!(entity_type, from = current, to = id, "Counter raised");
        }
        Ok(())
    }

    /// Every known counter and its current value, keyed by entity type.
    ///
    /// Counters that fail to parse are skipped.
    pub fn all(&self) -> BTreeMap<String, u64> {
        self.store
            .keys()
            .into_iter()
            .filter_map(|key| {
                let entity_type = key.strip_suffix(COUNTER_SUFFIX)?.to_string();
                let value = self.store.get::<u64>(&key).ok().flatten()?;
                Some((entity_type, value))
            })
            .collect()
    }

    /// Number of allocations served by the timestamp fallback.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    fn advance(&self, entity_type: &str) -> StorageResult<u64> {
        let key = counter_key(entity_type);
        let current = self.store.get::<u64>(&key)?.unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or_else(|| StorageError::CounterOverflow(key.clone()))?;
        self.store.save(&key, &next)?;
        Ok(next)
    }

    fn lock_for(&self, entity_type: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(entity_type.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn counter_key(entity_type: &str) -> String {
    format!("{entity_type}{COUNTER_SUFFIX}")
}

fn fallback_id() -> u64 {
    Utc::now().timestamp_millis().rem_euclid(FALLBACK_MODULUS) as u64
}
