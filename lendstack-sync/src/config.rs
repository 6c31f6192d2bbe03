//! Synchronizer configuration.

use lendstack_model::seed::SYSTEM_STAFF_IDS;
use lendstack_types::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Tunables for the synchronizer, dispatcher and scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Pause between consecutive upserts in a full sync, to stay under the
    /// mirror's rate limits.
    pub record_delay_ms: u64,
    /// Upper bound on any single mirror call.
    pub request_timeout_ms: u64,
    /// Workers draining the fire-and-forget queues. Jobs for one record
    /// always go to the same worker.
    pub workers: usize,
    /// Pending fire-and-forget jobs per worker; further jobs are dropped
    /// with a warning.
    pub queue_capacity: usize,
    /// Period of the background full sync. `None` disables it.
    pub periodic_interval_secs: Option<u64>,
    /// How recent the last clean sync must be for a type to count as
    /// healthy while periodic sync is enabled.
    pub freshness_window_secs: u64,
    /// Consecutive connectivity failures, with no success yet, after which a
    /// full sync gives up on the batch.
    pub max_consecutive_failures: usize,
    /// Ids that `clear_and_sync_all` never deletes remotely.
    pub protected_ids: BTreeMap<EntityKind, Vec<u64>>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            record_delay_ms: 50,
            request_timeout_ms: 5_000,
            workers: 4,
            queue_capacity: 256,
            periodic_interval_secs: None,
            freshness_window_secs: 600,
            max_consecutive_failures: 3,
            protected_ids: BTreeMap::from([(EntityKind::Staff, SYSTEM_STAFF_IDS.to_vec())]),
        }
    }
}

impl SyncConfig {
    pub fn record_delay(&self) -> Duration {
        Duration::from_millis(self.record_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn periodic_interval(&self) -> Option<Duration> {
        self.periodic_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    /// Protected ids for `kind`, empty when none are configured.
    pub fn protected_ids_for(&self, kind: EntityKind) -> &[u64] {
        self.protected_ids.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}
