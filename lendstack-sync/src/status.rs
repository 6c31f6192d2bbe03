//! Local vs remote visibility summary for operational endpoints.

use crate::error::SyncResult;
use crate::synchronizer::Synchronizer;
use chrono::{DateTime, Utc};
use lendstack_storage::StorageLocation;
use lendstack_types::EntityKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Store key of the persisted status snapshot (`deployment-status.json`).
pub const STATUS_SNAPSHOT_KEY: &str = "deployment-status";

/// Visibility of one entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStatus {
    pub entity_type: EntityKind,
    pub local_count: usize,
    /// `None` when the count could not be read.
    pub remote_count: Option<u64>,
    pub last_sync_timestamp: Option<DateTime<Utc>>,
    pub remote_reachable: bool,
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// State of the local durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSummary {
    pub location: StorageLocation,
    pub degraded: bool,
    pub disk_write_failures: u64,
    pub counter_fallbacks: u64,
}

/// Every entity type's status plus store health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub generated_at: DateTime<Utc>,
    pub provider: String,
    pub periodic_sync: bool,
    /// True when every entity type is healthy.
    pub healthy: bool,
    pub entities: Vec<EntityStatus>,
    pub storage: StorageSummary,
}

/// Read-only comparison of local and remote record counts.
///
/// Only [`write_snapshot`](Self::write_snapshot) writes anything, and only
/// to the local store.
pub struct StatusReporter {
    sync: Arc<Synchronizer>,
}

impl StatusReporter {
    pub fn new(sync: Arc<Synchronizer>) -> Self {
        Self { sync }
    }

    fn periodic_enabled(&self) -> bool {
        self.sync.config().periodic_interval().is_some()
    }

    /// Status of one entity type.
    pub async fn status(&self, kind: EntityKind) -> EntityStatus {
        let local_count = self.sync.repositories().get(kind).count();
        let last_success = self.sync.ledger().last_success(kind);

        let (remote_count, remote_reachable, error) = match self.sync.remote_count(kind).await {
            Ok(count) => (Some(count), true, None),
            Err(e) => {
                debug!(entity_type = %kind, "Remote count unavailable: {e}");
                (None, !e.is_connectivity(), Some(e.to_string()))
            }
        };

        let healthy = remote_count.is_some()
            && is_healthy(
                remote_reachable,
                local_count,
                last_success,
                self.periodic_enabled().then(|| self.sync.config().freshness_window()),
                Utc::now(),
            );

        EntityStatus {
            entity_type: kind,
            local_count,
            remote_count,
            last_sync_timestamp: last_success,
            remote_reachable,
            healthy,
            error,
        }
    }

    /// Status of every entity type plus store health.
    pub async fn summary(&self) -> SyncSummary {
        let mut entities = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            entities.push(self.status(kind).await);
        }

        let repos = self.sync.repositories();
        let store = repos.store();
        SyncSummary {
            generated_at: Utc::now(),
            provider: self.sync.mirror().provider_name().to_string(),
            periodic_sync: self.periodic_enabled(),
            healthy: entities.iter().all(|e| e.healthy),
            entities,
            storage: StorageSummary {
                location: store.location().clone(),
                degraded: store.is_degraded(),
                disk_write_failures: store.disk_write_failures(),
                counter_fallbacks: repos.ids().fallback_count(),
            },
        }
    }

    /// Computes the summary and overwrites the snapshot under
    /// [`STATUS_SNAPSHOT_KEY`].
    pub async fn write_snapshot(&self) -> SyncResult<SyncSummary> {
        let summary = self.summary().await;
        self.sync
            .repositories()
            .store()
            .save(STATUS_SNAPSHOT_KEY, &summary)?;
        info!(healthy = summary.healthy, "Status snapshot written");
        Ok(summary)
    }
}

/// Health rule for one entity type.
///
/// Healthy means the mirror is reachable, there is local data, and, when
/// `freshness` is set (periodic sync enabled), the last clean sync finished
/// within that window of `now`.
pub fn is_healthy(
    remote_reachable: bool,
    local_count: usize,
    last_success: Option<DateTime<Utc>>,
    freshness: Option<Duration>,
    now: DateTime<Utc>,
) -> bool {
    if !remote_reachable || local_count == 0 {
        return false;
    }
    match freshness {
        None => true,
        Some(window) => last_success.is_some_and(|at| {
            now.signed_duration_since(at)
                .to_std()
                .map_or(true, |age| age <= window)
        }),
    }
}
