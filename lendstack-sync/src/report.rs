//! Outcome of one synchronization run.

use chrono::{DateTime, Utc};
use lendstack_types::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A record that did not reach the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    /// `None` when the record had no usable id.
    pub id: Option<RecordId>,
    pub error: String,
}

/// Aggregate counts for one `sync_all` over an entity type.
///
/// Returned to the caller and kept as the latest entry in the ledger;
/// never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub entity_type: EntityKind,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Set when the run stopped before visiting every record.
    #[serde(default)]
    pub aborted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RecordFailure>,
}

impl SyncReport {
    /// An empty report started now.
    pub fn begin(entity_type: EntityKind) -> Self {
        let now = Utc::now();
        Self {
            entity_type,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            started_at: now,
            finished_at: now,
            aborted: false,
            failures: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, id: Option<RecordId>, error: impl fmt::Display) {
        self.attempted += 1;
        self.failed += 1;
        self.failures.push(RecordFailure {
            id,
            error: error.to_string(),
        });
    }

    /// Stamps the finish time.
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    /// Marks the run as abandoned and stamps the finish time.
    pub fn abort(mut self) -> Self {
        self.aborted = true;
        self.finish()
    }

    /// True when every visited record succeeded and the run was not cut short.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && !self.aborted
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} succeeded, {} failed of {} attempted",
            self.entity_type, self.succeeded, self.failed, self.attempted
        )?;
        if self.aborted {
            f.write_str(", aborted")?;
        }
        Ok(())
    }
}
