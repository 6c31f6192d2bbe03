//! Sync ledger.
//!
//! Tracks, per entity type, when a full sync was last attempted, when one
//! last finished cleanly, and the report of the latest run. Lives in memory
//! only; the status snapshot is the persisted view.

use crate::report::SyncReport;
use chrono::{DateTime, Utc};
use lendstack_types::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Ledger state for a single entity type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub last_attempt: Option<DateTime<Utc>>,
    /// Finish time of the latest run with no failures.
    pub last_success: Option<DateTime<Utc>>,
    pub last_report: Option<SyncReport>,
}

impl LedgerEntry {
    /// Folds a finished run into the entry.
    pub fn record(&mut self, report: &SyncReport) {
        self.last_attempt = Some(report.finished_at);
        if report.is_clean() {
            self.last_success = Some(report.finished_at);
        }
        self.last_report = Some(report.clone());
    }
}

/// Per-type sync history shared by the synchronizer and the status reporter.
#[derive(Debug, Default)]
pub struct SyncLedger {
    entries: RwLock<BTreeMap<EntityKind, LedgerEntry>>,
}

impl SyncLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a full sync.
    pub fn record(&self, report: &SyncReport) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(report.entity_type)
            .or_default()
            .record(report);
    }

    /// Entry for `kind`; default (all empty) when never synced.
    pub fn entry(&self, kind: EntityKind) -> LedgerEntry {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub fn last_success(&self, kind: EntityKind) -> Option<DateTime<Utc>> {
        self.entry(kind).last_success
    }

    /// Every entry recorded so far.
    pub fn snapshot(&self) -> BTreeMap<EntityKind, LedgerEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
