//! Bounded fire-and-forget dispatch of single-record syncs.
//!
//! Repository mutations enqueue a job and return immediately; a fixed pool
//! of workers drains the queues against the mirror. Every job for one
//! record goes to the same worker, and the worker pushes the record's
//! state at the time it runs, so remote writes follow local order. A full
//! queue drops the job with a warning rather than blocking the writer.
//! Dropped or failed jobs are repaired by the next full sync.

use crate::synchronizer::Synchronizer;
use lendstack_model::ChangeSink;
use lendstack_types::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Work item for a dispatcher worker: mirror the current local state of
/// one record, whether that is an upsert or a remote delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncJob {
    pub kind: EntityKind,
    pub id: RecordId,
}

impl SyncJob {
    pub fn new(kind: EntityKind, id: RecordId) -> Self {
        Self { kind, id }
    }

    /// Index of the worker that owns this record.
    fn route(&self, workers: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        (self.kind, self.id).hash(&mut hasher);
        (hasher.finish() % workers as u64) as usize
    }
}

/// Dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchCounts {
    pub enqueued: u64,
    pub dropped: u64,
    pub completed: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Worker pool fed by repository mutations.
pub struct SyncDispatcher {
    /// One queue per worker; `None` after shutdown.
    queues: Mutex<Option<Vec<mpsc::Sender<SyncJob>>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl SyncDispatcher {
    /// Spawns the workers on the current tokio runtime.
    ///
    /// Worker count and per-worker queue capacity come from the
    /// synchronizer's config; both are at least one.
    pub fn start(sync: Arc<Synchronizer>) -> Arc<Self> {
        let workers = sync.config().workers.max(1);
        let capacity = sync.config().queue_capacity.max(1);
        let counters = Arc::new(Counters::default());

        let (queues, handles): (Vec<_>, Vec<_>) = (0..workers)
            .map(|worker| {
                let (job_tx, job_rx) = mpsc::channel(capacity);
                let handle = tokio::spawn(Self::run_worker(
                    worker,
                    sync.clone(),
                    job_rx,
                    counters.clone(),
                ));
                (job_tx, handle)
            })
            .unzip();

        info!(workers, capacity, "Sync dispatcher started");
        Arc::new(Self {
            queues: Mutex::new(Some(queues)),
            workers: Mutex::new(handles),
            counters,
        })
    }

    /// Enqueues `job` on its record's worker without waiting. Returns
    /// whether it was accepted.
    pub fn dispatch(&self, job: SyncJob) -> bool {
        let SyncJob { kind, id } = job;
        let sender = self
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|queues| queues[job.route(queues.len())].clone());

        let Some(sender) = sender else {
            warn!(entity_type = %kind, %id, "Sync dispatcher stopped, dropping job");
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        match sender.try_send(job) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(entity_type = %kind, %id, "Sync queue full, dropping job");
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(entity_type = %kind, %id, "Sync queue closed, dropping job");
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn counts(&self) -> DispatchCounts {
        DispatchCounts {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Stops accepting jobs, lets the workers drain the queue, and waits
    /// for them to exit. Later calls return immediately.
    pub async fn shutdown(&self) {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let handles: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        if handles.is_empty() {
            return;
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Sync worker ended abnormally: {e}");
            }
        }
        info!(counts = ?self.counts(), "Sync dispatcher drained");
    }

    async fn run_worker(
        worker: usize,
        sync: Arc<Synchronizer>,
        mut job_rx: mpsc::Receiver<SyncJob>,
        counters: Arc<Counters>,
    ) {
        while let Some(SyncJob { kind, id }) = job_rx.recv().await {
            match sync.sync_current(kind, id).await {
                Ok(()) => {
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(entity_type = %kind, %id, worker, "Background sync failed: {e}");
                }
            }
        }
        debug!(worker, "Sync queue closed, worker exiting");
    }
}

impl ChangeSink for SyncDispatcher {
    fn record_saved(&self, kind: EntityKind, id: RecordId, _record: Value) {
        self.dispatch(SyncJob::new(kind, id));
    }

    fn record_removed(&self, kind: EntityKind, id: RecordId) {
        self.dispatch(SyncJob::new(kind, id));
    }
}
