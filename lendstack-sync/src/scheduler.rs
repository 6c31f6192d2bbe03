//! Periodic background full sync.

use crate::status::StatusReporter;
use crate::synchronizer::Synchronizer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Handle to the periodic sync task.
pub struct PeriodicSync {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PeriodicSync {
    /// Spawns a task that runs a full pass every `interval`, starting one
    /// interval from now, and writes the status snapshot after each pass.
    ///
    /// A tick that finds another full pass in progress is skipped.
    pub fn spawn(
        sync: Arc<Synchronizer>,
        reporter: Arc<StatusReporter>,
        interval: Duration,
    ) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_secs = interval.as_secs(), "Periodic sync scheduled");

            loop {
                tokio::select! {
                    _ = ticker.tick() => run_cycle(&sync, &reporter).await,
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Periodic sync stopped");
        });

        Self { stop_tx, handle }
    }

    /// Stops the task, waiting for a running cycle to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!("Periodic sync task ended abnormally: {e}");
        }
    }
}

/// One scheduled pass: sync everything unless a pass is already running,
/// then refresh the snapshot.
pub async fn run_cycle(sync: &Synchronizer, reporter: &StatusReporter) {
    match sync.try_sync_everything().await {
        None => {
            debug!("Full sync already running, skipping scheduled cycle");
            return;
        }
        Some(Ok(reports)) => {
            let failed: usize = reports.iter().map(|r| r.failed).sum();
            info!(types = reports.len(), failed, "Scheduled sync finished");
        }
        Some(Err(e)) => warn!("Scheduled sync failed: {e}"),
    }

    if let Err(e) = reporter.write_snapshot().await {
        warn!("Failed to write status snapshot: {e}");
    }
}
