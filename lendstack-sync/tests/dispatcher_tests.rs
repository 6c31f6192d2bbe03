use async_trait::async_trait;
use lendstack_model::{ChangeSink, Repositories, Staff, StaffRole};
use lendstack_storage::KvStore;
use lendstack_sync::{
    MemoryMirror, Predicate, RemoteMirror, SyncConfig, SyncDispatcher, SyncJob, SyncResult,
    Synchronizer,
};
use lendstack_types::{EntityKind, RecordId, Timestamps};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn setup(config: SyncConfig) -> (Arc<Repositories>, Arc<MemoryMirror>, Arc<SyncDispatcher>) {
    let mirror = Arc::new(MemoryMirror::new());
    let (repos, dispatcher) = setup_with(mirror.clone(), config);
    (repos, mirror, dispatcher)
}

fn setup_with(
    mirror: Arc<dyn RemoteMirror>,
    config: SyncConfig,
) -> (Arc<Repositories>, Arc<SyncDispatcher>) {
    let repos = Arc::new(Repositories::open_unseeded(Arc::new(KvStore::in_memory())).unwrap());
    let sync = Arc::new(Synchronizer::new(repos.clone(), mirror, config));
    let dispatcher = SyncDispatcher::start(sync);
    repos.set_sink(dispatcher.clone());
    (repos, dispatcher)
}

/// Default worker pool, no inter-record delay.
fn config() -> SyncConfig {
    SyncConfig {
        record_delay_ms: 0,
        ..SyncConfig::default()
    }
}

/// Takes `delay` to answer the first upsert; later calls are immediate.
struct SlowFirstUpsert {
    inner: Arc<MemoryMirror>,
    delay: Duration,
    first: AtomicBool,
}

impl SlowFirstUpsert {
    fn new(inner: Arc<MemoryMirror>, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            first: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl RemoteMirror for SlowFirstUpsert {
    fn provider_name(&self) -> &'static str {
        "slow-first"
    }

    async fn ping(&self) -> SyncResult<()> {
        Ok(())
    }

    async fn upsert(&self, table: &str, row: &Value, key: &str) -> SyncResult<()> {
        if self.first.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.upsert(table, row, key).await
    }

    async fn select_count(&self, table: &str) -> SyncResult<u64> {
        self.inner.select_count(table).await
    }

    async fn select_by_id(&self, table: &str, id: u64) -> SyncResult<Option<Value>> {
        self.inner.select_by_id(table, id).await
    }

    async fn delete_where(&self, table: &str, predicate: &Predicate) -> SyncResult<()> {
        self.inner.delete_where(table, predicate).await
    }
}

fn staff(name: &str) -> Staff {
    Staff {
        id: RecordId::default(),
        name: name.to_string(),
        email: format!("{}@lendstack.local", name.to_lowercase()),
        role: StaffRole::Officer,
        active: true,
        password: Some("secret".to_string()),
        timestamps: Timestamps::now(),
    }
}

// ── Fire-and-forget path ────────────────────────────────────────

#[tokio::test]
async fn mutations_reach_the_mirror_after_drain() {
    let (repos, mirror, dispatcher) = setup(config());

    let a = repos.staff.create(staff("Ada")).unwrap();
    let b = repos.staff.create(staff("Ben")).unwrap();
    repos
        .staff
        .update(a.id, |s| s.role = StaffRole::Manager)
        .unwrap();
    repos.staff.remove(b.id).unwrap();

    dispatcher.shutdown().await;

    let rows = mirror.rows("staff");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!(a.id.get()));
    assert!(rows[0].get("password").is_none());

    let counts = dispatcher.counts();
    assert_eq!(counts.enqueued, 4);
    assert_eq!(counts.dropped, 0);
    assert_eq!(counts.completed + counts.failed, 4);
}

#[tokio::test]
async fn mutation_returns_before_sync_completes() {
    let (repos, mirror, dispatcher) = setup(config());

    repos.staff.create(staff("Ada")).unwrap();
    // Workers have not been polled yet on this single-threaded runtime.
    assert!(mirror.rows("staff").is_empty());

    dispatcher.shutdown().await;
    assert_eq!(mirror.rows("staff").len(), 1);
}

#[tokio::test]
async fn remote_failures_do_not_affect_local_writes() {
    let (repos, mirror, dispatcher) = setup(config());
    mirror.set_offline(true);

    let created = repos.staff.create(staff("Ada")).unwrap();
    assert_eq!(repos.staff.get(created.id).unwrap().name, "Ada");

    dispatcher.shutdown().await;
    let counts = dispatcher.counts();
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.completed, 0);
}

// ── Ordering ────────────────────────────────────────────────────

#[tokio::test]
async fn later_update_wins_over_slow_earlier_upsert() {
    let memory = Arc::new(MemoryMirror::new());
    let mirror = Arc::new(SlowFirstUpsert::new(memory.clone(), Duration::from_millis(200)));
    let (repos, dispatcher) = setup_with(mirror, config());

    let ada = repos.staff.create(staff("Ada")).unwrap();
    // Let a worker pick up the create and stall inside its upsert.
    tokio::time::sleep(Duration::from_millis(50)).await;
    repos
        .staff
        .update(ada.id, |s| s.role = StaffRole::Manager)
        .unwrap();

    dispatcher.shutdown().await;

    let row = memory.select_by_id("staff", ada.id.get()).await.unwrap().unwrap();
    assert_eq!(row["role"], json!("manager"));
    assert_eq!(dispatcher.counts().completed, 2);
}

#[tokio::test]
async fn removal_during_slow_upsert_leaves_no_remote_row() {
    let memory = Arc::new(MemoryMirror::new());
    let mirror = Arc::new(SlowFirstUpsert::new(memory.clone(), Duration::from_millis(200)));
    let (repos, dispatcher) = setup_with(mirror, config());

    let ada = repos.staff.create(staff("Ada")).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    repos.staff.remove(ada.id).unwrap();

    dispatcher.shutdown().await;
    assert!(memory.rows("staff").is_empty());
}

#[tokio::test]
async fn worker_pushes_state_current_when_it_runs() {
    let (repos, mirror, dispatcher) = setup(config());

    let ada = repos.staff.create(staff("Ada")).unwrap();
    repos
        .staff
        .update(ada.id, |s| s.name = "Ada Lovelace".to_string())
        .unwrap();
    dispatcher.shutdown().await;

    let rows = mirror.rows("staff");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("Ada Lovelace"));
}

// ── Bounds ──────────────────────────────────────────────────────

#[tokio::test]
async fn full_queue_drops_jobs() {
    let (_, _, dispatcher) = setup(SyncConfig {
        queue_capacity: 2,
        workers: 1,
        ..config()
    });

    let accepted: Vec<bool> = (1..=5)
        .map(|id| dispatcher.dispatch(SyncJob::new(EntityKind::Enquiry, RecordId::new(id))))
        .collect();

    assert_eq!(accepted, vec![true, true, false, false, false]);
    dispatcher.shutdown().await;

    let counts = dispatcher.counts();
    assert_eq!(counts.dropped, 3);
    assert_eq!(counts.completed, 2);
}

#[tokio::test]
async fn capacity_applies_per_worker() {
    let (_, _, dispatcher) = setup(SyncConfig {
        queue_capacity: 1,
        workers: 4,
        ..config()
    });

    // Same record, same worker.
    let job = SyncJob::new(EntityKind::Staff, RecordId::new(7));
    assert!(dispatcher.dispatch(job));
    assert!(!dispatcher.dispatch(job));

    dispatcher.shutdown().await;
    assert_eq!(dispatcher.counts().dropped, 1);
}

#[tokio::test]
async fn jobs_after_shutdown_are_dropped() {
    let (_, _, dispatcher) = setup(config());
    dispatcher.shutdown().await;

    dispatcher.record_removed(EntityKind::Staff, RecordId::new(1));
    assert!(!dispatcher.dispatch(SyncJob::new(EntityKind::Staff, RecordId::new(1))));
    assert_eq!(dispatcher.counts().dropped, 2);

    // Second shutdown is a no-op.
    dispatcher.shutdown().await;
}
