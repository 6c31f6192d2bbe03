//! One repository per entity type, constructed once at process start.

use crate::entities::{Document, Enquiry, Notification, Staff, Transaction};
use crate::erased::EntityRepository;
use crate::error::ModelResult;
use crate::record::{ChangeSink, Record};
use crate::repository::Repository;
use crate::seed;
use lendstack_storage::{KvStore, SequenceAllocator};
use lendstack_types::EntityKind;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// The full set of repositories sharing one store and one allocator.
pub struct Repositories {
    pub enquiries: Arc<Repository<Enquiry>>,
    pub documents: Arc<Repository<Document>>,
    pub staff: Arc<Repository<Staff>>,
    pub transactions: Arc<Repository<Transaction>>,
    pub notifications: Arc<Repository<Notification>>,
    store: Arc<KvStore>,
    ids: Arc<SequenceAllocator>,
}

impl Repositories {
    /// Opens every repository, seeding empty ones with sample data.
    pub fn open(store: Arc<KvStore>) -> ModelResult<Self> {
        Self::build(store, true)
    }

    /// Opens every repository without sample data.
    pub fn open_unseeded(store: Arc<KvStore>) -> ModelResult<Self> {
        Self::build(store, false)
    }

    fn build(store: Arc<KvStore>, seeded: bool) -> ModelResult<Self> {
        let ids = Arc::new(SequenceAllocator::new(store.clone()));
        let repos = Self {
            enquiries: Arc::new(open_repo(&store, &ids, pick(seeded, seed::enquiries))?),
            documents: Arc::new(open_repo(&store, &ids, pick(seeded, seed::documents))?),
            staff: Arc::new(open_repo(&store, &ids, pick(seeded, seed::staff))?),
            transactions: Arc::new(open_repo(&store, &ids, pick(seeded, seed::transactions))?),
            notifications: Arc::new(open_repo(&store, &ids, pick(seeded, seed::notifications))?),
            store,
            ids,
        };

        info!(
            location = %repos.store.location(),
            "Repositories ready: {}",
            repos
                .all()
                .iter()
                .map(|r| format!("{}={}", r.kind(), r.count()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(repos)
    }

    /// The repository for `kind`.
    pub fn get(&self, kind: EntityKind) -> Arc<dyn EntityRepository> {
        match kind {
            EntityKind::Enquiry => self.enquiries.clone(),
            EntityKind::Document => self.documents.clone(),
            EntityKind::Staff => self.staff.clone(),
            EntityKind::Transaction => self.transactions.clone(),
            EntityKind::Notification => self.notifications.clone(),
        }
    }

    /// Every repository, in [`EntityKind::ALL`] order.
    pub fn all(&self) -> Vec<Arc<dyn EntityRepository>> {
        EntityKind::ALL.into_iter().map(|kind| self.get(kind)).collect()
    }

    pub fn store(&self) -> &Arc<KvStore> {
        &self.store
    }

    pub fn ids(&self) -> &Arc<SequenceAllocator> {
        &self.ids
    }

    /// Installs `sink` on every repository.
    pub fn set_sink(&self, sink: Arc<dyn ChangeSink>) {
        for repo in self.all() {
            repo.set_sink(sink.clone());
        }
    }

    /// Creates a record of `kind` from JSON.
    ///
    /// A new enquiry also records an acknowledgement notification; failure
    /// to record it is logged and does not fail the enquiry.
    pub fn create_json(&self, kind: EntityKind, body: Value) -> ModelResult<Value> {
        let created = self.get(kind).create_json(body)?;

        if kind == EntityKind::Enquiry {
            match serde_json::from_value::<Enquiry>(created.clone()) {
                Ok(enquiry) => {
                    let notice = Notification::for_new_enquiry(&enquiry);
                    if let Err(e) = self.notifications.create(notice) {
                        warn!(enquiry = %enquiry.id(), "Failed to record enquiry notification: {e}");
                    }
                }
                Err(e) => warn!("Created enquiry could not be re-read: {e}"),
            }
        }

        Ok(created)
    }

    /// Persists every repository. Called at shutdown.
    pub fn flush_all(&self) -> ModelResult<()> {
        for repo in self.all() {
            repo.flush()?;
        }
        info!("All repositories flushed");
        Ok(())
    }
}

fn open_repo<T: Record>(
    store: &Arc<KvStore>,
    ids: &Arc<SequenceAllocator>,
    seed: Vec<T>,
) -> ModelResult<Repository<T>> {
    Repository::open(store.clone(), ids.clone(), seed)
}

fn pick<T>(seeded: bool, records: fn() -> Vec<T>) -> Vec<T> {
    if seeded { records() } else { Vec::new() }
}
