use lendstack_types::{EntityKind, RecordId, Timestamps};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// What every entity record shares.
///
/// Records serialize to camelCase JSON with `id`, `createdAt` and
/// `updatedAt` at the top level; that JSON form is what the store persists
/// and what the sync layer maps onto remote rows.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The entity type this record belongs to.
    const KIND: EntityKind;

    fn id(&self) -> RecordId;

    fn set_id(&mut self, id: RecordId);

    fn timestamps(&self) -> &Timestamps;

    fn timestamps_mut(&mut self) -> &mut Timestamps;
}

/// Receives notice of persisted mutations.
///
/// Called after the repository has updated its list and written it to the
/// store, outside the repository lock. Implementations must not block: the
/// sync dispatcher only enqueues work here.
pub trait ChangeSink: Send + Sync {
    /// A record was created or updated. `record` is its JSON form.
    fn record_saved(&self, kind: EntityKind, id: RecordId, record: serde_json::Value) {
        let _ = (kind, id, record);
    }

    /// A record was removed.
    fn record_removed(&self, kind: EntityKind, id: RecordId) {
        let _ = (kind, id);
    }
}

/// Sink that ignores every change. Default for a fresh repository.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ChangeSink for NoopSink {}
