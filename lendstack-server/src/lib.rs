//! HTTP surface for the lendstack backend.
//!
//! Operational endpoints (`sync-status`, `force-sync`, `data-summary`) call
//! straight into the sync layer. The entity endpoints are a thin JSON view
//! over the repositories, so every mutation made through them takes the
//! fire-and-forget path to the remote mirror.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{DataSummary, ForceSyncParams};

use axum::Router;
use axum::routing::{get, post};
use lendstack_model::Repositories;
use lendstack_sync::{RemoteMirror, StatusReporter, SyncConfig, SyncDispatcher, Synchronizer};
use std::sync::Arc;

/// Shared handles behind every route.
#[derive(Clone)]
pub struct AppState {
    pub repos: Arc<Repositories>,
    pub sync: Arc<Synchronizer>,
    pub reporter: Arc<StatusReporter>,
    pub dispatcher: Arc<SyncDispatcher>,
}

impl AppState {
    /// Wires the synchronizer, reporter and dispatcher around `repos` and
    /// installs the dispatcher as the repositories' change sink.
    ///
    /// Must be called inside a tokio runtime; the dispatcher spawns its
    /// workers immediately.
    pub fn new(repos: Arc<Repositories>, mirror: Arc<dyn RemoteMirror>, config: SyncConfig) -> Self {
        let sync = Arc::new(Synchronizer::new(repos.clone(), mirror, config));
        let reporter = Arc::new(StatusReporter::new(sync.clone()));
        let dispatcher = SyncDispatcher::start(sync.clone());
        repos.set_sink(dispatcher.clone());

        Self {
            repos,
            sync,
            reporter,
            dispatcher,
        }
    }
}

/// Build the axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/sync-status", get(handlers::sync_status))
        .route("/api/v1/sync-status/{entity_type}", get(handlers::entity_sync_status))
        .route("/api/v1/force-sync", post(handlers::force_sync))
        .route("/api/v1/force-sync/{entity_type}", post(handlers::force_sync_one))
        .route("/api/v1/data-summary", get(handlers::data_summary))
        .route(
            "/api/v1/entities/{entity_type}",
            get(handlers::list_entities).post(handlers::create_entity),
        )
        .route(
            "/api/v1/entities/{entity_type}/{id}",
            get(handlers::get_entity)
                .patch(handlers::update_entity)
                .delete(handlers::delete_entity),
        )
        .with_state(state)
}
