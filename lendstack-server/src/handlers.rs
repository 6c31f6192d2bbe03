use crate::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use lendstack_storage::StorageLocation;
use lendstack_sync::{DispatchCounts, EntityStatus, SyncReport, SyncResult, SyncSummary};
use lendstack_types::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Query string of `POST /api/v1/force-sync/{type}`.
#[derive(Debug, Default, Deserialize)]
pub struct ForceSyncParams {
    /// Delete unprotected remote rows before pushing.
    #[serde(default)]
    pub clear: bool,
}

/// Body of `GET /api/v1/data-summary`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSummary {
    pub counts: BTreeMap<EntityKind, usize>,
    /// Current sequence counter per entity type.
    pub counters: BTreeMap<String, u64>,
    pub storage: StorageLocation,
    pub degraded: bool,
    pub disk_write_failures: u64,
    pub counter_fallbacks: u64,
    pub dispatch: DispatchCounts,
}

// ── Operational ─────────────────────────────────────────────────

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn sync_status(State(state): State<AppState>) -> Json<SyncSummary> {
    Json(state.reporter.summary().await)
}

pub async fn entity_sync_status(
    State(state): State<AppState>,
    Path(entity_type): Path<String>,
) -> Result<Json<EntityStatus>, ApiError> {
    let kind: EntityKind = entity_type.parse()?;
    Ok(Json(state.reporter.status(kind).await))
}

pub async fn force_sync(State(state): State<AppState>) -> Result<Json<Vec<SyncReport>>, ApiError> {
    info!("Force sync requested for every entity type");
    let result = state.sync.sync_everything().await;
    write_snapshot(&state).await;
    Ok(Json(result?))
}

pub async fn force_sync_one(
    State(state): State<AppState>,
    Path(entity_type): Path<String>,
    Query(params): Query<ForceSyncParams>,
) -> Result<Json<SyncReport>, ApiError> {
    let kind: EntityKind = entity_type.parse()?;
    info!(entity_type = %kind, clear = params.clear, "Force sync requested");

    let result: SyncResult<SyncReport> = if params.clear {
        state.sync.clear_and_sync_all(kind).await
    } else {
        state.sync.sync_all(kind).await
    };
    write_snapshot(&state).await;
    Ok(Json(result?))
}

pub async fn data_summary(State(state): State<AppState>) -> Json<DataSummary> {
    let store = state.repos.store();
    let counts = state
        .repos
        .all()
        .iter()
        .map(|repo| (repo.kind(), repo.count()))
        .collect();

    Json(DataSummary {
        counts,
        counters: state.repos.ids().all(),
        storage: store.location().clone(),
        degraded: store.is_degraded(),
        disk_write_failures: store.disk_write_failures(),
        counter_fallbacks: state.repos.ids().fallback_count(),
        dispatch: state.dispatcher.counts(),
    })
}

async fn write_snapshot(state: &AppState) {
    if let Err(e) = state.reporter.write_snapshot().await {
        warn!("Failed to write status snapshot: {e}");
    }
}

// ── Entities ────────────────────────────────────────────────────

pub async fn list_entities(
    State(state): State<AppState>,
    Path(entity_type): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let kind: EntityKind = entity_type.parse()?;
    Ok(Json(state.repos.get(kind).snapshot()?))
}

pub async fn create_entity(
    State(state): State<AppState>,
    Path(entity_type): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let kind: EntityKind = entity_type.parse()?;
    let created = state.repos.create_json(kind, body)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_entity(
    State(state): State<AppState>,
    Path((entity_type, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let (kind, id) = parse_target(&entity_type, &id)?;
    Ok(Json(state.repos.get(kind).find_json(id)?))
}

pub async fn update_entity(
    State(state): State<AppState>,
    Path((entity_type, id)): Path<(String, String)>,
    Json(patch): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let (kind, id) = parse_target(&entity_type, &id)?;
    Ok(Json(state.repos.get(kind).update_json(id, patch)?))
}

pub async fn delete_entity(
    State(state): State<AppState>,
    Path((entity_type, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let (kind, id) = parse_target(&entity_type, &id)?;
    Ok(Json(state.repos.get(kind).remove_json(id)?))
}

fn parse_target(entity_type: &str, id: &str) -> Result<(EntityKind, RecordId), ApiError> {
    Ok((entity_type.parse()?, id.parse()?))
}
