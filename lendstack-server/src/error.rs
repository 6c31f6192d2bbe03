//! Mapping of library errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lendstack_model::ModelError;
use lendstack_sync::{SyncError, SyncReport};
use serde_json::json;
use tracing::{error, warn};

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// The remote mirror could not be reached; carries the partial counts.
    Unreachable { message: String, report: SyncReport },
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Unreachable { message, report } => {
                warn!("Remote mirror unreachable: {message}");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": message, "report": report }),
                )
            }
            ApiError::Internal(message) => {
                error!("Request failed: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": message }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ModelError::InvalidPayload(_) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Unreachable { report } => ApiError::Unreachable {
                message: format!("remote mirror unreachable ({report})"),
                report: *report,
            },
            SyncError::Model(model) => model.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<lendstack_types::Error> for ApiError {
    fn from(e: lendstack_types::Error) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}
