//! HTTP handlers for classification, history and model management

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::error::SpamError;
use crate::history::{HistoryPage, HistoryRecorder, NewHistoryEntry, SqliteHistory};
use crate::inference::InferenceService;
use crate::model::pipeline::ArtifactMetadata;
use crate::model::types::Label;

/// Header carrying the caller's identity, set by an upstream auth layer
pub const USER_ID_HEADER: &str = "x-user-id";

const CLASSIFY_UNAVAILABLE: &str = "classification temporarily unavailable";
const HISTORY_UNAVAILABLE: &str = "history temporarily unavailable";
const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Shared application state
pub struct AppState {
    pub inference: InferenceService,
    pub history: Arc<SqliteHistory>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub label: Label,
    /// Winning-class probability, two decimals ("97.31")
    pub probability: String,
    pub spam_probability: f64,
    /// Set when the check was recorded
    pub history_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Map a core error to a status code without leaking its details
fn error_response(err: &SpamError, unavailable: &str) -> Response {
    let (status, message) = match err {
        SpamError::EmptyInput => (StatusCode::BAD_REQUEST, "email text must not be empty"),
        SpamError::NotFound(_) => (StatusCode::NOT_FOUND, "not found"),
        _ => {
            warn!("Request failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, unavailable)
        }
    };
    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_healthy = state.history.health_check().await.is_ok();
    let model_healthy = state.inference.cache().is_loaded().await;

    let healthy = db_healthy && model_healthy;
    let status = if healthy { "healthy" } else { "unhealthy" };
    let status_code = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status_code,
        Json(serde_json::json!({
            "status": status,
            "service": "spam-rs",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "checks": {
                "database": if db_healthy { "ok" } else { "failed" },
                "model": if model_healthy { "ok" } else { "not_loaded" }
            }
        })),
    )
}

/// POST /api/check - Classify one text and record the result
pub async fn check(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CheckRequest>,
) -> Response {
    let result = match state.inference.classify(&req.text).await {
        Ok(result) => result,
        Err(e) => return error_response(&e, CLASSIFY_UNAVAILABLE),
    };

    // A failed history write does not fail the classification
    let entry = NewHistoryEntry::from_result(user_id(&headers), req.text, &result);
    let history_id = match state.history.record(entry).await {
        Ok(stored) => Some(stored.id),
        Err(e) => {
            warn!("Failed to record history: {}", e);
            None
        }
    };

    let response = CheckResponse {
        label: result.label,
        probability: result.probability_display(),
        spam_probability: result.spam_probability,
        history_id,
    };
    (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
}

/// GET /api/history - Caller's checks, newest first
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    let owner = user_id(&headers);

    match state.history.page(owner.as_deref(), limit, offset).await {
        Ok(page) => (StatusCode::OK, Json(ApiResponse::<HistoryPage>::success(page))).into_response(),
        Err(e) => error_response(&e, HISTORY_UNAVAILABLE),
    }
}

/// DELETE /api/history/:id
pub async fn delete_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let owner = user_id(&headers);
    match state.history.delete(&id, owner.as_deref()).await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::success(id))).into_response(),
        Err(e) => error_response(&e, HISTORY_UNAVAILABLE),
    }
}

/// GET /api/model - Metadata of the loaded pipeline
pub async fn model_info(State(state): State<Arc<AppState>>) -> Response {
    match state.inference.model_metadata().await {
        Ok(metadata) => {
            (StatusCode::OK, Json(ApiResponse::<ArtifactMetadata>::success(metadata))).into_response()
        }
        Err(e) => error_response(&e, CLASSIFY_UNAVAILABLE),
    }
}

/// POST /api/model/reload - Drop the cached pipeline and load the artifact again
pub async fn reload_model(State(state): State<Arc<AppState>>) -> Response {
    match state.inference.reload().await {
        Ok(metadata) => {
            (StatusCode::OK, Json(ApiResponse::<ArtifactMetadata>::success(metadata))).into_response()
        }
        Err(e) => error_response(&e, CLASSIFY_UNAVAILABLE),
    }
}
