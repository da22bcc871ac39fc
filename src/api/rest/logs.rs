//! Log listing and model snapshot endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{ApiError, ApiResponse};
use crate::api::websocket::state::AppState;
use crate::types::Snapshot;

/// GET /logs - Names of all known logs
///
/// Subscribers use this to discover logs before opening `/ws/:log`.
pub async fn list_logs(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<String>>> {
    let logs = state.service.logs();
    let total = logs.len();
    Json(ApiResponse::list(logs, total))
}

/// Response for GET /logs/:log/model
#[derive(Debug, Serialize)]
pub struct ModelResponse {
    pub log: String,
    /// False until the first rebuild of the log finished
    pub built: bool,
    pub model: Snapshot,
}

/// GET /logs/:log/model - Current model of a log
pub async fn get_model(
    State(state): State<Arc<AppState>>,
    Path(log): Path<String>,
) -> Result<Json<ApiResponse<ModelResponse>>, ApiError> {
    let miner = state
        .service
        .registry()
        .get(&log)
        .ok_or_else(|| ApiError::not_found(format!("unknown log '{}'", log)))?;

    let published = miner.published();
    let response = ModelResponse {
        log,
        built: published.snapshot.is_some(),
        model: published
            .snapshot
            .map(|s| (*s).clone())
            .unwrap_or_default(),
    };

    Ok(Json(ApiResponse::new(response, published.sequence_id)))
}
