//! Ingestion endpoint

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::ApiError;
use crate::api::websocket::state::AppState;
use crate::types::Event;

#[derive(Debug, Serialize)]
pub struct Accepted {
    pub status: &'static str,
}

/// POST /notify - Submit an event for its log
///
/// Returns as soon as the event is buffered; the model is rebuilt on the next
/// rebuild tick. A body that is not an event is a 400 like any other
/// invalid event.
pub async fn notify(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Event>, JsonRejection>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    let Json(event) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    state.service.submit_event(event).await?;
    Ok((StatusCode::ACCEPTED, Json(Accepted { status: "accepted" })))
}
