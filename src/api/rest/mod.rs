//! REST API module for HTTP endpoints
//!
//! - `POST /notify` - Submit an event
//! - `GET /logs` - List known logs
//! - `GET /logs/:log/model` - Current model snapshot of a log

pub mod events;
pub mod logs;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::MinerError;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Sequence id of the last update reflected in `data`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<u64>,
    /// Total count (for list responses)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, sequence_id: u64) -> Self {
        Self {
            data,
            sequence_id: Some(sequence_id),
            total: None,
        }
    }

    pub fn list(data: T, total: usize) -> Self {
        Self {
            data,
            sequence_id: None,
            total: Some(total),
        }
    }
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.to_string(),
            status,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn backpressure(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "BACKPRESSURE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<MinerError> for ApiError {
    fn from(error: MinerError) -> Self {
        match error {
            MinerError::Validation(_) => Self::bad_request(error.to_string()),
            MinerError::Backpressure { .. } => Self::backpressure(error.to_string()),
            MinerError::UnknownLog(_) => Self::not_found(error.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
