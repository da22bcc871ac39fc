//! HTTP server setup with Axum

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rest::{events, logs};
use super::websocket::{handler::ws_handler, state::AppState};

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket subscription per log
        .route("/ws/:log", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        // Ingestion
        .route("/notify", post(events::notify))
        // Listing and recovery
        .route("/logs", get(logs::list_logs))
        .route("/logs/:log/model", get(logs::get_model))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
