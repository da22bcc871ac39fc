//! API module for HTTP and WebSocket endpoints
//!
//! This module provides event ingestion, log listing and WebSocket model
//! streaming for process-model clients.

pub mod http;
pub mod rest;
pub mod websocket;

pub use http::create_router;
pub use websocket::AppState;
