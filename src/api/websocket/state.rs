//! Shared application state for HTTP and WebSocket handlers

use std::sync::Arc;

use crate::pipeline::MinerService;

pub struct AppState {
    /// The miner pipeline
    pub service: Arc<MinerService>,
}

impl AppState {
    pub fn new(service: Arc<MinerService>) -> Self {
        Self { service }
    }
}
