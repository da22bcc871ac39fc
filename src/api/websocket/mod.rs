//! WebSocket module for live model streaming
//!
//! Provides the `/ws/:log` endpoint. A new subscriber first receives a `full`
//! message with the log's current model, then every `delta` broadcast for that
//! log. Both carry a per-log `sequence_id`; deltas with a sequence id not above
//! the one of the last `full` message are already contained in it.

pub mod handler;
pub mod messages;
pub mod state;

pub use handler::ws_handler;
pub use state::AppState;
