//! Event persistence collaborators
//!
//! Persistence is best effort: the pipeline reads stored events once at
//! startup and appends every accepted event afterwards, logging failures
//! without retrying them.
//!
//! - `HttpEventStore`: remote event database service
//! - `JsonlEventStore`: one append-only JSONL file per log
//! - `MemoryEventStore`: in-process store, the default without configuration

mod http;
mod jsonl;
mod memory;

pub use http::HttpEventStore;
pub use jsonl::JsonlEventStore;
pub use memory::MemoryEventStore;

use async_trait::async_trait;

use crate::types::Event;

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors raised by an event store
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable storage of events per log
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Names of all logs with stored events
    async fn list_logs(&self) -> PersistenceResult<Vec<String>>;

    /// Stored events of one log, in storage order
    async fn list_events(&self, log: &str) -> PersistenceResult<Vec<Event>>;

    async fn append_event(&self, log: &str, event: &Event) -> PersistenceResult<()>;
}
