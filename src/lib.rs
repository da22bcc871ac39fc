//! Process Miner Streaming Service
//!
//! A multi-tenant service that ingests process events, periodically
//! rediscovers a process model per event log and streams the difference
//! between consecutive models to WebSocket subscribers.
//!
//! # Features
//!
//! - **Multi-tenant**: one independent pipeline per log, created on first event
//! - **Incremental**: subscribers get a full model once, then deltas only
//! - **Stable identities**: unchanged places, transitions and edges keep their ids
//! - **Backpressure**: bounded buffers reject work instead of growing without limit
//! - **Recovery**: logs are replayed from the persistence service at startup
//!
//! # Modules
//!
//! - `types`: Core data structures (Event, Snapshot, Update, WireMessage)
//! - `discovery`: Pluggable discovery engines and the directly-follows miner
//! - `pipeline`: Registry, diff engine, schedulers and connection manager
//! - `persistence`: Event store backends (HTTP, JSON lines, memory)
//! - `api`: Axum router with ingestion, listing and WebSocket endpoints
//! - `config`: Environment-driven configuration
//! - `error`: Crate error type
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use process_miner::{DirectlyFollowsMiner, Event, MemoryEventStore, MinerService, PipelineConfig};
//!
//! # async fn run() -> process_miner::MinerResult<()> {
//! let service = Arc::new(MinerService::new(
//!     PipelineConfig::default(),
//!     Arc::new(DirectlyFollowsMiner::new()),
//!     Arc::new(MemoryEventStore::new()),
//! ));
//! service.submit_event(Event::new("orders", chrono::Utc::now(), "create", "case-1")).await?;
//! let _schedulers = service.spawn_schedulers();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod discovery;
pub mod error;
pub mod persistence;
pub mod pipeline;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{MinerConfig, PersistenceConfig, PipelineConfig};
pub use discovery::{DirectlyFollowsMiner, DiscoveryEngine, DiscoveryError};
pub use error::{MinerError, MinerResult};
pub use persistence::{EventStore, HttpEventStore, JsonlEventStore, MemoryEventStore};
pub use pipeline::{ConnectionManager, LogRegistry, MinerService, Schedulers};
pub use types::{Event, Snapshot, Update, UpdateKind, WireMessage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
