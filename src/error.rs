//! Error taxonomy of the miner pipeline
//!
//! Every variant except `Config` is recovered at the boundary of a single
//! log's or a single connection's unit of work.

use std::time::Duration;

use uuid::Uuid;

use crate::discovery::DiscoveryError;
use crate::persistence::PersistenceError;
use crate::pipeline::QueueKind;

/// Result type for miner operations
pub type MinerResult<T> = Result<T, MinerError>;

#[derive(Debug, thiserror::Error)]
pub enum MinerError {
    #[error("invalid event: {0}")]
    Validation(String),

    #[error("{queue} queue of log '{log}' stayed full for {timeout:?}")]
    Backpressure {
        log: String,
        queue: QueueKind,
        timeout: Duration,
    },

    #[error("unknown log '{0}'")]
    UnknownLog(String),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("connection {id}: {reason}")]
    Connection { id: Uuid, reason: String },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
