//! Model discovery
//!
//! The pipeline treats discovery as an opaque, deterministic function of a
//! log's cumulative, timestamp-ordered history. [`DirectlyFollowsMiner`] is the
//! built-in engine used by the server binary.

mod directly_follows;

pub use directly_follows::DirectlyFollowsMiner;

use crate::types::{Event, Snapshot};

/// Errors raised by a discovery engine
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("discovery failed for log '{log}': {reason}")]
    Failed { log: String, reason: String },

    #[error("discovery for log '{log}' panicked: {reason}")]
    Panicked { log: String, reason: String },
}

/// Derives a process model from an ordered event history
///
/// Implementations must return the same model for the same history. Ids on the
/// returned elements are ignored; the pipeline assigns its own.
pub trait DiscoveryEngine: Send + Sync {
    fn discover(&self, log: &str, events: &[Event]) -> Result<Snapshot, DiscoveryError>;
}

impl<F> DiscoveryEngine for F
where
    F: Fn(&str, &[Event]) -> Result<Snapshot, DiscoveryError> + Send + Sync,
{
    fn discover(&self, log: &str, events: &[Event]) -> Result<Snapshot, DiscoveryError> {
        self(log, events)
    }
}
