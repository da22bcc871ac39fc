//! Model deltas and their wire encoding

use serde::{Deserialize, Serialize};

use super::model::{Edge, Place, Snapshot, Transition};
use crate::error::MinerResult;

/// Version of the outbound message layout
pub const WIRE_VERSION: u32 = 1;

/// Add/remove delta between two consecutive snapshots of one log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "log")]
    pub tenant: String,
    pub new_places: Vec<Place>,
    pub removed_places: Vec<Place>,
    pub new_transitions: Vec<Transition>,
    pub removed_transitions: Vec<Transition>,
    pub new_edges: Vec<Edge>,
    pub removed_edges: Vec<Edge>,
}

impl Update {
    /// Empty update for a log
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            ..Default::default()
        }
    }

    /// Everything in `snapshot` reported as new
    pub fn full(tenant: impl Into<String>, snapshot: &Snapshot) -> Self {
        Self {
            tenant: tenant.into(),
            new_places: snapshot.places.to_vec(),
            new_transitions: snapshot.transitions.to_vec(),
            new_edges: snapshot.edges.to_vec(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.new_places.is_empty()
            && self.removed_places.is_empty()
            && self.new_transitions.is_empty()
            && self.removed_transitions.is_empty()
            && self.new_edges.is_empty()
            && self.removed_edges.is_empty()
    }
}

/// Discriminates a full resync from an incremental delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Full,
    Delta,
}

/// Outbound message wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub kind: UpdateKind,

    pub version: u32,

    /// Per-log sequence number for gap detection
    pub sequence_id: u64,

    /// Unix timestamp in milliseconds when the message was built
    pub timestamp: i64,

    #[serde(flatten)]
    pub update: Update,
}

impl WireMessage {
    pub fn new(kind: UpdateKind, sequence_id: u64, update: Update) -> Self {
        Self {
            kind,
            version: WIRE_VERSION,
            sequence_id,
            timestamp: chrono::Utc::now().timestamp_millis(),
            update,
        }
    }

    pub fn to_text(&self) -> MinerResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
