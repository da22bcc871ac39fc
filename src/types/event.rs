//! Inbound activity events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MinerError, MinerResult};

/// A timestamped activity observed for one log.
///
/// Field aliases keep the MQTT-shaped payloads (`source`, `process`) working
/// next to the canonical names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "log", alias = "tenant", alias = "source", default)]
    pub tenant: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub activity: String,
    #[serde(alias = "process", default)]
    pub case_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl Event {
    /// Create a new event without payload
    pub fn new(
        tenant: impl Into<String>,
        timestamp: DateTime<Utc>,
        activity: impl Into<String>,
        case_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            timestamp,
            activity: activity.into(),
            case_id: case_id.into(),
            payload: None,
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Reject events that cannot be attributed to a log or an activity
    pub fn validate(&self) -> MinerResult<()> {
        if self.tenant.trim().is_empty() {
            return Err(MinerError::Validation("log must not be empty".to_string()));
        }
        if self.activity.trim().is_empty() {
            return Err(MinerError::Validation(
                "activity must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sort events by timestamp, keeping arrival order for equal timestamps
pub fn sort_by_timestamp(events: &mut [Event]) {
    if events.windows(2).any(|w| w[0].timestamp > w[1].timestamp) {
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    }
}
