//! In-process event store

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{EventStore, PersistenceResult};
use crate::types::Event;

#[derive(Debug, Default)]
pub struct MemoryEventStore {
    logs: RwLock<BTreeMap<String, Vec<Event>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with events, grouped by their log
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut logs: BTreeMap<String, Vec<Event>> = BTreeMap::new();
        for event in events {
            logs.entry(event.tenant.clone()).or_default().push(event);
        }
        Self {
            logs: RwLock::new(logs),
        }
    }

    pub fn event_count(&self, log: &str) -> usize {
        self.logs.read().get(log).map_or(0, Vec::len)
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn list_logs(&self) -> PersistenceResult<Vec<String>> {
        Ok(self.logs.read().keys().cloned().collect())
    }

    async fn list_events(&self, log: &str) -> PersistenceResult<Vec<Event>> {
        Ok(self.logs.read().get(log).cloned().unwrap_or_default())
    }

    async fn append_event(&self, log: &str, event: &Event) -> PersistenceResult<()> {
        self.logs
            .write()
            .entry(log.to_string())
            .or_default()
            .push(event.clone());
        Ok(())
    }
}
