//! Log registry and event ingestion

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use super::miner::Miner;
use crate::config::PipelineConfig;
use crate::discovery::DiscoveryEngine;
use crate::error::MinerResult;
use crate::types::Event;

/// Maps log names to their miners; the key space only grows
pub struct LogRegistry {
    miners: RwLock<HashMap<String, Arc<Miner>>>,
    engine: Arc<dyn DiscoveryEngine>,
    config: PipelineConfig,
}

impl LogRegistry {
    pub fn new(engine: Arc<dyn DiscoveryEngine>, config: PipelineConfig) -> Self {
        Self {
            miners: RwLock::new(HashMap::new()),
            engine,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn get(&self, log: &str) -> Option<Arc<Miner>> {
        self.miners.read().get(log).cloned()
    }

    pub fn contains(&self, log: &str) -> bool {
        self.miners.read().contains_key(log)
    }

    /// Miner for `log`, created atomically on first sight.
    ///
    /// Returns whether this call created it.
    pub fn get_or_create(&self, log: &str) -> (Arc<Miner>, bool) {
        if let Some(miner) = self.get(log) {
            return (miner, false);
        }

        let mut miners = self.miners.write();
        if let Some(miner) = miners.get(log) {
            return (miner.clone(), false);
        }

        info!(log, "adding miner");
        let miner = Arc::new(Miner::new(log, self.engine.clone(), &self.config));
        miners.insert(log.to_string(), miner.clone());
        (miner, true)
    }

    /// Validate and buffer an event for its log
    pub async fn submit_event(&self, event: Event) -> MinerResult<()> {
        event.validate()?;
        let (miner, _) = self.get_or_create(&event.tenant);
        miner.push_event(event).await
    }

    /// Register a log discovered at startup together with its stored events
    pub async fn bootstrap(&self, log: &str, events: Vec<Event>) -> Arc<Miner> {
        let (miner, _) = self.get_or_create(log);
        info!(log, events = events.len(), "bootstrapping miner");
        miner.seed(events).await;
        miner
    }

    /// Sorted names of all known logs
    pub fn logs(&self) -> Vec<String> {
        let mut logs: Vec<String> = self.miners.read().keys().cloned().collect();
        logs.sort();
        logs
    }

    pub fn miners(&self) -> Vec<Arc<Miner>> {
        self.miners.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.miners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.miners.read().is_empty()
    }
}
