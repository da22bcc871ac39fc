//! Composition root of the pipeline
//!
//! Wires the registry, the connection manager and the event store together
//! and owns the two scheduler tasks.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::broadcast::BroadcastScheduler;
use super::connections::{ConnectionId, ConnectionManager, Subscription};
use super::miner::Miner;
use super::rebuild::RebuildScheduler;
use super::registry::LogRegistry;
use crate::config::PipelineConfig;
use crate::discovery::DiscoveryEngine;
use crate::error::{MinerError, MinerResult};
use crate::persistence::EventStore;
use crate::types::Event;

/// Handles of the running scheduler tasks
#[derive(Debug)]
pub struct Schedulers {
    pub rebuild: JoinHandle<()>,
    pub broadcast: JoinHandle<()>,
}

impl Schedulers {
    pub fn abort(&self) {
        self.rebuild.abort();
        self.broadcast.abort();
    }
}

pub struct MinerService {
    registry: Arc<LogRegistry>,
    connections: Arc<ConnectionManager>,
    store: Arc<dyn EventStore>,
    config: PipelineConfig,
}

impl MinerService {
    pub fn new(config: PipelineConfig, engine: Arc<dyn DiscoveryEngine>, store: Arc<dyn EventStore>) -> Self {
        Self {
            registry: Arc::new(LogRegistry::new(engine, config.clone())),
            connections: Arc::new(ConnectionManager::new(config.connection_buffer)),
            store,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<LogRegistry> {
        &self.registry
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Accept an inbound event.
    ///
    /// Returns once the event is buffered; persisting it happens in the
    /// background and failures are only logged. Events refused by the buffer
    /// are not persisted, so a retried submission is stored once.
    pub async fn submit_event(&self, event: Event) -> MinerResult<()> {
        self.registry.submit_event(event.clone()).await?;

        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.append_event(&event.tenant, &event).await {
                warn!(log = %event.tenant, error = %e, "failed to persist event");
            }
        });
        Ok(())
    }

    /// Create a miner for every log found in the event store.
    ///
    /// Returns the number of bootstrapped logs; store failures are logged and
    /// leave the service empty rather than failing startup.
    pub async fn bootstrap_from_store(&self) -> usize {
        let logs = match self.store.list_logs().await {
            Ok(logs) => logs,
            Err(e) => {
                warn!(error = %e, "couldn't retrieve existing logs");
                return 0;
            }
        };
        info!(?logs, "existing event logs");

        let mut bootstrapped = 0;
        for log in logs.into_iter().filter(|l| !l.trim().is_empty()) {
            let events = match self.store.list_events(&log).await {
                Ok(events) => events,
                Err(e) => {
                    warn!(log, error = %e, "couldn't load stored events");
                    Vec::new()
                }
            };
            self.registry.bootstrap(&log, events).await;
            bootstrapped += 1;
        }
        bootstrapped
    }

    pub fn logs(&self) -> Vec<String> {
        self.registry.logs()
    }

    /// Subscribe to a known log; the full state is the first message queued
    pub fn connect(&self, log: &str) -> MinerResult<Subscription> {
        let miner = self
            .registry
            .get(log)
            .ok_or_else(|| MinerError::UnknownLog(log.to_string()))?;
        Ok(self.connections.connect(log, || Self::full_state_text(&miner)))
    }

    /// Send the current full state of `log` to one connection
    pub fn send_full_state(&self, id: ConnectionId, log: &str) -> MinerResult<()> {
        let miner = self
            .registry
            .get(log)
            .ok_or_else(|| MinerError::UnknownLog(log.to_string()))?;
        self.connections.send(id, &Self::full_state_text(&miner)?)
    }

    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.disconnect(id)
    }

    fn full_state_text(miner: &Miner) -> MinerResult<String> {
        miner.full_state().to_text()
    }

    pub fn rebuild_scheduler(&self) -> RebuildScheduler {
        RebuildScheduler::new(self.registry.clone(), self.config.rebuild_interval)
    }

    pub fn broadcast_scheduler(&self) -> BroadcastScheduler {
        BroadcastScheduler::new(
            self.registry.clone(),
            self.connections.clone(),
            self.config.broadcast_interval,
        )
    }

    /// Start both schedulers on their own timers
    pub fn spawn_schedulers(&self) -> Schedulers {
        info!(
            rebuild_ms = self.config.rebuild_interval.as_millis() as u64,
            broadcast_ms = self.config.broadcast_interval.as_millis() as u64,
            "starting schedulers"
        );
        Schedulers {
            rebuild: tokio::spawn(self.rebuild_scheduler().run()),
            broadcast: tokio::spawn(self.broadcast_scheduler().run()),
        }
    }
}
