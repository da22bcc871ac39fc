//! Periodic model rebuilds
//!
//! Every tick spawns one task per log. A log whose previous rebuild is still
//! running reports `Busy` and keeps its events buffered for a later tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::miner::RebuildOutcome;
use super::registry::LogRegistry;
use crate::error::MinerError;

pub struct RebuildScheduler {
    registry: Arc<LogRegistry>,
    period: Duration,
}

impl RebuildScheduler {
    pub fn new(registry: Arc<LogRegistry>, period: Duration) -> Self {
        Self { registry, period }
    }

    /// Start a rebuild for every known log
    pub fn tick(&self) -> Vec<JoinHandle<()>> {
        self.registry
            .miners()
            .into_iter()
            .map(|miner| {
                tokio::spawn(async move {
                    match miner.rebuild().await {
                        Ok(RebuildOutcome::Published { sequence_id }) => {
                            debug!(log = miner.log(), sequence_id, "model update queued")
                        }
                        Ok(RebuildOutcome::Busy) => {
                            debug!(log = miner.log(), "previous rebuild still running")
                        }
                        Ok(_) => {}
                        Err(e @ MinerError::Backpressure { .. }) => {
                            warn!(log = miner.log(), error = %e, "update dropped")
                        }
                        Err(e) => warn!(log = miner.log(), error = %e, "rebuild skipped"),
                    }
                })
            })
            .collect()
    }

    /// Tick forever at the configured period
    pub async fn run(self) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            timer.tick().await;
            // Rebuild tasks are detached so a slow log never delays the next tick
            drop(self.tick());
        }
    }
}
