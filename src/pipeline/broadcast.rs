//! Periodic fan-out of queued model updates

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use super::connections::ConnectionManager;
use super::registry::LogRegistry;

/// Totals of one broadcast tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Updates taken from output queues
    pub updates: usize,
    /// Deliveries handed to subscriber connections
    pub deliveries: usize,
    /// Updates that could not be serialized
    pub failures: usize,
}

pub struct BroadcastScheduler {
    registry: Arc<LogRegistry>,
    connections: Arc<ConnectionManager>,
    period: Duration,
}

impl BroadcastScheduler {
    pub fn new(registry: Arc<LogRegistry>, connections: Arc<ConnectionManager>, period: Duration) -> Self {
        Self {
            registry,
            connections,
            period,
        }
    }

    /// Drain every output queue and deliver its updates in FIFO order
    pub fn tick(&self) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for miner in self.registry.miners() {
            for pending in miner.drain_updates() {
                report.updates += 1;
                let text = match pending.to_wire().to_text() {
                    Ok(text) => text,
                    Err(e) => {
                        report.failures += 1;
                        warn!(log = miner.log(), sequence_id = pending.sequence_id, error = %e, "failed to serialize update");
                        continue;
                    }
                };
                let recipients = self.connections.broadcast(miner.log(), &text);
                report.deliveries += recipients;
                info!(
                    log = miner.log(),
                    sequence_id = pending.sequence_id,
                    recipients,
                    "broadcast update"
                );
            }
        }

        report
    }

    /// Tick forever at the configured period
    pub async fn run(self) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            timer.tick().await;
            self.tick();
        }
    }
}
