//! Per-log miner state
//!
//! A `Miner` owns one log's event buffer, cumulative history, published
//! snapshot and output queue. Ingestion only appends to the buffer; everything
//! else is driven by the log's own rebuild task.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::debug;

use super::diff;
use super::queue::{BoundedQueue, PutTimeout, QueueKind};
use crate::config::PipelineConfig;
use crate::discovery::{DiscoveryEngine, DiscoveryError};
use crate::error::{MinerError, MinerResult};
use crate::types::{sort_by_timestamp, Event, Snapshot, Update, UpdateKind, WireMessage};

/// An update waiting for the broadcast tick
#[derive(Debug, Clone)]
pub struct PendingUpdate {
    pub sequence_id: u64,
    pub update: Update,
}

impl PendingUpdate {
    pub fn to_wire(&self) -> WireMessage {
        WireMessage::new(UpdateKind::Delta, self.sequence_id, self.update.clone())
    }
}

/// Latest snapshot together with the sequence id of the last update it reflects
#[derive(Debug, Clone, Default)]
pub struct Published {
    pub snapshot: Option<Arc<Snapshot>>,
    pub sequence_id: u64,
}

/// What a rebuild attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// A previous rebuild of this log is still running
    Busy,
    /// Nothing new to feed the engine
    NoNewEvents,
    /// Model rebuilt, identical to the previous one
    Unchanged,
    /// Model rebuilt and its update queued for broadcast
    Published { sequence_id: u64 },
}

/// Timestamp-ordered events fed to the engine so far
#[derive(Debug, Default)]
struct History {
    /// Shared with a running engine call so a failed join never loses it
    events: Arc<Vec<Event>>,
    /// Holds bootstrap events no rebuild has been attempted on yet
    seeded: bool,
}

pub struct Miner {
    log: String,
    events: BoundedQueue<Event>,
    output: BoundedQueue<PendingUpdate>,
    history: Mutex<History>,
    published: RwLock<Published>,
    engine: Arc<dyn DiscoveryEngine>,
}

impl Miner {
    pub fn new(log: impl Into<String>, engine: Arc<dyn DiscoveryEngine>, config: &PipelineConfig) -> Self {
        Self {
            log: log.into(),
            events: BoundedQueue::new(config.event_buffer_capacity, config.queue_timeout),
            output: BoundedQueue::new(config.output_queue_capacity, config.queue_timeout),
            history: Mutex::new(History::default()),
            published: RwLock::new(Published::default()),
            engine,
        }
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    /// Buffer an event, waiting at most the queue timeout for room
    pub async fn push_event(&self, event: Event) -> MinerResult<()> {
        self.events
            .put(event)
            .await
            .map_err(|e| self.queue_error(QueueKind::Events, e))
    }

    /// Seed the history with stored events, bypassing the buffer
    pub async fn seed(&self, mut events: Vec<Event>) {
        if events.is_empty() {
            return;
        }
        sort_by_timestamp(&mut events);
        let mut history = self.history.lock().await;
        let stored = Arc::make_mut(&mut history.events);
        stored.extend(events);
        sort_by_timestamp(stored);
        history.seeded = true;
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn pending_updates(&self) -> usize {
        self.output.len()
    }

    pub async fn history_len(&self) -> usize {
        self.history.lock().await.events.len()
    }

    pub fn published(&self) -> Published {
        self.published.read().clone()
    }

    pub fn last_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.published.read().snapshot.clone()
    }

    /// Full-state message reflecting the current snapshot
    pub fn full_state(&self) -> WireMessage {
        let published = self.published.read();
        let update = match &published.snapshot {
            Some(snapshot) => Update::full(&self.log, snapshot),
            None => Update::new(&self.log),
        };
        WireMessage::new(UpdateKind::Full, published.sequence_id, update)
    }

    /// Take all queued updates in FIFO order
    pub fn drain_updates(&self) -> Vec<PendingUpdate> {
        self.output.drain()
    }

    /// Drain the buffer, rediscover the model and queue the resulting update.
    ///
    /// The engine only runs when events were drained, or once for a history
    /// seeded at bootstrap. On a discovery error the drained events stay in
    /// the history, the published snapshot is left untouched and the engine
    /// is not called again until new events arrive.
    pub async fn rebuild(&self) -> MinerResult<RebuildOutcome> {
        let Ok(mut history) = self.history.try_lock() else {
            return Ok(RebuildOutcome::Busy);
        };

        let mut drained = self.events.drain();
        if drained.is_empty() && !history.seeded {
            return Ok(RebuildOutcome::NoNewEvents);
        }
        history.seeded = false;

        sort_by_timestamp(&mut drained);
        let out_of_order = matches!(
            (history.events.last(), drained.first()),
            (Some(last), Some(first)) if first.timestamp < last.timestamp
        );
        debug!(log = %self.log, drained = drained.len(), "rebuilding model");
        let stored = Arc::make_mut(&mut history.events);
        stored.extend(drained);
        if out_of_order {
            sort_by_timestamp(stored);
        }

        let events = history.events.clone();
        let engine = self.engine.clone();
        let log = self.log.clone();
        let result = tokio::task::spawn_blocking(move || {
            panic::catch_unwind(AssertUnwindSafe(|| engine.discover(&log, &events)))
        })
        .await
        .map_err(|e| DiscoveryError::Panicked {
            log: self.log.clone(),
            reason: e.to_string(),
        })?;

        let model = result.map_err(|_| DiscoveryError::Panicked {
            log: self.log.clone(),
            reason: "engine panicked".to_string(),
        })??;

        let diff = {
            let published = self.published.read();
            diff::diff(&self.log, published.snapshot.as_deref(), model)
        };
        let publish = diff.should_publish();

        let sequence_id = {
            let mut published = self.published.write();
            published.snapshot = Some(Arc::new(diff.snapshot));
            if publish {
                published.sequence_id += 1;
            }
            published.sequence_id
        };

        if !publish {
            return Ok(RebuildOutcome::Unchanged);
        }

        self.output
            .put(PendingUpdate {
                sequence_id,
                update: diff.update,
            })
            .await
            .map_err(|e| self.queue_error(QueueKind::Output, e))?;

        Ok(RebuildOutcome::Published { sequence_id })
    }

    fn queue_error(&self, queue: QueueKind, PutTimeout(timeout): PutTimeout) -> MinerError {
        MinerError::Backpressure {
            log: self.log.clone(),
            queue,
            timeout,
        }
    }
}
