//! Subscriber connection tracking and fan-out
//!
//! Each subscriber gets a bounded outbound channel. Its transport task drains
//! the channel; this manager only ever performs non-blocking sends, so a slow
//! or dead connection cannot hold up delivery to the others.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{MinerError, MinerResult};

/// Identifier of one subscriber connection
pub type ConnectionId = Uuid;

/// Receiving half handed to the transport of a new connection
#[derive(Debug)]
pub struct Subscription {
    pub id: ConnectionId,
    pub log: String,
    pub receiver: mpsc::Receiver<Arc<str>>,
}

#[derive(Debug)]
struct Subscriber {
    log: String,
    sender: mpsc::Sender<Arc<str>>,
}

#[derive(Debug)]
pub struct ConnectionManager {
    subscribers: RwLock<HashMap<ConnectionId, Subscriber>>,
    buffer: usize,
}

impl ConnectionManager {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Register a new subscriber of `log`.
    ///
    /// `initial` is queued on the connection before it becomes visible to
    /// [`broadcast`](Self::broadcast), so it is always the first message the
    /// subscriber receives.
    pub fn connect<F>(&self, log: &str, initial: F) -> Subscription
    where
        F: FnOnce() -> MinerResult<String>,
    {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(self.buffer);

        let mut subscribers = self.subscribers.write();
        match initial() {
            Ok(message) => {
                // Fresh channel with capacity >= 1 cannot be full
                let _ = sender.try_send(Arc::from(message));
            }
            Err(e) => warn!(connection = %id, log, error = %e, "failed to build initial message"),
        }
        subscribers.insert(
            id,
            Subscriber {
                log: log.to_string(),
                sender,
            },
        );
        debug!(connection = %id, log, "subscriber connected");

        Subscription {
            id,
            log: log.to_string(),
            receiver,
        }
    }

    /// Remove a connection; returns false if it was already gone
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            debug!(connection = %id, "subscriber disconnected");
        }
        removed
    }

    /// Send a message to a single connection
    pub fn send(&self, id: ConnectionId, message: &str) -> MinerResult<()> {
        let subscribers = self.subscribers.read();
        let subscriber = subscribers.get(&id).ok_or_else(|| MinerError::Connection {
            id,
            reason: "not connected".to_string(),
        })?;
        Self::deliver(id, subscriber, Arc::from(message))
    }

    /// Send `message` to every subscriber of `log`.
    ///
    /// Returns the number of connections the message was handed to. Failed
    /// connections are logged and left registered.
    pub fn broadcast(&self, log: &str, message: &str) -> usize {
        let message: Arc<str> = Arc::from(message);
        let subscribers = self.subscribers.read();

        let mut recipients = 0;
        for (id, subscriber) in subscribers.iter().filter(|(_, s)| s.log == log) {
            match Self::deliver(*id, subscriber, message.clone()) {
                Ok(()) => recipients += 1,
                Err(e) => warn!(log, error = %e, "failed to deliver update"),
            }
        }
        recipients
    }

    fn deliver(id: ConnectionId, subscriber: &Subscriber, message: Arc<str>) -> MinerResult<()> {
        subscriber.sender.try_send(message).map_err(|e| {
            let reason = match e {
                TrySendError::Full(_) => "outbound buffer full",
                TrySendError::Closed(_) => "connection closed",
            };
            MinerError::Connection {
                id,
                reason: reason.to_string(),
            }
        })
    }

    pub fn subscriber_count(&self, log: &str) -> usize {
        self.subscribers
            .read()
            .values()
            .filter(|s| s.log == log)
            .count()
    }

    pub fn connection_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
