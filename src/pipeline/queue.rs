//! Bounded queue with a timed put and a non-blocking drain
//!
//! Producers may be many, the consumer is whoever drains.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Which of a log's queues an operation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Events,
    Output,
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueKind::Events => write!(f, "event"),
            QueueKind::Output => write!(f, "output"),
        }
    }
}

/// A put found the queue full for the whole timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutTimeout(pub Duration);

pub struct BoundedQueue<T> {
    tx: mpsc::Sender<T>,
    rx: Mutex<mpsc::Receiver<T>>,
    put_timeout: Duration,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize, put_timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(rx),
            put_timeout,
        }
    }

    /// Wait up to the configured timeout for room, then enqueue
    ///
    /// The queue owns its receiver, so the channel never closes and a timeout
    /// is the only way a put can fail.
    pub async fn put(&self, item: T) -> Result<(), PutTimeout> {
        self.tx
            .send_timeout(item, self.put_timeout)
            .await
            .map_err(|_| PutTimeout(self.put_timeout))
    }

    /// Take everything queued at call time, in FIFO order, without waiting.
    ///
    /// Items put while draining are left for the next drain.
    pub fn drain(&self) -> Vec<T> {
        let mut rx = self.rx.lock();
        let pending = rx.len();
        let mut items = Vec::with_capacity(pending);
        while items.len() < pending {
            match rx.try_recv() {
                Ok(item) => items.push(item),
                Err(_) => break,
            }
        }
        items
    }

    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.tx.max_capacity())
            .field("put_timeout", &self.put_timeout)
            .finish()
    }
}
