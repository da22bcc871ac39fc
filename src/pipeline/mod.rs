//! Incremental model-streaming pipeline
//!
//! ```text
//! events ──► LogRegistry ──► Miner.events ──(rebuild tick)──► DiscoveryEngine
//!                                                                  │
//!                     ConnectionManager ◄──(broadcast tick)── Miner.output ◄── diff
//! ```
//!
//! - `queue`: bounded queue with timed put and non-blocking drain
//! - `miner`: per-log buffer, history, snapshot and output queue
//! - `registry`: log name → miner, created atomically on first sight
//! - `diff`: snapshot diffing with stable-id reconciliation
//! - `rebuild` / `broadcast`: the two periodic schedulers
//! - `connections`: subscriber tracking and fan-out
//! - `service`: composition root

pub mod broadcast;
pub mod connections;
pub mod diff;
pub mod miner;
pub mod queue;
pub mod rebuild;
pub mod registry;
pub mod service;

pub use broadcast::{BroadcastReport, BroadcastScheduler};
pub use connections::{ConnectionId, ConnectionManager, Subscription};
pub use diff::{diff, reconcile, Diff};
pub use miner::{Miner, PendingUpdate, Published, RebuildOutcome};
pub use queue::{BoundedQueue, QueueKind};
pub use rebuild::RebuildScheduler;
pub use registry::LogRegistry;
pub use service::{MinerService, Schedulers};
