//! Service configuration from environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `MINER_HOST` | `0.0.0.0` |
//! | `MINER_PORT` | `8001` |
//! | `MINER_REBUILD_INTERVAL_MS` | `5000` |
//! | `MINER_BROADCAST_INTERVAL_MS` | `1000` |
//! | `MINER_EVENT_BUFFER_CAPACITY` | `10000` |
//! | `MINER_OUTPUT_QUEUE_CAPACITY` | `256` |
//! | `MINER_QUEUE_TIMEOUT_MS` | `2000` |
//! | `MINER_CONNECTION_BUFFER` | `64` |
//! | `MINER_DB_ADDRESS` | unset |
//! | `MINER_DATA_DIR` | unset |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{MinerError, MinerResult};
use crate::persistence::{EventStore, HttpEventStore, JsonlEventStore, MemoryEventStore};

/// Timers and bounds of the miner pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub rebuild_interval: Duration,
    pub broadcast_interval: Duration,
    pub event_buffer_capacity: usize,
    pub output_queue_capacity: usize,
    /// How long a put waits on a full buffer or output queue
    pub queue_timeout: Duration,
    /// Outbound messages buffered per subscriber
    pub connection_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rebuild_interval: Duration::from_millis(5000),
            broadcast_interval: Duration::from_millis(1000),
            event_buffer_capacity: 10_000,
            output_queue_capacity: 256,
            queue_timeout: Duration::from_millis(2000),
            connection_buffer: 64,
        }
    }
}

/// Where accepted events are persisted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PersistenceConfig {
    #[default]
    Memory,
    Jsonl(PathBuf),
    Http(String),
}

impl PersistenceConfig {
    /// Build the configured store
    pub fn event_store(&self) -> MinerResult<Arc<dyn EventStore>> {
        Ok(match self {
            PersistenceConfig::Memory => Arc::new(MemoryEventStore::new()),
            PersistenceConfig::Jsonl(dir) => Arc::new(JsonlEventStore::new(dir)),
            PersistenceConfig::Http(address) => Arc::new(HttpEventStore::new(address.clone())?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MinerConfig {
    pub host: String,
    pub port: u16,
    pub pipeline: PipelineConfig,
    pub persistence: PersistenceConfig,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            pipeline: PipelineConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl MinerConfig {
    /// Load from the process environment
    pub fn from_env() -> MinerResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> MinerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let pipeline_defaults = defaults.pipeline;

        let pipeline = PipelineConfig {
            rebuild_interval: millis(
                &lookup,
                "MINER_REBUILD_INTERVAL_MS",
                pipeline_defaults.rebuild_interval,
            )?,
            broadcast_interval: millis(
                &lookup,
                "MINER_BROADCAST_INTERVAL_MS",
                pipeline_defaults.broadcast_interval,
            )?,
            event_buffer_capacity: positive(
                &lookup,
                "MINER_EVENT_BUFFER_CAPACITY",
                pipeline_defaults.event_buffer_capacity,
            )?,
            output_queue_capacity: positive(
                &lookup,
                "MINER_OUTPUT_QUEUE_CAPACITY",
                pipeline_defaults.output_queue_capacity,
            )?,
            queue_timeout: millis(&lookup, "MINER_QUEUE_TIMEOUT_MS", pipeline_defaults.queue_timeout)?,
            connection_buffer: positive(
                &lookup,
                "MINER_CONNECTION_BUFFER",
                pipeline_defaults.connection_buffer,
            )?,
        };

        let persistence = match (non_empty(&lookup, "MINER_DB_ADDRESS"), non_empty(&lookup, "MINER_DATA_DIR")) {
            (Some(address), _) => PersistenceConfig::Http(address),
            (None, Some(dir)) => PersistenceConfig::Jsonl(PathBuf::from(dir)),
            (None, None) => PersistenceConfig::Memory,
        };

        Ok(Self {
            host: non_empty(&lookup, "MINER_HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "MINER_PORT", defaults.port)?,
            pipeline,
            persistence,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse<T, F>(lookup: &F, name: &str, default: T) -> MinerResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| MinerError::Config(format!("{}={:?}: {}", name, raw, e))),
        None => Ok(default),
    }
}

fn positive<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str, default: usize) -> MinerResult<usize> {
    match parse(lookup, name, default)? {
        0 => Err(MinerError::Config(format!("{} must be greater than zero", name))),
        value => Ok(value),
    }
}

fn millis<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str, default: Duration) -> MinerResult<Duration> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    match parse(lookup, name, default_ms)? {
        0 => Err(MinerError::Config(format!("{} must be greater than zero", name))),
        ms => Ok(Duration::from_millis(ms)),
    }
}
