//! File-backed event store
//!
//! Each log is an append-only `<encoded-log>.jsonl` file inside the data
//! directory, one JSON event per line. Log names are percent-encoded so they
//! are always valid single path components.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::warn;

use super::{EventStore, PersistenceResult};
use crate::types::Event;

const EXTENSION: &str = "jsonl";

#[derive(Debug, Clone)]
pub struct JsonlEventStore {
    data_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonlEventStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the event file for a log
    pub fn log_path(&self, log: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", urlencoding::encode(log), EXTENSION))
    }

    fn read_logs(data_dir: &Path) -> PersistenceResult<Vec<String>> {
        if !data_dir.exists() {
            return Ok(Vec::new());
        }

        let mut logs = Vec::new();
        for entry in fs::read_dir(data_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match urlencoding::decode(stem) {
                Ok(log) => logs.push(log.into_owned()),
                Err(e) => warn!(file = %path.display(), error = %e, "skipping undecodable log file"),
            }
        }
        logs.sort();
        Ok(logs)
    }

    fn read_events(path: &Path) -> PersistenceResult<Vec<Event>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Event>(&line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    // Keep loading the rest of the log
                    warn!(
                        file = %path.display(),
                        line = line_num + 1,
                        error = %e,
                        "failed to parse stored event"
                    );
                }
            }
        }

        Ok(events)
    }

    fn write_event(path: &Path, json_line: &str) -> PersistenceResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", json_line)?;
        file.sync_all()?;
        Ok(())
    }
}

async fn blocking<T, F>(f: F) -> PersistenceResult<T>
where
    F: FnOnce() -> PersistenceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(std::io::Error::other)?
}

#[async_trait]
impl EventStore for JsonlEventStore {
    async fn list_logs(&self) -> PersistenceResult<Vec<String>> {
        let data_dir = self.data_dir.clone();
        blocking(move || Self::read_logs(&data_dir)).await
    }

    async fn list_events(&self, log: &str) -> PersistenceResult<Vec<Event>> {
        let path = self.log_path(log);
        blocking(move || Self::read_events(&path)).await
    }

    async fn append_event(&self, log: &str, event: &Event) -> PersistenceResult<()> {
        let path = self.log_path(log);
        let json_line = serde_json::to_string(event)?;
        let write_lock = self.write_lock.clone();
        blocking(move || {
            let _guard = write_lock.lock();
            Self::write_event(&path, &json_line)
        })
        .await
    }
}
