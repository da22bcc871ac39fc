//! Client for the remote event database service
//!
//! - `GET  {base}/events`        → `["log", ...]`
//! - `GET  {base}/events/{log}`  → `[Event, ...]`
//! - `POST {base}/events/{log}`  ← `Event`

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{EventStore, PersistenceError, PersistenceResult};
use crate::types::Event;

#[derive(Debug, Clone)]
pub struct HttpEventStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpEventStore {
    pub fn new(base_url: impl Into<String>) -> PersistenceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn logs_url(&self) -> String {
        format!("{}/events", self.base_url)
    }

    pub fn events_url(&self, log: &str) -> String {
        format!("{}/events/{}", self.base_url, urlencoding::encode(log))
    }

    fn check(response: reqwest::Response, url: &str) -> PersistenceResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(PersistenceError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            })
        }
    }
}

#[async_trait]
impl EventStore for HttpEventStore {
    async fn list_logs(&self) -> PersistenceResult<Vec<String>> {
        let url = self.logs_url();
        let response = Self::check(self.client.get(&url).send().await?, &url)?;
        let logs: Vec<String> = response.json().await?;
        debug!(count = logs.len(), "retrieved existing logs from database");
        Ok(logs)
    }

    async fn list_events(&self, log: &str) -> PersistenceResult<Vec<Event>> {
        let url = self.events_url(log);
        let response = Self::check(self.client.get(&url).send().await?, &url)?;
        let events: Vec<Event> = response.json().await?;
        debug!(log, count = events.len(), "loaded events from database");
        Ok(events)
    }

    async fn append_event(&self, log: &str, event: &Event) -> PersistenceResult<()> {
        let url = self.events_url(log);
        Self::check(self.client.post(&url).json(event).send().await?, &url)?;
        Ok(())
    }
}
