//! Remote proctoring log: discrete events and periodic webcam snapshots.

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ProctorConfig;
use crate::error::Error;

pub const EVENT_ANALYSIS_TRIGGERED: &str = "image_analysis_triggered";

/// Where events and snapshots go.
pub trait Reporter {
    fn log_event(&self, event: &str) -> Result<Value, Error>;
    fn send_snapshot(&self, jpeg: Vec<u8>) -> Result<Value, Error>;
}

/// Local wall-clock time, e.g. `2024-05-01 13:37:00.123456`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventBody<'a> {
    pub user_id: &'a str,
    pub event: &'a str,
    pub timestamp: String,
}

pub struct ProctorClient {
    http: Client,
    log_url: String,
    snapshot_url: String,
    user_id: String,
}

impl ProctorClient {
    pub fn new(cfg: &ProctorConfig) -> Result<Self, Error> {
        Ok(Self {
            http: Client::builder().build()?,
            log_url: format!("{}/api/proctoring/log", cfg.base_url),
            snapshot_url: format!("{}/api/proctoring/snapshot", cfg.base_url),
            user_id: cfg.user_id.clone(),
        })
    }
}

impl Reporter for ProctorClient {
    fn log_event(&self, event: &str) -> Result<Value, Error> {
        let body = EventBody { user_id: &self.user_id, event, timestamp: timestamp() };
        debug!(event, url = %self.log_url, "posting proctoring event");
        let resp = self.http.post(&self.log_url).json(&body).send()?.error_for_status()?;
        Ok(resp.json()?)
    }

    fn send_snapshot(&self, jpeg: Vec<u8>) -> Result<Value, Error> {
        let bytes = jpeg.len();
        let part = Part::bytes(jpeg).file_name("snapshot.jpg").mime_str("image/jpeg")?;
        let form = Form::new()
            .text("userId", self.user_id.clone())
            .text("timestamp", timestamp())
            .part("snapshot", part);
        debug!(bytes, url = %self.snapshot_url, "posting webcam snapshot");
        let resp = self.http.post(&self.snapshot_url).multipart(form).send()?.error_for_status()?;
        Ok(resp.json()?)
    }
}

/// Fires on the first check, then once every `interval`.
pub struct SnapshotTimer {
    interval: Duration,
    last: Option<Instant>,
}

impl SnapshotTimer {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// True if a snapshot is due at `now`; arms the next period when it is.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
