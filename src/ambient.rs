use anyhow::{Context, Result};
use serde_json::json;
use std::time::{Duration, Instant};

use crate::models::Reading;

pub const DEFAULT_ENDPOINT: &str = "http://ambidata.io/api/v2";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Ambient {
    agent: ureq::Agent,
    url: String,
    write_key: String,
}

impl Ambient {
    pub fn new(endpoint: &str, channel_id: &str, write_key: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            url: format!("{}/channels/{}/data", endpoint, channel_id),
            write_key: write_key.to_string(),
        }
    }

    /// Sends one data point to the channel's d1 field and returns the HTTP
    /// status code. Non-2xx codes are returned for logging, not treated as
    /// errors; only a transport failure is an Err.
    pub fn send(&self, ppm: u16) -> Result<u16> {
        let body = json!({ "writeKey": self.write_key, "d1": ppm });
        match self.agent.post(&self.url).send_json(body) {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(err) => Err(err).context("Upload request failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Sent(u16),
    TooSoon,
    Implausible,
}

pub struct UploadGate {
    last_upload: Instant,
    interval: Duration,
}

impl UploadGate {
    pub fn new(start: Instant, interval: Duration) -> Self {
        Self {
            last_upload: start,
            interval,
        }
    }

    /// Decides whether the reading goes out and performs the send through
    /// the given closure. The timer advances after any completed attempt,
    /// whatever the status code. An implausible reading leaves the timer
    /// alone, so the gate keeps re-evaluating every cycle until a plausible
    /// value appears. A transport error also leaves it alone; the next
    /// interval retries.
    pub fn maybe_upload(
        &mut self,
        now: Instant,
        reading: &Reading,
        send: impl FnOnce(u16) -> Result<u16>,
    ) -> Result<UploadOutcome> {
        if now.duration_since(self.last_upload) <= self.interval {
            return Ok(UploadOutcome::TooSoon);
        }
        if !reading.is_plausible() {
            return Ok(UploadOutcome::Implausible);
        }

        let status = send(reading.co2_ppm)?;
        self.last_upload = now;
        Ok(UploadOutcome::Sent(status))
    }
}
