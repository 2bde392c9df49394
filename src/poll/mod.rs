pub mod error;
pub mod reading;

pub use error::PollError;
pub use reading::{decode_reading, Reading, TEMP_FIELD};

use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

use crate::sink::Sink;

/// What the poller hands to the dashboard thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Reading(Reading),
    PollFailed(String),
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
}

/// Fetches the status endpoint on a fixed cadence and feeds every decoded
/// reading to its sink.
pub struct Poller<S> {
    client: Client,
    config: PollConfig,
    sink: S,
}

impl<S: Sink> Poller<S> {
    pub fn new(config: PollConfig, sink: S) -> Result<Self, PollError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(PollError::Client)?;
        Ok(Self {
            client,
            config,
            sink,
        })
    }

    /// One poll-and-update cycle. The sink only sees successful readings.
    pub async fn tick(&mut self) -> Result<Reading, PollError> {
        let reading = self.fetch().await?;
        log::debug!("{} -> {}", self.config.url, reading.value);
        self.sink.update(&reading);
        Ok(reading)
    }

    async fn fetch(&self) -> Result<Reading, PollError> {
        let response = self.client.get(&self.config.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        decode_reading(&body, Utc::now())
    }

    /// Ticks forever. A tick is awaited before the next one may start, and
    /// ticks missed meanwhile are skipped rather than bunched up.
    pub async fn run(mut self) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::info!(
            "polling {} every {}ms",
            self.config.url,
            self.config.interval.as_millis()
        );
        loop {
            interval.tick().await;
            if let Err(err) = self.tick().await {
                log::warn!("poll of {} failed: {}", self.config.url, err);
                self.sink.failed(&err);
            }
        }
    }
}
