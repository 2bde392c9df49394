use crate::{
    app::config::AppConfig,
    poll::{Message, PollError, Reading},
    sink::{ChartSink, GaugeSink, Sink},
};

/// Owns both widgets and fans every reading out to them.
pub struct Dashboard {
    pub gauge: GaugeSink,
    pub chart: ChartSink,
    pub last_reading: Option<Reading>,
    pub last_error: Option<String>,
    /// Startup problem shown until the dashboard exits.
    pub notice: Option<String>,
    pub readings: u64,
    pub failures: u64,
}

impl Dashboard {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            gauge: GaugeSink::new(config.gauge.clone()),
            chart: ChartSink::new(config.chart.clone()),
            last_reading: None,
            last_error: None,
            notice: None,
            readings: 0,
            failures: 0,
        }
    }

    pub fn apply(&mut self, msg: Message) {
        match msg {
            Message::Reading(reading) => self.update(&reading),
            Message::PollFailed(err) => self.record_failure(err),
        }
    }

    fn record_failure(&mut self, err: String) {
        self.failures += 1;
        self.last_error = Some(err);
    }

    /// Advances animations by one frame.
    pub fn step(&mut self) {
        self.gauge.step();
    }

    pub fn counters(&self) -> String {
        format!("{} ok, {} failed", self.readings, self.failures)
    }
}

impl Sink for Dashboard {
    fn update(&mut self, reading: &Reading) {
        self.gauge.update(reading);
        self.chart.update(reading);
        self.last_reading = Some(*reading);
        self.last_error = None;
        self.readings += 1;
    }

    fn failed(&mut self, err: &PollError) {
        self.record_failure(err.to_string());
    }
}
