pub mod chart;
pub mod csv;
pub mod gauge;

pub use chart::{ChartOptions, ChartSink, ChartView};
pub use csv::CsvSink;
pub use gauge::{GaugeOptions, GaugeSink};

use ratatui::style::Color;
use std::{str::FromStr, sync::mpsc::Sender};

use crate::poll::{Message, PollError, Reading};

/// Consumer of temperature readings.
pub trait Sink {
    fn update(&mut self, reading: &Reading);

    fn failed(&mut self, _err: &PollError) {}
}

/// Forwards readings and failures to the thread that owns the widgets.
pub struct ChannelSink {
    tx: Sender<Message>,
}

impl ChannelSink {
    pub fn new(tx: Sender<Message>) -> Self {
        Self { tx }
    }
}

impl Sink for ChannelSink {
    fn update(&mut self, reading: &Reading) {
        if self.tx.send(Message::Reading(*reading)).is_err() {
            log::debug!("dashboard gone, dropping reading");
        }
    }

    fn failed(&mut self, err: &PollError) {
        if self.tx.send(Message::PollFailed(err.to_string())).is_err() {
            log::debug!("dashboard gone, dropping failure");
        }
    }
}

pub(crate) fn parse_color(value: &str, fallback: Color) -> Color {
    match Color::from_str(value) {
        Ok(color) => color,
        Err(_) => {
            log::warn!("unknown color {:?}, using {:?}", value, fallback);
            fallback
        }
    }
}

/// Linear blend between two RGB colors. Anything else yields `from`.
pub(crate) fn lerp_color(from: Color, to: Color, t: f64) -> Color {
    match (from, to) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let t = t.clamp(0.0, 1.0);
            let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ => from,
    }
}
