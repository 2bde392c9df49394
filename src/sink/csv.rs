use chrono::{DateTime, Utc};
use std::io::Write;

use crate::{poll::Reading, sink::Sink};

/// Prints `elapsed_seconds,temperature` per reading, elapsed counted from
/// when the sink was created.
pub struct CsvSink<W> {
    out: W,
    started: DateTime<Utc>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W, started: DateTime<Utc>) -> Self {
        Self { out, started }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for CsvSink<W> {
    fn update(&mut self, reading: &Reading) {
        let elapsed = (reading.timestamp - self.started).num_milliseconds() as f64 / 1000.0;
        let written = writeln!(self.out, "{:.3},{}", elapsed, reading.value)
            .and_then(|_| self.out.flush());
        if let Err(err) = written {
            log::error!("cannot write reading: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn writes_elapsed_and_value() {
        let started = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut sink = CsvSink::new(Vec::new(), started);
        sink.update(&Reading::new(started, 21.5));
        sink.update(&Reading::new(started + TimeDelta::milliseconds(5250), 22.0));
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "0.000,21.5\n5.250,22\n");
    }
}
