use chrono::{
    format::{Item, StrftimeItems},
    DateTime, Local, TimeDelta, Utc,
};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    widgets::{Axis, Chart, Dataset, GraphType, Widget},
};
use serde::Deserialize;
use std::collections::VecDeque;

use crate::{
    poll::Reading,
    sink::{parse_color, Sink},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    /// One terminal column counts as one pixel.
    pub millis_per_pixel: u64,
    /// `None` autoscales from the visible points.
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub vertical_sections: usize,
    pub grid_color: String,
    pub label_color: String,
    pub stroke_color: String,
    pub line_width: u8,
    pub retention_ms: u64,
    pub max_points: usize,
    pub time_format: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            millis_per_pixel: 1000,
            min_value: Some(20.0),
            max_value: Some(105.0),
            vertical_sections: 9,
            grid_color: "#bdbdbd".to_string(),
            label_color: "#a10000".to_string(),
            stroke_color: "#a42300".to_string(),
            line_width: 2,
            retention_ms: 60 * 60 * 1000,
            max_points: 1000,
            time_format: "%H:%M:%S".to_string(),
        }
    }
}

/// Rolling time series rendered as a strip chart that scrolls with the clock.
pub struct ChartSink {
    options: ChartOptions,
    points: VecDeque<(DateTime<Utc>, f64)>,
    grid: Color,
    label: Color,
    stroke: Color,
    time_format: String,
}

impl ChartSink {
    const TIME_FORMAT: &str = "%H:%M:%S";

    pub fn new(options: ChartOptions) -> Self {
        Self {
            time_format: checked_time_format(&options.time_format, Self::TIME_FORMAT),
            grid: parse_color(&options.grid_color, Color::Gray),
            label: parse_color(&options.label_color, Color::Red),
            stroke: parse_color(&options.stroke_color, Color::LightRed),
            points: VecDeque::new(),
            options,
        }
    }

    /// Inserts a point in timestamp order, then drops what fell out of the
    /// retention span or over the point budget.
    pub fn append(&mut self, timestamp: DateTime<Utc>, value: f64) {
        let idx = self.points.partition_point(|(t, _)| *t <= timestamp);
        self.points.insert(idx, (timestamp, value));
        self.prune();
    }

    fn prune(&mut self) {
        if let Some(&(newest, _)) = self.points.back() {
            let cutoff = newest - millis(self.options.retention_ms);
            while self.points.front().is_some_and(|(t, _)| *t < cutoff) {
                self.points.pop_front();
            }
        }
        while self.points.len() > self.options.max_points.max(1) {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &(DateTime<Utc>, f64)> {
        self.points.iter()
    }

    /// Time span covered by `width` columns.
    pub fn window(&self, width: u16) -> TimeDelta {
        millis(self.options.millis_per_pixel.saturating_mul(width as u64))
    }

    /// Points inside `[now - window, now]` as (ms since window start, value).
    pub fn visible(&self, now: DateTime<Utc>, width: u16) -> Vec<(f64, f64)> {
        let start = now - self.window(width);
        self.points
            .iter()
            .filter(|(t, _)| *t >= start && *t <= now)
            .map(|(t, v)| ((*t - start).num_milliseconds() as f64, *v))
            .collect()
    }

    pub fn y_bounds(&self, visible: &[(f64, f64)]) -> [f64; 2] {
        let (lo, hi) = visible
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, v)| {
                (lo.min(*v), hi.max(*v))
            });
        let mut min = self
            .options
            .min_value
            .unwrap_or(if lo.is_finite() { lo } else { 0.0 });
        let mut max = self
            .options
            .max_value
            .unwrap_or(if hi.is_finite() { hi } else { min });
        if max - min < f64::EPSILON {
            if self.options.min_value.is_none() {
                min -= 1.0;
            }
            if self.options.max_value.is_none() || max <= min {
                max = min.max(max) + 1.0;
            }
        }
        [min, max]
    }

    /// X labels at the window start, middle and end, local time.
    pub fn x_labels(&self, now: DateTime<Utc>, width: u16) -> Vec<String> {
        let window = self.window(width);
        [now - window, now - window / 2, now]
            .iter()
            .map(|t| {
                t.with_timezone(&Local)
                    .format(&self.time_format)
                    .to_string()
            })
            .collect()
    }

    /// One label per horizontal grid line.
    pub fn y_labels(&self, bounds: [f64; 2]) -> Vec<String> {
        let sections = self.options.vertical_sections.max(1);
        (0..=sections)
            .map(|i| {
                let value = bounds[0] + (bounds[1] - bounds[0]) * i as f64 / sections as f64;
                format!("{:.1}", value)
            })
            .collect()
    }

    /// Columns left for the plot once the y labels and axis line are drawn.
    /// Mirrors the gutter `Chart` reserves: the widest y label or the part of
    /// the first x label hanging left of the axis, at most a third of the
    /// area, plus the axis itself.
    pub fn graph_width(&self, width: u16, y_labels: &[String], first_x_label: &str) -> u16 {
        let y_width = y_labels
            .iter()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(0);
        let x_overhang = first_x_label.chars().count().saturating_sub(1);
        let labels = (y_width.max(x_overhang) as u16).min(width / 3);
        width.saturating_sub(labels + 1)
    }

    pub fn view(&self, now: DateTime<Utc>) -> ChartView<'_> {
        ChartView { sink: self, now }
    }
}

impl Sink for ChartSink {
    fn update(&mut self, reading: &Reading) {
        self.append(reading.timestamp, reading.value);
    }
}

fn checked_time_format(format: &str, fallback: &str) -> String {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        log::warn!("bad time format {:?}, using {:?}", format, fallback);
        return fallback.to_string();
    }
    format.to_string()
}

fn millis(ms: u64) -> TimeDelta {
    TimeDelta::milliseconds(ms.min(i64::MAX as u64 / 1_000_000) as i64)
}

/// The chart as seen at one instant.
pub struct ChartView<'a> {
    sink: &'a ChartSink,
    now: DateTime<Utc>,
}

impl Widget for ChartView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let sink = self.sink;
        let full = sink.y_labels(sink.y_bounds(&sink.visible(self.now, area.width)));
        let first_x_label = sink.x_labels(self.now, area.width).swap_remove(0);
        let width = sink.graph_width(area.width, &full, &first_x_label);

        let visible = sink.visible(self.now, width);
        let bounds = sink.y_bounds(&visible);
        let data: Vec<(f64, f64)> = visible
            .iter()
            .map(|(x, y)| (*x, y.clamp(bounds[0], bounds[1])))
            .collect();
        let marker = if sink.options.line_width > 1 {
            Marker::HalfBlock
        } else {
            Marker::Braille
        };
        let label_style = Style::default().fg(sink.label);
        let dataset = Dataset::default()
            .marker(marker)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(sink.stroke))
            .data(&data);
        let window_ms = sink.window(width).num_milliseconds() as f64;

        Chart::new(vec![dataset])
            .style(Style::default().bg(sink.grid))
            .x_axis(
                Axis::default()
                    .bounds([0.0, window_ms])
                    .labels(sink.x_labels(self.now, width))
                    .style(label_style),
            )
            .y_axis(
                Axis::default()
                    .bounds(bounds)
                    .labels(sink.y_labels(bounds))
                    .style(label_style),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn values(chart: &ChartSink) -> Vec<f64> {
        chart.points().map(|(_, v)| *v).collect()
    }

    #[test]
    fn append_keeps_timestamp_order() {
        let mut chart = ChartSink::new(ChartOptions::default());
        chart.append(t(10), 1.0);
        chart.append(t(30), 3.0);
        chart.append(t(20), 2.0);
        chart.append(t(20), 2.5);
        assert_eq!(values(&chart), vec![1.0, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn window_scales_with_width() {
        let chart = ChartSink::new(ChartOptions::default());
        assert_eq!(chart.window(80), TimeDelta::seconds(80));
    }

    #[test]
    fn points_outside_the_window_are_hidden() {
        let mut chart = ChartSink::new(ChartOptions::default());
        for secs in [0, 5, 10, 15, 20] {
            chart.append(t(secs), secs as f64);
        }
        // 10 columns at 1s per column shows [10s, 20s]
        let visible = chart.visible(t(20), 10);
        assert_eq!(visible, vec![(0.0, 10.0), (5000.0, 15.0), (10000.0, 20.0)]);
        assert_eq!(chart.len(), 5);
    }

    #[test]
    fn future_points_are_hidden() {
        let mut chart = ChartSink::new(ChartOptions::default());
        chart.append(t(30), 1.0);
        assert!(chart.visible(t(20), 10).is_empty());
    }

    #[test]
    fn retention_drops_old_points() {
        let options = ChartOptions {
            retention_ms: 10_000,
            ..ChartOptions::default()
        };
        let mut chart = ChartSink::new(options);
        for secs in [0, 5, 10, 15] {
            chart.append(t(secs), secs as f64);
        }
        assert_eq!(values(&chart), vec![5.0, 10.0, 15.0]);
    }

    #[test]
    fn max_points_caps_the_buffer() {
        let options = ChartOptions {
            max_points: 2,
            ..ChartOptions::default()
        };
        let mut chart = ChartSink::new(options);
        for secs in 0..5 {
            chart.append(t(secs), secs as f64);
        }
        assert_eq!(values(&chart), vec![3.0, 4.0]);
    }

    #[test]
    fn fixed_bounds_ignore_data() {
        let chart = ChartSink::new(ChartOptions::default());
        assert_eq!(chart.y_bounds(&[(0.0, 150.0)]), [20.0, 105.0]);
    }

    #[test]
    fn open_bounds_autoscale() {
        let options = ChartOptions {
            min_value: None,
            max_value: None,
            ..ChartOptions::default()
        };
        let chart = ChartSink::new(options);
        assert_eq!(chart.y_bounds(&[(0.0, 18.0), (1.0, 24.0)]), [18.0, 24.0]);
        assert_eq!(chart.y_bounds(&[(0.0, 21.0)]), [20.0, 22.0]);
        assert_eq!(chart.y_bounds(&[]), [-1.0, 1.0]);
    }

    #[test]
    fn y_labels_follow_grid_sections() {
        let chart = ChartSink::new(ChartOptions::default());
        let labels = chart.y_labels([20.0, 110.0]);
        assert_eq!(labels.len(), 10);
        assert_eq!(labels[0], "20.0");
        assert_eq!(labels[1], "30.0");
        assert_eq!(labels[9], "110.0");
    }

    #[test]
    fn x_labels_span_the_window() {
        let options = ChartOptions {
            time_format: "%s".to_string(),
            ..ChartOptions::default()
        };
        let chart = ChartSink::new(options);
        let labels = chart.x_labels(t(100), 20);
        assert_eq!(
            labels,
            vec!["1700000080", "1700000090", "1700000100"]
        );
    }

    #[test]
    fn update_appends_the_reading() {
        let mut chart = ChartSink::new(ChartOptions::default());
        chart.update(&Reading::new(t(0), 72.5));
        assert_eq!(chart.points().next(), Some(&(t(0), 72.5)));
    }

    #[test]
    fn bad_time_format_falls_back() {
        let options = ChartOptions {
            time_format: "%Q".to_string(),
            ..ChartOptions::default()
        };
        let mut chart = ChartSink::new(options);
        chart.append(t(0), 50.0);
        let labels = chart.x_labels(t(0), 10);
        assert_eq!(labels[2].len(), "00:00:00".len());
        assert_eq!(labels[2].matches(':').count(), 2);

        let area = Rect::new(0, 0, 60, 15);
        let mut buf = Buffer::empty(area);
        chart.view(t(0)).render(area, &mut buf);
    }

    #[test]
    fn graph_width_leaves_room_for_labels() {
        let chart = ChartSink::new(ChartOptions::default());
        let y_labels = chart.y_labels([20.0, 105.0]);
        // "12:00:00" hangs 7 columns left of the axis, more than "105.0"
        assert_eq!(chart.graph_width(60, &y_labels, "12:00:00"), 52);
        assert_eq!(chart.graph_width(60, &y_labels, "1"), 54);
        assert_eq!(chart.graph_width(9, &y_labels, "12:00:00"), 5);
    }

    #[test]
    fn window_excludes_the_label_gutter() {
        let mut chart = ChartSink::new(ChartOptions::default());
        // 55s old: inside a 60 column window, outside the 52 column plot
        chart.append(t(45), 30.0);
        chart.append(t(100), 40.0);
        let area = Rect::new(0, 0, 60, 15);
        let y_labels = chart.y_labels(chart.y_bounds(&chart.visible(t(100), 60)));
        let first = chart.x_labels(t(100), 60).swap_remove(0);
        let width = chart.graph_width(area.width, &y_labels, &first);
        assert_eq!(chart.visible(t(100), 60).len(), 2);
        assert_eq!(chart.visible(t(100), width), vec![(52_000.0, 40.0)]);
    }

    #[test]
    fn renders_without_points() {
        let chart = ChartSink::new(ChartOptions::default());
        let area = Rect::new(0, 0, 60, 15);
        let mut buf = Buffer::empty(area);
        chart.view(t(0)).render(area, &mut buf);
    }
}
