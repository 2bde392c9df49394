use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine},
        Paragraph, Widget,
    },
};
use serde::Deserialize;
use std::f64::consts::PI;

use crate::{
    poll::Reading,
    sink::{lerp_color, parse_color, Sink},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PointerOptions {
    /// Relative to the gauge radius.
    pub length: f64,
    /// Half the pointer base, relative to the gauge radius.
    pub stroke_width: f64,
    pub color: String,
}

impl Default for PointerOptions {
    fn default() -> Self {
        Self {
            length: 0.6,
            stroke_width: 0.035,
            color: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GaugeOptions {
    /// Span of the arc: 0 draws a half circle, negative values widen it.
    pub angle: f64,
    /// Arc thickness relative to the radius.
    pub line_width: f64,
    pub radius_scale: f64,
    pub pointer: PointerOptions,
    /// When false the max grows to fit values above it.
    pub limit_max: bool,
    pub color_start: String,
    pub color_stop: String,
    pub stroke_color: String,
    pub generate_gradient: bool,
    pub background: String,
    pub min_value: f64,
    pub max_value: f64,
    pub animation_speed: f64,
    pub fraction_digits: usize,
}

impl Default for GaugeOptions {
    fn default() -> Self {
        Self {
            angle: -0.16,
            line_width: 0.23,
            radius_scale: 1.0,
            pointer: PointerOptions::default(),
            limit_max: false,
            color_start: "#6FADCF".to_string(),
            color_stop: "#8FC0DA".to_string(),
            stroke_color: "#E0E0E0".to_string(),
            generate_gradient: true,
            background: "#FFFFFF".to_string(),
            min_value: 15.0,
            max_value: 120.0,
            animation_speed: 32.0,
            fraction_digits: 2,
        }
    }
}

struct GaugePalette {
    start: Color,
    stop: Color,
    stroke: Color,
    pointer: Color,
    background: Color,
}

impl GaugePalette {
    fn from_options(options: &GaugeOptions) -> Self {
        Self {
            start: parse_color(&options.color_start, Color::Cyan),
            stop: parse_color(&options.color_stop, Color::LightCyan),
            stroke: parse_color(&options.stroke_color, Color::Gray),
            pointer: parse_color(&options.pointer.color, Color::Black),
            background: parse_color(&options.background, Color::Reset),
        }
    }
}

/// Radial dial showing the latest temperature, with an animated needle and a
/// numeric text field underneath.
pub struct GaugeSink {
    options: GaugeOptions,
    palette: GaugePalette,
    min_value: f64,
    max_value: f64,
    value: f64,
    displayed: f64,
}

impl GaugeSink {
    const SEGMENTS: usize = 96;
    const SETTLE: f64 = 0.001;

    pub fn new(options: GaugeOptions) -> Self {
        let min_value = options.min_value;
        let mut gauge = Self {
            palette: GaugePalette::from_options(&options),
            min_value: 0.0,
            max_value: options.max_value,
            value: 0.0,
            displayed: 0.0,
            options,
        };
        gauge.set_min_value(min_value);
        gauge
    }

    /// Fixes the lower bound and parks the needle on it.
    pub fn set_min_value(&mut self, min_value: f64) {
        self.min_value = min_value;
        self.value = min_value;
        self.displayed = min_value;
    }

    pub fn set(&mut self, value: f64) {
        let mut value = value;
        if value > self.max_value {
            if self.options.limit_max {
                value = self.max_value;
            } else {
                self.max_value = value + 1.0;
            }
        }
        self.value = value;
    }

    /// Advances the needle one frame toward the last set value. Returns
    /// whether it moved.
    pub fn step(&mut self) -> bool {
        let diff = self.value - self.displayed;
        if diff == 0.0 {
            return false;
        }
        let speed = self.options.animation_speed;
        if speed <= 1.0 || (diff / speed).abs() <= Self::SETTLE {
            self.displayed = self.value;
        } else {
            self.displayed += diff / speed;
        }
        true
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn displayed(&self) -> f64 {
        self.displayed
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn text(&self) -> String {
        format!("{:.*}", self.options.fraction_digits, self.displayed)
    }

    /// Needle position along the arc, 0 at the minimum and 1 at the maximum.
    pub fn ratio(&self) -> f64 {
        let range = self.max_value - self.min_value;
        if range <= 0.0 {
            return 0.0;
        }
        ((self.displayed - self.min_value) / range).clamp(0.0, 1.0)
    }

    fn arc(&self) -> (f64, f64) {
        let angle = self.options.angle;
        ((1.0 + angle) * PI, (2.0 - angle) * PI)
    }

    /// Highest and lowest y reached by a unit arc, in canvas coordinates.
    fn arc_extent(&self) -> (f64, f64) {
        let (start, end) = self.arc();
        let mut top = f64::MIN;
        let mut bottom = f64::MAX;
        for i in 0..=Self::SEGMENTS {
            let y = -(start + (end - start) * i as f64 / Self::SEGMENTS as f64).sin();
            top = top.max(y);
            bottom = bottom.min(y);
        }
        // the hub sits on the center
        (top.max(0.0), bottom.min(0.0))
    }

    fn segment_color(&self, t: f64, ratio: f64) -> Color {
        if t > ratio {
            self.palette.stroke
        } else if self.options.generate_gradient {
            lerp_color(self.palette.start, self.palette.stop, t)
        } else {
            self.palette.start
        }
    }

    fn paint(&self, ctx: &mut Context, radius: f64, cy: f64) {
        let (start, end) = self.arc();
        let span = end - start;
        let ratio = self.ratio();
        let point = |theta: f64, r: f64| (r * theta.cos(), cy - r * theta.sin());

        let line_width = self.options.line_width.clamp(0.0, 1.0);
        let rings = ((line_width * 12.0).round() as usize).max(1);
        let inner = radius * (1.0 - line_width);
        for ring in 0..rings {
            let r = if rings == 1 {
                radius
            } else {
                inner + (radius - inner) * ring as f64 / (rings - 1) as f64
            };
            for i in 0..Self::SEGMENTS {
                let t0 = i as f64 / Self::SEGMENTS as f64;
                let t1 = (i + 1) as f64 / Self::SEGMENTS as f64;
                let (x1, y1) = point(start + span * t0, r);
                let (x2, y2) = point(start + span * t1, r);
                let color = self.segment_color((t0 + t1) / 2.0, ratio);
                ctx.draw(&CanvasLine::new(x1, y1, x2, y2, color));
            }
        }

        let theta = start + span * ratio;
        let (tip_x, tip_y) = point(theta, radius * self.options.pointer.length);
        let half = radius * self.options.pointer.stroke_width;
        for k in -2..=2 {
            let offset = half * k as f64 / 2.0;
            ctx.draw(&CanvasLine::new(
                offset * theta.sin(),
                cy + offset * theta.cos(),
                tip_x,
                tip_y,
                self.palette.pointer,
            ));
        }
        ctx.draw(&Circle {
            x: 0.0,
            y: cy,
            radius: half,
            color: self.palette.pointer,
        });
    }
}

impl Sink for GaugeSink {
    fn update(&mut self, reading: &Reading) {
        self.set(reading.value);
    }
}

impl Widget for &GaugeSink {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [dial_area, text_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

        // a terminal cell is about twice as tall as it is wide
        let aspect = dial_area.width as f64 / (dial_area.height.max(1) as f64 * 2.0);
        let (top, bottom) = self.arc_extent();
        let radius = aspect.min(2.0 / (top - bottom)) * 0.95 * self.options.radius_scale;
        let cy = -(top + bottom) / 2.0 * radius;

        Canvas::default()
            .background_color(self.palette.background)
            .marker(Marker::Braille)
            .x_bounds([-aspect, aspect])
            .y_bounds([-1.0, 1.0])
            .paint(|ctx| self.paint(ctx, radius, cy))
            .render(dial_area, buf);

        let digits = self.options.fraction_digits;
        let text_style = Style::default()
            .fg(self.palette.pointer)
            .bg(self.palette.background);
        let [min_area, value_area, max_area] = Layout::horizontal([
            Constraint::Length(8),
            Constraint::Min(1),
            Constraint::Length(8),
        ])
        .areas(text_area);
        Paragraph::new(format!("{:.*}", digits.min(1), self.min_value))
            .style(text_style)
            .render(min_area, buf);
        Paragraph::new(self.text())
            .style(text_style.add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .render(value_area, buf);
        Paragraph::new(format!("{:.*}", digits.min(1), self.max_value))
            .style(text_style)
            .alignment(Alignment::Right)
            .render(max_area, buf);
    }
}
