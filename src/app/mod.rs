pub mod config;
pub mod dashboard;

use chrono::{Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{prelude::*, style::palette::tailwind, widgets::*, DefaultTerminal};
use std::{
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};

use crate::{
    app::{config::AppConfig, dashboard::Dashboard},
    poll::Message,
};

struct AppStyle {
    gauge_frame_fg: Color,
    chart_frame_fg: Color,
    status_fg: Color,
    error_fg: Color,
}

pub struct App {
    exit: bool,
    dashboard: Dashboard,
    style: AppStyle,
    url: String,
    interval: Duration,
    tick_rate: Duration,
    rx: Receiver<Message>,
}

impl App {
    pub fn new(config: &AppConfig, rx: Receiver<Message>, notice: Option<String>) -> Self {
        let app_style = AppStyle {
            gauge_frame_fg: tailwind::SKY.c300,
            chart_frame_fg: tailwind::RED.c300,
            status_fg: tailwind::ZINC.c400,
            error_fg: tailwind::PINK.c400,
        };
        let mut dashboard = Dashboard::new(config);
        dashboard.notice = notice;
        Self {
            exit: false,
            dashboard,
            style: app_style,
            url: config.url().to_string(),
            interval: config.interval(),
            tick_rate: config.tick_rate(),
            rx,
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<(), std::io::Error> {
        while !self.exit {
            self.drain_messages();
            self.dashboard.step();
            terminal.draw(|frame| self.ui(frame))?;
            self.handle_keyboard_events()?;
        }
        Ok(())
    }

    fn drain_messages(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(msg) => self.dashboard.apply(msg),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::error!("poller stopped");
                    self.exit = true;
                    break;
                }
            }
        }
    }

    fn handle_keyboard_events(&mut self) -> Result<(), std::io::Error> {
        if event::poll(self.tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => self.exit = true,
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn ui(&self, frame: &mut Frame) {
        let (gauge_area, chart_area, status_area) = Self::create_layout(frame);
        self.render_gauge(frame, gauge_area);
        self.render_chart(frame, chart_area);
        self.render_status(frame, status_area);
    }

    fn render_gauge(&self, frame: &mut Frame, area: Rect) {
        let block = Block::new()
            .borders(Borders::ALL)
            .title(Line::from("Temperature").centered())
            .fg(self.style.gauge_frame_fg);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(&self.dashboard.gauge, inner);
    }

    fn render_chart(&self, frame: &mut Frame, area: Rect) {
        let block = Block::new()
            .borders(Borders::ALL)
            .title(Line::from("History").centered())
            .fg(self.style.chart_frame_fg);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(self.dashboard.chart.view(Utc::now()), inner);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw(format!(
            " {} every {}s",
            self.url,
            self.interval.as_secs_f64()
        ))];
        match &self.dashboard.last_reading {
            Some(reading) => spans.push(Span::raw(format!(
                " | last {} at {}",
                reading.value,
                reading.timestamp.with_timezone(&Local).format("%H:%M:%S")
            ))),
            None => spans.push(Span::raw(" | waiting for first reading")),
        }
        spans.push(Span::raw(format!(" ({})", self.dashboard.counters())));
        if let Some(notice) = &self.dashboard.notice {
            spans.push(Span::styled(
                format!(" | {}", notice),
                Style::default().fg(self.style.error_fg),
            ));
        }
        if let Some(err) = &self.dashboard.last_error {
            spans.push(Span::styled(
                format!(" | {}", err),
                Style::default().fg(self.style.error_fg),
            ));
        }
        spans.push(Span::raw(" | q quit"));
        frame.render_widget(
            Paragraph::new(Line::from(spans)).fg(self.style.status_fg),
            area,
        );
    }

    fn create_layout(frame: &mut Frame) -> (Rect, Rect, Rect) {
        let main_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Min(8), Constraint::Length(1)])
            .split(frame.area());
        let widgets = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![
                Constraint::Percentage(35),
                Constraint::Percentage(65),
            ])
            .split(main_layout[0]);
        (widgets[0], widgets[1], main_layout[1])
    }
}
