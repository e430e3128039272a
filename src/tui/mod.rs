//! Ratatui-based terminal UI.
//!
//! The TUI loads the raw records once, then re-runs the analysis on every
//! parameter change. A settings panel adjusts the incidence window,
//! normalization, recovered lead, and fit window; `c` cycles the charts.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use tracing::warn;

use crate::app::pipeline::{self, RunOutput};
use crate::domain::{
    AnalysisConfig, ChartKind, FIT_DAYS_RANGE, FitEnd, INCIDENCE_WINDOW_RANGE, NORM_PERIOD_RANGE, RECOVERED_LEAD_RANGE,
};
use crate::error::AppError;
use crate::io::ingest::IngestedData;
use crate::plot::series::x_to_date;

mod plotters_chart;

use plotters_chart::CasePlottersChart;

const SETTINGS: usize = 7;

/// Start the TUI.
pub fn run(config: AnalysisConfig) -> Result<(), AppError> {
    config.validate()?;

    // Fetch before switching screens so a failed download prints normally.
    let ingest = pipeline::load_raw(&config.source)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, ingest)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: AnalysisConfig,
    ingest: IngestedData,
    run: Option<RunOutput>,
    chart: ChartKind,
    selected_field: usize,
    status: String,
}

impl App {
    fn new(config: AnalysisConfig, ingest: IngestedData) -> Result<Self, AppError> {
        let mut app = Self {
            config,
            ingest,
            run: None,
            chart: ChartKind::Cases,
            selected_field: 0,
            status: String::new(),
        };
        app.rerun()?;
        app.status = format!("Loaded {} records.", app.ingest.records.len());
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < SETTINGS {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1)?,
            KeyCode::Right => self.adjust_field(1)?,
            KeyCode::Char('c') => {
                self.chart = self.chart.next();
                self.status = format!("chart: {}", self.chart.title());
            }
            KeyCode::Char('r') => self.refetch()?,
            KeyCode::Char('d') => {
                if let Some(run) = &self.run {
                    match crate::debug::write_debug_bundle(&self.ingest, run, &self.config) {
                        Ok(path) => {
                            self.status = format!("Wrote debug bundle: {}", path.display());
                        }
                        Err(err) => {
                            self.status = format!("Debug write failed: {err}");
                        }
                    }
                } else {
                    self.status = "No analysis available.".to_string();
                }
            }
            _ => {}
        }

        Ok(false)
    }

    fn adjust_field(&mut self, delta: i32) -> Result<(), AppError> {
        let c = &mut self.config;
        match self.selected_field {
            0 => {
                c.series = if delta >= 0 { c.series.next() } else { c.series.prev() };
                self.status = format!("series: {}", c.series.display_name());
            }
            1 => {
                c.incidence_window = step(c.incidence_window, delta, INCIDENCE_WINDOW_RANGE);
                self.status = format!("incidence window: {} days", c.incidence_window);
            }
            2 => {
                c.normalize = !c.normalize;
                self.status = format!("normalize: {}", on_off(c.normalize));
            }
            3 => {
                c.norm_period = step(c.norm_period, delta, NORM_PERIOD_RANGE);
                self.status = format!("normalization period: {} days", c.norm_period);
            }
            4 => {
                c.recovered_lead = step(c.recovered_lead, delta, RECOVERED_LEAD_RANGE);
                self.status = format!("recovered lead: {} days", c.recovered_lead);
            }
            5 => {
                let days = step(c.fit_window.days as usize, delta, FIT_DAYS_RANGE);
                c.fit_window.days = days as u32;
                // An explicit start would make the length meaningless.
                c.fit_window.start = None;
                self.status = format!("fit days: {days}");
            }
            6 => {
                c.fit_window.end = match c.fit_window.end {
                    FitEnd::Now => FitEnd::Latest,
                    FitEnd::Latest | FitEnd::At(_) => FitEnd::Now,
                };
                self.status = format!("fit end: {}", fit_end_label(c.fit_window.end));
            }
            _ => return Ok(()),
        }
        self.rerun()
    }

    fn refetch(&mut self) -> Result<(), AppError> {
        match pipeline::load_raw(&self.config.source) {
            Ok(ingest) => {
                self.ingest = ingest;
                self.rerun()?;
                self.status = format!("Reloaded {} records.", self.ingest.records.len());
            }
            Err(err) => {
                warn!(%err, "refetch failed; keeping previous data");
                self.status = format!("Refetch failed: {err}");
            }
        }
        Ok(())
    }

    fn rerun(&mut self) -> Result<(), AppError> {
        let run = pipeline::run_analysis(&self.ingest, &self.config)?;
        self.run = Some(run);
        Ok(())
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("cases", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" | {}", self.config.source.describe())),
        ]));

        let stats = &self.ingest.stats;
        let n_daily = self.run.as_ref().map(|r| r.rows.len()).unwrap_or(0);
        lines.push(Line::from(Span::styled(
            format!(
                "raw: {} | daily: {n_daily} | latest: {} | cases={} deaths={}",
                stats.n_records,
                stats.last.format("%Y-%m-%d %H:%M"),
                stats.latest.cumulative_cases,
                stats.latest.deaths,
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(run) = &self.run {
            let fit_line = match &run.fit {
                Ok(fit) => format!(
                    "fit {}: doubling time {} | R²={:.4} | n={}",
                    fit.series.display_name(),
                    fit.doubling_time,
                    fit.r_squared,
                    fit.n_points
                ),
                Err(err) => format!("fit {}: cannot fit: {err}", self.config.series.display_name()),
            };
            let style = if run.fit.is_ok() {
                Style::default().fg(Color::Gray)
            } else {
                Style::default().fg(Color::Red)
            };
            lines.push(Line::from(Span::styled(fit_line, style)));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(SETTINGS as u16 + 3)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(run) = &self.run else {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(msg, area);
            return;
        };

        let data = crate::plot::chart_data(self.chart, run, &self.config);
        let block = Block::default().title(data.title.clone()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some((x_bounds, y_bounds)) = data.bounds() else {
            let msg = Paragraph::new("No rows to chart (the readings do not span a full day).")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };
        let pad = ((y_bounds[1] - y_bounds[0]).abs() * 0.05).max(1e-12);
        let y_bounds = [y_bounds[0] - pad, y_bounds[1] + pad];

        let (chart_rect, insets) = chart_layout(inner);
        let widget = CasePlottersChart {
            chart: &data,
            x_bounds,
            y_bounds,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds, &data.y_label);
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let c = &self.config;
        let resolved = self
            .run
            .as_ref()
            .map(|r| {
                format!(
                    "{} .. {}",
                    r.window.start.format("%Y-%m-%d %H:%M"),
                    r.window.end.format("%Y-%m-%d %H:%M")
                )
            })
            .unwrap_or_else(|| "-".to_string());
        let fit_days = match c.fit_window.start {
            Some(start) => format!("from {}", start.format("%Y-%m-%d")),
            None => c.fit_window.days.to_string(),
        };

        let items = vec![
            ListItem::new(format!("Series: {}", c.series.display_name())),
            ListItem::new(format!("Incidence window: {} days", c.incidence_window)),
            ListItem::new(format!("Normalize: {}", on_off(c.normalize))),
            ListItem::new(format!("Normalization period: {} days", c.norm_period)),
            ListItem::new(format!("Recovered lead: {} days", c.recovered_lead)),
            ListItem::new(format!("Fit days: {fit_days}")),
            ListItem::new(format!(
                "Fit end: {}  (window {resolved})",
                fit_end_label(c.fit_window.end)
            )),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  c chart  r refetch  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Move `value` by `delta`, clamped to the inclusive range.
fn step(value: usize, delta: i32, (lo, hi): (usize, usize)) -> usize {
    let next = if delta >= 0 {
        value.saturating_add(delta as usize)
    } else {
        value.saturating_sub(delta.unsigned_abs() as usize)
    };
    next.clamp(lo, hi)
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn fit_end_label(end: FitEnd) -> String {
    match end {
        FitEnd::Now => "now".to_string(),
        FitEnd::Latest => "latest record".to_string(),
        FitEnd::At(t) => t.format("%Y-%m-%d %H:%M").to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    y_label: &str,
) {
    // Date labels are wide; fewer ticks on narrow terminals.
    let x_ticks = if chart.width >= 70 { 5usize } else { 3 };
    let y_ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..x_ticks {
        let u = i as f64 / (x_ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = x_to_date(x_val);
        let label_len = label.len() as u16;
        let start = x
            .saturating_sub(label_len / 2)
            .clamp(inner.x, (inner.x + inner.width).saturating_sub(label_len));
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..y_ticks {
        let u = i as f64 / (y_ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{:.0}", y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("date")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(y_label.to_string())
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataSource;

    fn app() -> App {
        let config = AnalysisConfig {
            source: DataSource::Synthetic { seed: 5 },
            ..AnalysisConfig::default()
        };
        let ingest = pipeline::load_raw(&config.source).unwrap();
        App::new(config, ingest).unwrap()
    }

    #[test]
    fn step_clamps_to_range() {
        assert_eq!(step(1, -1, (1, 100)), 1);
        assert_eq!(step(100, 1, (1, 100)), 100);
        assert_eq!(step(0, 1, (0, 50)), 1);
    }

    #[test]
    fn arrows_adjust_selected_setting_and_rerun() {
        let mut app = app();
        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Right).unwrap();
        assert_eq!(app.config.incidence_window, 8);

        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Left).unwrap();
        assert!(app.config.normalize);

        for _ in 0..10 {
            app.handle_key(KeyCode::Down).unwrap();
        }
        assert_eq!(app.selected_field, SETTINGS - 1);
        app.handle_key(KeyCode::Right).unwrap();
        assert_eq!(app.config.fit_window.end, FitEnd::Latest);
        assert!(app.run.as_ref().unwrap().fit.is_ok());
    }

    #[test]
    fn chart_key_cycles_and_q_quits() {
        let mut app = app();
        assert!(!app.handle_key(KeyCode::Char('c')).unwrap());
        assert_eq!(app.chart, ChartKind::Deaths);
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }
}
