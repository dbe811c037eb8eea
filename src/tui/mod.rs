//! Ratatui-based sales dashboard.
//!
//! Left: product selector. Right: forecast chart (or the components view),
//! the date-range filter and the three key metrics for the filtered history.
//! The current forecast can be exported to `<output>/<product>_forecast.csv`.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline;
use crate::app::{ModelCache, SessionContext};
use crate::domain::{
    DEFAULT_HORIZON_DAYS, ForecastModel, ForecastTable, Paths, SeasonalityKind,
};
use crate::error::AppError;
use crate::io::ModelStore;
use crate::report::fmt_opt_units;

mod plotters_chart;

use plotters_chart::{LinePlottersChart, Series, SeriesKind};

/// Start the dashboard. Data is loaded before the terminal is taken over so
/// load errors print normally.
pub fn run(paths: &Paths, product: Option<&str>) -> Result<(), AppError> {
    let mut app = App::new(paths.clone())?;
    if let Some(p) = product {
        app.session.select_product(p)?;
    }
    app.refresh_forecast();

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::io(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::io(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::io(format!("Failed to enter alternate screen: {e}")));
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Forecast,
    Components,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeField {
    From,
    To,
}

struct App {
    paths: Paths,
    session: SessionContext,
    cache: ModelCache,
    view: View,
    editing: Option<RangeField>,
    input: String,
    status: String,
    current: Option<(Arc<ForecastModel>, ForecastTable)>,
}

impl App {
    fn new(paths: Paths) -> Result<Self, AppError> {
        let dataset = crate::io::load_sales(&paths.data)?;
        let session = SessionContext::new(dataset)?;
        let cache = ModelCache::new(ModelStore::new(&paths.models));
        Ok(Self {
            paths,
            session,
            cache,
            view: View::Forecast,
            editing: None,
            input: String::new(),
            status: String::new(),
            current: None,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::io(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::io(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::io(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
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

    /// Returns `true` to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if let Some(field) = self.editing {
            self.handle_range_edit(field, code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.session.select_prev();
                self.refresh_forecast();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.session.select_next();
                self.refresh_forecast();
            }
            KeyCode::Char('f') => self.start_edit(RangeField::From),
            KeyCode::Char('t') => self.start_edit(RangeField::To),
            KeyCode::Char('a') => {
                self.session.reset_date_range();
                self.status = "Date range reset.".to_string();
            }
            KeyCode::Char('c') => {
                self.view = match self.view {
                    View::Forecast => View::Components,
                    View::Components => View::Forecast,
                };
            }
            KeyCode::Char('e') => self.export_forecast(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    fn start_edit(&mut self, field: RangeField) {
        let (from, to) = self.session.date_range();
        self.input = match field {
            RangeField::From => from,
            RangeField::To => to,
        }
        .format("%Y-%m-%d")
        .to_string();
        self.editing = Some(field);
        self.status = "Editing date (YYYY-MM-DD). Enter to apply, Esc to cancel.".to_string();
    }

    fn handle_range_edit(&mut self, field: RangeField, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing = None;
                self.apply_range_input(field);
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' || c == '/' => self.input.push(c),
            _ => {}
        }
    }

    fn apply_range_input(&mut self, field: RangeField) {
        let Some(date) = crate::io::parse_date(&self.input) else {
            self.status = format!("Invalid date '{}'.", self.input.trim());
            return;
        };
        let (from, to) = self.session.date_range();
        let (from, to) = match field {
            RangeField::From => (date, to),
            RangeField::To => (from, date),
        };
        self.status = match self.session.set_date_range(from, to) {
            Ok(()) => format!("Date range: {from} → {to}"),
            Err(err) => err.to_string(),
        };
    }

    /// Recompute the forecast for the selected product from the cached model.
    ///
    /// A missing model is reported in the status bar; the dashboard keeps running.
    fn refresh_forecast(&mut self) {
        let product = self.session.selected_product().to_string();
        let result = self
            .cache
            .get(&product)
            .and_then(|model| pipeline::forecast_model(&model, DEFAULT_HORIZON_DAYS).map(|t| (model, t)));

        match result {
            Ok(current) => {
                self.status = format!("{product}: {}-day forecast", DEFAULT_HORIZON_DAYS);
                self.current = Some(current);
            }
            Err(AppError::NotFound(_)) => {
                self.status = format!("No model for {product}. Run `sf train` first.");
                self.current = None;
            }
            Err(err) => {
                self.status = err.to_string();
                self.current = None;
            }
        }
    }

    fn export_forecast(&mut self) {
        let Some((model, table)) = &self.current else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        let result = pipeline::output_file(&self.paths.output, &model.product, "forecast.csv")
            .and_then(|path| crate::io::write_forecast_csv(&path, table).map(|()| path));
        self.status = match result {
            Ok(path) => format!("Exported {}", path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    /// Reload the sales file and drop cached models, keeping the selection if possible.
    fn reload(&mut self) {
        let selected = self.session.selected_product().to_string();
        match crate::io::load_sales(&self.paths.data).and_then(SessionContext::new) {
            Ok(mut session) => {
                let kept = session.select_product(&selected).is_ok();
                self.session = session;
                self.cache.clear();
                self.refresh_forecast();
                self.status = if kept {
                    format!("Reloaded {}", self.paths.data.display())
                } else {
                    format!(
                        "Reloaded {}; '{selected}' is no longer in the data, showing {}",
                        self.paths.data.display(),
                        self.session.selected_product()
                    )
                };
            }
            Err(err) => self.status = format!("Reload failed: {err}"),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let (from, to) = self.session.date_range();
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("sf", Style::default().fg(Color::Cyan)),
            Span::raw(" | Sales Predictor"),
        ]));

        let model_info = match &self.current {
            Some((model, _)) => format!(
                "history n={} | rmse={:.2} | changepoints={}",
                model.history.len(),
                model.quality.rmse,
                model.trend.changepoints.len()
            ),
            None => "no model".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!(
                "product: {} | range: {from} → {to} | {model_info}",
                self.session.selected_product()
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(26), Constraint::Min(0)])
            .split(area);
        self.draw_products(frame, cols[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(cols[1]);
        match self.view {
            View::Forecast => self.draw_forecast(frame, rows[0]),
            View::Components => self.draw_components(frame, rows[0]),
        }
        self.draw_metrics(frame, rows[1]);
    }

    fn draw_products(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .session
            .products()
            .iter()
            .map(|p| ListItem::new(p.as_str()))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Products").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.session.selected_index()));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_forecast(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(format!("{}-Day Forecast", DEFAULT_HORIZON_DAYS))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some((_, table)) = &self.current else {
            let msg = Paragraph::new(self.status.as_str()).style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let history = self.session.filtered_history();
        let Some(origin) = history
            .iter()
            .map(|p| p.ds)
            .chain(table.rows.iter().map(|r| r.ds))
            .min()
        else {
            return;
        };
        let x = |d: NaiveDate| (d - origin).num_days() as f64;

        let hist: Vec<(f64, f64)> = history.iter().map(|p| (x(p.ds), p.y)).collect();
        let yhat: Vec<(f64, f64)> = table.rows.iter().map(|r| (x(r.ds), r.yhat)).collect();
        let lower: Vec<(f64, f64)> = table.rows.iter().map(|r| (x(r.ds), r.yhat_lower)).collect();
        let upper: Vec<(f64, f64)> = table.rows.iter().map(|r| (x(r.ds), r.yhat_upper)).collect();

        let band = RGBColor(120, 40, 40);
        let series = vec![
            Series { points: &lower, color: band, kind: SeriesKind::Line },
            Series { points: &upper, color: band, kind: SeriesKind::Line },
            Series { points: &yhat, color: RGBColor(255, 0, 0), kind: SeriesKind::Line },
            Series { points: &hist, color: RGBColor(0, 255, 255), kind: SeriesKind::Dots },
        ];
        let fmt_x = |v: f64| fmt_day_offset(origin, v);
        self.render_chart(frame, inner, series, "date", "quantity", &fmt_x);
    }

    fn draw_components(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Seasonality Analysis").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some((model, table)) = &self.current else {
            let msg = Paragraph::new(self.status.as_str()).style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let kinds: Vec<SeasonalityKind> = model.seasonal.iter().map(|s| s.kind).collect();
        let panels = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Ratio(1, 1 + kinds.len() as u32); 1 + kinds.len()])
            .split(inner);

        let Some(origin) = table.rows.first().map(|r| r.ds) else {
            return;
        };
        let trend: Vec<(f64, f64)> = table
            .rows
            .iter()
            .map(|r| ((r.ds - origin).num_days() as f64, r.trend))
            .collect();
        let fmt_date = |v: f64| fmt_day_offset(origin, v);
        let color = RGBColor(0, 255, 255);
        self.render_chart(
            frame,
            panels[0],
            vec![Series { points: &trend, color, kind: SeriesKind::Line }],
            "",
            "trend",
            &fmt_date,
        );

        for (panel, kind) in panels[1..].iter().zip(kinds) {
            let profile = crate::models::seasonal_profile(model, kind);
            let fmt_kind = move |v: f64| fmt_profile_x(kind, v);
            self.render_chart(
                frame,
                *panel,
                vec![Series { points: &profile, color, kind: SeriesKind::Line }],
                "",
                kind.display_name(),
                &fmt_kind,
            );
        }
    }

    fn render_chart(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        series: Vec<Series<'_>>,
        x_label: &str,
        y_label: &str,
        fmt_x: &dyn Fn(f64) -> String,
    ) {
        let x_bounds = plotters_chart::x_bounds(&series);
        let y_bounds = plotters_chart::y_bounds(&series);
        let (chart_rect, insets) = chart_layout(area);
        let widget = LinePlottersChart {
            series,
            x_bounds,
            y_bounds,
            x_label,
            y_label,
            fmt_x,
            fmt_y: &fmt_axis_y,
        };
        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, area, chart_rect, insets, x_bounds, y_bounds, fmt_x);
        }
    }

    fn draw_metrics(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let m = self.session.metrics();
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(area);

        let cells = [
            ("Average Daily Sales", fmt_opt_units(m.mean)),
            ("Highest Daily Sales", fmt_opt_units(m.max)),
            ("Total Sales in Period", format!("{:.1} units", m.sum)),
        ];
        for (rect, (title, value)) in cols.iter().zip(cells) {
            let p = Paragraph::new(value)
                .alignment(Alignment::Center)
                .style(Style::default().add_modifier(Modifier::BOLD))
                .block(Block::default().title(title).borders(Borders::ALL));
            frame.render_widget(p, *rect);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = if self.editing.is_some() {
            format!("date: {}_  Enter apply  Esc cancel", self.input)
        } else {
            "↑/↓ product  f/t from/to  a all dates  c components  e export  r reload  q quit".to_string()
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn fmt_day_offset(origin: NaiveDate, v: f64) -> String {
    let days = v.round();
    if days < 0.0 {
        return String::new();
    }
    origin
        .checked_add_days(Days::new(days as u64))
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

fn fmt_profile_x(kind: SeasonalityKind, v: f64) -> String {
    match kind {
        SeasonalityKind::Yearly => format!("d{:.0}", v + 1.0),
        SeasonalityKind::Weekly => {
            const NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
            NAMES.get(v.round().max(0.0) as usize).copied().unwrap_or("").to_string()
        }
        SeasonalityKind::Daily => format!("{:.0}h", v),
    }
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.1}")
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
    fmt_x: &dyn Fn(f64) -> String,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_x(x_val);
        let label_len = label.chars().count() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height {
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

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_offset_labels() {
        let origin = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(fmt_day_offset(origin, 3.0), "01-02");
        assert_eq!(fmt_day_offset(origin, -2.0), "");
    }

    #[test]
    fn profile_labels() {
        assert_eq!(fmt_profile_x(SeasonalityKind::Weekly, 6.0), "Sun");
        assert_eq!(fmt_profile_x(SeasonalityKind::Weekly, 8.0), "");
        assert_eq!(fmt_profile_x(SeasonalityKind::Daily, 12.0), "12h");
        assert_eq!(fmt_profile_x(SeasonalityKind::Yearly, 0.0), "d1");
    }

    #[test]
    fn reload_reports_a_vanished_selection() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("sales.csv");
        std::fs::write(&data, "Date,Product,Quantity\n2024-01-01,A,1\n2024-01-01,B,2\n").unwrap();
        let paths = Paths {
            data: data.clone(),
            models: dir.path().join("models"),
            output: dir.path().join("output"),
        };

        let mut app = App::new(paths).unwrap();
        app.session.select_product("B").unwrap();
        app.reload();
        assert!(app.status.starts_with("Reloaded"), "{}", app.status);
        assert_eq!(app.session.selected_product(), "B");

        std::fs::write(&data, "Date,Product,Quantity\n2024-01-01,A,1\n").unwrap();
        app.reload();
        assert!(app.status.contains("'B' is no longer in the data"), "{}", app.status);
        assert_eq!(app.session.selected_product(), "A");
    }

    #[test]
    fn layout_reserves_axis_space() {
        let (rect, insets) = chart_layout(Rect::new(0, 0, 80, 20));
        assert!(insets.is_some());
        assert_eq!(rect, Rect::new(8, 1, 70, 17));
        let (small, none) = chart_layout(Rect::new(0, 0, 10, 5));
        assert!(none.is_none());
        assert_eq!(small, Rect::new(0, 0, 10, 5));
    }
}
