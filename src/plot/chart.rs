//! SVG charts rendered with Plotters.
//!
//! Charts use a numeric x axis (days since the first plotted date) with a
//! date label formatter, which keeps us off Plotters' `datetime` feature.
//!
//! Files written:
//! - `<key>_prediction.svg` / `<key>_detailed_prediction.svg`: history, forecast, interval band
//! - `historical_sales.svg`: every product's history on one chart
//! - `<key>_seasonality.svg`: trend + yearly/weekly/daily components

use std::fs;
use std::path::Path;

use chrono::{Days, NaiveDate};
use plotters::prelude::*;

use crate::domain::{ForecastModel, ForecastTable, HistoryPoint, SeasonalityKind};
use crate::error::AppError;
use crate::models::seasonal_profile;

type DrawResult = Result<(), Box<dyn std::error::Error>>;

const WIDE: (u32, u32) = (1200, 600);
const TALL: (u32, u32) = (1000, 1100);

/// History vs. forecast with a shaded interval band.
pub fn write_prediction_chart(
    path: &Path,
    title: &str,
    history: &[HistoryPoint],
    table: &ForecastTable,
) -> Result<(), AppError> {
    ensure_parent(path)?;
    draw_prediction(path, title, history, table)
        .map_err(|e| AppError::io(format!("Failed to render chart '{}': {e}", path.display())))
}

/// One line per product.
pub fn write_history_chart(path: &Path, series: &[(String, Vec<HistoryPoint>)]) -> Result<(), AppError> {
    ensure_parent(path)?;
    draw_history(path, series)
        .map_err(|e| AppError::io(format!("Failed to render chart '{}': {e}", path.display())))
}

/// Trend over the forecast dates plus one panel per seasonality.
pub fn write_components_chart(
    path: &Path,
    title: &str,
    model: &ForecastModel,
    table: &ForecastTable,
) -> Result<(), AppError> {
    ensure_parent(path)?;
    draw_components(path, title, model, table)
        .map_err(|e| AppError::io(format!("Failed to render chart '{}': {e}", path.display())))
}

fn ensure_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", parent.display())))?;
    }
    Ok(())
}

fn draw_prediction(path: &Path, title: &str, history: &[HistoryPoint], table: &ForecastTable) -> DrawResult {
    let origin = first_date(history.iter().map(|p| p.ds).chain(table.rows.iter().map(|r| r.ds)))
        .ok_or("nothing to plot")?;
    let x = |d: NaiveDate| (d - origin).num_days() as f64;

    let hist: Vec<(f64, f64)> = history.iter().map(|p| (x(p.ds), p.y)).collect();
    let yhat: Vec<(f64, f64)> = table.rows.iter().map(|r| (x(r.ds), r.yhat)).collect();
    let mut band: Vec<(f64, f64)> = table.rows.iter().map(|r| (x(r.ds), r.yhat_upper)).collect();
    band.extend(table.rows.iter().rev().map(|r| (x(r.ds), r.yhat_lower)));

    let x_bounds = bounds(hist.iter().chain(yhat.iter()).map(|p| p.0));
    let y_bounds = bounds(hist.iter().chain(band.iter()).map(|p| p.1));

    let root = SVGBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_bounds[0]..x_bounds[1], y_bounds[0]..y_bounds[1])?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Quantity")
        .x_labels(8)
        .x_label_formatter(&|v| fmt_day_offset(origin, *v))
        .light_line_style(WHITE.mix(0.0))
        .bold_line_style(BLACK.mix(0.1))
        .draw()?;

    let band_color = RED.mix(0.2);
    chart
        .draw_series(std::iter::once(Polygon::new(band, band_color.filled())))?
        .label(format!("{:.0}% interval", table.interval_width * 100.0))
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], band_color.filled()));

    chart
        .draw_series(LineSeries::new(hist, BLUE.mix(0.6).stroke_width(1)))?
        .label("Historical")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(yhat, RED.stroke_width(2)))?
        .label("Predicted")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_history(path: &Path, series: &[(String, Vec<HistoryPoint>)]) -> DrawResult {
    let origin = first_date(series.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.ds)))
        .ok_or("nothing to plot")?;
    let x = |d: NaiveDate| (d - origin).num_days() as f64;

    let x_bounds = bounds(series.iter().flat_map(|(_, pts)| pts.iter().map(|p| x(p.ds))));
    let y_bounds = bounds(series.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.y)));

    let root = SVGBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Historical Sales by Product", ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_bounds[0]..x_bounds[1], y_bounds[0]..y_bounds[1])?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Quantity Sold")
        .x_labels(8)
        .x_label_formatter(&|v| fmt_day_offset(origin, *v))
        .light_line_style(WHITE.mix(0.0))
        .bold_line_style(BLACK.mix(0.1))
        .draw()?;

    for (idx, (name, pts)) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let line: Vec<(f64, f64)> = pts.iter().map(|p| (x(p.ds), p.y)).collect();
        chart
            .draw_series(LineSeries::new(line.iter().copied(), color.stroke_width(1)))?
            .label(name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(line.iter().map(|&p| Circle::new(p, 2, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_components(path: &Path, title: &str, model: &ForecastModel, table: &ForecastTable) -> DrawResult {
    let origin = first_date(table.rows.iter().map(|r| r.ds)).ok_or("nothing to plot")?;

    let root = SVGBackend::new(path, TALL).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 24))?;

    let kinds: Vec<SeasonalityKind> = model.seasonal.iter().map(|s| s.kind).collect();
    let panels = root.split_evenly((1 + kinds.len(), 1));

    let trend: Vec<(f64, f64)> = table
        .rows
        .iter()
        .map(|r| ((r.ds - origin).num_days() as f64, r.trend))
        .collect();
    draw_panel(&panels[0], "trend", &trend, |v| fmt_day_offset(origin, v))?;

    for (panel, kind) in panels[1..].iter().zip(kinds) {
        let profile = seasonal_profile(model, kind);
        match kind {
            SeasonalityKind::Yearly => draw_panel(panel, "yearly", &profile, |v| {
                fmt_day_offset(NaiveDate::from_ymd_opt(2001, 1, 1).unwrap_or(origin), v)
                    .get(5..)
                    .unwrap_or_default()
                    .to_string()
            })?,
            SeasonalityKind::Weekly => draw_panel(panel, "weekly", &profile, fmt_weekday)?,
            SeasonalityKind::Daily => draw_panel(panel, "daily", &profile, |v| format!("{:02}:00", v.round() as i64))?,
        }
    }

    root.present()?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    label: &str,
    points: &[(f64, f64)],
    fmt_x: impl Fn(f64) -> String,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let x_bounds = bounds(points.iter().map(|p| p.0));
    let y_bounds = bounds(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_bounds[0]..x_bounds[1], y_bounds[0]..y_bounds[1])?;

    chart
        .configure_mesh()
        .y_desc(label)
        .x_labels(8)
        .x_label_formatter(&|v| fmt_x(*v))
        .light_line_style(WHITE.mix(0.0))
        .bold_line_style(BLACK.mix(0.1))
        .draw()?;

    chart.draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))?;
    Ok(())
}

fn first_date(dates: impl Iterator<Item = NaiveDate>) -> Option<NaiveDate> {
    dates.min()
}

/// `[min, max]` padded by 5%; falls back to `[0, 1]` for empty or flat input.
fn bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return [0.0, 1.0];
    }
    if hi <= lo {
        return [lo - 0.5, hi + 0.5];
    }
    let pad = (hi - lo) * 0.05;
    [lo - pad, hi + pad]
}

fn fmt_day_offset(origin: NaiveDate, v: f64) -> String {
    let days = v.round();
    if days < 0.0 {
        return String::new();
    }
    origin
        .checked_add_days(Days::new(days as u64))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn fmt_weekday(v: f64) -> String {
    const NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    let idx = v.round();
    if (0.0..7.0).contains(&idx) {
        NAMES[idx as usize].to_string()
    } else {
        String::new()
    }
}
