//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed history: `o`
//! - forecast: `-` line
//! - interval bounds: `.`
//! - first forecast date: `|` column

use chrono::NaiveDate;

use crate::domain::{ForecastTable, HistoryPoint};

/// Render history + forecast as an ASCII chart.
pub fn render_ascii_forecast(
    history: &[HistoryPoint],
    table: &ForecastTable,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((d_min, d_max)) = date_range(history, table) else {
        return "Plot: no data\n".to_string();
    };
    let x_span = ((d_max - d_min).num_days() as f64).max(1.0);
    let x_of = |d: NaiveDate| (d - d_min).num_days() as f64 / x_span;

    let (y_min, y_max) = y_range(history, table).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Forecast boundary first so every series can overlay it.
    let last_hist = history.iter().map(|p| p.ds).max();
    if let Some(last) = last_hist {
        if last < d_max {
            let x = map_x(x_of(last), width);
            for row in grid.iter_mut() {
                row[x] = '|';
            }
        }
    }

    let lower: Vec<(f64, f64)> = table.rows.iter().map(|r| (x_of(r.ds), r.yhat_lower)).collect();
    let upper: Vec<(f64, f64)> = table.rows.iter().map(|r| (x_of(r.ds), r.yhat_upper)).collect();
    let yhat: Vec<(f64, f64)> = table.rows.iter().map(|r| (x_of(r.ds), r.yhat)).collect();

    draw_curve(&mut grid, &yhat, y_min, y_max, '-');
    draw_curve(&mut grid, &lower, y_min, y_max, '.');
    draw_curve(&mut grid, &upper, y_min, y_max, '.');

    for p in history {
        let x = map_x(x_of(p.ds), width);
        let y = map_y(p.y, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | dates=[{d_min}, {d_max}] | y=[{y_min:.2}, {y_max:.2}]\n",
        table.product
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn date_range(history: &[HistoryPoint], table: &ForecastTable) -> Option<(NaiveDate, NaiveDate)> {
    let dates = history.iter().map(|p| p.ds).chain(table.rows.iter().map(|r| r.ds));
    let (mut min, mut max) = (None::<NaiveDate>, None::<NaiveDate>);
    for d in dates {
        min = Some(min.map_or(d, |m| m.min(d)));
        max = Some(max.map_or(d, |m| m.max(d)));
    }
    Some((min?, max?))
}

fn y_range(history: &[HistoryPoint], table: &ForecastTable) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for p in history {
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    for r in &table.rows {
        min_y = min_y.min(r.yhat_lower);
        max_y = max_y.max(r.yhat_upper);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(u: f64, width: usize) -> usize {
    let width = width.max(2);
    (u.clamp(0.0, 1.0) * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], y_min: f64, y_max: f64, ch: char) {
    if curve.is_empty() {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(u, y) in curve {
        let x = map_x(u, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, ch);
        } else if grid[yy][x] == ' ' || grid[yy][x] == '|' {
            grid[yy][x] = ch;
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish). Only blank or boundary cells are overwritten.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            let cell = &mut grid[y0 as usize][x0 as usize];
            if *cell == ' ' || *cell == '|' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastRow;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn row(day: u32, y: f64) -> ForecastRow {
        ForecastRow {
            ds: d(day),
            yhat: y,
            yhat_lower: y - 1.0,
            yhat_upper: y + 1.0,
            trend: y,
            yearly: 0.0,
            weekly: 0.0,
            daily: 0.0,
        }
    }

    #[test]
    fn plot_has_requested_size_and_markers() {
        let history = vec![HistoryPoint { ds: d(1), y: 10.0 }, HistoryPoint { ds: d(5), y: 14.0 }];
        let table = ForecastTable {
            product: "A".to_string(),
            interval_width: 0.8,
            rows: (1..=10).map(|day| row(day, 9.0 + day as f64)).collect(),
        };
        let out = render_ascii_forecast(&history, &table, 40, 12);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 13);
        assert!(lines[0].starts_with("Plot: A"));
        assert!(lines[1..].iter().all(|l| l.chars().count() == 40));
        assert!(out.contains('o'));
        assert!(out.contains('-'));
        assert!(out.contains('|'));
    }

    #[test]
    fn empty_inputs_render_placeholder() {
        let table = ForecastTable { product: "A".to_string(), interval_width: 0.8, rows: vec![] };
        assert_eq!(render_ascii_forecast(&[], &table, 40, 10), "Plot: no data\n");
    }
}
