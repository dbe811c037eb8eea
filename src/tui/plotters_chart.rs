//! Plotters-powered line chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! X values are plain `f64` (day offsets for date axes); tick text comes from
//! the caller's formatter so dates, weekdays and hours share one widget.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    /// One pixel per point. `Circle` radii are mis-scaled by the ratatui backend.
    Dots,
}

pub struct Series<'a> {
    pub points: &'a [(f64, f64)],
    pub color: RGBColor,
    pub kind: SeriesKind,
}

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct LinePlottersChart<'a> {
    pub series: Vec<Series<'a>>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: &'a dyn Fn(f64) -> String,
    pub fmt_y: &'a dyn Fn(f64) -> String,
}

impl<'a> Widget for LinePlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area.
        if area.width < 20 || area.height < 6 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for s in &self.series {
                match s.kind {
                    SeriesKind::Line => {
                        chart.draw_series(LineSeries::new(s.points.iter().copied(), &s.color))?;
                    }
                    SeriesKind::Dots => {
                        chart.draw_series(s.points.iter().map(|&(x, y)| Pixel::new((x, y), s.color)))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// `[min, max]` over every series' y values, padded by 5%.
pub fn y_bounds(series: &[Series<'_>]) -> [f64; 2] {
    padded(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)))
}

/// `[min, max]` over every series' x values (unpadded, so the axis ends on real dates).
pub fn x_bounds(series: &[Series<'_>]) -> [f64; 2] {
    match extent(series.iter().flat_map(|s| s.points.iter().map(|p| p.0))) {
        None => [0.0, 1.0],
        Some((lo, hi)) if hi <= lo => [lo - 0.5, hi + 0.5],
        Some((lo, hi)) => [lo, hi],
    }
}

fn padded(values: impl Iterator<Item = f64>) -> [f64; 2] {
    match extent(values) {
        None => [0.0, 1.0],
        Some((lo, hi)) if hi <= lo => [lo - 0.5, hi + 0.5],
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            [lo - pad, hi + pad]
        }
    }
}

fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}
