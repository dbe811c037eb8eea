//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting/prediction code stays clean and testable
//! - output changes are localized (handy for snapshot-style tests)

use std::path::Path;

use crate::domain::{ForecastModel, ForecastRow, ForecastTable, Metrics};

/// One block per trained product.
pub fn format_train_summary(model: &ForecastModel, model_path: &Path, chart_path: &Path) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", model.product));
    match (model.history.first(), model.history.last()) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "History: n={} | dates=[{}, {}]\n",
            model.history.len(),
            first.ds,
            last.ds
        )),
        _ => out.push_str("History: n=0\n"),
    }
    out.push_str(&format!(
        "Fit: RMSE={:.3} SSE={:.3} | changepoints={} | seasonalities={}\n",
        model.quality.rmse,
        model.quality.sse,
        model.trend.changepoints.len(),
        model
            .seasonal
            .iter()
            .map(|s| s.kind.display_name())
            .collect::<Vec<_>>()
            .join("+"),
    ));
    out.push_str(&format!("Model saved to {}\n", model_path.display()));
    out.push_str(&format!("Plot saved to {}\n", chart_path.display()));

    out
}

/// Forecast rows after the last history date, as a fixed-width table.
pub fn format_forecast_summary(table: &ForecastTable, model: &ForecastModel) -> String {
    let future = match model.last_history_date() {
        Some(last) => table.after(last),
        None => &table.rows[..],
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Forecast: {} | rows={} (history={}, future={}) | interval={:.0}%\n\n",
        table.product,
        table.len(),
        table.len() - future.len(),
        future.len(),
        table.interval_width * 100.0,
    ));
    out.push_str(&format_rows(future));
    out
}

/// Point estimates followed by the interval bounds for every row.
pub fn format_verification(table: &ForecastTable) -> String {
    let mut out = String::new();

    out.push_str(&format!("Predicted Sales for {}:\n", table.product));
    out.push_str(&format!("{:-<32}\n", ""));
    for r in &table.rows {
        out.push_str(&format!("{}: {:.2} units\n", r.ds.format("%Y-%m-%d"), r.yhat));
    }

    out.push_str(&format!(
        "\nPrediction Intervals ({:.0}% confidence):\n",
        table.interval_width * 100.0
    ));
    out.push_str(&format!("{:-<38}\n", ""));
    for r in &table.rows {
        out.push_str(&format!(
            "{}: {:.2} - {:.2} units\n",
            r.ds.format("%Y-%m-%d"),
            r.yhat_lower,
            r.yhat_upper
        ));
    }

    out
}

/// Average/highest/total line used by the dashboard and `sf forecast`.
pub fn format_metrics(metrics: &Metrics) -> String {
    format!(
        "Average Daily Sales: {} | Highest Daily Sales: {} | Total Sales in Period: {:.1} units (n={})",
        fmt_opt_units(metrics.mean),
        fmt_opt_units(metrics.max),
        metrics.sum,
        metrics.count,
    )
}

pub fn fmt_opt_units(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.1} units"),
        None => "n/a".to_string(),
    }
}

fn format_rows(rows: &[ForecastRow]) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<12} {:>12} {:>12} {:>12}\n", "ds", "yhat", "yhat_lower", "yhat_upper").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<12} {:-<12} {:-<12} {:-<12}\n", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<12} {:>12.2} {:>12.2} {:>12.2}\n",
                r.ds.format("%Y-%m-%d").to_string(),
                r.yhat,
                r.yhat_lower,
                r.yhat_upper
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table() -> ForecastTable {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        ForecastTable {
            product: "Paracetamol".to_string(),
            interval_width: 0.8,
            rows: (0..2)
                .map(|i| ForecastRow {
                    ds: start + chrono::Duration::days(i),
                    yhat: 12.345,
                    yhat_lower: 10.0,
                    yhat_upper: 14.5,
                    trend: 12.0,
                    yearly: 0.0,
                    weekly: 0.345,
                    daily: 0.0,
                })
                .collect(),
        }
    }

    #[test]
    fn verification_lists_points_then_intervals() {
        let text = format_verification(&table());
        assert!(text.starts_with("Predicted Sales for Paracetamol:\n"));
        assert!(text.contains("2024-05-01: 12.35 units\n"));
        assert!(text.contains("Prediction Intervals (80% confidence):"));
        assert!(text.contains("2024-05-02: 10.00 - 14.50 units\n"));
        let points = text.find("2024-05-01: 12.35").unwrap();
        let intervals = text.find("Prediction Intervals").unwrap();
        assert!(points < intervals);
    }

    #[test]
    fn metrics_line_handles_empty_selection() {
        let text = format_metrics(&Metrics { count: 0, mean: None, max: None, sum: 0.0 });
        assert!(text.contains("Average Daily Sales: n/a"));
        assert!(text.contains("Total Sales in Period: 0.0 units"));
    }

    #[test]
    fn rows_table_has_header_and_no_trailing_spaces() {
        let text = format_rows(&table().rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ds"));
        assert!(lines.iter().all(|l| !l.ends_with(' ')));
    }
}
