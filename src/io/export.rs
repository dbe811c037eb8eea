//! Export forecast tables to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: `ds,yhat,yhat_lower,yhat_upper` with ISO dates.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::ForecastTable;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct ForecastCsvRow {
    ds: String,
    yhat: f64,
    yhat_lower: f64,
    yhat_upper: f64,
}

/// Write the forecast table to `writer`.
pub fn write_forecast<W: Write>(writer: W, table: &ForecastTable) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in &table.rows {
        wtr.serialize(ForecastCsvRow {
            ds: r.ds.format("%Y-%m-%d").to_string(),
            yhat: r.yhat,
            yhat_lower: r.yhat_lower,
            yhat_upper: r.yhat_upper,
        })
        .map_err(|e| AppError::io(format!("Failed to write forecast CSV row: {e}")))?;
    }
    if table.rows.is_empty() {
        wtr.write_record(["ds", "yhat", "yhat_lower", "yhat_upper"])
            .map_err(|e| AppError::io(format!("Failed to write forecast CSV header: {e}")))?;
    }
    wtr.flush()
        .map_err(|e| AppError::io(format!("Failed to flush forecast CSV: {e}")))?;
    Ok(())
}

/// Write the forecast table to a CSV file, creating parent directories.
pub fn write_forecast_csv(path: &Path, table: &ForecastTable) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", parent.display())))?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create forecast CSV '{}': {e}", path.display())))?;
    write_forecast(file, table)
}

/// Render the forecast table as CSV text (dashboard export / stdout).
pub fn forecast_csv_string(table: &ForecastTable) -> Result<String, AppError> {
    let mut buf = Vec::new();
    write_forecast(&mut buf, table)?;
    String::from_utf8(buf).map_err(|e| AppError::io(format!("Forecast CSV is not UTF-8: {e}")))
}
