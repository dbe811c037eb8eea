//! Forecast tables: the future date index and batch prediction.

use chrono::{Days, NaiveDate};

use crate::domain::{ForecastModel, ForecastTable};
use crate::error::AppError;
use crate::models::predict_row;

/// Sorted unique history dates followed by `horizon` daily dates.
///
/// History spacing is kept as-is; no gaps are filled.
pub fn future_dates(model: &ForecastModel, horizon: usize) -> Result<Vec<NaiveDate>, AppError> {
    let mut dates: Vec<NaiveDate> = model.history.iter().map(|p| p.ds).collect();
    dates.sort();
    dates.dedup();

    let last = *dates
        .last()
        .ok_or_else(|| AppError::library(format!("Model for '{}' has no history.", model.product)))?;

    // Bounds `horizon` by the calendar before anything is allocated for it.
    u64::try_from(horizon)
        .ok()
        .and_then(|h| last.checked_add_days(Days::new(h)))
        .ok_or_else(|| AppError::usage("Forecast horizon runs past the supported date range."))?;

    dates.extend((1..=horizon as u64).filter_map(|i| last.checked_add_days(Days::new(i))));
    Ok(dates)
}

/// `count` consecutive daily dates starting at `start`.
pub fn date_range(start: NaiveDate, count: usize) -> Result<Vec<NaiveDate>, AppError> {
    u64::try_from(count)
        .ok()
        .and_then(|n| start.checked_add_days(Days::new(n)))
        .ok_or_else(|| AppError::usage("Date range runs past the supported date range."))?;

    (0..count)
        .map(|i| {
            start
                .checked_add_days(Days::new(i as u64))
                .ok_or_else(|| AppError::library("Date range runs past the supported date range."))
        })
        .collect()
}

/// Predict every date in `dates`.
pub fn predict(model: &ForecastModel, dates: &[NaiveDate]) -> Result<ForecastTable, AppError> {
    let mut rows = Vec::with_capacity(dates.len());
    for &date in dates {
        let row = predict_row(model, date);
        if !(row.yhat.is_finite() && row.yhat_lower.is_finite() && row.yhat_upper.is_finite()) {
            return Err(AppError::library(format!(
                "Non-finite prediction for '{}' at {date}.",
                model.product
            )));
        }
        rows.push(row);
    }
    Ok(ForecastTable {
        product: model.product.clone(),
        interval_width: model.config.interval_width,
        rows,
    })
}
