//! Model fitting for a single product.
//!
//! Given:
//! - dates `ds_i` and quantities `y_i` (sorted by date)
//! - a fixed `ModelConfig`
//!
//! we:
//! - scale time to `[0, 1]` over the history and y by `max |y|`
//! - place trend changepoints
//! - solve a ridge-penalized least squares problem (Gaussian priors on every
//!   coefficient group) for trend + Fourier seasonality
//! - re-estimate the noise scale from residuals and refit a fixed number of times
//!
//! and return the resulting `ForecastModel`.

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{
    FitQuality, ForecastModel, HistoryPoint, ModelConfig, SeasonalTerm, TrendParams,
};
use crate::error::AppError;
use crate::fit::place_changepoints;
use crate::math::{days_since_epoch, solve_ridge};
use crate::models::{design_width, fill_design_row};

/// Number of solve / noise re-estimation passes.
const FIT_PASSES: usize = 3;

/// Initial noise variance in scaled units (half-normal prior scale 0.5).
const INITIAL_SIGMA2: f64 = 0.25;

/// Floor for the noise variance so penalties never vanish entirely.
const SIGMA2_FLOOR: f64 = 1e-8;

/// Fit a model to one product's `(date, quantity)` series.
pub fn fit_model(
    product: &str,
    series: &[(NaiveDate, f64)],
    config: &ModelConfig,
) -> Result<ForecastModel, AppError> {
    let n = series.len();
    if n < 2 {
        return Err(AppError::library(format!(
            "Need at least 2 observations to fit '{product}', got {n}."
        )));
    }
    if series.iter().any(|(_, y)| !y.is_finite()) {
        return Err(AppError::library(format!("Non-finite quantity in history for '{product}'.")));
    }
    if series.windows(2).any(|w| w[1].0 < w[0].0) {
        return Err(AppError::library(format!("History for '{product}' is not sorted by date.")));
    }

    let start = series[0].0;
    let end = series[n - 1].0;
    let t_scale_days = (end - start).num_days() as f64;
    if t_scale_days <= 0.0 {
        return Err(AppError::library(format!(
            "History for '{product}' spans a single date; cannot fit a trend."
        )));
    }

    let y_max = series.iter().map(|(_, y)| y.abs()).fold(0.0_f64, f64::max);
    let y_scale = if y_max > 0.0 { y_max } else { 1.0 };

    let t: Vec<f64> = series
        .iter()
        .map(|(d, _)| (*d - start).num_days() as f64 / t_scale_days)
        .collect();
    let t_days: Vec<f64> = series.iter().map(|(d, _)| days_since_epoch(*d)).collect();
    let y = DVector::from_iterator(n, series.iter().map(|(_, v)| v / y_scale));

    let changepoints = place_changepoints(&t, config.n_changepoints, config.changepoint_range)?;
    let n_cp = changepoints.len();
    let p = design_width(n_cp, &config.seasonalities);

    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for i in 0..n {
        fill_design_row(t[i], t_days[i], &changepoints, &config.seasonalities, &mut row);
        for (j, &v) in row.iter().enumerate() {
            x[(i, j)] = v;
        }
    }

    let mut sigma2 = INITIAL_SIGMA2;
    let mut beta = DVector::<f64>::zeros(p);
    let mut sse = f64::NAN;

    for pass in 0..FIT_PASSES {
        let penalties = penalties(config, n_cp, p, sigma2);
        beta = solve_ridge(&x, &y, &penalties).ok_or_else(|| {
            AppError::library(format!("Least squares solve failed for '{product}'."))
        })?;

        let resid = &y - &x * &beta;
        sse = resid.norm_squared();
        if !sse.is_finite() {
            return Err(AppError::library(format!("Non-finite residuals for '{product}'.")));
        }
        sigma2 = (sse / n as f64).max(SIGMA2_FLOOR);
        debug!(product, pass, sigma = sigma2.sqrt(), "fit pass");
    }

    let trend = TrendParams {
        k: beta[0],
        m: beta[1],
        changepoints,
        deltas: (0..n_cp).map(|j| beta[2 + j]).collect(),
    };

    let mut seasonal = Vec::with_capacity(config.seasonalities.len());
    let mut col = 2 + n_cp;
    for &kind in &config.seasonalities {
        let width = 2 * kind.order();
        seasonal.push(SeasonalTerm {
            kind,
            period: kind.period(),
            order: kind.order(),
            betas: (col..col + width).map(|j| beta[j]).collect(),
        });
        col += width;
    }

    let sse_orig = sse * y_scale * y_scale;
    let quality = FitQuality {
        n,
        sse: sse_orig,
        rmse: (sse_orig / n as f64).sqrt(),
    };
    debug!(product, n, n_changepoints = n_cp, rmse = quality.rmse, "fitted model");

    Ok(ForecastModel {
        product: product.to_string(),
        config: config.clone(),
        start,
        t_scale_days,
        y_scale,
        trend,
        seasonal,
        sigma_obs: (sse / n as f64).sqrt(),
        quality,
        history: series.iter().map(|&(ds, y)| HistoryPoint { ds, y }).collect(),
    })
}

/// Ridge penalties `σ² / τ²` per design column.
fn penalties(config: &ModelConfig, n_cp: usize, p: usize, sigma2: f64) -> Vec<f64> {
    let trend = sigma2 / config.trend_prior_scale.powi(2);
    let delta = sigma2 / config.changepoint_prior_scale.powi(2);
    let season = sigma2 / config.seasonality_prior_scale.powi(2);

    let mut out = Vec::with_capacity(p);
    out.push(trend);
    out.push(trend);
    out.extend(std::iter::repeat(delta).take(n_cp));
    out.resize(p, season);
    out
}
