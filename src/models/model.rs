//! Model evaluation for the additive trend + seasonality model.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a given date (for least squares)
//! - predict the components at a given date (for forecasts/plots)
//!
//! Column layout of a design row:
//!
//! ```text
//! [ t | 1 | (t - s_1)+ ... (t - s_C)+ | yearly sin/cos ... | weekly ... | daily ... ]
//! ```

use chrono::{Datelike, NaiveDate};

use crate::domain::{ForecastModel, ForecastRow, SeasonalityKind};
use crate::math::{days_since_epoch, fourier_terms, fourier_value, hinge};

/// Two-sided normal quantile for the given central interval width.
///
/// Only the widths used in practice are tabulated; anything else falls back
/// to the 80% value the model is configured with by default.
pub fn z_for_interval(width: f64) -> f64 {
    match width {
        w if w >= 0.99 => 2.575_829_303_549,
        w if w >= 0.95 => 1.959_963_984_540,
        w if w >= 0.90 => 1.644_853_626_951,
        _ => 1.281_551_565_545,
    }
}

/// Number of coefficients for a model with `n_changepoints` and the given seasonalities.
pub fn design_width(n_changepoints: usize, seasonalities: &[SeasonalityKind]) -> usize {
    2 + n_changepoints + seasonalities.iter().map(|s| 2 * s.order()).sum::<usize>()
}

/// Fill a design row.
///
/// # Panics
/// Panics if `out.len() != design_width(changepoints.len(), seasonalities)`.
pub fn fill_design_row(
    t: f64,
    t_days: f64,
    changepoints: &[f64],
    seasonalities: &[SeasonalityKind],
    out: &mut [f64],
) {
    out[0] = t;
    out[1] = 1.0;
    let mut col = 2;
    for &s in changepoints {
        out[col] = hinge(t, s);
        col += 1;
    }
    for kind in seasonalities {
        let width = 2 * kind.order();
        fourier_terms(t_days, kind.period(), kind.order(), &mut out[col..col + width]);
        col += width;
    }
}

/// Scaled time for `date` (0 at the first history date, 1 at the last).
pub fn scaled_time(model: &ForecastModel, date: NaiveDate) -> f64 {
    (date - model.start).num_days() as f64 / model.t_scale_days
}

/// Trend value in scaled units.
pub fn trend_at(model: &ForecastModel, t: f64) -> f64 {
    let p = &model.trend;
    let mut value = p.k * t + p.m;
    for (&s, &delta) in p.changepoints.iter().zip(p.deltas.iter()) {
        value += delta * hinge(t, s);
    }
    value
}

/// Seasonal contribution of one kind in scaled units (0 if the model lacks it).
pub fn seasonal_at(model: &ForecastModel, kind: SeasonalityKind, t_days: f64) -> f64 {
    model
        .seasonal
        .iter()
        .filter(|term| term.kind == kind)
        .map(|term| fourier_value(t_days, term.period, &term.betas))
        .sum()
}

/// Half-width of the prediction interval at scaled time `t` (original units).
///
/// Inside the history only observation noise contributes. Beyond it, future
/// trend changes are assumed to arrive at the historical changepoint rate with
/// Laplace-distributed magnitudes (scale = mean |δ|); integrating their effect
/// over a horizon `h` gives a variance of `S · 2b² · h³ / 3`.
pub fn interval_half_width(model: &ForecastModel, t: f64) -> f64 {
    let z = z_for_interval(model.config.interval_width);
    let sigma2 = model.sigma_obs * model.sigma_obs;

    let h = (t - 1.0).max(0.0);
    let n_cp = model.trend.deltas.len();
    let trend_var = if n_cp > 0 && h > 0.0 {
        let b = model.trend.deltas.iter().map(|d| d.abs()).sum::<f64>() / n_cp as f64 + 1e-8;
        n_cp as f64 * 2.0 * b * b * h.powi(3) / 3.0
    } else {
        0.0
    };

    z * (sigma2 + trend_var).sqrt() * model.y_scale
}

/// Predict one date.
pub fn predict_row(model: &ForecastModel, date: NaiveDate) -> ForecastRow {
    let t = scaled_time(model, date);
    let t_days = days_since_epoch(date);

    let trend = trend_at(model, t) * model.y_scale;
    let yearly = seasonal_at(model, SeasonalityKind::Yearly, t_days) * model.y_scale;
    let weekly = seasonal_at(model, SeasonalityKind::Weekly, t_days) * model.y_scale;
    let daily = seasonal_at(model, SeasonalityKind::Daily, t_days) * model.y_scale;

    let yhat = trend + yearly + weekly + daily;
    let half = interval_half_width(model, t);

    ForecastRow {
        ds: date,
        yhat,
        yhat_lower: yhat - half,
        yhat_upper: yhat + half,
        trend,
        yearly,
        weekly,
        daily,
    }
}

/// One period of a seasonal component as `(x, value)` in original units.
///
/// x is day-of-year (yearly), day index from Monday (weekly) or hour of day (daily).
pub fn seasonal_profile(model: &ForecastModel, kind: SeasonalityKind) -> Vec<(f64, f64)> {
    let year = model.start.year();
    let (base, steps, step_days) = match kind {
        SeasonalityKind::Yearly => {
            let jan1 = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(model.start);
            (days_since_epoch(jan1), 365, 1.0)
        }
        SeasonalityKind::Weekly => {
            // 2024-01-01 is a Monday.
            let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(model.start);
            (days_since_epoch(monday), 7, 1.0)
        }
        SeasonalityKind::Daily => (days_since_epoch(model.start), 25, 1.0 / 24.0),
    };

    (0..steps)
        .map(|i| {
            let t_days = base + i as f64 * step_days;
            (i as f64, seasonal_at(model, kind, t_days) * model.y_scale)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitQuality, ModelConfig, SeasonalTerm, TrendParams};

    fn flat_model() -> ForecastModel {
        ForecastModel {
            product: "A".to_string(),
            config: ModelConfig::default(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            t_scale_days: 100.0,
            y_scale: 10.0,
            trend: TrendParams {
                k: 0.0,
                m: 1.0,
                changepoints: vec![0.5],
                deltas: vec![0.2],
            },
            seasonal: vec![SeasonalTerm {
                kind: SeasonalityKind::Weekly,
                period: 7.0,
                order: 1,
                betas: vec![0.0, 0.1],
            }],
            sigma_obs: 0.05,
            quality: FitQuality { n: 0, sse: 0.0, rmse: 0.0 },
            history: Vec::new(),
        }
    }

    #[test]
    fn design_row_layout() {
        let seas = [SeasonalityKind::Weekly];
        let width = design_width(2, &seas);
        assert_eq!(width, 2 + 2 + 6);
        let mut row = vec![0.0; width];
        fill_design_row(0.75, 3.0, &[0.25, 0.9], &seas, &mut row);
        assert_eq!(row[0], 0.75);
        assert_eq!(row[1], 1.0);
        assert!((row[2] - 0.5).abs() < 1e-12);
        assert_eq!(row[3], 0.0);
    }

    #[test]
    fn trend_bends_at_changepoint() {
        let model = flat_model();
        assert!((trend_at(&model, 0.25) - 1.0).abs() < 1e-12);
        assert!((trend_at(&model, 1.0) - 1.1).abs() < 1e-12);
    }

    #[test]
    fn interval_widens_beyond_history() {
        let model = flat_model();
        let inside = interval_half_width(&model, 0.5);
        let edge = interval_half_width(&model, 1.0);
        let beyond = interval_half_width(&model, 1.3);
        assert!((inside - edge).abs() < 1e-12);
        assert!(beyond > edge);
    }

    #[test]
    fn predicted_row_is_ordered() {
        let model = flat_model();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let row = predict_row(&model, date);
        assert!(row.yhat_lower <= row.yhat && row.yhat <= row.yhat_upper);
        let sum = row.trend + row.yearly + row.weekly + row.daily;
        assert!((sum - row.yhat).abs() < 1e-9);
        assert_eq!(row.yearly, 0.0);
    }

    #[test]
    fn weekly_profile_has_seven_points() {
        let model = flat_model();
        let profile = seasonal_profile(&model, SeasonalityKind::Weekly);
        assert_eq!(profile.len(), 7);
        // cos term only: Monday value equals cos(2π·t/7)·0.1·y_scale.
        let t0 = days_since_epoch(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let expected = (2.0 * std::f64::consts::PI * t0 / 7.0).cos() * 0.1 * 10.0;
        assert!((profile[0].1 - expected).abs() < 1e-9);
        assert!(seasonal_profile(&model, SeasonalityKind::Yearly).iter().all(|p| p.1 == 0.0));
        assert_eq!(seasonal_profile(&model, SeasonalityKind::Daily).len(), 25);
    }

    #[test]
    fn z_table() {
        assert!((z_for_interval(0.8) - 1.2816).abs() < 1e-4);
        assert!((z_for_interval(0.95) - 1.96).abs() < 1e-3);
    }
}
