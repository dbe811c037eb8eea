//! Basis functions for the additive sales model.
//!
//! - Fourier terms: `sin(2πkt/P)`, `cos(2πkt/P)` for `k = 1..=order`, evaluated on
//!   days since 1970-01-01 so that the phase of a seasonality does not depend on
//!   where a product's history starts.
//! - Hinge: `max(0, t - s)`, the building block of the piecewise-linear trend.

use chrono::NaiveDate;

/// Days between the Unix epoch and `date`.
pub fn days_since_epoch(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days() as f64
}

/// Fill `out` (length `2 * order`) with Fourier terms ordered `sin1, cos1, sin2, cos2, ...`.
pub fn fourier_terms(t_days: f64, period: f64, order: usize, out: &mut [f64]) {
    for k in 0..order {
        let x = 2.0 * std::f64::consts::PI * (k as f64 + 1.0) * t_days / period;
        out[2 * k] = x.sin();
        out[2 * k + 1] = x.cos();
    }
}

/// Evaluate a Fourier series with the given coefficients.
pub fn fourier_value(t_days: f64, period: f64, betas: &[f64]) -> f64 {
    let order = betas.len() / 2;
    let mut sum = 0.0;
    for k in 0..order {
        let x = 2.0 * std::f64::consts::PI * (k as f64 + 1.0) * t_days / period;
        sum += betas[2 * k] * x.sin() + betas[2 * k + 1] * x.cos();
    }
    sum
}

pub fn hinge(t: f64, s: f64) -> f64 {
    (t - s).max(0.0)
}
