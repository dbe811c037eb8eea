//! Trend changepoint placement.
//!
//! Changepoints are placed deterministically at evenly spaced row indices over
//! the first `changepoint_range` fraction of the history (the first row itself
//! is never a changepoint). Short histories get fewer changepoints.

use crate::error::AppError;

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn lin_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && max >= min) {
        return Err(AppError::library(format!(
            "Invalid range: min={min}, max={max} (must be finite and max>=min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::library("Range steps must be >= 2."));
    }

    let step = (max - min) / (steps as f64 - 1.0);
    Ok((0..steps).map(|i| min + step * i as f64).collect())
}

/// Effective changepoint count for a history of `n_rows` rows.
pub fn changepoint_count(n_rows: usize, requested: usize, range: f64) -> usize {
    let hist_size = (n_rows as f64 * range).floor() as usize;
    if requested + 1 > hist_size {
        hist_size.saturating_sub(1)
    } else {
        requested
    }
}

/// Changepoint locations in scaled time.
///
/// `t` must be the scaled time of each history row, sorted ascending.
pub fn place_changepoints(t: &[f64], requested: usize, range: f64) -> Result<Vec<f64>, AppError> {
    let count = changepoint_count(t.len(), requested, range);
    if count == 0 {
        return Ok(Vec::new());
    }

    let hist_size = (t.len() as f64 * range).floor() as usize;
    let idx = lin_space(0.0, (hist_size - 1) as f64, count + 1)?;
    Ok(idx
        .into_iter()
        .skip(1)
        .map(|i| t[i.round() as usize])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lin_space_includes_endpoints() {
        let v = lin_space(0.0, 10.0, 5).unwrap();
        assert_eq!(v.len(), 5);
        assert!((v[0] - 0.0).abs() < 1e-12);
        assert!((v[4] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn count_shrinks_for_short_histories() {
        assert_eq!(changepoint_count(1000, 25, 0.8), 25);
        assert_eq!(changepoint_count(20, 25, 0.8), 15);
        assert_eq!(changepoint_count(2, 25, 0.8), 0);
        assert_eq!(changepoint_count(1, 25, 0.8), 0);
    }

    #[test]
    fn changepoints_stay_in_first_part_of_history() {
        let t: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let cps = place_changepoints(&t, 25, 0.8).unwrap();
        assert_eq!(cps.len(), 25);
        assert!(cps[0] > 0.0);
        assert!(cps.iter().all(|&c| c <= 0.8));
        assert!(cps.windows(2).all(|w| w[0] <= w[1]));
    }
}
