//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and prediction
//! - persisted as model artifacts (JSON)
//! - exported to CSV or rendered as charts

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the sales input file.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub product: String,
    pub quantity: f64,
}

/// All rows of one product, sorted by date ascending.
#[derive(Debug, Clone)]
pub struct ProductDataset {
    pub product: String,
    pub records: Vec<SalesRecord>,
}

impl ProductDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(date, quantity)` pairs in date order.
    pub fn series(&self) -> Vec<(NaiveDate, f64)> {
        self.records.iter().map(|r| (r.date, r.quantity)).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Rows with `from <= date <= to` (both inclusive).
    pub fn in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<&SalesRecord> {
        self.records
            .iter()
            .filter(|r| r.date >= from && r.date <= to)
            .collect()
    }
}

/// Seasonal components the model always fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityKind {
    Yearly,
    Weekly,
    Daily,
}

impl SeasonalityKind {
    pub const ALL: [SeasonalityKind; 3] = [Self::Yearly, Self::Weekly, Self::Daily];

    /// Period in days.
    pub fn period(self) -> f64 {
        match self {
            Self::Yearly => 365.25,
            Self::Weekly => 7.0,
            Self::Daily => 1.0,
        }
    }

    /// Fourier order.
    pub fn order(self) -> usize {
        match self {
            Self::Yearly => 10,
            Self::Weekly => 3,
            Self::Daily => 4,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Yearly => "yearly",
            Self::Weekly => "weekly",
            Self::Daily => "daily",
        }
    }
}

/// Fixed model configuration.
///
/// All three seasonalities are enabled regardless of how much history a
/// product has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub seasonalities: Vec<SeasonalityKind>,
    pub n_changepoints: usize,
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub trend_prior_scale: f64,
    pub interval_width: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seasonalities: SeasonalityKind::ALL.to_vec(),
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            trend_prior_scale: 5.0,
            interval_width: 0.8,
        }
    }
}

/// Fourier coefficients for one seasonality, ordered `sin1, cos1, sin2, cos2, ...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTerm {
    pub kind: SeasonalityKind,
    pub period: f64,
    pub order: usize,
    pub betas: Vec<f64>,
}

/// Piecewise-linear trend in scaled units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendParams {
    /// Base growth rate.
    pub k: f64,
    /// Offset.
    pub m: f64,
    /// Changepoint locations in scaled time.
    pub changepoints: Vec<f64>,
    /// Rate adjustment at each changepoint.
    pub deltas: Vec<f64>,
}

/// One observation used for fitting, kept inside the model for charts and
/// for building the future date index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub ds: NaiveDate,
    pub y: f64,
}

/// Fit quality diagnostics (in original units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub n: usize,
    pub sse: f64,
    pub rmse: f64,
}

/// A fitted forecasting model for one product.
///
/// Once loaded it is never mutated; refitting produces a new artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastModel {
    pub product: String,
    pub config: ModelConfig,
    /// First history date (scaled time 0).
    pub start: NaiveDate,
    /// History span in days (scaled time 1).
    pub t_scale_days: f64,
    /// Divisor applied to quantities before fitting.
    pub y_scale: f64,
    pub trend: TrendParams,
    pub seasonal: Vec<SeasonalTerm>,
    /// Observation noise (scaled units).
    pub sigma_obs: f64,
    pub quality: FitQuality,
    pub history: Vec<HistoryPoint>,
}

impl ForecastModel {
    pub fn last_history_date(&self) -> Option<NaiveDate> {
        self.history.iter().map(|p| p.ds).max()
    }
}

/// One predicted date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub trend: f64,
    pub yearly: f64,
    pub weekly: f64,
    pub daily: f64,
}

/// Predictions over the fit history plus the requested horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastTable {
    pub product: String,
    pub interval_width: f64,
    pub rows: Vec<ForecastRow>,
}

impl ForecastTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&ForecastRow> {
        self.rows.last()
    }

    /// Rows strictly after `date`.
    pub fn after(&self, date: NaiveDate) -> &[ForecastRow] {
        let idx = self.rows.partition_point(|r| r.ds <= date);
        &self.rows[idx..]
    }
}

/// Aggregate metrics over a filtered product slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub count: usize,
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
}

/// Resolved filesystem layout for a run.
#[derive(Debug, Clone)]
pub struct Paths {
    pub data: PathBuf,
    pub models: PathBuf,
    pub output: PathBuf,
}

/// Horizon used right after training and by the dashboard.
pub const DEFAULT_HORIZON_DAYS: usize = 30;

/// Horizon used for the seasonality breakdown chart.
pub const SEASONALITY_HORIZON_DAYS: usize = 365;

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(ds: NaiveDate) -> ForecastRow {
        ForecastRow {
            ds,
            yhat: 1.0,
            yhat_lower: 0.5,
            yhat_upper: 1.5,
            trend: 1.0,
            yearly: 0.0,
            weekly: 0.0,
            daily: 0.0,
        }
    }

    #[test]
    fn table_after_splits_on_date() {
        let table = ForecastTable {
            product: "A".to_string(),
            interval_width: 0.8,
            rows: vec![row(d(2024, 1, 1)), row(d(2024, 1, 2)), row(d(2024, 1, 3))],
        };
        let tail = table.after(d(2024, 1, 1));
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].ds, d(2024, 1, 2));
        assert!(table.after(d(2024, 1, 3)).is_empty());
    }

    #[test]
    fn product_range_is_inclusive() {
        let ds = ProductDataset {
            product: "A".to_string(),
            records: (1..=5)
                .map(|i| SalesRecord {
                    date: d(2024, 1, i),
                    product: "A".to_string(),
                    quantity: i as f64,
                })
                .collect(),
        };
        let picked = ds.in_range(d(2024, 1, 2), d(2024, 1, 4));
        assert_eq!(picked.len(), 3);
        assert_eq!(ds.first_date(), Some(d(2024, 1, 1)));
        assert_eq!(ds.last_date(), Some(d(2024, 1, 5)));
    }

    #[test]
    fn default_config_enables_all_seasonalities() {
        let cfg = ModelConfig::default();
        assert_eq!(cfg.seasonalities.len(), 3);
        assert_eq!(cfg.n_changepoints, 25);
        assert!((cfg.interval_width - 0.8).abs() < 1e-12);
    }
}
