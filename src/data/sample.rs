//! Synthetic daily sales generation.
//!
//! Each product's quantity is `level + trend + yearly + weekly + noise`,
//! rounded to whole units and floored at zero. The RNG is seeded so the same
//! settings always produce the same file.

use std::f64::consts::PI;

use chrono::{Datelike, Days, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::SalesRecord;
use crate::error::AppError;

/// Shape of one synthetic product series.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductProfile {
    pub name: String,
    /// Mean daily quantity at the start date.
    pub level: f64,
    /// Change in mean daily quantity per year.
    pub growth_per_year: f64,
    /// Yearly amplitude; the peak falls on `peak_day_of_year`.
    pub yearly_amp: f64,
    pub peak_day_of_year: u32,
    /// Weekend uplift (Saturday/Sunday) over weekdays.
    pub weekend_uplift: f64,
    /// Standard deviation of the daily noise.
    pub noise_sd: f64,
}

impl ProductProfile {
    fn new(name: &str, level: f64, growth: f64, yearly: f64, peak: u32, weekend: f64, noise: f64) -> Self {
        Self {
            name: name.to_string(),
            level,
            growth_per_year: growth,
            yearly_amp: yearly,
            peak_day_of_year: peak,
            weekend_uplift: weekend,
            noise_sd: noise,
        }
    }
}

/// Settings for `generate_sales`.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub start: NaiveDate,
    pub days: usize,
    pub seed: u64,
    pub products: Vec<ProductProfile>,
}

/// Pharmacy products with winter-peaking cold remedies and a summer-peaking sunscreen.
pub fn default_products() -> Vec<ProductProfile> {
    vec![
        ProductProfile::new("Paracetamol", 120.0, 12.0, 30.0, 15, 10.0, 8.0),
        ProductProfile::new("Ibuprofen", 90.0, 6.0, 20.0, 20, 6.0, 7.0),
        ProductProfile::new("Amoxicillin", 45.0, 3.0, 15.0, 35, -4.0, 5.0),
        ProductProfile::new("Cough Syrup", 60.0, -2.0, 35.0, 10, 3.0, 6.0),
        ProductProfile::new("Sunscreen", 30.0, 4.0, 25.0, 196, 8.0, 4.0),
    ]
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
            days: 730,
            seed: 42,
            products: default_products(),
        }
    }
}

/// Generate one record per product per day, grouped by date.
pub fn generate_sales(config: &SampleConfig) -> Result<Vec<SalesRecord>, AppError> {
    if config.days == 0 {
        return Err(AppError::usage("Sample day count must be > 0."));
    }
    if config.products.is_empty() {
        return Err(AppError::usage("At least one product is required."));
    }
    for p in &config.products {
        if p.name.trim().is_empty() {
            return Err(AppError::usage("Product names must not be empty."));
        }
        if !(p.noise_sd.is_finite() && p.noise_sd >= 0.0) {
            return Err(AppError::usage(format!("Invalid noise level for '{}'.", p.name)));
        }
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::library(format!("Noise distribution error: {e}")))?;

    let mut out = Vec::with_capacity(config.days * config.products.len());
    for i in 0..config.days {
        let date = config
            .start
            .checked_add_days(Days::new(i as u64))
            .ok_or_else(|| AppError::usage("Sample date range overflows the calendar."))?;
        let years = i as f64 / 365.25;
        let doy = date.ordinal() as f64;
        let weekend = date.weekday().number_from_monday() >= 6;

        for p in &config.products {
            let yearly = p.yearly_amp * (2.0 * PI * (doy - p.peak_day_of_year as f64) / 365.25).cos();
            let weekly = if weekend { p.weekend_uplift } else { 0.0 };
            let noise = p.noise_sd * normal.sample(&mut rng);
            let mean = p.level + p.growth_per_year * years + yearly + weekly;
            out.push(SalesRecord {
                date,
                product: p.name.clone(),
                quantity: (mean + noise).round().max(0.0),
            });
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SampleConfig {
        SampleConfig {
            days: 60,
            ..SampleConfig::default()
        }
    }

    #[test]
    fn one_row_per_product_per_day() {
        let cfg = small();
        let rows = generate_sales(&cfg).unwrap();
        assert_eq!(rows.len(), 60 * cfg.products.len());
        assert_eq!(rows[0].date, cfg.start);
        assert_eq!(rows[0].product, "Paracetamol");
        assert!(rows.iter().all(|r| r.quantity >= 0.0 && r.quantity.fract() == 0.0));
    }

    #[test]
    fn same_seed_same_output() {
        let a = generate_sales(&small()).unwrap();
        let b = generate_sales(&small()).unwrap();
        assert_eq!(a, b);

        let c = generate_sales(&SampleConfig { seed: 7, ..small() }).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn weekend_uplift_shows_in_means() {
        let cfg = SampleConfig {
            days: 364,
            products: vec![ProductProfile::new("W", 50.0, 0.0, 0.0, 1, 20.0, 1.0)],
            ..SampleConfig::default()
        };
        let rows = generate_sales(&cfg).unwrap();
        let (mut we, mut wd) = (Vec::new(), Vec::new());
        for r in &rows {
            if r.date.weekday().number_from_monday() >= 6 {
                we.push(r.quantity);
            } else {
                wd.push(r.quantity);
            }
        }
        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        assert!(mean(&we) - mean(&wd) > 15.0);
    }

    #[test]
    fn rejects_empty_settings() {
        assert!(generate_sales(&SampleConfig { days: 0, ..small() }).is_err());
        assert!(generate_sales(&SampleConfig { products: vec![], ..small() }).is_err());
    }
}
