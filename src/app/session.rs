//! Session state for interactive front-ends.
//!
//! The dashboard passes one `SessionContext` around instead of reaching for
//! globals: the loaded dataset, the selected product and the date filter.

use chrono::NaiveDate;

use crate::domain::{HistoryPoint, Metrics, SalesRecord};
use crate::error::AppError;
use crate::io::SalesDataset;
use crate::report::compute_metrics;

#[derive(Debug, Clone)]
pub struct SessionContext {
    dataset: SalesDataset,
    products: Vec<String>,
    selected: usize,
    range: (NaiveDate, NaiveDate),
}

impl SessionContext {
    /// Select the first product and the full date range of the dataset.
    pub fn new(dataset: SalesDataset) -> Result<Self, AppError> {
        let products = dataset.products();
        let range = dataset
            .date_bounds()
            .ok_or_else(|| AppError::data("Sales data has no rows."))?;
        Ok(Self {
            dataset,
            products,
            selected: 0,
            range,
        })
    }

    pub fn dataset(&self) -> &SalesDataset {
        &self.dataset
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_product(&self) -> &str {
        self.products.get(self.selected).map(String::as_str).unwrap_or("")
    }

    pub fn select(&mut self, idx: usize) {
        if idx < self.products.len() {
            self.selected = idx;
        }
    }

    pub fn select_product(&mut self, product: &str) -> Result<(), AppError> {
        let idx = self
            .products
            .iter()
            .position(|p| p == product)
            .ok_or_else(|| AppError::data(format!("no rows for product '{product}'")))?;
        self.selected = idx;
        Ok(())
    }

    pub fn select_next(&mut self) {
        if !self.products.is_empty() {
            self.selected = (self.selected + 1) % self.products.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.products.is_empty() {
            self.selected = (self.selected + self.products.len() - 1) % self.products.len();
        }
    }

    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        self.range
    }

    /// Set the inclusive date filter. `from` must not be after `to`.
    pub fn set_date_range(&mut self, from: NaiveDate, to: NaiveDate) -> Result<(), AppError> {
        if from > to {
            return Err(AppError::usage(format!("Invalid date range: {from} is after {to}.")));
        }
        self.range = (from, to);
        Ok(())
    }

    /// Restore the full range of the dataset.
    pub fn reset_date_range(&mut self) {
        if let Some(bounds) = self.dataset.date_bounds() {
            self.range = bounds;
        }
    }

    /// Selected product's rows inside the date filter, sorted by date.
    pub fn filtered_records(&self) -> Vec<SalesRecord> {
        let (from, to) = self.range;
        self.dataset
            .product_slice(self.selected_product())
            .records
            .into_iter()
            .filter(|r| r.date >= from && r.date <= to)
            .collect()
    }

    pub fn filtered_history(&self) -> Vec<HistoryPoint> {
        self.filtered_records()
            .iter()
            .map(|r| HistoryPoint { ds: r.date, y: r.quantity })
            .collect()
    }

    pub fn metrics(&self) -> Metrics {
        compute_metrics(&self.filtered_records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn session() -> SessionContext {
        let rows = [("B", 1, 4.0), ("A", 1, 1.0), ("A", 2, 3.0), ("A", 3, 8.0), ("B", 2, 6.0)];
        let records = rows
            .iter()
            .map(|&(p, day, q)| SalesRecord { date: d(day), product: p.to_string(), quantity: q })
            .collect();
        SessionContext::new(SalesDataset::new(records)).unwrap()
    }

    #[test]
    fn starts_on_first_product_and_full_range() {
        let s = session();
        assert_eq!(s.selected_product(), "B");
        assert_eq!(s.date_range(), (d(1), d(3)));
        assert_eq!(s.metrics().sum, 10.0);
    }

    #[test]
    fn filter_applies_to_metrics_and_history() {
        let mut s = session();
        s.select_product("A").unwrap();
        s.set_date_range(d(2), d(3)).unwrap();
        let m = s.metrics();
        assert_eq!(m.count, 2);
        assert_eq!(m.mean, Some(5.5));
        assert_eq!(m.max, Some(8.0));
        assert_eq!(s.filtered_history().first().map(|p| p.ds), Some(d(2)));

        s.reset_date_range();
        assert_eq!(s.metrics().count, 3);
    }

    #[test]
    fn selection_wraps_and_validates() {
        let mut s = session();
        s.select_prev();
        assert_eq!(s.selected_product(), "A");
        s.select_next();
        assert_eq!(s.selected_product(), "B");
        assert!(matches!(s.select_product("C"), Err(AppError::Data(_))));
        assert!(matches!(s.set_date_range(d(3), d(1)), Err(AppError::Usage(_))));
    }

    #[test]
    fn empty_dataset_is_rejected() {
        assert!(SessionContext::new(SalesDataset::default()).is_err());
    }
}
