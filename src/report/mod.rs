//! Reporting utilities: aggregate metrics and formatted terminal output.

use crate::domain::{Metrics, SalesRecord};

mod format;

pub use format::*;

/// Count, mean, max and sum of `quantity` over `records`.
///
/// An empty selection has no mean or max.
pub fn compute_metrics<'a>(records: impl IntoIterator<Item = &'a SalesRecord>) -> Metrics {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut max: Option<f64> = None;
    for r in records {
        count += 1;
        sum += r.quantity;
        max = Some(max.map_or(r.quantity, |m| m.max(r.quantity)));
    }
    let mean = (count > 0).then(|| sum / count as f64);
    Metrics { count, mean, max, sum }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(day: u32, q: f64) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            product: "A".to_string(),
            quantity: q,
        }
    }

    #[test]
    fn metrics_basic() {
        let rows = vec![rec(1, 2.0), rec(2, 6.0), rec(3, 4.0)];
        let m = compute_metrics(&rows);
        assert_eq!(m.count, 3);
        assert_eq!(m.sum, 12.0);
        assert_eq!(m.mean, Some(4.0));
        assert_eq!(m.max, Some(6.0));
    }

    #[test]
    fn metrics_empty_selection() {
        let m = compute_metrics(std::iter::empty());
        assert_eq!(m, Metrics { count: 0, mean: None, max: None, sum: 0.0 });
    }
}
