use std::fs;
use std::path::Path;

use chrono::{Days, NaiveDate};
use sales_forecast::app::pipeline::{forecast, train, train_all};
use sales_forecast::domain::SalesRecord;
use sales_forecast::error::AppError;
use sales_forecast::io::{ModelStore, SalesDataset, load_sales, write_sales_csv};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// `n` rows for `product`, one every `step` days from `start`, with a weekly wiggle.
fn series(product: &str, start: NaiveDate, n: u64, step: u64, level: f64) -> Vec<SalesRecord> {
    (0..n)
        .map(|i| SalesRecord {
            date: start.checked_add_days(Days::new(i * step)).unwrap(),
            product: product.to_string(),
            quantity: level + (i % 7) as f64 * 2.0 + i as f64 * 0.05,
        })
        .collect()
}

/// A: 100 rows every 3 days through 2023. B: 100 daily rows in 2024.
fn two_product_csv(dir: &Path) -> SalesDataset {
    let mut rows = series("A", d(2023, 1, 1), 100, 3, 50.0);
    rows.extend(series("B", d(2024, 1, 1), 100, 1, 20.0));
    let path = dir.join("sales.csv");
    write_sales_csv(&path, &rows).unwrap();
    load_sales(&path).unwrap()
}

#[test]
fn train_then_forecast_every_product() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = two_product_csv(dir.path());
    let store = ModelStore::new(dir.path().join("models"));
    let output = dir.path().join("output");

    let outputs = train_all(&dataset, &store, &output, false).unwrap();
    assert_eq!(outputs.len(), 2);
    assert!(output.join("a_prediction.svg").is_file());
    assert!(output.join("b_prediction.svg").is_file());

    for product in dataset.products() {
        let table = forecast(&store, &product, 30).unwrap();
        assert!(!table.is_empty());
        for row in &table.rows {
            assert!(
                row.yhat_lower <= row.yhat && row.yhat <= row.yhat_upper,
                "unordered bounds at {}: {} {} {}",
                row.ds,
                row.yhat_lower,
                row.yhat,
                row.yhat_upper
            );
        }
    }
}

#[test]
fn forecast_extends_history_by_horizon() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = two_product_csv(dir.path());
    let store = ModelStore::new(dir.path().join("models"));
    train_all(&dataset, &store, &dir.path().join("output"), false).unwrap();

    let a = dataset.product_slice("A");
    let last = a.last_date().unwrap();
    let table = forecast(&store, "A", 30).unwrap();

    assert_eq!(table.len(), a.len() + 30);
    assert_eq!(table.last().unwrap().ds, last + Days::new(30));
    assert_eq!(table.rows[0].ds, a.first_date().unwrap());
    // History spacing is kept; only the horizon is daily.
    assert_eq!(table.rows[1].ds, d(2023, 1, 4));
    assert_eq!(table.rows[a.len()].ds, last + Days::new(1));
}

#[test]
fn daily_products_on_disjoint_ranges_forecast_independently() {
    let dir = tempfile::tempdir().unwrap();
    let mut rows = series("A", d(2022, 1, 1), 100, 1, 40.0);
    rows.extend(series("B", d(2024, 1, 1), 100, 1, 20.0));
    let path = dir.path().join("sales.csv");
    write_sales_csv(&path, &rows).unwrap();
    let dataset = load_sales(&path).unwrap();
    let store = ModelStore::new(dir.path().join("models"));
    train_all(&dataset, &store, &dir.path().join("output"), false).unwrap();

    for (product, last) in [("A", d(2022, 4, 10)), ("B", d(2024, 4, 9))] {
        let table = forecast(&store, product, 30).unwrap();
        assert_eq!(table.len(), 130, "{product}");
        assert_eq!(table.last().unwrap().ds, last + Days::new(30));
        assert!(
            table
                .rows
                .iter()
                .all(|r| r.yhat_lower <= r.yhat && r.yhat <= r.yhat_upper),
            "unordered bounds for {product}"
        );
    }
}

#[test]
fn oversized_horizon_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path().join("models"));
    let dataset = SalesDataset::new(series("A", d(2024, 1, 1), 30, 1, 10.0));
    train("A", &dataset, &store, dir.path()).unwrap();

    let err = forecast(&store, "A", usize::MAX).unwrap_err();
    assert!(matches!(err, AppError::Usage(_)), "got {err:?}");
}

#[test]
fn retraining_overwrites_the_same_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path().join("models"));
    let output = dir.path().join("output");

    let first = SalesDataset::new(series("A", d(2024, 1, 1), 60, 1, 10.0));
    let out1 = train("A", &first, &store, &output).unwrap();
    let before = forecast(&store, "A", 30).unwrap();

    let second = SalesDataset::new(series("A", d(2024, 1, 1), 60, 1, 500.0));
    let out2 = train("A", &second, &store, &output).unwrap();
    let after = forecast(&store, "A", 30).unwrap();

    assert_eq!(out1.model_path, out2.model_path);
    assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
    assert_eq!(after.len(), out2.forecast.len());
    let (a, b) = (after.last().unwrap(), out2.forecast.last().unwrap());
    assert!((a.yhat - b.yhat).abs() < 1e-6);
    assert!(after.last().unwrap().yhat > before.last().unwrap().yhat + 100.0);
}

#[test]
fn artifact_path_is_case_folded() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());
    let dataset = SalesDataset::new(series("Paracetamol", d(2024, 1, 1), 40, 1, 30.0));

    let out = train("Paracetamol", &dataset, &store, dir.path()).unwrap();
    let name = out.model_path.file_name().unwrap().to_str().unwrap();
    assert!(name.contains("paracetamol"));
    assert_eq!(store.path_for("PARACETAMOL").unwrap(), out.model_path);
    assert!(forecast(&store, "paracetamol", 7).is_ok());
}

#[test]
fn forecast_without_artifact_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path().join("models"));
    let err = forecast(&store, "Ibuprofen", 30).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn training_an_absent_product_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path().join("models"));
    let dataset = SalesDataset::new(series("A", d(2024, 1, 1), 30, 1, 10.0));

    let err = train("Z", &dataset, &store, dir.path()).unwrap_err();
    assert!(matches!(err, AppError::Data(_)), "got {err:?}");
    assert!(err.to_string().contains("no rows for product"));
    assert!(!store.exists("Z"));
}

#[test]
fn train_all_stops_at_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path().join("models"));
    // "Bad" has a single row, which the fitter rejects; "Later" is never reached.
    let mut rows = series("Good", d(2024, 1, 1), 30, 1, 10.0);
    rows.extend(series("Bad", d(2024, 1, 1), 1, 1, 10.0));
    rows.extend(series("Later", d(2024, 1, 1), 30, 1, 10.0));

    let err = train_all(&SalesDataset::new(rows), &store, dir.path(), false).unwrap_err();
    assert!(matches!(err, AppError::Library(_)), "got {err:?}");
    assert!(store.exists("Good"));
    assert!(!store.exists("Later"));
}
