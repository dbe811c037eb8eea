//! Shared per-product pipeline used by the CLI and the dashboard.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! product slice -> fit -> persist -> forecast -> diagnostic chart
//!
//! Front-ends then only deal with presentation (printing vs widgets).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{
    DEFAULT_HORIZON_DAYS, ForecastModel, ForecastTable, HistoryPoint, ModelConfig,
    SEASONALITY_HORIZON_DAYS,
};
use crate::error::AppError;
use crate::fit::fit_model;
use crate::io::{ModelStore, SalesDataset, product_key};
use crate::models::{date_range, future_dates, predict};

/// Everything `train` produced for one product.
#[derive(Debug, Clone)]
pub struct TrainOutput {
    pub model: ForecastModel,
    pub forecast: ForecastTable,
    pub model_path: PathBuf,
    pub chart_path: PathBuf,
}

/// Fit, persist and chart one product.
///
/// Rerunning overwrites the artifact and chart for that product.
pub fn train(
    product: &str,
    dataset: &SalesDataset,
    store: &ModelStore,
    output_dir: &Path,
) -> Result<TrainOutput, AppError> {
    let slice = dataset.product_slice(product);
    if slice.is_empty() {
        return Err(AppError::data(format!("no rows for product '{product}'")));
    }
    debug!(product, rows = slice.len(), "training");

    let model = fit_model(product, &slice.series(), &ModelConfig::default())?;
    let forecast = forecast_model(&model, DEFAULT_HORIZON_DAYS)?;

    let model_path = store.save(&model)?;
    let chart_path = output_file(output_dir, product, "prediction.svg")?;
    crate::plot::write_prediction_chart(
        &chart_path,
        &format!("Sales Prediction for {product}"),
        &model.history,
        &forecast,
    )?;

    info!(
        product,
        model = %model_path.display(),
        chart = %chart_path.display(),
        rmse = model.quality.rmse,
        "trained"
    );

    Ok(TrainOutput {
        model,
        forecast,
        model_path,
        chart_path,
    })
}

/// Train every product in order of first appearance.
///
/// The first failure aborts the run. With `parallel`, products are trained on
/// the rayon pool; results still come back in first-appearance order. Products
/// whose names case-fold to one artifact are always trained sequentially, so
/// the last one listed deterministically owns the file.
pub fn train_all(
    dataset: &SalesDataset,
    store: &ModelStore,
    output_dir: &Path,
    parallel: bool,
) -> Result<Vec<TrainOutput>, AppError> {
    let products = dataset.products();
    if products.is_empty() {
        return Err(AppError::data("Sales data has no rows."));
    }

    let collides = has_shared_keys(&products);
    if parallel && collides {
        warn!("product names share artifact paths; training sequentially");
    }

    if parallel && !collides {
        products
            .par_iter()
            .map(|p| train(p, dataset, store, output_dir))
            .collect()
    } else {
        products
            .iter()
            .map(|p| train(p, dataset, store, output_dir))
            .collect()
    }
}

/// Whether two identifiers map to the same artifact key.
fn has_shared_keys(products: &[String]) -> bool {
    let mut seen = HashSet::new();
    products
        .iter()
        .filter_map(|p| product_key(p).ok())
        .any(|key| !seen.insert(key))
}

/// Load the persisted model for `product` and forecast `horizon` days past its history.
///
/// Every call reloads the artifact.
pub fn forecast(store: &ModelStore, product: &str, horizon: usize) -> Result<ForecastTable, AppError> {
    load_and_forecast(store, product, horizon).map(|(_, table)| table)
}

/// Like `forecast`, also returning the loaded model (history, components).
pub fn load_and_forecast(
    store: &ModelStore,
    product: &str,
    horizon: usize,
) -> Result<(ForecastModel, ForecastTable), AppError> {
    let model = store.load(product)?;
    let table = forecast_model(&model, horizon)?;
    Ok((model, table))
}

/// History dates plus `horizon` future days, predicted with an in-memory model.
pub fn forecast_model(model: &ForecastModel, horizon: usize) -> Result<ForecastTable, AppError> {
    let dates = future_dates(model, horizon)?;
    predict(model, &dates)
}

/// Predict `days` consecutive dates from `start` with the persisted model.
pub fn predict_dates(
    store: &ModelStore,
    product: &str,
    start: NaiveDate,
    days: usize,
) -> Result<ForecastTable, AppError> {
    if days == 0 {
        return Err(AppError::usage("Day count must be > 0."));
    }
    let model = store.load(product)?;
    predict(&model, &date_range(start, days)?)
}

/// Files written by `plot_analysis`.
#[derive(Debug, Clone, Default)]
pub struct PlotOutput {
    pub history_chart: PathBuf,
    pub product_charts: Vec<PathBuf>,
}

/// Historical overview for every product plus, per product, a detailed
/// forecast chart and a components chart from the persisted model.
pub fn plot_analysis(
    dataset: &SalesDataset,
    store: &ModelStore,
    output_dir: &Path,
) -> Result<PlotOutput, AppError> {
    let products = dataset.products();
    if products.is_empty() {
        return Err(AppError::data("Sales data has no rows."));
    }

    let series: Vec<(String, Vec<HistoryPoint>)> = products
        .iter()
        .map(|p| {
            let points = dataset
                .product_slice(p)
                .records
                .iter()
                .map(|r| HistoryPoint { ds: r.date, y: r.quantity })
                .collect();
            (p.clone(), points)
        })
        .collect();

    let history_chart = output_dir.join("historical_sales.svg");
    crate::plot::write_history_chart(&history_chart, &series)?;

    let mut product_charts = Vec::with_capacity(products.len() * 2);
    for product in &products {
        let (model, table) = load_and_forecast(store, product, DEFAULT_HORIZON_DAYS)?;
        let detailed = output_file(output_dir, product, "detailed_prediction.svg")?;
        crate::plot::write_prediction_chart(
            &detailed,
            &format!("Detailed Sales Forecast for {product}"),
            &model.history,
            &table,
        )?;

        let long = forecast_model(&model, SEASONALITY_HORIZON_DAYS)?;
        let components = output_file(output_dir, product, "seasonality.svg")?;
        crate::plot::write_components_chart(
            &components,
            &format!("Forecast Components for {product}"),
            &model,
            &long,
        )?;

        info!(product, detailed = %detailed.display(), components = %components.display(), "plotted");
        product_charts.push(detailed);
        product_charts.push(components);
    }

    Ok(PlotOutput {
        history_chart,
        product_charts,
    })
}

/// `<output_dir>/<product lowercased>_<suffix>`.
pub fn output_file(output_dir: &Path, product: &str, suffix: &str) -> Result<PathBuf, AppError> {
    Ok(output_dir.join(format!("{}_{suffix}", product_key(product)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SalesRecord;

    fn dataset(products: &[&str], days: u64) -> SalesDataset {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut records = Vec::new();
        for i in 0..days {
            for (j, p) in products.iter().enumerate() {
                records.push(SalesRecord {
                    date: start + chrono::Days::new(i),
                    product: p.to_string(),
                    quantity: 10.0 + j as f64 + (i % 7) as f64,
                });
            }
        }
        SalesDataset::new(records)
    }

    #[test]
    fn output_file_is_case_folded() {
        let path = output_file(Path::new("out"), "Cough Syrup", "prediction.svg").unwrap();
        assert_eq!(path, Path::new("out").join("cough syrup_prediction.svg"));
    }

    #[test]
    fn train_all_keeps_first_appearance_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"));
        let ds = dataset(&["Zinc", "Aspirin"], 40);

        let seq = train_all(&ds, &store, &dir.path().join("output"), false).unwrap();
        let par = train_all(&ds, &store, &dir.path().join("output"), true).unwrap();
        let names = |v: &[TrainOutput]| v.iter().map(|o| o.model.product.clone()).collect::<Vec<_>>();
        assert_eq!(names(&seq), vec!["Zinc", "Aspirin"]);
        assert_eq!(names(&seq), names(&par));
        assert!(seq.iter().all(|o| o.chart_path.is_file() && o.model_path.is_file()));
    }

    #[test]
    fn case_folded_duplicates_train_in_order_even_when_parallel() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"));
        let ds = dataset(&["Para", "Zinc", "PARA"], 30);
        assert!(has_shared_keys(&ds.products()));
        assert!(!has_shared_keys(&["Para".to_string(), "Zinc".to_string()]));

        let outputs = train_all(&ds, &store, &dir.path().join("output"), true).unwrap();
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[0].model_path, outputs[2].model_path);
        assert_eq!(store.load("para").unwrap().product, "PARA");
    }

    #[test]
    fn predict_dates_covers_requested_days() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        train("A", &dataset(&["A"], 30), &store, dir.path()).unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let table = predict_dates(&store, "a", start, 7).unwrap();
        assert_eq!(table.len(), 7);
        assert_eq!(table.rows[0].ds, start);
        assert!(predict_dates(&store, "A", start, 0).is_err());
    }

    #[test]
    fn plot_analysis_writes_every_chart() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"));
        let out = dir.path().join("output");
        let ds = dataset(&["A", "B"], 30);
        train_all(&ds, &store, &out, false).unwrap();

        let plots = plot_analysis(&ds, &store, &out).unwrap();
        assert!(plots.history_chart.is_file());
        assert_eq!(plots.product_charts.len(), 4);
        assert!(out.join("b_seasonality.svg").is_file());
        assert!(out.join("a_detailed_prediction.svg").is_file());
    }

    #[test]
    fn plot_analysis_needs_trained_models() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"));
        let err = plot_analysis(&dataset(&["A"], 10), &store, dir.path()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
