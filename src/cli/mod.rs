//! Command-line parsing for the sales forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/prediction code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_HORIZON_DAYS, Paths};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sf", version, about = "Per-product sales forecasting")]
pub struct Cli {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Filesystem layout, shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct PathArgs {
    /// Sales CSV with `Date`, `Product`, `Quantity` columns.
    #[arg(long, global = true, env = "SF_DATA", default_value = "data/fake_sales_data.csv")]
    pub data: PathBuf,

    /// Directory holding per-product model artifacts.
    #[arg(long, global = true, env = "SF_MODELS_DIR", default_value = "models")]
    pub models_dir: PathBuf,

    /// Directory for charts and exports.
    #[arg(long, global = true, env = "SF_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,
}

impl PathArgs {
    pub fn resolve(&self) -> Paths {
        Paths {
            data: self.data.clone(),
            models: self.models_dir.clone(),
            output: self.output_dir.clone(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit and persist a model per product, writing a prediction chart for each.
    Train(TrainArgs),
    /// Forecast a trained product and print the future rows and an ASCII chart.
    Forecast(ForecastArgs),
    /// Predict the next few days from a date with a trained model.
    Verify(VerifyArgs),
    /// Write the history overview plus detailed and components charts per product.
    Plot,
    /// Write a synthetic sales CSV.
    Generate(GenerateArgs),
    /// Launch the interactive terminal dashboard.
    Dashboard(DashboardArgs),
}

#[derive(Debug, Clone, Args)]
pub struct TrainArgs {
    /// Train only this product (default: every product in the file).
    #[arg(short, long)]
    pub product: Option<String>,

    /// Train products concurrently.
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ForecastArgs {
    /// Product to forecast; prompts with the trained products when omitted.
    #[arg(short, long)]
    pub product: Option<String>,

    /// Days past the last history date.
    #[arg(long, default_value_t = DEFAULT_HORIZON_DAYS)]
    pub horizon: usize,

    /// Export the full forecast table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Clone, Args)]
pub struct VerifyArgs {
    #[arg(short, long, default_value = "Paracetamol")]
    pub product: String,

    /// Number of consecutive days to predict.
    #[arg(long, default_value_t = 7)]
    pub days: usize,

    /// First predicted date (default: today).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<NaiveDate>,
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Where to write the CSV (default: the `--data` path).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// First date of the series.
    #[arg(long, default_value = "2023-01-01", value_name = "YYYY-MM-DD")]
    pub start: NaiveDate,

    /// Number of days per product.
    #[arg(long, default_value_t = 730)]
    pub days: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Clone, Args)]
pub struct DashboardArgs {
    /// Product selected on startup.
    #[arg(short, long)]
    pub product: Option<String>,
}
