//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - dispatches to training, forecasting, plotting or the dashboard
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DashboardArgs, ForecastArgs, GenerateArgs, TrainArgs, VerifyArgs};
use crate::domain::Paths;
use crate::error::AppError;
use crate::io::ModelStore;

pub mod cache;
pub mod pipeline;
pub mod session;

pub use cache::ModelCache;
pub use session::SessionContext;

/// Entry point for the `sf` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine; variables may come from the real environment.
    let _ = dotenvy::dotenv();

    // `sf` and `sf --data x.csv` behave like `sf dashboard ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let paths = cli.paths.resolve();

    let quiet = matches!(cli.command, Command::Dashboard(_));
    init_tracing(if quiet { "warn" } else { "info" });

    match cli.command {
        Command::Train(args) => handle_train(&paths, args),
        Command::Forecast(args) => handle_forecast(&paths, args),
        Command::Verify(args) => handle_verify(&paths, args),
        Command::Plot => handle_plot(&paths),
        Command::Generate(args) => handle_generate(&paths, args),
        Command::Dashboard(args) => handle_dashboard(&paths, args),
    }
}

/// Log to stderr; `RUST_LOG` overrides the crate-level default.
fn init_tracing(level: &str) {
    let default_directive = format!("sales_forecast={level}");
    let filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_train(paths: &Paths, args: TrainArgs) -> Result<(), AppError> {
    let dataset = crate::io::load_sales(&paths.data)?;
    let store = ModelStore::new(&paths.models);
    info!(data = %paths.data.display(), rows = dataset.len(), "loaded sales data");

    let outputs = match &args.product {
        Some(product) => vec![pipeline::train(product, &dataset, &store, &paths.output)?],
        None => pipeline::train_all(&dataset, &store, &paths.output, args.parallel)?,
    };

    for out in &outputs {
        println!(
            "{}",
            crate::report::format_train_summary(&out.model, &out.model_path, &out.chart_path)
        );
    }
    println!("Training and prediction completed! ({} product(s))", outputs.len());
    Ok(())
}

fn handle_forecast(paths: &Paths, args: ForecastArgs) -> Result<(), AppError> {
    let store = ModelStore::new(&paths.models);
    let product = match args.product {
        Some(p) => p,
        None => crate::cli::picker::prompt_for_product(&store.list())?,
    };

    let (model, table) = pipeline::load_and_forecast(&store, &product, args.horizon)?;
    println!("{}", crate::report::format_forecast_summary(&table, &model));

    if !args.no_plot {
        let plot = crate::plot::render_ascii_forecast(&model.history, &table, args.width, args.height);
        println!("{plot}");
    }

    if let Some(path) = &args.export {
        crate::io::write_forecast_csv(path, &table)?;
        println!("Forecast saved to {}", path.display());
    }
    Ok(())
}

fn handle_verify(paths: &Paths, args: VerifyArgs) -> Result<(), AppError> {
    let store = ModelStore::new(&paths.models);
    let start = args.start.unwrap_or_else(|| chrono::Local::now().date_naive());

    println!("Loading saved model...");
    println!("Making predictions for next {} days...\n", args.days);
    let table = pipeline::predict_dates(&store, &args.product, start, args.days)?;
    print!("{}", crate::report::format_verification(&table));
    Ok(())
}

fn handle_plot(paths: &Paths) -> Result<(), AppError> {
    let dataset = crate::io::load_sales(&paths.data)?;
    let store = ModelStore::new(&paths.models);
    let out = pipeline::plot_analysis(&dataset, &store, &paths.output)?;

    println!("Plot saved to {}", out.history_chart.display());
    for path in &out.product_charts {
        println!("Plot saved to {}", path.display());
    }
    Ok(())
}

fn handle_generate(paths: &Paths, args: GenerateArgs) -> Result<(), AppError> {
    let config = crate::data::SampleConfig {
        start: args.start,
        days: args.days,
        seed: args.seed,
        products: crate::data::default_products(),
    };
    let records = crate::data::generate_sales(&config)?;
    let path = args.output.unwrap_or_else(|| paths.data.clone());
    crate::io::write_sales_csv(&path, &records)?;

    println!(
        "Wrote {} rows ({} products x {} days) to {}",
        records.len(),
        config.products.len(),
        config.days,
        path.display()
    );
    Ok(())
}

fn handle_dashboard(paths: &Paths, args: DashboardArgs) -> Result<(), AppError> {
    crate::tui::run(paths, args.product.as_deref())
}

/// Rewrite argv so `sf` defaults to `sf dashboard`.
///
/// Rules:
/// - `sf`                       -> `sf dashboard`
/// - `sf --data x.csv ...`      -> `sf dashboard --data x.csv ...`
/// - `sf --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dashboard".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "train" | "forecast" | "verify" | "plot" | "generate" | "dashboard"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "dashboard flags".
    if arg1.starts_with('-') {
        argv.insert(1, "dashboard".to_string());
        return argv;
    }

    argv
}
