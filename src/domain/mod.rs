//! Domain types (records, models, forecasts, configuration).

pub mod types;

pub use types::*;
