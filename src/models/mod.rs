//! Additive forecasting model: evaluation and forecast tables.
//!
//! Models are evaluated through small, pure functions so that fitting code and
//! presentation code can stay generic.

pub mod forecast;
pub mod model;

pub use forecast::*;
pub use model::*;
