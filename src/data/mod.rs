//! Synthetic input data.

pub mod sample;

pub use sample::{ProductProfile, SampleConfig, default_products, generate_sales};
