//! Input/output helpers.
//!
//! - sales CSV ingest + validation (`ingest`)
//! - per-product model artifacts (`store`)
//! - forecast CSV export (`export`)

pub mod export;
pub mod ingest;
pub mod store;

pub use export::*;
pub use ingest::*;
pub use store::*;
