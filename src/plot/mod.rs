//! Chart rendering.
//!
//! - terminal ASCII chart for `sf forecast` (`ascii`)
//! - SVG files for training diagnostics and the plot command (`chart`)

pub mod ascii;
pub mod chart;

pub use ascii::*;
pub use chart::*;
