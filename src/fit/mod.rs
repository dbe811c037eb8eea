//! Model fitting.
//!
//! Responsibilities:
//!
//! - place trend changepoints
//! - build the design matrix and solve the penalized least squares problem

pub mod changepoints;
pub mod fitter;

pub use changepoints::*;
pub use fitter::*;
