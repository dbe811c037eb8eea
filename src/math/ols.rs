//! Penalized least squares solver.
//!
//! The sales model is linear in its coefficients, so fitting reduces to
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2 + Σ_j λ_j β_j^2
//! ```
//!
//! Implementation choices:
//! - The ridge term is expressed as extra rows `sqrt(λ_j) e_j` with target 0,
//!   then the stacked system is solved as an ordinary least squares problem.
//! - SVD is used so tall and rank-deficient designs (e.g. daily seasonality on
//!   daily data, where the cosine terms are constant) still solve.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve a ridge-penalized least squares problem.
///
/// `penalties[j]` is `λ_j` for column `j` (0 leaves the column unpenalized).
pub fn solve_ridge(x: &DMatrix<f64>, y: &DVector<f64>, penalties: &[f64]) -> Option<DVector<f64>> {
    let n = x.nrows();
    let p = x.ncols();
    if penalties.len() != p || y.len() != n {
        return None;
    }

    let mut xa = DMatrix::<f64>::zeros(n + p, p);
    let mut ya = DVector::<f64>::zeros(n + p);
    xa.view_mut((0, 0), (n, p)).copy_from(x);
    ya.rows_mut(0, n).copy_from(y);
    for (j, &lambda) in penalties.iter().enumerate() {
        if !(lambda.is_finite() && lambda >= 0.0) {
            return None;
        }
        xa[(n + j, j)] = lambda.sqrt();
    }

    solve_least_squares(&xa, &ya)
}
