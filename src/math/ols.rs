//! Ordinary least squares and goodness-of-fit.
//!
//! The exponential fitter solves a tiny regression problem:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2      with x_i = [1, t_i]
//! ```
//!
//! where `y_i = ln(value_i)` and `t_i` is elapsed days.
//!
//! We solve via SVD rather than the normal equations so that a degenerate
//! design (e.g. all `t_i` equal) is detected instead of producing garbage.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() < x.ncols() || x.nrows() != y.len() {
        return None;
    }

    let svd = x.clone().svd(true, true);

    // A rank-deficient design has a vanishing singular value; the pseudo-inverse
    // would silently pick the minimum-norm solution, which is not a fit.
    let max_sv = svd.singular_values.max();
    let min_sv = svd.singular_values.min();
    if !(max_sv.is_finite() && max_sv > 0.0) || min_sv <= max_sv * 1e-12 {
        return None;
    }

    let beta = svd.solve(y, 1e-12).ok()?;
    if beta.iter().all(|v| v.is_finite()) {
        Some(beta)
    } else {
        None
    }
}

/// Fit `y = a + b·t` and return `(a, b)`.
pub fn fit_line(t: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if t.len() != y.len() || t.len() < 2 {
        return None;
    }
    let mut x = DMatrix::zeros(t.len(), 2);
    for (i, &ti) in t.iter().enumerate() {
        x[(i, 0)] = 1.0;
        x[(i, 1)] = ti;
    }
    let y = DVector::from_row_slice(y);
    let beta = solve_least_squares(&x, &y)?;
    Some((beta[0], beta[1]))
}

/// Coefficient of determination of `fitted` against `observed`.
///
/// A constant `observed` has no variance to explain: R² is 1 when the fit
/// reproduces it exactly and 0 otherwise.
pub fn r_squared(observed: &[f64], fitted: &[f64]) -> f64 {
    let n = observed.len().min(fitted.len());
    if n == 0 {
        return f64::NAN;
    }

    let mean = observed[..n].iter().sum::<f64>() / n as f64;
    let mut ss_tot = 0.0;
    let mut ss_res = 0.0;
    for i in 0..n {
        ss_tot += (observed[i] - mean).powi(2);
        ss_res += (observed[i] - fitted[i]).powi(2);
    }

    let scale = observed[..n].iter().map(|v| v * v).sum::<f64>().max(1.0);
    let eps = 1e-20 * scale;
    if ss_tot <= eps {
        return if ss_res <= eps { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_rejects_degenerate_design() {
        assert!(fit_line(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(fit_line(&[1.0], &[1.0]).is_none());
    }

    #[test]
    fn fit_line_least_squares_on_noisy_points() {
        // Residuals +1, -2, +1 around y = 1 + t.
        let (a, b) = fit_line(&[0.0, 1.0, 2.0], &[2.0, 0.0, 4.0]).unwrap();
        assert!((a - 1.0).abs() < 1e-10, "a={a}");
        assert!((b - 1.0).abs() < 1e-10, "b={b}");
    }

    #[test]
    fn r_squared_perfect_and_partial() {
        let obs = [1.0, 2.0, 3.0];
        assert!((r_squared(&obs, &obs) - 1.0).abs() < 1e-12);

        // Predicting the mean explains nothing.
        let r2 = r_squared(&obs, &[2.0, 2.0, 2.0]);
        assert!(r2.abs() < 1e-12);
    }

    #[test]
    fn r_squared_constant_series() {
        assert_eq!(r_squared(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r_squared(&[5.0, 5.0], &[4.0, 6.0]), 0.0);
    }
}
