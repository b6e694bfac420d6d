//! Ordinary least squares on small design matrices.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{FeeAnalysisError, Result};

/// Coefficients and goodness of fit returned by [`fit_ols`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OlsFit {
    /// Fitted coefficients in design-matrix column order.
    pub coefficients: DVector<f64>,
    /// `1 - SS_res / SS_tot`, or 0 when the target has no variance.
    pub r_squared: f64,
    /// Residual sum of squares.
    pub ss_res: f64,
    /// Number of rows used in the fit.
    pub observations: usize,
}

/// Builds `[1, fee_change, controls...]` with one row per observation.
pub fn design_matrix(fee_change: &DVector<f64>, controls: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let n = fee_change.len();
    if controls.nrows() != n {
        return Err(FeeAnalysisError::dimension_mismatch(
            "control rows",
            n,
            controls.nrows(),
        ));
    }

    let k = controls.ncols();
    Ok(DMatrix::from_fn(n, k + 2, |row, col| match col {
        0 => 1.0,
        1 => fee_change[row],
        _ => controls[(row, col - 2)],
    }))
}

/// Solves `min ||X b - y||` through an SVD, refusing rank-deficient designs.
pub fn fit_ols(design: &DMatrix<f64>, target: &DVector<f64>) -> Result<OlsFit> {
    if design.nrows() != target.len() {
        return Err(FeeAnalysisError::dimension_mismatch(
            "regression target length",
            design.nrows(),
            target.len(),
        ));
    }
    if design.iter().chain(target.iter()).any(|v| !v.is_finite()) {
        return Err(FeeAnalysisError::NumericalError {
            context: "regression inputs",
        });
    }
    if design.nrows() < design.ncols() {
        return Err(FeeAnalysisError::singular("underdetermined design"));
    }

    let svd = design.clone().svd(true, true);
    let largest = svd.singular_values.max();
    // Same cutoff numpy uses for lstsq's default rcond.
    let tolerance = largest * f64::EPSILON * design.nrows().max(design.ncols()) as f64;
    if largest == 0.0 || svd.rank(tolerance) < design.ncols() {
        return Err(FeeAnalysisError::singular("least-squares design"));
    }

    let coefficients = svd
        .solve(target, tolerance)
        .map_err(|_| FeeAnalysisError::singular("least-squares solve"))?;
    if coefficients.iter().any(|c| c.is_nan()) {
        return Err(FeeAnalysisError::NumericalError {
            context: "least-squares solve",
        });
    }

    let residuals = target - design * &coefficients;
    let ss_res = residuals.norm_squared();
    let mean = target.mean();
    let ss_tot = target.iter().map(|y| (y - mean).powi(2)).sum::<f64>();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    Ok(OlsFit {
        coefficients,
        r_squared,
        ss_res,
        observations: design.nrows(),
    })
}
