//! Least-squares helpers shared by the VAR-family models.

use nalgebra::DMatrix;
use pf_types::{ModelError, PfResult};

const SVD_EPS: f64 = 1e-12;

/// Stack column-major series into a `rows x columns` matrix.
pub fn to_matrix(columns: &[Vec<f64>]) -> DMatrix<f64> {
    let rows = columns.first().map_or(0, Vec::len);
    DMatrix::from_fn(rows, columns.len(), |r, c| columns[c][r])
}

/// Minimum-norm solution of `x * b = y` by SVD.
pub fn least_squares(x: &DMatrix<f64>, y: &DMatrix<f64>) -> PfResult<DMatrix<f64>> {
    if x.nrows() != y.nrows() {
        return Err(ModelError::SolveFailed {
            message: format!(
                "design has {} rows, target has {}",
                x.nrows(),
                y.nrows()
            ),
        }
        .into());
    }
    let svd = x.clone().svd(true, true);
    let b = svd.solve(y, SVD_EPS).map_err(|e| ModelError::SolveFailed {
        message: e.to_string(),
    })?;
    if b.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite {
            message: "least squares produced non-finite coefficients".to_string(),
        }
        .into());
    }
    Ok(b)
}
