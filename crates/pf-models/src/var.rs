//! Vector autoregression with an intercept, fitted by least squares.

use nalgebra::DMatrix;
use pf_types::{ModelError, PfResult};

use crate::linalg::{least_squares, to_matrix};

/// A fitted VAR(p).
///
/// `coefficients` is `(1 + k * p) x k`: the intercept row followed by the
/// lag-1 block, lag-2 block and so on.
#[derive(Debug, Clone)]
pub struct VarModel {
    pub p: usize,
    pub k: usize,
    pub coefficients: DMatrix<f64>,
    /// In-sample residuals, one row per fitted time step.
    pub residuals: DMatrix<f64>,
    history: Vec<Vec<f64>>,
}

impl VarModel {
    /// Fit on column-major series of equal length.
    pub fn fit(columns: &[Vec<f64>], p: usize) -> PfResult<Self> {
        if p == 0 {
            return Err(ModelError::InvalidHyperparameters {
                message: "p must be at least 1".to_string(),
            }
            .into());
        }
        let y = to_matrix(columns);
        let (t, k) = (y.nrows(), y.ncols());
        // at least one residual degree of freedom; saturates for absurd orders
        let regressors = k.saturating_mul(p).saturating_add(1);
        let required = p.saturating_add(regressors);
        if k == 0 || t <= required {
            return Err(ModelError::InsufficientObservations {
                required,
                available: t,
            }
            .into());
        }

        let x = lagged_design(&y, p, p, |_| vec![1.0]);
        let target = y.rows(p, t - p).into_owned();
        let coefficients = least_squares(&x, &target)?;
        let residuals = &target - &x * &coefficients;

        let history = (t - p..t).map(|r| y.row(r).iter().copied().collect()).collect();
        tracing::debug!(p, k, observations = t, "Fitted VAR");

        Ok(Self {
            p,
            k,
            coefficients,
            residuals,
            history,
        })
    }

    /// One-step prediction given the last `p` rows, oldest first.
    fn step(&self, recent: &[Vec<f64>]) -> Vec<f64> {
        let mut regressors = Vec::with_capacity(1 + self.k * self.p);
        regressors.push(1.0);
        for lag in 1..=self.p {
            regressors.extend_from_slice(&recent[recent.len() - lag]);
        }
        (0..self.k)
            .map(|j| {
                regressors
                    .iter()
                    .enumerate()
                    .map(|(i, x)| x * self.coefficients[(i, j)])
                    .sum()
            })
            .collect()
    }

    /// Iterated forecast of `steps` rows past the end of the training data.
    pub fn forecast(&self, steps: usize) -> PfResult<Vec<Vec<f64>>> {
        let mut window = self.history.clone();
        let mut out = Vec::with_capacity(steps);
        for _ in 0..steps {
            let next = self.step(&window);
            if next.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::NonFinite {
                    message: "VAR forecast diverged".to_string(),
                }
                .into());
            }
            window.remove(0);
            window.push(next.clone());
            out.push(next);
        }
        Ok(out)
    }
}

/// Design matrix for rows `start..y.nrows()`: the deterministic terms from
/// `deterministic(t)` followed by lags `1..=p` of every series.
pub(crate) fn lagged_design<F>(y: &DMatrix<f64>, p: usize, start: usize, deterministic: F) -> DMatrix<f64>
where
    F: Fn(usize) -> Vec<f64>,
{
    let (t, k) = (y.nrows(), y.ncols());
    let rows: Vec<Vec<f64>> = (start..t)
        .map(|row| {
            let mut x = deterministic(row);
            for lag in 1..=p {
                x.extend(y.row(row - lag).iter().copied());
            }
            x
        })
        .collect();
    let width = rows.first().map_or(k * p, Vec::len);
    DMatrix::from_fn(rows.len(), width, |r, c| rows[r][c])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two series following a known VAR(1) with no noise.
    fn simulated(n: usize) -> Vec<Vec<f64>> {
        let mut a = vec![1.0];
        let mut b = vec![-0.5];
        for t in 1..n {
            let (pa, pb) = (a[t - 1], b[t - 1]);
            // break exact collinearity with a small deterministic wobble
            let wobble = ((t * 7) % 5) as f64 * 0.01;
            a.push(0.5 + 0.6 * pa + 0.1 * pb + wobble);
            b.push(-0.2 + 0.2 * pa + 0.3 * pb - wobble);
        }
        vec![a, b]
    }

    #[test]
    fn fits_and_forecasts() {
        let data = simulated(40);
        let model = VarModel::fit(&data, 1).unwrap();
        assert_eq!(model.coefficients.shape(), (3, 2));
        assert_eq!(model.residuals.shape(), (39, 2));

        let forecast = model.forecast(5).unwrap();
        assert_eq!(forecast.len(), 5);
        assert!(forecast.iter().all(|row| row.len() == 2));
    }

    #[test]
    fn recovers_noiseless_ar1() {
        // y_t = 1 + 0.5 y_{t-1}
        let mut y = vec![10.0];
        for t in 1..15 {
            y.push(1.0 + 0.5 * y[t - 1]);
        }
        let model = VarModel::fit(&[y.clone()], 1).unwrap();
        assert!((model.coefficients[(0, 0)] - 1.0).abs() < 1e-6);
        assert!((model.coefficients[(1, 0)] - 0.5).abs() < 1e-6);

        let forecast = model.forecast(2).unwrap();
        let next = 1.0 + 0.5 * y[14];
        assert!((forecast[0][0] - next).abs() < 1e-6);
        assert!((forecast[1][0] - (1.0 + 0.5 * next)).abs() < 1e-6);
    }

    #[test]
    fn forecast_continues_from_last_rows() {
        // constant series: intercept-only fit predicts the same constant
        let data = vec![vec![3.0; 12], (0..12).map(|i| (i % 3) as f64).collect()];
        let model = VarModel::fit(&data, 2).unwrap();
        let forecast = model.forecast(1).unwrap();
        assert!((forecast[0][0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_short_series_and_zero_order() {
        let data = simulated(5);
        assert!(VarModel::fit(&data, 2).is_err());
        assert!(VarModel::fit(&data, 0).is_err());
    }

    #[test]
    fn huge_order_is_insufficient_not_overflow() {
        let err = VarModel::fit(&simulated(30), usize::MAX).unwrap_err();
        assert!(err.to_string().contains("Insufficient observations"));
        assert!(VarModel::fit(&simulated(30), i64::MAX as usize).is_err());
    }
}
