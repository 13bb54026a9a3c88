//! VARMAX(p, q) without exogenous regressors, estimated by Hannan–Rissanen.
//!
//! Stage one fits a long VAR and keeps its residuals as innovation
//! estimates. Stage two regresses each series on the trend terms, `p` lags of
//! every series and `q` lags of those innovation estimates.

use nalgebra::DMatrix;
use pf_types::{ModelError, PfResult, Trend};

use crate::linalg::{least_squares, to_matrix};
use crate::var::lagged_design;

#[derive(Debug, Clone)]
pub struct VarmaxModel {
    pub p: usize,
    pub q: usize,
    pub k: usize,
    pub trend: Trend,
    /// Rows: trend terms, AR lag blocks `1..=p`, MA lag blocks `1..=q`.
    pub coefficients: DMatrix<f64>,
    pub residuals: DMatrix<f64>,
    y_history: Vec<Vec<f64>>,
    eps_history: Vec<Vec<f64>>,
    /// Time index of the first forecast step, as seen by the trend term.
    next_t: usize,
}

fn trend_terms(trend: Trend, t: usize) -> Vec<f64> {
    match trend {
        Trend::Constant => vec![1.0],
        Trend::Linear => vec![1.0, t as f64],
    }
}

fn trend_width(trend: Trend) -> usize {
    match trend {
        Trend::Constant => 1,
        Trend::Linear => 2,
    }
}

/// Append `q` lags of `eps` to each row of the design for rows `start..`.
fn with_ma_lags(design: DMatrix<f64>, eps: &DMatrix<f64>, q: usize, start: usize) -> DMatrix<f64> {
    let (rows, base) = (design.nrows(), design.ncols());
    let k = eps.ncols();
    DMatrix::from_fn(rows, base + k * q, |r, c| {
        if c < base {
            design[(r, c)]
        } else {
            let lag = (c - base) / k + 1;
            let series = (c - base) % k;
            eps[(start + r - lag, series)]
        }
    })
}

impl VarmaxModel {
    pub fn fit(columns: &[Vec<f64>], p: usize, q: usize, trend: Trend) -> PfResult<Self> {
        if p == 0 {
            return Err(ModelError::InvalidHyperparameters {
                message: "p must be at least 1".to_string(),
            }
            .into());
        }
        let y = to_matrix(columns);
        let (t, k) = (y.nrows(), y.ncols());

        // long AR order for the innovation estimates
        let m = if q == 0 { 0 } else { p.saturating_add(q) };
        let start = m.saturating_add(q.max(p));
        let regressors = k
            .saturating_mul(p.saturating_add(q))
            .saturating_add(trend_width(trend));
        let stage_one = if m > 0 {
            k.saturating_mul(m).saturating_add(m).saturating_add(1)
        } else {
            0
        };
        let required = start.saturating_add(regressors).max(stage_one);
        if k == 0 || t <= required {
            return Err(ModelError::InsufficientObservations {
                required,
                available: t,
            }
            .into());
        }

        let mut eps = DMatrix::<f64>::zeros(t, k);
        if m > 0 {
            let long_x = lagged_design(&y, m, m, |_| vec![1.0]);
            let long_y = y.rows(m, t - m).into_owned();
            let long_b = least_squares(&long_x, &long_y)?;
            let long_resid = &long_y - &long_x * &long_b;
            eps.rows_mut(m, t - m).copy_from(&long_resid);
        }

        let design = lagged_design(&y, p, start, |row| trend_terms(trend, row));
        let x = with_ma_lags(design, &eps, q, start);
        let target = y.rows(start, t - start).into_owned();
        let coefficients = least_squares(&x, &target)?;
        let residuals = &target - &x * &coefficients;

        let y_history = (t - p..t).map(|r| y.row(r).iter().copied().collect()).collect();
        let fitted = residuals.nrows();
        let eps_history = (fitted - q..fitted)
            .map(|r| residuals.row(r).iter().copied().collect())
            .collect();

        tracing::debug!(p, q, k, ?trend, observations = t, "Fitted VARMAX");

        Ok(Self {
            p,
            q,
            k,
            trend,
            coefficients,
            residuals,
            y_history,
            eps_history,
            next_t: t,
        })
    }

    fn step(&self, t: usize, ys: &[Vec<f64>], eps: &[Vec<f64>]) -> Vec<f64> {
        let mut regressors = trend_terms(self.trend, t);
        for lag in 1..=self.p {
            regressors.extend_from_slice(&ys[ys.len() - lag]);
        }
        for lag in 1..=self.q {
            regressors.extend_from_slice(&eps[eps.len() - lag]);
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

    /// Iterated forecast; future innovations are zero.
    pub fn forecast(&self, steps: usize) -> PfResult<Vec<Vec<f64>>> {
        let mut ys = self.y_history.clone();
        let mut eps = self.eps_history.clone();
        let mut out = Vec::with_capacity(steps);
        for h in 0..steps {
            let next = self.step(self.next_t + h, &ys, &eps);
            if next.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::NonFinite {
                    message: "VARMAX forecast diverged".to_string(),
                }
                .into());
            }
            ys.remove(0);
            ys.push(next.clone());
            if self.q > 0 {
                eps.remove(0);
                eps.push(vec![0.0; self.k]);
            }
            out.push(next);
        }
        Ok(out)
    }
}
