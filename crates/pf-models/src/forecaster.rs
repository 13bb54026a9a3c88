use pf_types::{Dataset, Forecaster, ModelConfig, ModelError, PfResult};

use crate::var::VarModel;
use crate::varmax::VarmaxModel;

/// Fits the configured VAR-family model and forecasts past the training set.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarForecaster;

impl VarForecaster {
    pub fn new() -> Self {
        Self
    }
}

impl Forecaster for VarForecaster {
    fn fit_forecast(
        &self,
        config: &ModelConfig,
        train: &Dataset,
        horizon: usize,
    ) -> PfResult<Dataset> {
        if train.is_empty() {
            return Err(ModelError::InsufficientObservations {
                required: 1,
                available: train.rows(),
            }
            .into());
        }

        let rows = match config {
            ModelConfig::Var(h) => VarModel::fit(&train.values, h.p)?.forecast(horizon)?,
            ModelConfig::Varmax(h) => {
                VarmaxModel::fit(&train.values, h.p, h.q, h.trend)?.forecast(horizon)?
            }
        };

        let last = train.index.last().copied().unwrap_or_default();
        let index = (1..=horizon as i64).map(|h| last + h).collect();
        let values = (0..train.width())
            .map(|c| rows.iter().map(|row| row[c]).collect())
            .collect();

        tracing::debug!(
            model = %config.operation(),
            horizon,
            columns = train.width(),
            "Forecast complete"
        );
        Dataset::new(index, train.columns.clone(), values)
    }
}
