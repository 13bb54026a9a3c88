//! Forecast error metrics.

use pf_types::{
    Dataset, EvaluationConfig, EvaluationError, EvaluationOutput, Evaluator, Metric, PfResult,
};

/// Mean squared error over paired values.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n as f64
}

/// Mean absolute error over paired values.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n as f64
}

/// Scores every cell of the forecast against the test set.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsEvaluator;

impl MetricsEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Flatten both datasets in the actual set's column order.
    fn paired(actual: &Dataset, forecast: &Dataset) -> PfResult<(Vec<f64>, Vec<f64>)> {
        let mismatch = || EvaluationError::ShapeMismatch {
            actual_rows: actual.rows(),
            actual_cols: actual.width(),
            forecast_rows: forecast.rows(),
            forecast_cols: forecast.width(),
        };
        if actual.rows() != forecast.rows() || actual.width() != forecast.width() {
            return Err(mismatch().into());
        }

        let mut a = Vec::with_capacity(actual.rows() * actual.width());
        let mut p = Vec::with_capacity(a.capacity());
        for (name, column) in actual.columns.iter().zip(&actual.values) {
            let predicted = forecast.column(name).ok_or_else(mismatch)?;
            a.extend_from_slice(column);
            p.extend_from_slice(predicted);
        }
        Ok((a, p))
    }
}

impl Evaluator for MetricsEvaluator {
    fn evaluate(
        &self,
        actual: &Dataset,
        forecast: &Dataset,
        config: &EvaluationConfig,
    ) -> PfResult<EvaluationOutput> {
        if actual.is_empty() {
            return Err(EvaluationError::Empty {
                message: "test set has no rows".to_string(),
            }
            .into());
        }
        let (a, p) = Self::paired(actual, forecast)?;

        let mse = mean_squared_error(&a, &p);
        let output = EvaluationOutput {
            mse: config.wants(Metric::Mse).then_some(mse),
            mae: config
                .wants(Metric::Mae)
                .then(|| mean_absolute_error(&a, &p)),
            rmse: config.wants(Metric::Rmse).then(|| mse.sqrt()),
            failed: false,
            error_message: None,
        };
        tracing::debug!(%output, cells = a.len(), "Evaluated forecast");
        Ok(output)
    }
}
