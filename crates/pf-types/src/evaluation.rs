use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::schema::OperationSchema;

/// Evaluation operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationOperation {
    EvaluateModel,
}

impl EvaluationOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationOperation::EvaluateModel => "evaluate_model",
        }
    }
}

impl fmt::Display for EvaluationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error metrics computed between the test set and a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Mse,
    Mae,
    Rmse,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Mse => "mse",
            Metric::Mae => "mae",
            Metric::Rmse => "rmse",
        }
    }
}

/// Parameters for evaluating a forecast
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    pub metrics: Vec<Metric>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            metrics: vec![Metric::Mse, Metric::Mae],
        }
    }
}

impl EvaluationConfig {
    pub fn wants(&self, metric: Metric) -> bool {
        self.metrics.contains(&metric)
    }
}

impl OperationSchema for EvaluationConfig {
    const FIELDS: &'static [&'static str] = &["metrics"];

    fn validate(&self) -> Result<(), String> {
        if self.metrics.is_empty() {
            return Err("at least one metric is required".to_string());
        }
        Ok(())
    }
}

/// Outcome of evaluating one experiment run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationOutput {
    pub mse: Option<f64>,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
    pub failed: bool,
    pub error_message: Option<String>,
}

impl EvaluationOutput {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            failed: true,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Computed metrics keyed by name, for the run tracker.
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        [
            (Metric::Mse, self.mse),
            (Metric::Mae, self.mae),
            (Metric::Rmse, self.rmse),
        ]
        .into_iter()
        .filter_map(|(metric, value)| value.map(|v| (metric.as_str().to_string(), v)))
        .collect()
    }
}

impl fmt::Display for EvaluationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed {
            return write!(
                f,
                "Failed with error: {}",
                self.error_message.as_deref().unwrap_or("unknown")
            );
        }
        let show = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_else(|| "-".into());
        write!(
            f,
            "Mean squared error: {}, Mean absolute error: {}",
            show(self.mse),
            show(self.mae)
        )
    }
}
