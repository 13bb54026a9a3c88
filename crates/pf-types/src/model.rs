use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::OperationSchema;

/// Forecasting model operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOperation {
    Var,
    Varmax,
}

impl ModelOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelOperation::Var => "var",
            ModelOperation::Varmax => "varmax",
        }
    }
}

impl fmt::Display for ModelOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hyperparameters for a VAR(p) model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarHyperparameters {
    /// Lag order.
    pub p: usize,
}

impl Default for VarHyperparameters {
    fn default() -> Self {
        Self { p: 1 }
    }
}

impl OperationSchema for VarHyperparameters {
    const FIELDS: &'static [&'static str] = &["p"];

    fn validate(&self) -> Result<(), String> {
        if self.p == 0 {
            return Err("p must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Deterministic trend terms for VARMAX
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    /// Intercept only.
    #[serde(rename = "c")]
    Constant,
    /// Intercept plus a linear time term.
    #[serde(rename = "trend")]
    Linear,
}

/// Hyperparameters for a VARMAX(p, q) model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarmaxHyperparameters {
    pub p: usize,
    pub q: usize,
    pub trend: Trend,
}

impl Default for VarmaxHyperparameters {
    fn default() -> Self {
        Self {
            p: 1,
            q: 1,
            trend: Trend::Constant,
        }
    }
}

impl OperationSchema for VarmaxHyperparameters {
    const FIELDS: &'static [&'static str] = &["p", "q", "trend"];

    fn validate(&self) -> Result<(), String> {
        if self.p == 0 {
            return Err("p must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Model configuration, one variant per model operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelConfig {
    Var(VarHyperparameters),
    Varmax(VarmaxHyperparameters),
}

impl ModelConfig {
    pub fn operation(&self) -> ModelOperation {
        match self {
            ModelConfig::Var(_) => ModelOperation::Var,
            ModelConfig::Varmax(_) => ModelOperation::Varmax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_config_round_trips_to_the_right_variant() {
        let var: ModelConfig = serde_json::from_str(r#"{"p": 3}"#).unwrap();
        assert_eq!(var, ModelConfig::Var(VarHyperparameters { p: 3 }));

        let varmax: ModelConfig =
            serde_json::from_str(r#"{"p": 2, "q": 1, "trend": "trend"}"#).unwrap();
        assert_eq!(varmax.operation(), ModelOperation::Varmax);
        match varmax {
            ModelConfig::Varmax(h) => assert_eq!(h.trend, Trend::Linear),
            other => panic!("expected varmax, got {other:?}"),
        }
    }

    #[test]
    fn zero_lag_is_invalid() {
        assert!(VarHyperparameters { p: 0 }.validate().is_err());
        assert!(VarmaxHyperparameters {
            p: 0,
            q: 1,
            trend: Trend::Constant
        }
        .validate()
        .is_err());
    }
}
