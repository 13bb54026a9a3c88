use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::dataset::Dataset;
use crate::schema::OperationSchema;

/// Data transformation operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformationOperation {
    DataTransformation,
}

impl TransformationOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformationOperation::DataTransformation => "data_transformation",
        }
    }
}

impl fmt::Display for TransformationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a per-column transform is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationChoice {
    Always,
    Never,
    /// Applied only when a data-dependent test says so.
    Conditional,
}

/// A transform that is either applied or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlwaysOrNever {
    Always,
    Never,
}

impl AlwaysOrNever {
    pub fn enabled(&self) -> bool {
        matches!(self, AlwaysOrNever::Always)
    }
}

/// Options for transforming a raw dataset into train/test sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataTransformationOptions {
    pub z_normalize: OperationChoice,
    pub log: OperationChoice,
    pub difference: OperationChoice,
    pub drop_near_constant_columns: AlwaysOrNever,
    /// Fraction of rows used for training.
    pub train_test_split: f64,
    pub drop_correlated_columns: AlwaysOrNever,
    /// Drop one column of each pair with |corr| above this.
    pub correlation_threshold: f64,
    /// Standard deviation of the Gaussian noise added after transforming.
    pub jitter: f64,
}

impl Default for DataTransformationOptions {
    fn default() -> Self {
        Self {
            z_normalize: OperationChoice::Always,
            log: OperationChoice::Always,
            difference: OperationChoice::Always,
            drop_near_constant_columns: AlwaysOrNever::Always,
            train_test_split: 0.8,
            drop_correlated_columns: AlwaysOrNever::Always,
            correlation_threshold: 0.99,
            jitter: 0.01,
        }
    }
}

impl OperationSchema for DataTransformationOptions {
    const FIELDS: &'static [&'static str] = &[
        "z_normalize",
        "log",
        "difference",
        "drop_near_constant_columns",
        "train_test_split",
        "drop_correlated_columns",
        "correlation_threshold",
        "jitter",
    ];

    fn validate(&self) -> Result<(), String> {
        if !(self.train_test_split > 0.0 && self.train_test_split < 1.0) {
            return Err(format!(
                "train_test_split must be in (0, 1), got {}",
                self.train_test_split
            ));
        }
        if !(self.correlation_threshold > 0.0 && self.correlation_threshold <= 1.0) {
            return Err(format!(
                "correlation_threshold must be in (0, 1], got {}",
                self.correlation_threshold
            ));
        }
        if !(self.jitter >= 0.0 && self.jitter.is_finite()) {
            return Err(format!("jitter must be finite and >= 0, got {}", self.jitter));
        }
        Ok(())
    }
}

/// Per-column record of what the transformer did, enough to undo it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRules {
    pub log: bool,
    /// Added before taking the log when the column had non-positive values.
    pub log_shift: Option<f64>,
    pub differenced: bool,
    /// Post-log, pre-difference levels. Present only when `differenced`.
    pub levels: Option<Vec<f64>>,
    pub mean: f64,
    pub std: f64,
}

impl ColumnRules {
    pub fn identity() -> Self {
        Self {
            log: false,
            log_shift: None,
            differenced: false,
            levels: None,
            mean: 0.0,
            std: 1.0,
        }
    }
}

/// Everything needed to map transformed values back to the raw scale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RestorativeValues {
    pub rules: BTreeMap<String, ColumnRules>,
    /// Time index of the raw dataset.
    pub years: Vec<i64>,
    /// Raw values of the first row, per original column.
    pub first_row: BTreeMap<String, f64>,
    pub column_order: Vec<String>,
    pub dropped_near_constant: Vec<String>,
    pub dropped_correlated: Vec<String>,
    pub remaining_columns: Vec<String>,
}

/// Output of a data transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Dataset,
    pub test: Dataset,
    pub restorative: RestorativeValues,
}
