//! End-to-end experiment run configurations and their tracker encodings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::PfResult;
use crate::evaluation::{EvaluationConfig, EvaluationOperation};
use crate::model::{ModelConfig, ModelOperation};
use crate::retrieval::{RetrievalOperation, RetrievalParameters};
use crate::transformation::{DataTransformationOptions, TransformationOperation};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Retrieval,
    Transformation,
    Model,
    Evaluation,
}

impl Layer {
    pub const ALL: [Layer; 4] = [
        Layer::Retrieval,
        Layer::Transformation,
        Layer::Model,
        Layer::Evaluation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Retrieval => "raw_data_load_layer",
            Layer::Transformation => "data_transformation_layer",
            Layer::Model => "ml_model_layer",
            Layer::Evaluation => "evaluation_layer",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully specified, executable pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRunConfig {
    pub raw_data_loader_operation_name: RetrievalOperation,
    pub raw_data_loader_config: RetrievalParameters,

    pub data_transformation_operation_name: TransformationOperation,
    pub data_transformation_config: DataTransformationOptions,

    pub ml_model_operation_name: ModelOperation,
    pub ml_model_config: ModelConfig,

    pub evaluation_operation_name: EvaluationOperation,
    pub evaluation_config: EvaluationConfig,
}

impl ExperimentRunConfig {
    /// Flattened `key -> value` parameters. Nested config fields are joined
    /// with `.`; lists are rendered as JSON.
    pub fn dump_to_params(&self) -> PfResult<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        flatten_into(&mut params, "", &serde_json::to_value(self)?);
        Ok(params)
    }

    /// Categorical tags: the operation chosen at each layer.
    pub fn dump_to_tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                "raw_data_loader_operation_name".to_string(),
                self.raw_data_loader_operation_name.to_string(),
            ),
            (
                "data_transformation_operation_name".to_string(),
                self.data_transformation_operation_name.to_string(),
            ),
            (
                "ml_model_operation_name".to_string(),
                self.ml_model_operation_name.to_string(),
            ),
            (
                "evaluation_operation_name".to_string(),
                self.evaluation_operation_name.to_string(),
            ),
        ])
    }

    /// Deterministic content identity: hex SHA-256 of the JSON encoding.
    pub fn dump_to_name(&self) -> PfResult<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Tracker run name within an experiment.
    pub fn run_name(&self, experiment_name: &str) -> PfResult<String> {
        Ok(format!("{experiment_name}-{}", self.dump_to_name()?))
    }
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(out, &path, nested);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}

/// A named, fully expanded sweep ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSweepSetup {
    pub experiment_name: String,
    pub experiment_run_configs: Vec<ExperimentRunConfig>,
}

impl ModelSweepSetup {
    pub fn len(&self) -> usize {
        self.experiment_run_configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiment_run_configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VarHyperparameters;

    fn sample(p: usize) -> ExperimentRunConfig {
        ExperimentRunConfig {
            raw_data_loader_operation_name: RetrievalOperation::FullDatabase,
            raw_data_loader_config: RetrievalParameters::with_states(vec![
                "Utah".into(),
                "Idaho".into(),
            ]),
            data_transformation_operation_name: TransformationOperation::DataTransformation,
            data_transformation_config: DataTransformationOptions::default(),
            ml_model_operation_name: ModelOperation::Var,
            ml_model_config: ModelConfig::Var(VarHyperparameters { p }),
            evaluation_operation_name: EvaluationOperation::EvaluateModel,
            evaluation_config: EvaluationConfig::default(),
        }
    }

    #[test]
    fn name_is_deterministic_and_content_sensitive() {
        let a = sample(3).dump_to_name().unwrap();
        let b = sample(3).dump_to_name().unwrap();
        let c = sample(4).dump_to_name().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn params_are_flattened() {
        let params = sample(2).dump_to_params().unwrap();
        assert_eq!(params["ml_model_config.p"], "2");
        assert_eq!(params["ml_model_operation_name"], "var");
        assert_eq!(
            params["raw_data_loader_config.specific_states"],
            r#"["Utah","Idaho"]"#
        );
        assert_eq!(params["raw_data_loader_config.random_sample_n_states"], "null");
        assert_eq!(params["data_transformation_config.train_test_split"], "0.8");
    }

    #[test]
    fn tags_name_every_layer_operation() {
        let tags = sample(1).dump_to_tags();
        assert_eq!(tags.len(), Layer::ALL.len());
        assert_eq!(tags["raw_data_loader_operation_name"], "full_database");
        assert_eq!(tags["evaluation_operation_name"], "evaluate_model");
    }

    #[test]
    fn run_name_prefixes_experiment() {
        let config = sample(1);
        let name = config.run_name("Simple VAR Model Sweep").unwrap();
        assert!(name.starts_with("Simple VAR Model Sweep-"));
        assert!(name.ends_with(&config.dump_to_name().unwrap()));
    }
}
