//! Cross-layer aggregation of suite outputs into runnable configurations.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use pf_types::{
    DataError, EvaluationOperation, ExperimentRunConfig, ModelOperation, ModelSweepSetup,
    PfResult, RetrievalOperation, TransformationOperation,
};

use crate::suite::{LayerChoice, LayerOperation, ParameterDecisionSuite};

/// Every suite of an experiment, grouped by layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteCatalog {
    pub experiment_name: String,
    pub retrieval: Vec<ParameterDecisionSuite<RetrievalOperation>>,
    pub transformation: Vec<ParameterDecisionSuite<TransformationOperation>>,
    pub model: Vec<ParameterDecisionSuite<ModelOperation>>,
    pub evaluation: Vec<ParameterDecisionSuite<EvaluationOperation>>,
}

impl SuiteCatalog {
    pub fn from_json_str(json: &str) -> PfResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> PfResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::SourceNotFound(path.display().to_string()).into());
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> PfResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_experiment_name(mut self, name: impl Into<String>) -> Self {
        self.experiment_name = name.into();
        self
    }
}

/// Generate every suite of a layer and concatenate the results, suite by
/// suite. Identical configs from different suites are kept.
pub fn generate_layer<O: LayerOperation>(
    suites: &[ParameterDecisionSuite<O>],
) -> PfResult<Vec<LayerChoice<O>>> {
    let mut choices = Vec::new();
    for suite in suites {
        choices.extend(suite.generate()?);
    }
    Ok(choices)
}

/// Cartesian product across the four layers, retrieval outermost and
/// evaluation innermost.
pub fn cross_layers(
    retrieval: &[LayerChoice<RetrievalOperation>],
    transformation: &[LayerChoice<TransformationOperation>],
    model: &[LayerChoice<ModelOperation>],
    evaluation: &[LayerChoice<EvaluationOperation>],
) -> Vec<ExperimentRunConfig> {
    let total = retrieval.len() * transformation.len() * model.len() * evaluation.len();
    let mut runs = Vec::with_capacity(total);
    for r in retrieval {
        for t in transformation {
            for m in model {
                for e in evaluation {
                    runs.push(ExperimentRunConfig {
                        raw_data_loader_operation_name: r.operation,
                        raw_data_loader_config: r.config.clone(),
                        data_transformation_operation_name: t.operation,
                        data_transformation_config: t.config.clone(),
                        ml_model_operation_name: m.operation,
                        ml_model_config: m.config.clone(),
                        evaluation_operation_name: e.operation,
                        evaluation_config: e.config.clone(),
                    });
                }
            }
        }
    }
    runs
}

/// Expand a whole catalog into a named sweep.
pub fn aggregate(catalog: &SuiteCatalog) -> PfResult<ModelSweepSetup> {
    let retrieval = generate_layer(&catalog.retrieval)?;
    let transformation = generate_layer(&catalog.transformation)?;
    let model = generate_layer(&catalog.model)?;
    let evaluation = generate_layer(&catalog.evaluation)?;

    let experiment_run_configs = cross_layers(&retrieval, &transformation, &model, &evaluation);

    info!(
        experiment = %catalog.experiment_name,
        retrieval = retrieval.len(),
        transformation = transformation.len(),
        model = model.len(),
        evaluation = evaluation.len(),
        runs = experiment_run_configs.len(),
        "Aggregated experiment sweep"
    );

    Ok(ModelSweepSetup {
        experiment_name: catalog.experiment_name.clone(),
        experiment_run_configs,
    })
}
