//! Parameter decision suites: a named sweep over one operation's config.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use tracing::debug;

use pf_types::{Layer, PfResult};

use crate::combine::{combine, SweepRow, SweepTable};
use crate::spec::{ParameterChoice, SweepSpec};

/// An operation at one pipeline layer, together with the typed config it
/// consumes.
pub trait LayerOperation:
    Copy + Debug + Display + PartialEq + Serialize + DeserializeOwned + Send + Sync
{
    type Config: Clone + Debug + PartialEq + Serialize + Send + Sync;

    const LAYER: Layer;

    /// Build this operation's config from a name-keyed row.
    fn materialize_row(&self, row: &SweepRow) -> PfResult<Self::Config>;
}

/// A labelled sweep declaration for a single operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(bound(deserialize = "O: LayerOperation"))]
pub struct ParameterDecisionSuite<O> {
    #[serde(rename = "operation_name")]
    pub operation: O,
    #[serde(rename = "parameter_suite_name")]
    pub suite_label: String,
    pub parameter_choices: Vec<ParameterChoice>,
}

impl<O: LayerOperation> ParameterDecisionSuite<O> {
    pub fn new(operation: O, suite_label: impl Into<String>) -> Self {
        Self {
            operation,
            suite_label: suite_label.into(),
            parameter_choices: Vec::new(),
        }
    }

    pub fn with_choice(mut self, parameter_name: impl Into<String>, spec: SweepSpec) -> Self {
        self.parameter_choices
            .push(ParameterChoice::new(parameter_name, spec));
        self
    }

    /// The deduplicated parameter table for this suite.
    pub fn generate_table(&self) -> PfResult<SweepTable> {
        combine(&self.parameter_choices)
    }

    /// Typed configs for every row of `table`, in row order.
    pub fn materialize(&self, table: &SweepTable) -> PfResult<Vec<O::Config>> {
        table
            .rows
            .iter()
            .map(|row| self.operation.materialize_row(row))
            .collect()
    }

    /// Expand and materialize the suite.
    pub fn generate(&self) -> PfResult<Vec<LayerChoice<O>>> {
        let table = self.generate_table()?;
        let configs = self.materialize(&table)?;
        debug!(
            layer = %O::LAYER,
            operation = %self.operation,
            suite = %self.suite_label,
            configs = configs.len(),
            "Generated suite"
        );
        Ok(configs
            .into_iter()
            .map(|config| LayerChoice {
                operation: self.operation,
                suite_label: self.suite_label.clone(),
                config,
            })
            .collect())
    }
}

/// One concrete `(operation, config)` choice at a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerChoice<O: LayerOperation> {
    pub operation: O,
    pub suite_label: String,
    pub config: O::Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_types::{ModelConfig, ModelOperation, VarHyperparameters};

    fn standard_var() -> ParameterDecisionSuite<ModelOperation> {
        ParameterDecisionSuite::new(ModelOperation::Var, "standard_var")
            .with_choice("p", SweepSpec::int_range(1, 6, 6).with_default(3))
    }

    #[test]
    fn generate_materializes_every_row() {
        let choices = standard_var().generate().unwrap();
        assert_eq!(choices.len(), 6);
        assert!(choices.iter().all(|c| c.operation == ModelOperation::Var));
        assert_eq!(
            choices[0].config,
            ModelConfig::Var(VarHyperparameters { p: 1 })
        );
        assert_eq!(choices[0].suite_label, "standard_var");
    }

    #[test]
    fn generation_is_idempotent() {
        let suite = standard_var();
        let first = suite.generate().unwrap();
        let second = suite.generate().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn suites_read_from_json() {
        let suite: ParameterDecisionSuite<ModelOperation> = serde_json::from_str(
            r#"{
                "operation_name": "var",
                "parameter_suite_name": "standard_var",
                "parameter_choices": [
                    {"parameter_name": "p",
                     "parameter_value": {"type": "int", "min": 1, "max": 6, "samples": 6, "default": 3}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(suite, standard_var());
    }
}
