//! Built-in experiment suites.

use pf_types::{
    EvaluationOperation, ModelOperation, RetrievalOperation, TransformationOperation,
};

use crate::aggregate::SuiteCatalog;
use crate::spec::SweepSpec;
use crate::suite::ParameterDecisionSuite;
use crate::value::ParamValue;

pub const DEFAULT_EXPERIMENT_NAME: &str = "Simple VAR Model Sweep";

pub fn retrieval_suites() -> Vec<ParameterDecisionSuite<RetrievalOperation>> {
    vec![
        ParameterDecisionSuite::new(
            RetrievalOperation::AveragedAcrossStates,
            "averaged_across_states",
        )
        .with_choice("specific_states", SweepSpec::null_default())
        .with_choice("random_sample_n_states", SweepSpec::null_default()),
        ParameterDecisionSuite::new(RetrievalOperation::FullDatabase, "full_database")
            .with_choice(
                "specific_states",
                SweepSpec::choices(vec![ParamValue::Null, vec!["Utah", "Idaho"].into()])
                    .with_null_default(),
            )
            .with_choice(
                "random_sample_n_states",
                SweepSpec::choices(vec![ParamValue::Null, 1.into(), 2.into()])
                    .with_null_default(),
            ),
    ]
}

fn operation_choice() -> SweepSpec {
    SweepSpec::choices(["always", "never", "conditional"]).with_default("always")
}

pub fn transformation_suites() -> Vec<ParameterDecisionSuite<TransformationOperation>> {
    vec![
        ParameterDecisionSuite::new(TransformationOperation::DataTransformation, "full_sweep")
            .with_choice("z_normalize", operation_choice())
            .with_choice("log", operation_choice())
            .with_choice("difference", operation_choice())
            .with_choice(
                "drop_near_constant_columns",
                SweepSpec::choices(["always", "never"]).with_default("always"),
            )
            .with_choice("train_test_split", SweepSpec::fixed(0.8))
            .with_choice("drop_correlated_columns", SweepSpec::fixed("always"))
            .with_choice("correlation_threshold", SweepSpec::fixed(0.99))
            .with_choice("jitter", SweepSpec::fixed(0.01)),
        ParameterDecisionSuite::new(TransformationOperation::DataTransformation, "best_guess")
            .with_choice("z_normalize", SweepSpec::fixed("always"))
            .with_choice("log", SweepSpec::fixed("always"))
            .with_choice("difference", SweepSpec::fixed("always"))
            .with_choice("drop_near_constant_columns", SweepSpec::fixed("always"))
            .with_choice("train_test_split", SweepSpec::fixed(0.8))
            .with_choice("drop_correlated_columns", SweepSpec::fixed("always"))
            .with_choice("correlation_threshold", SweepSpec::fixed(0.99))
            .with_choice("jitter", SweepSpec::fixed(0.01)),
    ]
}

pub fn standard_var() -> ParameterDecisionSuite<ModelOperation> {
    ParameterDecisionSuite::new(ModelOperation::Var, "standard_var")
        .with_choice("p", SweepSpec::int_range(1, 6, 6).with_default(3))
}

pub fn standard_varmax() -> ParameterDecisionSuite<ModelOperation> {
    ParameterDecisionSuite::new(ModelOperation::Varmax, "standard_varmax")
        .with_choice("p", SweepSpec::int_range(1, 6, 6).with_default(3))
        .with_choice("q", SweepSpec::int_range(1, 6, 6).with_default(3))
        .with_choice(
            "trend",
            SweepSpec::choices(["c", "trend"]).with_default("c"),
        )
}

pub fn evaluation_suites() -> Vec<ParameterDecisionSuite<EvaluationOperation>> {
    vec![
        ParameterDecisionSuite::new(EvaluationOperation::EvaluateModel, "standard_evaluation")
            .with_choice("metrics", SweepSpec::fixed(vec!["mse", "mae"])),
    ]
}

/// The VAR sweep: every retrieval and transformation suite against
/// `standard_var`.
pub fn default_catalog() -> SuiteCatalog {
    SuiteCatalog {
        experiment_name: DEFAULT_EXPERIMENT_NAME.to_string(),
        retrieval: retrieval_suites(),
        transformation: transformation_suites(),
        model: vec![standard_var()],
        evaluation: evaluation_suites(),
    }
}

/// [`default_catalog`] plus the VARMAX suite.
pub fn extended_catalog() -> SuiteCatalog {
    let mut catalog = default_catalog();
    catalog.experiment_name = "VAR and VARMAX Model Sweep".to_string();
    catalog.model.push(standard_varmax());
    catalog
}
