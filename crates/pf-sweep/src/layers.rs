//! Binds each layer's operation enum to its configuration record.

use pf_types::{
    DataTransformationOptions, EvaluationConfig, EvaluationOperation, Layer, ModelConfig,
    ModelOperation, PfResult, RetrievalOperation, RetrievalParameters, TransformationOperation,
    VarHyperparameters, VarmaxHyperparameters,
};

use crate::combine::SweepRow;
use crate::materialize::materialize_row;
use crate::suite::LayerOperation;

impl LayerOperation for RetrievalOperation {
    type Config = RetrievalParameters;
    const LAYER: Layer = Layer::Retrieval;

    fn materialize_row(&self, row: &SweepRow) -> PfResult<Self::Config> {
        materialize_row(self.as_str(), row)
    }
}

impl LayerOperation for TransformationOperation {
    type Config = DataTransformationOptions;
    const LAYER: Layer = Layer::Transformation;

    fn materialize_row(&self, row: &SweepRow) -> PfResult<Self::Config> {
        materialize_row(self.as_str(), row)
    }
}

impl LayerOperation for ModelOperation {
    type Config = ModelConfig;
    const LAYER: Layer = Layer::Model;

    fn materialize_row(&self, row: &SweepRow) -> PfResult<Self::Config> {
        Ok(match self {
            ModelOperation::Var => {
                ModelConfig::Var(materialize_row::<VarHyperparameters>(self.as_str(), row)?)
            }
            ModelOperation::Varmax => {
                ModelConfig::Varmax(materialize_row::<VarmaxHyperparameters>(self.as_str(), row)?)
            }
        })
    }
}

impl LayerOperation for EvaluationOperation {
    type Config = EvaluationConfig;
    const LAYER: Layer = Layer::Evaluation;

    fn materialize_row(&self, row: &SweepRow) -> PfResult<Self::Config> {
        materialize_row(self.as_str(), row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ParamValue;
    use pf_types::{PfError, SweepError, Trend};

    fn row(entries: &[(&str, ParamValue)]) -> SweepRow {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn model_operation_selects_record_type() {
        let var = ModelOperation::Var
            .materialize_row(&row(&[("p", ParamValue::Int(2))]))
            .unwrap();
        assert_eq!(var, ModelConfig::Var(VarHyperparameters { p: 2 }));

        let varmax = ModelOperation::Varmax
            .materialize_row(&row(&[
                ("p", ParamValue::Int(2)),
                ("q", ParamValue::Int(1)),
                ("trend", ParamValue::from("c")),
            ]))
            .unwrap();
        assert_eq!(
            varmax,
            ModelConfig::Varmax(VarmaxHyperparameters {
                p: 2,
                q: 1,
                trend: Trend::Constant
            })
        );
    }

    #[test]
    fn var_row_does_not_fit_varmax() {
        let err = ModelOperation::Varmax
            .materialize_row(&row(&[("p", ParamValue::Int(2))]))
            .unwrap_err();
        match err {
            PfError::Sweep(SweepError::SchemaMismatch { operation, .. }) => {
                assert_eq!(operation, "varmax")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn transformation_row_needs_every_field() {
        let err = TransformationOperation::DataTransformation
            .materialize_row(&row(&[("log", ParamValue::from("always"))]))
            .unwrap_err();
        assert!(matches!(
            err,
            PfError::Sweep(SweepError::SchemaMismatch { .. })
        ));
    }
}
