//! Collaborator contracts for the stages of one experiment run.

use crate::dataset::Dataset;
use crate::errors::PfResult;
use crate::evaluation::{EvaluationConfig, EvaluationOutput};
use crate::model::ModelConfig;
use crate::retrieval::{RetrievalOperation, RetrievalParameters};
use crate::transformation::{DataTransformationOptions, TrainTestSplit};

/// Fetches a raw dataset for a retrieval operation.
pub trait RawDataLoader: Send + Sync {
    fn fetch(
        &self,
        operation: RetrievalOperation,
        parameters: &RetrievalParameters,
    ) -> PfResult<Dataset>;
}

/// Turns a raw dataset into train/test sets.
pub trait DataTransformer: Send + Sync {
    fn transform(
        &self,
        data: &Dataset,
        options: &DataTransformationOptions,
    ) -> PfResult<TrainTestSplit>;
}

/// Fits a model on training data and forecasts `horizon` steps past it.
pub trait Forecaster: Send + Sync {
    fn fit_forecast(&self, config: &ModelConfig, train: &Dataset, horizon: usize)
        -> PfResult<Dataset>;
}

/// Scores a forecast against the held-out test set.
pub trait Evaluator: Send + Sync {
    fn evaluate(
        &self,
        actual: &Dataset,
        forecast: &Dataset,
        config: &EvaluationConfig,
    ) -> PfResult<EvaluationOutput>;
}
