//! Runs one experiment configuration end to end against a tracker run.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use pf_types::{
    DataTransformer, EvaluationOutput, Evaluator, ExperimentRunConfig, Forecaster, PfResult,
    RawDataLoader,
};

use crate::tracker::{RunId, RunTracker};

pub const SUCCESSFUL_FIT_METRIC: &str = "successful_fit";
pub const ERROR_MESSAGE_PARAM: &str = "error_message";

/// Load → transform → fit/forecast → evaluate, with every step recorded.
pub struct ExperimentExecutor {
    loader: Arc<dyn RawDataLoader>,
    transformer: Arc<dyn DataTransformer>,
    forecaster: Arc<dyn Forecaster>,
    evaluator: Arc<dyn Evaluator>,
    tracker: Arc<dyn RunTracker>,
}

impl ExperimentExecutor {
    pub fn new(
        loader: Arc<dyn RawDataLoader>,
        transformer: Arc<dyn DataTransformer>,
        forecaster: Arc<dyn Forecaster>,
        evaluator: Arc<dyn Evaluator>,
        tracker: Arc<dyn RunTracker>,
    ) -> Self {
        Self {
            loader,
            transformer,
            forecaster,
            evaluator,
            tracker,
        }
    }

    pub fn tracker(&self) -> &Arc<dyn RunTracker> {
        &self.tracker
    }

    /// Execute `config` inside the already started run `run_id`.
    ///
    /// Pipeline failures come back as a failed [`EvaluationOutput`]; only
    /// tracker failures are returned as errors.
    pub fn execute(&self, run_id: RunId, config: &ExperimentRunConfig) -> PfResult<EvaluationOutput> {
        self.tracker.log_params(run_id, &config.dump_to_params()?)?;
        self.tracker.set_tags(run_id, &config.dump_to_tags())?;

        match self.run_pipeline(config) {
            Ok(output) => {
                for (metric, value) in output.metrics() {
                    self.tracker.log_metric(run_id, &metric, value)?;
                }
                self.tracker.log_metric(run_id, SUCCESSFUL_FIT_METRIC, 1.0)?;
                debug!(%run_id, %output, "Run succeeded");
                Ok(output)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(%run_id, error = %message, "Run failed");
                self.tracker.log_metric(run_id, SUCCESSFUL_FIT_METRIC, 0.0)?;
                self.tracker.log_params(
                    run_id,
                    &BTreeMap::from([(ERROR_MESSAGE_PARAM.to_string(), message.clone())]),
                )?;
                Ok(EvaluationOutput::failure(message))
            }
        }
    }

    fn run_pipeline(&self, config: &ExperimentRunConfig) -> PfResult<EvaluationOutput> {
        let raw = self.loader.fetch(
            config.raw_data_loader_operation_name,
            &config.raw_data_loader_config,
        )?;
        let split = self
            .transformer
            .transform(&raw, &config.data_transformation_config)?;
        let forecast = self.forecaster.fit_forecast(
            &config.ml_model_config,
            &split.train,
            split.test.rows(),
        )?;
        self.evaluator
            .evaluate(&split.test, &forecast, &config.evaluation_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::InMemoryRunTracker;
    use pf_types::{
        DataTransformationOptions, Dataset, EvaluationConfig, EvaluationOperation, ModelConfig,
        ModelError, ModelOperation, RestorativeValues, RetrievalOperation, RetrievalParameters,
        TrainTestSplit, TransformationOperation, VarHyperparameters,
    };

    struct FixedLoader;

    impl RawDataLoader for FixedLoader {
        fn fetch(&self, _: RetrievalOperation, _: &RetrievalParameters) -> PfResult<Dataset> {
            Dataset::new(vec![2000, 2001, 2002], vec!["a".into()], vec![vec![1.0, 2.0, 3.0]])
        }
    }

    struct SplitLast;

    impl DataTransformer for SplitLast {
        fn transform(
            &self,
            data: &Dataset,
            _: &DataTransformationOptions,
        ) -> PfResult<TrainTestSplit> {
            let (train, test) = data.split_at(data.rows() - 1);
            Ok(TrainTestSplit {
                train,
                test,
                restorative: RestorativeValues::default(),
            })
        }
    }

    /// Predicts the last training value; fails for p > 5.
    struct Naive;

    impl Forecaster for Naive {
        fn fit_forecast(
            &self,
            config: &ModelConfig,
            train: &Dataset,
            horizon: usize,
        ) -> PfResult<Dataset> {
            if matches!(config, ModelConfig::Var(h) if h.p > 5) {
                return Err(ModelError::InsufficientObservations {
                    required: 10,
                    available: train.rows(),
                }
                .into());
            }
            let last = train.row(train.rows() - 1);
            Dataset::new(
                vec![0; horizon],
                train.columns.clone(),
                last.into_iter().map(|v| vec![v; horizon]).collect(),
            )
        }
    }

    fn config(p: usize) -> ExperimentRunConfig {
        ExperimentRunConfig {
            raw_data_loader_operation_name: RetrievalOperation::AveragedAcrossStates,
            raw_data_loader_config: RetrievalParameters::all_states(),
            data_transformation_operation_name: TransformationOperation::DataTransformation,
            data_transformation_config: DataTransformationOptions::default(),
            ml_model_operation_name: ModelOperation::Var,
            ml_model_config: ModelConfig::Var(VarHyperparameters { p }),
            evaluation_operation_name: EvaluationOperation::EvaluateModel,
            evaluation_config: EvaluationConfig::default(),
        }
    }

    fn executor(tracker: Arc<InMemoryRunTracker>) -> ExperimentExecutor {
        ExperimentExecutor::new(
            Arc::new(FixedLoader),
            Arc::new(SplitLast),
            Arc::new(Naive),
            Arc::new(pf_models::MetricsEvaluator),
            tracker,
        )
    }

    #[test]
    fn successful_run_logs_metrics_params_and_tags() {
        let tracker = Arc::new(InMemoryRunTracker::new());
        let executor = executor(tracker.clone());
        let id = tracker.start_run("exp", "run").unwrap();

        let output = executor.execute(id, &config(1)).unwrap();
        // forecast 2.0 against actual 3.0
        assert_eq!(output.mse, Some(1.0));

        let run = tracker.get_run(id).unwrap();
        assert_eq!(run.metrics[SUCCESSFUL_FIT_METRIC], 1.0);
        assert_eq!(run.metrics["mae"], 1.0);
        assert_eq!(run.params["ml_model_config.p"], "1");
        assert_eq!(run.tags["ml_model_operation_name"], "var");
    }

    #[test]
    fn failed_fit_is_recorded_not_propagated() {
        let tracker = Arc::new(InMemoryRunTracker::new());
        let executor = executor(tracker.clone());
        let id = tracker.start_run("exp", "run").unwrap();

        let output = executor.execute(id, &config(6)).unwrap();
        assert!(output.failed);
        assert!(output.error_message.unwrap().contains("Insufficient observations"));

        let run = tracker.get_run(id).unwrap();
        assert_eq!(run.metrics[SUCCESSFUL_FIT_METRIC], 0.0);
        assert!(run.params.contains_key(ERROR_MESSAGE_PARAM));
        assert!(!run.metrics.contains_key("mse"));
    }

    #[test]
    fn tracker_errors_propagate() {
        let tracker = Arc::new(InMemoryRunTracker::new());
        let executor = executor(tracker);
        assert!(executor.execute(uuid::Uuid::new_v4(), &config(1)).is_err());
    }
}
