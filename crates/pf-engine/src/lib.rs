//! # pf-engine
//!
//! Executes generated sweeps: each [`pf_types::ExperimentRunConfig`] becomes a
//! tracker run that loads data, transforms it, fits a model, forecasts the
//! held-out years and records the evaluation.

pub mod config;
pub mod executor;
pub mod orchestrator;
pub mod tracker;

use std::sync::Arc;

use pf_data::{CachedLoader, CsvPopulationLoader, PopulationTransformer};
use pf_models::{MetricsEvaluator, VarForecaster};

pub use config::{HarnessConfig, DATA_PATH_ENV, EXAMPLE_CONFIG};
pub use executor::{ExperimentExecutor, ERROR_MESSAGE_PARAM, SUCCESSFUL_FIT_METRIC};
pub use orchestrator::{RunOutcome, SweepOptions, SweepOrchestrator, SweepSummary};
pub use tracker::{InMemoryRunTracker, RunId, RunRecord, RunStatus, RunTracker};

/// Wire the CSV loader, cache, transformer, forecaster and evaluator
/// selected by `config` to `tracker`.
pub fn build_executor(config: &HarnessConfig, tracker: Arc<dyn RunTracker>) -> ExperimentExecutor {
    let csv = CsvPopulationLoader::new(config.data.csv_path.clone())
        .with_layout(config.data.layout())
        .with_sample_seed(config.data.sample_seed);
    let loader = CachedLoader::with_capacity(Arc::new(csv), config.data.cache_capacity);
    ExperimentExecutor::new(
        Arc::new(loader),
        Arc::new(PopulationTransformer::new(config.transform.jitter_seed)),
        Arc::new(VarForecaster::new()),
        Arc::new(MetricsEvaluator::new()),
        tracker,
    )
}
