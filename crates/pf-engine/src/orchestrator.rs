//! Sweep orchestration: runs every configuration of a [`ModelSweepSetup`]
//! that the tracker has not seen yet.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use pf_types::{EvaluationOutput, ExperimentRunConfig, ModelSweepSetup, PfError, PfResult};

use crate::executor::ExperimentExecutor;
use crate::tracker::{RunId, RunStatus};

/// How a sweep is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepOptions {
    /// Worker threads for concurrent runs.
    pub parallelism: usize,
    /// Delete and re-execute runs the tracker already has.
    pub upsert_previous_runs: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            parallelism: 1,
            upsert_previous_runs: false,
        }
    }
}

/// What happened to one configuration of the sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_name: String,
    /// `None` when the run was skipped.
    pub run_id: Option<RunId>,
    pub output: Option<EvaluationOutput>,
}

impl RunOutcome {
    fn skipped_run(run_name: &str) -> Self {
        Self {
            run_name: run_name.to_string(),
            run_id: None,
            output: None,
        }
    }

    pub fn skipped(&self) -> bool {
        self.run_id.is_none()
    }

    pub fn failed(&self) -> bool {
        self.output.as_ref().is_some_and(|o| o.failed)
    }

    pub fn mse(&self) -> Option<f64> {
        self.output
            .as_ref()
            .filter(|o| !o.failed)
            .and_then(|o| o.mse)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub experiment_name: String,
    pub total: usize,
    pub executed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Lowest-MSE successful run.
    pub best: Option<RunOutcome>,
    /// One entry per configuration, in sweep order.
    pub outcomes: Vec<RunOutcome>,
}

impl SweepSummary {
    fn from_outcomes(experiment_name: &str, outcomes: Vec<RunOutcome>) -> Self {
        let skipped = outcomes.iter().filter(|o| o.skipped()).count();
        let failed = outcomes.iter().filter(|o| o.failed()).count();
        let best = outcomes
            .iter()
            .filter(|o| o.mse().is_some_and(f64::is_finite))
            .min_by(|a, b| a.mse().partial_cmp(&b.mse()).unwrap_or(std::cmp::Ordering::Equal))
            .cloned();
        Self {
            experiment_name: experiment_name.to_string(),
            total: outcomes.len(),
            executed: outcomes.len() - skipped,
            skipped,
            failed,
            best,
            outcomes,
        }
    }
}

pub struct SweepOrchestrator {
    executor: Arc<ExperimentExecutor>,
    options: SweepOptions,
}

impl SweepOrchestrator {
    pub fn new(executor: Arc<ExperimentExecutor>, options: SweepOptions) -> Self {
        Self { executor, options }
    }

    pub fn options(&self) -> SweepOptions {
        self.options
    }

    /// Execute the sweep. Individual run failures are part of the summary;
    /// only tracker and thread pool failures abort.
    pub fn run(&self, setup: &ModelSweepSetup) -> PfResult<SweepSummary> {
        info!(
            experiment = %setup.experiment_name,
            runs = setup.len(),
            parallelism = self.options.parallelism,
            upsert = self.options.upsert_previous_runs,
            "Starting sweep"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.parallelism.max(1))
            .build()
            .map_err(|e| PfError::Internal(format!("thread pool: {e}")))?;

        // Identical configurations share a run name; only the first one runs.
        let mut claimed = HashSet::new();
        let mut planned = Vec::with_capacity(setup.len());
        for config in &setup.experiment_run_configs {
            let run_name = config.run_name(&setup.experiment_name)?;
            let first = claimed.insert(run_name.clone());
            if !first {
                debug!(%run_name, "Duplicate configuration in sweep");
            }
            planned.push((run_name, config, first));
        }

        let outcomes: PfResult<Vec<RunOutcome>> = pool.install(|| {
            planned
                .par_iter()
                .map(|(run_name, config, first)| {
                    if *first {
                        self.run_one(&setup.experiment_name, run_name, config)
                    } else {
                        Ok(RunOutcome::skipped_run(run_name))
                    }
                })
                .collect()
        });

        let summary = SweepSummary::from_outcomes(&setup.experiment_name, outcomes?);
        info!(
            experiment = %summary.experiment_name,
            executed = summary.executed,
            skipped = summary.skipped,
            failed = summary.failed,
            best_mse = ?summary.best.as_ref().and_then(RunOutcome::mse),
            "Sweep complete"
        );
        Ok(summary)
    }

    fn run_one(
        &self,
        experiment_name: &str,
        run_name: &str,
        config: &ExperimentRunConfig,
    ) -> PfResult<RunOutcome> {
        let tracker = self.executor.tracker();
        let existing = tracker.find_runs(experiment_name, run_name)?;

        if !existing.is_empty() {
            if !self.options.upsert_previous_runs {
                debug!(%run_name, "Skipping existing run");
                return Ok(RunOutcome::skipped_run(run_name));
            }
            for id in existing {
                tracker.delete_run(id)?;
            }
        }

        let run_id = tracker.start_run(experiment_name, run_name)?;
        let output = self.executor.execute(run_id, config)?;
        let status = if output.failed {
            RunStatus::Failed
        } else {
            RunStatus::Finished
        };
        tracker.finish_run(run_id, status)?;

        Ok(RunOutcome {
            run_name: run_name.to_string(),
            run_id: Some(run_id),
            output: Some(output),
        })
    }
}
