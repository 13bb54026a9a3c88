//! Run tracking: where each experiment run records its parameters, tags and
//! metrics.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use pf_types::{PfError, PfResult};

/// Unique tracker run identifier.
pub type RunId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// Everything the tracker knows about one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: RunId,
    pub experiment_name: String,
    pub run_name: String,
    pub params: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    pub fn new(experiment_name: &str, run_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            experiment_name: experiment_name.to_string(),
            run_name: run_name.to_string(),
            params: BTreeMap::new(),
            tags: BTreeMap::new(),
            metrics: BTreeMap::new(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn mark_finished(&mut self, status: RunStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }
}

/// External experiment tracking service.
pub trait RunTracker: Send + Sync {
    /// Runs in `experiment_name` whose name is exactly `run_name`.
    fn find_runs(&self, experiment_name: &str, run_name: &str) -> PfResult<Vec<RunId>>;

    fn delete_run(&self, id: RunId) -> PfResult<()>;

    fn start_run(&self, experiment_name: &str, run_name: &str) -> PfResult<RunId>;

    fn log_params(&self, id: RunId, params: &BTreeMap<String, String>) -> PfResult<()>;

    fn set_tags(&self, id: RunId, tags: &BTreeMap<String, String>) -> PfResult<()>;

    fn log_metric(&self, id: RunId, key: &str, value: f64) -> PfResult<()>;

    fn finish_run(&self, id: RunId, status: RunStatus) -> PfResult<()>;
}

/// Process-local tracker.
#[derive(Debug, Default)]
pub struct InMemoryRunTracker {
    runs: RwLock<HashMap<RunId, RunRecord>>,
}

impl InMemoryRunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_run(&self, id: RunId) -> Option<RunRecord> {
        self.runs.read().get(&id).cloned()
    }

    /// All runs of an experiment, oldest first.
    pub fn runs(&self, experiment_name: &str) -> Vec<RunRecord> {
        let mut runs: Vec<RunRecord> = self
            .runs
            .read()
            .values()
            .filter(|run| run.experiment_name == experiment_name)
            .cloned()
            .collect();
        runs.sort_by_key(|run| run.started_at);
        runs
    }

    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }

    fn with_run<F>(&self, id: RunId, update: F) -> PfResult<()>
    where
        F: FnOnce(&mut RunRecord),
    {
        let mut runs = self.runs.write();
        let run = runs
            .get_mut(&id)
            .ok_or_else(|| PfError::Tracking(format!("unknown run {id}")))?;
        update(run);
        Ok(())
    }
}

impl RunTracker for InMemoryRunTracker {
    fn find_runs(&self, experiment_name: &str, run_name: &str) -> PfResult<Vec<RunId>> {
        Ok(self
            .runs
            .read()
            .values()
            .filter(|run| run.experiment_name == experiment_name && run.run_name == run_name)
            .map(|run| run.id)
            .collect())
    }

    fn delete_run(&self, id: RunId) -> PfResult<()> {
        self.runs
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PfError::Tracking(format!("unknown run {id}")))
    }

    fn start_run(&self, experiment_name: &str, run_name: &str) -> PfResult<RunId> {
        let record = RunRecord::new(experiment_name, run_name);
        let id = record.id;
        self.runs.write().insert(id, record);
        Ok(id)
    }

    fn log_params(&self, id: RunId, params: &BTreeMap<String, String>) -> PfResult<()> {
        self.with_run(id, |run| {
            run.params
                .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())))
        })
    }

    fn set_tags(&self, id: RunId, tags: &BTreeMap<String, String>) -> PfResult<()> {
        self.with_run(id, |run| {
            run.tags
                .extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())))
        })
    }

    fn log_metric(&self, id: RunId, key: &str, value: f64) -> PfResult<()> {
        self.with_run(id, |run| {
            run.metrics.insert(key.to_string(), value);
        })
    }

    fn finish_run(&self, id: RunId, status: RunStatus) -> PfResult<()> {
        self.with_run(id, |run| run.mark_finished(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_lifecycle() {
        let tracker = InMemoryRunTracker::new();
        let id = tracker.start_run("exp", "exp-abc").unwrap();
        tracker
            .log_params(id, &BTreeMap::from([("p".to_string(), "3".to_string())]))
            .unwrap();
        tracker.log_metric(id, "mse", 0.5).unwrap();
        tracker.finish_run(id, RunStatus::Finished).unwrap();

        let run = tracker.get_run(id).unwrap();
        assert_eq!(run.params["p"], "3");
        assert_eq!(run.metrics["mse"], 0.5);
        assert_eq!(run.status, RunStatus::Finished);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn find_is_scoped_to_experiment_and_exact_name() {
        let tracker = InMemoryRunTracker::new();
        let a = tracker.start_run("exp", "exp-abc").unwrap();
        tracker.start_run("other", "exp-abc").unwrap();
        tracker.start_run("exp", "exp-abcd").unwrap();

        assert_eq!(tracker.find_runs("exp", "exp-abc").unwrap(), vec![a]);
        assert_eq!(tracker.runs("exp").len(), 2);
    }

    #[test]
    fn delete_and_unknown_runs() {
        let tracker = InMemoryRunTracker::new();
        let id = tracker.start_run("exp", "r").unwrap();
        tracker.delete_run(id).unwrap();
        assert!(tracker.is_empty());
        assert!(tracker.delete_run(id).is_err());
        assert!(tracker.log_metric(id, "mse", 1.0).is_err());
    }
}
