//! Harness configuration, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use pf_data::{CsvLayout, DEFAULT_CACHE_CAPACITY};
use pf_sweep::{default_catalog, extended_catalog, SuiteCatalog};
use pf_types::{config_error, PfResult};

use crate::orchestrator::SweepOptions;

/// Overrides `[data] csv_path`.
pub const DATA_PATH_ENV: &str = "PF_DATA_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub experiment: ExperimentSection,
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub transform: TransformSection,
    #[serde(default)]
    pub execution: ExecutionSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSection {
    /// JSON suite catalog. The built-in catalog is used when unset.
    #[serde(default)]
    pub suites_file: Option<PathBuf>,
    /// Replaces the catalog's experiment name.
    #[serde(default)]
    pub name: Option<String>,
    /// Use the built-in catalog with VARMAX suites.
    #[serde(default)]
    pub extended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    #[serde(default = "default_year_column")]
    pub year_column: String,
    #[serde(default = "default_state_column")]
    pub state_column: String,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Seed for `random_sample_n_states`.
    #[serde(default)]
    pub sample_seed: u64,
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("data/population.csv")
}

fn default_year_column() -> String {
    CsvLayout::default().year_column
}

fn default_state_column() -> String {
    CsvLayout::default().state_column
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            year_column: default_year_column(),
            state_column: default_state_column(),
            cache_capacity: default_cache_capacity(),
            sample_seed: 0,
        }
    }
}

impl DataSection {
    pub fn layout(&self) -> CsvLayout {
        CsvLayout {
            year_column: self.year_column.clone(),
            state_column: self.state_column.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformSection {
    #[serde(default)]
    pub jitter_seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSection {
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    #[serde(default)]
    pub upsert_previous_runs: bool,
}

fn default_parallelism() -> usize {
    4
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            upsert_previous_runs: false,
        }
    }
}

impl HarnessConfig {
    pub fn from_toml_str(content: &str) -> PfResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| config_error!("invalid TOML: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, then apply the `PF_DATA_PATH` override.
    pub fn from_file(path: &Path) -> PfResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| config_error!("cannot read {}: {e}", path.display()))?;
        let config = Self::from_toml_str(&content)?;
        Ok(config.with_data_path_override(std::env::var_os(DATA_PATH_ENV).map(PathBuf::from)))
    }

    pub fn with_data_path_override(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.data.csv_path = path;
        }
        self
    }

    pub fn validate(&self) -> PfResult<()> {
        if self.execution.parallelism == 0 {
            return Err(config_error!("execution.parallelism must be at least 1"));
        }
        if self.data.cache_capacity == 0 {
            return Err(config_error!("data.cache_capacity must be at least 1"));
        }
        Ok(())
    }

    /// The suite catalog this configuration selects.
    pub fn catalog(&self) -> PfResult<SuiteCatalog> {
        let catalog = match &self.experiment.suites_file {
            Some(path) => SuiteCatalog::from_json_file(path)?,
            None if self.experiment.extended => extended_catalog(),
            None => default_catalog(),
        };
        Ok(match &self.experiment.name {
            Some(name) => catalog.with_experiment_name(name.clone()),
            None => catalog,
        })
    }

    pub fn sweep_options(&self) -> SweepOptions {
        SweepOptions {
            parallelism: self.execution.parallelism,
            upsert_previous_runs: self.execution.upsert_previous_runs,
        }
    }
}

pub const EXAMPLE_CONFIG: &str = r#"# pf-harness configuration file

[experiment]
# JSON suite catalog; the built-in catalog is used when omitted
# suites_file = "suites.json"
# name = "Simple VAR Model Sweep"
extended = false

[data]
# Long-format CSV: one row per (year, state). Can also use PF_DATA_PATH env var.
csv_path = "data/population.csv"
year_column = "YEAR"
state_column = "STATE_NAME"
cache_capacity = 100
sample_seed = 0

[transform]
jitter_seed = 0

[execution]
parallelism = 4
upsert_previous_runs = false
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_config_parses() {
        let config = HarnessConfig::from_toml_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.data.year_column, "YEAR");
        assert_eq!(config.execution.parallelism, 4);
        assert!(!config.experiment.extended);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = HarnessConfig::from_toml_str("").unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.data.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn zero_parallelism_rejected() {
        let err = HarnessConfig::from_toml_str("[execution]\nparallelism = 0\n").unwrap_err();
        assert!(err.to_string().contains("parallelism"));
    }

    #[test]
    fn data_path_override() {
        let config = HarnessConfig::default()
            .with_data_path_override(Some(PathBuf::from("/tmp/other.csv")));
        assert_eq!(config.data.csv_path, PathBuf::from("/tmp/other.csv"));

        let unchanged = HarnessConfig::default().with_data_path_override(None);
        assert_eq!(unchanged.data.csv_path, default_csv_path());
    }

    #[test]
    fn catalog_selection_and_name_override() {
        let mut config = HarnessConfig::default();
        assert_eq!(config.catalog().unwrap().experiment_name, "Simple VAR Model Sweep");

        config.experiment.extended = true;
        config.experiment.name = Some("Nightly".into());
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.experiment_name, "Nightly");
        assert_eq!(catalog.model.len(), 2);
    }
}
