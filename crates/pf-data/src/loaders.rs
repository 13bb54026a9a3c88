use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use pf_types::{DataError, Dataset, PfResult, RawDataLoader, RetrievalOperation, RetrievalParameters};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Names of the identifier columns in a long-format population CSV.
/// Every other column is read as a numeric metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvLayout {
    pub year_column: String,
    pub state_column: String,
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            year_column: "YEAR".to_string(),
            state_column: "STATE_NAME".to_string(),
        }
    }
}

/// One parsed CSV record.
#[derive(Debug, Clone)]
struct Observation {
    year: i64,
    state: String,
    values: Vec<f64>,
}

/// Parsed long-format table.
#[derive(Debug, Clone)]
struct LongTable {
    metrics: Vec<String>,
    observations: Vec<Observation>,
}

impl LongTable {
    fn states(&self) -> BTreeSet<&str> {
        self.observations.iter().map(|o| o.state.as_str()).collect()
    }
}

/// Raw data loader backed by a long-format CSV file
/// (`YEAR, STATE_NAME, metric_1, metric_2, ...`).
///
/// The file is read on every fetch; wrap the loader in a
/// [`CachedLoader`](crate::CachedLoader) to avoid repeated reads.
#[derive(Debug, Clone)]
pub struct CsvPopulationLoader {
    path: PathBuf,
    layout: CsvLayout,
    sample_seed: u64,
}

impl CsvPopulationLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: CsvLayout::default(),
            sample_seed: 0,
        }
    }

    pub fn with_layout(mut self, layout: CsvLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Seed for `random_sample_n_states` draws.
    pub fn with_sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = seed;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every state present in the file, sorted.
    pub fn available_states(&self) -> PfResult<Vec<String>> {
        let table = self.read_table()?;
        Ok(table.states().into_iter().map(str::to_string).collect())
    }

    fn read_table(&self) -> PfResult<LongTable> {
        use csv::ReaderBuilder;

        let path = self.path.as_path();
        tracing::debug!("Loading population CSV from: {}", path.display());

        if !path.exists() {
            return Err(DataError::SourceNotFound(path.display().to_string()).into());
        }

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to open CSV file {}: {}", path.display(), e),
            })?;

        let headers = rdr
            .headers()
            .map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to read CSV headers: {}", e),
            })?
            .clone();

        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| DataError::InvalidFormat {
                    message: format!("missing column {name} in {}", path.display()),
                })
        };
        let year_idx = find(&self.layout.year_column)?;
        let state_idx = find(&self.layout.state_column)?;
        let metric_idx: Vec<usize> = (0..headers.len())
            .filter(|i| *i != year_idx && *i != state_idx)
            .collect();
        let metrics: Vec<String> = metric_idx.iter().map(|i| headers[*i].to_string()).collect();

        let mut observations = Vec::new();
        for (line_num, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to read CSV record at line {}: {}", line_num + 2, e),
            })?;

            match parse_record(&record, year_idx, state_idx, &metric_idx) {
                Ok(observation) => observations.push(observation),
                Err(e) => {
                    tracing::warn!("Skipping invalid record at line {}: {}", line_num + 2, e);
                    continue;
                }
            }
        }

        tracing::debug!(
            "Loaded {} observations of {} metrics",
            observations.len(),
            metrics.len()
        );
        Ok(LongTable {
            metrics,
            observations,
        })
    }

    fn averaged_across_states(&self, table: &LongTable) -> PfResult<Dataset> {
        let width = table.metrics.len();
        let mut sums: BTreeMap<i64, (Vec<f64>, usize)> = BTreeMap::new();
        for obs in &table.observations {
            let entry = sums.entry(obs.year).or_insert_with(|| (vec![0.0; width], 0));
            for (acc, v) in entry.0.iter_mut().zip(&obs.values) {
                *acc += v;
            }
            entry.1 += 1;
        }

        let index: Vec<i64> = sums.keys().copied().collect();
        let values: Vec<Vec<f64>> = (0..width)
            .map(|m| sums.values().map(|(s, n)| s[m] / *n as f64).collect())
            .collect();
        Dataset::new(index, table.metrics.clone(), values)
    }

    fn full_database(&self, table: &LongTable, params: &RetrievalParameters) -> PfResult<Dataset> {
        let available = table.states();
        let selected: Vec<String> = if let Some(states) = &params.specific_states {
            for state in states {
                if !available.contains(state.as_str()) {
                    return Err(DataError::UnknownState {
                        state: state.clone(),
                    }
                    .into());
                }
            }
            states.clone()
        } else if let Some(n) = params.random_sample_n_states {
            if n > available.len() {
                return Err(DataError::InsufficientData {
                    message: format!(
                        "cannot sample {n} states, only {} available",
                        available.len()
                    ),
                }
                .into());
            }
            let pool: Vec<&str> = available.iter().copied().collect();
            let mut rng = ChaCha8Rng::seed_from_u64(self.sample_seed);
            let mut sample: Vec<String> = pool
                .choose_multiple(&mut rng, n)
                .map(|s| s.to_string())
                .collect();
            sample.sort();
            tracing::debug!("Sampled states: {:?}", sample);
            sample
        } else {
            available.iter().map(|s| s.to_string()).collect()
        };

        if selected.len() == 1 {
            return single_state(table, &selected[0]);
        }
        pivot_states(table, &selected)
    }
}

impl RawDataLoader for CsvPopulationLoader {
    fn fetch(
        &self,
        operation: RetrievalOperation,
        parameters: &RetrievalParameters,
    ) -> PfResult<Dataset> {
        let table = self.read_table()?;
        let data = match operation {
            RetrievalOperation::AveragedAcrossStates => self.averaged_across_states(&table)?,
            RetrievalOperation::FullDatabase => self.full_database(&table, parameters)?,
        };
        tracing::info!(
            operation = %operation,
            rows = data.rows(),
            columns = data.width(),
            "Fetched raw dataset"
        );
        Ok(data)
    }
}

fn parse_record(
    record: &csv::StringRecord,
    year_idx: usize,
    state_idx: usize,
    metric_idx: &[usize],
) -> PfResult<Observation> {
    let field = |i: usize| {
        record.get(i).ok_or_else(|| DataError::ParseError {
            message: format!("missing field {i}"),
        })
    };

    let year_raw = field(year_idx)?;
    let year = year_raw
        .parse::<i64>()
        .or_else(|_| year_raw.parse::<f64>().map(|y| y as i64))
        .map_err(|e| DataError::ParseError {
            message: format!("invalid year '{year_raw}': {e}"),
        })?;
    let state = field(state_idx)?.to_string();

    let mut values = Vec::with_capacity(metric_idx.len());
    for i in metric_idx {
        let raw = field(*i)?;
        let value = raw.parse::<f64>().map_err(|e| DataError::ParseError {
            message: format!("invalid value '{raw}': {e}"),
        })?;
        values.push(value);
    }

    Ok(Observation {
        year,
        state,
        values,
    })
}

fn single_state(table: &LongTable, state: &str) -> PfResult<Dataset> {
    let mut rows: Vec<&Observation> = table
        .observations
        .iter()
        .filter(|o| o.state == state)
        .collect();
    rows.sort_by_key(|o| o.year);
    rows.dedup_by_key(|o| o.year);

    let index = rows.iter().map(|o| o.year).collect();
    let values = (0..table.metrics.len())
        .map(|m| rows.iter().map(|o| o.values[m]).collect())
        .collect();
    Dataset::new(index, table.metrics.clone(), values)
}

/// Wide table with one `"{state}/{metric}"` column per pair, over the years
/// every selected state reports.
fn pivot_states(table: &LongTable, states: &[String]) -> PfResult<Dataset> {
    let mut by_state: BTreeMap<&str, BTreeMap<i64, &Observation>> = BTreeMap::new();
    for obs in &table.observations {
        if states.iter().any(|s| *s == obs.state) {
            by_state
                .entry(obs.state.as_str())
                .or_default()
                .entry(obs.year)
                .or_insert(obs);
        }
    }

    let mut years: Option<BTreeSet<i64>> = None;
    for state in states {
        let state_years: BTreeSet<i64> = by_state
            .get(state.as_str())
            .map(|rows| rows.keys().copied().collect())
            .unwrap_or_default();
        years = Some(match years {
            None => state_years,
            Some(acc) => acc.intersection(&state_years).copied().collect(),
        });
    }
    let index: Vec<i64> = years.unwrap_or_default().into_iter().collect();
    if index.is_empty() {
        return Err(DataError::InsufficientData {
            message: format!("no year is reported by all of {states:?}"),
        }
        .into());
    }

    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (m, metric) in table.metrics.iter().enumerate() {
        for state in states {
            let rows = &by_state[state.as_str()];
            columns.push(format!("{state}/{metric}"));
            values.push(index.iter().map(|y| rows[y].values[m]).collect());
        }
    }
    Dataset::new(index, columns, values)
}
