//! Reversible preprocessing of raw population datasets.
//!
//! Per column, in order: optional log, optional first difference, optional
//! z-normalization. Columns are then aligned to a common length, highly
//! correlated columns are dropped, jitter is added and the result is split
//! into train and test sets. The rules applied to each column are recorded
//! so forecasts can be mapped back to the raw scale with
//! [`PopulationTransformer::restore`].

use pf_types::{
    ColumnRules, DataTransformationOptions, DataTransformer, Dataset, OperationChoice, PfResult,
    RestorativeValues, TrainTestSplit, TransformationError,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::stats::{looks_non_stationary, mean, nunique, pearson, sample_std, skewness};

/// Columns whose distinct-value count is at most this share of the row
/// count are treated as near constant.
pub const NEAR_CONSTANT_UNIQUE_RATIO: f64 = 0.5;

/// Minimum number of raw rows the transformer accepts.
pub const MIN_ROWS: usize = 4;

#[derive(Debug, Clone)]
pub struct PopulationTransformer {
    jitter_seed: u64,
}

impl Default for PopulationTransformer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PopulationTransformer {
    pub fn new(jitter_seed: u64) -> Self {
        Self { jitter_seed }
    }

    /// Apply every transform and return the full transformed dataset plus the
    /// rules needed to invert it.
    pub fn normalize(
        &self,
        data: &Dataset,
        options: &DataTransformationOptions,
    ) -> PfResult<(Dataset, RestorativeValues)> {
        if data.rows() < MIN_ROWS {
            return Err(TransformationError::InsufficientData {
                message: format!("need at least {MIN_ROWS} rows, got {}", data.rows()),
            }
            .into());
        }

        let mut restorative = RestorativeValues {
            years: data.index.clone(),
            column_order: data.columns.clone(),
            first_row: data
                .columns
                .iter()
                .cloned()
                .zip(data.row(0))
                .collect(),
            ..RestorativeValues::default()
        };

        // Step 0: near-constant columns
        let mut kept = Vec::new();
        for (name, column) in data.columns.iter().zip(&data.values) {
            let keep = !options.drop_near_constant_columns.enabled()
                || nunique(column) as f64 > data.rows() as f64 * NEAR_CONSTANT_UNIQUE_RATIO;
            if keep {
                kept.push((name.clone(), column.clone()));
            } else {
                restorative.dropped_near_constant.push(name.clone());
            }
        }
        if kept.is_empty() {
            return Err(TransformationError::NoColumnsLeft {
                stage: "dropping near-constant columns".to_string(),
            }
            .into());
        }

        // Steps 1-3: per-column transforms, then align to rows 1..n
        let mut columns = Vec::with_capacity(kept.len());
        let mut values = Vec::with_capacity(kept.len());
        for (name, column) in kept {
            let (series, rules) = transform_column(&name, column, options)?;
            columns.push(name.clone());
            values.push(series);
            restorative.rules.insert(name, rules);
        }
        let index = data.index[1..].to_vec();

        // Step 4: correlated columns
        if options.drop_correlated_columns.enabled() {
            let dropped = correlated_columns(&values, options.correlation_threshold);
            for idx in dropped.iter().rev() {
                restorative.dropped_correlated.insert(0, columns.remove(*idx));
                values.remove(*idx);
            }
        }

        // Step 5: jitter
        if options.jitter > 0.0 {
            let normal = Normal::new(0.0, options.jitter).map_err(|e| {
                TransformationError::InvalidOptions {
                    message: format!("jitter {}: {e}", options.jitter),
                }
            })?;
            let mut rng = ChaCha8Rng::seed_from_u64(self.jitter_seed);
            for column in values.iter_mut() {
                for v in column.iter_mut() {
                    *v += normal.sample(&mut rng);
                }
            }
        }

        restorative.remaining_columns = columns.clone();
        debug!(
            kept = columns.len(),
            near_constant = restorative.dropped_near_constant.len(),
            correlated = restorative.dropped_correlated.len(),
            "Transformed dataset"
        );
        Ok((Dataset::new(index, columns, values)?, restorative))
    }

    /// Map transformed values (e.g. a forecast over the test period) back to
    /// the raw scale.
    ///
    /// Differenced columns are integrated from the level at the row before
    /// `transformed`'s first index.
    pub fn restore(
        &self,
        transformed: &Dataset,
        restorative: &RestorativeValues,
    ) -> PfResult<Dataset> {
        let Some(first_year) = transformed.index.first() else {
            return Ok(transformed.clone());
        };

        let mut values = Vec::with_capacity(transformed.width());
        for (name, column) in transformed.columns.iter().zip(&transformed.values) {
            let restore_err = |message: String| TransformationError::Restore {
                column: name.clone(),
                message,
            };
            let rules = restorative
                .rules
                .get(name)
                .ok_or_else(|| restore_err("no rules recorded".to_string()))?;

            let mut series: Vec<f64> = column.iter().map(|v| v * rules.std + rules.mean).collect();

            if rules.differenced {
                let levels = rules
                    .levels
                    .as_ref()
                    .ok_or_else(|| restore_err("differenced without levels".to_string()))?;
                let position = restorative
                    .years
                    .iter()
                    .position(|y| y == first_year)
                    .filter(|p| *p >= 1)
                    .ok_or_else(|| restore_err(format!("no level before year {first_year}")))?;
                let mut level = levels[position - 1];
                for v in series.iter_mut() {
                    level += *v;
                    *v = level;
                }
            }

            if rules.log {
                let shift = rules.log_shift.unwrap_or(0.0);
                for v in series.iter_mut() {
                    *v = v.exp() - shift;
                }
            }
            values.push(series);
        }

        Dataset::new(
            transformed.index.clone(),
            transformed.columns.clone(),
            values,
        )
    }
}

impl DataTransformer for PopulationTransformer {
    fn transform(
        &self,
        data: &Dataset,
        options: &DataTransformationOptions,
    ) -> PfResult<TrainTestSplit> {
        let (normalized, restorative) = self.normalize(data, options)?;

        let break_point = (normalized.rows() as f64 * options.train_test_split).floor() as usize;
        if break_point == 0 || break_point >= normalized.rows() {
            return Err(TransformationError::InsufficientData {
                message: format!(
                    "split {} of {} rows leaves an empty train or test set",
                    options.train_test_split,
                    normalized.rows()
                ),
            }
            .into());
        }
        let (train, test) = normalized.split_at(break_point);
        Ok(TrainTestSplit {
            train,
            test,
            restorative,
        })
    }
}

/// Log, difference and standardize one column. The result always has one
/// fewer value than the input.
fn transform_column(
    name: &str,
    mut series: Vec<f64>,
    options: &DataTransformationOptions,
) -> PfResult<(Vec<f64>, ColumnRules)> {
    let mut rules = ColumnRules::identity();

    // 1. log
    let apply_log = match options.log {
        OperationChoice::Always => true,
        OperationChoice::Conditional => skewness(&series) > 1.0,
        OperationChoice::Never => false,
    };
    if apply_log {
        rules.log = true;
        if series.iter().any(|v| *v <= 0.0) {
            let min = series.iter().copied().fold(f64::INFINITY, f64::min);
            let shift = min.abs() + 1.0;
            rules.log_shift = Some(shift);
            series.iter_mut().for_each(|v| *v = (*v + shift).ln());
        } else {
            series.iter_mut().for_each(|v| *v = v.ln());
        }
    }

    // 2. difference
    let apply_diff = match options.difference {
        OperationChoice::Always => true,
        OperationChoice::Conditional => looks_non_stationary(&series),
        OperationChoice::Never => false,
    };
    if apply_diff {
        rules.differenced = true;
        let diffs = series.windows(2).map(|w| w[1] - w[0]).collect();
        rules.levels = Some(std::mem::replace(&mut series, diffs));
    }

    // 3. standardize; conditional is treated as never
    if options.z_normalize == OperationChoice::Always {
        let m = mean(&series);
        let sd = sample_std(&series);
        let sd = if sd == 0.0 || !sd.is_finite() { 1.0 } else { sd };
        rules.mean = m;
        rules.std = sd;
        series.iter_mut().for_each(|v| *v = (*v - m) / sd);
    }

    // align with differenced columns
    if !rules.differenced {
        series.remove(0);
    }

    if series.iter().any(|v| !v.is_finite()) {
        return Err(TransformationError::InvalidOptions {
            message: format!("column {name} has non-finite values after transforming"),
        }
        .into());
    }
    Ok((series, rules))
}

/// Indices of columns whose absolute correlation with any earlier column
/// exceeds `threshold`, ascending.
fn correlated_columns(values: &[Vec<f64>], threshold: f64) -> Vec<usize> {
    (1..values.len())
        .filter(|&j| {
            (0..j).any(|i| {
                pearson(&values[i], &values[j]).map_or(false, |r| r.abs() > threshold)
            })
        })
        .collect()
}
