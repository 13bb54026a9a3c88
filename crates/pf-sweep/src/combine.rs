//! One-parameter-at-a-time combination of several parameters.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use pf_types::{PfResult, SweepError};

use crate::expand::{expand, ExpandedParameter};
use crate::spec::ParameterChoice;
use crate::value::ParamValue;

/// A name-keyed row. Iteration order is the canonical column order.
pub type SweepRow = BTreeMap<String, ParamValue>;

/// Deduplicated rows produced by [`combine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepTable {
    /// Parameter names, sorted.
    pub columns: Vec<String>,
    pub rows: Vec<SweepRow>,
}

impl SweepTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&ParamValue>> {
        if !self.columns.iter().any(|c| c == name) {
            return None;
        }
        Some(self.rows.iter().filter_map(|row| row.get(name)).collect())
    }
}

/// Build the union of one-at-a-time sweeps over `choices`.
///
/// Each parameter takes a turn as the ablated one: it runs through its
/// ablation values while every other parameter runs through its held values.
/// Within a round the ablated parameter varies fastest and the others follow
/// declaration order. Rounds are concatenated in declaration order and
/// duplicate rows are dropped, keeping the first.
pub fn combine(choices: &[ParameterChoice]) -> PfResult<SweepTable> {
    let mut seen_names = HashSet::new();
    for choice in choices {
        if !seen_names.insert(choice.parameter_name.as_str()) {
            return Err(SweepError::DuplicateParameter {
                parameter: choice.parameter_name.clone(),
            }
            .into());
        }
    }

    let expanded = choices
        .iter()
        .map(|choice| {
            expand(&choice.parameter_value).map_err(|reason| SweepError::InvalidSweepSpec {
                parameter: choice.parameter_name.clone(),
                reason,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns: Vec<String> = choices.iter().map(|c| c.parameter_name.clone()).collect();
    columns.sort();

    if choices.is_empty() {
        return Ok(SweepTable {
            columns,
            rows: vec![SweepRow::new()],
        });
    }

    let mut rows = Vec::new();
    let mut seen_rows = HashSet::new();
    let mut generated = 0usize;

    for ablated in 0..choices.len() {
        let mut axes: Vec<(&str, &[ParamValue])> = choices
            .iter()
            .zip(&expanded)
            .enumerate()
            .filter(|(j, _)| *j != ablated)
            .map(|(_, (choice, values))| (choice.parameter_name.as_str(), values.held_values.as_slice()))
            .collect();
        axes.push((
            choices[ablated].parameter_name.as_str(),
            expanded[ablated].ablation_values.as_slice(),
        ));

        for row in cartesian(&axes) {
            generated += 1;
            let key = serde_json::to_string(&row)?;
            if seen_rows.insert(key) {
                rows.push(row);
            }
        }
    }

    debug!(
        parameters = choices.len(),
        generated,
        unique = rows.len(),
        "Combined parameter sweep"
    );

    Ok(SweepTable { columns, rows })
}

/// Upper bound on the number of rows before deduplication:
/// `sum_i |ablation_i| * prod_{j != i} |held_j|`.
pub fn row_count_bound(expanded: &[ExpandedParameter]) -> usize {
    if expanded.is_empty() {
        return 1;
    }
    (0..expanded.len())
        .map(|i| {
            expanded
                .iter()
                .enumerate()
                .map(|(j, e)| {
                    if i == j {
                        e.ablation_values.len()
                    } else {
                        e.held_values.len()
                    }
                })
                .product::<usize>()
        })
        .sum()
}

/// Cartesian product with the last axis varying fastest.
fn cartesian(axes: &[(&str, &[ParamValue])]) -> Vec<SweepRow> {
    let mut rows = vec![SweepRow::new()];
    for (name, values) in axes {
        let mut next = Vec::with_capacity(rows.len() * values.len());
        for row in &rows {
            for value in values.iter() {
                let mut extended = row.clone();
                extended.insert((*name).to_string(), value.clone());
                next.push(extended);
            }
        }
        rows = next;
    }
    rows
}
