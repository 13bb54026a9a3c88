use serde::{Deserialize, Serialize};

use crate::errors::{DataError, PfResult};

/// Rectangular numeric dataset: rows are time steps, columns are named series.
///
/// Values are stored column-major; `values[c][r]` is column `c` at row `r`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Time index (years), one entry per row.
    pub index: Vec<i64>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl Dataset {
    pub fn new(index: Vec<i64>, columns: Vec<String>, values: Vec<Vec<f64>>) -> PfResult<Self> {
        if columns.len() != values.len() {
            return Err(DataError::InvalidFormat {
                message: format!(
                    "{} column names for {} value columns",
                    columns.len(),
                    values.len()
                ),
            }
            .into());
        }
        if let Some((name, column)) = columns
            .iter()
            .zip(&values)
            .find(|(_, column)| column.len() != index.len())
        {
            return Err(DataError::InvalidFormat {
                message: format!(
                    "column {name} has {} rows, index has {}",
                    column.len(),
                    index.len()
                ),
            }
            .into());
        }
        Ok(Self {
            index,
            columns,
            values,
        })
    }

    pub fn empty() -> Self {
        Self {
            index: Vec::new(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.index.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.width() == 0
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| self.values[idx].as_slice())
    }

    /// Values of one row, in column order.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.values.iter().map(|column| column[row]).collect()
    }

    /// Split at `row`: the first half has rows `[0, row)`.
    pub fn split_at(&self, row: usize) -> (Dataset, Dataset) {
        let row = row.min(self.rows());
        let head = Dataset {
            index: self.index[..row].to_vec(),
            columns: self.columns.clone(),
            values: self.values.iter().map(|c| c[..row].to_vec()).collect(),
        };
        let tail = Dataset {
            index: self.index[row..].to_vec(),
            columns: self.columns.clone(),
            values: self.values.iter().map(|c| c[row..].to_vec()).collect(),
        };
        (head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(
            vec![2000, 2001, 2002, 2003],
            vec!["births".into(), "deaths".into()],
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![10.0, 20.0, 30.0, 40.0]],
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let result = Dataset::new(
            vec![2000, 2001],
            vec!["a".into()],
            vec![vec![1.0, 2.0, 3.0]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn split_keeps_columns_and_index() {
        let (train, test) = sample().split_at(3);
        assert_eq!(train.rows(), 3);
        assert_eq!(test.rows(), 1);
        assert_eq!(test.index, vec![2003]);
        assert_eq!(test.column("deaths"), Some(&[40.0][..]));
    }

    #[test]
    fn row_and_column_lookup() {
        let data = sample();
        assert_eq!(data.row(1), vec![2.0, 20.0]);
        assert_eq!(data.column("deaths"), Some(&[10.0, 20.0, 30.0, 40.0][..]));
        assert_eq!(data.column("missing"), None);
    }
}
