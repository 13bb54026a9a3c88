//! Typed configuration records from sweep rows.

use std::collections::BTreeSet;

use pf_types::{OperationSchema, PfResult, SweepError};

use crate::combine::{SweepRow, SweepTable};

/// Build one `C` from a name-keyed row.
///
/// The row's keys must equal `C::FIELDS` exactly. Values are then checked
/// against the field types by deserialization and against the record's own
/// semantic rules by [`OperationSchema::validate`]. Every failure is a
/// [`SweepError::SchemaMismatch`] naming `operation`.
pub fn materialize_row<C: OperationSchema>(operation: &str, row: &SweepRow) -> PfResult<C> {
    let mismatch = |message: String| SweepError::SchemaMismatch {
        operation: operation.to_string(),
        message,
    };

    let expected: BTreeSet<&str> = C::FIELDS.iter().copied().collect();
    let actual: BTreeSet<&str> = row.keys().map(String::as_str).collect();
    if expected != actual {
        let missing: Vec<_> = expected.difference(&actual).collect();
        let unknown: Vec<_> = actual.difference(&expected).collect();
        return Err(mismatch(format!(
            "row keys do not match fields: missing {missing:?}, unknown {unknown:?}"
        ))
        .into());
    }

    let object: serde_json::Map<String, serde_json::Value> = row
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect();

    let config: C = serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| mismatch(e.to_string()))?;
    config.validate().map_err(mismatch)?;
    Ok(config)
}

/// Materialize every row of `table`, failing on the first mismatch.
pub fn materialize<C: OperationSchema>(operation: &str, table: &SweepTable) -> PfResult<Vec<C>> {
    table
        .rows
        .iter()
        .map(|row| materialize_row::<C>(operation, row))
        .collect()
}
