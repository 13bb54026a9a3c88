//! Schema contract for per-operation configuration records.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A strongly typed configuration record that can be built from a
/// name-keyed parameter row.
///
/// Implementors must reject unknown fields during deserialization
/// (`#[serde(deny_unknown_fields)]`) and list every field in [`FIELDS`].
/// A row materializes into the record only when its keys equal `FIELDS`
/// exactly and [`validate`] accepts the result.
///
/// [`FIELDS`]: OperationSchema::FIELDS
/// [`validate`]: OperationSchema::validate
pub trait OperationSchema: Serialize + DeserializeOwned + Clone + Debug + Send + Sync {
    /// Declared field names, in declaration order.
    const FIELDS: &'static [&'static str];

    /// Semantic checks that the type system cannot express (ranges etc.).
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}
