//! Dynamically typed parameter values carried through sweep tables.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A single cell of a sweep table.
///
/// Equality is structural: lists compare element by element. Deduplication
/// uses [`ParamValue::canonical_key`], so `Int(1)` and `Float(1.0)` are
/// distinct values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Canonical JSON text, used as the identity for deduplication.
    pub fn canonical_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParamValue::Null => serde_json::Value::Null,
            ParamValue::Bool(b) => serde_json::Value::Bool(*b),
            ParamValue::Int(i) => serde_json::Value::from(*i),
            ParamValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ParamValue::Str(s) => serde_json::Value::String(s.clone()),
            ParamValue::List(items) => {
                serde_json::Value::Array(items.iter().map(ParamValue::to_json).collect())
            }
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("null"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::List(_) => f.write_str(&self.canonical_key()),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

/// Stable deduplication: keeps the first occurrence of each value.
pub fn dedup_values<I>(values: I) -> Vec<ParamValue>
where
    I: IntoIterator<Item = ParamValue>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.canonical_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_picks_the_narrowest_variant() {
        let parsed: Vec<ParamValue> =
            serde_json::from_str(r#"[null, true, 3, 0.8, "always", ["Utah", "Idaho"]]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                ParamValue::Null,
                ParamValue::Bool(true),
                ParamValue::Int(3),
                ParamValue::Float(0.8),
                ParamValue::from("always"),
                ParamValue::from(vec!["Utah", "Idaho"]),
            ]
        );
    }

    #[test]
    fn dedup_is_stable_and_structural() {
        let values = vec![
            ParamValue::from(vec!["a", "b"]),
            ParamValue::Int(1),
            ParamValue::from(vec!["a", "b"]),
            ParamValue::Float(1.0),
            ParamValue::Int(1),
            ParamValue::Null,
            ParamValue::Null,
        ];
        assert_eq!(
            dedup_values(values),
            vec![
                ParamValue::from(vec!["a", "b"]),
                ParamValue::Int(1),
                ParamValue::Float(1.0),
                ParamValue::Null,
            ]
        );
    }

    #[test]
    fn to_json_matches_serde() {
        let value = ParamValue::List(vec![ParamValue::Int(2), ParamValue::Null, "x".into()]);
        assert_eq!(value.to_json(), serde_json::to_value(&value).unwrap());
        assert_eq!(ParamValue::from(None::<i64>), ParamValue::Null);
    }
}
