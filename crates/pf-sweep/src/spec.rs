//! Per-parameter sweep declarations.
//!
//! Declarations written as JSON use the literal string `"None"` to mean "no
//! value". That sentinel is translated to [`ParamValue::Null`] here, while the
//! declaration is read, and written back on serialization. Nothing past this
//! module ever sees the string form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::ParamValue;

/// Literal used by declarations to stand for a null value.
pub const NULL_SENTINEL: &str = "None";

/// Value type of a ranged sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepType {
    Int,
    Float,
    Bool,
    String,
}

/// The allowed values of one parameter plus the value it is held at while
/// other parameters vary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepSpec {
    /// Explicit choices. Authoritative when present.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_choices",
        serialize_with = "serialize_choices"
    )]
    pub hard_coded_choices: Option<Vec<ParamValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<usize>,
    /// `Some(ParamValue::Null)` is the null default; `None` means no default.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_default",
        serialize_with = "serialize_default"
    )]
    pub default: Option<ParamValue>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SweepType>,
}

impl SweepSpec {
    /// A parameter pinned to a single value.
    pub fn fixed(value: impl Into<ParamValue>) -> Self {
        Self {
            default: Some(value.into()),
            ..Self::default()
        }
    }

    /// A parameter pinned to null.
    pub fn null_default() -> Self {
        Self::fixed(ParamValue::Null)
    }

    pub fn choices<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        Self {
            hard_coded_choices: Some(values.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn int_range(min: i64, max: i64, samples: usize) -> Self {
        Self {
            min: Some(min as f64),
            max: Some(max as f64),
            samples: Some(samples),
            kind: Some(SweepType::Int),
            ..Self::default()
        }
    }

    pub fn float_range(min: f64, max: f64, samples: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            samples: Some(samples),
            kind: Some(SweepType::Float),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<ParamValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_null_default(self) -> Self {
        self.with_default(ParamValue::Null)
    }

    pub fn with_type(mut self, kind: SweepType) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// A named parameter and its sweep declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterChoice {
    pub parameter_name: String,
    #[serde(default)]
    pub parameter_value: SweepSpec,
}

impl ParameterChoice {
    pub fn new(parameter_name: impl Into<String>, parameter_value: SweepSpec) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            parameter_value,
        }
    }
}

// ---------------------------------------------------------------------------
// Null sentinel translation
// ---------------------------------------------------------------------------

fn from_sentinel(value: ParamValue) -> ParamValue {
    match value {
        ParamValue::Str(s) if s == NULL_SENTINEL => ParamValue::Null,
        other => other,
    }
}

fn to_sentinel(value: &ParamValue) -> ParamValue {
    match value {
        ParamValue::Null => ParamValue::Str(NULL_SENTINEL.to_string()),
        other => other.clone(),
    }
}

fn deserialize_default<'de, D>(deserializer: D) -> Result<Option<ParamValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<ParamValue>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(ParamValue::Null) => None,
        Some(value) => Some(from_sentinel(value)),
    })
}

fn serialize_default<S>(value: &Option<ParamValue>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => to_sentinel(v).serialize(serializer),
        None => serializer.serialize_none(),
    }
}

fn deserialize_choices<'de, D>(deserializer: D) -> Result<Option<Vec<ParamValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<ParamValue>>::deserialize(deserializer)?;
    Ok(raw.map(|values| values.into_iter().map(from_sentinel).collect()))
}

fn serialize_choices<S>(value: &Option<Vec<ParamValue>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(values) => values
            .iter()
            .map(to_sentinel)
            .collect::<Vec<_>>()
            .serialize(serializer),
        None => serializer.serialize_none(),
    }
}
