use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::OperationSchema;

/// Raw data retrieval operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalOperation {
    /// One row per year, every metric averaged across all states.
    AveragedAcrossStates,
    /// Per-state series, optionally restricted to a subset of states.
    FullDatabase,
}

impl RetrievalOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalOperation::AveragedAcrossStates => "averaged_across_states",
            RetrievalOperation::FullDatabase => "full_database",
        }
    }
}

impl fmt::Display for RetrievalOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for retrieving a raw dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalParameters {
    pub specific_states: Option<Vec<String>>,
    pub random_sample_n_states: Option<usize>,
}

impl RetrievalParameters {
    pub fn all_states() -> Self {
        Self::default()
    }

    pub fn with_states(states: Vec<String>) -> Self {
        Self {
            specific_states: Some(states),
            random_sample_n_states: None,
        }
    }

    pub fn with_random_sample(n: usize) -> Self {
        Self {
            specific_states: None,
            random_sample_n_states: Some(n),
        }
    }
}

impl OperationSchema for RetrievalParameters {
    const FIELDS: &'static [&'static str] = &["specific_states", "random_sample_n_states"];

    fn validate(&self) -> Result<(), String> {
        if let Some(states) = &self.specific_states {
            if states.is_empty() {
                return Err("specific_states must not be empty when set".to_string());
            }
        }
        if self.random_sample_n_states == Some(0) {
            return Err("random_sample_n_states must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_match_serde() {
        for op in [
            RetrievalOperation::AveragedAcrossStates,
            RetrievalOperation::FullDatabase,
        ] {
            let json = serde_json::to_value(op).unwrap();
            assert_eq!(json, serde_json::json!(op.as_str()));
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<RetrievalParameters, _> = serde_json::from_value(serde_json::json!({
            "specific_states": null,
            "random_sample_n_states": null,
            "region": "west",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn zero_state_sample_is_invalid() {
        assert!(RetrievalParameters::with_random_sample(0).validate().is_err());
        assert!(RetrievalParameters::with_random_sample(2).validate().is_ok());
        assert!(RetrievalParameters::with_states(vec![]).validate().is_err());
    }
}
