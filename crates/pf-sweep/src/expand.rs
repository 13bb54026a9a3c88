//! Single-parameter expansion.

use pf_types::InvalidSweepReason;

use crate::spec::{SweepSpec, SweepType};
use crate::value::{dedup_values, ParamValue};

/// The two value sets a parameter contributes to a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedParameter {
    /// Values taken while this parameter is the one being varied.
    pub ablation_values: Vec<ParamValue>,
    /// Values taken while some other parameter is varied.
    pub held_values: Vec<ParamValue>,
}

/// Expand a declaration into its ablation and held values.
///
/// Explicit choices win over everything else. Without choices and without a
/// type the parameter is fixed at its default. Typed declarations sample
/// `samples` evenly spaced points over `[min, max]`; integer sweeps truncate
/// each point toward zero. Both output sequences are deduplicated, keeping the
/// first occurrence.
pub fn expand(spec: &SweepSpec) -> Result<ExpandedParameter, InvalidSweepReason> {
    let ablation = match (&spec.hard_coded_choices, spec.kind) {
        (Some(choices), _) => choices.clone(),
        (None, None) => vec![spec.default.clone().unwrap_or(ParamValue::Null)],
        (None, Some(SweepType::Int)) => linspace(spec)?
            .into_iter()
            .map(|x| ParamValue::Int(x.trunc() as i64))
            .collect(),
        (None, Some(SweepType::Float)) => linspace(spec)?.into_iter().map(ParamValue::Float).collect(),
        (None, Some(SweepType::Bool)) => vec![ParamValue::Bool(false), ParamValue::Bool(true)],
        (None, Some(SweepType::String)) => {
            return Err(InvalidSweepReason::ChoicesRequired {
                kind: "string".to_string(),
            })
        }
    };

    let ablation_values = dedup_values(ablation);
    let held_values = match &spec.default {
        Some(default) => vec![default.clone()],
        None => ablation_values.clone(),
    };

    Ok(ExpandedParameter {
        ablation_values,
        held_values,
    })
}

/// `samples` evenly spaced points over `[min, max]`, both ends included.
fn linspace(spec: &SweepSpec) -> Result<Vec<f64>, InvalidSweepReason> {
    let samples = spec.samples.ok_or(InvalidSweepReason::MissingSamples)?;
    if samples <= 1 {
        return Err(InvalidSweepReason::TooFewSamples { samples });
    }
    let (min, max) = match (spec.min, spec.max) {
        (Some(min), Some(max)) => (min, max),
        _ => return Err(InvalidSweepReason::MissingBounds),
    };
    if !min.is_finite() || !max.is_finite() {
        return Err(InvalidSweepReason::NonFiniteBounds);
    }

    let intervals = (samples - 1) as f64;
    Ok((0..samples)
        .map(|i| min + i as f64 * (max - min) / intervals)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<ParamValue> {
        values.iter().copied().map(ParamValue::Int).collect()
    }

    #[test]
    fn choices_are_deduplicated_in_order() {
        let expanded = expand(&SweepSpec::choices(["a", "a", "b"])).unwrap();
        assert_eq!(expanded.ablation_values, vec![ParamValue::from("a"), ParamValue::from("b")]);
        assert_eq!(expanded.held_values, expanded.ablation_values);
    }

    #[test]
    fn int_range_with_default() {
        let spec = SweepSpec::int_range(1, 6, 6).with_default(3);
        let expanded = expand(&spec).unwrap();
        assert_eq!(expanded.ablation_values, ints(&[1, 2, 3, 4, 5, 6]));
        assert_eq!(expanded.held_values, ints(&[3]));
    }

    #[test]
    fn null_default_is_held_as_null() {
        let spec = SweepSpec::int_range(1, 6, 2).with_null_default();
        let expanded = expand(&spec).unwrap();
        assert_eq!(expanded.ablation_values, ints(&[1, 6]));
        assert_eq!(expanded.held_values, vec![ParamValue::Null]);
    }

    #[test]
    fn int_points_truncate_toward_zero() {
        let expanded = expand(&SweepSpec::int_range(0, 10, 4)).unwrap();
        // 0, 3.33, 6.67, 10
        assert_eq!(expanded.ablation_values, ints(&[0, 3, 6, 10]));

        let expanded = expand(&SweepSpec::int_range(1, 2, 5)).unwrap();
        assert_eq!(expanded.ablation_values, ints(&[1, 2]));
    }

    #[test]
    fn untyped_spec_is_fixed_at_default() {
        let expanded = expand(&SweepSpec::fixed(0.8)).unwrap();
        assert_eq!(expanded.ablation_values, vec![ParamValue::Float(0.8)]);
        assert_eq!(expanded.held_values, vec![ParamValue::Float(0.8)]);

        let expanded = expand(&SweepSpec::default()).unwrap();
        assert_eq!(expanded.ablation_values, vec![ParamValue::Null]);
        assert_eq!(expanded.held_values, vec![ParamValue::Null]);
    }

    #[test]
    fn float_and_bool_sweeps() {
        let expanded = expand(&SweepSpec::float_range(0.5, 1.0, 3)).unwrap();
        assert_eq!(expanded.ablation_values.len(), 3);
        assert_eq!(expanded.ablation_values[1], ParamValue::Float(0.75));
        assert_eq!(expanded.ablation_values[2], ParamValue::Float(1.0));

        let spec = SweepSpec::default().with_type(SweepType::Bool).with_default(true);
        let expanded = expand(&spec).unwrap();
        assert_eq!(expanded.ablation_values, vec![ParamValue::Bool(false), ParamValue::Bool(true)]);
        assert_eq!(expanded.held_values, vec![ParamValue::Bool(true)]);
    }

    #[test]
    fn degenerate_ranges_are_rejected() {
        assert_eq!(
            expand(&SweepSpec::int_range(1, 6, 1)),
            Err(InvalidSweepReason::TooFewSamples { samples: 1 })
        );
        assert_eq!(
            expand(&SweepSpec::int_range(1, 6, 0)),
            Err(InvalidSweepReason::TooFewSamples { samples: 0 })
        );

        let mut spec = SweepSpec::int_range(1, 6, 3);
        spec.samples = None;
        assert_eq!(expand(&spec), Err(InvalidSweepReason::MissingSamples));

        let mut spec = SweepSpec::int_range(1, 6, 3);
        spec.max = None;
        assert_eq!(expand(&spec), Err(InvalidSweepReason::MissingBounds));

        let spec = SweepSpec::float_range(0.0, f64::INFINITY, 3);
        assert_eq!(expand(&spec), Err(InvalidSweepReason::NonFiniteBounds));

        let spec = SweepSpec::default().with_type(SweepType::String);
        assert!(matches!(
            expand(&spec),
            Err(InvalidSweepReason::ChoicesRequired { .. })
        ));
    }

    #[test]
    fn choices_override_range() {
        let mut spec = SweepSpec::int_range(1, 6, 6);
        spec.hard_coded_choices = Some(vec![ParamValue::Null, 1.into(), 2.into()]);
        let expanded = expand(&spec).unwrap();
        assert_eq!(expanded.ablation_values, vec![ParamValue::Null, 1.into(), 2.into()]);
    }
}
