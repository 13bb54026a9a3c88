use std::collections::HashSet;

use pf_sweep::{combine, expand, row_count_bound, ParamValue, ParameterChoice, SweepSpec};
use proptest::prelude::*;

/// (distinct choice count, index of the default among the choices if any)
fn parameter_strategy() -> impl Strategy<Value = (usize, Option<usize>)> {
    (1usize..5).prop_flat_map(|n| (Just(n), proptest::option::of(0..n)))
}

fn build(params: &[(usize, Option<usize>)]) -> Vec<ParameterChoice> {
    params
        .iter()
        .enumerate()
        .map(|(i, (n, default))| {
            let values: Vec<ParamValue> = (0..*n).map(|v| ParamValue::Int(v as i64)).collect();
            let mut spec = SweepSpec::choices(values);
            if let Some(d) = default {
                spec = spec.with_default(ParamValue::Int(*d as i64));
            }
            ParameterChoice::new(format!("param_{i}"), spec)
        })
        .collect()
}

proptest! {
    #[test]
    fn combined_rows_are_unique_and_complete(params in prop::collection::vec(parameter_strategy(), 1..5)) {
        let choices = build(&params);
        let table = combine(&choices).unwrap();

        let keys: HashSet<String> = table
            .rows
            .iter()
            .map(|row| serde_json::to_string(row).unwrap())
            .collect();
        prop_assert_eq!(keys.len(), table.rows.len());

        let expanded: Vec<_> = choices
            .iter()
            .map(|c| expand(&c.parameter_value).unwrap())
            .collect();
        prop_assert!(table.rows.len() <= row_count_bound(&expanded));

        for row in &table.rows {
            prop_assert_eq!(row.len(), choices.len());
            for (choice, values) in choices.iter().zip(&expanded) {
                let value = &row[&choice.parameter_name];
                prop_assert!(
                    values.ablation_values.contains(value) || values.held_values.contains(value)
                );
            }
        }
    }

    #[test]
    fn combine_is_deterministic(params in prop::collection::vec(parameter_strategy(), 0..5)) {
        let choices = build(&params);
        prop_assert_eq!(combine(&choices).unwrap(), combine(&choices).unwrap());
    }

    #[test]
    fn all_defaults_give_one_plus_sum_of_extras(sizes in prop::collection::vec(1usize..6, 1..5)) {
        let params: Vec<_> = sizes.iter().map(|n| (*n, Some(0))).collect();
        let table = combine(&build(&params)).unwrap();
        let expected = 1 + sizes.iter().map(|n| n - 1).sum::<usize>();
        prop_assert_eq!(table.rows.len(), expected);
    }

    #[test]
    fn int_ranges_stay_within_bounds(min in -50i64..50, span in 0i64..100, samples in 2usize..20) {
        let spec = SweepSpec::int_range(min, min + span, samples);
        let expanded = expand(&spec).unwrap();
        prop_assert!(!expanded.ablation_values.is_empty());
        prop_assert!(expanded.ablation_values.len() <= samples);
        prop_assert_eq!(expanded.ablation_values.first(), Some(&ParamValue::Int(min)));
        prop_assert_eq!(expanded.ablation_values.last(), Some(&ParamValue::Int(min + span)));
        for value in &expanded.ablation_values {
            match value {
                ParamValue::Int(v) => prop_assert!(*v >= min && *v <= min + span),
                other => prop_assert!(false, "non-integer sample {:?}", other),
            }
        }
    }
}
