//! # pf-sweep
//!
//! Parameter sweep generation for the population forecast harness.
//!
//! Per-parameter declarations are expanded into ablation and held values,
//! combined one parameter at a time into deduplicated name-keyed tables,
//! materialized into typed layer configs and finally crossed across the four
//! pipeline layers into runnable experiment configurations.

mod aggregate;
pub mod catalog;
mod combine;
mod expand;
mod layers;
mod materialize;
mod spec;
mod suite;
mod value;

pub use aggregate::{aggregate, cross_layers, generate_layer, SuiteCatalog};
pub use catalog::{default_catalog, extended_catalog, DEFAULT_EXPERIMENT_NAME};
pub use combine::{combine, row_count_bound, SweepRow, SweepTable};
pub use expand::{expand, ExpandedParameter};
pub use materialize::{materialize, materialize_row};
pub use spec::{ParameterChoice, SweepSpec, SweepType, NULL_SENTINEL};
pub use suite::{LayerChoice, LayerOperation, ParameterDecisionSuite};
pub use value::{dedup_values, ParamValue};
