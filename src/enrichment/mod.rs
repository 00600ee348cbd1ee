//! Selective enrichment of struct-list columns.
//!
//! Each [`NestedJoin`] takes one struct-list column, explodes it to one row per element, resolves
//! foreign-key fields against [`crate::lookup::LookupView`]s with left joins, and nests the result
//! back per record. An [`EnrichmentPlan`] collects nested joins over one objects table and runs them
//! when materialized.
//!
//! Guarantees of a materialized plan:
//!
//! - one output row per input record, in input order
//! - element order inside every enriched list matches the source list
//! - an unmatched key yields a null label, never a dropped element
//! - an empty or null source list yields an empty list, never a null

mod nested;
mod plan;

pub use nested::{JoinKeySpec, NestedJoin};
pub use plan::EnrichmentPlan;
