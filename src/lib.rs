//! `collection-flow` enriches nested (list-of-struct) columns without flattening the record set,
//! and validates the result against a schema that reaches inside those nested collections.
//!
//! The core has two halves:
//!
//! - **Selective nested enrichment**: an [`enrichment::EnrichmentPlan`] resolves foreign ids
//!   embedded in struct-list elements against [`lookup::LookupView`]s by exploding the list,
//!   left-joining the lookup and re-nesting per record. One output row per input record, element
//!   order kept, empty lists stay empty lists.
//! - **Nested schema validation**: a [`validation::ValidationEngine`] checks a
//!   [`validation::SchemaDescriptor`] (column shapes, nullability, per-column predicates over nested
//!   elements, dataframe-wide implications) and returns a deduplicated
//!   [`validation::ValidationReport`].
//!
//! Everything operates on immutable [`types::ColumnarTable`]s; no call mutates its input.
//!
//! ## Quick example: enrich, then validate
//!
//! ```rust
//! use collection_flow::collection::{
//!     harvested_object_schema, object_enrichment_plan, object_schema, terminology_schema, TERM_ID,
//! };
//! use collection_flow::ingestion::ingest_json_from_str;
//! use collection_flow::lookup::LookupIndex;
//! use collection_flow::types::Value;
//! use collection_flow::validation::{ValidationEngine, ValidationOptions};
//!
//! # fn main() -> Result<(), collection_flow::FlowError> {
//! let objects = ingest_json_from_str(
//!     r#"[{
//!         "object_id": "OBJ-001", "title": "Still Life", "date_made": 1650,
//!         "credit_line": "Gift", "department": "Paintings",
//!         "constituents": [{"name": "Willem Claesz Heda", "role": "artist", "birth_year": 1594, "nationality_id": "N1"}],
//!         "classification_ids": [{"type_id": "T1", "term_id": "T9"}],
//!         "dimensions": [{"type": "height", "value": 52.5, "unit": "cm"}],
//!         "media": [{"type": "primary", "url": "https://img.example.org/1.jpg", "caption": "Front"}]
//!     }]"#,
//!     &harvested_object_schema(),
//! )?;
//! let terms = ingest_json_from_str(
//!     r#"[{"term_id": "T1", "term_type": "object_type", "label": "Painting"},
//!         {"term_id": "T9", "term_type": "material", "label": "Oil on canvas"},
//!         {"term_id": "N1", "term_type": "nationality", "label": "Dutch"}]"#,
//!     &terminology_schema(),
//! )?;
//!
//! let plan = object_enrichment_plan(&objects, &LookupIndex::new(terms, TERM_ID)?)?;
//! let enriched = plan.materialize()?;
//! assert_eq!(
//!     enriched.column("classifications").unwrap().values()[0],
//!     Value::List(vec![vec!["Painting".into(), "Oil on canvas".into()]])
//! );
//!
//! let report = ValidationEngine::new(ValidationOptions::default())?.validate(&enriched, &object_schema()?);
//! assert!(report.passed, "{report}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: columnar data model, including struct-list columns
//! - [`processing`]: columnar primitives (filter, explode, left join, nest, fill, reduce)
//! - [`lookup`]: lookup tables and single-purpose lookup views
//! - [`enrichment`]: nested joins and the lazy enrichment plan
//! - [`validation`]: predicates, schema descriptors and the validation engine
//! - [`execution`]: rayon-backed task fan-out with observer hooks and metrics
//! - [`ingestion`]: JSON / NDJSON records into tables
//! - [`export`]: tables into JSON documents, polars `DataFrame`s and Parquet (feature `polars`)
//! - [`collection`]: museum-collection shapes, the standard plan and the standard schema
//! - [`error`]: the shared error type
//!
//! ## Errors vs. failures
//!
//! Bad data never produces an error: shape mismatches and violated checks are reported as
//! [`validation::ValidationFailure`]s. A [`FlowError`] means the configuration is wrong (a join on a
//! column that does not exist, an inconsistent schema, a duplicate lookup id) or an internal
//! post-condition broke.

pub mod collection;
pub mod enrichment;
pub mod error;
pub mod execution;
pub mod export;
pub mod ingestion;
pub mod lookup;
pub mod processing;
pub mod types;
pub mod validation;

pub use error::{FlowError, FlowResult};
