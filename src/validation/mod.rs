//! Nested schema validation.
//!
//! A [`SchemaDescriptor`] declares, per column, an expected [`crate::types::DataType`] (nested
//! struct-list shapes included), nullability and an ordered list of named [`Predicate`]s, plus
//! dataframe-wide [`FramePredicate`]s. The [`ValidationEngine`] evaluates every declaration against a
//! table and returns a [`ValidationReport`] with one representative failure per (column, check).
//!
//! ```rust
//! use collection_flow::execution::ExecutionOptions;
//! use collection_flow::types::{Column, ColumnarTable, DataType, Field, Value};
//! use collection_flow::validation::{
//!     ColumnSpec, Condition, Predicate, SchemaDescriptor, ValidationEngine, ValidationOptions,
//! };
//!
//! # fn main() -> Result<(), collection_flow::FlowError> {
//! let media = DataType::struct_list(vec![Field::new("url", DataType::Utf8)]);
//! let table = ColumnarTable::try_new(vec![Column::new(
//!     "media",
//!     media.clone(),
//!     vec![Value::List(vec![vec!["http://example.org/a.jpg".into()]])],
//! )])?;
//!
//! let schema = SchemaDescriptor::builder()
//!     .column(ColumnSpec::new("media", media).check(
//!         "all_urls_are_https",
//!         Predicate::ListAll { field: "url".into(), condition: Condition::StartsWith("https://".into()) },
//!     ))
//!     .build()?;
//!
//! let engine = ValidationEngine::new(ValidationOptions {
//!     execution: ExecutionOptions::sequential(),
//!     ..ValidationOptions::default()
//! })?;
//! let report = engine.validate(&table, &schema);
//! assert!(!report.passed);
//! assert_eq!(report.failures[0].check, "all_urls_are_https");
//! # Ok(())
//! # }
//! ```

mod engine;
mod predicate;
mod schema;

pub use engine::{
    dedup_failures, ValidationEngine, ValidationFailure, ValidationOptions, ValidationReport, COLUMN_IN_DATAFRAME,
    COLUMN_IN_SCHEMA, DTYPE, NOT_NULLABLE,
};
pub use predicate::{Comparison, Condition, FramePredicate, Operand, Predicate, RowTest};
pub use schema::{Check, ColumnSpec, FrameCheck, SchemaBuilder, SchemaDescriptor};
