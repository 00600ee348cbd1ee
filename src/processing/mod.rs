//! Columnar primitives the nested join engine is assembled from.
//!
//! Every operation takes shared references and returns a new [`crate::types::ColumnarTable`];
//! inputs are never modified.
//!
//! - [`filter()`]: keep rows whose value in one column satisfies a predicate
//! - [`explode()`]: one row per struct-list element, element fields unnested
//! - [`left_join()`]: attach columns of a uniquely keyed table
//! - [`nest()`]: stable group-by packing columns back into a struct list
//! - [`fill_null()`]: replace nulls in one column
//! - [`reduce()`]: count/sum/min/max over values, ignoring nulls
//!
//! ## Example: explode → join → re-nest
//!
//! ```rust
//! use collection_flow::processing::{explode, filter, is_non_empty_list, left_join, nest};
//! use collection_flow::types::{Column, ColumnarTable, DataType, Field, Value};
//!
//! # fn main() -> Result<(), collection_flow::FlowError> {
//! let shape = DataType::struct_list(vec![Field::new("term_id", DataType::Utf8)]);
//! let objects = ColumnarTable::try_new(vec![
//!     Column::new("object_id", DataType::Utf8, vec!["OBJ-1".into(), "OBJ-2".into()]),
//!     Column::new(
//!         "terms",
//!         shape,
//!         vec![
//!             Value::List(vec![vec!["T1".into()], vec!["T9".into()]]),
//!             Value::List(vec![]),
//!         ],
//!     ),
//! ])?;
//! let lookup = ColumnarTable::try_new(vec![
//!     Column::new("term_id", DataType::Utf8, vec!["T1".into(), "T9".into()]),
//!     Column::new("label", DataType::Utf8, vec!["Painting".into(), "Oil on canvas".into()]),
//! ])?;
//!
//! let non_empty = filter(&objects, "terms", is_non_empty_list)?;
//! let flat = explode(&non_empty, "terms")?;
//! let joined = left_join(&flat, &lookup, "term_id", "term_id")?;
//! let nested = nest(&joined, "object_id", &["term_id", "label"], "terms")?;
//!
//! assert_eq!(nested.row_count(), 1);
//! assert_eq!(
//!     nested.column("terms").unwrap().values()[0],
//!     Value::List(vec![
//!         vec!["T1".into(), "Painting".into()],
//!         vec!["T9".into(), "Oil on canvas".into()],
//!     ])
//! );
//! # Ok(())
//! # }
//! ```

pub mod explode;
pub mod fill;
pub mod filter;
pub mod join;
pub mod nest;
pub mod reduce;

pub use explode::explode;
pub use fill::fill_null;
pub use filter::{filter, is_non_empty_list};
pub use join::left_join;
pub use nest::nest;
pub use reduce::{reduce, reduce_field, ReduceOp};
