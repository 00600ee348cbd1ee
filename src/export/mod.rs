//! Output boundary: enriched tables to documents and columnar files.

pub mod json;
#[cfg(feature = "polars")]
pub mod polars;

pub use json::{to_json_documents, to_ndjson_string, write_json_documents};
#[cfg(feature = "polars")]
pub use self::polars::{to_dataframe, write_parquet};
