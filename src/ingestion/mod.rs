//! Harvesting boundary: hierarchical JSON documents into [`crate::types::ColumnarTable`]s.
//!
//! The core never parses source documents itself. Whatever harvests the records (an XML
//! converter, an API client) hands over JSON objects whose fields already carry the documented
//! names; [`json`] maps them onto a declared nested [`crate::types::Schema`].

pub mod json;

pub use json::{ingest_json_from_path, ingest_json_from_str, ingest_json_values};
