#![allow(dead_code)]

use collection_flow::collection::{harvested_object_schema, object_enrichment_plan, terminology_schema, TERM_ID};
use collection_flow::execution::{ExecutionEngine, ExecutionOptions};
use collection_flow::ingestion::json::ingest_json_from_path;
use collection_flow::lookup::LookupIndex;
use collection_flow::types::{ColumnarTable, Value};

pub fn objects() -> ColumnarTable {
    ingest_json_from_path("tests/fixtures/objects.json", &harvested_object_schema()).unwrap()
}

pub fn terminology() -> LookupIndex {
    let table = ingest_json_from_path("tests/fixtures/terminology.json", &terminology_schema()).unwrap();
    LookupIndex::new(table, TERM_ID).unwrap()
}

pub fn sequential() -> ExecutionEngine {
    ExecutionEngine::new(ExecutionOptions::sequential()).unwrap()
}

pub fn enriched() -> ColumnarTable {
    object_enrichment_plan(&objects(), &terminology())
        .unwrap()
        .materialize_with(&sequential())
        .unwrap()
}

/// Row index of `object_id` in `table`.
pub fn row_of(table: &ColumnarTable, object_id: &str) -> usize {
    table
        .column("object_id")
        .unwrap()
        .values()
        .iter()
        .position(|v| v.as_str() == Some(object_id))
        .unwrap()
}

pub fn cell<'a>(table: &'a ColumnarTable, column: &str, object_id: &str) -> &'a Value {
    &table.column(column).unwrap().values()[row_of(table, object_id)]
}
