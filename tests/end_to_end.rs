mod common;

use std::sync::{Arc, Mutex};

use collection_flow::collection::{object_enrichment_plan, object_schema};
use collection_flow::execution::{ExecutionEvent, ExecutionObserver, ExecutionOptions};
use collection_flow::export::{to_json_documents, write_json_documents};
use collection_flow::types::{Column, ColumnarTable, Value};
use collection_flow::validation::{ValidationEngine, ValidationOptions};

use common::{objects, sequential, terminology};

#[derive(Default)]
struct Verdicts {
    seen: Mutex<Vec<(bool, usize)>>,
}

impl ExecutionObserver for Verdicts {
    fn on_event(&self, event: &ExecutionEvent) {
        if let ExecutionEvent::ValidationFinished { passed, failures } = event {
            self.seen.lock().unwrap().push((*passed, *failures));
        }
    }
}

#[test]
fn harvest_enrich_validate_export() {
    let enriched = object_enrichment_plan(&objects(), &terminology())
        .unwrap()
        .materialize_with(&sequential())
        .unwrap();

    let verdicts = Arc::new(Verdicts::default());
    let engine = ValidationEngine::new(ValidationOptions {
        execution: ExecutionOptions::sequential(),
        ..ValidationOptions::default()
    })
    .unwrap()
    .with_observer(verdicts.clone());
    let report = engine.validate(&enriched, &object_schema().unwrap());

    assert!(!report.passed);
    assert_eq!(*verdicts.seen.lock().unwrap(), vec![(false, 2)]);

    // Gating is the caller's decision; export the table regardless and check its shape.
    let docs = to_json_documents(&enriched);
    assert_eq!(docs.len(), 5);
    assert_eq!(
        docs[0]["classifications"],
        serde_json::json!([{"type_label": "Painting", "term_label": "Oil on canvas"}])
    );
    assert_eq!(docs[2]["constituents"], serde_json::json!([]));
    assert_eq!(docs[2]["date_made"], serde_json::Value::Null);
    assert_eq!(docs[3]["constituents"][0]["nationality"], serde_json::json!("French"));

    let path = std::env::temp_dir().join(format!("collection_flow_e2e_{}.json", std::process::id()));
    write_json_documents(&enriched, &path).unwrap();
    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, serde_json::Value::Array(docs));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn repeated_object_id_is_reported_not_fatal() {
    let harvested = objects();
    let columns = harvested
        .columns()
        .iter()
        .map(|c| {
            if c.name() == "object_id" {
                let mut ids = c.values().to_vec();
                ids[1] = ids[0].clone();
                Column::new("object_id", c.data_type().clone(), ids)
            } else {
                c.clone()
            }
        })
        .collect();
    let harvested = ColumnarTable::try_new(columns).unwrap();

    let enriched = object_enrichment_plan(&harvested, &terminology())
        .unwrap()
        .materialize_with(&sequential())
        .unwrap();
    assert_eq!(enriched.row_count(), harvested.row_count());
    assert_eq!(enriched.column("object_id"), harvested.column("object_id"));
    // Both OBJ-001 rows keep their own constituents.
    let constituents = enriched.column("constituents").unwrap().values();
    assert_ne!(constituents[0], constituents[1]);

    let engine = ValidationEngine::new(ValidationOptions {
        execution: ExecutionOptions::sequential(),
        ..ValidationOptions::default()
    })
    .unwrap();
    let report = engine.validate(&enriched, &object_schema().unwrap());
    let unique: Vec<_> = report
        .failures
        .iter()
        .filter(|f| f.column.as_deref() == Some("object_id") && f.check == "unique")
        .collect();
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].failure_case, "OBJ-001");

    let rows = engine
        .failing_rows(&enriched, &object_schema().unwrap(), Some("object_id"), "unique")
        .unwrap();
    assert_eq!(rows, vec![0, 1]);
    assert!(matches!(&enriched.column("object_id").unwrap().values()[1], Value::Utf8(id) if id == "OBJ-001"));
}

#[cfg(feature = "polars")]
#[test]
fn enriched_table_persists_as_parquet() {
    use collection_flow::export::{to_dataframe, write_parquet};

    let enriched = object_enrichment_plan(&objects(), &terminology())
        .unwrap()
        .materialize_with(&sequential())
        .unwrap();

    let df = to_dataframe(&enriched).unwrap();
    assert_eq!(df.height(), 5);
    assert_eq!(
        df.get_column_names().iter().map(|n| n.as_str()).collect::<Vec<_>>(),
        enriched.schema().field_names().collect::<Vec<_>>()
    );

    let path = std::env::temp_dir().join(format!("collection_flow_e2e_{}.parquet", std::process::id()));
    let bytes = write_parquet(&enriched, &path).unwrap();
    assert!(bytes > 0);
    let _ = std::fs::remove_file(&path);
}
