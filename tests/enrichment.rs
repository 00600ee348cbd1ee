mod common;

use std::sync::{Arc, Mutex};

use collection_flow::collection::{object_enrichment_plan, TERM_ID};
use collection_flow::enrichment::{EnrichmentPlan, JoinKeySpec, NestedJoin};
use collection_flow::execution::{ExecutionEngine, ExecutionEvent, ExecutionObserver, ExecutionOptions};
use collection_flow::lookup::LookupIndex;
use collection_flow::types::{Column, ColumnarTable, DataType, Field, Value};
use collection_flow::FlowError;

use common::{cell, enriched, objects, sequential, terminology};

#[test]
fn enrichment_keeps_one_row_per_object_in_input_order() {
    let input = objects();
    let out = enriched();

    assert_eq!(out.row_count(), input.row_count());
    assert_eq!(out.column("object_id"), input.column("object_id"));
    assert_eq!(
        out.schema().field_names().collect::<Vec<_>>(),
        vec![
            "object_id",
            "title",
            "date_made",
            "credit_line",
            "department",
            "dimensions",
            "media",
            "classifications",
            "constituents",
        ]
    );
}

#[test]
fn classification_ids_resolve_to_labels() {
    let out = enriched();
    assert_eq!(
        cell(&out, "classifications", "OBJ-001"),
        &Value::List(vec![vec!["Painting".into(), "Oil on canvas".into()]])
    );
}

#[test]
fn empty_constituents_stay_empty_lists() {
    let out = enriched();
    assert_eq!(cell(&out, "constituents", "OBJ-003"), &Value::List(vec![]));
    assert_eq!(cell(&out, "date_made", "OBJ-003"), &Value::Null);
}

#[test]
fn element_order_and_nulls_inside_elements_are_kept() {
    let out = enriched();
    assert_eq!(
        cell(&out, "constituents", "OBJ-004"),
        &Value::List(vec![
            vec!["Jean-Antoine Houdon".into(), "artist".into(), 1741.into(), "French".into()],
            vec!["Unknown founder".into(), "founder".into(), Value::Null, "French".into()],
        ])
    );
}

#[test]
fn pass_through_columns_are_untouched() {
    let input = objects();
    let out = enriched();
    for name in ["title", "date_made", "credit_line", "department", "dimensions", "media"] {
        assert_eq!(out.column(name), input.column(name), "column {name}");
    }
}

fn one_object(classification_ids: Value) -> ColumnarTable {
    ColumnarTable::try_new(vec![
        Column::new("object_id", DataType::Utf8, vec!["OBJ-X".into()]),
        Column::new(
            "classification_ids",
            DataType::struct_list(vec![
                Field::new("type_id", DataType::Utf8),
                Field::new("term_id", DataType::Utf8),
            ]),
            vec![classification_ids],
        ),
    ])
    .unwrap()
}

fn classifications_join(terms: &LookupIndex) -> NestedJoin {
    let labels = terms.view("label").unwrap();
    NestedJoin::on("classification_ids")
        .output_as("classifications")
        .resolve(JoinKeySpec::new("type_id", labels.clone(), "type_label"))
        .resolve(JoinKeySpec::new("term_id", labels, "term_label"))
        .keep_fields(["type_label", "term_label"])
}

#[test]
fn unknown_term_yields_null_label_without_dropping_the_element() {
    let terms = terminology();
    let input = one_object(Value::List(vec![
        vec!["T1".into(), "T404".into()],
        vec!["T2".into(), "T9".into()],
    ]));
    let out = EnrichmentPlan::new(&input, "object_id")
        .unwrap()
        .with_nested_join(classifications_join(&terms))
        .unwrap()
        .materialize_with(&sequential())
        .unwrap();

    assert_eq!(
        out.column("classifications").unwrap().values()[0],
        Value::List(vec![
            vec!["Painting".into(), Value::Null],
            vec!["Drawing".into(), "Oil on canvas".into()],
        ])
    );
}

#[test]
fn null_nested_list_becomes_empty_list() {
    let terms = terminology();
    let out = EnrichmentPlan::new(&one_object(Value::Null), "object_id")
        .unwrap()
        .with_nested_join(classifications_join(&terms))
        .unwrap()
        .materialize_with(&sequential())
        .unwrap();
    assert_eq!(out.column("classifications").unwrap().values()[0], Value::List(vec![]));
}

#[test]
fn nationality_is_resolved_against_nationality_terms_only() {
    let input = objects();
    // Point OBJ-001's constituent at a material term.
    let constituents = input.column("constituents").unwrap();
    let mut values = constituents.values().to_vec();
    values[0] = Value::List(vec![vec![
        "Willem Claesz Heda".into(),
        "artist".into(),
        1594.into(),
        "T9".into(),
    ]]);
    let columns = input
        .columns()
        .iter()
        .map(|c| {
            if c.name() == "constituents" {
                Column::new("constituents", c.data_type().clone(), values.clone())
            } else {
                c.clone()
            }
        })
        .collect();
    let input = ColumnarTable::try_new(columns).unwrap();

    let out = object_enrichment_plan(&input, &terminology())
        .unwrap()
        .materialize_with(&sequential())
        .unwrap();
    assert_eq!(
        out.column("constituents").unwrap().values()[0],
        Value::List(vec![vec![
            "Willem Claesz Heda".into(),
            "artist".into(),
            1594.into(),
            Value::Null,
        ]])
    );
}

#[test]
fn plan_can_be_inspected_without_running() {
    let plan = object_enrichment_plan(&objects(), &terminology()).unwrap();
    let joins: Vec<&str> = plan.nested_joins().iter().map(|j| j.output_column()).collect();
    assert_eq!(joins, vec!["classifications", "constituents"]);

    let text = plan.to_string();
    assert!(text.contains("NESTED JOIN classification_ids -> classifications"));
    assert!(text.contains("RESOLVE nationality_id => nationality VIA [label where term_type = nationality]"));
}

#[test]
fn configuration_defects_surface_when_building_the_plan() {
    let terms = terminology();
    let labels = terms.view("label").unwrap();

    let err = EnrichmentPlan::new(&objects(), "object_id")
        .unwrap()
        .with_nested_join(NestedJoin::on("missing").resolve(JoinKeySpec::new("x", labels.clone(), "y")))
        .unwrap_err();
    assert!(matches!(err, FlowError::ColumnNotFound { .. }));

    let err = EnrichmentPlan::new(&objects(), "object_id")
        .unwrap()
        .with_nested_join(NestedJoin::on("constituents").resolve(JoinKeySpec::new("no_such_field", labels, "y")))
        .unwrap_err();
    assert!(matches!(err, FlowError::FieldNotFound { ref field, .. } if field == "no_such_field"));
}

#[test]
fn duplicate_terms_in_a_view_are_rejected() {
    let table = ColumnarTable::try_new(vec![
        Column::new(TERM_ID, DataType::Utf8, vec!["T1".into(), "T1".into()]),
        Column::new("label", DataType::Utf8, vec!["Painting".into(), "Schilderij".into()]),
    ])
    .unwrap();
    let err = LookupIndex::new(table, TERM_ID).unwrap().view("label").unwrap_err();
    assert!(matches!(err, FlowError::DuplicateLookupKey { .. }));
}

#[test]
fn result_does_not_depend_on_thread_count() {
    let plan = object_enrichment_plan(&objects(), &terminology()).unwrap();
    let parallel = ExecutionEngine::new(ExecutionOptions { num_threads: Some(4) }).unwrap();
    assert_eq!(
        plan.materialize_with(&sequential()).unwrap(),
        plan.materialize_with(&parallel).unwrap()
    );
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl ExecutionObserver for Recorder {
    fn on_event(&self, event: &ExecutionEvent) {
        let line = match event {
            ExecutionEvent::TaskStarted { label, .. } => format!("start {label}"),
            ExecutionEvent::Materialized { rows, columns } => format!("materialized {rows}x{columns}"),
            _ => return,
        };
        self.events.lock().unwrap().push(line);
    }
}

#[test]
fn observer_sees_one_task_per_join_and_the_materialization() {
    let recorder = Arc::new(Recorder::default());
    let engine = sequential().with_observer(recorder.clone());
    object_enrichment_plan(&objects(), &terminology())
        .unwrap()
        .materialize_with(&engine)
        .unwrap();

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec!["start classifications", "start constituents", "materialized 5x9"]
    );
    assert_eq!(engine.metrics().snapshot().tasks_finished, 2);
}
