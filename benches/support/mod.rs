//! Synthetic collection data shared by the benchmarks.

#![allow(dead_code)]

use collection_flow::collection::{harvested_object_schema, terminology_schema, TERM_ID};
use collection_flow::lookup::LookupIndex;
use collection_flow::types::{ColumnarTable, Value};

const MATERIALS: usize = 200;
const NATIONALITIES: usize = 40;

/// `n` harvested objects with 0..=3 constituents and 1..=3 classifications each.
pub fn objects(n: usize) -> ColumnarTable {
    let rows = (0..n)
        .map(|i| {
            let constituents = (0..i % 4)
                .map(|c| {
                    vec![
                        Value::from(format!("Maker {i}-{c}")),
                        Value::from(if c == 0 { "artist" } else { "workshop" }),
                        Value::Int64(1500 + (i % 300) as i64),
                        Value::from(format!("N{}", (i + c) % NATIONALITIES)),
                    ]
                })
                .collect();
            let classifications = (0..1 + i % 3)
                .map(|c| vec![Value::from(format!("T{}", c % 3)), Value::from(format!("M{}", (i * 7 + c) % MATERIALS))])
                .collect();
            vec![
                Value::from(format!("OBJ-{i:07}")),
                Value::from(format!("Object {i}")),
                Value::Int64(1850 + (i % 150) as i64),
                Value::from("Gift of the artist"),
                Value::from(if i % 5 == 0 { "Sculpture" } else { "Paintings" }),
                Value::List(constituents),
                Value::List(classifications),
                Value::List(vec![
                    vec!["height".into(), Value::Float64(10.0 + (i % 90) as f64), "cm".into()],
                    vec!["depth".into(), Value::Float64(4.0), "cm".into()],
                ]),
                Value::List(vec![vec![
                    "primary".into(),
                    Value::from(format!("https://img.example.org/{i}.jpg")),
                    Value::Null,
                ]]),
            ]
        })
        .collect();
    ColumnarTable::from_rows(harvested_object_schema(), rows).expect("synthetic objects")
}

pub fn terminology() -> LookupIndex {
    let mut rows: Vec<Vec<Value>> = ["Painting", "Drawing", "Sculpture"]
        .iter()
        .enumerate()
        .map(|(i, label)| vec![format!("T{i}").into(), "object_type".into(), (*label).into()])
        .collect();
    rows.extend((0..MATERIALS).map(|i| vec![format!("M{i}").into(), "material".into(), format!("Material {i}").into()]));
    rows.extend(
        (0..NATIONALITIES).map(|i| vec![format!("N{i}").into(), "nationality".into(), format!("Nation {i}").into()]),
    );
    let table = ColumnarTable::from_rows(terminology_schema(), rows).expect("synthetic terminology");
    LookupIndex::new(table, TERM_ID).expect("terminology index")
}
