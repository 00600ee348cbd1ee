//! One JSON document per record: the interchange shape handed to search indexers.
//!
//! Struct-list values become arrays of objects keyed by the element field names; non-finite
//! floats become `null`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::{Map, Number};

use crate::error::FlowResult;
use crate::types::{ColumnarTable, DataType, Value};

/// Render every row of `table` as a JSON object, in row order.
pub fn to_json_documents(table: &ColumnarTable) -> Vec<serde_json::Value> {
    (0..table.row_count())
        .map(|row| {
            let doc: Map<String, serde_json::Value> = table
                .columns()
                .iter()
                .map(|c| (c.name().to_string(), to_json_value(&c.values()[row], c.data_type())))
                .collect();
            serde_json::Value::Object(doc)
        })
        .collect()
}

/// Newline-delimited documents, one line per record.
pub fn to_ndjson_string(table: &ColumnarTable) -> FlowResult<String> {
    let mut out = String::new();
    for doc in to_json_documents(table) {
        out.push_str(&serde_json::to_string(&doc)?);
        out.push('\n');
    }
    Ok(out)
}

/// Write all records as one pretty-printed JSON array.
pub fn write_json_documents(table: &ColumnarTable, path: impl AsRef<Path>) -> FlowResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &to_json_documents(table))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn to_json_value(value: &Value, data_type: &DataType) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Int64(v) => serde_json::Value::from(*v),
        Value::Float64(v) => Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Bool(v) => serde_json::Value::Bool(*v),
        Value::Utf8(v) => serde_json::Value::String(v.clone()),
        Value::List(items) => {
            let fields = data_type.struct_fields().unwrap_or(&[]);
            serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| {
                        let element: Map<String, serde_json::Value> = fields
                            .iter()
                            .zip(item)
                            .map(|(f, v)| (f.name.clone(), to_json_value(v, &f.data_type)))
                            .collect();
                        serde_json::Value::Object(element)
                    })
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{to_json_documents, to_ndjson_string};
    use crate::types::{Column, ColumnarTable, DataType, Field, Value};

    fn table() -> ColumnarTable {
        ColumnarTable::try_new(vec![
            Column::new("object_id", DataType::Utf8, vec!["OBJ-1".into()]),
            Column::new("date_made", DataType::Int64, vec![Value::Null]),
            Column::new(
                "classifications",
                DataType::struct_list(vec![
                    Field::new("type_label", DataType::Utf8),
                    Field::new("term_label", DataType::Utf8),
                ]),
                vec![Value::List(vec![vec!["Painting".into(), Value::Null]])],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn documents_keep_nesting_and_nulls() {
        let docs = to_json_documents(&table());
        assert_eq!(
            docs,
            vec![serde_json::json!({
                "object_id": "OBJ-1",
                "date_made": null,
                "classifications": [{"type_label": "Painting", "term_label": null}],
            })]
        );
    }

    #[test]
    fn ndjson_has_one_line_per_record() {
        let text = to_ndjson_string(&table()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));
    }
}
