//! JSON ingestion implementation.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Top-level fields may use dot paths in schema field names (e.g. `object.title`). A
//! [`DataType::StructList`] field expects an array of objects; element fields are matched by name
//! and missing element fields become nulls. A lone object where a list is expected is read as a
//! one-element list, which is how XML-to-JSON converters render a single repeated child.

use std::fs;
use std::path::Path;

use crate::error::{FlowError, FlowResult};
use crate::types::{ColumnarTable, DataType, Field, Schema, Value};

/// Ingest a JSON file into a [`ColumnarTable`] shaped like `schema`.
pub fn ingest_json_from_path(path: impl AsRef<Path>, schema: &Schema) -> FlowResult<ColumnarTable> {
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text, schema)
}

/// Ingest JSON from an in-memory string into a [`ColumnarTable`].
pub fn ingest_json_from_str(input: &str, schema: &Schema) -> FlowResult<ColumnarTable> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FlowError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match v {
            serde_json::Value::Array(items) => ingest_json_values(&items, schema),
            serde_json::Value::Object(_) => ingest_json_values(std::slice::from_ref(&v), schema),
            _ => Err(FlowError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        }
    } else {
        // Fall back to NDJSON.
        let mut values = Vec::new();
        for (i, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| FlowError::SchemaMismatch {
                message: format!("invalid ndjson at line {}: {}", i + 1, e),
            })?;
            values.push(v);
        }
        ingest_json_values(&values, schema)
    }
}

/// Convert already-parsed JSON objects into a [`ColumnarTable`].
pub fn ingest_json_values(values: &[serde_json::Value], schema: &Schema) -> FlowResult<ColumnarTable> {
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(values.len());

    for (idx0, v) in values.iter().enumerate() {
        let row_num = idx0 + 1;
        let obj = v.as_object().ok_or_else(|| FlowError::SchemaMismatch {
            message: format!("row {row_num} is not a json object"),
        })?;

        let mut row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let jv = get_by_dot_path(obj, &field.name).ok_or_else(|| FlowError::SchemaMismatch {
                message: format!("row {row_num} missing required field '{}'", field.name),
            })?;
            row.push(convert_json_value(row_num, &field.name, &field.data_type, jv)?);
        }
        rows.push(row);
    }

    ColumnarTable::from_rows(schema.clone(), rows)
}

fn get_by_dot_path<'a>(
    root: &'a serde_json::Map<String, serde_json::Value>,
    path: &str,
) -> Option<&'a serde_json::Value> {
    let mut segments = path.split('.');
    let mut current: &serde_json::Value = root.get(segments.next().unwrap_or(path))?;
    for segment in segments {
        match current {
            serde_json::Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

fn convert_json_value(row: usize, column: &str, data_type: &DataType, v: &serde_json::Value) -> FlowResult<Value> {
    if v.is_null() {
        return Ok(Value::Null);
    }

    let parse_error = |message: &str| FlowError::ParseError {
        row,
        column: column.to_string(),
        raw: v.to_string(),
        message: message.to_string(),
    };

    match data_type {
        DataType::Utf8 => v
            .as_str()
            .map(|s| Value::Utf8(s.to_string()))
            .ok_or_else(|| parse_error("expected string")),
        DataType::Bool => v.as_bool().map(Value::Bool).ok_or_else(|| parse_error("expected bool")),
        DataType::Int64 => {
            if let Some(n) = v.as_i64() {
                Ok(Value::Int64(n))
            } else if let Some(n) = v.as_u64() {
                i64::try_from(n)
                    .map(Value::Int64)
                    .map_err(|_| parse_error("u64 out of range for i64"))
            } else {
                Err(parse_error("expected integer number"))
            }
        }
        DataType::Float64 => v.as_f64().map(Value::Float64).ok_or_else(|| parse_error("expected number")),
        DataType::StructList(fields) => match v {
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| convert_element(row, column, fields, item))
                .collect::<FlowResult<Vec<_>>>()
                .map(Value::List),
            serde_json::Value::Object(_) => Ok(Value::List(vec![convert_element(row, column, fields, v)?])),
            _ => Err(parse_error("expected array of objects")),
        },
    }
}

fn convert_element(row: usize, column: &str, fields: &[Field], item: &serde_json::Value) -> FlowResult<Vec<Value>> {
    let obj = item.as_object().ok_or_else(|| FlowError::ParseError {
        row,
        column: column.to_string(),
        raw: item.to_string(),
        message: "expected object element".to_string(),
    })?;
    fields
        .iter()
        .map(|field| {
            let path = format!("{column}.{}", field.name);
            match obj.get(&field.name) {
                Some(jv) => convert_json_value(row, &path, &field.data_type, jv),
                None => Ok(Value::Null),
            }
        })
        .collect()
}
