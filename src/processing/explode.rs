//! Explode a struct-list column into one row per element.

use crate::error::{FlowError, FlowResult};
use crate::types::{Column, ColumnarTable, Value};

/// One output row per element of the struct-list `column`.
///
/// The element's fields become sibling columns at the position of `column`; every other column
/// repeats the owning row's value. Element order is preserved.
///
/// A null or empty list yields one row whose element fields are all null. Callers that must not
/// see those placeholder rows filter with [`super::filter::is_non_empty_list`] first.
///
/// Fails if `column` is not a struct list or an element field name collides with another column.
pub fn explode(table: &ColumnarTable, column: &str) -> FlowResult<ColumnarTable> {
    let list = table.require_column(column)?;
    let fields = list
        .data_type()
        .struct_fields()
        .ok_or_else(|| FlowError::SchemaMismatch {
            message: format!("cannot explode column '{column}' of type {}", list.data_type()),
        })?;

    let mut source_rows: Vec<usize> = Vec::with_capacity(list.len());
    let mut elements: Vec<Option<&Vec<Value>>> = Vec::with_capacity(list.len());
    for (row, value) in list.values().iter().enumerate() {
        match value {
            Value::List(items) if !items.is_empty() => {
                for item in items {
                    source_rows.push(row);
                    elements.push(Some(item));
                }
            }
            _ => {
                source_rows.push(row);
                elements.push(None);
            }
        }
    }

    let mut columns = Vec::with_capacity(table.columns().len() + fields.len());
    for c in table.columns() {
        if c.name() != column {
            columns.push(c.take(&source_rows));
            continue;
        }
        for (idx, field) in fields.iter().enumerate() {
            let values = elements
                .iter()
                .map(|e| e.map(|item| item[idx].clone()).unwrap_or(Value::Null))
                .collect();
            columns.push(Column::new(field.name.clone(), field.data_type.clone(), values));
        }
    }

    ColumnarTable::try_new(columns)
}
