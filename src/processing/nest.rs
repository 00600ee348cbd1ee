//! Re-nest exploded rows into a struct-list column (the inverse of [`super::explode()`]).

use std::collections::HashMap;

use crate::error::FlowResult;
use crate::types::{Column, ColumnarTable, DataType, Field, Value};

use super::join::{check_key_column, join_key, JoinKey};

/// Group rows by `by` and pack the `fields` columns of each group into one struct-list column
/// named `into`.
///
/// Groups appear in first-appearance order of their key; elements inside a group keep the order of
/// their rows. The output has exactly two columns, `by` and `into`, and one row per distinct key
/// (a null key forms its own group).
pub fn nest(table: &ColumnarTable, by: &str, fields: &[&str], into: &str) -> FlowResult<ColumnarTable> {
    let key = table.require_column(by)?;
    check_key_column(key)?;
    let members = fields
        .iter()
        .map(|f| table.require_column(f))
        .collect::<FlowResult<Vec<_>>>()?;

    let mut groups: HashMap<Option<JoinKey<'_>>, usize> = HashMap::new();
    let mut first_rows: Vec<usize> = Vec::new();
    let mut elements: Vec<Vec<Vec<Value>>> = Vec::new();

    for (row, value) in key.values().iter().enumerate() {
        let group = *groups.entry(join_key(value)).or_insert_with(|| {
            first_rows.push(row);
            elements.push(Vec::new());
            elements.len() - 1
        });
        elements[group].push(members.iter().map(|c| c.values()[row].clone()).collect());
    }

    let element_type = DataType::struct_list(
        members
            .iter()
            .map(|c| Field::new(c.name(), c.data_type().clone()))
            .collect(),
    );

    ColumnarTable::try_new(vec![
        key.take(&first_rows),
        Column::new(into, element_type, elements.into_iter().map(Value::List).collect()),
    ])
}
