//! Left join of two tables on a single key column.

use std::collections::HashMap;

use crate::error::{ensure_cardinality, FlowError, FlowResult};
use crate::types::{Column, ColumnarTable, DataType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum JoinKey<'a> {
    Utf8(&'a str),
    Int64(i64),
    Bool(bool),
}

pub(crate) fn join_key(value: &Value) -> Option<JoinKey<'_>> {
    match value {
        Value::Utf8(s) => Some(JoinKey::Utf8(s)),
        Value::Int64(v) => Some(JoinKey::Int64(*v)),
        Value::Bool(v) => Some(JoinKey::Bool(*v)),
        _ => None,
    }
}

pub(crate) fn check_key_column(column: &Column) -> FlowResult<()> {
    match column.data_type() {
        DataType::Utf8 | DataType::Int64 | DataType::Bool => Ok(()),
        other => Err(FlowError::SchemaMismatch {
            message: format!("column '{}' of type {other} cannot be a join key", column.name()),
        }),
    }
}

/// Attach `right`'s columns to every row of `left` by matching `left_on` against `right_on`.
///
/// - Every left row appears exactly once and in its original position.
/// - Unmatched and null keys get nulls in the attached columns (nulls never match).
/// - `right_on` itself is not attached.
///
/// `right_on` must be unique among non-null values; otherwise a left row could match several right
/// rows and the join would stop preserving cardinality, so this fails with
/// [`FlowError::DuplicateJoinKey`].
pub fn left_join(
    left: &ColumnarTable,
    right: &ColumnarTable,
    left_on: &str,
    right_on: &str,
) -> FlowResult<ColumnarTable> {
    let left_key = left.require_column(left_on)?;
    let right_key = right.require_column(right_on)?;
    check_key_column(left_key)?;
    check_key_column(right_key)?;
    if left_key.data_type() != right_key.data_type() {
        return Err(FlowError::SchemaMismatch {
            message: format!(
                "join key types differ: '{left_on}' is {}, '{right_on}' is {}",
                left_key.data_type(),
                right_key.data_type()
            ),
        });
    }

    let mut index: HashMap<JoinKey<'_>, usize> = HashMap::with_capacity(right.row_count());
    for (row, value) in right_key.values().iter().enumerate() {
        if let Some(key) = join_key(value) {
            if index.insert(key, row).is_some() {
                return Err(FlowError::DuplicateJoinKey {
                    column: right_on.to_string(),
                    key: value.render(right_key.data_type()),
                });
            }
        }
    }

    let matches: Vec<Option<usize>> = left_key
        .values()
        .iter()
        .map(|v| join_key(v).and_then(|k| index.get(&k).copied()))
        .collect();

    let mut columns = left.columns().to_vec();
    for c in right.columns().iter().filter(|c| c.name() != right_on) {
        let values = matches
            .iter()
            .map(|m| m.map(|r| c.values()[r].clone()).unwrap_or(Value::Null))
            .collect();
        columns.push(Column::new(c.name(), c.data_type().clone(), values));
    }

    let out = ColumnarTable::try_new(columns)?;
    ensure_cardinality("left join", left.row_count(), out.row_count())?;
    Ok(out)
}
