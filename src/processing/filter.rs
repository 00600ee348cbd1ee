//! Row filtering for [`crate::types::ColumnarTable`].

use crate::error::FlowResult;
use crate::types::{ColumnarTable, Value};

/// Returns a new table containing only rows whose value in `column` satisfies `predicate`.
///
/// Row order is preserved and column values of kept rows are unchanged.
pub fn filter<F>(table: &ColumnarTable, column: &str, mut predicate: F) -> FlowResult<ColumnarTable>
where
    F: FnMut(&Value) -> bool,
{
    let values = table.require_column(column)?.values();
    Ok(table.filter_rows(|row| predicate(&values[row])))
}

/// `true` for a list value with at least one element.
pub fn is_non_empty_list(value: &Value) -> bool {
    matches!(value, Value::List(items) if !items.is_empty())
}
