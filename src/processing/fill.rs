//! Null replacement.

use crate::error::{FlowError, FlowResult};
use crate::types::{Column, ColumnarTable, Value};

/// Replace every null in `column` with `value`; other columns are shared unchanged.
pub fn fill_null(table: &ColumnarTable, column: &str, value: &Value) -> FlowResult<ColumnarTable> {
    let target = table.require_column(column)?;
    if !value.conforms_to(target.data_type()) {
        return Err(FlowError::SchemaMismatch {
            message: format!(
                "fill value {} does not conform to column '{column}' of type {}",
                value.render(target.data_type()),
                target.data_type()
            ),
        });
    }

    let columns = table
        .columns()
        .iter()
        .map(|c| {
            if c.name() != column {
                return c.clone();
            }
            let values = c
                .values()
                .iter()
                .map(|v| if v.is_null() { value.clone() } else { v.clone() })
                .collect();
            Column::new(c.name(), c.data_type().clone(), values)
        })
        .collect();

    ColumnarTable::try_new(columns)
}
