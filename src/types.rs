//! Core data model: an immutable, columnar table whose columns may hold nested lists of records.
//!
//! A [`ColumnarTable`] is an ordered set of uniquely named [`Column`]s of equal length. Row `i` of
//! every column belongs to the same record; row order carries correspondence, not meaning.
//! Column values live behind an [`Arc`], so deriving a table from another (selecting, joining,
//! passing columns through) shares the untouched columns instead of copying them.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, FlowResult};

/// Logical data type of a column or of a struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Ordered list of fixed-shape records ("struct list").
    StructList(Vec<Field>),
}

impl DataType {
    /// Convenience constructor for a struct-list type.
    pub fn struct_list(fields: Vec<Field>) -> Self {
        Self::StructList(fields)
    }

    /// Element fields if this is a struct-list type.
    pub fn struct_fields(&self) -> Option<&[Field]> {
        match self {
            Self::StructList(fields) => Some(fields),
            _ => None,
        }
    }

    /// Position of an element field inside a struct-list type.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.struct_fields()?.iter().position(|f| f.name == name)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64 => f.write_str("i64"),
            Self::Float64 => f.write_str("f64"),
            Self::Bool => f.write_str("bool"),
            Self::Utf8 => f.write_str("str"),
            Self::StructList(fields) => {
                f.write_str("list[struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.data_type)?;
                }
                f.write_str("}]")
            }
        }
    }
}

/// A single named, typed field of a [`Schema`] or of a struct-list element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields describing the shape of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns a field by name, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single typed value.
///
/// A struct-list value is a list of positional records: element `e[i]` belongs to field `i` of the
/// column's [`DataType::StructList`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// List of records.
    List(Vec<Vec<Value>>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of integer and float values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Vec<Value>]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` if the value may be stored in a column of `data_type`.
    ///
    /// `Null` conforms to every type.
    pub fn conforms_to(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (Self::Null, _) => true,
            (Self::Int64(_), DataType::Int64)
            | (Self::Float64(_), DataType::Float64)
            | (Self::Bool(_), DataType::Bool)
            | (Self::Utf8(_), DataType::Utf8) => true,
            (Self::List(items), DataType::StructList(fields)) => items.iter().all(|item| {
                item.len() == fields.len()
                    && item
                        .iter()
                        .zip(fields)
                        .all(|(v, f)| v.conforms_to(&f.data_type))
            }),
            _ => false,
        }
    }

    /// Human-readable rendering using `data_type` for struct field names.
    ///
    /// `[{type: height, value: 0.5, unit: cm}]`
    pub fn render(&self, data_type: &DataType) -> String {
        let mut out = String::new();
        self.render_into(data_type, &mut out);
        out
    }

    fn render_into(&self, data_type: &DataType, out: &mut String) {
        use std::fmt::Write;

        match self {
            Self::Null => out.push_str("null"),
            Self::Int64(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Float64(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Bool(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Utf8(s) => out.push_str(s),
            Self::List(items) => {
                let fields = data_type.struct_fields().unwrap_or(&[]);
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push('{');
                    for (j, v) in item.iter().enumerate() {
                        if j > 0 {
                            out.push_str(", ");
                        }
                        match fields.get(j) {
                            Some(field) => {
                                out.push_str(&field.name);
                                out.push_str(": ");
                                v.render_into(&field.data_type, out);
                            }
                            None => v.render_into(&DataType::Utf8, out),
                        }
                    }
                    out.push('}');
                }
                out.push(']');
            }
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Utf8(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// A named, typed column of shared, immutable values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    field: Field,
    values: Arc<[Value]>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, values: Vec<Value>) -> Self {
        Self {
            field: Field::new(name, data_type),
            values: values.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.field.data_type
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Same values under a new name (values are shared, not copied).
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            field: Field::new(name, self.field.data_type.clone()),
            values: Arc::clone(&self.values),
        }
    }

    /// New column holding the values at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Self {
        let values: Vec<Value> = indices.iter().map(|&i| self.values[i].clone()).collect();
        Self {
            field: self.field.clone(),
            values: values.into(),
        }
    }
}

/// Immutable columnar table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnarTable {
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl ColumnarTable {
    /// Build a table from columns.
    ///
    /// Fails if column names repeat, lengths differ, struct field names repeat, or any value
    /// does not conform to its column's type.
    pub fn try_new(columns: Vec<Column>) -> FlowResult<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::with_capacity(columns.len());

        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(FlowError::DuplicateColumn {
                    column: column.name().to_string(),
                });
            }
            check_struct_fields(column.name(), column.data_type())?;
            if column.len() != row_count {
                return Err(FlowError::LengthMismatch {
                    column: column.name().to_string(),
                    expected: row_count,
                    actual: column.len(),
                });
            }
            if let Some(row) = column
                .values()
                .iter()
                .position(|v| !v.conforms_to(column.data_type()))
            {
                return Err(FlowError::TypeMismatch {
                    column: column.name().to_string(),
                    row,
                    expected: column.data_type().to_string(),
                });
            }
        }

        let schema = Schema::new(columns.iter().map(|c| c.field().clone()).collect());
        Ok(Self {
            schema,
            columns,
            row_count,
        })
    }

    /// Build a table from row-major values laid out in `schema` order.
    pub fn from_rows(schema: Schema, rows: Vec<Vec<Value>>) -> FlowResult<Self> {
        let width = schema.fields.len();
        let mut buffers: Vec<Vec<Value>> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(FlowError::SchemaMismatch {
                    message: format!("row {row_idx} has {} values, schema has {width} fields", row.len()),
                });
            }
            for (buffer, value) in buffers.iter_mut().zip(row) {
                buffer.push(value);
            }
        }

        let columns = schema
            .fields
            .into_iter()
            .zip(buffers)
            .map(|(field, values)| Column::new(field.name, field.data_type, values))
            .collect();
        Self::try_new(columns)
    }

    /// A table with the given shape and no rows.
    pub fn empty(schema: Schema) -> Self {
        let columns = schema
            .fields
            .iter()
            .map(|f| Column::new(f.name.clone(), f.data_type.clone(), Vec::new()))
            .collect();
        Self {
            schema,
            columns,
            row_count: 0,
        }
    }

    /// Number of rows in the table.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Like [`Self::column`], but missing columns are an error.
    pub fn require_column(&self, name: &str) -> FlowResult<&Column> {
        self.column(name).ok_or_else(|| FlowError::ColumnNotFound {
            column: name.to_string(),
        })
    }

    /// Values of row `row` in schema order.
    pub fn row(&self, row: usize) -> Option<Vec<&Value>> {
        if row >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values()[row]).collect())
    }

    /// New table with only `names`, in that order. Column values are shared.
    pub fn select(&self, names: &[&str]) -> FlowResult<Self> {
        let columns = names
            .iter()
            .map(|name| self.require_column(name).cloned())
            .collect::<FlowResult<Vec<_>>>()?;
        Self::try_new(columns).map(|t| t.with_row_count(self.row_count))
    }

    /// New table holding rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            schema: self.schema.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            row_count: indices.len(),
        }
    }

    /// Create a new table containing only rows for which `predicate(row_index)` is `true`.
    ///
    /// The returned table preserves the original schema and row order.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(usize) -> bool,
    {
        let keep: Vec<usize> = (0..self.row_count).filter(|&i| predicate(i)).collect();
        self.take(&keep)
    }

    // A selection of zero columns still has the parent's rows.
    fn with_row_count(mut self, row_count: usize) -> Self {
        if self.columns.is_empty() {
            self.row_count = row_count;
        }
        self
    }
}

fn check_struct_fields(column: &str, data_type: &DataType) -> FlowResult<()> {
    if let DataType::StructList(fields) = data_type {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in fields {
            if !seen.insert(field.name.as_str()) {
                return Err(FlowError::DuplicateColumn {
                    column: format!("{column}.{}", field.name),
                });
            }
            check_struct_fields(column, &field.data_type)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims_type() -> DataType {
        DataType::struct_list(vec![
            Field::new("type", DataType::Utf8),
            Field::new("value", DataType::Float64),
        ])
    }

    fn sample_table() -> ColumnarTable {
        ColumnarTable::try_new(vec![
            Column::new("id", DataType::Utf8, vec!["a".into(), "b".into()]),
            Column::new(
                "dims",
                dims_type(),
                vec![
                    Value::List(vec![vec!["height".into(), 0.5.into()]]),
                    Value::List(vec![]),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn schema_index_of_works() {
        let t = sample_table();
        assert_eq!(t.schema().index_of("id"), Some(0));
        assert_eq!(t.schema().index_of("dims"), Some(1));
        assert_eq!(t.schema().index_of("missing"), None);
    }

    #[test]
    fn try_new_rejects_length_mismatch() {
        let err = ColumnarTable::try_new(vec![
            Column::new("a", DataType::Int64, vec![Value::Int64(1)]),
            Column::new("b", DataType::Int64, vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, FlowError::LengthMismatch { .. }));
    }

    #[test]
    fn try_new_rejects_duplicate_names_and_bad_values() {
        let err = ColumnarTable::try_new(vec![
            Column::new("a", DataType::Int64, vec![]),
            Column::new("a", DataType::Utf8, vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, FlowError::DuplicateColumn { .. }));

        let err = ColumnarTable::try_new(vec![Column::new(
            "dims",
            dims_type(),
            vec![Value::List(vec![vec!["height".into()]])],
        )])
        .unwrap_err();
        assert!(matches!(err, FlowError::TypeMismatch { row: 0, .. }));
    }

    #[test]
    fn select_shares_values_and_keeps_order() {
        let t = sample_table();
        let s = t.select(&["dims", "id"]).unwrap();
        assert_eq!(s.schema().field_names().collect::<Vec<_>>(), vec!["dims", "id"]);
        assert_eq!(s.row_count(), 2);
        assert_eq!(s.column("id"), t.column("id"));
    }

    #[test]
    fn filter_rows_preserves_order() {
        let t = sample_table();
        let out = t.filter_rows(|i| i == 1);
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.column("id").unwrap().values(), &[Value::from("b")]);
        assert_eq!(t.row_count(), 2);
    }

    #[test]
    fn render_uses_struct_field_names() {
        let t = sample_table();
        let col = t.column("dims").unwrap();
        assert_eq!(col.values()[0].render(col.data_type()), "[{type: height, value: 0.5}]");
        assert_eq!(col.values()[1].render(col.data_type()), "[]");
        assert_eq!(Value::Null.render(&DataType::Utf8), "null");
    }

    #[test]
    fn data_type_display_describes_nested_shape() {
        assert_eq!(dims_type().to_string(), "list[struct{type: str, value: f64}]");
    }
}
