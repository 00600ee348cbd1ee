//! Lookup tables used as join targets.
//!
//! A [`LookupIndex`] wraps a flat table with one identifier column and any number of label
//! columns. The identifier does not have to be unique across the whole index (the same term table
//! can carry several vocabularies), but every [`LookupView`] derived from it maps an identifier to
//! exactly one label.

use std::collections::HashMap;

use crate::error::{FlowError, FlowResult};
use crate::processing::filter;
use crate::types::{ColumnarTable, DataType, Value};

/// A flat table keyed by a `Utf8` identifier column.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupIndex {
    table: ColumnarTable,
    id_column: String,
}

impl LookupIndex {
    /// Wrap `table`, using `id_column` as the identifier.
    pub fn new(table: ColumnarTable, id_column: impl Into<String>) -> FlowResult<Self> {
        let id_column = id_column.into();
        let id = table.require_column(&id_column)?;
        if id.data_type() != &DataType::Utf8 {
            return Err(FlowError::SchemaMismatch {
                message: format!(
                    "lookup identifier '{id_column}' must be {}, found {}",
                    DataType::Utf8,
                    id.data_type()
                ),
            });
        }
        Ok(Self { table, id_column })
    }

    pub fn table(&self) -> &ColumnarTable {
        &self.table
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Identifier → `label_column` over every row of the index.
    pub fn view(&self, label_column: &str) -> FlowResult<LookupView> {
        LookupView::build(label_column.to_string(), &self.table, &self.id_column, label_column)
    }

    /// Identifier → `label_column` over the rows where `column` equals `equals`.
    ///
    /// ```rust
    /// use collection_flow::lookup::LookupIndex;
    /// use collection_flow::types::{Column, ColumnarTable, DataType, Value};
    ///
    /// # fn main() -> Result<(), collection_flow::FlowError> {
    /// let terms = ColumnarTable::try_new(vec![
    ///     Column::new("term_id", DataType::Utf8, vec!["N1".into(), "T1".into()]),
    ///     Column::new("term_type", DataType::Utf8, vec!["nationality".into(), "object_type".into()]),
    ///     Column::new("label", DataType::Utf8, vec!["Dutch".into(), "Painting".into()]),
    /// ])?;
    /// let index = LookupIndex::new(terms, "term_id")?;
    /// let nationality = index.view_where("term_type", "nationality", "label")?;
    ///
    /// assert_eq!(nationality.get("N1"), Some(&Value::from("Dutch")));
    /// assert_eq!(nationality.get("T1"), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn view_where(&self, column: &str, equals: &str, label_column: &str) -> FlowResult<LookupView> {
        let rows = filter(&self.table, column, |v| v.as_str() == Some(equals))?;
        LookupView::build(
            format!("{label_column} where {column} = {equals}"),
            &rows,
            &self.id_column,
            label_column,
        )
    }
}

/// A single-purpose lookup: unique identifier → one label.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupView {
    name: String,
    table: ColumnarTable,
    positions: HashMap<String, usize>,
}

impl LookupView {
    fn build(name: String, source: &ColumnarTable, id_column: &str, label_column: &str) -> FlowResult<Self> {
        let table = filter(&source.select(&[id_column, label_column])?, id_column, |v| !v.is_null())?;

        let ids = table.require_column(id_column)?;
        let mut positions = HashMap::with_capacity(ids.len());
        for (row, id) in ids.values().iter().enumerate() {
            let key = id.as_str().unwrap_or_default().to_string();
            if positions.insert(key.clone(), row).is_some() {
                return Err(FlowError::DuplicateLookupKey { view: name, key });
            }
        }

        Ok(Self {
            name,
            table,
            positions,
        })
    }

    /// Description of what this view maps to (used in plan descriptions and errors).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.row_count() == 0
    }

    /// Type of the label values.
    pub fn label_type(&self) -> &DataType {
        self.table.columns()[1].data_type()
    }

    /// Label for `id`, if the view contains it.
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.positions
            .get(id)
            .map(|&row| &self.table.columns()[1].values()[row])
    }

    /// The view as a two-column join target named `(key, label)`. Values are shared.
    pub(crate) fn join_table(&self, key: &str, label: &str) -> FlowResult<ColumnarTable> {
        let columns = self.table.columns();
        ColumnarTable::try_new(vec![columns[0].renamed(key), columns[1].renamed(label)])
    }
}
