//! One nested enrichment: explode a struct-list column, resolve foreign keys inside its
//! elements against lookup views, and re-nest the result in the original shape.

use std::collections::HashSet;
use std::fmt;

use crate::error::{ensure_cardinality, FlowError, FlowResult};
use crate::lookup::LookupView;
use crate::processing::{explode, fill_null, filter, is_non_empty_list, left_join, nest};
use crate::types::{Column, ColumnarTable, DataType, Field, Schema, Value};

/// Internal column carrying each record's row position through explode and re-nest.
pub(crate) const ROW_ORDINAL: &str = "__row";

/// Resolve one foreign-key field of every element into one label field.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinKeySpec {
    key_field: String,
    lookup: LookupView,
    label_field: String,
}

impl JoinKeySpec {
    /// `key_field` (a `Utf8` element field) is looked up in `lookup`; the result is attached to the
    /// element as `label_field`. Keys without a match get a null label.
    pub fn new(key_field: impl Into<String>, lookup: LookupView, label_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            lookup,
            label_field: label_field.into(),
        }
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    pub fn lookup(&self) -> &LookupView {
        &self.lookup
    }

    pub fn label_field(&self) -> &str {
        &self.label_field
    }
}

/// Enrichment of one struct-list column.
///
/// ```rust
/// use collection_flow::enrichment::{JoinKeySpec, NestedJoin};
/// use collection_flow::lookup::LookupIndex;
/// use collection_flow::types::{Column, ColumnarTable, DataType};
///
/// # fn main() -> Result<(), collection_flow::FlowError> {
/// let terms = ColumnarTable::try_new(vec![
///     Column::new("term_id", DataType::Utf8, vec!["T1".into()]),
///     Column::new("label", DataType::Utf8, vec!["Painting".into()]),
/// ])?;
/// let labels = LookupIndex::new(terms, "term_id")?.view("label")?;
///
/// let join = NestedJoin::on("classification_ids")
///     .output_as("classifications")
///     .resolve(JoinKeySpec::new("type_id", labels.clone(), "type_label"))
///     .resolve(JoinKeySpec::new("term_id", labels, "term_label"))
///     .keep_fields(["type_label", "term_label"]);
/// assert_eq!(join.output_column(), "classifications");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NestedJoin {
    source_column: String,
    output_column: String,
    keys: Vec<JoinKeySpec>,
    projection: Option<Vec<String>>,
}

impl NestedJoin {
    /// Enrich `source_column`; the output keeps the same name unless [`Self::output_as`] is used.
    pub fn on(source_column: impl Into<String>) -> Self {
        let source_column = source_column.into();
        Self {
            output_column: source_column.clone(),
            source_column,
            keys: Vec::new(),
            projection: None,
        }
    }

    /// Name of the enriched column.
    pub fn output_as(mut self, name: impl Into<String>) -> Self {
        self.output_column = name.into();
        self
    }

    /// Add a key to resolve. Keys are resolved in the order they are added.
    pub fn resolve(mut self, key: JoinKeySpec) -> Self {
        self.keys.push(key);
        self
    }

    /// Fields (and their order) of the enriched elements.
    ///
    /// Without a projection the elements keep every source field followed by the label fields.
    pub fn keep_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn source_column(&self) -> &str {
        &self.source_column
    }

    pub fn output_column(&self) -> &str {
        &self.output_column
    }

    pub fn keys(&self) -> &[JoinKeySpec] {
        &self.keys
    }

    /// Type of the enriched column for an input table shaped like `schema`.
    ///
    /// This is where configuration defects surface: a missing or non-list source column, a key
    /// field that is absent or not `Utf8`, a label field that collides with an existing field, or
    /// a projection naming an unknown field.
    pub fn output_type(&self, schema: &Schema) -> FlowResult<DataType> {
        let source = schema
            .field(&self.source_column)
            .ok_or_else(|| FlowError::ColumnNotFound {
                column: self.source_column.clone(),
            })?;
        let source_fields = source
            .data_type
            .struct_fields()
            .ok_or_else(|| FlowError::SchemaMismatch {
                message: format!(
                    "nested join source '{}' is {}, expected a struct list",
                    self.source_column, source.data_type
                ),
            })?;
        if self.keys.is_empty() {
            return Err(FlowError::SchemaMismatch {
                message: format!("nested join on '{}' resolves no keys", self.source_column),
            });
        }

        let mut fields: Vec<Field> = source_fields.to_vec();
        for key in &self.keys {
            let key_field = fields
                .iter()
                .find(|f| f.name == key.key_field)
                .ok_or_else(|| self.field_not_found(&key.key_field))?;
            if key_field.data_type != DataType::Utf8 {
                return Err(FlowError::SchemaMismatch {
                    message: format!(
                        "key field '{}.{}' is {}, expected {}",
                        self.source_column,
                        key.key_field,
                        key_field.data_type,
                        DataType::Utf8
                    ),
                });
            }
            if fields.iter().any(|f| f.name == key.label_field) {
                return Err(FlowError::DuplicateColumn {
                    column: format!("{}.{}", self.source_column, key.label_field),
                });
            }
            fields.push(Field::new(key.label_field.clone(), key.lookup.label_type().clone()));
        }

        let Some(projection) = &self.projection else {
            return Ok(DataType::StructList(fields));
        };
        let mut seen = HashSet::with_capacity(projection.len());
        let mut projected = Vec::with_capacity(projection.len());
        for name in projection {
            if !seen.insert(name.as_str()) {
                return Err(FlowError::DuplicateColumn {
                    column: format!("{}.{name}", self.output_column),
                });
            }
            let field = fields
                .iter()
                .find(|f| &f.name == name)
                .ok_or_else(|| self.field_not_found(name))?;
            projected.push(field.clone());
        }
        Ok(DataType::StructList(projected))
    }

    /// Element field names that are exploded next to the row ordinal.
    pub(crate) fn exploded_field_names(&self, schema: &Schema) -> Vec<String> {
        let mut names: Vec<String> = schema
            .field(&self.source_column)
            .and_then(|f| f.data_type.struct_fields())
            .map(|fields| fields.iter().map(|f| f.name.clone()).collect())
            .unwrap_or_default();
        names.extend(self.keys.iter().map(|k| k.label_field.clone()));
        names
    }

    /// Run explode → join → re-nest for every record of `objects`.
    ///
    /// Elements find their way back to their record through its row position, so record
    /// identifiers may be null or repeated. Returns the enriched column, one value per record in
    /// `objects` order. Records whose list was empty or null get an empty list, never a null.
    pub(crate) fn execute(&self, objects: &ColumnarTable) -> FlowResult<Column> {
        let output_type = self.output_type(objects.schema())?;
        let element_fields: Vec<&str> = output_type
            .struct_fields()
            .unwrap_or(&[])
            .iter()
            .map(|f| f.name.as_str())
            .collect();

        let ordinals = ColumnarTable::try_new(vec![Column::new(
            ROW_ORDINAL,
            DataType::Int64,
            (0..objects.row_count()).map(|row| Value::Int64(row as i64)).collect(),
        )])?;
        let subset = ColumnarTable::try_new(vec![
            ordinals.require_column(ROW_ORDINAL)?.clone(),
            objects.require_column(&self.source_column)?.clone(),
        ])?;

        // Empty lists are set aside; exploding them would yield placeholder rows of nulls.
        let non_empty = filter(&subset, &self.source_column, is_non_empty_list)?;

        let mut flat = explode(&non_empty, &self.source_column)?;
        let element_rows = flat.row_count();
        for key in &self.keys {
            let target = key.lookup.join_table(&key.key_field, &key.label_field)?;
            flat = left_join(&flat, &target, &key.key_field, &key.key_field)?;
        }
        ensure_cardinality(
            &format!("nested join on '{}' (exploded rows)", self.source_column),
            element_rows,
            flat.row_count(),
        )?;

        let nested = nest(&flat, ROW_ORDINAL, &element_fields, &self.output_column)?;
        ensure_cardinality(
            &format!("nested join on '{}' (re-nest)", self.source_column),
            non_empty.row_count(),
            nested.row_count(),
        )?;

        let reattached = left_join(&ordinals, &nested, ROW_ORDINAL, ROW_ORDINAL)?;
        let enriched = fill_null(&reattached, &self.output_column, &Value::List(Vec::new()))?;

        let stage = format!("nested join on '{}'", self.source_column);
        ensure_cardinality(&stage, objects.row_count(), enriched.row_count())?;
        if enriched.require_column(ROW_ORDINAL)?.values() != ordinals.require_column(ROW_ORDINAL)?.values() {
            return Err(FlowError::CardinalityViolation {
                stage: format!("{stage} (record order)"),
                expected: objects.row_count(),
                actual: enriched.row_count(),
            });
        }

        Ok(enriched.require_column(&self.output_column)?.clone())
    }

    fn field_not_found(&self, field: &str) -> FlowError {
        FlowError::FieldNotFound {
            column: self.source_column.clone(),
            field: field.to_string(),
        }
    }
}

impl fmt::Display for NestedJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NESTED JOIN {} -> {}", self.source_column, self.output_column)?;
        for key in &self.keys {
            write!(
                f,
                "\n    RESOLVE {} => {} VIA [{}] ({} ids)",
                key.key_field,
                key.label_field,
                key.lookup.name(),
                key.lookup.len()
            )?;
        }
        if let Some(projection) = &self.projection {
            write!(f, "\n    KEEP {}", projection.join(", "))?;
        }
        Ok(())
    }
}
