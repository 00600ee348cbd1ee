//! Schema descriptors: declared column shapes, nullability and named checks, plus derived views.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, FlowResult};
use crate::types::{DataType, Field, Schema};
use crate::validation::{FramePredicate, Predicate};

/// A named column-level check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub predicate: Predicate,
}

/// A named dataframe-wide check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameCheck {
    pub name: String,
    pub predicate: FramePredicate,
}

/// Expectations for one column: its shape, whether it may hold nulls, and an ordered list of checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub checks: Vec<Check>,
}

impl ColumnSpec {
    /// A non-nullable column with no checks.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
            checks: Vec::new(),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Append a check; checks run in the order they are added.
    pub fn check(mut self, name: impl Into<String>, predicate: Predicate) -> Self {
        self.checks.push(Check {
            name: name.into(),
            predicate,
        });
        self
    }
}

#[derive(Deserialize)]
struct SchemaConfig {
    columns: Vec<ColumnSpec>,
    #[serde(default)]
    frame_checks: Vec<FrameCheck>,
    #[serde(default)]
    strict: bool,
}

/// Declared expectations for a whole table.
///
/// A descriptor is static configuration: build it with [`SchemaDescriptor::builder`] or load it from
/// JSON. Either way it is checked on construction (unique names, predicates that fit the declared
/// types, dataframe-wide checks that only reference declared columns), so a descriptor that exists
/// is internally consistent.
///
/// ```rust
/// use collection_flow::types::DataType;
/// use collection_flow::validation::{ColumnSpec, Predicate, SchemaDescriptor};
///
/// # fn main() -> Result<(), collection_flow::FlowError> {
/// let schema = SchemaDescriptor::builder()
///     .column(ColumnSpec::new("object_id", DataType::Utf8).check("unique", Predicate::Unique))
///     .column(ColumnSpec::new("date_made", DataType::Int64).nullable())
///     .build()?;
///
/// let same = SchemaDescriptor::from_json_str(&serde_json::to_string(&schema)?)?;
/// assert_eq!(schema, same);
/// assert!(schema.dtype_only().columns().iter().all(|c| c.checks.is_empty()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaConfig")]
pub struct SchemaDescriptor {
    columns: Vec<ColumnSpec>,
    frame_checks: Vec<FrameCheck>,
    strict: bool,
}

impl TryFrom<SchemaConfig> for SchemaDescriptor {
    type Error = FlowError;

    fn try_from(config: SchemaConfig) -> FlowResult<Self> {
        Self::try_new(config.columns, config.frame_checks, config.strict)
    }
}

impl SchemaDescriptor {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn try_new(columns: Vec<ColumnSpec>, frame_checks: Vec<FrameCheck>, strict: bool) -> FlowResult<Self> {
        let schema = Self {
            columns,
            frame_checks,
            strict,
        };
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_json_str(json: &str) -> FlowResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_reader<R: std::io::Read>(reader: R) -> FlowResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn frame_checks(&self) -> &[FrameCheck] {
        &self.frame_checks
    }

    /// Whether columns the descriptor does not declare are failures.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// The declared table shape.
    pub fn table_schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| Field::new(c.name.clone(), c.data_type.clone()))
                .collect(),
        )
    }

    /// Same columns, types and nullability; no checks of any kind.
    pub fn dtype_only(&self) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| ColumnSpec {
                    checks: Vec::new(),
                    ..c.clone()
                })
                .collect(),
            frame_checks: Vec::new(),
            strict: self.strict,
        }
    }

    /// Every column's type and nullability, but checks only on `columns`.
    ///
    /// Dataframe-wide checks are kept when every column they read is in `columns`.
    pub fn with_checks_only(&self, columns: &[&str]) -> Self {
        let keep = |name: &str| columns.contains(&name);
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| ColumnSpec {
                    checks: if keep(&c.name) { c.checks.clone() } else { Vec::new() },
                    ..c.clone()
                })
                .collect(),
            frame_checks: self
                .frame_checks
                .iter()
                .filter(|f| f.predicate.columns().into_iter().all(keep))
                .cloned()
                .collect(),
            strict: self.strict,
        }
    }

    fn validate(&self) -> FlowResult<()> {
        let mut names = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if !names.insert(column.name.as_str()) {
                return Err(invalid(format!("column '{}' is declared twice", column.name)));
            }
            check_struct_fields(&column.name, &column.data_type)?;

            let mut checks = HashSet::with_capacity(column.checks.len());
            for check in &column.checks {
                if !checks.insert(check.name.as_str()) {
                    return Err(invalid(format!(
                        "check '{}' is declared twice on column '{}'",
                        check.name, column.name
                    )));
                }
                check
                    .predicate
                    .check_applicable(&column.data_type)
                    .map_err(|message| invalid(format!("check '{}' on column '{}': {message}", check.name, column.name)))?;
            }
        }

        let shape = self.table_schema();
        let mut frame_names = HashSet::with_capacity(self.frame_checks.len());
        for check in &self.frame_checks {
            if !frame_names.insert(check.name.as_str()) {
                return Err(invalid(format!("dataframe check '{}' is declared twice", check.name)));
            }
            check
                .predicate
                .check_applicable(&shape)
                .map_err(|message| invalid(format!("dataframe check '{}': {message}", check.name)))?;
        }
        Ok(())
    }
}

/// Incremental construction of a [`SchemaDescriptor`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    columns: Vec<ColumnSpec>,
    frame_checks: Vec<FrameCheck>,
    strict: bool,
}

impl SchemaBuilder {
    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn frame_check(mut self, name: impl Into<String>, predicate: FramePredicate) -> Self {
        self.frame_checks.push(FrameCheck {
            name: name.into(),
            predicate,
        });
        self
    }

    /// Report columns that are present in the table but not declared.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(self) -> FlowResult<SchemaDescriptor> {
        SchemaDescriptor::try_new(self.columns, self.frame_checks, self.strict)
    }
}

fn invalid(message: String) -> FlowError {
    FlowError::InvalidSchema { message }
}

fn check_struct_fields(column: &str, data_type: &DataType) -> FlowResult<()> {
    if let Some(fields) = data_type.struct_fields() {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in fields {
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!("column '{column}' declares field '{}' twice", field.name)));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::ReduceOp;
    use crate::validation::{Comparison, Condition, Operand, RowTest};

    fn dims() -> DataType {
        DataType::struct_list(vec![
            Field::new("type", DataType::Utf8),
            Field::new("value", DataType::Float64),
        ])
    }

    fn sculpture_has_depth() -> FramePredicate {
        FramePredicate::Implies {
            premise: RowTest::Value {
                column: "department".into(),
                condition: Condition::Equals("Sculpture".into()),
            },
            conclusion: RowTest::ListAny {
                column: "dimensions".into(),
                field: "type".into(),
                condition: Condition::Equals("depth".into()),
            },
        }
    }

    fn full() -> SchemaDescriptor {
        SchemaDescriptor::builder()
            .column(ColumnSpec::new("object_id", DataType::Utf8).check("unique", Predicate::Unique))
            .column(ColumnSpec::new("department", DataType::Utf8))
            .column(
                ColumnSpec::new("dimensions", dims()).check(
                    "all_dimension_values_gt_1",
                    Predicate::ListAll {
                        field: "value".into(),
                        condition: Condition::Gt(1.0),
                    },
                ),
            )
            .frame_check("sculpture_must_have_depth", sculpture_has_depth())
            .build()
            .unwrap()
    }

    #[test]
    fn views_share_one_declaration() {
        let schema = full();

        let dtype = schema.dtype_only();
        assert_eq!(dtype.table_schema(), schema.table_schema());
        assert!(dtype.columns().iter().all(|c| c.checks.is_empty()));
        assert!(dtype.frame_checks().is_empty());

        let flat = schema.with_checks_only(&["object_id", "department"]);
        assert_eq!(flat.column("object_id").unwrap().checks.len(), 1);
        assert!(flat.column("dimensions").unwrap().checks.is_empty());
        assert!(flat.frame_checks().is_empty());

        let with_frame = schema.with_checks_only(&["department", "dimensions"]);
        assert_eq!(with_frame.frame_checks().len(), 1);
    }

    #[test]
    fn duplicate_check_names_are_rejected_per_column_only() {
        let err = SchemaDescriptor::builder()
            .column(
                ColumnSpec::new("a", DataType::Utf8)
                    .check("c", Predicate::Unique)
                    .check("c", Predicate::Unique),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidSchema { .. }));

        SchemaDescriptor::builder()
            .column(ColumnSpec::new("a", DataType::Utf8).check("c", Predicate::Unique))
            .column(ColumnSpec::new("b", DataType::Utf8).check("c", Predicate::Unique))
            .build()
            .unwrap();
    }

    #[test]
    fn predicate_must_fit_the_declared_type() {
        let err = SchemaDescriptor::builder()
            .column(ColumnSpec::new("dimensions", dims()).check(
                "bad",
                Predicate::ListAll {
                    field: "missing".into(),
                    condition: Condition::NotNull,
                },
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidSchema { ref message } if message.contains("missing")));
    }

    #[test]
    fn frame_check_must_reference_declared_columns() {
        let err = SchemaDescriptor::builder()
            .column(ColumnSpec::new("department", DataType::Utf8))
            .frame_check("sculpture_must_have_depth", sculpture_has_depth())
            .build()
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidSchema { ref message } if message.contains("dimensions")));
    }

    #[test]
    fn frame_check_conditions_must_fit_declared_types() {
        let base = || {
            SchemaDescriptor::builder()
                .column(ColumnSpec::new("title", DataType::Utf8))
                .column(ColumnSpec::new("date_made", DataType::Int64).nullable())
                .column(ColumnSpec::new("dimensions", dims()))
        };

        let err = base()
            .frame_check(
                "date_is_text",
                FramePredicate::Implies {
                    premise: RowTest::Value {
                        column: "date_made".into(),
                        condition: Condition::Equals("x".into()),
                    },
                    conclusion: RowTest::Value {
                        column: "title".into(),
                        condition: Condition::Gt(5.0),
                    },
                },
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidSchema { ref message } if message.contains("date_is_text")));

        let err = base()
            .frame_check(
                "max_of_text",
                FramePredicate::Compare {
                    left: Operand::ListReduce {
                        column: "dimensions".into(),
                        field: "type".into(),
                        op: ReduceOp::Max,
                    },
                    op: Comparison::Lt,
                    right: Operand::Column {
                        column: "date_made".into(),
                    },
                },
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidSchema { ref message } if message.contains("dimensions.type")));
    }

    #[test]
    fn repeated_struct_field_is_rejected() {
        let doubled = DataType::struct_list(vec![
            Field::new("type", DataType::Utf8),
            Field::new("type", DataType::Utf8),
        ]);
        let err = SchemaDescriptor::builder()
            .column(ColumnSpec::new("dimensions", doubled))
            .build()
            .unwrap_err();
        assert!(
            matches!(err, FlowError::InvalidSchema { ref message } if message == "column 'dimensions' declares field 'type' twice")
        );

        let json = r#"{"columns": [{"name": "media", "data_type": {"struct_list": [
            {"name": "url", "data_type": "utf8"}, {"name": "url", "data_type": "utf8"}]}}]}"#;
        let err = SchemaDescriptor::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("declares field 'url' twice"));
    }

    #[test]
    fn json_round_trip_revalidates() {
        let schema = full();
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(SchemaDescriptor::from_json_str(&json).unwrap(), schema);

        let bad = r#"{"columns": [{"name": "a", "data_type": "utf8"}, {"name": "a", "data_type": "int64"}]}"#;
        assert!(SchemaDescriptor::from_json_str(bad).is_err());
    }
}
