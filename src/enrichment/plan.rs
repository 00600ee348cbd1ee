//! The lazy enrichment plan: nested joins over one objects table, run by a single materialization.

use std::collections::HashSet;
use std::fmt;

use crate::enrichment::nested::ROW_ORDINAL;
use crate::enrichment::NestedJoin;
use crate::error::{ensure_cardinality, FlowError, FlowResult};
use crate::execution::{ExecutionEngine, ExecutionEvent, ExecutionOptions, Stage};
use crate::types::{Column, ColumnarTable, Field, Schema};

/// A lazy description of how to enrich an objects table.
///
/// Nothing runs until [`Self::materialize`] (or [`Self::materialize_with`]); building the plan only
/// checks that every join fits the objects table. Every shape or configuration defect is reported
/// here, so a plan that builds can only fail to materialize on an internal invariant.
#[derive(Debug, Clone)]
pub struct EnrichmentPlan {
    objects: ColumnarTable,
    id_column: String,
    joins: Vec<NestedJoin>,
}

impl EnrichmentPlan {
    /// Start a plan over `objects`, whose records are identified by `id_column`.
    ///
    /// The identifier passes through untouched and no join may replace it. Its values are not
    /// judged here: null or repeated identifiers are data problems for validation to report.
    pub fn new(objects: &ColumnarTable, id_column: impl Into<String>) -> FlowResult<Self> {
        let id_column = id_column.into();
        objects.require_column(&id_column)?;
        Ok(Self {
            objects: objects.clone(),
            id_column,
            joins: Vec::new(),
        })
    }

    /// Add a nested join. Joins run independently; their outputs are appended in the order added.
    pub fn with_nested_join(mut self, join: NestedJoin) -> FlowResult<Self> {
        let schema = self.objects.schema();
        join.output_type(schema)?;

        if join.source_column() == self.id_column || join.output_column() == self.id_column {
            return Err(FlowError::SchemaMismatch {
                message: format!(
                    "nested join on '{}' would replace record identifier '{}'",
                    join.source_column(),
                    self.id_column
                ),
            });
        }
        if join.exploded_field_names(schema).iter().any(|f| f == ROW_ORDINAL) {
            return Err(FlowError::SchemaMismatch {
                message: format!("nested join on '{}' uses reserved field name '{ROW_ORDINAL}'", join.source_column()),
            });
        }
        if self.joins.iter().any(|j| j.source_column() == join.source_column()) {
            return Err(FlowError::SchemaMismatch {
                message: format!("column '{}' is already enriched by this plan", join.source_column()),
            });
        }

        self.joins.push(join);
        let mut names = HashSet::new();
        for name in self.output_names() {
            if !names.insert(name) {
                return Err(FlowError::DuplicateColumn {
                    column: name.to_string(),
                });
            }
        }
        Ok(self)
    }

    pub fn objects(&self) -> &ColumnarTable {
        &self.objects
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn nested_joins(&self) -> &[NestedJoin] {
        &self.joins
    }

    /// Shape of the materialized table: columns that no join consumes, in their original order,
    /// followed by one enriched column per join.
    pub fn output_schema(&self) -> FlowResult<Schema> {
        let mut fields: Vec<Field> = self
            .passthrough()
            .map(|column| column.field().clone())
            .collect();
        for join in &self.joins {
            fields.push(Field::new(
                join.output_column(),
                join.output_type(self.objects.schema())?,
            ));
        }
        Ok(Schema::new(fields))
    }

    /// Run the plan with default [`ExecutionOptions`].
    pub fn materialize(&self) -> FlowResult<ColumnarTable> {
        let engine = ExecutionEngine::new(ExecutionOptions::default())?;
        self.materialize_with(&engine)
    }

    /// Run the plan on `engine`, one task per nested join.
    ///
    /// The output has exactly one row per input record, in input order.
    pub fn materialize_with(&self, engine: &ExecutionEngine) -> FlowResult<ColumnarTable> {
        let enriched = engine.run_ordered(
            Stage::Enrichment,
            &self.joins,
            |join| join.output_column().to_string(),
            |join| join.execute(&self.objects),
        );

        let mut columns: Vec<Column> = self.passthrough().cloned().collect();
        for column in enriched {
            columns.push(column?);
        }
        let table = ColumnarTable::try_new(columns)?;
        ensure_cardinality("enrichment plan", self.objects.row_count(), table.row_count())?;

        engine.emit(ExecutionEvent::Materialized {
            rows: table.row_count(),
            columns: table.columns().len(),
        });
        Ok(table)
    }

    fn passthrough(&self) -> impl Iterator<Item = &Column> {
        self.objects
            .columns()
            .iter()
            .filter(|column| !self.joins.iter().any(|j| j.source_column() == column.name()))
    }

    fn output_names(&self) -> impl Iterator<Item = &str> {
        self.passthrough()
            .map(Column::name)
            .chain(self.joins.iter().map(NestedJoin::output_column))
    }
}

impl fmt::Display for EnrichmentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ENRICH {} records BY {}",
            self.objects.row_count(),
            self.id_column
        )?;
        let passthrough: Vec<&str> = self.passthrough().map(Column::name).collect();
        write!(f, "\n  PASS {}", passthrough.join(", "))?;
        for join in &self.joins {
            write!(f, "\n  {join}")?;
        }
        Ok(())
    }
}
