//! The validation engine and the deduplicated report it produces.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, FlowResult};
use crate::execution::{ExecutionEngine, ExecutionEvent, ExecutionObserver, ExecutionOptions, Stage};
use crate::types::{Column, ColumnarTable};
use crate::validation::{ColumnSpec, FrameCheck, SchemaDescriptor};

/// Failure name for a declared column that is absent from the table.
pub const COLUMN_IN_DATAFRAME: &str = "column_in_dataframe";
/// Failure name for a column whose shape differs from the declared one.
pub const DTYPE: &str = "dtype";
/// Failure name for a null in a column declared non-nullable.
pub const NOT_NULLABLE: &str = "not_nullable";
/// Failure name for an undeclared column under a strict descriptor.
pub const COLUMN_IN_SCHEMA: &str = "column_in_schema";

/// Configuration for the [`ValidationEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    pub execution: ExecutionOptions,
    /// Failure examples are cut to this many characters.
    pub max_example_chars: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            execution: ExecutionOptions::default(),
            max_example_chars: 80,
        }
    }
}

/// One violated check. `column` is `None` for dataframe-wide checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub column: Option<String>,
    pub check: String,
    /// Rendering of the first failing value (or row, for dataframe-wide checks).
    pub failure_case: String,
}

/// Outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    /// At most one entry per (column, check), in declaration order.
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    fn from_failures(failures: Vec<ValidationFailure>) -> Self {
        let failures = dedup_failures(failures);
        Self {
            passed: failures.is_empty(),
            failures,
        }
    }

    /// The failure of `check` on `column` (`None` for a dataframe-wide check), if any.
    pub fn failure(&self, column: Option<&str>, check: &str) -> Option<&ValidationFailure> {
        self.failures
            .iter()
            .find(|f| f.column.as_deref() == column && f.check == check)
    }

    pub fn to_json_pretty(&self) -> FlowResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed {
            return f.write_str("validation passed");
        }
        write!(f, "validation failed ({} failures)", self.failures.len())?;
        for failure in &self.failures {
            write!(
                f,
                "\n  {} / {}: {}",
                failure.column.as_deref().unwrap_or("<dataframe>"),
                failure.check,
                failure.failure_case
            )?;
        }
        Ok(())
    }
}

/// Keep the first failure of every (column, check) pair, preserving order.
pub fn dedup_failures(failures: Vec<ValidationFailure>) -> Vec<ValidationFailure> {
    let mut seen: HashSet<(Option<String>, String)> = HashSet::with_capacity(failures.len());
    failures
        .into_iter()
        .filter(|f| seen.insert((f.column.clone(), f.check.clone())))
        .collect()
}

enum Task<'a> {
    Column(&'a ColumnSpec),
    Undeclared(&'a Column),
    Frame(&'a FrameCheck),
}

impl Task<'_> {
    fn label(&self) -> String {
        match self {
            Self::Column(spec) => spec.name.clone(),
            Self::Undeclared(column) => format!("{} (undeclared)", column.name()),
            Self::Frame(check) => check.name.clone(),
        }
    }
}

/// Evaluates a [`SchemaDescriptor`] against a table.
///
/// A run never fails: missing columns, shape mismatches and violated checks all end up in the
/// [`ValidationReport`]. Column specs and dataframe-wide checks are evaluated in parallel; the
/// report lists failures in declaration order regardless.
#[derive(Debug)]
pub struct ValidationEngine {
    options: ValidationOptions,
    executor: ExecutionEngine,
}

impl ValidationEngine {
    pub fn new(options: ValidationOptions) -> FlowResult<Self> {
        let executor = ExecutionEngine::new(options.execution.clone())?;
        Ok(Self { options, executor })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.executor = self.executor.with_observer(observer);
        self
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    pub fn executor(&self) -> &ExecutionEngine {
        &self.executor
    }

    pub fn validate(&self, table: &ColumnarTable, schema: &SchemaDescriptor) -> ValidationReport {
        let mut tasks: Vec<Task<'_>> = schema.columns().iter().map(Task::Column).collect();
        if schema.is_strict() {
            tasks.extend(
                table
                    .columns()
                    .iter()
                    .filter(|c| schema.column(c.name()).is_none())
                    .map(Task::Undeclared),
            );
        }
        tasks.extend(schema.frame_checks().iter().map(Task::Frame));

        let results = self
            .executor
            .run_ordered(Stage::Validation, &tasks, Task::label, |task| match task {
                Task::Column(spec) => self.check_column(table, spec),
                Task::Undeclared(column) => vec![failure(
                    Some(column.name()),
                    COLUMN_IN_SCHEMA,
                    column.name().to_string(),
                )],
                Task::Frame(check) => self.check_frame(table, check).into_iter().collect(),
            });

        let report = ValidationReport::from_failures(results.into_iter().flatten().collect());
        self.executor.emit(ExecutionEvent::ValidationFinished {
            passed: report.passed,
            failures: report.failures.len(),
        });
        report
    }

    /// Every row that fails the declared check `check`.
    ///
    /// `column` names the column the check is declared on, or `None` for a dataframe-wide check.
    /// Reports keep one example per check; this is for callers that need all offending rows.
    pub fn failing_rows(
        &self,
        table: &ColumnarTable,
        schema: &SchemaDescriptor,
        column: Option<&str>,
        check: &str,
    ) -> FlowResult<Vec<usize>> {
        let unknown = || FlowError::InvalidSchema {
            message: format!("no check '{check}' declared on {}", column.unwrap_or("the dataframe")),
        };
        let mask = match column {
            Some(name) => {
                let spec = schema.column(name).ok_or_else(unknown)?;
                let declared = spec.checks.iter().find(|c| c.name == check).ok_or_else(unknown)?;
                declared.predicate.evaluate(table.require_column(name)?)?
            }
            None => {
                let declared = schema
                    .frame_checks()
                    .iter()
                    .find(|c| c.name == check)
                    .ok_or_else(unknown)?;
                declared.predicate.evaluate(table)?
            }
        };
        Ok(failing(&mask).collect())
    }

    fn check_column(&self, table: &ColumnarTable, spec: &ColumnSpec) -> Vec<ValidationFailure> {
        let name = spec.name.as_str();
        let Some(column) = table.column(name) else {
            return vec![failure(Some(name), COLUMN_IN_DATAFRAME, name.to_string())];
        };

        // Checks assume the declared shape; a mismatch stands in for all of them.
        if column.data_type() != &spec.data_type {
            let case = format!("expected {}, found {}", spec.data_type, column.data_type());
            return vec![failure(Some(name), DTYPE, self.truncate(&case))];
        }

        let mut failures = Vec::new();
        if !spec.nullable && column.values().iter().any(|v| v.is_null()) {
            failures.push(failure(Some(name), NOT_NULLABLE, "null".to_string()));
        }
        for check in &spec.checks {
            let case = match check.predicate.evaluate(column) {
                Ok(mask) => match failing(&mask).next() {
                    Some(row) => column.values()[row].render(column.data_type()),
                    None => continue,
                },
                Err(e) => e.to_string(),
            };
            failures.push(failure(Some(name), &check.name, self.truncate(&case)));
        }
        failures
    }

    fn check_frame(&self, table: &ColumnarTable, check: &FrameCheck) -> Option<ValidationFailure> {
        let case = match check.predicate.evaluate(table) {
            Ok(mask) => {
                let row = failing(&mask).next()?;
                let cells: Vec<String> = check
                    .predicate
                    .columns()
                    .into_iter()
                    .filter_map(|name| table.column(name))
                    .map(|c| format!("{}={}", c.name(), c.values()[row].render(c.data_type())))
                    .collect();
                format!("row {row}: {}", cells.join(", "))
            }
            Err(e) => e.to_string(),
        };
        Some(failure(None, &check.name, self.truncate(&case)))
    }

    fn truncate(&self, text: &str) -> String {
        text.chars().take(self.options.max_example_chars).collect()
    }
}

fn failing(mask: &[bool]) -> impl Iterator<Item = usize> + '_ {
    mask.iter().enumerate().filter(|(_, ok)| !**ok).map(|(row, _)| row)
}

fn failure(column: Option<&str>, check: &str, failure_case: String) -> ValidationFailure {
    ValidationFailure {
        column: column.map(str::to_string),
        check: check.to_string(),
        failure_case,
    }
}
