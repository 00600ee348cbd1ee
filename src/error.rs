use thiserror::Error;

/// Convenience result type used across the crate.
pub type FlowResult<T> = Result<T, FlowError>;

/// Error type returned by table construction, enrichment, schema construction and the I/O
/// boundaries.
///
/// Data-quality problems are never reported through this type: they flow through
/// [`crate::validation::ValidationReport`]. A `FlowError` means the caller or its configuration is
/// wrong (or an internal invariant broke) and the run should stop.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "polars")]
    /// Polars interop error (feature-gated behind `polars`).
    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// A referenced column does not exist.
    #[error("column '{column}' not found")]
    ColumnNotFound { column: String },

    /// A referenced field does not exist inside a struct-list column.
    #[error("field '{field}' not found in struct-list column '{column}'")]
    FieldNotFound { column: String, field: String },

    /// Two columns (or struct fields) share a name.
    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },

    /// A column has a different number of values than the rest of the table.
    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A value does not conform to its column's declared type.
    #[error("column '{column}' row {row}: value does not conform to {expected}")]
    TypeMismatch {
        column: String,
        row: usize,
        expected: String,
    },

    /// The input does not have the shape an operation requires.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// The right side of a join has a repeated key, which would multiply left rows.
    #[error("join key '{key}' occurs more than once in column '{column}'")]
    DuplicateJoinKey { column: String, key: String },

    /// A derived lookup view maps one identifier to more than one label.
    #[error("lookup view '{view}' has duplicate identifier '{key}'")]
    DuplicateLookupKey { view: String, key: String },

    /// An operation changed the number or order of records it must preserve.
    #[error("cardinality violation in {stage}: expected {expected} rows, got {actual}")]
    CardinalityViolation {
        stage: String,
        expected: usize,
        actual: usize,
    },

    /// A schema descriptor is internally inconsistent.
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    /// A value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// The execution engine could not be set up.
    #[error("execution error: {message}")]
    Execution { message: String },
}

pub(crate) fn ensure_cardinality(stage: &str, expected: usize, actual: usize) -> FlowResult<()> {
    if expected != actual {
        return Err(FlowError::CardinalityViolation {
            stage: stage.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
