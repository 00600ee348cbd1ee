//! Polars interop for the persistence collaborator (feature `polars`).

use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use polars::prelude::{
    DataFrame, DataType as PlDataType, Field as PlField, JsonFormat, JsonReader, ParquetWriter, Schema as PlSchema,
    SerReader,
};

use crate::error::FlowResult;
use crate::export::json::to_ndjson_string;
use crate::types::{ColumnarTable, DataType, Schema};

/// Polars dtype for a column of `data_type`; struct lists map to `List(Struct(..))`.
pub fn polars_dtype(data_type: &DataType) -> PlDataType {
    match data_type {
        DataType::Int64 => PlDataType::Int64,
        DataType::Float64 => PlDataType::Float64,
        DataType::Bool => PlDataType::Boolean,
        DataType::Utf8 => PlDataType::String,
        DataType::StructList(fields) => PlDataType::List(Box::new(PlDataType::Struct(
            fields
                .iter()
                .map(|f| PlField::new(f.name.as_str().into(), polars_dtype(&f.data_type)))
                .collect(),
        ))),
    }
}

/// Polars schema equivalent to `schema`.
pub fn polars_schema(schema: &Schema) -> PlSchema {
    schema
        .fields
        .iter()
        .map(|f| PlField::new(f.name.as_str().into(), polars_dtype(&f.data_type)))
        .collect()
}

/// Convert `table` into a polars [`DataFrame`] with the same column names, order and types.
pub fn to_dataframe(table: &ColumnarTable) -> FlowResult<DataFrame> {
    let schema = polars_schema(table.schema());
    if table.row_count() == 0 {
        return Ok(DataFrame::empty_with_schema(&schema));
    }

    let ndjson = to_ndjson_string(table)?;
    let df = JsonReader::new(Cursor::new(ndjson.into_bytes()))
        .with_json_format(JsonFormat::JsonLines)
        .with_schema(Arc::new(schema))
        .finish()?;
    Ok(df)
}

/// Persist `table` as a Parquet file. Returns the number of bytes written.
pub fn write_parquet(table: &ColumnarTable, path: impl AsRef<Path>) -> FlowResult<u64> {
    let mut df = to_dataframe(table)?;
    let file = File::create(path)?;
    Ok(ParquetWriter::new(file).finish(&mut df)?)
}
