//! CSV boundary: uploaded bytes or files in, delimited text out.

use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;

use crate::error::ClimateError;

/// Read a CSV file with all columns as String dtype.
pub fn read_csv_path(path: impl AsRef<Path>) -> Result<DataFrame, ClimateError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    trim_column_names(df)
}

/// Read uploaded CSV content with all columns as String dtype.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame, ClimateError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()?;
    trim_column_names(df)
}

/// Serialize any output table as comma-separated text with a header row.
pub fn write_csv_bytes(df: &DataFrame) -> Result<Vec<u8>, ClimateError> {
    let mut df = df.clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf).include_header(true).finish(&mut df)?;
    Ok(buf)
}

fn trim_column_names(mut df: DataFrame) -> Result<DataFrame, ClimateError> {
    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;
    Ok(df)
}
