//! CSV reading through polars with type inference switched off.

use polars::prelude::*;
use std::io::Cursor;
use tracing::debug;

use super::TextColumns;
use crate::error::{ExplorerError, Result};

pub(super) fn read_text_columns(bytes: &[u8]) -> Result<TextColumns> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ExplorerError::MalformedSource(
            "file is empty, expected a header row".to_string(),
        ));
    }

    // Schema inference length 0 reads every column as text.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| ExplorerError::MalformedSource(e.to_string()))?;

    debug!(rows = df.height(), columns = df.width(), "parsed csv");

    df.get_columns()
        .iter()
        .map(|column| -> Result<(String, Vec<Option<String>>)> {
            let series = column
                .as_materialized_series()
                .cast(&DataType::String)
                .map_err(|e| ExplorerError::MalformedSource(e.to_string()))?;
            let values = series
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect();
            Ok((column.name().to_string(), values))
        })
        .collect()
}
