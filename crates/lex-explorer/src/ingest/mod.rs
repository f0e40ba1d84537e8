//! Loading uploaded files into tables.
//!
//! Both readers produce raw text columns; kind classification happens once
//! in [`Table::from_text_columns`].

mod delimited;
#[cfg(feature = "excel")]
mod spreadsheet;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::config::ExplorerConfig;
use crate::error::{ExplorerError, Result, ResultExt};
use crate::table::Table;

/// Raw text columns as read from a source.
pub(crate) type TextColumns = Vec<(String, Vec<Option<String>>)>;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Resolve the format from a file name's extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx") => Ok(Self::Xlsx),
            _ => Err(ExplorerError::UnsupportedFormat(format!(
                "'{name}' is not a .csv or .xlsx file"
            ))),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Csv => f.write_str("csv"),
            SourceFormat::Xlsx => f.write_str("xlsx"),
        }
    }
}

/// Parse uploaded bytes into a table.
pub fn load_bytes(bytes: &[u8], format: SourceFormat, config: &ExplorerConfig) -> Result<Table> {
    let columns = match format {
        SourceFormat::Csv => delimited::read_text_columns(bytes)?,
        SourceFormat::Xlsx => read_spreadsheet(bytes)?,
    };

    let table = Table::from_text_columns(columns, config).map_err(|e| match e {
        ExplorerError::InvalidTable(msg) => ExplorerError::MalformedSource(msg),
        other => other,
    })?;

    let (rows, cols) = table.shape();
    info!(%format, rows, columns = cols, "loaded table");
    Ok(table)
}

/// Read and parse a file, choosing the format from its extension.
pub fn load_path(path: impl AsRef<Path>, config: &ExplorerConfig) -> Result<Table> {
    let path = path.as_ref();
    let format = SourceFormat::from_file_name(&path.to_string_lossy())?;
    let bytes = std::fs::read(path)
        .map_err(ExplorerError::from)
        .context(format!("Failed to read '{}'", path.display()))?;
    load_bytes(&bytes, format, config)
}

#[cfg(feature = "excel")]
fn read_spreadsheet(bytes: &[u8]) -> Result<TextColumns> {
    spreadsheet::read_text_columns(bytes)
}

#[cfg(not(feature = "excel"))]
fn read_spreadsheet(_bytes: &[u8]) -> Result<TextColumns> {
    Err(ExplorerError::UnsupportedFormat(
        "spreadsheet support requires the 'excel' feature".to_string(),
    ))
}
