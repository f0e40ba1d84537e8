//! Error types for the exploration engine.
//!
//! Engine operations fail with one of four kinds (`ColumnNotFound`,
//! `InvalidColumnKind`, `EmptyInput`, `MalformedSource`). None of them touch
//! the table an operation was run against, so a caller can display the error
//! and retry with different parameters.
//!
//! Errors are serializable so a presentation layer can render them without
//! knowing the Rust type.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::table::ColumnKind;

/// The main error type for the exploration engine.
#[derive(Error, Debug)]
pub enum ExplorerError {
    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Operation needs a column of a different kind.
    #[error("Column '{column}' is {found}, but this operation requires a {expected} column")]
    InvalidColumnKind {
        column: String,
        expected: ColumnKind,
        found: ColumnKind,
    },

    /// Nothing to compute on (no rows, no eligible columns, no present values).
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Uploaded bytes could not be parsed into a table.
    #[error("Malformed source: {0}")]
    MalformedSource(String),

    /// Source file is neither CSV nor a spreadsheet.
    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),

    /// Table construction violated a structural invariant.
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// CSV writer error wrapper.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet reader error (only with "excel" feature).
    #[cfg(feature = "excel")]
    #[error("Spreadsheet error: {0}")]
    Excel(#[from] calamine::XlsxError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ExplorerError>,
    },
}

impl ExplorerError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ExplorerError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidColumnKind { .. } => "INVALID_COLUMN_KIND",
            Self::EmptyInput(_) => "EMPTY_INPUT",
            Self::MalformedSource(_) => "MALFORMED_SOURCE",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::InvalidTable(_) => "INVALID_TABLE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Csv(_) => "CSV_ERROR",
            #[cfg(feature = "excel")]
            Self::Excel(_) => "SPREADSHEET_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether this error came from an engine operation rejecting its
    /// parameters. The loaded table is still usable after such an error.
    pub fn is_operation_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_) | Self::InvalidColumnKind { .. } | Self::EmptyInput(_) => {
                true
            }
            Self::WithContext { source, .. } => source.is_operation_error(),
            _ => false,
        }
    }
}

/// Serialized as `{ "code": ..., "message": ... }`.
impl Serialize for ExplorerError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ExplorerError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
