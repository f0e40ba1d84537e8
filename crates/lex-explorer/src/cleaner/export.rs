//! CSV serialization of tables.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;

use crate::error::{ExplorerError, Result};
use crate::table::Table;

/// MIME type attached to exported CSV data.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// A downloadable file produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Serialize a table as UTF-8 CSV.
///
/// Header row of column names, one `\n`-terminated line per row, no index
/// column. Fields are quoted only when they contain a comma, a quote or a
/// line break. Missing values are empty fields. A table without columns
/// serializes to nothing.
pub fn export_csv(table: &Table) -> Result<Vec<u8>> {
    if table.column_count() == 0 {
        return Ok(Vec::new());
    }

    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(table.columns())?;
    for row in 0..table.row_count() {
        writer.write_record(
            table
                .row(row)
                .iter()
                .map(|cell| cell.as_deref().unwrap_or("")),
        )?;
    }

    writer
        .into_inner()
        .map_err(|e| ExplorerError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use pretty_assertions::assert_eq;

    fn as_text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_quotes_field_with_comma() {
        let table = Table::new(vec![
            Column::categorical("city", [Some("Paris, TX"), Some("Lyon")]),
            Column::integer("pop", [Some(25000), Some(513000)]),
        ])
        .unwrap();

        assert_eq!(
            as_text(export_csv(&table).unwrap()),
            "city,pop\n\"Paris, TX\",25000\nLyon,513000\n"
        );
    }

    #[test]
    fn test_escapes_quotes_and_newlines() {
        let table = Table::new(vec![Column::categorical(
            "note",
            [Some("say \"hi\""), Some("two\nlines")],
        )])
        .unwrap();

        assert_eq!(
            as_text(export_csv(&table).unwrap()),
            "note\n\"say \"\"hi\"\"\"\n\"two\nlines\"\n"
        );
    }

    #[test]
    fn test_missing_values_are_empty_fields() {
        let table = Table::new(vec![
            Column::numeric("x", [Some(1.5), None]),
            Column::categorical("y", [None, Some("b")]),
        ])
        .unwrap();

        assert_eq!(as_text(export_csv(&table).unwrap()), "x,y\n1.5,\n,b\n");
    }

    #[test]
    fn test_numeric_formatting() {
        let table = Table::new(vec![
            Column::integer("i", [Some(3), Some(-7)]),
            Column::numeric("f", [Some(3.0), Some(0.1)]),
        ])
        .unwrap();

        assert_eq!(as_text(export_csv(&table).unwrap()), "i,f\n3,3.0\n-7,0.1\n");
    }

    #[test]
    fn test_extreme_magnitudes_use_exponent_form() {
        let table = Table::new(vec![Column::numeric(
            "x",
            [Some(1e20), Some(0.0000001), Some(2.5)],
        )])
        .unwrap();

        assert_eq!(as_text(export_csv(&table).unwrap()), "x\n1e+20\n1e-07\n2.5\n");
    }

    #[test]
    fn test_header_only_when_no_rows() {
        let table = Table::new(vec![
            Column::numeric("a", Vec::new()),
            Column::numeric("b", Vec::new()),
        ])
        .unwrap();
        assert_eq!(as_text(export_csv(&table).unwrap()), "a,b\n");
    }

    #[test]
    fn test_no_columns_exports_nothing() {
        assert!(export_csv(&Table::default()).unwrap().is_empty());
    }
}
