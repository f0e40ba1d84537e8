//! Xlsx reading through calamine. Only the first worksheet is loaded.

use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;
use tracing::debug;

use super::TextColumns;
use crate::error::{ExplorerError, Result};

pub(super) fn read_text_columns(bytes: &[u8]) -> Result<TextColumns> {
    let mut workbook = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| ExplorerError::MalformedSource(format!("not a readable workbook: {e}")))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ExplorerError::MalformedSource("workbook has no sheets".to_string()))?;

    let range = workbook.worksheet_range(&sheet)?;
    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| {
        ExplorerError::MalformedSource(format!("sheet '{sheet}' is empty, expected a header row"))
    })?;

    let mut columns: TextColumns = header
        .iter()
        .map(|cell| (cell.to_string(), Vec::with_capacity(range.height())))
        .collect();

    for row in rows {
        for (slot, cell) in columns.iter_mut().zip(row) {
            slot.1.push(cell_text(cell));
        }
    }

    debug!(
        sheet = %sheet,
        rows = range.height().saturating_sub(1),
        columns = columns.len(),
        "parsed worksheet"
    );
    Ok(columns)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String("x".to_string())), Some("x".to_string()));
        assert_eq!(cell_text(&Data::Int(7)), Some("7".to_string()));
        assert_eq!(cell_text(&Data::Float(2.5)), Some("2.5".to_string()));
    }

    #[test]
    fn test_garbage_bytes_are_malformed() {
        let err = read_text_columns(b"not a zip archive").unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_SOURCE");
    }
}
