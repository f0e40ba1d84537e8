//! Null-handling cleaning and export.
//!
//! This module provides:
//! - Dropping rows or columns that contain missing values
//! - Filling numeric gaps with the column mean or median
//! - Filling every gap with zero
//! - CSV export of the cleaned result
//!
//! Cleaning never mutates its input; every strategy returns a new table.

mod export;

pub use export::{CSV_CONTENT_TYPE, ExportArtifact, export_csv};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::CleaningStrategy;
use crate::error::Result;
use crate::stats;
use crate::table::{Cell, Column, ColumnValues, Table};

/// Result of applying a cleaning strategy.
///
/// Owned by the caller; the cleaner keeps no reference to it.
#[derive(Debug, Clone, Serialize)]
pub struct CleanedTable {
    pub strategy: CleaningStrategy,
    pub table: Table,
    pub rows_removed: usize,
    pub columns_removed: usize,
    pub cells_filled: usize,
}

impl CleanedTable {
    /// Serialize the cleaned table as a downloadable CSV artifact.
    pub fn export(&self, file_name: impl Into<String>) -> Result<ExportArtifact> {
        Ok(ExportArtifact {
            file_name: file_name.into(),
            content_type: CSV_CONTENT_TYPE.to_string(),
            bytes: export_csv(&self.table)?,
        })
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

/// Stateless data cleaner.
pub struct DataCleaner;

impl DataCleaner {
    /// Apply `strategy` to `table`, returning a new table.
    ///
    /// Column order is always preserved. Only the drop strategies change the
    /// row or column count.
    pub fn clean(table: &Table, strategy: CleaningStrategy) -> CleanedTable {
        let (rows_before, columns_before) = table.shape();

        let (cleaned, cells_filled) = match strategy {
            CleaningStrategy::DropRowsWithNulls => (Self::drop_rows_with_nulls(table), 0),
            CleaningStrategy::DropColumnsWithNulls => (Self::drop_columns_with_nulls(table), 0),
            CleaningStrategy::FillWithMean => Self::fill_numeric(table, "mean", stats::mean),
            CleaningStrategy::FillWithMedian => Self::fill_numeric(table, "median", stats::median),
            CleaningStrategy::FillWithZero => Self::fill_zero(table),
        };

        let (rows_after, columns_after) = cleaned.shape();
        let result = CleanedTable {
            strategy,
            rows_removed: rows_before - rows_after,
            columns_removed: columns_before - columns_after,
            cells_filled,
            table: cleaned,
        };

        info!(
            strategy = ?strategy,
            rows_removed = result.rows_removed,
            columns_removed = result.columns_removed,
            cells_filled = result.cells_filled,
            "cleaning applied"
        );

        result
    }

    fn drop_rows_with_nulls(table: &Table) -> Table {
        let keep: Vec<usize> = (0..table.row_count())
            .filter(|&row| !table.row_has_missing(row))
            .collect();
        table.take_rows(&keep)
    }

    fn drop_columns_with_nulls(table: &Table) -> Table {
        table.filter_columns(|column| !column.has_missing())
    }

    /// Fill missing numeric cells with a statistic of the present values.
    /// Categorical columns and all-missing numeric columns are untouched.
    fn fill_numeric(table: &Table, method: &str, statistic: fn(&[f64]) -> f64) -> (Table, usize) {
        let mut filled = 0;
        let cleaned = table.map_columns(|column| match column.values() {
            ColumnValues::Numeric { cells, integer } if column.has_missing() => {
                let fill = statistic(&stats::present(cells));
                if fill.is_nan() {
                    warn!(column = column.name(), method, "no values to fill from");
                    return column.clone();
                }
                filled += column.null_count();
                fill_numeric_cells(column.name(), cells, *integer, fill)
            }
            _ => column.clone(),
        });
        (cleaned, filled)
    }

    fn fill_zero(table: &Table) -> (Table, usize) {
        let mut filled = 0;
        let cleaned = table.map_columns(|column| {
            filled += column.null_count();
            match column.values() {
                ColumnValues::Numeric { cells, integer } => {
                    fill_numeric_cells(column.name(), cells, *integer, 0.0)
                }
                ColumnValues::Categorical(cells) => Column::from_categorical_cells(
                    column.name(),
                    cells
                        .iter()
                        .map(|c| match c {
                            Cell::Present(v) => Cell::Present(v.clone()),
                            Cell::Missing => Cell::Present("0".to_string()),
                        })
                        .collect(),
                ),
            }
        });
        (cleaned, filled)
    }
}

fn fill_numeric_cells(name: &str, cells: &[Cell<f64>], integer: bool, fill: f64) -> Column {
    let cells = cells
        .iter()
        .map(|c| Cell::Present(c.get().unwrap_or(fill)))
        .collect();
    Column::from_numeric_cells(name, cells, integer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> Table {
        Table::new(vec![
            Column::integer("a", [Some(2), None, Some(4), Some(9)]),
            Column::numeric("b", [Some(1.5), Some(2.5), Some(3.5), Some(4.5)]),
            Column::categorical("c", [Some("x"), Some("y"), None, Some("x")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_drop_rows_with_nulls() {
        let cleaned = DataCleaner::clean(&table(), CleaningStrategy::DropRowsWithNulls);
        assert_eq!(cleaned.table.shape(), (2, 3));
        assert_eq!(cleaned.rows_removed, 2);
        assert_eq!(
            cleaned.table.numeric_column("a").unwrap(),
            &[Cell::Present(2.0), Cell::Present(9.0)]
        );
        assert!(!cleaned.table.has_missing());
    }

    #[test]
    fn test_drop_columns_with_nulls() {
        let cleaned = DataCleaner::clean(&table(), CleaningStrategy::DropColumnsWithNulls);
        assert_eq!(cleaned.table.columns(), vec!["b"]);
        assert_eq!(cleaned.table.row_count(), 4);
        assert_eq!(cleaned.columns_removed, 2);
    }

    #[test]
    fn test_drop_strategies_are_idempotent() {
        let original = table();
        for strategy in [
            CleaningStrategy::DropRowsWithNulls,
            CleaningStrategy::DropColumnsWithNulls,
        ] {
            let once = DataCleaner::clean(&original, strategy).into_table();
            let twice = DataCleaner::clean(&once, strategy).into_table();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_fill_with_mean() {
        let table = Table::new(vec![Column::numeric("v", [Some(2.0), None, Some(4.0)])]).unwrap();
        let cleaned = DataCleaner::clean(&table, CleaningStrategy::FillWithMean);
        assert_eq!(
            cleaned.table.numeric_column("v").unwrap(),
            &[Cell::Present(2.0), Cell::Present(3.0), Cell::Present(4.0)]
        );
        assert_eq!(cleaned.cells_filled, 1);
    }

    #[test]
    fn test_fill_with_mean_leaves_categorical_missing() {
        let cleaned = DataCleaner::clean(&table(), CleaningStrategy::FillWithMean);
        // mean of {2, 4, 9} = 5
        assert_eq!(cleaned.table.numeric_column("a").unwrap()[1], Cell::Present(5.0));
        assert_eq!(cleaned.table.categorical_column("c").unwrap()[2], Cell::Missing);
        assert_eq!(cleaned.table.shape(), (4, 3));
    }

    #[test]
    fn test_fill_with_median() {
        let cleaned = DataCleaner::clean(&table(), CleaningStrategy::FillWithMedian);
        assert_eq!(cleaned.table.numeric_column("a").unwrap()[1], Cell::Present(4.0));
        assert!(!cleaned.table.column("a").unwrap().is_integer());
    }

    #[test]
    fn test_filled_integer_column_exports_as_float() {
        let table = crate::ingest::load_bytes(
            b"x\n2\n\n4\n",
            crate::ingest::SourceFormat::Csv,
            &crate::config::ExplorerConfig::default(),
        )
        .unwrap();
        let cleaned = DataCleaner::clean(&table, CleaningStrategy::FillWithMean);
        assert_eq!(
            String::from_utf8(export_csv(&cleaned.table).unwrap()).unwrap(),
            "x\n2.0\n3.0\n4.0\n"
        );
    }

    #[test]
    fn test_fill_with_zero_quirk_for_categorical() {
        let cleaned = DataCleaner::clean(&table(), CleaningStrategy::FillWithZero);
        assert_eq!(cleaned.table.numeric_column("a").unwrap()[1], Cell::Present(0.0));
        assert_eq!(
            cleaned.table.categorical_column("c").unwrap()[2],
            Cell::Present("0".to_string())
        );
        assert_eq!(cleaned.cells_filled, 2);
        assert!(!cleaned.table.has_missing());
    }

    #[test]
    fn test_all_missing_numeric_column_stays_missing() {
        let table = Table::new(vec![Column::numeric("v", [None, None])]).unwrap();
        let cleaned = DataCleaner::clean(&table, CleaningStrategy::FillWithMedian);
        assert_eq!(cleaned.table.column("v").unwrap().null_count(), 2);
        assert_eq!(cleaned.cells_filled, 0);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let original = table();
        let snapshot = original.clone();
        for strategy in CleaningStrategy::ALL {
            let _ = DataCleaner::clean(&original, strategy);
        }
        assert_eq!(original, snapshot);
    }
}
