//! IQR-based outlier detection.
//!
//! Fences are `Q1 - k * IQR` and `Q3 + k * IQR` (k = 1.5 by default) with
//! quartiles by linear interpolation. A row is an outlier when its value is
//! present and strictly outside the fences. A constant column has
//! `lower == upper == Q1`, so only values different from Q1 are outliers.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ExplorerConfig;
use crate::error::{ExplorerError, Result};
use crate::stats;
use crate::table::Table;

/// Quartiles and fences of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fences {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Fences {
    /// Compute fences from an ascending, non-empty slice.
    pub fn from_sorted(sorted: &[f64], multiplier: f64) -> Self {
        let (q1, q3) = stats::quartiles_sorted(sorted);
        let iqr = q3 - q1;
        Self {
            q1,
            q3,
            iqr,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        }
    }

    /// Strictly outside `[lower, upper]`.
    #[inline]
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Outlier detection result for one column.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierReport {
    pub column: String,
    #[serde(flatten)]
    pub fences: Fences,
    /// Number of outlier rows
    pub count: usize,
    /// Original row positions of the outliers, ascending
    pub row_indices: Vec<usize>,
    /// Outlier rows with every original column
    pub rows: Table,
}

impl OutlierReport {
    pub fn lower(&self) -> f64 {
        self.fences.lower
    }

    pub fn upper(&self) -> f64 {
        self.fences.upper
    }
}

/// Detects outliers with the IQR rule.
#[derive(Debug, Clone, Copy)]
pub struct OutlierDetector {
    multiplier: f64,
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self { multiplier: 1.5 }
    }
}

impl OutlierDetector {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    pub fn from_config(config: &ExplorerConfig) -> Self {
        Self::new(config.iqr_multiplier)
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Partition the rows of `table` by the IQR fences of `column`.
    ///
    /// Fails with `ColumnNotFound`, `InvalidColumnKind` for a categorical
    /// column, or `EmptyInput` when the column has no present values.
    pub fn detect(&self, table: &Table, column: &str) -> Result<OutlierReport> {
        let cells = table.numeric_column(column)?;
        let values = stats::present(cells);
        if values.is_empty() {
            return Err(ExplorerError::EmptyInput(format!(
                "column '{column}' has no values to compute quartiles from"
            )));
        }

        let fences = Fences::from_sorted(&stats::sorted(&values), self.multiplier);

        let row_indices: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter_map(|(row, cell)| cell.get().filter(|&v| fences.is_outlier(v)).map(|_| row))
            .collect();

        debug!(
            column,
            lower = fences.lower,
            upper = fences.upper,
            outliers = row_indices.len(),
            "detected outliers"
        );

        Ok(OutlierReport {
            column: column.to_string(),
            fences,
            count: row_indices.len(),
            rows: table.take_rows(&row_indices),
            row_indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, Column};

    fn single(name: &str, values: &[Option<f64>]) -> Table {
        Table::new(vec![Column::numeric(name, values.iter().copied())]).unwrap()
    }

    #[test]
    fn test_single_high_outlier() {
        let table = single(
            "x",
            &[Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(100.0)],
        );
        let report = OutlierDetector::default().detect(&table, "x").unwrap();

        assert_eq!(report.fences.q1, 2.0);
        assert_eq!(report.fences.q3, 4.0);
        assert_eq!(report.fences.iqr, 2.0);
        assert_eq!(report.lower(), -1.0);
        assert_eq!(report.upper(), 7.0);
        assert_eq!(report.count, 1);
        assert_eq!(report.row_indices, vec![4]);
        assert_eq!(report.rows.numeric_column("x").unwrap(), &[Cell::Present(100.0)]);
    }

    #[test]
    fn test_constant_column_has_no_outliers() {
        let table = single("y", &[Some(1.0), Some(1.0), Some(1.0), Some(1.0)]);
        let report = OutlierDetector::default().detect(&table, "y").unwrap();

        assert_eq!(report.fences.iqr, 0.0);
        assert_eq!(report.lower(), 1.0);
        assert_eq!(report.upper(), 1.0);
        assert_eq!(report.count, 0);
    }

    #[test]
    fn test_constant_column_flags_any_different_value() {
        let table = single(
            "y",
            &[Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(2.0)],
        );
        let report = OutlierDetector::default().detect(&table, "y").unwrap();

        assert_eq!(report.lower(), 1.0);
        assert_eq!(report.upper(), 1.0);
        assert_eq!(report.row_indices, vec![6]);
    }

    #[test]
    fn test_missing_values_are_never_outliers() {
        let table = single(
            "x",
            &[Some(1.0), None, Some(2.0), Some(3.0), None, Some(4.0), Some(-50.0)],
        );
        let report = OutlierDetector::default().detect(&table, "x").unwrap();

        let expected = table
            .numeric_column("x")
            .unwrap()
            .iter()
            .filter(|c| c.get().is_some_and(|v| v < report.lower() || v > report.upper()))
            .count();
        assert_eq!(report.count, expected);
        assert_eq!(report.row_indices, vec![6]);
    }

    #[test]
    fn test_outlier_rows_keep_all_columns_in_order() {
        let table = Table::new(vec![
            Column::categorical("name", [Some("a"), Some("b"), Some("c"), Some("d"), Some("e")]),
            Column::numeric("v", [Some(-100.0), Some(2.0), Some(3.0), Some(4.0), Some(100.0)]),
        ])
        .unwrap();
        let report = OutlierDetector::default().detect(&table, "v").unwrap();

        assert_eq!(report.rows.columns(), vec!["name", "v"]);
        assert_eq!(report.row_indices, vec![0, 4]);
        assert_eq!(report.rows.row(0)[0], Some("a".to_string()));
        assert_eq!(report.rows.row(1)[0], Some("e".to_string()));
    }

    #[test]
    fn test_categorical_column_rejected() {
        let table = Table::new(vec![Column::categorical("c", [Some("x")])]).unwrap();
        let err = OutlierDetector::default().detect(&table, "c").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_COLUMN_KIND");
    }

    #[test]
    fn test_all_missing_column_is_empty_input() {
        let table = single("x", &[None, None]);
        let err = OutlierDetector::default().detect(&table, "x").unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_INPUT");
    }

    #[test]
    fn test_unknown_column() {
        let table = single("x", &[Some(1.0)]);
        let err = OutlierDetector::default().detect(&table, "z").unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }
}
