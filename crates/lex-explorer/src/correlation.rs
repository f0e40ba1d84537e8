//! Pairwise Pearson correlation over numeric columns.

use serde::Serialize;
use tracing::debug;

use crate::error::{ExplorerError, Result};
use crate::table::{Cell, Table};

/// Square correlation matrix over the numeric columns of a table.
///
/// `values[i][j]` is the Pearson coefficient of `columns[i]` and
/// `columns[j]`, computed on rows where both are present. Undefined
/// coefficients (zero variance, fewer than two shared rows) are NaN and
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Coefficient for a pair of column names, `None` if either is absent.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Some(self.values[i][j])
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Computes correlation matrices.
pub struct CorrelationEngine;

impl CorrelationEngine {
    /// Correlate every pair of numeric columns, self-pairs included.
    ///
    /// Fails with `EmptyInput` when the table has no rows or no numeric
    /// columns.
    pub fn correlate(table: &Table) -> Result<CorrelationMatrix> {
        if table.row_count() == 0 {
            return Err(ExplorerError::EmptyInput(
                "correlation needs at least one row".to_string(),
            ));
        }

        let numeric: Vec<(&str, &[Cell<f64>])> = table
            .iter_columns()
            .filter_map(|c| c.numeric_cells().map(|cells| (c.name(), cells)))
            .collect();

        if numeric.is_empty() {
            return Err(ExplorerError::EmptyInput(
                "correlation needs at least one numeric column".to_string(),
            ));
        }

        let size = numeric.len();
        let mut values = vec![vec![f64::NAN; size]; size];

        for i in 0..size {
            for j in i..size {
                let r = pairwise_pearson(numeric[i].1, numeric[j].1);
                // A self-pair with defined variance is exactly 1.
                let r = if i == j && !r.is_nan() { 1.0 } else { r };
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        debug!(columns = size, "computed correlation matrix");

        Ok(CorrelationMatrix {
            columns: numeric.iter().map(|(name, _)| name.to_string()).collect(),
            values,
        })
    }
}

/// Pearson coefficient over rows where both cells are present.
fn pairwise_pearson(x: &[Cell<f64>], y: &[Cell<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some((a.get()?, b.get()?)))
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }

    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn table() -> Table {
        Table::new(vec![
            Column::numeric("a", [Some(1.0), Some(2.0), Some(3.0), Some(4.0), None]),
            Column::numeric("b", [Some(2.0), Some(4.0), Some(6.0), Some(8.0), Some(1.0)]),
            Column::numeric("c", [Some(4.0), Some(3.0), None, Some(1.0), Some(0.0)]),
            Column::categorical("label", [Some("x"), Some("y"), Some("z"), Some("x"), None]),
            Column::numeric("flat", [Some(7.0), Some(7.0), Some(7.0), Some(7.0), Some(7.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_only_numeric_columns() {
        let matrix = CorrelationEngine::correlate(&table()).unwrap();
        assert_eq!(matrix.columns, vec!["a", "b", "c", "flat"]);
        assert_eq!(matrix.len(), 4);
    }

    #[test]
    fn test_pairwise_complete_rows() {
        let matrix = CorrelationEngine::correlate(&table()).unwrap();
        // Row 4 is excluded for (a, b) only, so the pair is perfectly linear.
        assert!((matrix.get("a", "b").unwrap() - 1.0).abs() < 1e-12);
        // (a, c) uses rows 0, 1, 3: a = 1, 2, 4 and c = 4, 3, 1
        assert!((matrix.get("a", "c").unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_with_unit_diagonal() {
        let matrix = CorrelationEngine::correlate(&table()).unwrap();
        for a in &matrix.columns {
            for b in &matrix.columns {
                let ab = matrix.get(a, b).unwrap();
                let ba = matrix.get(b, a).unwrap();
                assert!(ab.to_bits() == ba.to_bits(), "{a}/{b} not symmetric");
            }
        }
        for name in ["a", "b", "c"] {
            assert_eq!(matrix.get(name, name), Some(1.0));
        }
    }

    #[test]
    fn test_zero_variance_is_undefined() {
        let matrix = CorrelationEngine::correlate(&table()).unwrap();
        assert!(matrix.get("flat", "flat").unwrap().is_nan());
        assert!(matrix.get("flat", "a").unwrap().is_nan());
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let matrix = CorrelationEngine::correlate(&table()).unwrap();
        let json = serde_json::to_value(&matrix).unwrap();
        assert!(json["values"][3][3].is_null());
        assert_eq!(json["values"][0][0], 1.0);
    }

    #[test]
    fn test_no_numeric_columns() {
        let table = Table::new(vec![Column::categorical("c", [Some("x")])]).unwrap();
        let err = CorrelationEngine::correlate(&table).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_INPUT");
    }

    #[test]
    fn test_no_rows() {
        let table = Table::new(vec![Column::numeric("a", Vec::new())]).unwrap();
        let err = CorrelationEngine::correlate(&table).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_INPUT");
    }
}
