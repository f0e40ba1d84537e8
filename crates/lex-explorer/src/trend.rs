//! Mean first-difference trend heuristic.
//!
//! The verdict is the sign of the mean of `value[i] - value[i - 1]` over
//! consecutive rows. A difference touching a missing value, or one that is
//! NaN (`inf - inf`), is undefined and left out of the mean. This ignores magnitude, and a non-monotonic path
//! whose differences average to zero is `Flat`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::Result;
use crate::table::Table;

/// Direction of a column's values over row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendVerdict {
    Increasing,
    Decreasing,
    Flat,
}

impl fmt::Display for TrendVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendVerdict::Increasing => f.write_str("increasing"),
            TrendVerdict::Decreasing => f.write_str("decreasing"),
            TrendVerdict::Flat => f.write_str("no clear trend"),
        }
    }
}

/// Trend of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub column: String,
    /// Mean of the defined differences; `None` when there are none
    pub mean_difference: Option<f64>,
    /// Number of consecutive pairs with a defined difference
    pub defined_differences: usize,
    pub verdict: TrendVerdict,
}

/// Stateless trend analyzer.
pub struct TrendAnalyzer;

impl TrendAnalyzer {
    /// Classify the trend of a numeric column in row order.
    ///
    /// Fails with `ColumnNotFound` or `InvalidColumnKind`; an empty or
    /// single-row column is `Flat`.
    pub fn analyze(table: &Table, column: &str) -> Result<TrendAnalysis> {
        let cells = table.numeric_column(column)?;

        let differences: Vec<f64> = cells
            .windows(2)
            .filter_map(|pair| Some(pair[1].get()? - pair[0].get()?))
            .filter(|d| !d.is_nan())
            .collect();

        let mean_difference = if differences.is_empty() {
            None
        } else {
            Some(differences.iter().sum::<f64>() / differences.len() as f64)
        };

        let verdict = match mean_difference {
            Some(mean) if mean > 0.0 => TrendVerdict::Increasing,
            Some(mean) if mean < 0.0 => TrendVerdict::Decreasing,
            _ => TrendVerdict::Flat,
        };

        debug!(column, ?mean_difference, %verdict, "analyzed trend");

        Ok(TrendAnalysis {
            column: column.to_string(),
            mean_difference,
            defined_differences: differences.len(),
            verdict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn verdict(values: &[Option<f64>]) -> TrendAnalysis {
        let table = Table::new(vec![Column::numeric("z", values.iter().copied())]).unwrap();
        TrendAnalyzer::analyze(&table, "z").unwrap()
    }

    #[test]
    fn test_decreasing() {
        let analysis = verdict(&[Some(5.0), Some(3.0), Some(1.0)]);
        assert_eq!(analysis.mean_difference, Some(-2.0));
        assert_eq!(analysis.verdict, TrendVerdict::Decreasing);
    }

    #[test]
    fn test_increasing_ignores_magnitude() {
        let analysis = verdict(&[Some(1.0), Some(1.0), Some(1.001)]);
        assert_eq!(analysis.verdict, TrendVerdict::Increasing);
    }

    #[test]
    fn test_round_trip_path_is_flat() {
        let analysis = verdict(&[Some(1.0), Some(10.0), Some(1.0)]);
        assert_eq!(analysis.mean_difference, Some(0.0));
        assert_eq!(analysis.verdict, TrendVerdict::Flat);
    }

    #[test]
    fn test_missing_values_excluded_not_zero() {
        // Differences: 1 - 0 = 1, (missing), (missing), 10 - 9 = 1
        let analysis = verdict(&[Some(0.0), Some(1.0), None, Some(9.0), Some(10.0)]);
        assert_eq!(analysis.defined_differences, 2);
        assert_eq!(analysis.mean_difference, Some(1.0));
        assert_eq!(analysis.verdict, TrendVerdict::Increasing);
    }

    #[test]
    fn test_nan_difference_excluded() {
        // inf - inf is undefined; 1 - inf and 2 - 1 remain
        let analysis = verdict(&[
            Some(f64::INFINITY),
            Some(f64::INFINITY),
            Some(1.0),
            Some(2.0),
        ]);
        assert_eq!(analysis.defined_differences, 2);
        assert_eq!(analysis.mean_difference, Some(f64::NEG_INFINITY));
        assert_eq!(analysis.verdict, TrendVerdict::Decreasing);
    }

    #[test]
    fn test_no_defined_differences_is_flat() {
        assert_eq!(verdict(&[]).verdict, TrendVerdict::Flat);
        assert_eq!(verdict(&[Some(3.0)]).verdict, TrendVerdict::Flat);
        let gaps = verdict(&[Some(1.0), None, Some(5.0)]);
        assert_eq!(gaps.mean_difference, None);
        assert_eq!(gaps.verdict, TrendVerdict::Flat);
    }

    #[test]
    fn test_categorical_column_rejected() {
        let table = Table::new(vec![Column::categorical("c", [Some("a"), Some("b")])]).unwrap();
        let err = TrendAnalyzer::analyze(&table, "c").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_COLUMN_KIND");
    }
}
