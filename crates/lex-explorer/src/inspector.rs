//! Schema inspection: shape, previews, descriptive statistics and
//! categorical value frequencies.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::stats;
use crate::table::{NullCount, Table};

/// Shape and column facts of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub null_counts: Vec<NullCount>,
}

/// Descriptive statistics of one numeric column.
///
/// Undefined statistics (no present values, or a single value for `std`)
/// are NaN and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    /// Number of present values
    pub count: usize,
    /// Number of missing values
    pub missing: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

/// Occurrence count of one categorical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Value frequencies of one categorical column, most frequent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalBreakdown {
    pub column: String,
    /// Number of present values; equals the sum of all counts
    pub total: usize,
    pub frequencies: Vec<ValueCount>,
}

/// Stateless schema inspector.
pub struct SchemaInspector;

impl SchemaInspector {
    /// First `n` rows, unmodified and in original order.
    pub fn preview(table: &Table, n: usize) -> Table {
        table.head(n)
    }

    /// Shape, column lists and per-column missing counts.
    pub fn info(table: &Table) -> DatasetInfo {
        let (rows, columns) = table.shape();
        DatasetInfo {
            rows,
            columns,
            column_names: to_owned(table.columns()),
            numeric_columns: to_owned(table.numeric_columns()),
            categorical_columns: to_owned(table.categorical_columns()),
            null_counts: table.null_counts(),
        }
    }

    /// Statistics for every numeric column, in column order.
    pub fn describe(table: &Table) -> Vec<ColumnStats> {
        table
            .iter_columns()
            .filter_map(|column| {
                let cells = column.numeric_cells()?;
                let values = stats::present(cells);
                Some(Self::column_stats(column.name(), &values, cells.len()))
            })
            .collect()
    }

    fn column_stats(name: &str, values: &[f64], rows: usize) -> ColumnStats {
        let sorted = stats::sorted(values);
        let (min, max) = match (sorted.first(), sorted.last()) {
            (Some(&min), Some(&max)) => (min, max),
            _ => (f64::NAN, f64::NAN),
        };

        ColumnStats {
            column: name.to_string(),
            count: values.len(),
            missing: rows - values.len(),
            mean: stats::mean(values),
            std: stats::sample_std(values),
            min,
            p25: stats::quantile_sorted(&sorted, 0.25),
            p50: stats::quantile_sorted(&sorted, 0.5),
            p75: stats::quantile_sorted(&sorted, 0.75),
            max,
        }
    }

    /// Value frequencies for every categorical column, in column order.
    pub fn categorical_breakdown(table: &Table) -> Vec<CategoricalBreakdown> {
        table
            .iter_columns()
            .filter_map(|column| {
                let cells = column.categorical_cells()?;
                let frequencies = value_counts(cells.iter().filter_map(|c| c.value()));
                Some(CategoricalBreakdown {
                    column: column.name().to_string(),
                    total: frequencies.iter().map(|f| f.count).sum(),
                    frequencies,
                })
            })
            .collect()
    }
}

/// Count values, ordered by descending count with ties in first-seen order.
pub(crate) fn value_counts<'a>(values: impl Iterator<Item = &'a String>) -> Vec<ValueCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();

    for value in values {
        match index.get(value.as_str()) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert(value.as_str(), counts.len());
                counts.push(ValueCount {
                    value: value.clone(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

fn to_owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}
