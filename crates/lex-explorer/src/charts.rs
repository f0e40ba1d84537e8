//! Chart data for the presentation layer.
//!
//! Nothing here renders; each function returns the series a chart needs.

use serde::Serialize;
use tracing::debug;

use crate::error::{ExplorerError, Result};
use crate::inspector::{ValueCount, value_counts};
use crate::outliers::Fences;
use crate::stats;
use crate::table::{Cell, Table};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Sum of all bin counts.
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarChart {
    pub column: String,
    pub bars: Vec<ValueCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinePoint {
    pub row: usize,
    pub value: Cell<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub column: String,
    pub points: Vec<LinePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub row: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub x: String,
    pub y: String,
    pub points: Vec<ScatterPoint>,
}

/// Five-number summary with IQR whiskers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotSummary {
    pub column: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Smallest present value not below the lower fence
    pub lower_whisker: f64,
    /// Largest present value not above the upper fence
    pub upper_whisker: f64,
    /// Values outside the fences, ascending
    pub outliers: Vec<f64>,
}

/// Equal-width histogram over the finite present values of a numeric column.
///
/// The last bin is closed so the maximum lands in it. A constant column
/// yields a single zero-width bin holding every value.
pub fn histogram(table: &Table, column: &str, bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(ExplorerError::InvalidConfig(
            "histogram needs at least one bin".to_string(),
        ));
    }

    let cells = table.numeric_column(column)?;
    let values: Vec<f64> = stats::present(cells)
        .into_iter()
        .filter(|v| v.is_finite())
        .collect();
    let sorted = stats::sorted(&values);

    let (min, max) = match (sorted.first(), sorted.last()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => {
            return Err(ExplorerError::EmptyInput(format!(
                "column '{column}' has no values to bin"
            )));
        }
    };

    if max == min {
        return Ok(Histogram {
            column: column.to_string(),
            bins: vec![HistogramBin {
                start: min,
                end: max,
                count: sorted.len(),
            }],
        });
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in &sorted {
        let index = (((value - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    debug!(column, bins, width, "built histogram");

    Ok(Histogram {
        column: column.to_string(),
        bins: counts
            .into_iter()
            .enumerate()
            .map(|(idx, count)| HistogramBin {
                start: min + idx as f64 * width,
                end: if idx + 1 == bins {
                    max
                } else {
                    min + (idx as f64 + 1.0) * width
                },
                count,
            })
            .collect(),
    })
}

/// Value counts of a categorical column, most frequent first.
pub fn bar_counts(table: &Table, column: &str) -> Result<BarChart> {
    let cells = table.categorical_column(column)?;
    Ok(BarChart {
        column: column.to_string(),
        bars: value_counts(cells.iter().filter_map(|c| c.value())),
    })
}

/// One point per row, missing cells included, in row order.
pub fn line_series(table: &Table, column: &str) -> Result<LineSeries> {
    let cells = table.numeric_column(column)?;
    Ok(LineSeries {
        column: column.to_string(),
        points: cells
            .iter()
            .enumerate()
            .map(|(row, &value)| LinePoint { row, value })
            .collect(),
    })
}

/// Points for the rows where both columns are present.
pub fn scatter(table: &Table, x: &str, y: &str) -> Result<ScatterSeries> {
    let xs = table.numeric_column(x)?;
    let ys = table.numeric_column(y)?;

    let points = xs
        .iter()
        .zip(ys)
        .enumerate()
        .filter_map(|(row, (a, b))| {
            Some(ScatterPoint {
                row,
                x: a.get()?,
                y: b.get()?,
            })
        })
        .collect();

    Ok(ScatterSeries {
        x: x.to_string(),
        y: y.to_string(),
        points,
    })
}

/// Box plot summary using the same fences as outlier detection.
pub fn box_plot(table: &Table, column: &str, multiplier: f64) -> Result<BoxPlotSummary> {
    let cells = table.numeric_column(column)?;
    let sorted = stats::sorted(&stats::present(cells));

    let (min, max) = match (sorted.first(), sorted.last()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => {
            return Err(ExplorerError::EmptyInput(format!(
                "column '{column}' has no values to summarize"
            )));
        }
    };

    let fences = Fences::from_sorted(&sorted, multiplier);
    let (inside, outliers): (Vec<f64>, Vec<f64>) =
        sorted.iter().partition(|&&v| !fences.is_outlier(v));

    // Q1 and Q3 lie within the fences, so `inside` is never empty.
    let lower_whisker = inside.first().copied().unwrap_or(fences.q1);
    let upper_whisker = inside.last().copied().unwrap_or(fences.q3);

    Ok(BoxPlotSummary {
        column: column.to_string(),
        min,
        q1: fences.q1,
        median: stats::quantile_sorted(&sorted, 0.5),
        q3: fences.q3,
        max,
        lower_whisker,
        upper_whisker,
        outliers,
    })
}
