//! Descriptive statistics over present numeric values.
//!
//! All helpers take plain `f64` slices that already exclude missing values.
//! Undefined results are `f64::NAN`.

use std::cmp::Ordering;

use crate::table::Cell;

/// Present values of a numeric column.
pub fn present(cells: &[Cell<f64>]) -> Vec<f64> {
    cells.iter().filter_map(Cell::get).collect()
}

/// Sort ascending. Present values never contain NaN.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Arithmetic mean; NaN when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (ddof = 1); NaN with fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = mean(values);
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0)
}

/// Sample standard deviation (ddof = 1); NaN with fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Quantile of an ascending slice by linear interpolation between order
/// statistics at position `q * (n - 1)`; NaN when empty.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() as f64 - 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Quantile of unsorted values.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&sorted(values), q)
}

/// Median (50th percentile).
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// First and third quartiles of an ascending slice.
pub fn quartiles_sorted(sorted: &[f64]) -> (f64, f64) {
    (quantile_sorted(sorted, 0.25), quantile_sorted(sorted, 0.75))
}
