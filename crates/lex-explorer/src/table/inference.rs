//! Column kind classification, run once when a table is built from text.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{Cell, Column};
use crate::config::ExplorerConfig;

// Literal grammars - compiled once at startup
static DECIMAL_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("Invalid regex: decimal")
});
static INTEGER_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("Invalid regex: integer"));
static INFINITY_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[+-]?inf(inity)?$").expect("Invalid regex: infinity"));

/// Parse a cell text as a number.
///
/// Accepts plain decimal and scientific notation plus `inf`/`infinity`.
/// Thousands separators, currency symbols and percent signs are not numbers.
fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if DECIMAL_LITERAL.is_match(trimmed) || INFINITY_LITERAL.is_match(trimmed) {
        trimmed.parse::<f64>().ok()
    } else {
        None
    }
}

fn is_integer_literal(raw: &str) -> bool {
    INTEGER_LITERAL.is_match(raw.trim())
}

/// Classify one raw text column.
///
/// The column is numeric iff every non-missing cell parses as a number
/// (so an all-missing column is numeric). Otherwise it is categorical and
/// keeps the original cell text.
pub(crate) fn classify_column(
    name: String,
    raw: Vec<Option<String>>,
    config: &ExplorerConfig,
) -> Column {
    let cells: Vec<Cell<String>> = raw
        .into_iter()
        .map(|value| match value {
            Some(text) if !config.is_missing_marker(&text) => Cell::Present(text),
            _ => Cell::Missing,
        })
        .collect();

    let first_text = cells
        .iter()
        .filter_map(Cell::value)
        .position(|text| parse_number(text).is_none());
    if let Some(index) = first_text {
        debug!(column = %name, value_index = index, "classified as categorical");
        return Column::from_categorical_cells(name, cells);
    }

    let integer = cells
        .iter()
        .filter_map(Cell::value)
        .all(|text| is_integer_literal(text));
    let numbers = cells
        .iter()
        .map(|cell| match cell {
            Cell::Present(text) => parse_number(text).map_or(Cell::Missing, Cell::Present),
            Cell::Missing => Cell::Missing,
        })
        .collect();

    debug!(column = %name, integer, "classified as numeric");
    Column::from_numeric_cells(name, numbers, integer)
}
