//! In-memory table model shared by every engine component.
//!
//! A [`Table`] is an ordered list of named [`Column`]s of equal length. Each
//! column carries a [`ColumnKind`] decided once when the table is built, and
//! every cell is a [`Cell`]: either a present value or `Missing`. Tables are
//! never mutated in place; cleaning and row selection produce new tables.

mod inference;

pub(crate) use inference::classify_column;

use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

use crate::config::ExplorerConfig;
use crate::error::{ExplorerError, Result};

// =============================================================================
// Cells
// =============================================================================

/// A single table value that may be missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<T> {
    Present(T),
    Missing,
}

impl<T> Cell<T> {
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Borrow the present value, if any.
    #[inline]
    pub fn value(&self) -> Option<&T> {
        match self {
            Cell::Present(v) => Some(v),
            Cell::Missing => None,
        }
    }
}

impl<T: Copy> Cell<T> {
    /// Copy out the present value, if any.
    #[inline]
    pub fn get(&self) -> Option<T> {
        self.value().copied()
    }
}

impl<T> From<Option<T>> for Cell<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Cell::Present(v),
            None => Cell::Missing,
        }
    }
}

/// Present values serialize as themselves, missing values as `null`.
impl<T: Serialize> Serialize for Cell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Present(v) => v.serialize(serializer),
            Cell::Missing => serializer.serialize_none(),
        }
    }
}

// =============================================================================
// Columns
// =============================================================================

/// Inferred kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Every present value is a number
    Numeric,
    /// Anything else (text, discrete labels)
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => f.write_str("numeric"),
            ColumnKind::Categorical => f.write_str("categorical"),
        }
    }
}

/// Storage for a column's cells, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// `integer` is true when every value came from an integer literal and
    /// none is missing; it only affects how values are written out.
    Numeric { cells: Vec<Cell<f64>>, integer: bool },
    Categorical(Vec<Cell<String>>),
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    /// Build a floating-point numeric column.
    pub fn numeric<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        Self::from_numeric_cells(name, values.into_iter().map(Cell::from).collect(), false)
    }

    /// Build an integer-valued numeric column.
    pub fn integer<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<i64>>,
    {
        let cells = values
            .into_iter()
            .map(|v| Cell::from(v.map(|i| i as f64)))
            .collect();
        Self::from_numeric_cells(name, cells, true)
    }

    /// Build a categorical column.
    pub fn categorical<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: ColumnValues::Categorical(
                values.into_iter().map(|v| Cell::from(v.map(Into::into))).collect(),
            ),
        }
    }

    /// A column with any missing cell is stored as floating point, so the
    /// integer flag is dropped for it.
    pub(crate) fn from_numeric_cells(
        name: impl Into<String>,
        cells: Vec<Cell<f64>>,
        integer: bool,
    ) -> Self {
        let integer = integer && !cells.iter().any(Cell::is_missing);
        Self {
            name: name.into(),
            values: ColumnValues::Numeric { cells, integer },
        }
    }

    pub(crate) fn from_categorical_cells(name: impl Into<String>, cells: Vec<Cell<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Categorical(cells),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        match self.values {
            ColumnValues::Numeric { .. } => ColumnKind::Numeric,
            ColumnValues::Categorical(_) => ColumnKind::Categorical,
        }
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric { cells, .. } => cells.len(),
            ColumnValues::Categorical(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric cells, or `None` for a categorical column.
    pub fn numeric_cells(&self) -> Option<&[Cell<f64>]> {
        match &self.values {
            ColumnValues::Numeric { cells, .. } => Some(cells),
            ColumnValues::Categorical(_) => None,
        }
    }

    /// Categorical cells, or `None` for a numeric column.
    pub fn categorical_cells(&self) -> Option<&[Cell<String>]> {
        match &self.values {
            ColumnValues::Categorical(cells) => Some(cells),
            ColumnValues::Numeric { .. } => None,
        }
    }

    /// Whether numeric values are written without a fractional part.
    pub fn is_integer(&self) -> bool {
        matches!(self.values, ColumnValues::Numeric { integer: true, .. })
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match &self.values {
            ColumnValues::Numeric { cells, .. } => cells[row].is_missing(),
            ColumnValues::Categorical(cells) => cells[row].is_missing(),
        }
    }

    pub fn null_count(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric { cells, .. } => cells.iter().filter(|c| c.is_missing()).count(),
            ColumnValues::Categorical(cells) => cells.iter().filter(|c| c.is_missing()).count(),
        }
    }

    pub fn has_missing(&self) -> bool {
        self.null_count() > 0
    }

    /// Text rendering of one cell, `None` when missing.
    pub fn render(&self, row: usize) -> Option<String> {
        match &self.values {
            ColumnValues::Numeric { cells, integer } => {
                cells[row].get().map(|v| format_number(v, *integer))
            }
            ColumnValues::Categorical(cells) => cells[row].value().cloned(),
        }
    }

    /// Copy of this column restricted to the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> Column {
        let values = match &self.values {
            ColumnValues::Numeric { cells, integer } => ColumnValues::Numeric {
                cells: rows.iter().map(|&r| cells[r]).collect(),
                integer: *integer,
            },
            ColumnValues::Categorical(cells) => {
                ColumnValues::Categorical(rows.iter().map(|&r| cells[r].clone()).collect())
            }
        };
        Column {
            name: self.name.clone(),
            values,
        }
    }
}

/// Format a numeric value for display or export.
///
/// Integer columns print whole values without a fractional part. Everything
/// else prints the shortest round-trip decimal with at least one fractional
/// digit, switching to exponent form (`1e+20`, `2.5e-07`) at or above 1e16
/// and below 1e-4.
pub fn format_number(value: f64, integer: bool) -> String {
    if integer && value.fract() == 0.0 && value.abs() < 9.0e15 {
        return format!("{}", value as i64);
    }
    let magnitude = value.abs();
    if value.is_finite() && magnitude != 0.0 && !(1.0e-4..1.0e16).contains(&magnitude) {
        return format_exponent(value);
    }
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

/// `1e20` becomes `1e+20`, `1e-7` becomes `1e-07`.
fn format_exponent(value: f64) -> String {
    let text = format!("{value:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

// =============================================================================
// Table
// =============================================================================

/// Missing-value count for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullCount {
    pub column: String,
    pub missing: usize,
}

/// An immutable, column-oriented table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table, checking that every column has the same length and
    /// that column names are unique.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.len() != row_count {
                return Err(ExplorerError::InvalidTable(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name(),
                    column.len(),
                    row_count
                )));
            }
            if !seen.insert(column.name()) {
                return Err(ExplorerError::InvalidTable(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }

        Ok(Self { columns, row_count })
    }

    /// Build a table from raw text columns, classifying each column once.
    ///
    /// `None` cells and cells matching a configured missing marker become
    /// [`Cell::Missing`].
    pub fn from_text_columns(
        columns: Vec<(String, Vec<Option<String>>)>,
        config: &ExplorerConfig,
    ) -> Result<Self> {
        let classified = columns
            .into_iter()
            .map(|(name, raw)| classify_column(name, raw, config))
            .collect();
        Self::new(classified)
    }

    /// `(row_count, column_count)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count, self.columns.len())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in original order.
    pub fn columns(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns_of_kind(ColumnKind::Numeric)
    }

    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns_of_kind(ColumnKind::Categorical)
    }

    fn columns_of_kind(&self, kind: ColumnKind) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind() == kind)
            .map(Column::name)
            .collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| ExplorerError::ColumnNotFound(name.to_string()))
    }

    pub fn kind(&self, name: &str) -> Result<ColumnKind> {
        self.column(name).map(Column::kind)
    }

    /// Numeric cells of a column, failing for categorical columns.
    pub fn numeric_column(&self, name: &str) -> Result<&[Cell<f64>]> {
        let column = self.column(name)?;
        column
            .numeric_cells()
            .ok_or_else(|| ExplorerError::InvalidColumnKind {
                column: name.to_string(),
                expected: ColumnKind::Numeric,
                found: column.kind(),
            })
    }

    /// Categorical cells of a column, failing for numeric columns.
    pub fn categorical_column(&self, name: &str) -> Result<&[Cell<String>]> {
        let column = self.column(name)?;
        column
            .categorical_cells()
            .ok_or_else(|| ExplorerError::InvalidColumnKind {
                column: name.to_string(),
                expected: ColumnKind::Categorical,
                found: column.kind(),
            })
    }

    /// Missing-value count per column, in column order.
    pub fn null_counts(&self) -> Vec<NullCount> {
        self.columns
            .iter()
            .map(|c| NullCount {
                column: c.name().to_string(),
                missing: c.null_count(),
            })
            .collect()
    }

    pub fn has_missing(&self) -> bool {
        self.columns.iter().any(Column::has_missing)
    }

    pub fn row_has_missing(&self, row: usize) -> bool {
        self.columns.iter().any(|c| c.is_missing(row))
    }

    /// Rendered cells of one row, `None` for missing values.
    pub fn row(&self, row: usize) -> Vec<Option<String>> {
        self.columns.iter().map(|c| c.render(row)).collect()
    }

    /// First `n` rows (fewer if the table is shorter).
    pub fn head(&self, n: usize) -> Table {
        let rows: Vec<usize> = (0..n.min(self.row_count)).collect();
        self.take_rows(&rows)
    }

    /// New table holding only the given rows, all columns retained.
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            row_count: rows.len(),
        }
    }

    /// New table holding only the columns accepted by `keep`.
    pub fn filter_columns(&self, keep: impl Fn(&Column) -> bool) -> Table {
        let columns: Vec<Column> = self.columns.iter().filter(|&c| keep(c)).cloned().collect();
        // A table without columns has no rows.
        Table {
            row_count: if columns.is_empty() { 0 } else { self.row_count },
            columns,
        }
    }

    /// New table with every column passed through `f`.
    pub(crate) fn map_columns(&self, f: impl FnMut(&Column) -> Column) -> Table {
        Table {
            columns: self.columns.iter().map(f).collect(),
            row_count: self.row_count,
        }
    }
}

static_assertions::assert_impl_all!(Table: Send, Sync);

/// Serialized as `{ "columns": [{name, kind}], "rows": [[...], ...] }`.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Header<'a> {
            name: &'a str,
            kind: ColumnKind,
        }

        struct Rows<'a>(&'a Table);
        struct Row<'a>(&'a Table, usize);

        impl Serialize for Rows<'_> {
            fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
                let mut seq = s.serialize_seq(Some(self.0.row_count))?;
                for row in 0..self.0.row_count {
                    seq.serialize_element(&Row(self.0, row))?;
                }
                seq.end()
            }
        }

        impl Serialize for Row<'_> {
            fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
                let Row(table, row) = *self;
                let mut seq = s.serialize_seq(Some(table.columns.len()))?;
                for column in &table.columns {
                    match column.values() {
                        ColumnValues::Numeric { cells, .. } => seq.serialize_element(&cells[row])?,
                        ColumnValues::Categorical(cells) => seq.serialize_element(&cells[row])?,
                    }
                }
                seq.end()
            }
        }

        let headers: Vec<Header<'_>> = self
            .columns
            .iter()
            .map(|c| Header {
                name: c.name(),
                kind: c.kind(),
            })
            .collect();

        let mut state = serializer.serialize_struct("Table", 2)?;
        state.serialize_field("columns", &headers)?;
        state.serialize_field("rows", &Rows(self))?;
        state.end()
    }
}
