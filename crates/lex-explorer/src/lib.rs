//! Exploratory Data Analysis Engine
//!
//! Profiling, outlier detection, correlation, trend and cleaning over a
//! single uploaded table.
//!
//! # Overview
//!
//! - **Table**: column-oriented, every column classified once as numeric or
//!   categorical, missing values as an explicit [`Cell::Missing`]
//! - **Schema Inspection**: shape, previews, descriptive statistics and
//!   categorical frequencies
//! - **Outliers**: IQR fences with strict comparisons
//! - **Correlation**: pairwise-complete Pearson matrix over numeric columns
//! - **Trend**: sign of the mean first difference in row order
//! - **Cleaning**: five null-handling strategies and CSV export
//! - **Charts**: histogram, bar, line, scatter and box plot series
//!
//! The analysis components are stateless. [`Session`] holds the loaded table
//! for a presentation layer and swaps in cleaned tables atomically.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_explorer::{CleaningStrategy, ExplorerConfig, OutlierDetector, Session};
//!
//! let session = Session::open("sales.csv", ExplorerConfig::default())?;
//! let table = session.current();
//!
//! let report = OutlierDetector::default().detect(&table, "revenue")?;
//! println!("{} outliers outside [{}, {}]", report.count, report.lower(), report.upper());
//!
//! let cleaned = session.apply_cleaning(CleaningStrategy::FillWithMedian);
//! let artifact = cleaned.export("cleaned_data.csv")?;
//! std::fs::write(&artifact.file_name, &artifact.bytes)?;
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use lex_explorer::ExplorerConfig;
//!
//! let config = ExplorerConfig::builder()
//!     .preview_rows(10)
//!     .iqr_multiplier(3.0)
//!     .missing_markers(["", "NA", "-"])
//!     .build()?;
//! ```

pub mod charts;
pub mod cleaner;
pub mod config;
pub mod correlation;
pub mod error;
pub mod ingest;
pub mod inspector;
pub mod outliers;
pub mod session;
pub mod stats;
pub mod table;
pub mod trend;

// Re-exports for convenient access
pub use charts::{
    BarChart, BoxPlotSummary, Histogram, HistogramBin, LinePoint, LineSeries, ScatterPoint,
    ScatterSeries,
};
pub use cleaner::{CSV_CONTENT_TYPE, CleanedTable, DataCleaner, ExportArtifact, export_csv};
pub use config::{
    CleaningStrategy, ConfigValidationError, DEFAULT_MISSING_MARKERS, ExplorerConfig,
    ExplorerConfigBuilder,
};
pub use correlation::{CorrelationEngine, CorrelationMatrix};
pub use error::{ExplorerError, Result as ExplorerResult, ResultExt};
pub use ingest::{SourceFormat, load_bytes, load_path};
pub use inspector::{CategoricalBreakdown, ColumnStats, DatasetInfo, SchemaInspector, ValueCount};
pub use outliers::{Fences, OutlierDetector, OutlierReport};
pub use session::{CleanOutcome, CleaningRecord, Request, Response, Session};
pub use table::{Cell, Column, ColumnKind, ColumnValues, NullCount, Table};
pub use trend::{TrendAnalysis, TrendAnalyzer, TrendVerdict};
