//! Per-user exploration session.
//!
//! A session owns the loaded table and the table analyses currently run
//! against. The only write is [`Session::apply_cleaning`] (or
//! [`Session::reset`]), which replaces the current table wholesale. Readers
//! take an `Arc` snapshot, so they see either the old table or the new one,
//! never a mix.
//!
//! Requests and responses are tagged with `"operation"` for a JSON-speaking
//! presentation layer:
//!
//! ```json
//! { "operation": "outliers", "column": "price" }
//! ```

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::charts::{self, BarChart, BoxPlotSummary, Histogram, LineSeries, ScatterSeries};
use crate::cleaner::{CleanedTable, DataCleaner, ExportArtifact};
use crate::config::{CleaningStrategy, ExplorerConfig};
use crate::correlation::{CorrelationEngine, CorrelationMatrix};
use crate::error::Result;
use crate::ingest::{self, SourceFormat};
use crate::inspector::{CategoricalBreakdown, ColumnStats, DatasetInfo, SchemaInspector};
use crate::outliers::{OutlierDetector, OutlierReport};
use crate::table::Table;
use crate::trend::{TrendAnalysis, TrendAnalyzer};

/// What the last applied cleaning did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningRecord {
    pub strategy: CleaningStrategy,
    pub applied_at: DateTime<Utc>,
    pub rows_removed: usize,
    pub columns_removed: usize,
    pub cells_filled: usize,
    pub rows: usize,
    pub columns: usize,
}

impl CleaningRecord {
    fn from_cleaned(cleaned: &CleanedTable) -> Self {
        let (rows, columns) = cleaned.table.shape();
        Self {
            strategy: cleaned.strategy,
            applied_at: Utc::now(),
            rows_removed: cleaned.rows_removed,
            columns_removed: cleaned.columns_removed,
            cells_filled: cleaned.cells_filled,
            rows,
            columns,
        }
    }
}

/// One engine operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Request {
    Preview {
        #[serde(default)]
        rows: Option<usize>,
    },
    Info,
    Describe,
    CategoricalBreakdown,
    Outliers {
        column: String,
    },
    Correlation,
    Trend {
        column: String,
    },
    Histogram {
        column: String,
        #[serde(default)]
        bins: Option<usize>,
    },
    BarCounts {
        column: String,
    },
    LineSeries {
        column: String,
    },
    Scatter {
        x: String,
        y: String,
    },
    BoxPlot {
        column: String,
    },
    Clean {
        strategy: CleaningStrategy,
    },
    Reset,
}

/// Outcome of a `Clean` request.
#[derive(Debug, Clone, Serialize)]
pub struct CleanOutcome {
    pub record: CleaningRecord,
    pub preview: Table,
    pub artifact: ExportArtifact,
}

/// Result of one engine operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "operation", content = "data", rename_all = "snake_case")]
pub enum Response {
    Preview(Table),
    Info(DatasetInfo),
    Describe(Vec<ColumnStats>),
    CategoricalBreakdown(Vec<CategoricalBreakdown>),
    Outliers(OutlierReport),
    Correlation(CorrelationMatrix),
    Trend(TrendAnalysis),
    Histogram(Histogram),
    BarCounts(BarChart),
    LineSeries(LineSeries),
    Scatter(ScatterSeries),
    BoxPlot(BoxPlotSummary),
    Clean(CleanOutcome),
    Reset(DatasetInfo),
}

/// The current table and the cleaning that produced it, swapped together.
#[derive(Debug, Clone)]
struct CurrentState {
    table: Arc<Table>,
    cleaning: Option<CleaningRecord>,
}

/// Loaded data plus the table analyses run against.
#[derive(Debug)]
pub struct Session {
    source_name: String,
    loaded_at: DateTime<Utc>,
    config: ExplorerConfig,
    original: Arc<Table>,
    state: RwLock<CurrentState>,
}

impl Session {
    /// Start a session over an already built table.
    pub fn new(source_name: impl Into<String>, table: Table, config: ExplorerConfig) -> Result<Self> {
        config.validate()?;
        let original = Arc::new(table);
        Ok(Self {
            source_name: source_name.into(),
            loaded_at: Utc::now(),
            config,
            state: RwLock::new(CurrentState {
                table: Arc::clone(&original),
                cleaning: None,
            }),
            original,
        })
    }

    /// Start a session from uploaded bytes; the format comes from `file_name`.
    pub fn from_upload(file_name: &str, bytes: &[u8], config: ExplorerConfig) -> Result<Self> {
        let format = SourceFormat::from_file_name(file_name)?;
        let table = ingest::load_bytes(bytes, format, &config)?;
        Self::new(file_name, table, config)
    }

    /// Start a session from a file on disk.
    pub fn open(path: impl AsRef<Path>, config: ExplorerConfig) -> Result<Self> {
        let path = path.as_ref();
        let table = ingest::load_path(path, &config)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, table, config)
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// The table as loaded, before any cleaning.
    pub fn original(&self) -> Arc<Table> {
        Arc::clone(&self.original)
    }

    /// Snapshot of the table analyses currently run against.
    pub fn current(&self) -> Arc<Table> {
        Arc::clone(&self.state.read().table)
    }

    pub fn last_cleaning(&self) -> Option<CleaningRecord> {
        self.state.read().cleaning.clone()
    }

    /// The current table together with the cleaning that produced it,
    /// read under one lock.
    pub fn snapshot(&self) -> (Arc<Table>, Option<CleaningRecord>) {
        let state = self.state.read();
        (Arc::clone(&state.table), state.cleaning.clone())
    }

    /// Clean the original table and make the result current.
    ///
    /// Strategies do not stack: each call starts again from the loaded data.
    pub fn apply_cleaning(&self, strategy: CleaningStrategy) -> CleanedTable {
        self.clean_and_swap(strategy).0
    }

    fn clean_and_swap(&self, strategy: CleaningStrategy) -> (CleanedTable, CleaningRecord) {
        let cleaned = DataCleaner::clean(&self.original, strategy);
        let record = CleaningRecord::from_cleaned(&cleaned);

        *self.state.write() = CurrentState {
            table: Arc::new(cleaned.table.clone()),
            cleaning: Some(record.clone()),
        };

        info!(source = %self.source_name, %strategy, "current table replaced");
        (cleaned, record)
    }

    /// Make the original table current again.
    pub fn reset(&self) {
        *self.state.write() = CurrentState {
            table: Arc::clone(&self.original),
            cleaning: None,
        };
        info!(source = %self.source_name, "current table reset");
    }

    /// Export the current table as `export_file_name` from the config.
    pub fn export_current(&self) -> Result<ExportArtifact> {
        let table = self.current();
        Ok(ExportArtifact {
            file_name: self.config.export_file_name.clone(),
            content_type: crate::cleaner::CSV_CONTENT_TYPE.to_string(),
            bytes: crate::cleaner::export_csv(&table)?,
        })
    }

    /// Run exactly one operation against the current table.
    ///
    /// A failed operation leaves the session unchanged.
    #[instrument(skip(self), fields(source = %self.source_name))]
    pub fn execute(&self, request: Request) -> Result<Response> {
        let table = self.current();
        let response = match request {
            Request::Preview { rows } => Response::Preview(SchemaInspector::preview(
                &table,
                rows.unwrap_or(self.config.preview_rows),
            )),
            Request::Info => Response::Info(SchemaInspector::info(&table)),
            Request::Describe => Response::Describe(SchemaInspector::describe(&table)),
            Request::CategoricalBreakdown => {
                Response::CategoricalBreakdown(SchemaInspector::categorical_breakdown(&table))
            }
            Request::Outliers { column } => Response::Outliers(
                OutlierDetector::from_config(&self.config).detect(&table, &column)?,
            ),
            Request::Correlation => Response::Correlation(CorrelationEngine::correlate(&table)?),
            Request::Trend { column } => Response::Trend(TrendAnalyzer::analyze(&table, &column)?),
            Request::Histogram { column, bins } => Response::Histogram(charts::histogram(
                &table,
                &column,
                bins.unwrap_or(self.config.histogram_bins),
            )?),
            Request::BarCounts { column } => {
                Response::BarCounts(charts::bar_counts(&table, &column)?)
            }
            Request::LineSeries { column } => {
                Response::LineSeries(charts::line_series(&table, &column)?)
            }
            Request::Scatter { x, y } => Response::Scatter(charts::scatter(&table, &x, &y)?),
            Request::BoxPlot { column } => Response::BoxPlot(charts::box_plot(
                &table,
                &column,
                self.config.iqr_multiplier,
            )?),
            Request::Clean { strategy } => {
                let (cleaned, record) = self.clean_and_swap(strategy);
                let artifact = cleaned.export(self.config.export_file_name.clone())?;
                Response::Clean(CleanOutcome {
                    record,
                    preview: cleaned.table.head(self.config.preview_rows),
                    artifact,
                })
            }
            Request::Reset => {
                self.reset();
                Response::Reset(SchemaInspector::info(&self.original))
            }
        };
        Ok(response)
    }
}

static_assertions::assert_impl_all!(Session: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, Column};
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        let table = Table::new(vec![
            Column::categorical("city", [Some("Oslo"), Some("Lima"), None, Some("Oslo")]),
            Column::integer("visits", [Some(3), None, Some(5), Some(40)]),
            Column::numeric("spend", [Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
        ])
        .unwrap();
        Session::new("visits.csv", table, ExplorerConfig::default()).unwrap()
    }

    #[test]
    fn test_apply_cleaning_swaps_current() {
        let session = session();
        let before = session.current();

        let cleaned = session.apply_cleaning(CleaningStrategy::DropRowsWithNulls);

        assert_eq!(cleaned.table.row_count(), 2);
        assert_eq!(session.current().row_count(), 2);
        // Earlier snapshots are unaffected.
        assert_eq!(before.row_count(), 4);
        assert_eq!(
            session.last_cleaning().map(|r| r.rows_removed),
            Some(2)
        );
    }

    #[test]
    fn test_cleaning_starts_from_original() {
        let session = session();
        session.apply_cleaning(CleaningStrategy::DropColumnsWithNulls);
        assert_eq!(session.current().columns(), vec!["spend"]);

        session.apply_cleaning(CleaningStrategy::FillWithZero);
        assert_eq!(session.current().column_count(), 3);
        assert!(!session.current().has_missing());
    }

    #[test]
    fn test_snapshot_pairs_table_with_its_cleaning() {
        let session = Arc::new(session());
        let writer = {
            let session = Arc::clone(&session);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    session.apply_cleaning(CleaningStrategy::DropRowsWithNulls);
                    session.apply_cleaning(CleaningStrategy::DropColumnsWithNulls);
                    session.reset();
                }
            })
        };

        for _ in 0..2000 {
            let (table, cleaning) = session.snapshot();
            match cleaning {
                Some(record) => assert_eq!((record.rows, record.columns), table.shape()),
                None => assert!(Arc::ptr_eq(&table, &session.original())),
            }
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_reset_restores_original() {
        let session = session();
        session.apply_cleaning(CleaningStrategy::DropRowsWithNulls);
        session.reset();
        assert!(Arc::ptr_eq(&session.current(), &session.original()));
        assert_eq!(session.last_cleaning(), None);
    }

    #[test]
    fn test_failed_operation_leaves_session_unchanged() {
        let session = session();
        let before = session.current();

        let err = session
            .execute(Request::Outliers {
                column: "city".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_COLUMN_KIND");
        assert!(err.is_operation_error());
        assert!(Arc::ptr_eq(&before, &session.current()));
    }

    #[test]
    fn test_execute_runs_against_current_table() {
        let session = session();
        session.apply_cleaning(CleaningStrategy::FillWithMedian);

        match session.execute(Request::LineSeries {
            column: "visits".to_string(),
        }) {
            Ok(Response::LineSeries(series)) => {
                assert_eq!(series.points[1].value, Cell::Present(5.0));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_clean_request_returns_artifact() {
        let session = session();
        match session.execute(Request::Clean {
            strategy: CleaningStrategy::DropColumnsWithNulls,
        }) {
            Ok(Response::Clean(outcome)) => {
                assert_eq!(outcome.artifact.file_name, "cleaned_data.csv");
                assert_eq!(outcome.artifact.content_type, "text/csv; charset=utf-8");
                assert_eq!(
                    String::from_utf8(outcome.artifact.bytes).unwrap(),
                    "spend\n1.0\n2.0\n3.0\n4.0\n"
                );
                assert_eq!(outcome.record.columns_removed, 2);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_request_json_shape() {
        let request: Request =
            serde_json::from_str(r#"{"operation":"histogram","column":"spend"}"#).unwrap();
        assert_eq!(
            request,
            Request::Histogram {
                column: "spend".to_string(),
                bins: None
            }
        );

        let response = session().execute(Request::Trend {
            column: "spend".to_string(),
        });
        let json = serde_json::to_value(response.unwrap()).unwrap();
        assert_eq!(json["operation"], "trend");
        assert_eq!(json["data"]["verdict"], "Increasing");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExplorerConfig {
            histogram_bins: 0,
            ..ExplorerConfig::default()
        };
        let err = Session::new("x.csv", Table::default(), config).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }
}
