//! Configuration types for the exploration engine.
//!
//! The engine's formulas are fixed; configuration covers the knobs a
//! presentation layer may want to change (preview size, chart resolution,
//! which textual markers count as missing, the export file name).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ExplorerError;

/// Default textual markers treated as missing values at ingestion.
pub const DEFAULT_MISSING_MARKERS: [&str; 13] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Policy for handling missing values when cleaning a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CleaningStrategy {
    /// Remove every row that has a missing value in any column
    #[default]
    DropRowsWithNulls,
    /// Remove every column that has a missing value in any row
    DropColumnsWithNulls,
    /// Fill numeric columns with their mean; categorical columns untouched
    FillWithMean,
    /// Fill numeric columns with their median; categorical columns untouched
    FillWithMedian,
    /// Fill every missing value with zero ("0" in categorical columns)
    FillWithZero,
}

impl CleaningStrategy {
    /// All strategies, in the order a user is offered them.
    pub const ALL: [CleaningStrategy; 5] = [
        CleaningStrategy::DropRowsWithNulls,
        CleaningStrategy::DropColumnsWithNulls,
        CleaningStrategy::FillWithMean,
        CleaningStrategy::FillWithMedian,
        CleaningStrategy::FillWithZero,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::DropRowsWithNulls => "Drop rows with nulls",
            Self::DropColumnsWithNulls => "Drop columns with nulls",
            Self::FillWithMean => "Fill nulls with mean",
            Self::FillWithMedian => "Fill nulls with median",
            Self::FillWithZero => "Fill nulls with 0",
        }
    }
}

impl fmt::Display for CleaningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Configuration for the exploration engine and its session.
///
/// Use [`ExplorerConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_explorer::ExplorerConfig;
///
/// let config = ExplorerConfig::builder()
///     .preview_rows(10)
///     .histogram_bins(20)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Number of rows returned by a preview when the caller does not ask for
    /// a specific count.
    /// Default: 5
    pub preview_rows: usize,

    /// Multiplier applied to the IQR when computing outlier fences.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Number of equal-width bins in a histogram.
    /// Default: 30
    pub histogram_bins: usize,

    /// Trimmed cell texts that are read as missing values.
    /// Default: [`DEFAULT_MISSING_MARKERS`]
    pub missing_markers: Vec<String>,

    /// File name attached to exported cleaned data.
    /// Default: "cleaned_data.csv"
    pub export_file_name: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            iqr_multiplier: 1.5,
            histogram_bins: 30,
            missing_markers: DEFAULT_MISSING_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            export_file_name: "cleaned_data.csv".to_string(),
        }
    }
}

impl ExplorerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ExplorerConfigBuilder {
        ExplorerConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.preview_rows == 0 {
            return Err(ConfigValidationError::ZeroCount {
                field: "preview_rows".to_string(),
            });
        }

        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::ZeroCount {
                field: "histogram_bins".to_string(),
            });
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(ConfigValidationError::InvalidMultiplier(self.iqr_multiplier));
        }

        if self.export_file_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyFileName);
        }

        Ok(())
    }

    /// Whether a raw cell text is a missing-value marker.
    ///
    /// Matching is exact: `" "` and `" NA "` are present values.
    pub fn is_missing_marker(&self, raw: &str) -> bool {
        self.missing_markers.iter().any(|m| m == raw)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{field}': must be at least 1")]
    ZeroCount { field: String },

    #[error("Invalid IQR multiplier: {0} (must be finite and non-negative)")]
    InvalidMultiplier(f64),

    #[error("Export file name must not be empty")]
    EmptyFileName,
}

impl From<ConfigValidationError> for ExplorerError {
    fn from(err: ConfigValidationError) -> Self {
        ExplorerError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`ExplorerConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ExplorerConfigBuilder {
    preview_rows: Option<usize>,
    iqr_multiplier: Option<f64>,
    histogram_bins: Option<usize>,
    missing_markers: Option<Vec<String>>,
    export_file_name: Option<String>,
}

impl ExplorerConfigBuilder {
    /// Set the default number of preview rows.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Set the IQR multiplier used for outlier fences.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Set the number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Replace the set of missing-value markers.
    pub fn missing_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_markers = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    /// Set the file name attached to exported data.
    pub fn export_file_name(mut self, name: impl Into<String>) -> Self {
        self.export_file_name = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ExplorerConfig` or an error if validation fails.
    pub fn build(self) -> Result<ExplorerConfig, ConfigValidationError> {
        let defaults = ExplorerConfig::default();
        let config = ExplorerConfig {
            preview_rows: self.preview_rows.unwrap_or(defaults.preview_rows),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
            missing_markers: self.missing_markers.unwrap_or(defaults.missing_markers),
            export_file_name: self.export_file_name.unwrap_or(defaults.export_file_name),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExplorerConfig::default();
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(config.histogram_bins, 30);
        assert_eq!(config.export_file_name, "cleaned_data.csv");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ExplorerConfig::builder()
            .preview_rows(10)
            .histogram_bins(12)
            .missing_markers(["", "-"])
            .build()
            .unwrap();

        assert_eq!(config.preview_rows, 10);
        assert_eq!(config.histogram_bins, 12);
        assert!(config.is_missing_marker("-"));
        assert!(!config.is_missing_marker("NA"));
    }

    #[test]
    fn test_missing_markers_match_exactly() {
        let config = ExplorerConfig::default();
        assert!(config.is_missing_marker("NA"));
        assert!(config.is_missing_marker(""));
        assert!(!config.is_missing_marker("  NA "));
        assert!(!config.is_missing_marker("   "));
        assert!(!config.is_missing_marker("0"));
        assert!(!config.is_missing_marker("missing"));
    }

    #[test]
    fn test_validation_zero_bins() {
        let result = ExplorerConfig::builder().histogram_bins(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::ZeroCount { .. }
        ));
    }

    #[test]
    fn test_validation_negative_multiplier() {
        let result = ExplorerConfig::builder().iqr_multiplier(-1.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidMultiplier(_)
        ));
    }

    #[test]
    fn test_validation_error_converts() {
        let err: ExplorerError = ConfigValidationError::EmptyFileName.into();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_strategy_from_json() {
        let strategy: CleaningStrategy = serde_json::from_str("\"FillWithMedian\"").unwrap();
        assert_eq!(strategy, CleaningStrategy::FillWithMedian);
        assert_eq!(strategy.to_string(), "Fill nulls with median");
    }
}
