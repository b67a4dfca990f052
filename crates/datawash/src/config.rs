//! Configuration types for a cleaning session.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic session setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Cell values read as missing by default, matching the usual dataframe NA set.
/// Empty fields are always missing.
pub const DEFAULT_NULL_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Options controlling how uploaded CSV bytes are parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Whether the first row holds column names.
    /// Default: true
    pub has_header: bool,

    /// Field separator. Must be a single ASCII character.
    /// Default: ','
    pub separator: char,

    /// Number of rows sampled for type inference; `None` scans the whole file.
    /// Default: Some(1000)
    pub infer_schema_length: Option<usize>,

    /// Cell values read as missing in addition to empty fields.
    /// Default: [`DEFAULT_NULL_MARKERS`]
    pub null_markers: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            separator: ',',
            infer_schema_length: Some(1000),
            null_markers: DEFAULT_NULL_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Configuration for a cleaning session.
///
/// Use [`SessionConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use datawash::config::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .preview_rows(10)
///     .variance_threshold(0.05)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// CSV parsing options used for every upload.
    pub csv: CsvOptions,

    /// Number of rows shown by table and candidate previews.
    /// Default: 5
    pub preview_rows: usize,

    /// Variance at or below which numeric columns are dropped by feature selection.
    /// Default: 0.01
    pub variance_threshold: f64,

    /// Directory the export is written to when no explicit path is given.
    /// Default: "."
    pub output_dir: PathBuf,

    /// File name of the default export.
    /// Default: "processed_data.csv"
    pub export_file_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            csv: CsvOptions::default(),
            preview_rows: 5,
            variance_threshold: 0.01,
            output_dir: PathBuf::from("."),
            export_file_name: "processed_data.csv".to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: SessionConfig = serde_json::from_str(&raw)?;
        config
            .validate()
            .map_err(|e| crate::WashError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Full path of the default export file.
    pub fn export_path(&self) -> PathBuf {
        self.output_dir.join(&self.export_file_name)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.preview_rows == 0 {
            return Err(ConfigValidationError::InvalidPreviewRows(self.preview_rows));
        }

        if !self.variance_threshold.is_finite() || self.variance_threshold < 0.0 {
            return Err(ConfigValidationError::InvalidVarianceThreshold(
                self.variance_threshold,
            ));
        }

        if self.csv.infer_schema_length == Some(0) {
            return Err(ConfigValidationError::InvalidInferSchemaLength);
        }

        if !self.csv.separator.is_ascii() {
            return Err(ConfigValidationError::InvalidSeparator(self.csv.separator));
        }

        if self.export_file_name.trim().is_empty() || !self.export_file_name.ends_with(".csv") {
            return Err(ConfigValidationError::InvalidExportFileName(
                self.export_file_name.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid preview rows: {0} (must be at least 1)")]
    InvalidPreviewRows(usize),

    #[error("Invalid variance threshold: {0} (must be a finite value >= 0.0)")]
    InvalidVarianceThreshold(f64),

    #[error("Invalid schema inference length: must be at least 1 row when set")]
    InvalidInferSchemaLength,

    #[error("Invalid separator {0:?}: must be a single ASCII character")]
    InvalidSeparator(char),

    #[error("Invalid export file name '{0}': must be non-empty and end with .csv")]
    InvalidExportFileName(String),
}

/// Builder for [`SessionConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    csv: Option<CsvOptions>,
    preview_rows: Option<usize>,
    variance_threshold: Option<f64>,
    output_dir: Option<PathBuf>,
    export_file_name: Option<String>,
}

impl SessionConfigBuilder {
    /// Set the CSV parsing options.
    pub fn csv(mut self, csv: CsvOptions) -> Self {
        self.csv = Some(csv);
        self
    }

    /// Set the number of rows shown by previews.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Set the default variance threshold for feature selection.
    ///
    /// # Arguments
    /// * `threshold` - Population variance at or below which a numeric column is dropped
    pub fn variance_threshold(mut self, threshold: f64) -> Self {
        self.variance_threshold = Some(threshold);
        self
    }

    /// Set the output directory for the default export.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the default export file name.
    pub fn export_file_name(mut self, name: impl Into<String>) -> Self {
        self.export_file_name = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `SessionConfig` or an error if validation fails.
    pub fn build(self) -> Result<SessionConfig, ConfigValidationError> {
        let defaults = SessionConfig::default();
        let config = SessionConfig {
            csv: self.csv.unwrap_or(defaults.csv),
            preview_rows: self.preview_rows.unwrap_or(defaults.preview_rows),
            variance_threshold: self
                .variance_threshold
                .unwrap_or(defaults.variance_threshold),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
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
        let config = SessionConfig::default();
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.variance_threshold, 0.01);
        assert_eq!(config.export_file_name, "processed_data.csv");
        assert!(config.csv.has_header);
        assert_eq!(config.csv.separator, ',');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = SessionConfig::builder()
            .preview_rows(10)
            .variance_threshold(0.5)
            .output_dir("out")
            .export_file_name("clean.csv")
            .build()
            .unwrap();

        assert_eq!(config.preview_rows, 10);
        assert_eq!(config.variance_threshold, 0.5);
        assert_eq!(config.export_path(), PathBuf::from("out").join("clean.csv"));
    }

    #[test]
    fn test_validation_rejects_zero_preview_rows() {
        let result = SessionConfig::builder().preview_rows(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidPreviewRows(0)
        ));
    }

    #[test]
    fn test_validation_rejects_negative_variance_threshold() {
        let result = SessionConfig::builder().variance_threshold(-0.1).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidVarianceThreshold(_)
        ));

        let result = SessionConfig::builder().variance_threshold(f64::NAN).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_export_name() {
        let result = SessionConfig::builder().export_file_name("data.txt").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidExportFileName(_)
        ));
    }

    #[test]
    fn test_validation_rejects_non_ascii_separator() {
        let csv = CsvOptions {
            separator: '§',
            ..CsvOptions::default()
        };
        let result = SessionConfig::builder().csv(csv).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidSeparator('§')
        ));
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "preview_rows": 12,
            "csv": { "separator": ";", "null_markers": ["-"] }
        }"#;

        let config: SessionConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.preview_rows, 12);
        assert_eq!(config.csv.separator, ';');
        assert_eq!(config.csv.null_markers, vec!["-".to_string()]);
        // Unspecified fields keep their defaults
        assert!(config.csv.has_header);
        assert_eq!(config.variance_threshold, 0.01);
        assert_eq!(config.export_file_name, "processed_data.csv");
    }
}
