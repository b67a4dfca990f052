//! Custom error types for the cleaning session.
//!
//! This module provides a single error hierarchy using `thiserror` for every
//! operation a session exposes.
//!
//! Errors are serializable so the interactive shell can print them as
//! `{code, message}` objects in `--json` mode.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for cleaning operations.
#[derive(Error, Debug)]
pub enum WashError {
    /// Column was not found in the working table.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The uploaded bytes could not be parsed as CSV.
    #[error("Failed to parse CSV: {0}")]
    Ingestion(String),

    /// No data has been uploaded into the session yet.
    #[error("No data loaded")]
    NoDataLoaded,

    /// Confirm was requested while no candidate table is staged.
    #[error("Nothing to save: process a selection before saving")]
    NothingToSave,

    /// A treatment was selected for a column that has no missing values.
    #[error("Column '{0}' has no missing values")]
    NoMissingValues(String),

    /// A treatment was selected for a column that was already committed.
    #[error("Column '{0}' has already been processed")]
    ColumnAlreadyProcessed(String),

    /// A strategy was chosen for a column kind it cannot act on.
    #[error("Strategy '{strategy}' cannot be applied to {kind} column '{column}'")]
    StrategyNotApplicable {
        column: String,
        strategy: String,
        kind: String,
    },

    /// A selection was built against a table that has since changed.
    #[error(
        "Selection was built for table generation {selection} \
         but the table is at generation {current}"
    )]
    StaleSelection { selection: u64, current: u64 },

    /// An operation requiring a numeric column was given another kind.
    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    /// An operation requiring a categorical column was given another kind.
    #[error("Column '{0}' is not categorical")]
    NotCategorical(String),

    /// A generated column name collides with an existing column.
    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// An empty treatment selection was submitted for processing.
    #[error("No columns selected for treatment")]
    EmptySelection,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<WashError>,
    },
}

impl WashError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        WashError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for callers that branch on the failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Ingestion(_) => "INGESTION_FAILED",
            Self::NoDataLoaded => "NO_DATA_LOADED",
            Self::NothingToSave => "NOTHING_TO_SAVE",
            Self::NoMissingValues(_) => "NO_MISSING_VALUES",
            Self::ColumnAlreadyProcessed(_) => "COLUMN_ALREADY_PROCESSED",
            Self::StrategyNotApplicable { .. } => "STRATEGY_NOT_APPLICABLE",
            Self::StaleSelection { .. } => "STALE_SELECTION",
            Self::NotNumeric(_) => "NOT_NUMERIC",
            Self::NotCategorical(_) => "NOT_CATEGORICAL",
            Self::DuplicateColumn(_) => "DUPLICATE_COLUMN",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::EmptySelection => "EMPTY_SELECTION",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error leaves the session untouched and the user can simply retry.
    ///
    /// Everything except IO, Polars and JSON failures is a rejected request
    /// rather than a broken session.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) | Self::Polars(_) | Self::Json(_) => false,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => true,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for WashError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("WashError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, WashError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| WashError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(WashError::NothingToSave.error_code(), "NOTHING_TO_SAVE");
        assert_eq!(
            WashError::ColumnNotFound("test".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            WashError::StaleSelection {
                selection: 1,
                current: 2
            }
            .error_code(),
            "STALE_SELECTION"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(WashError::NothingToSave.is_recoverable());
        assert!(WashError::Ingestion("bad quote".to_string()).is_recoverable());
        assert!(
            !WashError::Io(std::io::Error::other("disk gone")).is_recoverable()
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = WashError::NoMissingValues("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("NO_MISSING_VALUES"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error = WashError::ColumnNotFound("test".to_string()).with_context("During export");
        assert!(error.to_string().contains("During export"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_result_ext_on_polars_error() {
        let result: std::result::Result<(), polars::error::PolarsError> = Err(
            polars::error::PolarsError::ComputeError("boom".into()),
        );
        let err = result.context("Reading upload").unwrap_err();
        assert_eq!(err.error_code(), "POLARS_ERROR");
        assert!(err.to_string().starts_with("Reading upload"));
    }
}
