use crate::utils::{is_boolean_dtype, is_numeric_dtype};
use chrono::{DateTime, Utc};
use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Column kinds
// ============================================================================

/// Semantic kind of a column, fixed at ingestion and carried with the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Integer or floating point values
    Numeric,
    /// Text or any other non-numeric, non-boolean values
    Categorical,
    /// true/false values
    Boolean,
}

impl ColumnKind {
    /// Derive the kind of a column from its polars dtype.
    pub fn from_dtype(dtype: &DataType) -> Self {
        if is_numeric_dtype(dtype) {
            ColumnKind::Numeric
        } else if is_boolean_dtype(dtype) {
            ColumnKind::Boolean
        } else {
            ColumnKind::Categorical
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Numeric)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// Imputation strategy chosen for a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputationStrategy {
    /// Fill with the arithmetic mean of observed values
    Mean,
    /// Fill with the median of observed values
    Median,
    /// Fill with the most frequent observed value
    Mode,
    /// K-nearest-neighbors (not available, produces a warning)
    Knn,
    /// Fill with the literal "Unknown" category
    Unknown,
    /// Leave the column as it is
    None,
}

impl ImputationStrategy {
    pub const ALL: [ImputationStrategy; 6] = [
        ImputationStrategy::Mean,
        ImputationStrategy::Median,
        ImputationStrategy::Mode,
        ImputationStrategy::Knn,
        ImputationStrategy::Unknown,
        ImputationStrategy::None,
    ];

    /// Whether this strategy can act on a column of the given kind.
    pub fn applies_to(self, kind: ColumnKind) -> bool {
        match self {
            ImputationStrategy::Mean | ImputationStrategy::Median => kind.is_numeric(),
            ImputationStrategy::Unknown => !kind.is_numeric(),
            // Knn is accepted everywhere and turned into a warning by the engine
            ImputationStrategy::Mode | ImputationStrategy::Knn | ImputationStrategy::None => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImputationStrategy::Mean => "mean",
            ImputationStrategy::Median => "median",
            ImputationStrategy::Mode => "mode",
            ImputationStrategy::Knn => "knn",
            ImputationStrategy::Unknown => "unknown",
            ImputationStrategy::None => "none",
        }
    }
}

impl fmt::Display for ImputationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImputationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(ImputationStrategy::Mean),
            "median" => Ok(ImputationStrategy::Median),
            "mode" => Ok(ImputationStrategy::Mode),
            "knn" | "k-nearest-neighbors" => Ok(ImputationStrategy::Knn),
            "unknown" => Ok(ImputationStrategy::Unknown),
            "none" => Ok(ImputationStrategy::None),
            other => Err(format!(
                "unknown strategy '{}' (expected one of: mean, median, mode, knn, unknown, none)",
                other
            )),
        }
    }
}

/// Treatment applied to values outside the IQR fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierTreatment {
    /// Drop rows holding an outlier in the column
    Remove,
    /// Clamp outliers to the nearest fence
    Cap,
    /// Replace outliers with the column mean (computed including the outliers)
    ReplaceWithMean,
}

impl FromStr for OutlierTreatment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remove" => Ok(OutlierTreatment::Remove),
            "cap" => Ok(OutlierTreatment::Cap),
            "mean" | "replace_with_mean" => Ok(OutlierTreatment::ReplaceWithMean),
            other => Err(format!(
                "unknown outlier treatment '{}' (expected remove, cap or mean)",
                other
            )),
        }
    }
}

// ============================================================================
// Missing-value report
// ============================================================================

/// Missing-value statistics for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub name: String,
    pub kind: ColumnKind,
    pub missing_count: usize,
    /// Percentage of rows that are missing (0.0 - 100.0).
    pub missing_percentage: f64,
}

/// Snapshot of the missing values in a working table.
///
/// Only columns with at least one missing value are listed, in table order.
/// `generation` identifies the table state the snapshot was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValueReport {
    pub generation: u64,
    pub row_count: usize,
    pub columns: Vec<ColumnMissing>,
}

impl MissingValueReport {
    /// Look up a column entry by name.
    pub fn get(&self, name: &str) -> Option<&ColumnMissing> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Total number of missing cells across all listed columns.
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing_count).sum()
    }
}

// ============================================================================
// Session history
// ============================================================================

/// Kind of mutation recorded in the session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Upload,
    Imputation,
    DuplicateRemoval,
    OutlierTreatment,
    OneHotEncoding,
    VarianceThreshold,
}

/// A timestamped record of a change to the working table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub action: ActionKind,
    pub detail: String,
    pub rows_after: usize,
    pub columns_after: usize,
}

/// Maximum number of history entries kept per session.
pub const MAX_HISTORY_ENTRIES: usize = 50;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_kind_from_dtype() {
        assert_eq!(ColumnKind::from_dtype(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_dtype(&DataType::Float32), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_dtype(&DataType::Boolean), ColumnKind::Boolean);
        assert_eq!(ColumnKind::from_dtype(&DataType::String), ColumnKind::Categorical);
        assert_eq!(ColumnKind::from_dtype(&DataType::Date), ColumnKind::Categorical);
    }

    #[test]
    fn test_strategy_applicability() {
        assert!(ImputationStrategy::Mean.applies_to(ColumnKind::Numeric));
        assert!(!ImputationStrategy::Mean.applies_to(ColumnKind::Categorical));
        assert!(!ImputationStrategy::Median.applies_to(ColumnKind::Boolean));
        assert!(ImputationStrategy::Mode.applies_to(ColumnKind::Boolean));
        assert!(ImputationStrategy::Unknown.applies_to(ColumnKind::Categorical));
        assert!(ImputationStrategy::Unknown.applies_to(ColumnKind::Boolean));
        assert!(!ImputationStrategy::Unknown.applies_to(ColumnKind::Numeric));
        assert!(ImputationStrategy::None.applies_to(ColumnKind::Numeric));
    }

    #[test]
    fn test_knn_is_accepted_for_every_kind() {
        for kind in [ColumnKind::Numeric, ColumnKind::Categorical, ColumnKind::Boolean] {
            assert!(ImputationStrategy::Knn.applies_to(kind));
        }
    }

    #[test]
    fn test_strategy_from_str() {
        for strategy in ImputationStrategy::ALL {
            assert_eq!(strategy.as_str().parse::<ImputationStrategy>(), Ok(strategy));
        }
        assert_eq!("MEAN".parse::<ImputationStrategy>(), Ok(ImputationStrategy::Mean));
        assert!("average".parse::<ImputationStrategy>().is_err());
    }

    #[test]
    fn test_outlier_treatment_from_str() {
        assert_eq!("cap".parse::<OutlierTreatment>(), Ok(OutlierTreatment::Cap));
        assert_eq!(
            "mean".parse::<OutlierTreatment>(),
            Ok(OutlierTreatment::ReplaceWithMean)
        );
        assert!("winsorize".parse::<OutlierTreatment>().is_err());
    }

    #[test]
    fn test_history_entry_serialization() {
        let entry = HistoryEntry {
            timestamp: Utc::now(),
            action: ActionKind::DuplicateRemoval,
            detail: "Removed 2 duplicate rows".to_string(),
            rows_after: 8,
            columns_after: 3,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("duplicate_removal"));
        assert!(json.contains("Removed 2 duplicate rows"));
    }
}
