//! Rule-based imputation advice.
//!
//! The advisor maps a column's kind and missing percentage to a suggested
//! strategy. The suggestion is shown to the user and never applied on its own.

use crate::types::{ColumnKind, ImputationStrategy, MissingValueReport};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric columns below this missing percentage get mean imputation.
pub const NUMERIC_MEAN_BELOW: f64 = 5.0;
/// Numeric columns below this missing percentage (and at or above the mean cut) get median.
pub const NUMERIC_MEDIAN_BELOW: f64 = 15.0;
/// Non-numeric columns below this missing percentage get mode imputation.
pub const CATEGORICAL_MODE_BELOW: f64 = 10.0;

/// A suggested treatment for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Mean,
    Median,
    Knn,
    Mode,
    /// Mode, or a separate "Unknown" category when missingness is high
    ModeOrUnknown,
}

impl Recommendation {
    /// The strategy a user would pick to follow this advice.
    pub fn strategy(self) -> ImputationStrategy {
        match self {
            Recommendation::Mean => ImputationStrategy::Mean,
            Recommendation::Median => ImputationStrategy::Median,
            Recommendation::Knn => ImputationStrategy::Knn,
            Recommendation::Mode | Recommendation::ModeOrUnknown => ImputationStrategy::Mode,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Recommendation::Mean => "Mean imputation (few values missing)",
            Recommendation::Median => "Median imputation (moderate missingness, robust to skew)",
            Recommendation::Knn => "KNN imputation (many values missing)",
            Recommendation::Mode => "Mode imputation (most frequent value)",
            Recommendation::ModeOrUnknown => {
                "Mode imputation or a separate 'Unknown' category (many values missing)"
            }
        };
        f.write_str(text)
    }
}

/// Advice for one column of a missing-value report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAdvice {
    pub column: String,
    pub kind: ColumnKind,
    pub missing_percentage: f64,
    pub recommendation: Recommendation,
    pub message: String,
}

/// Static lookup from (kind, missing %) to a recommendation.
pub struct StrategyAdvisor;

impl StrategyAdvisor {
    /// Recommend a strategy. Comparisons are strict, so a percentage equal to
    /// a breakpoint falls into the higher bucket.
    pub fn recommend(kind: ColumnKind, missing_percentage: f64) -> Recommendation {
        match kind {
            ColumnKind::Numeric => {
                if missing_percentage < NUMERIC_MEAN_BELOW {
                    Recommendation::Mean
                } else if missing_percentage < NUMERIC_MEDIAN_BELOW {
                    Recommendation::Median
                } else {
                    Recommendation::Knn
                }
            }
            ColumnKind::Categorical | ColumnKind::Boolean => {
                if missing_percentage < CATEGORICAL_MODE_BELOW {
                    Recommendation::Mode
                } else {
                    Recommendation::ModeOrUnknown
                }
            }
        }
    }

    /// Advice for every column listed in `report`.
    pub fn advise(report: &MissingValueReport) -> Vec<ColumnAdvice> {
        report
            .columns
            .iter()
            .map(|col| {
                let recommendation = Self::recommend(col.kind, col.missing_percentage);
                ColumnAdvice {
                    column: col.name.clone(),
                    kind: col.kind,
                    missing_percentage: col.missing_percentage,
                    recommendation,
                    message: format!(
                        "'{}' ({}, {:.1}% missing): {}",
                        col.name, col.kind, col.missing_percentage, recommendation
                    ),
                }
            })
            .collect()
    }
}
