//! Imputation engine.
//!
//! Applies a [`TreatmentSelection`] to a copy of the working table. The
//! source table is never modified; the copy becomes the staged candidate.

use super::selection::TreatmentSelection;
use super::statistical::StatisticalImputer;
use crate::error::{Result, WashError};
use crate::table::WorkingTable;
use crate::types::ImputationStrategy;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// A treatment that was carried out on the candidate table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedTreatment {
    pub column: String,
    pub strategy: ImputationStrategy,
    /// Number of null cells that were filled.
    pub filled: usize,
    /// Rendering of the value written into the gaps, if any.
    pub fill_value: Option<String>,
}

/// A non-fatal problem with one column of a selection. The column is left as it was.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImputationWarning {
    /// K-nearest-neighbors imputation is not available.
    KnnNotImplemented { column: String },
    /// The column has no observed values to compute a statistic from.
    NoObservedValues {
        column: String,
        strategy: ImputationStrategy,
    },
}

impl ImputationWarning {
    pub fn column(&self) -> &str {
        match self {
            ImputationWarning::KnnNotImplemented { column }
            | ImputationWarning::NoObservedValues { column, .. } => column,
        }
    }
}

impl fmt::Display for ImputationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputationWarning::KnnNotImplemented { column } => write!(
                f,
                "KNN imputation is not implemented; '{}' was left unchanged",
                column
            ),
            ImputationWarning::NoObservedValues { column, strategy } => write!(
                f,
                "'{}' has no observed values to compute a {} from; nulls were left in place",
                column, strategy
            ),
        }
    }
}

/// Result of running the engine: the candidate table plus what happened per column.
#[derive(Debug, Clone)]
pub struct ImputationOutcome {
    pub candidate: WorkingTable,
    pub applied: Vec<AppliedTreatment>,
    pub warnings: Vec<ImputationWarning>,
}

impl ImputationOutcome {
    /// Columns whose treatment was carried out, in selection order.
    pub fn treated_columns(&self) -> Vec<String> {
        self.applied.iter().map(|a| a.column.clone()).collect()
    }

    /// Total number of cells filled across all columns.
    pub fn total_filled(&self) -> usize {
        self.applied.iter().map(|a| a.filled).sum()
    }
}

/// Turns a treatment selection into a candidate table.
pub struct ImputationEngine;

impl ImputationEngine {
    /// Apply every (column, strategy) pair of `selection` to a copy of `table`.
    ///
    /// Columns are independent; a warning on one column does not stop the others.
    pub fn run(table: &WorkingTable, selection: &TreatmentSelection) -> Result<ImputationOutcome> {
        let mut candidate = table.clone();
        let mut applied = Vec::with_capacity(selection.len());
        let mut warnings = Vec::new();

        info!("Imputing {} selected columns...", selection.len());

        for (column, strategy) in selection.choices() {
            let strategy = *strategy;
            let kind = table.kind(column)?;
            if !strategy.applies_to(kind) {
                return Err(WashError::StrategyNotApplicable {
                    column: column.clone(),
                    strategy: strategy.to_string(),
                    kind: kind.to_string(),
                });
            }

            let series = table.series(column)?;
            let missing = series.null_count();
            if missing == 0 || strategy == ImputationStrategy::None {
                debug!("Leaving '{}' unchanged ({})", column, strategy);
                applied.push(AppliedTreatment {
                    column: column.clone(),
                    strategy,
                    filled: 0,
                    fill_value: None,
                });
                continue;
            }

            let filled = match strategy {
                ImputationStrategy::Mean => StatisticalImputer::mean(series)?,
                ImputationStrategy::Median => StatisticalImputer::median(series)?,
                ImputationStrategy::Mode => StatisticalImputer::mode(series, kind)?,
                ImputationStrategy::Unknown => Some(StatisticalImputer::unknown_category(series)?),
                ImputationStrategy::Knn => {
                    let warning = ImputationWarning::KnnNotImplemented {
                        column: column.clone(),
                    };
                    warn!("{}", warning);
                    warnings.push(warning);
                    continue;
                }
                ImputationStrategy::None => None,
            };

            match filled {
                Some(filled) => {
                    debug!(
                        "Filled {} nulls in '{}' with {}: {}",
                        missing, column, strategy, filled.fill_value
                    );
                    candidate.replace_column(column, filled.series)?;
                    applied.push(AppliedTreatment {
                        column: column.clone(),
                        strategy,
                        filled: missing,
                        fill_value: Some(filled.fill_value),
                    });
                }
                None => {
                    let warning = ImputationWarning::NoObservedValues {
                        column: column.clone(),
                        strategy,
                    };
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ImputationOutcome {
            candidate,
            applied,
            warnings,
        })
    }
}
