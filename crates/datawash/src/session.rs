//! Per-session context.
//!
//! A [`Session`] owns everything one user works with: the configuration, the
//! committed table, the set of processed columns, the staging controller and
//! the action history. Every operation takes the session explicitly.

use crate::advisor::{ColumnAdvice, StrategyAdvisor};
use crate::analysis::MissingValueAnalyzer;
use crate::cleaner::{
    DataCleaner, EncodingSummary, OneHotEncoder, OutlierHandler, OutlierReport,
    OutlierTreatmentSummary, VarianceSelector,
};
use crate::config::SessionConfig;
use crate::error::{Result, WashError};
use crate::imputers::{
    AppliedTreatment, ImputationEngine, ImputationOutcome, ImputationWarning, SelectionBuilder,
    TreatmentSelection,
};
use crate::staging::{StagePhase, StagedCandidate, StagedCommitController};
use crate::table::{self, ColumnSchema, TableStore, WorkingTable};
use crate::types::{
    ActionKind, HistoryEntry, ImputationStrategy, MAX_HISTORY_ENTRIES, MissingValueReport,
    OutlierTreatment,
};
use chrono::Utc;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Shape of a freshly loaded table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub source: String,
    pub rows: usize,
    pub columns: Vec<ColumnSchema>,
}

/// Result of confirming a staged candidate.
#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    pub applied: Vec<AppliedTreatment>,
    pub warnings: Vec<ImputationWarning>,
    /// Columns added to the processed set by this save.
    pub newly_processed: Vec<String>,
    /// Missing values still left in unprocessed columns.
    pub remaining: MissingValueReport,
}

/// Snapshot of the session for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub loaded: bool,
    pub rows: usize,
    pub columns: usize,
    pub generation: u64,
    pub phase: StagePhase,
    pub processed: Vec<String>,
    pub remaining_missing_columns: usize,
    pub history_entries: usize,
}

/// One user's cleaning session.
#[derive(Debug, Default)]
pub struct Session {
    config: SessionConfig,
    store: TableStore,
    processed: BTreeSet<String>,
    staging: StagedCommitController,
    history: VecDeque<HistoryEntry>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Load CSV bytes as the session's table.
    ///
    /// On failure the session is left exactly as it was. On success the
    /// processed set, any staged candidate and the history are reset.
    pub fn upload_bytes(&mut self, bytes: Vec<u8>, source: &str) -> Result<TableSummary> {
        let table = table::read_csv_bytes(bytes, &self.config.csv)?;
        Ok(self.install(table, source))
    }

    /// Load a CSV file as the session's table. See [`Session::upload_bytes`].
    pub fn upload_path(&mut self, path: impl AsRef<Path>) -> Result<TableSummary> {
        let path = path.as_ref();
        let table = table::read_csv_path(path, &self.config.csv)?;
        Ok(self.install(table, &path.display().to_string()))
    }

    fn install(&mut self, table: WorkingTable, source: &str) -> TableSummary {
        let summary = TableSummary {
            source: source.to_string(),
            rows: table.height(),
            columns: table.schema().to_vec(),
        };

        if self.staging.discard() {
            warn!("New upload discarded the staged candidate");
        }
        self.processed.clear();
        self.history.clear();
        self.store.replace(table);

        info!(
            "Loaded '{}' ({} rows x {} columns)",
            source,
            summary.rows,
            summary.columns.len()
        );
        self.record(
            ActionKind::Upload,
            format!(
                "Loaded '{}' ({} rows, {} columns)",
                source,
                summary.rows,
                summary.columns.len()
            ),
        );
        summary
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// The committed table.
    pub fn table(&self) -> Result<&WorkingTable> {
        self.store.current()
    }

    /// First rows of the committed table (`preview_rows` when `n` is `None`).
    pub fn head(&self, n: Option<usize>) -> Result<DataFrame> {
        Ok(self.table()?.head(n.unwrap_or(self.config.preview_rows)))
    }

    /// Missing values of every column of the committed table.
    pub fn missing_report(&self) -> Result<MissingValueReport> {
        Ok(MissingValueAnalyzer::analyze(
            self.table()?,
            self.store.generation(),
        ))
    }

    /// Missing values of the columns not processed yet.
    pub fn remaining_missing(&self) -> Result<MissingValueReport> {
        Ok(MissingValueAnalyzer::remaining(
            &self.missing_report()?,
            &self.processed,
        ))
    }

    /// Strategy advice for the columns not processed yet.
    pub fn advise(&self) -> Result<Vec<ColumnAdvice>> {
        Ok(StrategyAdvisor::advise(&self.remaining_missing()?))
    }

    pub fn processed_columns(&self) -> &BTreeSet<String> {
        &self.processed
    }

    // ========================================================================
    // Imputation: select, process, save / discard
    // ========================================================================

    /// Start a treatment selection against the current table.
    pub fn selection(&self) -> Result<SelectionBuilder> {
        let report = self.missing_report()?;
        Ok(SelectionBuilder::new(self.table()?, &report, &self.processed))
    }

    /// Build a selection from (column, strategy) pairs in one go.
    pub fn select(&self, choices: &[(String, ImputationStrategy)]) -> Result<TreatmentSelection> {
        choices
            .iter()
            .try_fold(self.selection()?, |builder, (column, strategy)| {
                builder.choose(column, *strategy)
            })?
            .build()
    }

    /// Apply a selection to a copy of the table and stage the result.
    ///
    /// Replaces any candidate already staged.
    pub fn process(&mut self, selection: &TreatmentSelection) -> Result<&ImputationOutcome> {
        let current = self.store.generation();
        if selection.generation() != current {
            return Err(WashError::StaleSelection {
                selection: selection.generation(),
                current,
            });
        }

        let outcome = ImputationEngine::run(self.store.current()?, selection)?;
        self.staging.stage(StagedCandidate {
            source_generation: current,
            selection: selection.clone(),
            outcome,
        });

        self.staging
            .candidate()
            .map(|c| &c.outcome)
            .ok_or(WashError::NothingToSave)
    }

    /// The staged candidate, if any.
    pub fn staged(&self) -> Option<&StagedCandidate> {
        self.staging.candidate()
    }

    /// First rows of the staged candidate.
    pub fn preview(&self, n: Option<usize>) -> Result<DataFrame> {
        let candidate = self.staging.candidate().ok_or(WashError::NothingToSave)?;
        Ok(candidate
            .outcome
            .candidate
            .head(n.unwrap_or(self.config.preview_rows)))
    }

    /// Commit the staged candidate.
    ///
    /// Fails with `NothingToSave` when nothing is staged; the table is then
    /// left unchanged.
    pub fn save(&mut self) -> Result<SaveReport> {
        let staged = self.staging.confirm()?;
        let current = self.store.generation();
        if staged.source_generation != current {
            return Err(WashError::StaleSelection {
                selection: staged.source_generation,
                current,
            });
        }

        let ImputationOutcome {
            candidate,
            applied,
            warnings,
        } = staged.outcome;
        let newly_processed: Vec<String> = applied
            .iter()
            .filter(|a| self.processed.insert(a.column.clone()))
            .map(|a| a.column.clone())
            .collect();
        self.store.replace(candidate);

        info!(
            "Committed imputation of {} columns",
            newly_processed.len()
        );
        let detail = applied
            .iter()
            .map(|a| format!("{}: {} ({} filled)", a.column, a.strategy, a.filled))
            .collect::<Vec<_>>()
            .join(", ");
        self.record(ActionKind::Imputation, format!("Imputed {}", detail));

        Ok(SaveReport {
            applied,
            warnings,
            newly_processed,
            remaining: self.remaining_missing()?,
        })
    }

    /// Drop the staged candidate. Returns whether one was pending.
    pub fn discard(&mut self) -> bool {
        self.staging.discard()
    }

    pub fn phase(&self) -> StagePhase {
        self.staging.phase()
    }

    // ========================================================================
    // Direct mutations
    // ========================================================================

    /// Remove duplicate rows. Returns the number removed.
    pub fn remove_duplicates(&mut self) -> Result<usize> {
        self.mutate_directly(ActionKind::DuplicateRemoval, DataCleaner::remove_duplicates, |n| {
            format!("Removed {} duplicate rows", n)
        })
    }

    /// Detect outliers in a numeric column without changing anything.
    pub fn detect_outliers(&self, column: &str) -> Result<OutlierReport> {
        OutlierHandler::detect(self.table()?, column)
    }

    pub fn treat_outliers(
        &mut self,
        column: &str,
        treatment: OutlierTreatment,
    ) -> Result<OutlierTreatmentSummary> {
        self.mutate_directly(
            ActionKind::OutlierTreatment,
            |table| OutlierHandler::treat(table, column, treatment),
            |s| {
                format!(
                    "{:?} on '{}': {} outliers, {} rows removed",
                    s.treatment, column, s.report.outlier_count, s.rows_removed
                )
            },
        )
    }

    /// One-hot encode the given columns, or every categorical column.
    pub fn one_hot_encode(&mut self, columns: Option<&[String]>) -> Result<EncodingSummary> {
        self.mutate_directly(
            ActionKind::OneHotEncoding,
            |table| OneHotEncoder::encode(table, columns),
            |s| {
                format!(
                    "Encoded {} columns into {} indicators",
                    s.encoded.len(),
                    s.indicator_count()
                )
            },
        )
    }

    /// Drop low-variance numeric columns (configured threshold when `None`).
    pub fn drop_low_variance(&mut self, threshold: Option<f64>) -> Result<Vec<String>> {
        let threshold = threshold.unwrap_or(self.config.variance_threshold);
        self.mutate_directly(
            ActionKind::VarianceThreshold,
            |table| VarianceSelector::select(table, threshold),
            |removed| format!("Threshold {}: removed {:?}", threshold, removed),
        )
    }

    /// Run a direct mutation on the committed table.
    ///
    /// A staged candidate was built from the old table, so it is dropped once
    /// the mutation succeeds.
    fn mutate_directly<R>(
        &mut self,
        action: ActionKind,
        f: impl FnOnce(&mut WorkingTable) -> Result<R>,
        describe: impl FnOnce(&R) -> String,
    ) -> Result<R> {
        let result = self.store.mutate(f)?;
        if self.staging.discard() {
            warn!("Direct change to the table discarded the staged candidate");
        }
        self.record(action, describe(&result));
        Ok(result)
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// The committed table as CSV bytes.
    pub fn export_bytes(&self) -> Result<Vec<u8>> {
        table::to_csv_bytes(self.table()?)
    }

    /// Write the committed table to `path`.
    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        table::export_to_path(self.table()?, path)?;
        Ok(path.to_path_buf())
    }

    /// Write the committed table to the configured export location.
    pub fn export_default(&self) -> Result<PathBuf> {
        self.export_to(self.config.export_path())
    }

    // ========================================================================
    // History & status
    // ========================================================================

    /// Recorded actions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    fn record(&mut self, action: ActionKind, detail: String) {
        let (rows_after, columns_after) = self
            .store
            .current()
            .map(|t| (t.height(), t.width()))
            .unwrap_or_default();
        if self.history.len() == MAX_HISTORY_ENTRIES {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry {
            timestamp: Utc::now(),
            action,
            detail,
            rows_after,
            columns_after,
        });
    }

    pub fn status(&self) -> SessionStatus {
        let (rows, columns) = self
            .store
            .current()
            .map(|t| (t.height(), t.width()))
            .unwrap_or_default();
        SessionStatus {
            loaded: self.store.is_loaded(),
            rows,
            columns,
            generation: self.store.generation(),
            phase: self.staging.phase(),
            processed: self.processed.iter().cloned().collect(),
            remaining_missing_columns: self
                .remaining_missing()
                .map(|r| r.columns.len())
                .unwrap_or(0),
            history_entries: self.history.len(),
        }
    }
}
