//! Column treatment selections.

use crate::error::{Result, WashError};
use crate::table::WorkingTable;
use crate::types::{ColumnKind, ImputationStrategy, MissingValueReport};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Validated mapping from column to imputation strategy.
///
/// A selection remembers the table generation of the report it was built
/// from; it can only be processed against that same table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentSelection {
    generation: u64,
    choices: Vec<(String, ImputationStrategy)>,
}

impl TreatmentSelection {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Chosen (column, strategy) pairs in the order they were chosen.
    pub fn choices(&self) -> &[(String, ImputationStrategy)] {
        &self.choices
    }

    pub fn columns(&self) -> Vec<String> {
        self.choices.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn strategy_for(&self, column: &str) -> Option<ImputationStrategy> {
        self.choices
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, s)| *s)
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

/// Builds a [`TreatmentSelection`], rejecting choices the current table cannot take.
#[derive(Debug, Clone)]
pub struct SelectionBuilder {
    generation: u64,
    known: BTreeMap<String, ColumnKind>,
    report: MissingValueReport,
    processed: BTreeSet<String>,
    choices: Vec<(String, ImputationStrategy)>,
}

impl SelectionBuilder {
    pub fn new(
        table: &WorkingTable,
        report: &MissingValueReport,
        processed: &BTreeSet<String>,
    ) -> Self {
        Self {
            generation: report.generation,
            known: table
                .schema()
                .iter()
                .map(|c| (c.name.clone(), c.kind))
                .collect(),
            report: report.clone(),
            processed: processed.clone(),
            choices: Vec::new(),
        }
    }

    /// Choose a strategy for a column. Choosing the same column again replaces
    /// the earlier choice.
    pub fn choose(mut self, column: &str, strategy: ImputationStrategy) -> Result<Self> {
        if self.processed.contains(column) {
            return Err(WashError::ColumnAlreadyProcessed(column.to_string()));
        }

        let Some(kind) = self.known.get(column).copied() else {
            return Err(WashError::ColumnNotFound(column.to_string()));
        };

        if self.report.get(column).is_none() {
            return Err(WashError::NoMissingValues(column.to_string()));
        }

        if !strategy.applies_to(kind) {
            return Err(WashError::StrategyNotApplicable {
                column: column.to_string(),
                strategy: strategy.to_string(),
                kind: kind.to_string(),
            });
        }

        match self.choices.iter_mut().find(|(c, _)| c == column) {
            Some(existing) => existing.1 = strategy,
            None => self.choices.push((column.to_string(), strategy)),
        }
        Ok(self)
    }

    /// Finish the selection; at least one column must be chosen.
    pub fn build(self) -> Result<TreatmentSelection> {
        if self.choices.is_empty() {
            return Err(WashError::EmptySelection);
        }
        Ok(TreatmentSelection {
            generation: self.generation,
            choices: self.choices,
        })
    }
}
