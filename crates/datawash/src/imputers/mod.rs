//! Imputation module for handling missing values.
//!
//! This module provides:
//! - Treatment selections validated against a missing-value report
//! - Statistical imputation (mean, median, mode, "Unknown" category)
//! - The engine that turns a selection into a candidate table

mod engine;
mod selection;
mod statistical;

pub use engine::{AppliedTreatment, ImputationEngine, ImputationOutcome, ImputationWarning};
pub use selection::{SelectionBuilder, TreatmentSelection};
pub use statistical::{FilledColumn, StatisticalImputer, UNKNOWN_CATEGORY};
