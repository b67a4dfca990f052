//! Interactive CSV Cleaning Library
//!
//! A staged data-cleaning library built with Rust and Polars.
//!
//! # Overview
//!
//! This library lets a user load a tabular dataset, inspect its missing
//! values, apply cleaning operations and export the result:
//!
//! - **Missing-Value Analysis**: Per-column null counts and percentages
//! - **Strategy Advice**: Rule-based imputation suggestions per column kind
//! - **Staged Imputation**: Mean, median, mode and "Unknown" fills applied to a
//!   candidate copy that is only committed on explicit confirmation
//! - **Direct Cleaning**: Duplicate removal, IQR outlier treatment, one-hot
//!   encoding and variance-threshold feature selection
//! - **Export**: The committed table back to CSV
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use datawash::{ImputationStrategy, Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::default());
//! session.upload_path("data.csv")?;
//!
//! for advice in session.advise()? {
//!     println!("{}", advice.message);
//! }
//!
//! let selection = session
//!     .selection()?
//!     .choose("age", ImputationStrategy::Mean)?
//!     .choose("city", ImputationStrategy::Mode)?
//!     .build()?;
//!
//! // Nothing changes until the staged candidate is saved
//! let outcome = session.process(&selection)?;
//! println!("{} cells filled", outcome.total_filled());
//! session.save()?;
//!
//! session.remove_duplicates()?;
//! session.export_default()?;
//! ```
//!
//! # Staging
//!
//! Imputation is two-phase. [`Session::process`] builds a candidate table and
//! stages it; [`Session::save`] commits it and marks the treated columns as
//! processed; [`Session::discard`] drops it. Saving with nothing staged fails
//! with [`WashError::NothingToSave`] and leaves the table unchanged.
//!
//! Direct cleaning operations act on the committed table at once and drop any
//! staged candidate.

pub mod advisor;
pub mod analysis;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod session;
pub mod staging;
pub mod table;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use advisor::{ColumnAdvice, Recommendation, StrategyAdvisor};
pub use analysis::MissingValueAnalyzer;
pub use cleaner::{
    DataCleaner, EncodingSummary, IqrFence, OneHotEncoder, OutlierHandler, OutlierReport,
    OutlierTreatmentSummary, VarianceSelector,
};
pub use config::{ConfigValidationError, CsvOptions, SessionConfig, SessionConfigBuilder};
pub use error::{Result, ResultExt, WashError};
pub use imputers::{
    AppliedTreatment, ImputationEngine, ImputationOutcome, ImputationWarning, SelectionBuilder,
    StatisticalImputer, TreatmentSelection,
};
pub use session::{SaveReport, Session, SessionStatus, TableSummary};
pub use staging::{StagePhase, StagedCandidate, StagedCommitController};
pub use table::{ColumnSchema, TableStore, WorkingTable};
pub use types::{
    ActionKind, ColumnKind, ColumnMissing, HistoryEntry, ImputationStrategy, MissingValueReport,
    OutlierTreatment,
};
