//! Two-phase commit of imputation results.
//!
//! A processed selection is held as a staged candidate until the user either
//! confirms it (the candidate becomes the committed table) or discards it.
//!
//! ```text
//! Idle --stage--> Staged --confirm--> Committed --stage--> Staged ...
//!   ^               |  ^
//!   +---discard-----+  +--stage (replaces the candidate)
//! ```

use crate::error::{Result, WashError};
use crate::imputers::{ImputationOutcome, TreatmentSelection};
use serde::Serialize;
use tracing::{debug, info};

/// A candidate table waiting for confirmation.
#[derive(Debug, Clone)]
pub struct StagedCandidate {
    /// Table generation the candidate was computed from.
    pub source_generation: u64,
    pub selection: TreatmentSelection,
    pub outcome: ImputationOutcome,
}

/// Observable phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StagePhase {
    Idle,
    Staged,
    Committed,
}

#[derive(Debug, Default)]
enum StageState {
    #[default]
    Idle,
    Staged(Box<StagedCandidate>),
    Committed,
}

/// Holds at most one staged candidate and enforces confirm-only-from-staged.
#[derive(Debug, Default)]
pub struct StagedCommitController {
    state: StageState,
}

impl StagedCommitController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> StagePhase {
        match self.state {
            StageState::Idle => StagePhase::Idle,
            StageState::Staged(_) => StagePhase::Staged,
            StageState::Committed => StagePhase::Committed,
        }
    }

    pub fn is_staged(&self) -> bool {
        matches!(self.state, StageState::Staged(_))
    }

    /// The pending candidate, if any.
    pub fn candidate(&self) -> Option<&StagedCandidate> {
        match &self.state {
            StageState::Staged(candidate) => Some(candidate),
            _ => None,
        }
    }

    /// Stage a candidate. Returns the candidate it replaced, if one was pending.
    pub fn stage(&mut self, candidate: StagedCandidate) -> Option<StagedCandidate> {
        info!(
            "Staged candidate for {} column(s)",
            candidate.selection.len()
        );
        match std::mem::replace(&mut self.state, StageState::Staged(Box::new(candidate))) {
            StageState::Staged(previous) => {
                debug!("Replaced previously staged candidate");
                Some(*previous)
            }
            _ => None,
        }
    }

    /// Take the staged candidate for commit.
    ///
    /// Fails with `NothingToSave` unless a candidate is staged; the
    /// controller is left as it was in that case.
    pub fn confirm(&mut self) -> Result<StagedCandidate> {
        match std::mem::replace(&mut self.state, StageState::Committed) {
            StageState::Staged(candidate) => Ok(*candidate),
            other => {
                self.state = other;
                Err(WashError::NothingToSave)
            }
        }
    }

    /// Drop any staged candidate and return to `Idle`. Returns whether
    /// something was dropped.
    pub fn discard(&mut self) -> bool {
        let dropped = self.is_staged();
        self.state = StageState::Idle;
        if dropped {
            debug!("Discarded staged candidate");
        }
        dropped
    }
}
