use std::fmt;

use crate::state::Move;

/// Every failure the engine reports. Budget exhaustion is not here: it is a
/// `truncated` flag on partial results.
#[derive(Debug, Clone, PartialEq)]
pub enum SolError {
    /// Requested move is not legal in the current state.
    IllegalMove { mv: Move, reason: String },
    /// Post-move consistency check failed; the mutation was discarded.
    InvariantViolation(String),
    /// Deck or dealt layout does not hold 52 unique cards.
    InvalidDeck(String),
    /// Stage `hidden` could not fit its targets.
    TrainingDivergence { hidden: u8, detail: String },
    /// Lower stages are missing or inconsistent when stage `hidden` starts.
    StagePrecondition { hidden: u8, detail: String },
    /// An estimate was requested for a stage that has not been trained.
    StageNotTrained(u8),
    /// Checkpoint stage `hidden` was offered before stage `missing`.
    CheckpointOrderViolation { hidden: u8, missing: u8 },
    /// Checkpoint I/O, codec, version or checksum failure.
    Checkpoint(String),
}

impl fmt::Display for SolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolError::IllegalMove { mv, reason } => write!(f, "illegal move {mv:?}: {reason}"),
            SolError::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
            SolError::InvalidDeck(msg) => write!(f, "invalid deck: {msg}"),
            SolError::TrainingDivergence { hidden, detail } => {
                write!(f, "training diverged at stage h={hidden}: {detail}")
            }
            SolError::StagePrecondition { hidden, detail } => {
                write!(f, "stage h={hidden} precondition failed: {detail}")
            }
            SolError::StageNotTrained(h) => write!(f, "no trained model for stage h={h}"),
            SolError::CheckpointOrderViolation { hidden, missing } => write!(
                f,
                "checkpoint stage h={hidden} offered before stage h={missing}"
            ),
            SolError::Checkpoint(msg) => write!(f, "checkpoint error: {msg}"),
        }
    }
}

impl std::error::Error for SolError {}
