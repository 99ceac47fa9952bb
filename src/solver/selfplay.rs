use serde::{Deserialize, Serialize};

use crate::engine::apply::apply_move;
use crate::error::SolError;
use crate::solver::estimator::Estimator;
use crate::solver::select::select;
use crate::solver::Budget;
use crate::state::{BoardState, Move};

/// Moves after which a session is abandoned.
pub const MAX_MOVES: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayLimits {
    pub max_moves: u32,
    /// Budget for each selection.
    pub budget: Budget,
}

impl Default for PlayLimits {
    fn default() -> Self {
        Self { max_moves: MAX_MOVES, budget: Budget::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Reached a settled position (h ≤ 2).
    Won,
    /// No Progress move left.
    Stuck,
    MoveLimit,
}

#[derive(Debug, Clone)]
pub struct PlayOutcome {
    pub outcome: Outcome,
    pub moves: Vec<Move>,
    pub final_state: BoardState,
}

/// Play `start` with the selector until settled, stuck or out of moves.
/// Each selected plan is played in full unless the move limit cuts it.
pub fn play_out(start: &BoardState, estimator: &Estimator, limits: &PlayLimits) -> Result<PlayOutcome, SolError> {
    let mut state = start.clone();
    let mut moves = Vec::new();
    let limit = limits.max_moves as usize;

    let outcome = loop {
        if state.is_settled() {
            break Outcome::Won;
        }
        if moves.len() >= limit {
            break Outcome::MoveLimit;
        }
        let Some(sel) = select(&state, estimator, &limits.budget)? else {
            break Outcome::Stuck;
        };
        for mv in sel.plan {
            if moves.len() >= limit {
                break;
            }
            state = apply_move(&state, mv)?;
            moves.push(mv);
        }
    };

    Ok(PlayOutcome { outcome, moves, final_state: state })
}
