#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)] // may be revisited

pub mod types;
pub mod rules;
pub mod cards;
pub mod board;
pub mod state;
pub mod hash;
pub mod rng;
pub mod error;
pub mod deal;
pub mod canon;
pub mod persist;

pub mod engine {
    pub mod movegen;
    pub mod apply;
    pub mod check;
}

pub mod solver;

// Re-exports: stable minimal API surface for external callers
pub use crate::board::{Foundation, Tableau};
pub use crate::canon::{classify, fingerprint, Fingerprint, MoveClass};
pub use crate::cards::{full_deck, load_deck_from_json, Card};
pub use crate::deal::{dead_lock_scenario, deal_from_deck, new_game, random_scenario};
pub use crate::engine::apply::apply_move;
pub use crate::engine::apply::apply_move as apply;
pub use crate::error::SolError;
pub use crate::solver::{successors, Budget, Estimator, Selection};
pub use crate::state::{is_settled, legal_moves, BoardState, Move, MoveKind};
pub use crate::types::{Color, Suit};
