use crate::engine::check::verify_transition;
use crate::engine::movegen::{exposes, run_start_for};
use crate::error::SolError;
use crate::rules::fits_tableau;
use crate::state::{BoardState, Move};
use crate::types::{NUM_SUITS, NUM_TABLEAUS};

#[inline]
fn illegal(mv: Move, reason: impl Into<String>) -> SolError {
    SolError::IllegalMove { mv, reason: reason.into() }
}

#[inline]
fn tableau_index(mv: Move, idx: u8) -> Result<usize, SolError> {
    let i = idx as usize;
    if i >= NUM_TABLEAUS {
        return Err(illegal(mv, format!("tableau index {idx} out of range")));
    }
    Ok(i)
}

#[inline]
fn foundation_index(mv: Move, idx: u8) -> Result<usize, SolError> {
    let i = idx as usize;
    if i >= NUM_SUITS {
        return Err(illegal(mv, format!("foundation index {idx} out of range")));
    }
    Ok(i)
}

/// Check that the tagged variant agrees with what the move actually does to
/// the source pile.
#[inline]
fn check_variant(mv: Move, reveal_variant: bool, exposes: bool) -> Result<(), SolError> {
    if reveal_variant != exposes {
        let want = if exposes { "the AndReveal variant" } else { "the plain variant" };
        return Err(illegal(mv, format!("move requires {want}")));
    }
    Ok(())
}

/// Validate `mv` against `state` and perform it on `ns` (a clone of `state`).
fn perform(state: &BoardState, ns: &mut BoardState, mv: Move) -> Result<(), SolError> {
    match mv {
        Move::DrawFromStock => {
            let Some(card) = ns.stock.pop() else {
                return Err(illegal(mv, "stock is empty"));
            };
            ns.waste.push(card);
        }
        Move::ResetStock => {
            if !state.stock.is_empty() {
                return Err(illegal(mv, "stock is not empty"));
            }
            if state.waste.is_empty() {
                return Err(illegal(mv, "waste is empty"));
            }
            ns.stock = ns.waste.drain(..).rev().collect();
        }
        Move::WasteToFoundation { foundation } => {
            let fi = foundation_index(mv, foundation)?;
            let Some(card) = state.waste_top() else {
                return Err(illegal(mv, "waste is empty"));
            };
            if card.suit.index() != fi || !state.foundations[fi].accepts(card) {
                return Err(illegal(mv, format!("{card} does not continue foundation {fi}")));
            }
            ns.waste.pop();
            ns.foundations[fi].top = card.rank;
        }
        Move::WasteToTableau { dest } => {
            let d = tableau_index(mv, dest)?;
            let Some(card) = state.waste_top() else {
                return Err(illegal(mv, "waste is empty"));
            };
            if !fits_tableau(card, state.tableaus[d].top()) {
                return Err(illegal(mv, format!("{card} does not fit tableau {d}")));
            }
            ns.waste.pop();
            ns.tableaus[d].revealed.push(card);
        }
        Move::TableauToFoundation { src, foundation }
        | Move::TableauToFoundationAndReveal { src, foundation } => {
            let s = tableau_index(mv, src)?;
            let fi = foundation_index(mv, foundation)?;
            let Some(card) = state.tableaus[s].top() else {
                return Err(illegal(mv, format!("tableau {s} has no revealed card")));
            };
            if card.suit.index() != fi || !state.foundations[fi].accepts(card) {
                return Err(illegal(mv, format!("{card} does not continue foundation {fi}")));
            }
            let reveal_variant = matches!(mv, Move::TableauToFoundationAndReveal { .. });
            check_variant(mv, reveal_variant, exposes(&state.tableaus[s], 1))?;
            ns.tableaus[s].revealed.pop();
            ns.tableaus[s].flip_top();
            ns.foundations[fi].top = card.rank;
        }
        Move::FoundationToTableau { foundation, dest } => {
            let fi = foundation_index(mv, foundation)?;
            let d = tableau_index(mv, dest)?;
            let Some(card) = state.foundations[fi].top_card() else {
                return Err(illegal(mv, format!("foundation {fi} is empty")));
            };
            if !fits_tableau(card, state.tableaus[d].top()) {
                return Err(illegal(mv, format!("{card} does not fit tableau {d}")));
            }
            ns.foundations[fi].top -= 1;
            ns.tableaus[d].revealed.push(card);
        }
        Move::TableauToTableau { src, dest, count }
        | Move::TableauToTableauAndReveal { src, dest, count } => {
            let s = tableau_index(mv, src)?;
            let d = tableau_index(mv, dest)?;
            if s == d {
                return Err(illegal(mv, "source and destination are the same tableau"));
            }
            let from = &state.tableaus[s];
            let n = count as usize;
            if n == 0 || n > from.revealed.len() {
                return Err(illegal(
                    mv,
                    format!("run of {n} exceeds {} revealed cards", from.revealed.len()),
                ));
            }
            let k = from.revealed.len() - n;
            if run_start_for(from, state.tableaus[d].top()) != Some(k) {
                return Err(illegal(
                    mv,
                    format!("run starting {} does not fit tableau {d}", from.revealed[k]),
                ));
            }
            let reveal_variant = matches!(mv, Move::TableauToTableauAndReveal { .. });
            check_variant(mv, reveal_variant, exposes(from, n))?;
            let run = ns.tableaus[s].take_run(n);
            ns.tableaus[s].flip_top();
            ns.tableaus[d].revealed.extend(run);
        }
    }
    Ok(())
}

/// Apply a move as a pure transform: returns the successor state on success.
/// Legality is re-validated here regardless of where the move came from, and
/// the successor is checked for consistency before it is returned, so the
/// caller's state is never observed half-updated.
pub fn apply_move(state: &BoardState, mv: Move) -> Result<BoardState, SolError> {
    let mut ns = state.clone();
    perform(state, &mut ns, mv)?;
    verify_transition(state, &ns)?;
    Ok(ns)
}
