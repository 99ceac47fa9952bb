use crate::error::SolError;
use crate::rules::is_valid_run;
use crate::state::BoardState;
use crate::types::{DECK_SIZE, KING};

/// Structural consistency of a single state: the 52-card partition, foundation
/// bounds, tableau runs, and no face-down card left without a face-up cover.
pub fn verify_state(state: &BoardState) -> Result<(), SolError> {
    let mut seen: u64 = 0;
    let mut count = 0usize;
    for f in &state.foundations {
        if f.top > KING {
            return Err(SolError::InvariantViolation(format!(
                "foundation {:?} top rank {} exceeds King",
                f.suit, f.top
            )));
        }
    }
    for c in state.all_cards() {
        if !(1..=KING).contains(&c.rank) {
            return Err(SolError::InvariantViolation(format!("card with rank {}", c.rank)));
        }
        let bit = 1u64 << c.index();
        if seen & bit != 0 {
            return Err(SolError::InvariantViolation(format!("card {c} appears twice")));
        }
        seen |= bit;
        count += 1;
    }
    if count != DECK_SIZE {
        return Err(SolError::InvariantViolation(format!(
            "{count} cards on the board, expected {DECK_SIZE}"
        )));
    }
    for (i, t) in state.tableaus.iter().enumerate() {
        if !is_valid_run(&t.revealed) {
            return Err(SolError::InvariantViolation(format!(
                "tableau {i} revealed cards are not a descending alternating run"
            )));
        }
        if t.revealed.is_empty() && !t.hidden.is_empty() {
            return Err(SolError::InvariantViolation(format!(
                "tableau {i} has hidden cards but nothing revealed"
            )));
        }
    }
    Ok(())
}

/// `verify_state` on `after`, plus the monotone quantities between the two
/// states of one move: per-tableau hidden counts and the stock+waste total
/// never grow.
pub fn verify_transition(before: &BoardState, after: &BoardState) -> Result<(), SolError> {
    verify_state(after)?;
    for (i, (b, a)) in before.tableaus.iter().zip(after.tableaus.iter()).enumerate() {
        if a.hidden_count() > b.hidden_count() {
            return Err(SolError::InvariantViolation(format!(
                "tableau {i} hidden count grew from {} to {}",
                b.hidden_count(),
                a.hidden_count()
            )));
        }
    }
    if after.stock_waste_count() > before.stock_waste_count() {
        return Err(SolError::InvariantViolation(format!(
            "stock+waste grew from {} to {}",
            before.stock_waste_count(),
            after.stock_waste_count()
        )));
    }
    Ok(())
}
