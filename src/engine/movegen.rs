use crate::board::Tableau;
use crate::cards::Card;
use crate::rules::{fits_on, fits_tableau};
use crate::state::{BoardState, Move};

/// Whether lifting the top `count` revealed cards off `t` changes the pile in a
/// way no reversible move can undo: a hidden card is exposed, or the pile is
/// cleared from a non-King base.
#[inline]
pub fn exposes(t: &Tableau, count: usize) -> bool {
    if count < t.revealed.len() {
        return false;
    }
    if !t.hidden.is_empty() {
        return true;
    }
    t.revealed.first().map_or(false, |base| !base.is_king())
}

/// Index within `src.revealed` of the run bottom that fits `dest_top`
/// (`None` = empty destination, King-only). Ranks in a run are distinct, so
/// at most one position qualifies, and it is the maximal run for that target.
#[inline]
pub fn run_start_for(src: &Tableau, dest_top: Option<Card>) -> Option<usize> {
    match dest_top {
        Some(onto) => src.revealed.iter().position(|&c| fits_on(c, onto)),
        None => src.revealed.iter().position(|c| c.is_king()),
    }
}

fn stock_moves(state: &BoardState, out: &mut Vec<Move>) {
    if !state.stock.is_empty() {
        out.push(Move::DrawFromStock);
    } else if !state.waste.is_empty() {
        out.push(Move::ResetStock);
    }
}

fn waste_moves(state: &BoardState, out: &mut Vec<Move>) {
    let Some(card) = state.waste_top() else { return };
    let f = state.foundation(card.suit);
    if f.accepts(card) {
        out.push(Move::WasteToFoundation { foundation: card.suit.index() as u8 });
    }
    for (j, dest) in state.tableaus.iter().enumerate() {
        if fits_tableau(card, dest.top()) {
            out.push(Move::WasteToTableau { dest: j as u8 });
        }
    }
}

fn tableau_to_foundation(state: &BoardState, out: &mut Vec<Move>) {
    for (i, src) in state.tableaus.iter().enumerate() {
        let Some(card) = src.top() else { continue };
        if !state.foundation(card.suit).accepts(card) {
            continue;
        }
        let src = i as u8;
        let foundation = card.suit.index() as u8;
        if exposes(&state.tableaus[i], 1) {
            out.push(Move::TableauToFoundationAndReveal { src, foundation });
        } else {
            out.push(Move::TableauToFoundation { src, foundation });
        }
    }
}

fn foundation_to_tableau(state: &BoardState, out: &mut Vec<Move>) {
    for (fi, f) in state.foundations.iter().enumerate() {
        let Some(card) = f.top_card() else { continue };
        for (j, dest) in state.tableaus.iter().enumerate() {
            if fits_tableau(card, dest.top()) {
                out.push(Move::FoundationToTableau { foundation: fi as u8, dest: j as u8 });
            }
        }
    }
}

fn tableau_to_tableau(state: &BoardState, out: &mut Vec<Move>) {
    for (i, src) in state.tableaus.iter().enumerate() {
        if src.revealed.is_empty() {
            continue;
        }
        for (j, dest) in state.tableaus.iter().enumerate() {
            if i == j {
                continue;
            }
            let Some(k) = run_start_for(src, dest.top()) else { continue };
            let count = src.revealed.len() - k;
            let (s, d, n) = (i as u8, j as u8, count as u8);
            if exposes(src, count) {
                out.push(Move::TableauToTableauAndReveal { src: s, dest: d, count: n });
            } else {
                out.push(Move::TableauToTableau { src: s, dest: d, count: n });
            }
        }
    }
}

/// Every legal move in `state`, stable-sorted by kind, then source,
/// destination and run length. An empty result means the state is stuck.
pub fn generate(state: &BoardState) -> Vec<Move> {
    let mut moves = Vec::with_capacity(24);
    stock_moves(state, &mut moves);
    waste_moves(state, &mut moves);
    tableau_to_foundation(state, &mut moves);
    foundation_to_tableau(state, &mut moves);
    tableau_to_tableau(state, &mut moves);
    moves.sort_by_key(|m| m.sort_key());
    moves
}
