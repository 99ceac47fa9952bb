use std::cmp::Ordering;

use crate::canon::classify;
use crate::canon::MoveClass;
use crate::error::SolError;
use crate::solver::estimator::Estimator;
use crate::solver::explore::{successors, Edge};
use crate::solver::Budget;
use crate::state::{BoardState, Move, MoveKind};

/// Tie-break rank among equally scored moves; lower plays first. Reveals lead,
/// then moves that clear the waste, then everything else.
#[inline]
pub fn kind_priority(kind: MoveKind) -> u8 {
    match kind {
        MoveKind::TableauToFoundationAndReveal => 0,
        MoveKind::TableauToTableauAndReveal => 1,
        MoveKind::WasteToFoundation => 2,
        MoveKind::WasteToTableau => 3,
        MoveKind::TableauToFoundation => 4,
        MoveKind::TableauToTableau => 5,
        MoveKind::FoundationToTableau => 6,
        MoveKind::DrawFromStock => 7,
        MoveKind::ResetStock => 8,
    }
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub edge: Edge,
    pub score: f64,
}

fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| kind_priority(a.edge.mv.kind()).cmp(&kind_priority(b.edge.mv.kind())))
        .then_with(|| a.edge.setup.len().cmp(&b.edge.setup.len()))
        .then_with(|| a.edge.mv.sort_key().cmp(&b.edge.mv.sort_key()))
        .then_with(|| a.edge.fingerprint.cmp(&b.edge.fingerprint))
}

/// Progress successors of `state`, best first. The flag reports a truncated
/// successor enumeration.
pub fn rank(state: &BoardState, estimator: &Estimator, budget: &Budget) -> Result<(Vec<Candidate>, bool), SolError> {
    let succ = successors(state, budget);
    let mut ranked = Vec::with_capacity(succ.edges.len());
    for edge in succ.edges {
        let score = estimator.estimate(&edge.fingerprint)?;
        ranked.push(Candidate { edge, score });
    }
    ranked.sort_by(compare);
    Ok((ranked, succ.truncated))
}

/// The move to play now and the plan it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub next: Move,
    /// Reversible setup moves followed by the chosen Progress move. For a
    /// stock fallback this is the single stock move.
    pub plan: Vec<Move>,
    pub score: f64,
    pub truncated: bool,
    /// No Progress move was found within budget; `next` cycles the stock.
    pub fallback: bool,
}

/// Pick the next move. `Ok(None)` means the position is stuck: the full
/// reversible closure holds no Progress move.
pub fn select(state: &BoardState, estimator: &Estimator, budget: &Budget) -> Result<Option<Selection>, SolError> {
    let (ranked, truncated) = rank(state, estimator, budget)?;
    if let Some(best) = ranked.into_iter().next() {
        let plan = best.edge.plan();
        return Ok(Some(Selection {
            next: plan[0],
            plan,
            score: best.score,
            truncated,
            fallback: false,
        }));
    }
    if !truncated {
        return Ok(None);
    }
    let stock_move = state
        .legal_moves()
        .into_iter()
        .filter(|m| classify(*m) == MoveClass::Reversible)
        .find(|m| matches!(m, Move::DrawFromStock | Move::ResetStock));
    Ok(stock_move.map(|mv| Selection {
        next: mv,
        plan: vec![mv],
        score: 0.0,
        truncated,
        fallback: true,
    }))
}
