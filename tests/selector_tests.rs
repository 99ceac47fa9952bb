mod common;

use common::{dead_lock_h3, one_reveal_h3, wide_budget};
use sol2::solver::select::{kind_priority, rank};
use sol2::solver::{play_out, select, Outcome, PlayLimits};
use sol2::{Estimator, Move, MoveKind, Suit};

#[test]
fn kind_priority_order_is_fixed() {
    let order = [
        MoveKind::TableauToFoundationAndReveal,
        MoveKind::TableauToTableauAndReveal,
        MoveKind::WasteToFoundation,
        MoveKind::WasteToTableau,
        MoveKind::TableauToFoundation,
        MoveKind::TableauToTableau,
        MoveKind::FoundationToTableau,
        MoveKind::DrawFromStock,
        MoveKind::ResetStock,
    ];
    for w in order.windows(2) {
        assert!(kind_priority(w[0]) < kind_priority(w[1]), "{:?} must rank before {:?}", w[0], w[1]);
    }
}

#[test]
fn selects_the_direct_reveal() {
    let s = one_reveal_h3();
    let est = Estimator::new();
    let sel = select(&s, &est, &wide_budget()).expect("select").expect("a move exists");
    let want = Move::TableauToFoundationAndReveal { src: 0, foundation: Suit::Hearts.index() as u8 };
    assert_eq!(sel.next, want);
    assert_eq!(sel.plan, vec![want], "no setup moves are needed");
    assert_eq!(sel.score, 1.0);
    assert!(!sel.fallback);
}

#[test]
fn ranking_is_deterministic_and_sorted() {
    let s = one_reveal_h3();
    let est = Estimator::new();
    let (a, _) = rank(&s, &est, &wide_budget()).expect("rank");
    let (b, _) = rank(&s, &est, &wide_budget()).expect("rank");
    assert!(!a.is_empty());
    let moves_a: Vec<_> = a.iter().map(|c| c.edge.plan()).collect();
    let moves_b: Vec<_> = b.iter().map(|c| c.edge.plan()).collect();
    assert_eq!(moves_a, moves_b);
    for w in a.windows(2) {
        assert!(w[0].score >= w[1].score, "candidates sorted by score");
    }
}

#[test]
fn dead_lock_is_stuck() {
    let s = dead_lock_h3();
    let est = Estimator::new();
    assert!(select(&s, &est, &wide_budget()).expect("select").is_none());

    let limits = PlayLimits { max_moves: 999, budget: wide_budget() };
    let out = play_out(&s, &est, &limits).expect("play");
    assert_eq!(out.outcome, Outcome::Stuck);
    assert!(out.moves.is_empty());
}

#[test]
fn play_out_wins_and_honours_move_limit() {
    let s = one_reveal_h3();
    let est = Estimator::new();
    let out = play_out(&s, &est, &PlayLimits { max_moves: 999, budget: wide_budget() }).expect("play");
    assert_eq!(out.outcome, Outcome::Won);
    assert_eq!(out.moves.len(), 1);
    assert!(out.final_state.is_settled());

    let capped = play_out(&s, &est, &PlayLimits { max_moves: 0, budget: wide_budget() }).expect("play");
    assert_eq!(capped.outcome, Outcome::MoveLimit);
}
