mod common;

use common::{c, fill_stock, set_foundations};
use sol2::engine::check::{verify_state, verify_transition};
use sol2::rules::{fits_foundation, fits_on, fits_tableau, is_valid_run};
use sol2::{apply_move, legal_moves, BoardState, Move, SolError, Suit, Tableau};

#[test]
fn empty_tableau_accepts_only_king_from_waste() {
    let mut s = BoardState::new_empty();
    s.waste.push(c(12, Suit::Hearts));
    fill_stock(&mut s);
    assert!(
        !legal_moves(&s).iter().any(|m| matches!(m, Move::WasteToTableau { .. })),
        "a Queen must not land on an empty tableau"
    );
    assert!(matches!(
        apply_move(&s, Move::WasteToTableau { dest: 0 }),
        Err(SolError::IllegalMove { .. })
    ));

    let mut k = BoardState::new_empty();
    k.waste.push(c(13, Suit::Spades));
    fill_stock(&mut k);
    let to_empty: Vec<_> = legal_moves(&k)
        .into_iter()
        .filter(|m| matches!(m, Move::WasteToTableau { .. }))
        .collect();
    assert_eq!(to_empty.len(), 7, "a King may go to each of the seven empty tableaus");
}

#[test]
fn successor_rules() {
    assert!(fits_foundation(c(1, Suit::Clubs), 0));
    assert!(!fits_foundation(c(2, Suit::Clubs), 0));
    assert!(fits_foundation(c(5, Suit::Hearts), 4));
    assert!(fits_on(c(6, Suit::Hearts), c(7, Suit::Spades)));
    assert!(!fits_on(c(6, Suit::Hearts), c(7, Suit::Diamonds)), "same color never stacks");
    assert!(!fits_on(c(5, Suit::Hearts), c(7, Suit::Spades)), "ranks must be consecutive");
    assert!(fits_tableau(c(13, Suit::Diamonds), None));
    assert!(!fits_tableau(c(12, Suit::Diamonds), None));
    assert!(is_valid_run(&[c(9, Suit::Clubs), c(8, Suit::Hearts), c(7, Suit::Spades)]));
    assert!(!is_valid_run(&[c(9, Suit::Clubs), c(8, Suit::Spades)]));
}

#[test]
fn only_maximal_run_to_each_destination() {
    let mut s = BoardState::new_empty();
    s.tableaus[0] = Tableau::new(
        vec![c(2, Suit::Diamonds)],
        vec![c(9, Suit::Clubs), c(8, Suit::Hearts), c(7, Suit::Spades)],
    );
    s.tableaus[1] = Tableau::new(vec![], vec![c(13, Suit::Spades), c(12, Suit::Hearts), c(11, Suit::Spades), c(10, Suit::Diamonds)]);
    s.tableaus[2] = Tableau::new(vec![c(3, Suit::Spades)], vec![c(9, Suit::Spades)]);
    fill_stock(&mut s);

    let moves = legal_moves(&s);
    assert!(
        moves.contains(&Move::TableauToTableauAndReveal { src: 0, dest: 1, count: 3 }),
        "9♣ 8♥ 7♠ moves onto 10♦ and exposes 2♦"
    );
    assert!(
        moves.contains(&Move::TableauToTableau { src: 0, dest: 2, count: 2 }),
        "8♥ 7♠ moves onto 9♠ leaving 9♣ behind"
    );
    assert!(matches!(
        apply_move(&s, Move::TableauToTableau { src: 0, dest: 1, count: 2 }),
        Err(SolError::IllegalMove { .. })
    ));
}

#[test]
fn wrong_variant_is_rejected() {
    let mut s = BoardState::new_empty();
    set_foundations(&mut s, [1, 0, 0, 0]);
    s.tableaus[2] = Tableau::new(vec![c(9, Suit::Diamonds)], vec![c(2, Suit::Clubs)]);
    fill_stock(&mut s);
    let err = apply_move(&s, Move::TableauToFoundation { src: 2, foundation: 0 }).unwrap_err();
    assert!(matches!(err, SolError::IllegalMove { .. }), "got {err:?}");
}

#[test]
fn clearing_a_stranded_pile_is_a_reveal_move() {
    let mut s = BoardState::new_empty();
    set_foundations(&mut s, [3, 0, 0, 0]);
    s.tableaus[4] = Tableau::new(vec![], vec![c(4, Suit::Clubs)]);
    fill_stock(&mut s);
    let moves = legal_moves(&s);
    assert!(moves.contains(&Move::TableauToFoundationAndReveal { src: 4, foundation: 0 }));
    let ns = apply_move(&s, Move::TableauToFoundationAndReveal { src: 4, foundation: 0 }).expect("apply");
    assert!(ns.tableaus[4].is_empty());
    assert!(ns.progress_measure() < s.progress_measure());
}

#[test]
fn lone_king_moves_are_reversible() {
    let mut s = BoardState::new_empty();
    s.tableaus[0] = Tableau::new(vec![], vec![c(13, Suit::Hearts)]);
    fill_stock(&mut s);
    let mv = Move::TableauToTableau { src: 0, dest: 3, count: 1 };
    assert!(legal_moves(&s).contains(&mv));
    let ns = apply_move(&s, mv).expect("apply");
    assert_eq!(ns.progress_measure(), s.progress_measure());
}

#[test]
fn stock_moves_need_the_right_pile() {
    let mut s = BoardState::new_empty();
    fill_stock(&mut s);
    assert!(matches!(apply_move(&s, Move::ResetStock), Err(SolError::IllegalMove { .. })));

    let mut empty = BoardState::new_empty();
    set_foundations(&mut empty, [13, 13, 13, 13]);
    assert!(empty.is_won());
    assert!(legal_moves(&empty).iter().all(|m| matches!(m, Move::FoundationToTableau { .. })));
    assert!(matches!(apply_move(&empty, Move::DrawFromStock), Err(SolError::IllegalMove { .. })));
    assert!(matches!(
        apply_move(&empty, Move::WasteToFoundation { foundation: 9 }),
        Err(SolError::IllegalMove { .. })
    ));
}

#[test]
fn consistency_checks_catch_broken_states() {
    let mut dup = BoardState::new_empty();
    fill_stock(&mut dup);
    dup.waste.push(dup.stock[0]);
    assert!(matches!(verify_state(&dup), Err(SolError::InvariantViolation(_))));

    let mut uncovered = BoardState::new_empty();
    fill_stock(&mut uncovered);
    let card = uncovered.stock.pop().expect("card");
    uncovered.tableaus[1].hidden.push(card);
    assert!(matches!(verify_state(&uncovered), Err(SolError::InvariantViolation(_))));

    let mut before = BoardState::new_empty();
    before.tableaus[0] = Tableau::new(vec![], vec![c(13, Suit::Clubs)]);
    fill_stock(&mut before);
    let mut after = before.clone();
    let moved = after.stock.pop().expect("card");
    after.tableaus[0].hidden.insert(0, moved);
    assert!(matches!(
        verify_transition(&before, &after),
        Err(SolError::InvariantViolation(_))
    ));
}
