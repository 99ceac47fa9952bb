#![allow(dead_code)]

use std::collections::HashSet;

use sol2::{full_deck, BoardState, Budget, Card, Suit, Tableau};

pub fn c(rank: u8, suit: Suit) -> Card {
    Card::new(rank, suit)
}

/// Foundation top ranks in suit order (Clubs, Diamonds, Hearts, Spades).
pub fn set_foundations(state: &mut BoardState, tops: [u8; 4]) {
    for (f, t) in state.foundations.iter_mut().zip(tops) {
        f.top = t;
    }
}

/// Push every card not yet on the board onto the stock, in deck order.
pub fn fill_stock(state: &mut BoardState) {
    let placed: HashSet<Card> = state.all_cards().collect();
    for card in full_deck() {
        if !placed.contains(&card) {
            state.stock.push(card);
        }
    }
}

/// Three face-down cards (J♥, K♣, K♠) under Q♥; K♥ alone on tableau 1.
/// Q♥ can never leave: J♥ is buried and both black Kings are face-down.
pub fn dead_lock_h3() -> BoardState {
    let mut s = BoardState::new_empty();
    set_foundations(&mut s, [12, 13, 10, 12]);
    s.tableaus[0] = Tableau::new(
        vec![c(11, Suit::Hearts), c(13, Suit::Clubs), c(13, Suit::Spades)],
        vec![c(12, Suit::Hearts)],
    );
    s.tableaus[1] = Tableau::new(vec![], vec![c(13, Suit::Hearts)]);
    s
}

/// Three face-down Kings under Q♥ with the Heart foundation at J♥: one move
/// settles the game.
pub fn one_reveal_h3() -> BoardState {
    let mut s = BoardState::new_empty();
    set_foundations(&mut s, [12, 13, 11, 12]);
    s.tableaus[0] = Tableau::new(
        vec![c(13, Suit::Clubs), c(13, Suit::Spades), c(13, Suit::Hearts)],
        vec![c(12, Suit::Hearts)],
    );
    s
}

/// Budget large enough that the hand-built positions above are never cut.
pub fn wide_budget() -> Budget {
    Budget {
        max_nodes: 1_000_000,
        closure_cap: 100_000,
        time_ms: None,
    }
}

/// Small budget for training runs in tests.
pub fn test_budget() -> Budget {
    Budget {
        max_nodes: 3_000,
        closure_cap: 256,
        time_ms: None,
    }
}

/// Four hidden cards under two Queens, each of which can reveal either onto
/// its foundation or onto a free red/black King. Exactly two successor
/// classes, both at three hidden cards.
pub fn two_reveals_h4() -> BoardState {
    let mut s = BoardState::new_empty();
    set_foundations(&mut s, [11, 11, 11, 11]);
    s.tableaus[0] = Tableau::new(
        vec![c(12, Suit::Hearts), c(13, Suit::Spades)],
        vec![c(12, Suit::Clubs)],
    );
    s.tableaus[1] = Tableau::new(
        vec![c(12, Suit::Spades), c(13, Suit::Hearts)],
        vec![c(12, Suit::Diamonds)],
    );
    s.tableaus[2] = Tableau::new(vec![], vec![c(13, Suit::Clubs)]);
    s.tableaus[3] = Tableau::new(vec![], vec![c(13, Suit::Diamonds)]);
    s
}

/// `dead_lock_h3` with K♦ buried as well.
pub fn dead_lock_h4() -> BoardState {
    let mut s = BoardState::new_empty();
    set_foundations(&mut s, [12, 12, 10, 12]);
    s.tableaus[0] = Tableau::new(
        vec![c(13, Suit::Diamonds), c(11, Suit::Hearts), c(13, Suit::Clubs), c(13, Suit::Spades)],
        vec![c(12, Suit::Hearts)],
    );
    s.tableaus[1] = Tableau::new(vec![], vec![c(13, Suit::Hearts)]);
    s
}
