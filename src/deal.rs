use rand::seq::SliceRandom;
use rand::Rng;

use crate::cards::{full_deck, validate_deck, Card};
use crate::engine::check::verify_state;
use crate::error::SolError;
use crate::rng::rng_for_deal;
use crate::rules::fits_tableau;
use crate::board::Tableau;
use crate::state::BoardState;
use crate::types::{Suit, DECK_SIZE, KING, NUM_TABLEAUS};

const QUEEN: u8 = KING - 1;

/// Most face-down cards a scenario can hold: every tableau needs one card
/// face-up on top of its hidden cards.
pub const MAX_SCENARIO_HIDDEN: usize = DECK_SIZE - NUM_TABLEAUS;

fn deal_cards(mut cards: Vec<Card>) -> BoardState {
    let mut state = BoardState::new_empty();
    for (i, t) in state.tableaus.iter_mut().enumerate() {
        for _ in 0..i {
            if let Some(c) = cards.pop() {
                t.hidden.push(c);
            }
        }
        if let Some(c) = cards.pop() {
            t.revealed.push(c);
        }
    }
    // The undealt remainder keeps deck order, so its last card is the stock top.
    state.stock = cards;
    state
}

/// Standard Klondike deal from a pre-shuffled deck. Cards are dealt from the
/// end of `deck`: tableau `i` receives `i` face-down cards and one face-up
/// card, the remaining 24 form the stock.
pub fn deal_from_deck(deck: &[Card]) -> Result<BoardState, SolError> {
    validate_deck(deck)?;
    Ok(deal_cards(deck.to_vec()))
}

/// Deterministic deal for `seed`.
pub fn new_game(seed: u64) -> BoardState {
    let mut deck = full_deck();
    deck.shuffle(&mut rng_for_deal(seed));
    deal_cards(deck)
}

/// A random mid-game position with exactly `hidden` face-down cards.
///
/// Hidden cards go to randomly chosen tableaus, each of which is then covered
/// by one face-up card. Every other card is placed greedily: onto its
/// foundation if it continues it, else onto the first tableau that accepts it,
/// else into the stock.
pub fn random_scenario<R: Rng>(hidden: usize, rng: &mut R) -> Result<BoardState, SolError> {
    if hidden > MAX_SCENARIO_HIDDEN {
        return Err(SolError::InvalidDeck(format!(
            "scenario asks for {hidden} hidden cards, at most {MAX_SCENARIO_HIDDEN} fit"
        )));
    }
    let mut deck = full_deck();
    deck.shuffle(rng);

    let mut state = BoardState::new_empty();
    for _ in 0..hidden {
        let pile = rng.gen_range(0..NUM_TABLEAUS);
        if let Some(c) = deck.pop() {
            state.tableaus[pile].hidden.push(c);
        }
    }
    for t in state.tableaus.iter_mut() {
        if !t.hidden.is_empty() {
            if let Some(c) = deck.pop() {
                t.revealed.push(c);
            }
        }
    }

    while let Some(card) = deck.pop() {
        let fi = card.suit.index();
        if state.foundations[fi].accepts(card) {
            state.foundations[fi].top = card.rank;
            continue;
        }
        if let Some(t) = state
            .tableaus
            .iter_mut()
            .find(|t| fits_tableau(card, t.top()))
        {
            t.revealed.push(card);
            continue;
        }
        state.stock.push(card);
    }

    verify_state(&state)?;
    Ok(state)
}

/// A position with three face-down cards that can never be won: a Queen
/// covers its own Jack and both opposite-color Kings, so it has nowhere to go.
/// The Queen's suit and pile and the order of the buried cards are random;
/// the Queen's King waits in the stock and everything else is on foundations.
pub fn dead_lock_scenario<R: Rng>(rng: &mut R) -> Result<BoardState, SolError> {
    let suits = Suit::all();
    let suit = suits[rng.gen_range(0..suits.len())];
    let mut buried = vec![Card::new(QUEEN - 1, suit)];
    buried.extend(
        suits
            .iter()
            .filter(|s| s.color() != suit.color())
            .map(|&s| Card::new(KING, s)),
    );
    buried.shuffle(rng);

    let mut state = BoardState::new_empty();
    for f in state.foundations.iter_mut() {
        f.top = if f.suit == suit {
            QUEEN - 2
        } else if f.suit.color() != suit.color() {
            QUEEN
        } else {
            KING
        };
    }
    let pile = rng.gen_range(0..NUM_TABLEAUS);
    state.tableaus[pile] = Tableau::new(buried, vec![Card::new(QUEEN, suit)]);
    state.stock.push(Card::new(KING, suit));

    verify_state(&state)?;
    Ok(state)
}
