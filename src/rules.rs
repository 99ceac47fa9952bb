use crate::cards::Card;
use crate::types::ACE;

/// Foundation successor rule: `card` goes on a foundation of its own suit
/// whose top rank is `top` (0 = empty).
#[inline]
pub fn fits_foundation(card: Card, top: u8) -> bool {
    if top == 0 {
        card.rank == ACE
    } else {
        card.rank == top + 1
    }
}

/// Tableau successor rule: `card` goes on `onto` when it is one rank lower
/// and of the opposite color.
#[inline]
pub fn fits_on(card: Card, onto: Card) -> bool {
    card.rank + 1 == onto.rank && card.color() != onto.color()
}

/// Tableau placement: `top` is the destination's revealed top, `None` for an
/// empty tableau, which only accepts a King.
#[inline]
pub fn fits_tableau(card: Card, top: Option<Card>) -> bool {
    match top {
        Some(onto) => fits_on(card, onto),
        None => card.is_king(),
    }
}

/// True when `cards` (bottom → top) is a strictly descending,
/// alternating-color run.
pub fn is_valid_run(cards: &[Card]) -> bool {
    cards.windows(2).all(|w| fits_on(w[1], w[0]))
}
