use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::SolError;
use crate::types::{Color, Suit, ACE, DECK_SIZE, KING};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: u8,
    pub suit: Suit,
}

impl Card {
    #[inline]
    pub const fn new(rank: u8, suit: Suit) -> Self {
        Self { rank, suit }
    }

    #[inline]
    pub fn color(self) -> Color {
        self.suit.color()
    }

    #[inline]
    pub fn is_king(self) -> bool {
        self.rank == KING
    }

    #[inline]
    pub fn is_ace(self) -> bool {
        self.rank == ACE
    }

    /// Dense index 0..52: suit-major, rank-minor.
    #[inline]
    pub fn index(self) -> u8 {
        (self.suit.index() as u8) * 13 + (self.rank - 1)
    }

    #[inline]
    pub fn from_index(idx: u8) -> Option<Card> {
        let suit = Suit::from_index((idx / 13) as usize)?;
        Some(Card::new(idx % 13 + 1, suit))
    }

    /// Packed byte used by fingerprint encodings; 0 is reserved as a separator.
    #[inline]
    pub fn code(self) -> u8 {
        self.index() + 1
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = match self.rank {
            1 => "A".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            n => n.to_string(),
        };
        write!(f, "{}{}", r, self.suit.letter())
    }
}

/// The 52 cards in index order (Clubs A..K, Diamonds, Hearts, Spades).
pub fn full_deck() -> Vec<Card> {
    (0..DECK_SIZE as u8).filter_map(Card::from_index).collect()
}

fn validate_card(card: &Card) -> Result<(), SolError> {
    if !(ACE..=KING).contains(&card.rank) {
        return Err(SolError::InvalidDeck(format!(
            "card {:?} has rank {} (must be 1..=13)",
            card.suit, card.rank
        )));
    }
    Ok(())
}

/// Check that `deck` holds each of the 52 cards exactly once.
pub fn validate_deck(deck: &[Card]) -> Result<(), SolError> {
    if deck.len() != DECK_SIZE {
        return Err(SolError::InvalidDeck(format!(
            "deck has {} cards, expected {DECK_SIZE}",
            deck.len()
        )));
    }
    let mut seen: u64 = 0;
    for c in deck {
        validate_card(c)?;
        let bit = 1u64 << c.index();
        if seen & bit != 0 {
            return Err(SolError::InvalidDeck(format!("duplicate card {c}")));
        }
        seen |= bit;
    }
    Ok(())
}

/// Load a pre-shuffled deck from a JSON array of `{ "rank": .., "suit": ".." }`.
/// The last element is the first card dealt.
pub fn load_deck_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Card>, SolError> {
    let data = fs::read_to_string(path.as_ref())
        .map_err(|e| SolError::InvalidDeck(format!("failed to read JSON: {e}")))?;
    let deck: Vec<Card> = serde_json::from_str(&data)
        .map_err(|e| SolError::InvalidDeck(format!("failed to parse JSON: {e}")))?;
    validate_deck(&deck)?;
    Ok(deck)
}
