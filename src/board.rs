use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::rules::fits_foundation;
use crate::types::{Suit, KING};

/// One suit's foundation. Only the top rank is stored; the pile is the gapless
/// run Ace..=top, so the ascending invariant holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Foundation {
    pub suit: Suit,
    pub top: u8, // 0 = empty
}

impl Foundation {
    #[inline]
    pub fn new(suit: Suit) -> Self {
        Self { suit, top: 0 }
    }

    #[inline]
    pub fn top_card(&self) -> Option<Card> {
        if self.top == 0 {
            None
        } else {
            Some(Card::new(self.top, self.suit))
        }
    }

    #[inline]
    pub fn accepts(&self, card: Card) -> bool {
        card.suit == self.suit && fits_foundation(card, self.top)
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.top == KING
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.top as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    /// Cards held, Ace first.
    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        (1..=self.top).map(move |r| Card::new(r, self.suit))
    }
}

/// A tableau pile: face-down prefix plus a face-up run (bottom → top).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tableau {
    pub hidden: Vec<Card>,
    pub revealed: Vec<Card>,
}

impl Tableau {
    #[inline]
    pub fn new(hidden: Vec<Card>, revealed: Vec<Card>) -> Self {
        Self { hidden, revealed }
    }

    #[inline]
    pub fn top(&self) -> Option<Card> {
        self.revealed.last().copied()
    }

    #[inline]
    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty() && self.revealed.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hidden.len() + self.revealed.len()
    }

    /// No hidden cards and a non-King at the bottom of the revealed run: the
    /// pile can only ever be cleared, never rebuilt from empty.
    #[inline]
    pub fn is_stranded(&self) -> bool {
        self.hidden.is_empty() && self.revealed.first().map_or(false, |c| !c.is_king())
    }

    /// No hidden cards and either empty or King-based. No Reversible move
    /// turns a free pile into a non-free one or the other way round.
    #[inline]
    pub fn is_free(&self) -> bool {
        self.hidden.is_empty() && self.revealed.first().map_or(true, |c| c.is_king())
    }

    /// Flip the top hidden card if nothing is face-up. Returns true if a flip occurred.
    #[inline]
    pub fn flip_top(&mut self) -> bool {
        if self.revealed.is_empty() {
            if let Some(c) = self.hidden.pop() {
                self.revealed.push(c);
                return true;
            }
        }
        false
    }

    /// Remove the top `count` revealed cards, bottom → top.
    #[inline]
    pub fn take_run(&mut self, count: usize) -> Vec<Card> {
        let at = self.revealed.len() - count;
        self.revealed.split_off(at)
    }
}
