use serde::{Deserialize, Serialize};

use crate::board::{Foundation, Tableau};
use crate::cards::Card;
use crate::types::{Suit, NUM_SUITS, NUM_TABLEAUS};

/// Hidden-card count at or below which a position is proven solvable.
pub const SETTLED_HIDDEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    DrawFromStock,
    ResetStock,
    WasteToFoundation,
    WasteToTableau,
    TableauToFoundation,
    TableauToFoundationAndReveal,
    FoundationToTableau,
    TableauToTableau,
    TableauToTableauAndReveal,
}

impl MoveKind {
    #[inline]
    pub fn all() -> [MoveKind; 9] {
        [
            MoveKind::DrawFromStock,
            MoveKind::ResetStock,
            MoveKind::WasteToFoundation,
            MoveKind::WasteToTableau,
            MoveKind::TableauToFoundation,
            MoveKind::TableauToFoundationAndReveal,
            MoveKind::FoundationToTableau,
            MoveKind::TableauToTableau,
            MoveKind::TableauToTableauAndReveal,
        ]
    }
}

/// A move with the minimal addressing needed to apply it. Foundation indices
/// are suit indices (`Suit::index`); tableau indices are 0..7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    DrawFromStock,
    ResetStock,
    WasteToFoundation { foundation: u8 },
    WasteToTableau { dest: u8 },
    TableauToFoundation { src: u8, foundation: u8 },
    TableauToFoundationAndReveal { src: u8, foundation: u8 },
    FoundationToTableau { foundation: u8, dest: u8 },
    TableauToTableau { src: u8, dest: u8, count: u8 },
    TableauToTableauAndReveal { src: u8, dest: u8, count: u8 },
}

impl Move {
    #[inline]
    pub fn kind(self) -> MoveKind {
        match self {
            Move::DrawFromStock => MoveKind::DrawFromStock,
            Move::ResetStock => MoveKind::ResetStock,
            Move::WasteToFoundation { .. } => MoveKind::WasteToFoundation,
            Move::WasteToTableau { .. } => MoveKind::WasteToTableau,
            Move::TableauToFoundation { .. } => MoveKind::TableauToFoundation,
            Move::TableauToFoundationAndReveal { .. } => MoveKind::TableauToFoundationAndReveal,
            Move::FoundationToTableau { .. } => MoveKind::FoundationToTableau,
            Move::TableauToTableau { .. } => MoveKind::TableauToTableau,
            Move::TableauToTableauAndReveal { .. } => MoveKind::TableauToTableauAndReveal,
        }
    }

    /// (kind, source, destination, run length). Pile-less fields are 0.
    #[inline]
    pub fn sort_key(self) -> (MoveKind, u8, u8, u8) {
        let (src, dest, count) = match self {
            Move::DrawFromStock | Move::ResetStock => (0, 0, 0),
            Move::WasteToFoundation { foundation } => (0, foundation, 0),
            Move::WasteToTableau { dest } => (0, dest, 0),
            Move::TableauToFoundation { src, foundation }
            | Move::TableauToFoundationAndReveal { src, foundation } => (src, foundation, 0),
            Move::FoundationToTableau { foundation, dest } => (foundation, dest, 0),
            Move::TableauToTableau { src, dest, count }
            | Move::TableauToTableauAndReveal { src, dest, count } => (src, dest, count),
        };
        (self.kind(), src, dest, count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardState {
    /// Face-down draw pile, top = last.
    pub stock: Vec<Card>,
    /// Face-up discard pile, top = last.
    pub waste: Vec<Card>,
    /// Indexed by `Suit::index`.
    pub foundations: [Foundation; NUM_SUITS],
    pub tableaus: [Tableau; NUM_TABLEAUS],
}

impl BoardState {
    pub fn new_empty() -> Self {
        Self {
            stock: Vec::new(),
            waste: Vec::new(),
            foundations: Suit::all().map(Foundation::new),
            tableaus: Default::default(),
        }
    }

    #[inline]
    pub fn foundation(&self, suit: Suit) -> &Foundation {
        &self.foundations[suit.index()]
    }

    #[inline]
    pub fn waste_top(&self) -> Option<Card> {
        self.waste.last().copied()
    }

    #[inline]
    pub fn stock_waste_count(&self) -> usize {
        self.stock.len() + self.waste.len()
    }

    #[inline]
    pub fn hidden_count(&self) -> usize {
        self.tableaus.iter().map(Tableau::hidden_count).sum()
    }

    #[inline]
    pub fn hidden_per_tableau(&self) -> [u8; NUM_TABLEAUS] {
        let mut out = [0u8; NUM_TABLEAUS];
        for (o, t) in out.iter_mut().zip(self.tableaus.iter()) {
            *o = t.hidden_count() as u8;
        }
        out
    }

    #[inline]
    pub fn stranded_count(&self) -> usize {
        self.tableaus.iter().filter(|t| t.is_stranded()).count()
    }

    /// (hidden, stock+waste, stranded). Every Progress move strictly lowers
    /// this lexicographically; Reversible moves leave it unchanged.
    #[inline]
    pub fn progress_measure(&self) -> (usize, usize, usize) {
        (self.hidden_count(), self.stock_waste_count(), self.stranded_count())
    }

    #[inline]
    pub fn foundation_count(&self) -> usize {
        self.foundations.iter().map(Foundation::len).sum()
    }

    /// All 52 cards on foundations.
    #[inline]
    pub fn is_won(&self) -> bool {
        self.foundations.iter().all(Foundation::is_complete)
    }

    /// Few enough hidden cards that the position is proven solvable.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.hidden_count() <= SETTLED_HIDDEN
    }

    /// Every card on the board, pile by pile.
    pub fn all_cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.stock
            .iter()
            .copied()
            .chain(self.waste.iter().copied())
            .chain(self.foundations.iter().flat_map(Foundation::cards))
            .chain(
                self.tableaus
                    .iter()
                    .flat_map(|t| t.hidden.iter().chain(t.revealed.iter()).copied()),
            )
    }

    /// Exact byte encoding of the full state, hidden identities included.
    /// Used to key visited sets over raw states.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(80);
        out.extend(self.stock.iter().map(|c| c.code()));
        out.push(0);
        out.extend(self.waste.iter().map(|c| c.code()));
        out.push(0);
        out.extend(self.foundations.iter().map(|f| f.top));
        for t in &self.tableaus {
            out.push(0);
            out.extend(t.hidden.iter().map(|c| c.code()));
            out.push(0xFF);
            out.extend(t.revealed.iter().map(|c| c.code()));
        }
        out
    }

    /// Ordered legal moves; see `engine::movegen`.
    #[inline]
    pub fn legal_moves(&self) -> Vec<Move> {
        crate::engine::movegen::generate(self)
    }
}

/// Free-function surface for external callers.
#[inline]
pub fn legal_moves(state: &BoardState) -> Vec<Move> {
    state.legal_moves()
}

#[inline]
pub fn is_settled(state: &BoardState) -> bool {
    state.is_settled()
}
