use std::cmp::Ordering;
use std::collections::VecDeque;
use std::hash::{BuildHasherDefault, Hash, Hasher};

use hashbrown::HashSet as HbHashSet;

use crate::board::Tableau;
use crate::cards::Card;
use crate::engine::apply::apply_move;
use crate::hash::digest128;
use crate::state::{BoardState, Move, MoveKind};
use crate::types::{NUM_SUITS, NUM_TABLEAUS};

type FastHasher = BuildHasherDefault<ahash::AHasher>;

/// Closure states examined when normalising the tableau/foundation layout,
/// counted after free piles are put in order.
pub const FINGERPRINT_CLOSURE_CAP: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveClass {
    /// Undoable by another move or move sequence; stays inside one fingerprint.
    Reversible,
    /// Shrinks stock+waste, reveals a hidden card, or clears a stranded tableau.
    Progress,
}

#[inline]
pub fn classify_kind(kind: MoveKind) -> MoveClass {
    match kind {
        MoveKind::DrawFromStock
        | MoveKind::ResetStock
        | MoveKind::TableauToFoundation
        | MoveKind::FoundationToTableau
        | MoveKind::TableauToTableau => MoveClass::Reversible,
        MoveKind::WasteToFoundation
        | MoveKind::WasteToTableau
        | MoveKind::TableauToFoundationAndReveal
        | MoveKind::TableauToTableauAndReveal => MoveClass::Progress,
    }
}

#[inline]
pub fn classify(mv: Move) -> MoveClass {
    classify_kind(mv.kind())
}

#[inline]
pub fn is_progress(mv: Move) -> bool {
    classify(mv) == MoveClass::Progress
}

/// Reversible moves that never touch stock or waste.
#[inline]
fn is_layout_move(mv: Move) -> bool {
    matches!(
        mv.kind(),
        MoveKind::TableauToFoundation | MoveKind::FoundationToTableau | MoveKind::TableauToTableau
    )
}

/// Canonical key of a state's equivalence class under Reversible moves.
///
/// Byte layout:
/// - `[0..7)` hidden count per tableau
/// - `[7..11)` foundation top ranks (canonical layout)
/// - seven revealed runs as card codes, each terminated by `0`
/// - the stock+waste cycle order as card codes
///
/// Hidden card identities are not part of the key.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    key: u128,
    hidden: u8,
    stock_waste: u8,
    bytes: Box<[u8]>,
}

const RUNS_AT: usize = NUM_TABLEAUS + NUM_SUITS;

impl Fingerprint {
    fn from_parts(state: &BoardState, layout: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(NUM_TABLEAUS + layout.len() + state.stock_waste_count());
        bytes.extend_from_slice(&state.hidden_per_tableau());
        bytes.extend_from_slice(layout);
        bytes.extend(stock_cycle(state).map(Card::code));
        Self {
            key: digest128(&bytes),
            hidden: state.hidden_count() as u8,
            stock_waste: state.stock_waste_count() as u8,
            bytes: bytes.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn key(&self) -> u128 {
        self.key
    }

    #[inline]
    pub fn hidden(&self) -> u8 {
        self.hidden
    }

    #[inline]
    pub fn stock_waste(&self) -> u8 {
        self.stock_waste
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn hidden_per_tableau(&self) -> &[u8] {
        &self.bytes[..NUM_TABLEAUS]
    }

    #[inline]
    pub fn foundation_tops(&self) -> &[u8] {
        &self.bytes[NUM_TABLEAUS..RUNS_AT]
    }

    /// Revealed runs (bottom → top) in tableau order.
    pub fn revealed_runs(&self) -> Vec<Vec<Card>> {
        let mut runs = Vec::with_capacity(NUM_TABLEAUS);
        let mut cur = Vec::new();
        for &b in &self.bytes[RUNS_AT..] {
            if runs.len() == NUM_TABLEAUS {
                break;
            }
            if b == 0 {
                runs.push(std::mem::take(&mut cur));
            } else if let Some(c) = Card::from_index(b - 1) {
                cur.push(c);
            }
        }
        runs
    }

    /// Stock+waste cards in cycle order.
    pub fn stock_cycle(&self) -> Vec<Card> {
        let tail = self.bytes.len() - self.stock_waste as usize;
        self.bytes[tail..]
            .iter()
            .filter_map(|&b| Card::from_index(b - 1))
            .collect()
    }

    pub fn key_hex(&self) -> String {
        format!("{:032x}", self.key)
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.bytes == other.bytes
    }
}

impl Eq for Fingerprint {}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u128(self.key);
    }
}

impl PartialOrd for Fingerprint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fingerprint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key).then_with(|| self.bytes.cmp(&other.bytes))
    }
}

/// Stock and waste as one sequence: waste bottom → top, then stock top →
/// bottom. Drawing and resetting only move the split point, never the order.
pub fn stock_cycle(state: &BoardState) -> impl Iterator<Item = Card> + '_ {
    state.waste.iter().copied().chain(state.stock.iter().rev().copied())
}

/// Reorder the free piles (empty or King-based, nothing hidden) by their
/// revealed runs, keeping them in the slots free piles already occupy. The set
/// of free slots never changes under Reversible moves, so two states that differ
/// only by how free piles are arranged end up identical.
pub fn normalize_free_piles(state: &mut BoardState) {
    let slots: Vec<usize> = (0..NUM_TABLEAUS).filter(|&i| state.tableaus[i].is_free()).collect();
    if slots.len() < 2 {
        return;
    }
    let mut piles: Vec<Tableau> = slots.iter().map(|&i| std::mem::take(&mut state.tableaus[i])).collect();
    piles.sort_by(|a, b| {
        a.revealed
            .iter()
            .map(|c| c.code())
            .cmp(b.revealed.iter().map(|c| c.code()))
    });
    for (i, t) in slots.into_iter().zip(piles) {
        state.tableaus[i] = t;
    }
}

/// `BoardState::encode` of the state with its free piles in order.
pub fn canonical_encode(state: &BoardState) -> Vec<u8> {
    let mut s = state.clone();
    normalize_free_piles(&mut s);
    s.encode()
}

/// Foundation tops followed by each revealed run and a `0` terminator.
fn layout_bytes(state: &BoardState) -> Vec<u8> {
    let mut out = Vec::with_capacity(48);
    out.extend(state.foundations.iter().map(|f| f.top));
    for t in &state.tableaus {
        out.extend(t.revealed.iter().map(|c| c.code()));
        out.push(0);
    }
    out
}

/// Fingerprint with the default closure cap.
#[inline]
pub fn fingerprint(state: &BoardState) -> Fingerprint {
    fingerprint_with_cap(state, FINGERPRINT_CLOSURE_CAP).0
}

/// Fingerprint, plus whether the layout closure hit `cap` before it was
/// exhausted. The search runs over states with free piles in order, so pure
/// rearrangements of free piles never count against the cap. A truncated
/// fingerprint is still a member of the state's own class, so equal
/// fingerprints keep implying mutual reachability; two members of one very
/// large class may however land on different keys.
pub fn fingerprint_with_cap(state: &BoardState, cap: usize) -> (Fingerprint, bool) {
    let mut root = state.clone();
    normalize_free_piles(&mut root);
    let start = layout_bytes(&root);
    let mut best = start.clone();
    let mut visited: HbHashSet<Vec<u8>, FastHasher> = HbHashSet::with_hasher(FastHasher::default());
    visited.insert(start);
    let mut queue: VecDeque<BoardState> = VecDeque::new();
    queue.push_back(root);
    let mut truncated = false;

    'bfs: while let Some(s) = queue.pop_front() {
        for mv in s.legal_moves() {
            if !is_layout_move(mv) {
                continue;
            }
            let Ok(mut ns) = apply_move(&s, mv) else { continue };
            normalize_free_piles(&mut ns);
            let enc = layout_bytes(&ns);
            if visited.contains(&enc) {
                continue;
            }
            if visited.len() >= cap.max(1) {
                truncated = true;
                break 'bfs;
            }
            if enc < best {
                best = enc.clone();
            }
            visited.insert(enc);
            queue.push_back(ns);
        }
    }

    (Fingerprint::from_parts(state, &best), truncated)
}
