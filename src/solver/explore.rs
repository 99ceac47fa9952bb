// Reduced-graph exploration.
// A node is a fingerprint class; edges are Progress moves out of any member
// of the class. Members are enumerated by a capped reversible closure, and
// each edge records the reversible setup path from the queried state.

use std::collections::{BTreeMap, VecDeque};
use std::hash::BuildHasherDefault;

use hashbrown::HashSet as HbHashSet;
use rayon::prelude::*;

use crate::canon::{canonical_encode, classify, fingerprint_with_cap, Fingerprint, MoveClass, FINGERPRINT_CLOSURE_CAP};
use crate::engine::apply::apply_move;
use crate::solver::memo::SharedVisited;
use crate::solver::{Budget, Meter};
use crate::state::{BoardState, Move};

type FastHasher = BuildHasherDefault<ahash::AHasher>;

/// One Progress transition of the reduced graph.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Reversible moves leading from the queried state to the member that
    /// plays `mv`.
    pub setup: Vec<Move>,
    pub mv: Move,
    /// State after `setup` then `mv`.
    pub state: BoardState,
    pub fingerprint: Fingerprint,
}

impl Edge {
    /// `setup` followed by `mv`.
    pub fn plan(&self) -> Vec<Move> {
        let mut p = Vec::with_capacity(self.setup.len() + 1);
        p.extend_from_slice(&self.setup);
        p.push(self.mv);
        p
    }
}

#[derive(Debug, Clone, Default)]
pub struct Successors {
    /// One edge per distinct successor fingerprint, shortest setup first.
    pub edges: Vec<Edge>,
    /// The closure or the node budget ran out; `edges` may be incomplete.
    pub truncated: bool,
}

struct ClosureNode {
    state: BoardState,
    parent: Option<(usize, Move)>,
}

/// Members of a state's class reachable by Reversible moves, in BFS order.
/// States that differ only by the arrangement of free piles are kept once:
/// their Progress moves lead to the same fingerprints.
struct Closure {
    nodes: Vec<ClosureNode>,
    truncated: bool,
}

impl Closure {
    fn path_to(&self, mut idx: usize) -> Vec<Move> {
        let mut path = Vec::new();
        while let Some((parent, mv)) = self.nodes[idx].parent {
            path.push(mv);
            idx = parent;
        }
        path.reverse();
        path
    }
}

fn reversible_closure(state: &BoardState, budget: &Budget, meter: &Meter) -> Closure {
    let mut seen: HbHashSet<Vec<u8>, FastHasher> = HbHashSet::with_hasher(FastHasher::default());
    seen.insert(canonical_encode(state));
    let mut nodes = vec![ClosureNode { state: state.clone(), parent: None }];
    let mut queue: VecDeque<usize> = VecDeque::from([0]);
    let cap = budget.closure_cap.max(1);
    let mut truncated = false;

    'bfs: while let Some(idx) = queue.pop_front() {
        if !meter.charge(1) {
            truncated = true;
            break;
        }
        let moves = nodes[idx].state.legal_moves();
        for mv in moves {
            if classify(mv) != MoveClass::Reversible {
                continue;
            }
            let Ok(ns) = apply_move(&nodes[idx].state, mv) else { continue };
            if !seen.insert(canonical_encode(&ns)) {
                continue;
            }
            if nodes.len() >= cap {
                truncated = true;
                break 'bfs;
            }
            nodes.push(ClosureNode { state: ns, parent: Some((idx, mv)) });
            queue.push_back(nodes.len() - 1);
        }
    }

    Closure { nodes, truncated }
}

/// Reduced-graph successors of `state` under a fresh meter.
pub fn successors(state: &BoardState, budget: &Budget) -> Successors {
    let meter = Meter::new(budget);
    successors_metered(state, budget, &meter)
}

/// Reduced-graph successors of `state`, charging `meter`.
pub fn successors_metered(state: &BoardState, budget: &Budget, meter: &Meter) -> Successors {
    let closure = reversible_closure(state, budget, meter);
    let mut truncated = closure.truncated;
    let mut seen: HbHashSet<Fingerprint, FastHasher> = HbHashSet::with_hasher(FastHasher::default());
    let mut edges = Vec::new();

    'members: for (idx, node) in closure.nodes.iter().enumerate() {
        for mv in node.state.legal_moves() {
            if classify(mv) != MoveClass::Progress {
                continue;
            }
            if !meter.charge(1) {
                truncated = true;
                break 'members;
            }
            let Ok(ns) = apply_move(&node.state, mv) else { continue };
            let (fp, _) = fingerprint_with_cap(&ns, FINGERPRINT_CLOSURE_CAP);
            if seen.contains(&fp) {
                continue;
            }
            seen.insert(fp.clone());
            edges.push(Edge {
                setup: closure.path_to(idx),
                mv,
                state: ns,
                fingerprint: fp,
            });
        }
    }

    Successors { edges, truncated }
}

/// Classes reached by a breadth-first walk of the reduced graph.
#[derive(Debug, Clone, Default)]
pub struct Exploration {
    /// Fingerprints bucketed by hidden count, in discovery order.
    pub layers: BTreeMap<u8, Vec<Fingerprint>>,
    /// Budget nodes charged.
    pub nodes: u64,
    /// Reduced-graph depth reached.
    pub depth: u32,
    pub truncated: bool,
}

impl Exploration {
    pub fn total(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }
}

/// Walk the reduced graph from `root` up to `max_depth` Progress moves deep,
/// expanding each layer in parallel. A fingerprint is expanded at most once;
/// settled classes are recorded but not expanded.
pub fn explore(root: &BoardState, max_depth: u32, budget: &Budget) -> Exploration {
    let meter = Meter::new(budget);
    let visited = SharedVisited::new(64);
    let mut out = Exploration::default();

    let root_fp = fingerprint_with_cap(root, FINGERPRINT_CLOSURE_CAP).0;
    visited.try_insert(&root_fp);
    out.layers.entry(root_fp.hidden()).or_default().push(root_fp);

    let mut current: Vec<BoardState> = if root.is_settled() { Vec::new() } else { vec![root.clone()] };
    for d in 0..max_depth {
        if current.is_empty() {
            break;
        }
        if meter.exhausted() {
            out.truncated = true;
            break;
        }
        let results: Vec<(Vec<Fingerprint>, Vec<BoardState>, bool)> = current
            .par_iter()
            .map(|s| {
                let succ = successors_metered(s, budget, &meter);
                let mut recs = Vec::new();
                let mut next_local = Vec::new();
                for e in succ.edges {
                    if visited.try_insert(&e.fingerprint) {
                        if !e.state.is_settled() {
                            next_local.push(e.state);
                        }
                        recs.push(e.fingerprint);
                    }
                }
                (recs, next_local, succ.truncated)
            })
            .collect();

        let mut next: Vec<BoardState> = Vec::new();
        let mut found = 0usize;
        for (recs, next_local, truncated) in results {
            out.truncated |= truncated;
            found += recs.len();
            for fp in recs {
                out.layers.entry(fp.hidden()).or_default().push(fp);
            }
            next.extend(next_local);
        }
        eprintln!(
            "[explore] depth {}: expanded={} new={} frontier={}",
            d + 1,
            current.len(),
            found,
            next.len()
        );
        out.depth = d + 1;
        current = next;
    }
    out.nodes = meter.nodes();
    out.truncated |= meter.exhausted();
    for (h, layer) in &out.layers {
        eprintln!("[explore] hidden {}: {}", h, layer.len());
    }
    out
}
