use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub mod estimator;
pub mod explore;
pub mod memo;
pub mod model;
pub mod select;
pub mod selfplay;
pub mod train;

pub use estimator::{Estimator, Rating, StageKind, StageModel};
pub use explore::{explore, successors, Edge, Exploration, Successors};
pub use memo::{SharedMemo, SharedVisited};
pub use select::{rank, select, Candidate, Selection};
pub use selfplay::{play_out, Outcome, PlayLimits, PlayOutcome};
pub use train::{evaluate_levels, train, LevelReport, StageReport, TrainConfig, TrainReport};

/// Work limits for one exploration or rating call. Exceeding any of them
/// yields a result flagged `truncated`, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// States expanded (closure states plus successor evaluations).
    pub max_nodes: u64,
    /// States in one reversible closure.
    pub closure_cap: usize,
    pub time_ms: Option<u64>,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_nodes: 100_000,
            closure_cap: 4096,
            time_ms: None, // no time limit by default
        }
    }
}

/// Cooperative node/time counter, shareable across rayon workers. Checked at
/// state-expansion boundaries only.
#[derive(Debug)]
pub struct Meter {
    nodes: AtomicU64,
    max_nodes: u64,
    deadline: Option<Instant>,
    tripped: AtomicBool,
}

impl Meter {
    pub fn new(budget: &Budget) -> Self {
        Self {
            nodes: AtomicU64::new(0),
            max_nodes: budget.max_nodes,
            deadline: budget.time_ms.map(|ms| Instant::now() + Duration::from_millis(ms)),
            tripped: AtomicBool::new(false),
        }
    }

    /// Charge `n` nodes. Returns false once the budget is spent.
    #[inline]
    pub fn charge(&self, n: u64) -> bool {
        if self.tripped.load(Ordering::Relaxed) {
            return false;
        }
        let total = self.nodes.fetch_add(n, Ordering::Relaxed) + n;
        let late = self.deadline.map_or(false, |d| Instant::now() >= d);
        if total > self.max_nodes || late {
            self.tripped.store(true, Ordering::Relaxed);
            return false;
        }
        true
    }

    #[inline]
    pub fn exhausted(&self) -> bool {
        self.tripped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }
}
