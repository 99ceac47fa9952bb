use serde::{Deserialize, Serialize};

use crate::canon::{fingerprint, Fingerprint};
use crate::error::SolError;
use crate::solver::explore::successors_metered;
use crate::solver::memo::{local_memo, LocalMemo, SharedMemo};
use crate::solver::model::{features, LogisticModel, FEATURE_DIM};
use crate::solver::{Budget, Meter};
use crate::state::{BoardState, SETTLED_HIDDEN};

/// How a stage's values are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageKind {
    /// h ≤ 2: always solvable, value 1.
    Proven,
    /// h = 3: fitted to exact reachability of h ≤ 2 (0 or 1).
    Binary,
    /// h ≥ 4: fitted to the mean value over Progress successors.
    Averaged,
}

impl StageKind {
    #[inline]
    pub fn for_hidden(hidden: u8) -> StageKind {
        match hidden as usize {
            h if h <= SETTLED_HIDDEN => StageKind::Proven,
            h if h == SETTLED_HIDDEN + 1 => StageKind::Binary,
            _ => StageKind::Averaged,
        }
    }
}

/// Committed parameters of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageModel {
    pub hidden: u8,
    pub kind: StageKind,
    pub model: LogisticModel,
    /// Resolved training targets the model was fitted on.
    pub samples: u32,
    pub mse: f32,
}

impl StageModel {
    pub fn proven(hidden: u8) -> Self {
        Self {
            hidden,
            kind: StageKind::Proven,
            model: LogisticModel::default(),
            samples: 0,
            mse: 0.0,
        }
    }

    /// Stage value for `fp`: 1 for proven stages, the model's decision (0 or 1)
    /// for the binary stage, the model's probability above it.
    #[inline]
    pub fn predict(&self, fp: &Fingerprint) -> f64 {
        match self.kind {
            StageKind::Proven => 1.0,
            StageKind::Binary => {
                if self.model.predict(&features(fp)) >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            StageKind::Averaged => self.model.predict(&features(fp)),
        }
    }
}

/// Result of rating one state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub probability: f64,
    /// Computed by exhaustive search rather than read from a stage model.
    pub exact: bool,
    /// The search ran out of budget and the model value was used instead.
    pub truncated: bool,
}

/// Staged solvability estimator plus the shared fingerprint memo.
///
/// Stages are committed strictly in increasing hidden count; a stage reads
/// only stages below it.
#[derive(Default)]
pub struct Estimator {
    stages: Vec<StageModel>,
    memo: SharedMemo,
}

impl Estimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored stages, which must be 0, 1, 2, .. without gaps.
    pub fn from_stages(stages: Vec<StageModel>) -> Result<Self, SolError> {
        let mut est = Self::new();
        for st in stages {
            let expected = est.stages.len() as u8;
            if st.hidden != expected {
                return Err(SolError::CheckpointOrderViolation { hidden: st.hidden, missing: expected });
            }
            est.commit_stage(st)?;
        }
        Ok(est)
    }

    #[inline]
    pub fn stages(&self) -> &[StageModel] {
        &self.stages
    }

    #[inline]
    pub fn stage(&self, hidden: u8) -> Option<&StageModel> {
        self.stages.get(hidden as usize)
    }

    /// Highest committed stage.
    #[inline]
    pub fn trained_through(&self) -> Option<u8> {
        self.stages.last().map(|s| s.hidden)
    }

    #[inline]
    pub fn memo(&self) -> &SharedMemo {
        &self.memo
    }

    /// Append the next stage. It must be exactly one above the last committed
    /// stage and carry the kind its hidden count calls for.
    pub fn commit_stage(&mut self, stage: StageModel) -> Result<(), SolError> {
        let h = stage.hidden;
        let expected = self.stages.len();
        if h as usize != expected {
            return Err(SolError::StagePrecondition {
                hidden: h,
                detail: format!("next stage to commit is h={expected}"),
            });
        }
        let kind = StageKind::for_hidden(h);
        if stage.kind != kind {
            return Err(SolError::StagePrecondition {
                hidden: h,
                detail: format!("stage kind {:?}, expected {:?}", stage.kind, kind),
            });
        }
        if kind != StageKind::Proven {
            if stage.model.weights.len() != FEATURE_DIM {
                return Err(SolError::StagePrecondition {
                    hidden: h,
                    detail: format!("{} weights, expected {FEATURE_DIM}", stage.model.weights.len()),
                });
            }
            if !stage.model.is_finite() {
                return Err(SolError::TrainingDivergence {
                    hidden: h,
                    detail: "non-finite weights".to_string(),
                });
            }
        }
        self.stages.push(stage);
        Ok(())
    }

    /// Win probability for a fingerprint from the memo or its stage model.
    pub fn estimate(&self, fp: &Fingerprint) -> Result<f64, SolError> {
        let h = fp.hidden();
        if h as usize <= SETTLED_HIDDEN {
            return Ok(1.0);
        }
        if let Some(v) = self.memo.get(fp) {
            return Ok(v as f64);
        }
        match self.stage(h) {
            Some(st) => Ok(st.predict(fp)),
            None => Err(SolError::StageNotTrained(h)),
        }
    }

    /// `estimate` of a state's fingerprint.
    pub fn estimate_state(&self, state: &BoardState) -> Result<f64, SolError> {
        self.estimate(&fingerprint(state))
    }

    /// Rate a state by searching its same-hidden-count region exactly, falling
    /// back to the stage model when the budget runs out. Exact results are
    /// memoised.
    pub fn rate(&self, state: &BoardState, budget: &Budget) -> Result<Rating, SolError> {
        let fp = fingerprint(state);
        if fp.hidden() as usize <= SETTLED_HIDDEN {
            return Ok(Rating { probability: 1.0, exact: true, truncated: false });
        }
        if let Some(v) = self.memo.get(&fp) {
            return Ok(Rating { probability: v as f64, exact: true, truncated: false });
        }
        let mut local = local_memo();
        let target = self.stage_target(state, &fp, budget, &mut local)?;
        self.memo.merge(&local);
        match target {
            Some(v) => Ok(Rating {
                probability: self.memo.insert_if_absent(&fp, v as f32) as f64,
                exact: true,
                truncated: false,
            }),
            None => Ok(Rating {
                probability: self.estimate(&fp)?,
                exact: false,
                truncated: true,
            }),
        }
    }

    /// Exact target for `state` at its own stage, or None if the budget ran
    /// out. Values resolved along the way land in `local`, including those of
    /// a search that was cut short.
    pub(crate) fn stage_target(
        &self,
        state: &BoardState,
        fp: &Fingerprint,
        budget: &Budget,
        local: &mut LocalMemo,
    ) -> Result<Option<f64>, SolError> {
        let mut search = TargetSearch {
            est: self,
            budget,
            meter: Meter::new(budget),
            local,
            stage: fp.hidden(),
        };
        search.value(state, fp)
    }
}

struct TargetSearch<'a> {
    est: &'a Estimator,
    budget: &'a Budget,
    meter: Meter,
    local: &'a mut LocalMemo,
    stage: u8,
}

impl TargetSearch<'_> {
    fn value(&mut self, state: &BoardState, fp: &Fingerprint) -> Result<Option<f64>, SolError> {
        let h = fp.hidden();
        if h as usize <= SETTLED_HIDDEN {
            return Ok(Some(1.0));
        }
        if let Some(v) = self.est.memo.get(fp).or_else(|| self.local.get(fp).copied()) {
            return Ok(Some(v as f64));
        }
        if h < self.stage {
            return self.est.estimate(fp).map(Some);
        }
        if self.meter.exhausted() {
            return Ok(None);
        }

        let succ = successors_metered(state, self.budget, &self.meter);
        let mut edges = succ.edges;
        // Reveals first: a binary search usually stops at the first one.
        edges.sort_by_key(|e| e.fingerprint.hidden());

        let v = match StageKind::for_hidden(h) {
            StageKind::Proven => 1.0,
            StageKind::Binary => {
                // A winning edge settles the node even if enumeration was cut.
                let mut unresolved = succ.truncated;
                let mut won = false;
                for e in &edges {
                    match self.value(&e.state, &e.fingerprint)? {
                        None => unresolved = true,
                        Some(x) if x >= 0.5 => {
                            won = true;
                            break;
                        }
                        Some(_) => {}
                    }
                }
                if won {
                    1.0
                } else if unresolved {
                    return Ok(None);
                } else {
                    0.0
                }
            }
            StageKind::Averaged => {
                if succ.truncated {
                    return Ok(None);
                }
                if edges.is_empty() {
                    0.0
                } else {
                    let mut sum = 0.0;
                    for e in &edges {
                        match self.value(&e.state, &e.fingerprint)? {
                            None => return Ok(None),
                            Some(x) => sum += x,
                        }
                    }
                    sum / edges.len() as f64
                }
            }
        };
        self.local.insert(fp.clone(), v as f32);
        Ok(Some(v))
    }
}
