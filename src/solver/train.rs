// Bottom-up stage training.
// Stage h samples random positions with exactly h hidden cards, computes
// their exact targets against the committed stages below h, fits a model to
// every level-h value resolved along the way and commits it before h+1 starts.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::canon::fingerprint;
use crate::deal::{dead_lock_scenario, random_scenario, MAX_SCENARIO_HIDDEN};
use crate::error::SolError;
use crate::rng::rng_for_scenario;
use crate::solver::estimator::{Estimator, StageKind, StageModel};
use crate::solver::memo::{local_memo, LocalMemo, SharedMemo};
use crate::solver::model::{features, Features, LogisticModel};
use crate::solver::selfplay::{play_out, Outcome, PlayLimits};
use crate::solver::Budget;
use crate::state::SETTLED_HIDDEN;

/// Scenario seeds for evaluation are kept apart from training seeds.
const EVAL_SALT: u64 = 0xE7A1_5EED_0000_0001;

/// Random scenarios are practically never lost at the binary stage, so every
/// n-th binary sample is a known dead lock instead.
const DEAD_SAMPLE_EVERY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Last stage to train, inclusive.
    pub max_hidden: u8,
    pub samples_per_stage: usize,
    pub seed: u64,
    /// Per-sample search budget.
    pub budget: Budget,
    pub epochs: u32,
    pub learning_rate: f32,
    /// Fit error above which a stage is rejected.
    pub max_mse: f32,
    pub progress: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_hidden: 8,
            samples_per_stage: 64,
            seed: 0x5012_2024,
            budget: Budget::default(),
            epochs: 400,
            learning_rate: 0.5,
            max_mse: 0.26,
            progress: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageReport {
    pub hidden: u8,
    pub kind: StageKind,
    /// Scenarios drawn.
    pub samples: usize,
    /// Scenarios whose exact target was resolved within budget.
    pub resolved: usize,
    pub truncated: usize,
    /// Level-h values the model was fitted on.
    pub fitted: usize,
    pub mse: f64,
    pub loss: f64,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    pub stages: Vec<StageReport>,
}

/// Stage `hidden` may start only when stages 0..hidden are committed with
/// matching kinds.
pub fn check_precondition(estimator: &Estimator, hidden: u8) -> Result<(), SolError> {
    let committed = estimator.stages();
    if committed.len() != hidden as usize {
        return Err(SolError::StagePrecondition {
            hidden,
            detail: format!("{} stages committed, expected {hidden}", committed.len()),
        });
    }
    for (i, st) in committed.iter().enumerate() {
        if st.hidden as usize != i || st.kind != StageKind::for_hidden(st.hidden) {
            return Err(SolError::StagePrecondition {
                hidden,
                detail: format!("committed stage {i} is inconsistent (h={}, {:?})", st.hidden, st.kind),
            });
        }
    }
    Ok(())
}

fn stage_bar(cfg: &TrainConfig, hidden: u8) -> ProgressBar {
    if !cfg.progress {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(cfg.samples_per_stage as u64);
    let style = ProgressStyle::with_template(&format!(
        "[{{elapsed_precise}}] train h={} {{bar:40.cyan/blue}} {{pos}}/{{len}}",
        hidden
    ))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Train stages from the first uncommitted one up to `cfg.max_hidden`.
///
/// `on_commit` runs after every committed stage (checkpointing). A failing
/// stage returns its error and leaves all earlier commits in place.
pub fn train<F>(estimator: &mut Estimator, cfg: &TrainConfig, mut on_commit: F) -> Result<TrainReport, SolError>
where
    F: FnMut(&Estimator) -> Result<(), SolError>,
{
    if cfg.max_hidden as usize > MAX_SCENARIO_HIDDEN {
        return Err(SolError::StagePrecondition {
            hidden: cfg.max_hidden,
            detail: format!("at most {MAX_SCENARIO_HIDDEN} hidden cards fit a deal"),
        });
    }
    let mut report = TrainReport::default();
    let start = estimator.stages().len() as u8;

    for h in start..=cfg.max_hidden {
        let t0 = Instant::now();
        if h as usize <= SETTLED_HIDDEN {
            estimator.commit_stage(StageModel::proven(h))?;
            on_commit(estimator)?;
            report.stages.push(StageReport {
                hidden: h,
                kind: StageKind::Proven,
                samples: 0,
                resolved: 0,
                truncated: 0,
                fitted: 0,
                mse: 0.0,
                loss: 0.0,
                elapsed_ms: t0.elapsed().as_millis(),
            });
            eprintln!("[train] stage h={} proven", h);
            continue;
        }

        check_precondition(estimator, h)?;
        let (stage, stage_report, locals) = train_stage(estimator, cfg, h, t0)?;
        report.stages.push(stage_report);
        estimator.commit_stage(stage)?;
        // Values resolved at stage h become visible only once h is committed.
        for local in &locals {
            estimator.memo().merge(local);
        }
        on_commit(estimator)?;
    }
    Ok(report)
}

fn train_stage(
    estimator: &Estimator,
    cfg: &TrainConfig,
    h: u8,
    t0: Instant,
) -> Result<(StageModel, StageReport, Vec<LocalMemo>), SolError> {
    let pb = stage_bar(cfg, h);
    let kind = StageKind::for_hidden(h);

    // Workers only read the shared memo; their results reach it in sample
    // order after the stage commits.
    let results: Vec<(Option<f64>, LocalMemo)> = (0..cfg.samples_per_stage)
        .into_par_iter()
        .map(|i| -> Result<(Option<f64>, LocalMemo), SolError> {
            let mut rng = rng_for_scenario(cfg.seed, h, i as u64);
            let state = if kind == StageKind::Binary && i % DEAD_SAMPLE_EVERY == DEAD_SAMPLE_EVERY - 1 {
                dead_lock_scenario(&mut rng)?
            } else {
                random_scenario(h as usize, &mut rng)?
            };
            let fp = fingerprint(&state);
            let mut local = local_memo();
            let target = estimator.stage_target(&state, &fp, &cfg.budget, &mut local)?;
            pb.inc(1);
            Ok((target, local))
        })
        .collect::<Result<Vec<_>, SolError>>()?;
    pb.finish_and_clear();

    let resolved = results.iter().filter(|(t, _)| t.is_some()).count();
    let locals: Vec<LocalMemo> = results.into_iter().map(|(_, local)| local).collect();

    // Searches never record a value the shared memo already holds, so the
    // staged entries and the shared ones at level h are disjoint.
    let staged = SharedMemo::default();
    for local in &locals {
        staged.merge(local);
    }
    let mut entries = estimator.memo().level_entries(h);
    entries.extend(staged.level_entries(h));
    entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    if entries.is_empty() {
        return Err(SolError::TrainingDivergence {
            hidden: h,
            detail: format!("no resolved targets out of {} samples", cfg.samples_per_stage),
        });
    }
    if kind == StageKind::Binary {
        let won = entries.iter().filter(|(_, v)| *v >= 0.5).count();
        if won == 0 || won == entries.len() {
            return Err(SolError::TrainingDivergence {
                hidden: h,
                detail: format!("all {} binary targets fall in one class", entries.len()),
            });
        }
    }
    let data: Vec<(Features, f32)> = entries.iter().map(|(fp, v)| (features(fp), *v)).collect();

    let mut model = LogisticModel::default();
    let fit = model.fit(&data, cfg.epochs, cfg.learning_rate);
    if !fit.loss.is_finite() || !fit.mse.is_finite() || !model.is_finite() {
        return Err(SolError::TrainingDivergence {
            hidden: h,
            detail: format!("non-finite fit (loss={}, mse={})", fit.loss, fit.mse),
        });
    }
    if fit.mse > cfg.max_mse as f64 {
        return Err(SolError::TrainingDivergence {
            hidden: h,
            detail: format!("mse {:.4} above limit {:.4}", fit.mse, cfg.max_mse),
        });
    }

    let report = StageReport {
        hidden: h,
        kind,
        samples: cfg.samples_per_stage,
        resolved,
        truncated: cfg.samples_per_stage - resolved,
        fitted: data.len(),
        mse: fit.mse,
        loss: fit.loss,
        elapsed_ms: t0.elapsed().as_millis(),
    };
    eprintln!(
        "[train] stage h={} samples={} resolved={} truncated={} fitted={} mse={:.4} in {:.2}s",
        h,
        report.samples,
        report.resolved,
        report.truncated,
        report.fitted,
        report.mse,
        report.elapsed_ms as f64 / 1000.0
    );

    let stage = StageModel {
        hidden: h,
        kind,
        model,
        samples: data.len() as u32,
        mse: fit.mse as f32,
    };
    Ok((stage, report, locals))
}

/// Self-play results for one hidden-card level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReport {
    pub hidden: u8,
    pub trials: usize,
    pub won: usize,
    pub stuck: usize,
    pub move_limit: usize,
    pub elapsed_ms: u128,
}

impl LevelReport {
    #[inline]
    pub fn win_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.won as f64 / self.trials as f64
        }
    }
}

/// Play `trials` random scenarios at each level 1..=`max_hidden` with the
/// estimator's selector and count outcomes.
pub fn evaluate_levels(
    estimator: &Estimator,
    max_hidden: u8,
    trials: usize,
    seed: u64,
    limits: &PlayLimits,
) -> Result<Vec<LevelReport>, SolError> {
    let mut out = Vec::with_capacity(max_hidden as usize);
    for h in 1..=max_hidden {
        let t0 = Instant::now();
        let outcomes: Vec<Outcome> = (0..trials)
            .into_par_iter()
            .map(|i| -> Result<Outcome, SolError> {
                let mut rng = rng_for_scenario(seed ^ EVAL_SALT, h, i as u64);
                let state = random_scenario(h as usize, &mut rng)?;
                Ok(play_out(&state, estimator, limits)?.outcome)
            })
            .collect::<Result<Vec<_>, SolError>>()?;

        let count = |o: Outcome| outcomes.iter().filter(|x| **x == o).count();
        out.push(LevelReport {
            hidden: h,
            trials,
            won: count(Outcome::Won),
            stuck: count(Outcome::Stuck),
            move_limit: count(Outcome::MoveLimit),
            elapsed_ms: t0.elapsed().as_millis(),
        });
    }
    Ok(out)
}
