mod common;

use common::{dead_lock_h3, dead_lock_h4, one_reveal_h3, two_reveals_h4, wide_budget};
use sol2::solver::model::{features, LogisticModel, FEATURE_DIM};
use sol2::solver::{explore, StageKind, StageModel};
use sol2::{apply_move, fingerprint, new_game, random_scenario, successors, Budget, Estimator, Move, SolError};

use rand::SeedableRng;
use rand_pcg::Pcg64;

#[test]
fn settled_positions_estimate_one_without_training() {
    let est = Estimator::new();
    for h in 0..=2usize {
        let mut rng = Pcg64::seed_from_u64(h as u64);
        let s = random_scenario(h, &mut rng).expect("scenario");
        assert_eq!(s.hidden_count(), h);
        assert_eq!(est.estimate(&fingerprint(&s)), Ok(1.0), "h={h} is proven solvable");
        let r = est.rate(&s, &wide_budget()).expect("rate");
        assert_eq!(r.probability, 1.0);
        assert!(r.exact);
    }
}

#[test]
fn dead_lock_with_three_hidden_cards_rates_zero() {
    let s = dead_lock_h3();
    assert_eq!(s.hidden_count(), 3);
    let budget = wide_budget();
    let succ = successors(&s, &budget);
    assert!(!succ.truncated, "the closure must be explored completely");
    assert!(succ.edges.is_empty(), "no Progress move is reachable");

    let est = Estimator::new();
    let r = est.rate(&s, &budget).expect("rate");
    assert!(r.exact && !r.truncated, "dead lock must be proven exactly: {r:?}");
    assert_eq!(r.probability, 0.0);
    assert_eq!(est.estimate(&fingerprint(&s)), Ok(0.0), "memoised value is returned by estimate");
}

#[test]
fn single_reveal_to_settle_rates_one() {
    let s = one_reveal_h3();
    let est = Estimator::new();
    let r = est.rate(&s, &wide_budget()).expect("rate");
    assert_eq!(r.probability, 1.0);
    assert!(r.exact);
}

#[test]
fn untrained_stage_is_reported() {
    let est = Estimator::new();
    let s = new_game(1);
    let fp = fingerprint(&s);
    assert_eq!(est.estimate(&fp), Err(SolError::StageNotTrained(21)));
}

#[test]
fn stages_commit_strictly_in_order() {
    let mut est = Estimator::new();
    let err = est.commit_stage(StageModel::proven(1)).unwrap_err();
    assert!(matches!(err, SolError::StagePrecondition { hidden: 1, .. }), "got {err:?}");

    for h in 0..=2 {
        est.commit_stage(StageModel::proven(h)).expect("proven stage");
    }
    let wrong_kind = StageModel { hidden: 3, kind: StageKind::Averaged, ..stage3() };
    assert!(matches!(est.commit_stage(wrong_kind), Err(SolError::StagePrecondition { hidden: 3, .. })));
    est.commit_stage(stage3()).expect("binary stage 3");
    assert_eq!(est.trained_through(), Some(3));
}

#[test]
fn from_stages_rejects_gaps() {
    let stages = vec![StageModel::proven(0), StageModel::proven(1), stage3()];
    let err = Estimator::from_stages(stages).err().expect("gap at stage 2");
    assert_eq!(err, SolError::CheckpointOrderViolation { hidden: 3, missing: 2 });
}

#[test]
fn features_are_bounded_and_order_free_over_stock() {
    let s = new_game(17);
    let mut shuffled = s.clone();
    shuffled.stock.reverse();
    let a = features(&fingerprint(&s));
    let b = features(&fingerprint(&shuffled));
    assert_eq!(a.len(), FEATURE_DIM);
    assert_eq!(a, b, "stock order must not affect features");
    assert!(a.iter().all(|v| (0.0..=1.0).contains(v)), "features lie in [0, 1]: {a:?}");
}

#[test]
fn logistic_fit_moves_towards_targets() {
    let mut x_hi = [0f32; FEATURE_DIM];
    x_hi[0] = 1.0;
    x_hi[1] = 1.0;
    let mut x_lo = [0f32; FEATURE_DIM];
    x_lo[0] = 1.0;
    let data = vec![(x_hi, 0.0f32), (x_lo, 1.0f32)];
    let mut m = LogisticModel::default();
    let before = m.report(&data);
    let after = m.fit(&data, 500, 0.5);
    assert!(after.loss < before.loss, "fit must reduce loss");
    assert!(m.predict(&x_lo) > 0.8 && m.predict(&x_hi) < 0.2);
}

#[test]
fn exploration_records_layers_by_hidden_count() {
    let s = new_game(4);
    let budget = sol2::Budget { max_nodes: 20_000, closure_cap: 128, time_ms: None };
    let ex = explore(&s, 1, &budget);
    assert!(ex.layers.contains_key(&21), "root layer present");
    assert!(ex.total() > 1, "at least one successor class");
    let mut all: Vec<_> = ex.layers.values().flatten().cloned().collect();
    let n = all.len();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), n, "no fingerprint is recorded twice");
}

#[test]
fn binary_stage_estimates_are_zero_or_one() {
    let dead = fingerprint(&dead_lock_h3());
    assert_eq!(through_stage3(-10.0).estimate(&dead), Ok(0.0));
    assert_eq!(through_stage3(10.0).estimate(&dead), Ok(1.0));

    let est = Estimator::from_stages(vec![
        StageModel::proven(0),
        StageModel::proven(1),
        StageModel::proven(2),
        stage3(),
    ])
    .expect("stages");
    for i in 0..8u64 {
        let mut rng = Pcg64::seed_from_u64(i);
        let s = random_scenario(3, &mut rng).expect("scenario");
        let v = est.estimate(&fingerprint(&s)).expect("estimate");
        assert!(v == 0.0 || v == 1.0, "binary stage returned {v}");
    }
}

#[test]
fn averaged_target_is_the_mean_over_successor_classes() {
    let s = two_reveals_h4();
    assert_eq!(s.hidden_count(), 4);
    let budget = wide_budget();
    let succ = successors(&s, &budget);
    assert!(!succ.truncated);
    assert_eq!(succ.edges.len(), 2, "one class per Queen that can leave");
    assert!(succ.edges.iter().all(|e| e.fingerprint.hidden() == 3));

    // The stage-3 model says 1 everywhere; the memo overrides one class with 0.
    let est = through_stage3(10.0);
    let lost = apply_move(&s, Move::TableauToFoundationAndReveal { src: 0, foundation: 0 }).expect("apply");
    est.memo().insert_if_absent(&fingerprint(&lost), 0.0);

    let r = est.rate(&s, &budget).expect("rate");
    assert!(r.exact && !r.truncated, "{r:?}");
    assert_eq!(r.probability, 0.5, "(0 + 1) / 2");
    assert_eq!(est.estimate(&fingerprint(&s)), Ok(0.5), "target is memoised");
}

#[test]
fn averaged_target_without_successors_is_zero() {
    let s = dead_lock_h4();
    assert_eq!(s.hidden_count(), 4);
    let est = through_stage3(10.0);
    let r = est.rate(&s, &wide_budget()).expect("rate");
    assert!(r.exact, "{r:?}");
    assert_eq!(r.probability, 0.0);
}

#[test]
fn truncated_averaged_target_stays_unresolved() {
    let s = two_reveals_h4();
    let mut est = through_stage3(10.0);
    let mut stage4 = LogisticModel::default();
    stage4.weights[0] = -10.0;
    est.commit_stage(StageModel {
        hidden: 4,
        kind: StageKind::Averaged,
        model: stage4,
        samples: 1,
        mse: 0.0,
    })
    .expect("stage 4");

    let tiny = Budget { max_nodes: 1, closure_cap: 4096, time_ms: None };
    let r = est.rate(&s, &tiny).expect("rate");
    assert!(!r.exact && r.truncated, "{r:?}");
    assert!(r.probability > 0.0 && r.probability < 0.01, "falls back to the stage-4 model: {r:?}");
    assert_eq!(est.memo().get(&fingerprint(&s)), None, "unresolved targets are not memoised");
}

/// Proven stages plus a binary stage whose model is just a bias.
fn through_stage3(bias: f32) -> Estimator {
    let mut model = LogisticModel::default();
    model.weights[0] = bias;
    Estimator::from_stages(vec![
        StageModel::proven(0),
        StageModel::proven(1),
        StageModel::proven(2),
        StageModel { hidden: 3, kind: StageKind::Binary, model, samples: 1, mse: 0.0 },
    ])
    .expect("stages")
}

fn stage3() -> StageModel {
    StageModel {
        hidden: 3,
        kind: StageKind::Binary,
        model: LogisticModel { weights: vec![0.1; FEATURE_DIM] },
        samples: 4,
        mse: 0.1,
    }
}
