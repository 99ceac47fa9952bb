use sol2::persist::{
    load_checkpoint, load_estimator, save_checkpoint, stage_checksum, stages_digest, CheckpointHeader, FORMAT_VERSION,
};
use sol2::solver::model::{LogisticModel, FEATURE_DIM};
use sol2::solver::{StageKind, StageModel};
use sol2::SolError;

fn fitted(hidden: u8, w: f32) -> StageModel {
    StageModel {
        hidden,
        kind: StageKind::for_hidden(hidden),
        model: LogisticModel { weights: (0..FEATURE_DIM).map(|i| w * i as f32).collect() },
        samples: 10,
        mse: 0.05,
    }
}

fn full_run() -> Vec<StageModel> {
    vec![
        StageModel::proven(0),
        StageModel::proven(1),
        StageModel::proven(2),
        fitted(3, 0.25),
        fitted(4, -0.5),
    ]
}

#[test]
fn checkpoint_round_trip_preserves_stages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("est.ckpt");
    let header = CheckpointHeader::new(99, 32);
    let stages = full_run();

    save_checkpoint(&path, &header, &stages).expect("save");
    let (h2, loaded) = load_checkpoint(&path).expect("load");
    assert_eq!(h2, header);
    assert_eq!(loaded, stages);
    assert_eq!(stages_digest(&loaded).expect("digest"), stages_digest(&stages).expect("digest"));

    let (_, est) = load_estimator(&path).expect("estimator");
    assert_eq!(est.trained_through(), Some(4));
    assert!(!dir.path().join("est.ckpt.tmp").exists(), "temporary file is renamed away");
}

#[test]
fn gap_in_stages_is_rejected_at_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("gap.ckpt");
    let mut stages = full_run();
    stages.remove(3);
    save_checkpoint(&path, &CheckpointHeader::new(1, 1), &stages).expect("save");
    let err = load_checkpoint(&path).unwrap_err();
    assert_eq!(err, SolError::CheckpointOrderViolation { hidden: 4, missing: 3 });
}

#[test]
fn version_mismatch_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("old.ckpt");
    let header = CheckpointHeader { version: FORMAT_VERSION + 1, ..CheckpointHeader::new(1, 1) };
    save_checkpoint(&path, &header, &full_run()).expect("save");
    assert!(matches!(load_checkpoint(&path), Err(SolError::Checkpoint(_))));
}

#[test]
fn garbage_and_missing_files_are_checkpoint_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("junk.ckpt");
    std::fs::write(&path, b"not a checkpoint").expect("write");
    assert!(matches!(load_checkpoint(&path), Err(SolError::Checkpoint(_))));
    assert!(matches!(
        load_checkpoint(dir.path().join("absent.ckpt")),
        Err(SolError::Checkpoint(_))
    ));
}

#[test]
fn checksums_and_digests_track_parameters() {
    let a = fitted(3, 0.25);
    let b = fitted(3, 0.5);
    assert_ne!(stage_checksum(&a).expect("crc"), stage_checksum(&b).expect("crc"));
    let d1 = stages_digest(&[a.clone()]).expect("digest");
    let d2 = stages_digest(&[b]).expect("digest");
    assert_ne!(d1, d2);
    assert_eq!(d1.len(), 64, "hex sha-256");
    assert_eq!(d1, stages_digest(&[a]).expect("digest"));
}
