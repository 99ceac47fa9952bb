use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SolError;
use crate::solver::estimator::{Estimator, StageModel};
use crate::solver::model::FEATURE_DIM;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointHeader {
    pub version: u32,
    pub feature_dim: u32,
    /// Training seed the stages were produced with.
    pub seed: u64,
    pub samples_per_stage: u64,
}

impl CheckpointHeader {
    pub fn new(seed: u64, samples_per_stage: u64) -> Self {
        Self {
            version: FORMAT_VERSION,
            feature_dim: FEATURE_DIM as u32,
            seed,
            samples_per_stage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StageRecord {
    stage: StageModel,
    checksum: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Checkpoint {
    header: CheckpointHeader,
    stages: BTreeMap<u8, StageRecord>,
}

/// CRC-32 of a stage's encoded parameters.
pub fn stage_checksum(stage: &StageModel) -> Result<u32, SolError> {
    let bytes = bincode::serialize(stage).map_err(|e| SolError::Checkpoint(format!("bincode serialize error: {e}")))?;
    Ok(crc32fast::hash(&bytes))
}

/// Hex SHA-256 over the encoded stages in order. Equal digests mean the
/// same trained parameters.
pub fn stages_digest(stages: &[StageModel]) -> Result<String, SolError> {
    let mut hasher = Sha256::new();
    for st in stages {
        let bytes = bincode::serialize(st).map_err(|e| SolError::Checkpoint(format!("bincode serialize error: {e}")))?;
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(hex(&hasher.finalize()))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Save stages as a single bincode blob keyed by hidden count. The file is
/// written beside `path` and renamed over it, so readers never see a partial
/// checkpoint.
pub fn save_checkpoint<P: AsRef<Path>>(path: P, header: &CheckpointHeader, stages: &[StageModel]) -> Result<(), SolError> {
    let mut map = BTreeMap::new();
    for st in stages {
        map.insert(
            st.hidden,
            StageRecord {
                stage: st.clone(),
                checksum: stage_checksum(st)?,
            },
        );
    }
    let ckpt = Checkpoint { header: header.clone(), stages: map };
    let bytes = bincode::serialize(&ckpt).map_err(|e| SolError::Checkpoint(format!("bincode serialize error: {e}")))?;

    let path = path.as_ref();
    let tmp = temp_sibling(path);
    fs::write(&tmp, bytes).map_err(|e| SolError::Checkpoint(format!("write error: {e}")))?;
    fs::rename(&tmp, path).map_err(|e| SolError::Checkpoint(format!("rename error: {e}")))?;
    Ok(())
}

/// Convenience wrapper saving every committed stage of `estimator`.
pub fn save_estimator<P: AsRef<Path>>(path: P, header: &CheckpointHeader, estimator: &Estimator) -> Result<(), SolError> {
    save_checkpoint(path, header, estimator.stages())
}

/// Load a checkpoint written by `save_checkpoint`. Stages must run 0, 1, 2,
/// .. without a gap and match their checksums.
pub fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<(CheckpointHeader, Vec<StageModel>), SolError> {
    let bytes = fs::read(path.as_ref()).map_err(|e| SolError::Checkpoint(format!("read error: {e}")))?;
    let ckpt: Checkpoint =
        bincode::deserialize(&bytes).map_err(|e| SolError::Checkpoint(format!("bincode deserialize error: {e}")))?;

    let header = ckpt.header;
    if header.version != FORMAT_VERSION {
        return Err(SolError::Checkpoint(format!(
            "format version {} (expected {FORMAT_VERSION})",
            header.version
        )));
    }
    if header.feature_dim as usize != FEATURE_DIM {
        return Err(SolError::Checkpoint(format!(
            "feature dimension {} (expected {FEATURE_DIM})",
            header.feature_dim
        )));
    }

    let mut stages = Vec::with_capacity(ckpt.stages.len());
    for (expected, (h, rec)) in ckpt.stages.into_iter().enumerate() {
        let expected = expected as u8;
        if h != expected {
            return Err(SolError::CheckpointOrderViolation { hidden: h, missing: expected });
        }
        if rec.stage.hidden != h {
            return Err(SolError::Checkpoint(format!("record {h} holds stage {}", rec.stage.hidden)));
        }
        if stage_checksum(&rec.stage)? != rec.checksum {
            return Err(SolError::Checkpoint(format!("checksum mismatch at stage {h}")));
        }
        stages.push(rec.stage);
    }
    Ok((header, stages))
}

/// Load a checkpoint straight into a fresh estimator.
pub fn load_estimator<P: AsRef<Path>>(path: P) -> Result<(CheckpointHeader, Estimator), SolError> {
    let (header, stages) = load_checkpoint(path)?;
    Ok((header, Estimator::from_stages(stages)?))
}
