use serde::{Deserialize, Serialize};

use crate::canon::Fingerprint;
use crate::cards::Card;
use crate::types::{DECK_SIZE, KING, NUM_SUITS, NUM_TABLEAUS};

pub const FEATURE_DIM: usize = 16;

pub type Features = [f32; FEATURE_DIM];

/// Feature vector of a fingerprint, each component scaled into [0, 1]
/// (bias first). Stock+waste contributes only through counts over its card
/// multiset, so the features do not depend on cycle order.
pub fn features(fp: &Fingerprint) -> Features {
    let hidden = fp.hidden_per_tableau();
    let tops = fp.foundation_tops();
    let runs = fp.revealed_runs();
    let stock = fp.stock_cycle();

    let next_needed = |c: &Card| tops[c.suit.index()] + 1 == c.rank;
    let next_total = tops.iter().filter(|&&t| t < KING).count() as f32;

    let mut f = [0f32; FEATURE_DIM];
    f[0] = 1.0;
    f[1] = fp.hidden() as f32 / (DECK_SIZE - NUM_TABLEAUS) as f32;
    f[2] = fp.stock_waste() as f32 / DECK_SIZE as f32;
    f[3] = tops.iter().map(|&t| t as f32).sum::<f32>() / DECK_SIZE as f32;
    f[4] = tops.iter().copied().min().unwrap_or(0) as f32 / KING as f32;

    let mut empty = 0;
    let mut covered = 0;
    let mut stranded = 0;
    let mut playable_tops = 0;
    let mut revealed = 0;
    for (h, run) in hidden.iter().zip(runs.iter()) {
        revealed += run.len();
        if *h > 0 {
            covered += 1;
        } else if run.is_empty() {
            empty += 1;
        } else if run.first().map_or(false, |c| !c.is_king()) {
            stranded += 1;
        }
        if run.last().map_or(false, next_needed) {
            playable_tops += 1;
        }
    }
    let tableaus = NUM_TABLEAUS as f32;
    f[5] = empty as f32 / tableaus;
    f[6] = covered as f32 / tableaus;
    f[7] = hidden.iter().copied().max().unwrap_or(0) as f32 / (DECK_SIZE - NUM_TABLEAUS) as f32;
    f[8] = stranded as f32 / tableaus;
    f[9] = revealed as f32 / DECK_SIZE as f32;

    let suits = NUM_SUITS as f32;
    f[10] = stock.iter().filter(|c| c.rank <= 3).count() as f32 / (3.0 * suits);
    f[11] = stock.iter().filter(|c| c.is_king()).count() as f32 / suits;
    let next_in_stock = stock.iter().filter(|c| next_needed(c)).count() as f32;
    let next_in_runs = runs.iter().flatten().filter(|c| next_needed(c)).count() as f32;
    f[12] = next_in_stock / suits;
    f[13] = next_in_runs / suits;
    f[14] = (next_total - next_in_stock - next_in_runs).max(0.0) / suits;
    f[15] = playable_tops as f32 / tableaus;
    f
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Logistic regression over `features`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f32>,
}

impl Default for LogisticModel {
    fn default() -> Self {
        Self { weights: vec![0.0; FEATURE_DIM] }
    }
}

/// Outcome of one fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitReport {
    /// Mean binary cross-entropy against the soft targets.
    pub loss: f64,
    pub mse: f64,
}

impl LogisticModel {
    #[inline]
    pub fn predict(&self, x: &Features) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(x.iter())
            .map(|(w, v)| *w as f64 * *v as f64)
            .sum();
        sigmoid(z)
    }

    /// Full-batch gradient descent on cross-entropy with targets in [0, 1].
    /// Deterministic for a given sample order.
    pub fn fit(&mut self, samples: &[(Features, f32)], epochs: u32, learning_rate: f32) -> FitReport {
        if samples.is_empty() {
            return FitReport { loss: f64::NAN, mse: f64::NAN };
        }
        let n = samples.len() as f64;
        let mut w: Vec<f64> = self.weights.iter().map(|&v| v as f64).collect();
        w.resize(FEATURE_DIM, 0.0);
        let lr = learning_rate as f64;

        for _ in 0..epochs {
            let mut grad = [0f64; FEATURE_DIM];
            for (x, y) in samples {
                let z: f64 = w.iter().zip(x.iter()).map(|(a, b)| a * *b as f64).sum();
                let err = sigmoid(z) - *y as f64;
                for (g, v) in grad.iter_mut().zip(x.iter()) {
                    *g += err * *v as f64;
                }
            }
            for (wi, g) in w.iter_mut().zip(grad.iter()) {
                *wi -= lr * g / n;
            }
        }

        self.weights = w.iter().map(|&v| v as f32).collect();
        self.report(samples)
    }

    pub fn report(&self, samples: &[(Features, f32)]) -> FitReport {
        let n = samples.len() as f64;
        let mut loss = 0.0;
        let mut mse = 0.0;
        for (x, y) in samples {
            let p = self.predict(x).clamp(1e-12, 1.0 - 1e-12);
            let y = *y as f64;
            loss -= y * p.ln() + (1.0 - y) * (1.0 - p).ln();
            mse += (p - y) * (p - y);
        }
        FitReport { loss: loss / n, mse: mse / n }
    }

    pub fn is_finite(&self) -> bool {
        self.weights.iter().all(|w| w.is_finite())
    }
}
