use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use sol2::{
    persist::{load_estimator, save_estimator, stages_digest, CheckpointHeader},
    solver::{evaluate_levels, train, PlayLimits, TrainConfig},
    Budget, Estimator,
};

#[derive(Debug, Parser)]
#[command(name = "train", about = "Train the staged solvability estimator")]
struct Args {
    /// Last stage (hidden-card count) to train
    #[arg(long, default_value_t = 8)]
    max_hidden: u8,

    /// Random scenarios drawn per stage
    #[arg(long, default_value_t = 64)]
    samples: usize,

    /// Training seed (deterministic)
    #[arg(long, default_value_t = 0x5012_2024u64)]
    seed: u64,

    /// Node budget per exact target search
    #[arg(long, default_value_t = 100_000)]
    max_nodes: u64,

    /// Reversible-closure cap per successor enumeration
    #[arg(long, default_value_t = 4096)]
    closure_cap: usize,

    /// Optional wall-clock limit per search in milliseconds
    #[arg(long)]
    time_ms: Option<u64>,

    #[arg(long, default_value_t = 400)]
    epochs: u32,

    #[arg(long, default_value_t = 0.5)]
    learning_rate: f32,

    /// Reject a stage whose fit error exceeds this
    #[arg(long, default_value_t = 0.26)]
    max_mse: f32,

    /// Checkpoint file, rewritten after every committed stage
    #[arg(long, default_value = "sol2.ckpt")]
    out: PathBuf,

    /// Continue from the stages already stored in --out
    #[arg(long, default_value_t = false)]
    resume: bool,

    /// Self-play trials per level after training (0 = skip)
    #[arg(long, default_value_t = 0)]
    evaluate: usize,

    /// Move limit per self-play session
    #[arg(long, default_value_t = 999)]
    max_moves: u32,

    /// Disable progress bars
    #[arg(long, default_value_t = false)]
    no_progress: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let budget = Budget {
        max_nodes: args.max_nodes,
        closure_cap: args.closure_cap,
        time_ms: args.time_ms,
    };
    let cfg = TrainConfig {
        max_hidden: args.max_hidden,
        samples_per_stage: args.samples,
        seed: args.seed,
        budget,
        epochs: args.epochs,
        learning_rate: args.learning_rate,
        max_mse: args.max_mse,
        progress: !args.no_progress,
    };

    let mut estimator = if args.resume && args.out.exists() {
        let (header, est) = load_estimator(&args.out).map_err(|e| format!("Checkpoint load error: {e}"))?;
        if header.seed != cfg.seed {
            eprintln!(
                "[train] warning: checkpoint seed {:#x} differs from --seed {:#x}",
                header.seed, cfg.seed
            );
        }
        println!(
            "[train] Resuming from {} with {} committed stages.",
            args.out.display(),
            est.stages().len()
        );
        est
    } else {
        Estimator::new()
    };

    let header = CheckpointHeader::new(cfg.seed, cfg.samples_per_stage as u64);
    let out = args.out.clone();
    let start = Instant::now();
    let report = train(&mut estimator, &cfg, |est| save_estimator(&out, &header, est))?;

    for st in &report.stages {
        println!(
            "[train] h={} kind={:?} samples={} resolved={} fitted={} mse={:.4} ({} ms)",
            st.hidden, st.kind, st.samples, st.resolved, st.fitted, st.mse, st.elapsed_ms
        );
    }
    println!(
        "[train] Committed {} stages in {:.2}s -> {}",
        estimator.stages().len(),
        start.elapsed().as_secs_f64(),
        args.out.display()
    );
    println!("[train] digest {}", stages_digest(estimator.stages())?);

    if args.evaluate > 0 {
        let limits = PlayLimits {
            max_moves: args.max_moves,
            budget,
        };
        let levels = evaluate_levels(&estimator, cfg.max_hidden, args.evaluate, cfg.seed, &limits)?;
        for lv in levels {
            println!(
                "Level {} ({} face-down cards): Win rate: {:.1}% ({}/{} wins) in {:.2} seconds.",
                lv.hidden,
                lv.hidden,
                lv.win_rate() * 100.0,
                lv.won,
                lv.trials,
                lv.elapsed_ms as f64 / 1000.0
            );
        }
    }

    Ok(())
}
