//! Verification evaluation command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use fair_eval::import::load_face_samples;
use fair_eval::pairs::DEFAULT_IMPOSTOR_CAP;
use fair_eval::{EvalSession, PairingStrategy};

use super::{EvalOptions, StrategyArg};

pub fn run(
    input: PathBuf,
    strategy: Option<StrategyArg>,
    impostor_cap: Option<usize>,
    options: &EvalOptions,
) -> Result<()> {
    let mut config = options.to_config()?;

    let configured_cap = match config.pairing {
        PairingStrategy::IdentityWithImpostorCap { cap } => cap,
        PairingStrategy::AugmentationOnly => DEFAULT_IMPOSTOR_CAP,
    };
    let cap = impostor_cap.unwrap_or(configured_cap);
    config.pairing = match strategy {
        Some(StrategyArg::Augmentation) => PairingStrategy::AugmentationOnly,
        Some(StrategyArg::Identity) => PairingStrategy::IdentityWithImpostorCap { cap },
        None => match config.pairing {
            PairingStrategy::IdentityWithImpostorCap { .. } => {
                PairingStrategy::IdentityWithImpostorCap { cap }
            }
            other => other,
        },
    };

    log::info!("Loading samples from: {}", input.display());
    let samples = load_face_samples(&input)
        .with_context(|| format!("Failed to load samples from {}", input.display()))?;
    println!("Loaded {} samples", samples.len());

    let session = EvalSession::new(config);
    let report = session
        .evaluate_samples(&samples)
        .context("Evaluation failed")?;

    let name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("verification");
    options.finish(&session, &report, name)
}
