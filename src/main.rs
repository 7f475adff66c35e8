//! Headless autoplay runner (default binary).
//!
//! Plays `CLASSIC_BLOCKS_GAMES` seeded games and prints one JSON summary per
//! line on stdout. With `CLASSIC_BLOCKS_STRESS` set, also runs the guarantee
//! stress check. Logs go to stderr, filtered by `CLASSIC_BLOCKS_LOG`.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use classic_blocks::autoplay::{play_game, stress_refills, AutoplayConfig, STRESS_BOARDS};
use classic_blocks::core::occupancy::Occupancy;

fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_env("CLASSIC_BLOCKS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = AutoplayConfig::from_env();
    let tuning = config.load_tuning()?;
    tracing::info!(?config, "autoplay starting");

    for game in 0..config.games {
        let summary = play_game(config.seed.wrapping_add(game), &tuning, config.max_trays);
        let line = serde_json::to_string(&summary).context("serializing game summary")?;
        println!("{line}");
    }

    if config.stress_iterations > 0 {
        for (name, rows) in STRESS_BOARDS {
            let report = stress_refills(
                &tuning,
                name,
                Occupancy::from_ascii(&rows),
                config.stress_iterations,
                config.seed,
            );
            let line = serde_json::to_string(&report).context("serializing stress report")?;
            println!("{line}");
        }
    }

    Ok(())
}
