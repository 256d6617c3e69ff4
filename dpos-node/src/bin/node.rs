//! Staking Node Binary
//!
//! Replays a JSON-lines action log (file argument or stdin) into the
//! RocksDB-backed staking engine and prints the final metrics.

use dpos_node::{Config, StakingEngine};
use prometheus::{Encoder, TextEncoder};
use std::fs::File;
use std::io::{self, BufReader, Write};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting staking node");

    // Load configuration
    let config = if let Ok(config_path) = std::env::var("DPOS_CONFIG") {
        info!("Loading config from: {}", config_path);
        Config::from_file(&config_path)?
    } else {
        info!("Loading config from environment variables");
        Config::from_env()?
    };

    let mut engine = StakingEngine::open(&config)?;

    let summary = match std::env::args().nth(1) {
        Some(path) => {
            info!("Replaying actions from: {}", path);
            engine.replay(BufReader::new(File::open(&path)?))?
        }
        None => {
            info!("Replaying actions from stdin");
            engine.replay(io::stdin().lock())?
        }
    };

    info!(
        blocks = summary.blocks,
        applied = summary.applied,
        failed = summary.failed,
        height = engine.height() - 1,
        "Replay finished"
    );

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&engine.metrics().registry().gather(), &mut buffer)?;
    io::stdout().write_all(&buffer)?;

    Ok(())
}
