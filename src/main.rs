//! Headless runner (default binary).
//!
//! Hands the game to the autopilot and runs a fixed number of frames without a
//! clock or a terminal. Prints a summary, or one JSON snapshot per lock with `--json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use autotris::core::{EngineConfig, GameSnapshot};
use autotris::engine::Engine;
use autotris::types::{Command, GameStatus, TICK_MS};

#[derive(Parser, Debug)]
#[command(name = "autotris", about = "Run the autopilot headless")]
struct Args {
    /// TOML config file; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Frames to run before stopping
    #[arg(long, default_value_t = 10_000)]
    frames: u32,

    /// Simulated time per frame
    #[arg(long, default_value_t = TICK_MS)]
    frame_ms: u32,

    /// Print a JSON snapshot after every lock and at the end
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autotris=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    run(&args, &config)
}

fn run(args: &Args, config: &EngineConfig) -> Result<()> {
    let mut engine = Engine::new(config);
    let mut snapshot = GameSnapshot::default();

    engine.advance(0, Some(Command::ToggleAi))?;
    info!(seed = config.seed, frames = args.frames, "autopilot engaged");

    let mut pieces = 0u32;
    let mut frames_run = 0u32;
    for _ in 0..args.frames {
        let frame = engine.advance(args.frame_ms, None)?;
        frames_run += 1;

        if frame.lock.is_some() {
            pieces += 1;
            if args.json {
                engine.snapshot_into(&mut snapshot);
                println!("{}", serde_json::to_string(&snapshot)?);
            }
        }
        if frame.status == GameStatus::GameOver {
            break;
        }
    }

    engine.snapshot_into(&mut snapshot);
    if args.json {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        println!(
            "status={} frames={} pieces={} score={} lines={} level={}",
            snapshot.status.as_str(),
            frames_run,
            pieces,
            snapshot.score,
            snapshot.lines,
            snapshot.level
        );
    }
    Ok(())
}
