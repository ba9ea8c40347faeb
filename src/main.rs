use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use toroid_snake::config::GameConfig;
use toroid_snake::game::SnakeGame;

#[derive(Parser)]
#[command(name = "toroid-snake")]
#[command(version, about = "Snake on a wrap-around grid, with bunnies and traps")]
struct Cli {
    /// JSON file with game settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid height
    #[arg(long)]
    height: Option<i32>,

    /// Grid width
    #[arg(long)]
    width: Option<i32>,

    /// Seconds between ticks
    #[arg(long)]
    tick_interval: Option<f64>,

    /// Seed for food and trap placement
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs here (RUST_LOG controls the level)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    config.height = cli.height.unwrap_or(config.height);
    config.width = cli.width.unwrap_or(config.width);
    config.tick_interval = cli.tick_interval.unwrap_or(config.tick_interval);
    config.seed = cli.seed.or(config.seed);
    config.validate()?;

    let mut game = SnakeGame::new(config)?;
    let summary = game.run()?;
    println!("{}", summary);

    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {:?}", path))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
