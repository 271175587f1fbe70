use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use aimlab::mesh::MAX_SMOOTHNESS;
use aimlab::{AppConfig, GameConfig};

#[derive(Parser)]
#[command(name = "aimlab", about = "First-person aim trainer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Number of simultaneous targets (at most 25)
    #[arg(short, long, default_value_t = 3)]
    targets: usize,

    /// Sphere tessellation: rings and segments per target
    #[arg(
        long,
        default_value_t = 64,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SMOOTHNESS))
    )]
    smoothness: u32,

    /// Degrees of rotation per pixel of mouse motion
    #[arg(short, long, default_value_t = 0.08)]
    sensitivity: f32,

    /// Font file for the telemetry text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Run in a 1280x720 window instead of borderless fullscreen
    #[arg(long)]
    windowed: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(if cli.verbose { "debug" } else { "info" }))
        .init();

    let game = GameConfig::new()
        .targets(cli.targets)
        .smoothness(cli.smoothness)
        .sensitivity(cli.sensitivity);

    let mut app = AppConfig::new().font(cli.font);
    if cli.windowed {
        app = app.windowed(1280, 720);
    }

    tracing::info!(targets = cli.targets, smoothness = cli.smoothness, "starting aimlab");
    aimlab::run(app, game)?;
    Ok(())
}
