#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a wave-defence level headlessly.

mod config;
mod overlay;
mod simulation;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::{config::LevelConfig, simulation::Simulation};

/// Runs a level through a deterministic tick loop and prints debug overlays.
#[derive(Debug, Parser)]
#[command(name = "wave-defence", version, about, long_about = None)]
struct Args {
    /// TOML level description; the built-in level is used when omitted.
    #[arg(long)]
    level: Option<PathBuf>,

    /// Overrides the level's tick count.
    #[arg(long)]
    ticks: Option<u32>,

    /// Overrides the level's random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Prints the overlay after every tick instead of only at the end.
    #[arg(long)]
    watch: bool,
}

/// Entry point for the wave-defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut level = match &args.level {
        Some(path) => LevelConfig::load(path)?,
        None => LevelConfig::builtin()?,
    };
    if let Some(ticks) = args.ticks {
        level.simulation.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        level.simulation.seed = seed;
    }

    let mut simulation = Simulation::new(&level)?;
    let navigator = simulation.navigator();
    info!(
        columns = level.grid.columns,
        rows = level.grid.rows,
        obstacles = navigator.grid().obstacle_count(),
        reachable = navigator.field().reachable_count(),
        "level ready"
    );
    print!("{}", overlay::render(navigator, &[]));

    let mut tick = 0_u32;
    let summary = simulation.run(|state| {
        tick += 1;
        if args.watch {
            println!("\ntick {tick}");
            print!("{}", overlay::render(state.navigator(), &state.enemy_cells()));
        }
    });

    if !args.watch {
        println!();
        print!(
            "{}",
            overlay::render(simulation.navigator(), &simulation.enemy_cells())
        );
    }
    info!(%summary, "simulation finished");
    println!("{summary}");
    Ok(())
}
