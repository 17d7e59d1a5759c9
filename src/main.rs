mod app;
mod headless;

use anyhow::{Context, Result};
use clap::Parser;
use flappy_neat::config::Config;
use flappy_neat::evolve::Genome;
use flappy_neat::sprites::Sprites;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Flappy bird played by evolved neural networks", long_about = None)]
struct Args {
    /// JSON config file; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Train without opening a window
    #[arg(long)]
    headless: bool,

    /// Override the number of generations to run
    #[arg(long)]
    generations: Option<usize>,

    /// Seed the pipe field and the population
    #[arg(long)]
    seed: Option<u64>,

    /// Do not cap headless training at the tick rate
    #[arg(long, requires = "headless")]
    unthrottled: bool,

    /// Write the winning genome as JSON
    #[arg(long)]
    save_winner: Option<PathBuf>,

    /// Directory holding bird1..3.png, pipe.png, base.png and bg.png
    #[arg(long, default_value = "imgs")]
    assets: PathBuf,
}

pub(crate) fn announce_winner(winner: &Genome, save_to: Option<&Path>) -> Result<()> {
    log::info!("Best genome: {} with fitness {:.3}", winner.id, winner.fitness);
    if let Some(path) = save_to {
        let json = serde_json::to_string_pretty(winner)?;
        std::fs::write(path, json).with_context(|| format!("failed to write winner to {:?}", path))?;
        log::info!("Saved winner to {:?}", path);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(generations) = args.generations {
        config.evolution.generations = generations;
    }
    if args.seed.is_some() {
        config.game.seed = args.seed;
    }
    config.validate()?;

    let assets = args.assets.is_dir().then_some(args.assets.as_path());
    if assets.is_none() {
        log::info!("No asset directory at {:?}, using procedural sprites", args.assets);
    }
    let sprites = Sprites::load_or_procedural(assets);

    log::info!(
        "Starting with population {} for up to {} generations",
        config.evolution.population_size,
        config.evolution.generations
    );
    if args.headless {
        headless::run(config, sprites, args.unthrottled, args.save_winner)
    } else {
        app::run(config, sprites, args.save_winner)
    }
}
