use crate::announce_winner;
use anyhow::{Context, Result};
use flappy_neat::config::Config;
use flappy_neat::runner::{RenderSink, Scene, TickLimiter};
use flappy_neat::sprites::Sprites;
use flappy_neat::trainer::Trainer;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Logs score milestones instead of drawing frames.
#[derive(Default)]
struct ProgressLog {
    generation: usize,
    score: u32,
}

impl RenderSink for ProgressLog {
    fn draw(&mut self, scene: &Scene<'_>) {
        if scene.generation != self.generation {
            self.generation = scene.generation;
            self.score = 0;
        }
        if scene.score > self.score {
            self.score = scene.score;
            if self.score % 10 == 0 {
                log::info!(
                    "Generation {}: score {} at tick {} with {}/{} birds alive",
                    scene.generation,
                    scene.score,
                    scene.tick,
                    scene.birds.len(),
                    scene.population
                );
            }
        }
    }
}

/// Raises the returned flag on Ctrl-C; training stops at the next tick boundary.
fn install_quit_handler() -> Result<Arc<AtomicBool>> {
    let quit = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&quit);
    ctrlc::set_handler(move || {
        log::info!("Interrupted, stopping after the current tick");
        flag.store(true, Ordering::Relaxed);
    })
    .context("failed to install Ctrl-C handler")?;
    Ok(quit)
}

pub fn run(config: Config, sprites: Sprites, unthrottled: bool, save_winner: Option<PathBuf>) -> Result<()> {
    let mut limiter = if unthrottled {
        TickLimiter::unthrottled()
    } else {
        TickLimiter::new(config.game.tick_rate)
    };
    let mut trainer = Trainer::new(config, Rc::new(sprites));
    let quit = install_quit_handler()?;

    let winner = trainer
        .run(&mut limiter, &mut ProgressLog::default(), &quit)
        .context("headless training failed")?;
    match winner {
        Some(winner) => announce_winner(&winner, save_winner.as_deref()),
        None => {
            log::info!("Training cancelled");
            Ok(())
        }
    }
}
