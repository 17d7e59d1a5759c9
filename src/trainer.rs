use crate::config::Config;
use crate::error::SimError;
use crate::evolve::{FeedForwardNet, Genome, Population, Statistics};
use crate::runner::{GenerationReport, GenerationRunner, Outcome, RenderSink, RunState, TickLimiter};
use crate::sprites::Sprites;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;

#[derive(Debug)]
pub enum Progress {
    Running,
    GenerationDone,
    /// Threshold reached or generation budget spent.
    Finished(Genome),
}

/// Outer evolutionary loop: runs generations strictly one after another and
/// feeds each one's fitness back into the population.
pub struct Trainer {
    config: Config,
    sprites: Rc<Sprites>,
    rng: SmallRng,
    population: Population,
    stats: Statistics,
    current: Option<GenerationRunner<FeedForwardNet>>,
}

impl Trainer {
    pub fn new(config: Config, sprites: Rc<Sprites>) -> Self {
        let mut rng = match config.game.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let population = Population::new(&config.evolution, &mut rng);
        Self { config, sprites, rng, population, stats: Statistics::default(), current: None }
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// 1-based number of the generation being (or about to be) played.
    pub fn generation(&self) -> usize {
        self.population.generation + 1
    }

    fn start_generation(&mut self) -> Result<GenerationRunner<FeedForwardNet>, SimError> {
        let generation = self.generation();
        log::info!(" ****** Running generation {} ****** ", generation);
        let controllers = self.population.controllers();
        GenerationRunner::new(generation, controllers, &self.config.game, self.sprites.clone())
    }

    /// Records a finished generation. Returns the winner when training is over.
    fn complete(&mut self, report: GenerationReport) -> Option<Genome> {
        self.population.evaluate(&report.fitness);
        self.stats.record(&self.population.genomes, report.score);

        if self.population.solved() {
            if let Some(w) = self.population.best() {
                log::info!("Best individual in generation {} meets fitness threshold: genome {}", report.generation, w.id);
            }
        } else if report.generation >= self.config.evolution.generations {
            log::info!("Generation budget of {} exhausted", self.config.evolution.generations);
        } else {
            self.population.reproduce(&mut self.rng);
            return None;
        }
        log::info!("Best score over {} generations: {}", report.generation, self.stats.best_score());
        self.population.best().cloned()
    }

    /// Single tick for event-loop callers; starts the next generation on demand.
    pub fn tick(&mut self, sink: &mut dyn RenderSink) -> Result<Progress, SimError> {
        if self.current.is_none() {
            let runner = self.start_generation()?;
            self.current = Some(runner);
        }
        let Some(runner) = self.current.as_mut() else {
            return Ok(Progress::Running);
        };
        if runner.step(sink)? == RunState::Running {
            return Ok(Progress::Running);
        }
        let Some(runner) = self.current.take() else {
            return Ok(Progress::Running);
        };
        match self.complete(runner.finish()) {
            Some(winner) => Ok(Progress::Finished(winner)),
            None => Ok(Progress::GenerationDone),
        }
    }

    /// Runs generations back to back. `None` means training was cancelled.
    pub fn run(
        &mut self,
        limiter: &mut TickLimiter,
        sink: &mut dyn RenderSink,
        quit: &AtomicBool,
    ) -> Result<Option<Genome>, SimError> {
        loop {
            let runner = self.start_generation()?;
            match runner.run(limiter, sink, quit)? {
                Outcome::Quit => return Ok(None),
                Outcome::Finished(report) => {
                    if let Some(winner) = self.complete(report) {
                        return Ok(Some(winner));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::NullSink;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn small_config(generations: usize) -> Config {
        let mut config = Config::default();
        config.game.seed = Some(42);
        config.game.max_ticks = Some(3_000);
        config.evolution.population_size = 6;
        config.evolution.generations = generations;
        config.evolution.fitness_threshold = f64::INFINITY;
        config
    }

    #[test]
    fn test_run_stops_after_generation_budget() {
        let mut trainer = Trainer::new(small_config(3), Rc::new(Sprites::procedural()));
        let quit = AtomicBool::new(false);
        let winner = trainer.run(&mut TickLimiter::unthrottled(), &mut NullSink, &quit).unwrap();
        assert!(winner.is_some());
        assert_eq!(trainer.stats().best_fitness.len(), 3);
        assert_eq!(trainer.population().genomes.len(), 6);
    }

    #[test]
    fn test_tick_walks_through_generations() {
        let mut trainer = Trainer::new(small_config(2), Rc::new(Sprites::procedural()));
        let mut done = 0;
        let mut ticks = 0;
        loop {
            ticks += 1;
            assert!(ticks < 1_000_000);
            match trainer.tick(&mut NullSink).unwrap() {
                Progress::Running => {}
                Progress::GenerationDone => {
                    done += 1;
                    assert_eq!(trainer.generation(), 2);
                }
                Progress::Finished(_) => break,
            }
        }
        assert_eq!(done, 1);
        assert_eq!(trainer.stats().scores.len(), 2);
    }

    #[test]
    fn test_quit_flag_raised_mid_run_cancels_training() {
        let mut config = small_config(usize::MAX);
        config.game.max_ticks = Some(500);
        let mut trainer = Trainer::new(config, Rc::new(Sprites::procedural()));
        let quit = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&quit);
        let raiser = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            flag.store(true, Ordering::Relaxed);
        });
        let winner = trainer.run(&mut TickLimiter::unthrottled(), &mut NullSink, &quit).unwrap();
        raiser.join().unwrap();
        assert!(winner.is_none());
    }

    #[test]
    fn test_threshold_ends_training_early() {
        let mut config = small_config(50);
        config.evolution.fitness_threshold = 0.0;
        let mut trainer = Trainer::new(config, Rc::new(Sprites::procedural()));
        let quit = AtomicBool::new(false);
        let winner = trainer.run(&mut TickLimiter::unthrottled(), &mut NullSink, &quit).unwrap();
        assert!(winner.is_some());
        assert_eq!(trainer.stats().best_fitness.len(), 1);
    }
}
