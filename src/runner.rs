//! One generation of the game: a fixed population of birds flying through a
//! shared, seeded pipe field until every bird is retired.

use crate::bird::Bird;
use crate::config::GameConfig;
use crate::controller::{Controller, wants_jump};
use crate::error::SimError;
use crate::ground::Ground;
use crate::pipe::Pipe;
use crate::sensor::{self, SENSOR_LEN};
use crate::sprites::Sprites;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Terminated,
}

/// Borrowed view of the world handed to the render sink once per tick.
pub struct Scene<'a> {
    pub generation: usize,
    pub score: u32,
    pub tick: u64,
    pub population: usize,
    pub birds: &'a [Bird],
    pub pipes: &'a [Pipe],
    pub ground: &'a Ground,
}

pub trait RenderSink {
    fn draw(&mut self, scene: &Scene<'_>);
}

/// Sink that discards every frame.
pub struct NullSink;

impl RenderSink for NullSink {
    fn draw(&mut self, _scene: &Scene<'_>) {}
}

/// Caps the loop at a fixed tick rate. Running slower is tolerated.
pub struct TickLimiter {
    period: Option<Duration>,
    last: Option<Instant>,
}

impl TickLimiter {
    pub fn new(rate: u32) -> Self {
        debug_assert!(rate > 0, "tick rate must be non-zero");
        Self { period: Some(Duration::from_secs_f64(1.0 / rate as f64)), last: None }
    }

    pub fn unthrottled() -> Self {
        Self { period: None, last: None }
    }

    /// Non-blocking check for event-loop driven callers.
    pub fn ready(&self) -> bool {
        match (self.period, self.last) {
            (Some(period), Some(last)) => last.elapsed() >= period,
            _ => true,
        }
    }

    pub fn mark(&mut self) {
        self.last = Some(Instant::now());
    }

    /// Blocks until one period has passed since the previous tick.
    pub fn wait(&mut self) {
        if let (Some(period), Some(last)) = (self.period, self.last) {
            let elapsed = last.elapsed();
            if elapsed < period {
                std::thread::sleep(period - elapsed);
            }
        }
        self.mark();
    }
}

/// Fitness ledger and summary of a finished generation, indexed like the
/// controllers the runner was built from.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub generation: usize,
    pub score: u32,
    pub ticks: u64,
    pub fitness: Vec<f64>,
}

#[derive(Debug)]
pub enum Outcome {
    Finished(GenerationReport),
    Quit,
}

pub struct GenerationRunner<C> {
    generation: usize,
    config: GameConfig,
    sprites: Rc<Sprites>,
    rng: SmallRng,
    controllers: Vec<C>,
    fitness: Vec<f64>,
    birds: Vec<Bird>,
    pipes: Vec<Pipe>,
    ground: Ground,
    score: u32,
    ticks: u64,
    state: RunState,
}

impl<C: Controller> GenerationRunner<C> {
    /// Sets up `controllers.len()` birds, one pipe and a score of zero.
    /// Invalid geometry or a controller that cannot take the sensor vector is a
    /// fatal configuration error.
    pub fn new(
        generation: usize,
        controllers: Vec<C>,
        config: &GameConfig,
        sprites: Rc<Sprites>,
    ) -> Result<Self, SimError> {
        config.validate()?;
        for (agent, controller) in controllers.iter().enumerate() {
            if controller.input_len() != SENSOR_LEN {
                return Err(SimError::FeatureMismatch { agent, expected: SENSOR_LEN, got: controller.input_len() });
            }
        }

        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(generation as u64)),
            None => SmallRng::from_entropy(),
        };
        let birds = (0..controllers.len()).map(|slot| Bird::new(slot, config.start_x, config.start_y)).collect();
        let pipes = vec![Pipe::spawn(config.pipe_spawn_x, &mut rng, config, &sprites)?];
        let ground = Ground::new(config.ground_y, sprites.base_width());

        Ok(Self {
            generation,
            config: config.clone(),
            fitness: vec![0.0; controllers.len()],
            controllers,
            sprites,
            rng,
            birds,
            pipes,
            ground,
            score: 0,
            ticks: 0,
            state: RunState::Running,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn alive(&self) -> usize {
        self.birds.len()
    }

    pub fn birds(&self) -> &[Bird] {
        &self.birds
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn scene(&self) -> Scene<'_> {
        Scene {
            generation: self.generation,
            score: self.score,
            tick: self.ticks,
            population: self.controllers.len(),
            birds: &self.birds,
            pipes: &self.pipes,
            ground: &self.ground,
        }
    }

    /// Advances the world by exactly one tick.
    pub fn step(&mut self, sink: &mut dyn RenderSink) -> Result<RunState, SimError> {
        if self.state == RunState::Terminated {
            return Ok(RunState::Terminated);
        }
        let out_of_time = self.config.max_ticks.is_some_and(|max| self.ticks >= max);
        if self.birds.is_empty() || out_of_time {
            self.state = RunState::Terminated;
            log::debug!(
                "Generation {} terminated after {} ticks with score {}",
                self.generation,
                self.ticks,
                self.score
            );
            return Ok(RunState::Terminated);
        }

        let cfg = &self.config;
        let sprites = &*self.sprites;

        let active = sensor::active_pipe(&self.birds, &self.pipes, sprites).unwrap_or(0);
        let target = self.pipes[active].clone();

        for bird in self.birds.iter_mut() {
            bird.advance(cfg);
            self.fitness[bird.slot] += cfg.survival_reward;

            let features = sensor::encode(bird, &target);
            let agent = bird.slot;
            let jump = self.controllers[agent]
                .decide(&features)
                .and_then(|out| wants_jump(&out))
                .map_err(|source| SimError::Controller { agent, source })?;
            if jump {
                bird.jump(cfg);
            }
        }

        // Retirements are marked here and compacted once the tick's checks are done.
        let mut retired = vec![false; self.birds.len()];
        let mut offscreen = Vec::with_capacity(self.pipes.len() + 1);
        let mut add_pipe = false;
        for pipe in self.pipes.iter_mut() {
            for (i, bird) in self.birds.iter().enumerate() {
                if retired[i] {
                    continue;
                }
                if pipe.collides_with(bird, sprites) {
                    self.fitness[bird.slot] -= cfg.collision_penalty;
                    retired[i] = true;
                    log::debug!("Bird {} hit a pipe at tick {}", bird.slot, self.ticks);
                }
                if !pipe.passed && pipe.x < bird.x {
                    pipe.passed = true;
                    add_pipe = true;
                }
            }
            offscreen.push(pipe.is_offscreen(sprites));
            pipe.advance(cfg);
        }

        if add_pipe {
            self.score += 1;
            for (i, bird) in self.birds.iter().enumerate() {
                if !retired[i] {
                    self.fitness[bird.slot] += cfg.pass_bonus;
                }
            }
            self.pipes.push(Pipe::spawn(cfg.pipe_spawn_x, &mut self.rng, cfg, sprites)?);
            offscreen.push(false);
            log::debug!("Generation {}: score {} at tick {}", self.generation, self.score, self.ticks);
        }

        let mut drop_pipe = offscreen.into_iter();
        self.pipes.retain(|_| !drop_pipe.next().unwrap_or(false));

        for (i, bird) in self.birds.iter().enumerate() {
            if !retired[i] && bird.out_of_bounds(sprites, cfg) {
                retired[i] = true;
                log::debug!("Bird {} left the screen at tick {}", bird.slot, self.ticks);
            }
        }
        let mut drop_bird = retired.into_iter();
        self.birds.retain(|_| !drop_bird.next().unwrap_or(false));

        self.ground.advance(cfg);
        self.ticks += 1;
        debug_assert!(!self.pipes.is_empty());

        sink.draw(&self.scene());
        Ok(RunState::Running)
    }

    /// Steps at the limiter's rate until the generation ends or `quit` is raised.
    /// `quit` is only observed between ticks.
    pub fn run(
        mut self,
        limiter: &mut TickLimiter,
        sink: &mut dyn RenderSink,
        quit: &AtomicBool,
    ) -> Result<Outcome, SimError> {
        loop {
            if quit.load(Ordering::Relaxed) {
                log::info!("Quit requested during generation {}", self.generation);
                return Ok(Outcome::Quit);
            }
            limiter.wait();
            if self.step(sink)? == RunState::Terminated {
                return Ok(Outcome::Finished(self.finish()));
            }
        }
    }

    pub fn finish(self) -> GenerationReport {
        GenerationReport { generation: self.generation, score: self.score, ticks: self.ticks, fitness: self.fitness }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, ControllerError};

    struct Fixed(f32);

    impl Controller for Fixed {
        fn input_len(&self) -> usize {
            SENSOR_LEN
        }

        fn decide(&mut self, _features: &[f32]) -> Result<Vec<f32>, ControllerError> {
            Ok(vec![self.0])
        }
    }

    struct WrongArity;

    impl Controller for WrongArity {
        fn input_len(&self) -> usize {
            4
        }

        fn decide(&mut self, _features: &[f32]) -> Result<Vec<f32>, ControllerError> {
            Ok(vec![0.0])
        }
    }

    struct Silent;

    impl Controller for Silent {
        fn input_len(&self) -> usize {
            SENSOR_LEN
        }

        fn decide(&mut self, _features: &[f32]) -> Result<Vec<f32>, ControllerError> {
            Ok(Vec::new())
        }
    }

    fn seeded() -> GameConfig {
        GameConfig { seed: Some(11), ..GameConfig::default() }
    }

    #[test]
    fn test_initial_state() {
        let sprites = Rc::new(Sprites::procedural());
        let runner = GenerationRunner::new(1, vec![Fixed(0.0), Fixed(0.0)], &seeded(), sprites).unwrap();
        assert_eq!(runner.state(), RunState::Running);
        assert_eq!(runner.alive(), 2);
        assert_eq!(runner.pipes().len(), 1);
        assert_eq!(runner.pipes()[0].x, 600.0);
        assert_eq!(runner.score(), 0);
    }

    #[test]
    fn test_arity_mismatch_fails_at_start() {
        let sprites = Rc::new(Sprites::procedural());
        let err = GenerationRunner::new(1, vec![WrongArity], &seeded(), sprites).err();
        assert!(matches!(err, Some(SimError::FeatureMismatch { agent: 0, expected: 3, got: 4 })));
    }

    #[test]
    fn test_empty_height_range_fails_at_start() {
        let sprites = Rc::new(Sprites::procedural());
        let config = GameConfig { pipe_height_min: 300, pipe_height_max: 300, ..seeded() };
        let err = GenerationRunner::new(1, vec![Fixed(0.0)], &config, sprites).err();
        assert!(matches!(err, Some(SimError::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn test_empty_controller_output_is_fatal() {
        let sprites = Rc::new(Sprites::procedural());
        let mut runner = GenerationRunner::new(1, vec![Silent], &seeded(), sprites).unwrap();
        let err = runner.step(&mut NullSink).err();
        assert!(matches!(err, Some(SimError::Controller { agent: 0, source: ControllerError::EmptyOutput })));
    }

    #[test]
    fn test_always_jumping_flies_off_the_top() {
        let sprites = Rc::new(Sprites::procedural());
        let mut runner = GenerationRunner::new(1, vec![Fixed(1.0)], &seeded(), sprites).unwrap();
        let mut ticks = 0;
        while runner.step(&mut NullSink).unwrap() == RunState::Running {
            ticks += 1;
            assert!(ticks < 100);
        }
        // no collision penalty for leaving the screen
        let report = runner.finish();
        assert_eq!(report.score, 0);
        assert!((report.fitness[0] - 0.1 * report.ticks as f64).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_pipe_field() {
        let sprites = Rc::new(Sprites::procedural());
        let a = GenerationRunner::new(3, vec![Fixed(0.0)], &seeded(), sprites.clone()).unwrap();
        let b = GenerationRunner::new(3, vec![Fixed(0.0)], &seeded(), sprites).unwrap();
        assert_eq!(a.pipes()[0].height, b.pipes()[0].height);
    }

    #[test]
    fn test_run_honours_quit_flag() {
        let sprites = Rc::new(Sprites::procedural());
        let runner = GenerationRunner::new(1, vec![Fixed(0.0)], &seeded(), sprites).unwrap();
        let quit = AtomicBool::new(true);
        let outcome = runner.run(&mut TickLimiter::unthrottled(), &mut NullSink, &quit).unwrap();
        assert!(matches!(outcome, Outcome::Quit));
    }

    #[test]
    fn test_limiter_enforces_period() {
        let mut limiter = TickLimiter::new(200);
        let start = Instant::now();
        for _ in 0..4 {
            limiter.wait();
        }
        // first wait returns immediately, the next three each take a 5ms period
        assert!(start.elapsed() >= Duration::from_millis(15));
        assert!(limiter.last.is_some());
        assert!(TickLimiter::unthrottled().ready());
    }

    #[test]
    #[should_panic(expected = "tick rate must be non-zero")]
    fn test_zero_tick_rate_is_rejected() {
        TickLimiter::new(0);
    }
}
