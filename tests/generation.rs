use flappy_neat::bird::Bird;
use flappy_neat::config::GameConfig;
use flappy_neat::controller::Controller;
use flappy_neat::error::ControllerError;
use flappy_neat::runner::{GenerationRunner, NullSink, RenderSink, RunState, Scene};
use flappy_neat::sprites::Sprites;
use std::rc::Rc;

/// Jumps whenever the bird's y (first feature) drops past the threshold.
struct Threshold(f32);

impl Controller for Threshold {
    fn input_len(&self) -> usize {
        3
    }

    fn decide(&mut self, features: &[f32]) -> Result<Vec<f32>, ControllerError> {
        Ok(vec![if features[0] > self.0 { 1.0 } else { 0.0 }])
    }
}

fn never() -> Threshold {
    Threshold(f32::INFINITY)
}

fn hover() -> Threshold {
    Threshold(400.0)
}

fn config_with_gap(height: i32, gap: f32) -> GameConfig {
    GameConfig {
        seed: Some(1),
        pipe_height_min: height,
        pipe_height_max: height + 1,
        pipe_gap: gap,
        ..GameConfig::default()
    }
}

#[derive(Default)]
struct Recorder {
    frames: usize,
    alive: Vec<usize>,
}

impl RenderSink for Recorder {
    fn draw(&mut self, scene: &Scene<'_>) {
        self.frames += 1;
        self.alive.push(scene.birds.len());
    }
}

#[test]
fn falling_bird_hits_the_ground_on_schedule() {
    let config = config_with_gap(300, 200.0);
    let sprites = Rc::new(Sprites::procedural());
    let mut runner = GenerationRunner::new(1, vec![never()], &config, sprites.clone()).unwrap();
    assert_eq!(runner.pipes()[0].height, 300.0);
    assert_eq!(runner.pipes()[0].bottom, 500.0);

    // ticks until y + bird height reaches the ground, straight from the displacement formula
    let mut y = config.start_y;
    let mut expected = 0;
    while y + (sprites.bird_height() as f32) < config.ground_y {
        expected += 1;
        y += Bird::displacement(0.0, expected, &config);
    }
    assert_eq!(expected, 23);

    let mut recorder = Recorder::default();
    for _ in 0..expected {
        assert_eq!(runner.step(&mut recorder).unwrap(), RunState::Running);
    }
    assert_eq!(runner.alive(), 0);
    assert_eq!(recorder.frames, 23);
    assert_eq!(runner.step(&mut recorder).unwrap(), RunState::Terminated);
    assert_eq!(runner.state(), RunState::Terminated);
    // terminated runners stay put
    assert_eq!(runner.step(&mut recorder).unwrap(), RunState::Terminated);
    assert_eq!(recorder.frames, 23);

    let report = runner.finish();
    assert_eq!(report.score, 0);
    assert_eq!(report.ticks, 23);
    assert!((report.fitness[0] - 2.3).abs() < 1e-9);
}

#[test]
fn population_that_never_jumps_terminates() {
    let config = GameConfig { seed: Some(9), ..GameConfig::default() };
    let controllers = (0..10).map(|_| never()).collect();
    let mut runner = GenerationRunner::new(4, controllers, &config, Rc::new(Sprites::procedural())).unwrap();
    assert_eq!(runner.alive(), 10);

    let mut steps = 0;
    while runner.step(&mut NullSink).unwrap() == RunState::Running {
        steps += 1;
        assert!(steps <= 23);
    }
    assert_eq!(runner.generation(), 4);
    assert_eq!(runner.finish().fitness.len(), 10);
}

#[test]
fn alive_count_never_increases() {
    let config = GameConfig { seed: Some(5), max_ticks: Some(2_000), ..GameConfig::default() };
    let controllers: Vec<Threshold> = [300.0, 350.0, 400.0, 450.0, 500.0, f32::INFINITY, 0.0, 380.0]
        .into_iter()
        .map(Threshold)
        .collect();
    let mut runner = GenerationRunner::new(1, controllers, &config, Rc::new(Sprites::procedural())).unwrap();
    let mut recorder = Recorder::default();
    while runner.step(&mut recorder).unwrap() == RunState::Running {
        assert!(!runner.pipes().is_empty());
    }
    assert!(recorder.alive.windows(2).all(|w| w[1] <= w[0]));
    assert!(recorder.alive.first().is_some_and(|&n| n <= 8));
}

#[test]
fn collision_costs_fitness_and_retires_the_bird() {
    // bottom barrier starts at y=300, right where the bird sits
    let config = GameConfig { pipe_spawn_x: 230.0, ..config_with_gap(100, 200.0) };
    let mut runner = GenerationRunner::new(1, vec![never()], &config, Rc::new(Sprites::procedural())).unwrap();
    runner.step(&mut NullSink).unwrap();
    assert_eq!(runner.alive(), 0);
    assert!((runner.fitness()[0] - (0.1 - 1.0)).abs() < 1e-9);
}

#[test]
fn passing_a_pipe_scores_and_rewards_survivors() {
    let config = config_with_gap(250, 300.0);
    let controllers = vec![hover(), never(), hover()];
    let mut runner = GenerationRunner::new(1, controllers, &config, Rc::new(Sprites::procedural())).unwrap();

    let mut spawned = 0;
    let mut ticks = 0;
    while runner.score() < 3 {
        ticks += 1;
        assert!(ticks < 1_000, "hovering birds should keep scoring");

        let before = runner.fitness().to_vec();
        let score = runner.score();
        assert_eq!(runner.step(&mut NullSink).unwrap(), RunState::Running);

        let pipes = runner.pipes();
        assert!(!pipes.is_empty() && pipes.len() <= 2);
        spawned += pipes.iter().filter(|p| p.x == config.pipe_spawn_x).count();

        if runner.score() > score {
            assert_eq!(runner.score(), score + 1);
            for slot in [0, 2] {
                assert!((runner.fitness()[slot] - before[slot] - 5.1).abs() < 1e-9);
            }
            // the bird that dropped out long ago gets nothing
            assert_eq!(runner.fitness()[1], before[1]);
        }
    }
    assert_eq!(runner.alive(), 2);
    assert_eq!(spawned, 3);
    assert_eq!(ticks, 228);
}
