use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// World geometry, physics and fitness rules for one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub window_width: u32,
    pub window_height: u32,
    /// Y of the ground surface; agents whose lower edge reaches it are retired.
    pub ground_y: f32,
    pub start_x: f32,
    pub start_y: f32,

    pub jump_velocity: f32,
    pub gravity: f32,
    pub max_fall: f32,
    pub lift_bias: f32,

    pub max_tilt: f32,
    pub tilt_velocity: f32,
    pub min_tilt: f32,
    pub animation_ticks: u32,

    pub pipe_gap: f32,
    pub scroll_velocity: f32,
    pub pipe_height_min: i32,
    pub pipe_height_max: i32,
    pub pipe_spawn_x: f32,

    pub survival_reward: f64,
    pub collision_penalty: f64,
    pub pass_bonus: f64,

    pub tick_rate: u32,
    /// Ends a generation after this many ticks even if birds are still flying.
    pub max_ticks: Option<u64>,
    /// Seed for the obstacle field. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_width: 500,
            window_height: 800,
            ground_y: 730.0,
            start_x: 230.0,
            start_y: 350.0,
            jump_velocity: -10.5,
            gravity: 1.5,
            max_fall: 16.0,
            lift_bias: 2.0,
            max_tilt: 25.0,
            tilt_velocity: 20.0,
            min_tilt: -90.0,
            animation_ticks: 5,
            pipe_gap: 200.0,
            scroll_velocity: 5.0,
            pipe_height_min: 50,
            pipe_height_max: 450,
            pipe_spawn_x: 600.0,
            survival_reward: 0.1,
            collision_penalty: 1.0,
            pass_bonus: 5.0,
            tick_rate: 60,
            max_ticks: None,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Rejects geometry no generation can be played with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipe_height_min >= self.pipe_height_max {
            return Err(ConfigError::Invalid(format!(
                "pipe height range [{}, {}) is empty",
                self.pipe_height_min, self.pipe_height_max
            )));
        }
        if self.pipe_gap <= 0.0 {
            return Err(ConfigError::Invalid(format!("pipe gap must be positive, got {}", self.pipe_gap)));
        }
        if self.pipe_height_max as f32 + self.pipe_gap > self.ground_y {
            return Err(ConfigError::Invalid(format!(
                "lowest gap edge {} sits below the ground at {}",
                self.pipe_height_max as f32 + self.pipe_gap,
                self.ground_y
            )));
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick rate must be non-zero".into()));
        }
        Ok(())
    }
}

/// Parameters of the reference evolutionary loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generations: usize,
    pub fitness_threshold: f64,
    pub hidden_neurons: usize,
    pub weight_init_range: f32,
    pub weight_mutate_rate: f64,
    pub weight_mutate_power: f32,
    pub weight_replace_rate: f64,
    pub weight_clamp: f32,
    pub elitism: usize,
    pub survival_threshold: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 50,
            fitness_threshold: 100.0,
            hidden_neurons: 0,
            weight_init_range: 1.0,
            weight_mutate_rate: 0.8,
            weight_mutate_power: 0.5,
            weight_replace_rate: 0.1,
            weight_clamp: 30.0,
            elitism: 2,
            survival_threshold: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub evolution: EvolutionConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate()?;
        let e = &self.evolution;
        if e.population_size == 0 {
            return Err(ConfigError::Invalid("population size must be non-zero".into()));
        }
        if e.elitism > e.population_size {
            return Err(ConfigError::Invalid(format!(
                "elitism {} exceeds population size {}",
                e.elitism, e.population_size
            )));
        }
        for (name, rate) in [
            ("survival threshold", e.survival_threshold),
            ("weight mutate rate", e.weight_mutate_rate),
            ("weight replace rate", e.weight_replace_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Invalid(format!("{name} {rate} outside [0, 1]")));
            }
        }
        if e.weight_init_range < 0.0 || e.weight_mutate_power < 0.0 || e.weight_clamp <= 0.0 {
            return Err(ConfigError::Invalid("weight ranges must be non-negative".into()));
        }
        Ok(())
    }
}
