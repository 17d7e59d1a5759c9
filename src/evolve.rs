//! Reference evolutionary loop: fixed-topology feed-forward genomes evolved by
//! elitism plus weight mutation. Population genetics beyond that (speciation,
//! crossover, structural mutation) are not modelled.

use crate::config::EvolutionConfig;
use crate::controller::Controller;
use crate::error::ControllerError;
use crate::sensor::SENSOR_LEN;
use rand::Rng;
use serde::{Deserialize, Serialize};

const OUTPUTS: usize = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    pub id: u64,
    pub inputs: usize,
    pub hidden: usize,
    /// Row-major per neuron: incoming weights followed by a bias.
    pub weights: Vec<f32>,
    pub fitness: f64,
}

impl Genome {
    pub fn weight_count(inputs: usize, hidden: usize) -> usize {
        if hidden == 0 {
            OUTPUTS * (inputs + 1)
        } else {
            hidden * (inputs + 1) + OUTPUTS * (hidden + 1)
        }
    }

    pub fn random<R: Rng>(id: u64, inputs: usize, hidden: usize, range: f32, rng: &mut R) -> Self {
        let weights = (0..Self::weight_count(inputs, hidden)).map(|_| rng.gen_range(-range..=range)).collect();
        Self { id, inputs, hidden, weights, fitness: 0.0 }
    }

    pub fn mutate<R: Rng>(&mut self, rng: &mut R, config: &EvolutionConfig) {
        let range = config.weight_init_range;
        for w in self.weights.iter_mut() {
            if rng.gen_bool(config.weight_replace_rate) {
                *w = rng.gen_range(-range..=range);
            } else if rng.gen_bool(config.weight_mutate_rate) {
                *w += rng.gen_range(-config.weight_mutate_power..=config.weight_mutate_power);
            }
            *w = w.clamp(-config.weight_clamp, config.weight_clamp);
        }
    }
}

/// tanh network built from a [`Genome`].
#[derive(Debug, Clone)]
pub struct FeedForwardNet {
    inputs: usize,
    hidden: usize,
    weights: Vec<f32>,
}

fn neuron(weights: &[f32], input: &[f32]) -> f32 {
    let (w, bias) = weights.split_at(input.len());
    let sum: f32 = w.iter().zip(input).map(|(w, x)| w * x).sum();
    (sum + bias[0]).tanh()
}

impl FeedForwardNet {
    pub fn from_genome(genome: &Genome) -> Self {
        Self { inputs: genome.inputs, hidden: genome.hidden, weights: genome.weights.clone() }
    }

    pub fn activate(&self, input: &[f32]) -> Vec<f32> {
        if self.hidden == 0 {
            return self.weights.chunks_exact(self.inputs + 1).map(|w| neuron(w, input)).collect();
        }
        let split = self.hidden * (self.inputs + 1);
        let (first, second) = self.weights.split_at(split);
        let hidden: Vec<f32> = first.chunks_exact(self.inputs + 1).map(|w| neuron(w, input)).collect();
        second.chunks_exact(self.hidden + 1).map(|w| neuron(w, &hidden)).collect()
    }
}

impl Controller for FeedForwardNet {
    fn input_len(&self) -> usize {
        self.inputs
    }

    fn decide(&mut self, features: &[f32]) -> Result<Vec<f32>, ControllerError> {
        if features.len() != self.inputs {
            return Err(ControllerError::InputArity { expected: self.inputs, got: features.len() });
        }
        Ok(self.activate(features))
    }
}

/// Per-generation summary kept for the reporter and the on-screen chart.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub best_fitness: Vec<f64>,
    pub scores: Vec<u32>,
}

impl Statistics {
    pub fn record(&mut self, genomes: &[Genome], score: u32) {
        let n = genomes.len().max(1) as f64;
        let mean = genomes.iter().map(|g| g.fitness).sum::<f64>() / n;
        let var = genomes.iter().map(|g| (g.fitness - mean).powi(2)).sum::<f64>() / n;
        let best = genomes.iter().map(|g| g.fitness).fold(f64::NEG_INFINITY, f64::max);
        log::info!("Population's average fitness: {:.5} stdev: {:.5}", mean, var.sqrt());
        log::info!("Best fitness: {:.5} - score {}", best, score);
        self.best_fitness.push(best);
        self.scores.push(score);
    }

    pub fn best_score(&self) -> u32 {
        self.scores.iter().copied().max().unwrap_or(0)
    }
}

pub struct Population {
    pub genomes: Vec<Genome>,
    pub generation: usize,
    next_id: u64,
    config: EvolutionConfig,
}

impl Population {
    pub fn new<R: Rng>(config: &EvolutionConfig, rng: &mut R) -> Self {
        let genomes = (0..config.population_size as u64)
            .map(|id| Genome::random(id, SENSOR_LEN, config.hidden_neurons, config.weight_init_range, rng))
            .collect();
        Self { genomes, generation: 0, next_id: config.population_size as u64, config: config.clone() }
    }

    /// Builds one network per genome and zeroes fitness for the coming generation.
    pub fn controllers(&mut self) -> Vec<FeedForwardNet> {
        self.genomes
            .iter_mut()
            .map(|g| {
                g.fitness = 0.0;
                FeedForwardNet::from_genome(g)
            })
            .collect()
    }

    /// Writes a finished generation's fitness ledger back onto the genomes.
    pub fn evaluate(&mut self, fitness: &[f64]) {
        for (genome, f) in self.genomes.iter_mut().zip(fitness) {
            genome.fitness = *f;
        }
    }

    pub fn best(&self) -> Option<&Genome> {
        self.genomes.iter().max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    pub fn solved(&self) -> bool {
        self.best().is_some_and(|g| g.fitness >= self.config.fitness_threshold)
    }

    /// Keeps the elite unchanged and fills the rest with mutated copies of the
    /// top `survival_threshold` fraction.
    pub fn reproduce<R: Rng>(&mut self, rng: &mut R) {
        let size = self.config.population_size;
        let mut ranked = std::mem::take(&mut self.genomes);
        ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let parents = ((size as f64 * self.config.survival_threshold).ceil() as usize).clamp(1, ranked.len().max(1));
        let mut next: Vec<Genome> = ranked.iter().take(self.config.elitism).cloned().collect();
        while next.len() < size && !ranked.is_empty() {
            let parent = &ranked[rng.gen_range(0..parents.min(ranked.len()))];
            let mut child = parent.clone();
            child.id = self.next_id;
            self.next_id += 1;
            child.mutate(rng, &self.config);
            next.push(child);
        }
        for g in next.iter_mut() {
            g.fitness = 0.0;
        }
        self.genomes = next;
        self.generation += 1;
    }
}
