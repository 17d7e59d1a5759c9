//! Flappy bird played by a population of neural-network controllers.
//!
//! [`runner::GenerationRunner`] plays one generation against a seeded pipe
//! field; [`trainer::Trainer`] runs generations back to back and evolves the
//! controllers between them.

pub mod bird;
pub mod config;
pub mod controller;
pub mod error;
pub mod evolve;
pub mod ground;
pub mod mask;
pub mod pipe;
pub mod render;
pub mod runner;
pub mod sensor;
pub mod sprites;
pub mod trainer;
