use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a [`crate::controller::Controller`] while deciding.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("controller expects {expected} inputs, got {got}")]
    InputArity { expected: usize, got: usize },
    #[error("controller produced no output values")]
    EmptyOutput,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Fatal errors of the generation runner. None of these are recoverable mid-generation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("game configuration rejected: {0}")]
    Config(#[from] ConfigError),
    #[error("agent {agent}: controller takes {got} features but the sensor produces {expected}")]
    FeatureMismatch {
        agent: usize,
        expected: usize,
        got: usize,
    },
    #[error("controller for agent {agent} failed: {source}")]
    Controller {
        agent: usize,
        #[source]
        source: ControllerError,
    },
    #[error("obstacle gap is inverted: top edge {top} is not above bottom edge {bottom}")]
    InvalidGap { top: f32, bottom: f32 },
    #[error("failed to load sprite {path:?}: {source}")]
    Sprite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
