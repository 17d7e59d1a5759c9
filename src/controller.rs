//! Decision capability consulted once per agent per tick.

use crate::error::ControllerError;

/// Maps a sensed feature vector to action signals. Only the first output is
/// consumed: a value above [`JUMP_THRESHOLD`] means "jump".
pub trait Controller {
    /// Number of features `decide` expects.
    fn input_len(&self) -> usize;

    fn decide(&mut self, features: &[f32]) -> Result<Vec<f32>, ControllerError>;
}

pub const JUMP_THRESHOLD: f32 = 0.5;

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn input_len(&self) -> usize {
        (**self).input_len()
    }

    fn decide(&mut self, features: &[f32]) -> Result<Vec<f32>, ControllerError> {
        (**self).decide(features)
    }
}

/// Interprets a controller's output as a jump command.
pub fn wants_jump(output: &[f32]) -> Result<bool, ControllerError> {
    output.first().map(|&v| v > JUMP_THRESHOLD).ok_or(ControllerError::EmptyOutput)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(!wants_jump(&[0.5]).unwrap());
        assert!(wants_jump(&[0.51, -3.0]).unwrap());
        assert!(!wants_jump(&[-1.0, 9.0]).unwrap());
    }

    #[test]
    fn test_empty_output_is_an_error() {
        assert!(matches!(wants_jump(&[]), Err(ControllerError::EmptyOutput)));
    }
}
