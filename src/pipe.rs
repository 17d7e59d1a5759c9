use crate::bird::Bird;
use crate::config::GameConfig;
use crate::error::SimError;
use crate::sprites::Sprites;
use rand::Rng;

/// A top/bottom barrier pair with a fixed vertical gap.
#[derive(Debug, Clone)]
pub struct Pipe {
    pub x: f32,
    /// Y of the gap's top edge.
    pub height: f32,
    /// Y where the top barrier image starts (its bottom edge sits at `height`).
    pub top: f32,
    /// Y of the gap's bottom edge, where the bottom barrier starts.
    pub bottom: f32,
    pub passed: bool,
}

impl Pipe {
    /// Draws the gap height uniformly from the configured range.
    pub fn spawn<R: Rng>(x: f32, rng: &mut R, config: &GameConfig, sprites: &Sprites) -> Result<Self, SimError> {
        let height = rng.gen_range(config.pipe_height_min..config.pipe_height_max) as f32;
        Self::with_height(x, height, config, sprites)
    }

    pub fn with_height(x: f32, height: f32, config: &GameConfig, sprites: &Sprites) -> Result<Self, SimError> {
        let top = height - sprites.pipe_height() as f32;
        let bottom = height + config.pipe_gap;
        if top >= bottom || height >= bottom {
            return Err(SimError::InvalidGap { top: height, bottom });
        }
        Ok(Self { x, height, top, bottom, passed: false })
    }

    pub fn advance(&mut self, config: &GameConfig) {
        self.x -= config.scroll_velocity;
    }

    /// Pixel-mask overlap against either barrier at the current offsets.
    pub fn collides_with(&self, bird: &Bird, sprites: &Sprites) -> bool {
        let bird_mask = bird.mask(sprites);
        let dx = (self.x - bird.x).round() as i32;
        let by = bird.y.round() as i32;
        let top_offset = (dx, self.top.round() as i32 - by);
        let bottom_offset = (dx, self.bottom.round() as i32 - by);
        bird_mask.overlaps(&sprites.pipe_bottom_mask, bottom_offset)
            || bird_mask.overlaps(&sprites.pipe_top_mask, top_offset)
    }

    pub fn right_edge(&self, sprites: &Sprites) -> f32 {
        self.x + sprites.pipe_width() as f32
    }

    pub fn is_offscreen(&self, sprites: &Sprites) -> bool {
        self.right_edge(sprites) < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_spawn_height_in_range() {
        let config = GameConfig::default();
        let sprites = Sprites::procedural();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let pipe = Pipe::spawn(600.0, &mut rng, &config, &sprites).unwrap();
            assert!(pipe.height >= 50.0 && pipe.height < 450.0);
            assert_eq!(pipe.bottom - pipe.height, 200.0);
            assert_eq!(pipe.height - pipe.top, 640.0);
            assert!(!pipe.passed);
        }
    }

    #[test]
    fn test_inverted_gap_is_fatal() {
        let mut config = GameConfig::default();
        config.pipe_gap = -10.0;
        let sprites = Sprites::procedural();
        assert!(matches!(
            Pipe::with_height(600.0, 300.0, &config, &sprites),
            Err(SimError::InvalidGap { .. })
        ));
    }

    #[test]
    fn test_scrolls_and_leaves_screen() {
        let config = GameConfig::default();
        let sprites = Sprites::procedural();
        let mut pipe = Pipe::with_height(0.0, 300.0, &config, &sprites).unwrap();
        pipe.advance(&config);
        assert_eq!(pipe.x, -5.0);
        assert!(!pipe.is_offscreen(&sprites));
        pipe.x = -104.0;
        assert!(!pipe.is_offscreen(&sprites));
        pipe.x = -105.0;
        assert!(pipe.is_offscreen(&sprites));
    }

    #[test]
    fn test_collision_with_barriers() {
        let config = GameConfig::default();
        let sprites = Sprites::procedural();
        let pipe = Pipe::with_height(230.0, 300.0, &config, &sprites).unwrap();

        // inside the gap
        let bird = Bird::new(0, 230.0, 370.0);
        assert!(!pipe.collides_with(&bird, &sprites));
        // overlapping the top barrier
        let bird = Bird::new(0, 230.0, 280.0);
        assert!(pipe.collides_with(&bird, &sprites));
        // overlapping the bottom barrier
        let bird = Bird::new(0, 230.0, 480.0);
        assert!(pipe.collides_with(&bird, &sprites));
        // same height but far to the right of the pipe
        let far = Pipe::with_height(600.0, 300.0, &config, &sprites).unwrap();
        assert!(!far.collides_with(&bird, &sprites));
    }
}
