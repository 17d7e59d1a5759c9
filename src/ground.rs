use crate::config::GameConfig;

/// Two tiles of the ground image scrolling in lockstep with the pipes.
#[derive(Debug, Clone)]
pub struct Ground {
    pub y: f32,
    pub x1: f32,
    pub x2: f32,
    width: f32,
}

impl Ground {
    pub fn new(y: f32, width: u32) -> Self {
        let width = width as f32;
        Self { y, x1: 0.0, x2: width, width }
    }

    pub fn advance(&mut self, config: &GameConfig) {
        self.x1 -= config.scroll_velocity;
        self.x2 -= config.scroll_velocity;

        if self.x1 + self.width < 0.0 {
            self.x1 = self.x2 + self.width;
        }
        if self.x2 + self.width < 0.0 {
            self.x2 = self.x1 + self.width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_wrap_and_stay_adjacent() {
        let config = GameConfig::default();
        let mut ground = Ground::new(730.0, 672);
        for _ in 0..2000 {
            ground.advance(&config);
            assert_eq!((ground.x1 - ground.x2).abs(), 672.0);
            assert!(ground.x1.min(ground.x2) >= -672.0);
        }
    }
}
