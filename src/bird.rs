use crate::config::GameConfig;
use crate::mask::Mask;
use crate::sprites::Sprites;

/// Wing-flap frame sequence, each held for `animation_ticks` ticks.
const FLAP_CYCLE: [usize; 4] = [0, 1, 2, 1];
/// Tilt at or below which the bird is diving and stops flapping.
const DIVE_TILT: f32 = -80.0;

#[derive(Debug, Clone)]
pub struct Bird {
    /// Slot in the generation's fitness ledger.
    pub slot: usize,
    pub x: f32,
    pub y: f32,
    pub velocity: f32,
    /// Ticks since the last jump; drives the displacement formula.
    pub tick_count: u32,
    /// Height at the last jump, used for the tilt rule.
    pub height: f32,
    /// Visual only.
    pub tilt: f32,
    pub anim_ticks: u32,
    pub frame: usize,
}

impl Bird {
    pub fn new(slot: usize, x: f32, y: f32) -> Self {
        Self { slot, x, y, velocity: 0.0, tick_count: 0, height: y, tilt: 0.0, anim_ticks: 0, frame: 0 }
    }

    pub fn jump(&mut self, config: &GameConfig) {
        self.velocity = config.jump_velocity;
        self.tick_count = 0;
        self.height = self.y;
    }

    /// Vertical displacement for `ticks` ticks after a jump with `velocity`.
    pub fn displacement(velocity: f32, ticks: u32, config: &GameConfig) -> f32 {
        let t = ticks as f32;
        let mut d = velocity * t + config.gravity * t * t;
        if d >= config.max_fall {
            d = config.max_fall;
        }
        if d < 0.0 {
            d -= config.lift_bias;
        }
        d
    }

    /// Integrates one tick of motion and returns the displacement applied.
    pub fn advance(&mut self, config: &GameConfig) -> f32 {
        self.tick_count += 1;
        let d = Self::displacement(self.velocity, self.tick_count, config);
        self.y += d;

        if d < 0.0 || self.y < self.height + 50.0 {
            if self.tilt < config.max_tilt {
                self.tilt = config.max_tilt;
            }
        } else if self.tilt > config.min_tilt {
            self.tilt -= config.tilt_velocity;
        }

        self.animate(config);
        d
    }

    /// Steps the wing-flap animation. Runs inside the tick so the collision
    /// mask always matches the frame of the current position.
    fn animate(&mut self, config: &GameConfig) {
        let per_frame = config.animation_ticks.max(1);
        if self.tilt <= DIVE_TILT {
            self.frame = 1;
            self.anim_ticks = per_frame * 2;
            return;
        }
        self.anim_ticks = (self.anim_ticks + 1) % (per_frame * FLAP_CYCLE.len() as u32);
        self.frame = FLAP_CYCLE[(self.anim_ticks / per_frame) as usize];
    }

    pub fn mask<'a>(&self, sprites: &'a Sprites) -> &'a Mask {
        &sprites.bird_masks[self.frame]
    }

    pub fn bottom(&self, sprites: &Sprites) -> f32 {
        self.y + sprites.bird_height() as f32
    }

    /// True once the lower edge reaches the ground or the upper edge leaves the screen.
    pub fn out_of_bounds(&self, sprites: &Sprites, config: &GameConfig) -> bool {
        self.bottom(sprites) >= config.ground_y || self.y < 0.0
    }
}
