//! Sprite images and their collision masks.
//!
//! Sprites are loaded from an `imgs/` style directory when present (scaled 2x,
//! like the classic asset pack) and otherwise drawn procedurally at the same
//! dimensions, so geometry and collision behave identically either way.

use crate::error::SimError;
use crate::mask::Mask;
use image::imageops::{self, FilterType};
use std::path::Path;

pub const BIRD_SIZE: (u32, u32) = (68, 48);
pub const PIPE_SIZE: (u32, u32) = (104, 640);
pub const BASE_SIZE: (u32, u32) = (672, 224);
pub const BACKGROUND_SIZE: (u32, u32) = (500, 800);

const PIPE_CAP_HEIGHT: u32 = 48;

#[derive(Clone, Copy)]
struct Rgb(u8, u8, u8);

const SKY_TOP: Rgb = Rgb(70, 180, 200);
const SKY_BOT: Rgb = Rgb(190, 232, 245);
const GRASS: Rgb = Rgb(84, 168, 55);
const DIRT: Rgb = Rgb(210, 185, 110);
const DIRT_DARK: Rgb = Rgb(185, 160, 90);
const PIPE_M: Rgb = Rgb(100, 170, 40);
const PIPE_HI: Rgb = Rgb(145, 215, 62);
const CAP_DARK: Rgb = Rgb(60, 100, 20);
const BIRD_Y: Rgb = Rgb(245, 200, 66);
const BIRD_WING: Rgb = Rgb(215, 165, 35);
const BIRD_EYE: Rgb = Rgb(255, 255, 255);
const BIRD_PUPIL: Rgb = Rgb(20, 20, 20);
const BIRD_BEAK: Rgb = Rgb(225, 75, 35);

/// A tightly packed RGBA8 image.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Sprite {
    pub fn blank(width: u32, height: u32) -> Self {
        Self { width, height, rgba: vec![0; (width * height * 4) as usize] }
    }

    /// Loads a PNG and scales it 2x with nearest-neighbour sampling.
    pub fn load_png_2x(path: &Path) -> Result<Self, SimError> {
        let img = image::open(path)
            .map_err(|source| SimError::Sprite { path: path.to_path_buf(), source })?
            .to_rgba8();
        let scaled = imageops::resize(&img, img.width() * 2, img.height() * 2, FilterType::Nearest);
        Ok(Self { width: scaled.width(), height: scaled.height(), rgba: scaled.into_raw() })
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }

    fn put(&mut self, x: i32, y: i32, c: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = ((y as u32 * self.width + x as u32) * 4) as usize;
        self.rgba[i..i + 4].copy_from_slice(&[c.0, c.1, c.2, 255]);
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for py in y..y + h {
            for px in x..x + w {
                self.put(px, py, c);
            }
        }
    }

    fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, c: Rgb) {
        let x0 = (cx - rx).floor() as i32;
        let x1 = (cx + rx).ceil() as i32;
        let y0 = (cy - ry).floor() as i32;
        let y1 = (cy + ry).ceil() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let nx = (x as f32 + 0.5 - cx) / rx;
                let ny = (y as f32 + 0.5 - cy) / ry;
                if nx * nx + ny * ny <= 1.0 {
                    self.put(x, y, c);
                }
            }
        }
    }

    pub fn flipped_vertical(&self) -> Self {
        let row = (self.width * 4) as usize;
        let mut rgba = Vec::with_capacity(self.rgba.len());
        for chunk in self.rgba.chunks_exact(row).rev() {
            rgba.extend_from_slice(chunk);
        }
        Self { width: self.width, height: self.height, rgba }
    }

    pub fn mask(&self) -> Mask {
        Mask::from_rgba(self.width, self.height, &self.rgba)
    }
}

/// All images the game draws, plus the masks collision needs.
#[derive(Debug, Clone)]
pub struct Sprites {
    pub bird: [Sprite; 3],
    pub bird_masks: [Mask; 3],
    pub pipe_top: Sprite,
    pub pipe_bottom: Sprite,
    pub pipe_top_mask: Mask,
    pub pipe_bottom_mask: Mask,
    pub base: Sprite,
    pub background: Sprite,
}

impl Sprites {
    fn assemble(bird: [Sprite; 3], pipe: Sprite, base: Sprite, background: Sprite) -> Self {
        let pipe_top = pipe.flipped_vertical();
        let bird_masks = [bird[0].mask(), bird[1].mask(), bird[2].mask()];
        Self {
            bird_masks,
            pipe_top_mask: pipe_top.mask(),
            pipe_bottom_mask: pipe.mask(),
            pipe_top,
            pipe_bottom: pipe,
            bird,
            base,
            background,
        }
    }

    pub fn procedural() -> Self {
        let bird = [bird_frame(-10.0), bird_frame(0.0), bird_frame(10.0)];
        Self::assemble(bird, pipe_sprite(), base_sprite(), background_sprite())
    }

    /// Loads `bird1..3.png`, `pipe.png`, `base.png` and `bg.png` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, SimError> {
        let bird = [
            Sprite::load_png_2x(&dir.join("bird1.png"))?,
            Sprite::load_png_2x(&dir.join("bird2.png"))?,
            Sprite::load_png_2x(&dir.join("bird3.png"))?,
        ];
        let pipe = Sprite::load_png_2x(&dir.join("pipe.png"))?;
        let base = Sprite::load_png_2x(&dir.join("base.png"))?;
        let background = Sprite::load_png_2x(&dir.join("bg.png"))?;
        log::info!("Loaded sprites from {:?}", dir);
        let sprites = Self::assemble(bird, pipe, base, background);
        log::debug!(
            "Solid pixels: bird {:?}, pipe {}",
            sprites.bird_masks.each_ref().map(Mask::count),
            sprites.pipe_bottom_mask.count()
        );
        Ok(sprites)
    }

    pub fn load_or_procedural(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => match Self::load(dir) {
                Ok(sprites) => sprites,
                Err(e) => {
                    log::warn!("{e}; falling back to procedural sprites");
                    Self::procedural()
                }
            },
            None => Self::procedural(),
        }
    }

    pub fn bird_height(&self) -> u32 {
        self.bird[0].height
    }

    pub fn pipe_width(&self) -> u32 {
        self.pipe_top.width
    }

    pub fn pipe_height(&self) -> u32 {
        self.pipe_top.height
    }

    pub fn base_width(&self) -> u32 {
        self.base.width
    }
}

fn bird_frame(wing_offset: f32) -> Sprite {
    let (w, h) = BIRD_SIZE;
    let mut s = Sprite::blank(w, h);
    let (cx, cy) = (w as f32 / 2.0 - 2.0, h as f32 / 2.0);
    s.fill_ellipse(cx, cy, 26.0, 18.0, BIRD_Y);
    // wing pokes past the body outline when raised or lowered
    s.fill_ellipse(cx - 12.0, cy + wing_offset, 12.0, 7.0, BIRD_WING);
    s.fill_ellipse(cx + 12.0, cy - 7.0, 7.0, 7.0, BIRD_EYE);
    s.fill_rect(cx as i32 + 14, cy as i32 - 9, 3, 4, BIRD_PUPIL);
    s.fill_rect(cx as i32 + 18, cy as i32 + 2, 14, 7, BIRD_BEAK);
    s
}

fn pipe_sprite() -> Sprite {
    let (w, h) = PIPE_SIZE;
    let mut s = Sprite::blank(w, h);
    s.fill_rect(4, 0, w as i32 - 8, h as i32, PIPE_M);
    s.fill_rect(12, 0, 8, h as i32, PIPE_HI);
    s.fill_rect(0, 0, w as i32, PIPE_CAP_HEIGHT as i32, CAP_DARK);
    s.fill_rect(3, 3, w as i32 - 6, PIPE_CAP_HEIGHT as i32 - 6, PIPE_M);
    s
}

fn base_sprite() -> Sprite {
    let (w, h) = BASE_SIZE;
    let mut s = Sprite::blank(w, h);
    s.fill_rect(0, 0, w as i32, 24, GRASS);
    for x in 0..w as i32 {
        for y in 24..h as i32 {
            let c = if (x / 16 + y / 16) % 2 == 0 { DIRT } else { DIRT_DARK };
            s.put(x, y, c);
        }
    }
    s
}

fn background_sprite() -> Sprite {
    let (w, h) = BACKGROUND_SIZE;
    let mut s = Sprite::blank(w, h);
    for y in 0..h {
        let t = y as f32 / h as f32;
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
        let c = Rgb(lerp(SKY_TOP.0, SKY_BOT.0), lerp(SKY_TOP.1, SKY_BOT.1), lerp(SKY_TOP.2, SKY_BOT.2));
        for x in 0..w {
            s.put(x as i32, y as i32, c);
        }
    }
    s
}
