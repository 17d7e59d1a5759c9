// ============================
// Framebuffer drawing
// ============================

use crate::runner::{RenderSink, Scene};
use crate::sprites::{Sprite, Sprites};

/// RGBA8 frame of a fixed size (the `pixels` buffer in the windowed app).
pub struct Canvas<'f> {
    pub frame: &'f mut [u8],
    pub width: u32,
    pub height: u32,
}

impl<'f> Canvas<'f> {
    pub fn new(frame: &'f mut [u8], width: u32, height: u32) -> Self {
        Self { frame, width, height }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8, a: u8) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 || a == 0 {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        if idx + 3 >= self.frame.len() {
            return;
        }
        let ar = a as u16;
        let iar = (255 - a) as u16;
        let px = &mut self.frame[idx..idx + 4];
        px[0] = ((r as u16 * ar + px[0] as u16 * iar) / 255) as u8;
        px[1] = ((g as u16 * ar + px[1] as u16 * iar) / 255) as u8;
        px[2] = ((b as u16 * ar + px[2] as u16 * iar) / 255) as u8;
        px[3] = 255;
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, rgba: (u8, u8, u8, u8)) {
        for py in y..y + h as i32 {
            for px in x..x + w as i32 {
                self.blend_pixel(px, py, rgba.0, rgba.1, rgba.2, rgba.3);
            }
        }
    }

    pub fn stroke_rect(&mut self, x: i32, y: i32, w: u32, h: u32, rgba: (u8, u8, u8, u8)) {
        if w == 0 || h == 0 {
            return;
        }
        let (x2, y2) = (x + w as i32 - 1, y + h as i32 - 1);
        for px in x..=x2 {
            self.blend_pixel(px, y, rgba.0, rgba.1, rgba.2, rgba.3);
            self.blend_pixel(px, y2, rgba.0, rgba.1, rgba.2, rgba.3);
        }
        for py in y..=y2 {
            self.blend_pixel(x, py, rgba.0, rgba.1, rgba.2, rgba.3);
            self.blend_pixel(x2, py, rgba.0, rgba.1, rgba.2, rgba.3);
        }
    }

    /// Alpha-blends `sprite` with its top-left corner at (x, y).
    pub fn blit(&mut self, sprite: &Sprite, x: i32, y: i32) {
        for sy in 0..sprite.height {
            let py = y + sy as i32;
            if py < 0 || py >= self.height as i32 {
                continue;
            }
            for sx in 0..sprite.width {
                let [r, g, b, a] = sprite.pixel(sx, sy);
                self.blend_pixel(x + sx as i32, py, r, g, b, a);
            }
        }
    }

    /// Draws `sprite` rotated counter-clockwise by `degrees` about the centre
    /// of where it would sit unrotated at (x, y).
    pub fn blit_rotated(&mut self, sprite: &Sprite, x: f32, y: f32, degrees: f32) {
        if degrees == 0.0 {
            self.blit(sprite, x.round() as i32, y.round() as i32);
            return;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (hw, hh) = (sprite.width as f32 / 2.0, sprite.height as f32 / 2.0);
        let (cx, cy) = (x + hw, y + hh);
        let radius = (hw * hw + hh * hh).sqrt().ceil() as i32;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let (fx, fy) = (dx as f32 + 0.5, dy as f32 + 0.5);
                // inverse rotation back into sprite space (screen y points down)
                let sx = fx * cos - fy * sin + hw;
                let sy = fx * sin + fy * cos + hh;
                if sx < 0.0 || sy < 0.0 || sx >= sprite.width as f32 || sy >= sprite.height as f32 {
                    continue;
                }
                let [r, g, b, a] = sprite.pixel(sx as u32, sy as u32);
                self.blend_pixel(cx as i32 + dx, cy as i32 + dy, r, g, b, a);
            }
        }
    }

    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: u32, col: (u8, u8, u8, u8)) {
        let mut cx = x;
        for ch in text.chars() {
            cx += self.draw_char(ch, cx, y, scale, col);
        }
    }

    fn draw_char(&mut self, ch: char, x: i32, y: i32, scale: u32, col: (u8, u8, u8, u8)) -> i32 {
        if let Some(rows) = glyph_5x7(ch) {
            for (ry, row) in rows.iter().enumerate() {
                for rx in 0..5 {
                    if (row >> (4 - rx)) & 1 == 1 {
                        let px = x + (rx * scale) as i32;
                        let py = y + (ry as u32 * scale) as i32;
                        self.fill_rect(px, py, scale, scale, col);
                    }
                }
            }
        }
        (6 * scale) as i32
    }

    /// Bar chart of the most recent values that fit in `w`.
    pub fn draw_chart(&mut self, x: i32, y: i32, w: u32, h: u32, data: &[f64]) {
        self.stroke_rect(x, y, w, h, (200, 200, 200, 120));
        let max_val = data.iter().copied().fold(0.0f64, f64::max);
        if data.is_empty() || max_val <= 0.0 || w < 8 || h < 3 {
            return;
        }
        let bars = data.len().min(w as usize / 6);
        let bar_w = (w / bars as u32).max(2);
        for (i, v) in data[data.len() - bars..].iter().enumerate() {
            let bh = ((v.max(0.0) / max_val) * (h - 2) as f64) as u32;
            let bx = x + 1 + (i as u32 * bar_w) as i32;
            let by = y + h as i32 - 1 - bh as i32;
            self.fill_rect(bx, by, bar_w - 1, bh, (120, 180, 255, 160));
        }
    }

    pub fn text_width(text: &str, scale: u32) -> i32 {
        (text.chars().count() as u32 * 6 * scale) as i32
    }
}

/// Draws one tick of the game: background, pipes, HUD text, ground, birds.
pub fn draw_scene(canvas: &mut Canvas<'_>, scene: &Scene<'_>, sprites: &Sprites, history: &[f64]) {
    canvas.blit(&sprites.background, 0, 0);

    for pipe in scene.pipes {
        let x = pipe.x.round() as i32;
        canvas.blit(&sprites.pipe_top, x, pipe.top.round() as i32);
        canvas.blit(&sprites.pipe_bottom, x, pipe.bottom.round() as i32);
    }

    let white = (255, 255, 255, 255);
    let score = format!("Score: {}", scene.score);
    let sx = canvas.width as i32 - 10 - Canvas::text_width(&score, 3);
    canvas.draw_text(&score, sx, 10, 3, white);
    canvas.draw_text(&format!("Gen: {}", scene.generation), 10, 10, 3, white);
    canvas.draw_text(&format!("Alive: {}/{}", scene.birds.len(), scene.population), 10, 40, 2, (230, 230, 230, 255));
    if !history.is_empty() {
        canvas.fill_rect(8, 62, 164, 64, (0, 0, 0, 100));
        canvas.draw_chart(10, 64, 160, 60, history);
    }

    let ground = scene.ground;
    canvas.blit(&sprites.base, ground.x1.round() as i32, ground.y.round() as i32);
    canvas.blit(&sprites.base, ground.x2.round() as i32, ground.y.round() as i32);

    for bird in scene.birds {
        canvas.blit_rotated(&sprites.bird[bird.frame], bird.x, bird.y, bird.tilt);
    }
}

/// Render sink writing straight into a frame buffer.
pub struct FrameSink<'f, 's> {
    pub canvas: Canvas<'f>,
    pub sprites: &'s Sprites,
    pub history: &'s [f64],
}

impl RenderSink for FrameSink<'_, '_> {
    fn draw(&mut self, scene: &Scene<'_>) {
        draw_scene(&mut self.canvas, scene, self.sprites, self.history);
    }
}

fn glyph_5x7(ch: char) -> Option<[u8; 7]> {
    let c = ch.to_ascii_uppercase();
    Some(match c {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b11110, 0b10001, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'I' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b11111],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000],
        '/' => [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000],
        ' ' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
        _ => return None,
    })
}
