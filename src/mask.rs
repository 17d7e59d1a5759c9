//! Per-pixel opacity masks used for pixel-accurate collision.

/// Alpha values strictly above this count as solid.
pub const ALPHA_THRESHOLD: u8 = 127;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    /// Builds a mask from a tightly packed RGBA8 buffer.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Self {
        let bits = rgba
            .chunks_exact(4)
            .take((width * height) as usize)
            .map(|px| px[3] > ALPHA_THRESHOLD)
            .collect();
        Self { width, height, bits }
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.bits[(y as u32 * self.width + x as u32) as usize]
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// First solid pixel shared with `other` when `other`'s top-left corner sits at
    /// `offset` in this mask's coordinates. The point is returned in this mask's space.
    pub fn overlap(&self, other: &Mask, offset: (i32, i32)) -> Option<(i32, i32)> {
        let (dx, dy) = offset;
        let x0 = dx.max(0);
        let y0 = dy.max(0);
        let x1 = (dx + other.width as i32).min(self.width as i32);
        let y1 = (dy + other.height as i32).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x, y) && other.get(x - dx, y - dy) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    pub fn overlaps(&self, other: &Mask, offset: (i32, i32)) -> bool {
        self.overlap(other, offset).is_some()
    }
}
