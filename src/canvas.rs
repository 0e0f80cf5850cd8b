// ============================================================================
// PIXEL CANVAS — the single shared mutable pixel buffer
// ============================================================================

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Affine map from canvas pixel space to the consuming world coordinate
/// system. The canvas is the display surface scaled down by `canvas_scale`,
/// so one canvas pixel covers `1 / scale` world units.
#[derive(Clone, Copy, Debug)]
pub struct PixelTransform {
    /// World units per canvas pixel.
    pub world_per_pixel: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl PixelTransform {
    pub fn new(world_per_pixel: f32) -> Self {
        Self {
            world_per_pixel,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Canvas pixel → world point.
    pub fn to_world(&self, px: f32, py: f32) -> (f32, f32) {
        (
            px * self.world_per_pixel + self.offset_x,
            py * self.world_per_pixel + self.offset_y,
        )
    }

    /// World point → canvas pixel (fractional; callers round/clamp).
    pub fn to_pixel(&self, wx: f32, wy: f32) -> (f32, f32) {
        (
            (wx - self.offset_x) / self.world_per_pixel,
            (wy - self.offset_y) / self.world_per_pixel,
        )
    }
}

/// Result of a full-buffer classification scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelCounts {
    pub total: usize,
    pub player: usize,
    pub enemy: usize,
}

impl PixelCounts {
    pub fn player_percent(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.player as f32 * 100.0 / self.total as f32
        }
    }

    pub fn enemy_percent(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.enemy as f32 * 100.0 / self.total as f32
        }
    }
}

/// True if `p` is player ink: visible and not the enemy's RGB.
#[inline]
pub fn is_player_ink(p: Rgba<u8>, enemy_color: Rgba<u8>) -> bool {
    p[3] > 0 && (p[0], p[1], p[2]) != (enemy_color[0], enemy_color[1], enemy_color[2])
}

/// True if `p` is enemy ink: exactly the enemy RGB at full alpha.
#[inline]
pub fn is_enemy_ink(p: Rgba<u8>, enemy_color: Rgba<u8>) -> bool {
    p[3] == 255 && (p[0], p[1], p[2]) == (enemy_color[0], enemy_color[1], enemy_color[2])
}

/// Owns the W×H RGBA buffer for one level session.
///
/// Every pixel is background (alpha 0), player ink (alpha > 0, RGB different
/// from the enemy color), or enemy ink (enemy RGB at alpha 255). All access
/// is bounds-checked; out-of-range reads return transparent black and
/// out-of-range writes are dropped.
pub struct PixelCanvas {
    pixels: RgbaImage,
    transform: PixelTransform,
}

impl PixelCanvas {
    /// Create an empty (fully transparent) canvas.
    ///
    /// Dimensions are sanity-clamped: zero or absurdly large requests
    /// (> 64M pixels) fall back to 1×1 rather than aborting the session.
    pub fn new(width: u32, height: u32, transform: PixelTransform) -> Self {
        let (width, height) = {
            let total = width as u64 * height as u64;
            if total == 0 || total > 64_000_000 {
                crate::log_warn!(
                    "PixelCanvas::new: dimensions {}x{} out of range, clamped to 1x1",
                    width,
                    height
                );
                (1, 1)
            } else {
                (width, height)
            }
        };
        Self {
            pixels: RgbaImage::new(width, height),
            transform,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn total_pixels(&self) -> usize {
        self.pixels.width() as usize * self.pixels.height() as usize
    }

    pub fn transform(&self) -> PixelTransform {
        self.transform
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.pixels.as_mut().fill(0);
    }

    /// Immutable full copy, taken before each stroke so the distance field
    /// can be seeded from the pre-stroke board.
    pub fn snapshot(&self) -> RgbaImage {
        self.pixels.clone()
    }

    /// Read a pixel; out-of-range returns transparent black.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Rgba<u8> {
        if x < 0 || y < 0 || x as u32 >= self.pixels.width() || y as u32 >= self.pixels.height() {
            Rgba([0, 0, 0, 0])
        } else {
            *self.pixels.get_pixel(x as u32, y as u32)
        }
    }

    /// Write a pixel; out-of-range writes are dropped.
    #[inline]
    pub fn put(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.pixels.width() && (y as u32) < self.pixels.height()
        {
            self.pixels.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Write a pixel by flat index (`y * width + x`). Out-of-range is dropped.
    #[inline]
    pub fn put_index(&mut self, index: usize, color: Rgba<u8>) {
        let raw = self.pixels.as_mut();
        let byte = index * 4;
        if byte + 4 <= raw.len() {
            raw[byte..byte + 4].copy_from_slice(&color.0);
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Single full-buffer scan classifying every pixel as player ink, enemy
    /// ink, or empty. Rows are counted in parallel and summed.
    pub fn count_pixels(&self, enemy_color: Rgba<u8>) -> PixelCounts {
        let raw = self.pixels.as_raw();
        let row_bytes = self.pixels.width() as usize * 4;
        let (player, enemy) = raw
            .par_chunks(row_bytes)
            .map(|row| {
                let mut p = 0usize;
                let mut e = 0usize;
                for px in row.chunks_exact(4) {
                    let c = Rgba([px[0], px[1], px[2], px[3]]);
                    if is_enemy_ink(c, enemy_color) {
                        e += 1;
                    } else if is_player_ink(c, enemy_color) {
                        p += 1;
                    }
                }
                (p, e)
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));
        PixelCounts {
            total: self.total_pixels(),
            player,
            enemy,
        }
    }
}
