// ============================================================================
// GRADIENT SHADER — distance grid → alpha-graded fill colors
// ============================================================================

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use super::distance_field::DistanceGrid;

/// Map a refined distance grid to fill colors with a power-curve falloff.
///
/// Source pixels (`distance ≤ 0`) are fully opaque; alpha then falls to
/// zero over `gradient_width` pixels, shaped by the `smoothness` exponent
/// (1.0 linear, >1 sharper/convex, <1 softer/concave). Pixels further than
/// `gradient_width` from any source come out fully transparent and are
/// never painted.
///
/// Pure per-pixel map with no cross-pixel dependency; rows run in parallel.
pub fn shade(
    grid: &DistanceGrid,
    gradient_width: f32,
    smoothness: f32,
    center_color: Rgba<u8>,
) -> RgbaImage {
    let w = grid.width();
    let h = grid.height();
    let gw = gradient_width.max(1.0);
    let exp = smoothness.max(0.01);
    let values = grid.values();

    let mut out = RgbaImage::new(w, h);
    let row_bytes = w as usize * 4;
    out.as_mut()
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let base = y * w as usize;
            for x in 0..w as usize {
                let d = values[base + x];
                let t = (1.0 - d / gw).clamp(0.0, 1.0);
                if t <= 0.0 {
                    continue;
                }
                let alpha = (t.powf(exp) * 255.0).round().clamp(0.0, 255.0) as u8;
                if alpha == 0 {
                    continue;
                }
                let o = x * 4;
                row[o] = center_color[0];
                row[o + 1] = center_color[1];
                row[o + 2] = center_color[2];
                row[o + 3] = alpha;
            }
        });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgba<u8> = Rgba([40, 40, 160, 255]);

    fn grid_with_center_source(size: u32) -> DistanceGrid {
        let mut grid = DistanceGrid::new(size, size);
        grid.set(size / 2, size / 2, 0.0);
        super::super::distance_field::chamfer_transform(&mut grid);
        grid
    }

    #[test]
    fn source_pixels_are_fully_opaque() {
        let grid = grid_with_center_source(21);
        let shaded = shade(&grid, 8.0, 2.0, INK);
        assert_eq!(*shaded.get_pixel(10, 10), INK);
    }

    #[test]
    fn alpha_falls_monotonically_with_distance() {
        let grid = grid_with_center_source(41);
        let shaded = shade(&grid, 10.0, 2.0, INK);
        let mut prev = 256i32;
        for x in 20..32u32 {
            let a = shaded.get_pixel(x, 20)[3] as i32;
            assert!(a <= prev, "alpha rose from {} to {} at x={}", prev, a, x);
            prev = a;
        }
    }

    #[test]
    fn pixels_beyond_gradient_width_are_transparent() {
        let grid = grid_with_center_source(41);
        let shaded = shade(&grid, 5.0, 2.0, INK);
        assert_eq!(shaded.get_pixel(20 + 10, 20)[3], 0);
        assert_eq!(shaded.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn linear_exponent_gives_midpoint_alpha() {
        let grid = grid_with_center_source(41);
        let shaded = shade(&grid, 10.0, 1.0, INK);
        // 5 pixels out of a 10-pixel ramp → about half alpha.
        let a = shaded.get_pixel(25, 20)[3] as i32;
        assert!((a - 128).abs() <= 3, "midpoint alpha {}", a);
    }

    #[test]
    fn sharper_exponent_darkens_fringe() {
        let grid = grid_with_center_source(41);
        let soft = shade(&grid, 10.0, 0.5, INK).get_pixel(27, 20)[3];
        let sharp = shade(&grid, 10.0, 3.0, INK).get_pixel(27, 20)[3];
        assert!(sharp < soft);
    }
}
