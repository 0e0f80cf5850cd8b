// ============================================================================
// DISTANCE FIELD BUILDER — stroke polygon + ink mask → chamfer distance grid
// ============================================================================
//
// Four passes, in dependency order:
//   1. Mask seed        — snapshot pixels holding player ink become sources.
//   2. Stroke core      — a disc is stamped at every polygon vertex so thin
//                         strokes survive scanline rounding.
//   3. Scanline fill    — even-odd parity fill marks the polygon interior.
//   4. Chamfer sweep    — two O(W·H) passes refine "outside" pixels into an
//                         approximate Euclidean distance-to-source.
//
// The result drives a soft visual gradient, so the 1.0 / 1.414 chamfer
// approximation is sufficient; no exact transform is needed.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::canvas::is_player_ink;
use crate::stroke::StrokePath;

/// Sentinel for pixels not yet reached by the chamfer sweep.
pub const OUTSIDE: f32 = 99_999.0;

/// Orthogonal / diagonal step costs for the chamfer sweeps.
const ORTHO: f32 = 1.0;
const DIAG: f32 = 1.414;

/// A W×H grid of distances to the nearest "source" pixel.
///
/// Sources (existing player ink, the stroke core, the polygon interior)
/// hold 0.0; after [`chamfer_transform`] every other pixel holds its
/// approximate Euclidean distance to the nearest source, in pixel units.
/// Transient: lives for exactly one fill operation.
pub struct DistanceGrid {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl DistanceGrid {
    /// A grid with every pixel at the outside sentinel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            values: vec![OUTSIDE; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, v: f32) {
        self.values[(y * self.width + x) as usize] = v;
    }

    /// True if the pixel is a source ("inside" the seeded region).
    #[inline]
    pub fn is_source(&self, x: u32, y: u32) -> bool {
        self.get(x, y) <= 0.0
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Neighbor value + step cost, or the sentinel when out of bounds.
    #[inline]
    fn neighbor_cost(&self, x: u32, y: u32, dx: i32, dy: i32, cost: f32) -> f32 {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if nx >= 0 && ny >= 0 && (nx as u32) < self.width && (ny as u32) < self.height {
            self.values[(ny as u32 * self.width + nx as u32) as usize] + cost
        } else {
            OUTSIDE
        }
    }
}

/// Build the refined distance grid for one player stroke.
///
/// `snapshot` is the canvas as it existed before the stroke (the backup
/// copy), `core_radius` is the configured gradient width, and `enemy_color`
/// marks pixels that count as outside (a stroke paints over enemy ground).
pub fn build_stroke_field(
    snapshot: &RgbaImage,
    stroke: &StrokePath,
    core_radius: f32,
    enemy_color: Rgba<u8>,
) -> DistanceGrid {
    let mut grid = seed_from_snapshot(snapshot, enemy_color);
    stamp_stroke_core(&mut grid, stroke, core_radius);
    scanline_fill(&mut grid, &stroke.points);
    chamfer_transform(&mut grid);
    grid
}

/// Pass 1 — per-pixel mask seed. Pixels occupied by non-enemy ink in the
/// snapshot become sources; everything else (including enemy ink) starts at
/// the outside sentinel. Rows are independent, so this runs in parallel.
pub fn seed_from_snapshot(snapshot: &RgbaImage, enemy_color: Rgba<u8>) -> DistanceGrid {
    let w = snapshot.width();
    let h = snapshot.height();
    let mut grid = DistanceGrid::new(w, h);
    let raw = snapshot.as_raw();

    grid.values
        .par_chunks_mut(w as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let base = y * w as usize * 4;
            for (x, v) in row.iter_mut().enumerate() {
                let o = base + x * 4;
                let p = Rgba([raw[o], raw[o + 1], raw[o + 2], raw[o + 3]]);
                *v = if is_player_ink(p, enemy_color) {
                    0.0
                } else {
                    OUTSIDE
                };
            }
        });
    grid
}

/// Pass 2 — stamp a filled disc of `radius` at every stroke vertex so the
/// drawn path itself is solid before the parity fill runs.
pub fn stamp_stroke_core(grid: &mut DistanceGrid, stroke: &StrokePath, radius: f32) {
    let r = radius.max(1.0);
    let ir = r.ceil() as i32;
    let r_sq = r * r;
    for &(px, py) in &stroke.points {
        let cx = px.round() as i32;
        let cy = py.round() as i32;
        for dy in -ir..=ir {
            for dx in -ir..=ir {
                if (dx * dx + dy * dy) as f32 > r_sq {
                    continue;
                }
                let x = cx + dx;
                let y = cy + dy;
                if x >= 0 && y >= 0 && (x as u32) < grid.width && (y as u32) < grid.height {
                    grid.set(x as u32, y as u32, 0.0);
                }
            }
        }
    }
}

/// Pass 3 — classic even-odd scanline polygon fill.
///
/// For each row, x-intersections of every edge crossing the row center are
/// collected, sorted, and paired; pixels whose centers fall between a pair
/// become sources. The half-open `<=` crossing test resolves ties at shared
/// vertices without double counting.
pub fn scanline_fill(grid: &mut DistanceGrid, polygon: &[(f32, f32)]) {
    if polygon.len() < 3 {
        return;
    }
    let w = grid.width as i32;
    let mut xs: Vec<f32> = Vec::with_capacity(polygon.len());

    for y in 0..grid.height {
        let yc = y as f32 + 0.5;
        xs.clear();
        for i in 0..polygon.len() {
            let (x0, y0) = polygon[i];
            let (x1, y1) = polygon[(i + 1) % polygon.len()];
            if (y0 <= yc) != (y1 <= yc) {
                let t = (yc - y0) / (y1 - y0);
                xs.push(x0 + t * (x1 - x0));
            }
        }
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        for pair in xs.chunks_exact(2) {
            // Pixel centers in [xa, xb).
            let start = (pair[0] - 0.5).ceil().max(0.0) as i32;
            let end = ((pair[1] - 0.5).ceil() as i32).min(w);
            for x in start..end {
                grid.set(x as u32, y, 0.0);
            }
        }
    }
}

/// Pass 4 — two-pass chamfer sweep (1.0 orthogonal, 1.414 diagonal).
///
/// Pass one sweeps top-left→bottom-right pulling from the N/W/NW/NE
/// neighbors; pass two sweeps bottom-right→top-left pulling from S/E/SE/SW.
/// After both passes 4-adjacent pixels differ by at most 1.0.
pub fn chamfer_transform(grid: &mut DistanceGrid) {
    let w = grid.width;
    let h = grid.height;

    for y in 0..h {
        for x in 0..w {
            let v = grid.get(x, y);
            if v <= 0.0 {
                continue;
            }
            let best = v
                .min(grid.neighbor_cost(x, y, 0, -1, ORTHO))
                .min(grid.neighbor_cost(x, y, -1, 0, ORTHO))
                .min(grid.neighbor_cost(x, y, -1, -1, DIAG))
                .min(grid.neighbor_cost(x, y, 1, -1, DIAG));
            grid.set(x, y, best);
        }
    }

    for y in (0..h).rev() {
        for x in (0..w).rev() {
            let v = grid.get(x, y);
            if v <= 0.0 {
                continue;
            }
            let best = v
                .min(grid.neighbor_cost(x, y, 0, 1, ORTHO))
                .min(grid.neighbor_cost(x, y, 1, 0, ORTHO))
                .min(grid.neighbor_cost(x, y, 1, 1, DIAG))
                .min(grid.neighbor_cost(x, y, -1, 1, DIAG));
            grid.set(x, y, best);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_stroke(x0: f32, y0: f32, x1: f32, y1: f32) -> StrokePath {
        StrokePath {
            points: vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, (y0 + y1) * 0.5)],
            distance_moved: 0.0,
        }
    }

    const ENEMY: Rgba<u8> = Rgba([200, 40, 40, 255]);

    #[test]
    fn seed_marks_player_ink_only() {
        let mut snap = RgbaImage::new(8, 8);
        snap.put_pixel(2, 2, Rgba([40, 40, 160, 255])); // player
        snap.put_pixel(3, 3, ENEMY); // enemy counts as outside
        let grid = seed_from_snapshot(&snap, ENEMY);
        assert!(grid.is_source(2, 2));
        assert!(!grid.is_source(3, 3));
        assert!(!grid.is_source(0, 0));
    }

    #[test]
    fn scanline_fills_square_interior() {
        let mut grid = DistanceGrid::new(100, 100);
        scanline_fill(&mut grid, &square_stroke(20.0, 20.0, 80.0, 80.0).points);
        let inside = (0..100u32)
            .flat_map(|y| (0..100u32).map(move |x| (x, y)))
            .filter(|&(x, y)| grid.is_source(x, y))
            .count();
        // 60×60 interior, exact for an axis-aligned square.
        assert_eq!(inside, 3600);
        assert!(grid.is_source(50, 50));
        assert!(!grid.is_source(10, 50));
    }

    #[test]
    fn scanline_ignores_degenerate_polygons() {
        let mut grid = DistanceGrid::new(10, 10);
        scanline_fill(&mut grid, &[(1.0, 1.0), (5.0, 5.0)]);
        assert!((0..10).all(|y| (0..10).all(|x| !grid.is_source(x, y))));
    }

    #[test]
    fn stroke_core_stamps_vertices() {
        let mut grid = DistanceGrid::new(40, 40);
        let stroke = square_stroke(10.0, 10.0, 30.0, 30.0);
        stamp_stroke_core(&mut grid, &stroke, 3.0);
        assert!(grid.is_source(10, 10));
        assert!(grid.is_source(12, 10)); // within the disc
        assert!(!grid.is_source(20, 20)); // interior not touched by stamping
    }

    #[test]
    fn chamfer_distances_grow_away_from_source() {
        let mut grid = DistanceGrid::new(21, 21);
        grid.set(10, 10, 0.0);
        chamfer_transform(&mut grid);
        assert_eq!(grid.get(10, 10), 0.0);
        assert!((grid.get(13, 10) - 3.0).abs() < 1e-4);
        assert!((grid.get(11, 11) - DIAG).abs() < 1e-4);
        // Roughly Euclidean on the diagonal.
        let d = grid.get(14, 14);
        assert!(d > 5.0 && d < 6.0, "diagonal distance {}", d);
    }

    #[test]
    fn chamfer_satisfies_orthogonal_lipschitz_bound() {
        let mut grid = DistanceGrid::new(40, 40);
        grid.set(5, 5, 0.0);
        grid.set(30, 22, 0.0);
        chamfer_transform(&mut grid);
        for y in 0..40u32 {
            for x in 0..40u32 {
                let d = grid.get(x, y);
                if x + 1 < 40 {
                    assert!((d - grid.get(x + 1, y)).abs() <= ORTHO + 1e-4);
                }
                if y + 1 < 40 {
                    assert!((d - grid.get(x, y + 1)).abs() <= ORTHO + 1e-4);
                }
            }
        }
    }

    #[test]
    fn full_build_marks_interior_and_ramps_outside() {
        let snap = RgbaImage::new(100, 100);
        let stroke = square_stroke(20.0, 20.0, 80.0, 80.0);
        let grid = build_stroke_field(&snap, &stroke, 3.0, ENEMY);
        assert!(grid.is_source(50, 50));
        // Just outside the square the distance is small and positive.
        let near = grid.get(85, 50);
        assert!(near > 0.0 && near < 8.0, "near distance {}", near);
        // Far corner is much further out.
        assert!(grid.get(99, 0) > near);
    }
}
