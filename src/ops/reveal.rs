// ============================================================================
// REVEAL ANIMATOR — sorted pixel commit over a fixed duration
// ============================================================================

use image::{Rgba, RgbaImage};
use rand::Rng;

use super::distance_field::DistanceGrid;
use crate::canvas::PixelCanvas;

/// One pending canvas write: flat pixel index, target color, sort key.
///
/// The key is a chamfer distance for stroke fills (smaller → revealed
/// first, so the fill grows outward from the ink source) or a uniform
/// random float for full-canvas fills (scatter reveal).
#[derive(Clone, Copy, Debug)]
pub struct PixelChange {
    pub index: usize,
    pub color: Rgba<u8>,
    pub key: f32,
}

/// The complete, ordered set of pixels a fill operation will commit.
///
/// This is the state of record for the operation: pixel counts and collider
/// extraction wait for the animation to finish, but the plan's contents are
/// fixed the moment it is collected.
pub struct RevealPlan {
    changes: Vec<PixelChange>,
}

impl RevealPlan {
    /// Collect a stroke-fill plan: every shaded pixel with alpha > 0 that
    /// differs from the live canvas, keyed by its chamfer distance.
    pub fn from_shaded(shaded: &RgbaImage, grid: &DistanceGrid, current: &RgbaImage) -> Self {
        let src = shaded.as_raw();
        let cur = current.as_raw();
        let mut changes = Vec::new();
        let values = grid.values();
        for (i, px) in src.chunks_exact(4).enumerate() {
            if px[3] == 0 {
                continue;
            }
            let o = i * 4;
            if &cur[o..o + 4] == px {
                continue;
            }
            changes.push(PixelChange {
                index: i,
                color: Rgba([px[0], px[1], px[2], px[3]]),
                key: values[i].max(0.0),
            });
        }
        Self::sorted(changes)
    }

    /// Collect a full-canvas plan: every pixel not already exactly `target`,
    /// keyed by a uniform random float for a scatter-fill reveal.
    pub fn full_canvas(current: &RgbaImage, target: Rgba<u8>, rng: &mut impl Rng) -> Self {
        let cur = current.as_raw();
        let mut changes = Vec::new();
        for (i, px) in cur.chunks_exact(4).enumerate() {
            if px == target.0 {
                continue;
            }
            changes.push(PixelChange {
                index: i,
                color: target,
                key: rng.r#gen::<f32>(),
            });
        }
        Self::sorted(changes)
    }

    fn sorted(mut changes: Vec<PixelChange>) -> Self {
        // Stable sort keeps index order among equal keys (all the zero-key
        // source pixels of a stroke fill).
        changes.sort_by(|a, b| a.key.partial_cmp(&b.key).unwrap_or(std::cmp::Ordering::Equal));
        Self { changes }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[PixelChange] {
        &self.changes
    }
}

/// Streams a [`RevealPlan`] into the live canvas over a fixed duration.
///
/// Each `advance` computes the elapsed fraction `t` and commits every
/// not-yet-committed entry up to `floor(t × total)`, in plan order. The
/// committed count is monotonic, no pixel is committed twice, and the full
/// plan is on the canvas once `t ≥ 1`.
pub struct RevealAnimation {
    plan: RevealPlan,
    duration: f32,
    elapsed: f32,
    committed: usize,
}

impl RevealAnimation {
    pub fn new(plan: RevealPlan, duration: f32) -> Self {
        Self {
            plan,
            duration: duration.max(0.0),
            elapsed: 0.0,
            committed: 0,
        }
    }

    pub fn committed(&self) -> usize {
        self.committed
    }

    pub fn total(&self) -> usize {
        self.plan.len()
    }

    pub fn is_complete(&self) -> bool {
        self.committed == self.plan.len()
    }

    /// Advance by `dt` seconds, writing newly due pixels into the canvas.
    /// Returns true once the whole plan is committed.
    pub fn advance(&mut self, dt: f32, canvas: &mut PixelCanvas) -> bool {
        self.elapsed += dt.max(0.0);
        let total = self.plan.len();
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        };
        let target = if t >= 1.0 {
            total
        } else {
            ((t * total as f32).floor() as usize).clamp(0, total)
        };
        for change in &self.plan.changes[self.committed..target] {
            canvas.put_index(change.index, change.color);
        }
        self.committed = target;
        self.committed == total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelTransform;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const INK: Rgba<u8> = Rgba([40, 40, 160, 255]);

    fn shaded_strip(w: u32) -> (RgbaImage, DistanceGrid) {
        // One row: alpha ramps down left→right, keyed by distance = x.
        let mut shaded = RgbaImage::new(w, 1);
        let mut grid = DistanceGrid::new(w, 1);
        for x in 0..w {
            shaded.put_pixel(x, 0, Rgba([40, 40, 160, (255 - x * 10) as u8]));
            grid.set(x, 0, x as f32);
        }
        (shaded, grid)
    }

    #[test]
    fn plan_sorts_by_distance_key() {
        let (shaded, grid) = shaded_strip(10);
        let blank = RgbaImage::new(10, 1);
        let plan = RevealPlan::from_shaded(&shaded, &grid, &blank);
        assert_eq!(plan.len(), 10);
        for pair in plan.changes().windows(2) {
            assert!(pair[0].key <= pair[1].key);
        }
    }

    #[test]
    fn plan_skips_pixels_already_at_target() {
        let (shaded, grid) = shaded_strip(10);
        let mut current = RgbaImage::new(10, 1);
        current.put_pixel(0, 0, *shaded.get_pixel(0, 0));
        let plan = RevealPlan::from_shaded(&shaded, &grid, &current);
        assert_eq!(plan.len(), 9);
    }

    #[test]
    fn reveal_is_monotonic_and_completes_exactly() {
        let (shaded, grid) = shaded_strip(10);
        let blank = RgbaImage::new(10, 1);
        let plan = RevealPlan::from_shaded(&shaded, &grid, &blank);
        let total = plan.len();

        let mut canvas = PixelCanvas::new(10, 1, PixelTransform::new(1.0));
        let mut anim = RevealAnimation::new(plan, 1.0);
        let mut prev = 0;
        for _ in 0..10 {
            anim.advance(0.1, &mut canvas);
            assert!(anim.committed() >= prev);
            prev = anim.committed();
        }
        assert!(anim.is_complete());
        assert_eq!(anim.committed(), total);
        // Every planned pixel landed.
        let painted = canvas
            .pixels()
            .pixels()
            .filter(|p| p[3] > 0)
            .count();
        assert_eq!(painted, total);
    }

    #[test]
    fn zero_duration_commits_in_one_tick() {
        let (shaded, grid) = shaded_strip(10);
        let blank = RgbaImage::new(10, 1);
        let plan = RevealPlan::from_shaded(&shaded, &grid, &blank);
        let mut canvas = PixelCanvas::new(10, 1, PixelTransform::new(1.0));
        let mut anim = RevealAnimation::new(plan, 0.0);
        assert!(anim.advance(0.0, &mut canvas));
        assert!(anim.is_complete());
    }

    #[test]
    fn partial_reveal_commits_lowest_keys_first() {
        let (shaded, grid) = shaded_strip(10);
        let blank = RgbaImage::new(10, 1);
        let plan = RevealPlan::from_shaded(&shaded, &grid, &blank);
        let mut canvas = PixelCanvas::new(10, 1, PixelTransform::new(1.0));
        let mut anim = RevealAnimation::new(plan, 1.0);
        anim.advance(0.5, &mut canvas);
        // Half way through, the left (low-distance) half is painted.
        assert_eq!(anim.committed(), 5);
        assert!(canvas.get(0, 0)[3] > 0);
        assert_eq!(canvas.get(9, 0)[3], 0);
    }

    #[test]
    fn full_canvas_plan_is_seed_deterministic() {
        let current = RgbaImage::new(8, 8);
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let a = RevealPlan::full_canvas(&current, INK, &mut rng_a);
        let b = RevealPlan::full_canvas(&current, INK, &mut rng_b);
        assert_eq!(a.len(), 64);
        let order_a: Vec<usize> = a.changes().iter().map(|c| c.index).collect();
        let order_b: Vec<usize> = b.changes().iter().map(|c| c.index).collect();
        assert_eq!(order_a, order_b);
    }

    #[test]
    fn full_canvas_plan_skips_target_colored_pixels() {
        let mut current = RgbaImage::new(4, 4);
        current.put_pixel(2, 2, INK);
        let mut rng = StdRng::seed_from_u64(1);
        let plan = RevealPlan::full_canvas(&current, INK, &mut rng);
        assert_eq!(plan.len(), 15);
    }
}
