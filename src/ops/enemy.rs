// ============================================================================
// ENEMY FIELD — circular growth seeds with capture / shrink / expand
// ============================================================================

use image::Rgba;
use rand::Rng;
use rayon::prelude::*;

use crate::canvas::{PixelCanvas, is_player_ink};

/// One circular occupier of canvas territory.
///
/// Lifecycle is one-directional: `Active → Captured`. A captured seed never
/// expands or stamps again, but pixels it already painted remain until
/// something overwrites them.
#[derive(Clone, Copy, Debug)]
pub struct EnemySeed {
    pub position: (i32, i32),
    pub radius: f32,
    pub active: bool,
}

impl EnemySeed {
    pub fn new(x: i32, y: i32, radius: f32) -> Self {
        Self {
            position: (x, y),
            radius,
            active: true,
        }
    }

    #[inline]
    fn contains(&self, x: i32, y: i32) -> bool {
        let dx = (x - self.position.0) as f32;
        let dy = (y - self.position.1) as f32;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// The set of enemy seeds for one level. Seeds are created once at
/// initialization and never added afterward.
pub struct EnemyField {
    seeds: Vec<EnemySeed>,
    color: Rgba<u8>,
}

impl EnemyField {
    pub fn new(seeds: Vec<EnemySeed>, color: Rgba<u8>) -> Self {
        Self { seeds, color }
    }

    /// Scatter `count` non-overlapping seeds by rejection sampling.
    ///
    /// Centers keep `radius + 2` pixels from the canvas border and at least
    /// one radius of clearance between circles. Attempts are bounded; if the
    /// canvas is too crowded the field comes up short rather than spinning.
    pub fn scatter(
        count: u32,
        radius: f32,
        width: u32,
        height: u32,
        color: Rgba<u8>,
        rng: &mut impl Rng,
    ) -> Self {
        let margin = (radius + 2.0).ceil() as i32;
        let mut seeds: Vec<EnemySeed> = Vec::with_capacity(count as usize);
        let max_attempts = count as usize * 200;
        let mut attempts = 0;

        let x_range = margin..(width as i32 - margin).max(margin + 1);
        let y_range = margin..(height as i32 - margin).max(margin + 1);

        while seeds.len() < count as usize && attempts < max_attempts {
            attempts += 1;
            let x = rng.gen_range(x_range.clone());
            let y = rng.gen_range(y_range.clone());
            let clear = seeds.iter().all(|s| {
                let dx = (x - s.position.0) as f32;
                let dy = (y - s.position.1) as f32;
                (dx * dx + dy * dy).sqrt() > radius * 3.0
            });
            if clear {
                seeds.push(EnemySeed::new(x, y, radius));
            }
        }
        if seeds.len() < count as usize {
            crate::log_warn!(
                "EnemyField::scatter placed {}/{} seeds before giving up",
                seeds.len(),
                count
            );
        }
        Self { seeds, color }
    }

    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    pub fn seeds(&self) -> &[EnemySeed] {
        &self.seeds
    }

    pub fn seeds_mut(&mut self) -> &mut [EnemySeed] {
        &mut self.seeds
    }

    pub fn active_count(&self) -> usize {
        self.seeds.iter().filter(|s| s.active).count()
    }

    pub fn all_captured(&self) -> bool {
        self.seeds.iter().all(|s| !s.active)
    }

    /// Flip any active seed whose center pixel is covered by player ink to
    /// Captured. Returns the indices captured by this call. The transition
    /// is permanent.
    pub fn check_captures(&mut self, canvas: &PixelCanvas) -> Vec<usize> {
        let mut captured = Vec::new();
        for (i, seed) in self.seeds.iter_mut().enumerate() {
            if !seed.active {
                continue;
            }
            let p = canvas.get(seed.position.0, seed.position.1);
            if is_player_ink(p, self.color) {
                seed.active = false;
                captured.push(i);
                crate::log_info!(
                    "enemy seed {} captured at ({}, {})",
                    i,
                    seed.position.0,
                    seed.position.1
                );
            }
        }
        captured
    }

    /// Clamp each active seed's radius to the distance of the nearest player
    /// ink pixel inside its bounding box. Never increases a radius. Must run
    /// before expansion so growth reflects contact with the current board.
    pub fn shrink_on_collision(&mut self, canvas: &PixelCanvas) {
        for seed in self.seeds.iter_mut().filter(|s| s.active) {
            let (cx, cy) = seed.position;
            let reach = seed.radius.ceil() as i32;
            let mut nearest = seed.radius;
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let p = canvas.get(cx + dx, cy + dy);
                    if !is_player_ink(p, self.color) {
                        continue;
                    }
                    let d = ((dx * dx + dy * dy) as f32).sqrt();
                    if d < nearest {
                        nearest = d;
                    }
                }
            }
            seed.radius = nearest;
        }
    }

    /// Paint every pixel inside any active seed's current radius with the
    /// enemy color. First matching seed wins per pixel; pixels outside all
    /// active circles are left untouched (superimposing paint, not a full
    /// repaint).
    pub fn stamp(&self, canvas: &mut PixelCanvas) {
        let w = canvas.width() as usize;
        let color = self.color.0;
        let active: Vec<EnemySeed> = self.seeds.iter().copied().filter(|s| s.active).collect();
        if active.is_empty() {
            return;
        }
        let row_bytes = w * 4;
        canvas
            .pixels_mut()
            .as_mut()
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..w {
                    if active.iter().any(|s| s.contains(x as i32, y as i32)) {
                        let o = x * 4;
                        row[o..o + 4].copy_from_slice(&color);
                    }
                }
            });
    }
}

/// Tick-driven eased expansion of every active seed.
///
/// Radii grow from their turn-start values by `amount × smoothT` where
/// `smoothT = 1 − (1 − t)²` (ease-out), re-stamping the canvas each tick.
/// The final tick pins radii to exactly `start + amount` and performs one
/// last full-precision stamp.
pub struct ExpansionAnimation {
    start_radii: Vec<f32>,
    amount: f32,
    duration: f32,
    elapsed: f32,
    finished: bool,
}

impl ExpansionAnimation {
    pub fn new(field: &EnemyField, amount: f32, duration: f32) -> Self {
        Self {
            start_radii: field.seeds.iter().map(|s| s.radius).collect(),
            amount,
            duration: duration.max(0.0),
            elapsed: 0.0,
            finished: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.finished
    }

    /// Advance by `dt` seconds. Returns true once radii are pinned to their
    /// final values and the last stamp has been written.
    pub fn advance(&mut self, dt: f32, field: &mut EnemyField, canvas: &mut PixelCanvas) -> bool {
        if self.finished {
            return true;
        }
        self.elapsed += dt.max(0.0);
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        };
        let smooth = if t >= 1.0 { 1.0 } else { 1.0 - (1.0 - t) * (1.0 - t) };

        for (seed, &start) in field.seeds.iter_mut().zip(&self.start_radii) {
            if seed.active {
                seed.radius = start + self.amount * smooth;
            }
        }
        field.stamp(canvas);

        if t >= 1.0 {
            self.finished = true;
        }
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelTransform;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const ENEMY: Rgba<u8> = Rgba([200, 40, 40, 255]);
    const PLAYER: Rgba<u8> = Rgba([40, 40, 160, 255]);

    fn test_canvas(w: u32, h: u32) -> PixelCanvas {
        PixelCanvas::new(w, h, PixelTransform::new(1.0))
    }

    #[test]
    fn capture_requires_player_ink_at_center() {
        let mut canvas = test_canvas(100, 100);
        let mut field = EnemyField::new(vec![EnemySeed::new(50, 50, 10.0)], ENEMY);

        assert!(field.check_captures(&canvas).is_empty());
        canvas.put(50, 50, PLAYER);
        assert_eq!(field.check_captures(&canvas), vec![0]);
        assert!(!field.seeds()[0].active);
    }

    #[test]
    fn enemy_ink_at_center_does_not_capture() {
        let mut canvas = test_canvas(100, 100);
        canvas.put(50, 50, ENEMY);
        let mut field = EnemyField::new(vec![EnemySeed::new(50, 50, 10.0)], ENEMY);
        assert!(field.check_captures(&canvas).is_empty());
        assert!(field.seeds()[0].active);
    }

    #[test]
    fn capture_is_one_way() {
        let mut canvas = test_canvas(100, 100);
        canvas.put(50, 50, PLAYER);
        let mut field = EnemyField::new(vec![EnemySeed::new(50, 50, 10.0)], ENEMY);
        field.check_captures(&canvas);
        assert!(!field.seeds()[0].active);

        // Ink removed, expansion run — the seed stays captured and inert.
        canvas.clear();
        let before = field.seeds()[0].radius;
        let mut anim = ExpansionAnimation::new(&field, 5.0, 0.0);
        anim.advance(1.0, &mut field, &mut canvas);
        assert!(!field.seeds()[0].active);
        assert_eq!(field.seeds()[0].radius, before);
        assert_eq!(canvas.count_pixels(ENEMY).enemy, 0);
    }

    #[test]
    fn shrink_clamps_to_nearest_ink() {
        let mut canvas = test_canvas(100, 100);
        for y in 0..100 {
            for x in 55..100 {
                canvas.put(x, y, PLAYER);
            }
        }
        let mut field = EnemyField::new(vec![EnemySeed::new(50, 50, 10.0)], ENEMY);
        field.shrink_on_collision(&canvas);
        assert!((field.seeds()[0].radius - 5.0).abs() < 1e-4);
    }

    #[test]
    fn shrink_never_increases_radius() {
        let canvas = test_canvas(100, 100); // no ink anywhere
        let mut field = EnemyField::new(vec![EnemySeed::new(50, 50, 10.0)], ENEMY);
        field.shrink_on_collision(&canvas);
        assert_eq!(field.seeds()[0].radius, 10.0);

        // Repeated shrinks against the same board are monotonic.
        let mut canvas = test_canvas(100, 100);
        canvas.put(53, 50, PLAYER);
        field.shrink_on_collision(&canvas);
        let first = field.seeds()[0].radius;
        field.shrink_on_collision(&canvas);
        assert!(field.seeds()[0].radius <= first);
    }

    #[test]
    fn expansion_eases_out_and_pins_final_radius() {
        let mut canvas = test_canvas(100, 100);
        let mut field = EnemyField::new(vec![EnemySeed::new(50, 50, 10.0)], ENEMY);
        let mut anim = ExpansionAnimation::new(&field, 6.0, 1.0);

        anim.advance(0.5, &mut field, &mut canvas);
        let mid = field.seeds()[0].radius;
        // Ease-out: more than half the growth lands in the first half.
        assert!(mid > 13.0 && mid < 16.0, "mid radius {}", mid);

        assert!(anim.advance(0.6, &mut field, &mut canvas));
        assert_eq!(field.seeds()[0].radius, 16.0);
        assert!(canvas.count_pixels(ENEMY).enemy > 0);
    }

    #[test]
    fn stamp_paints_inside_circles_only() {
        let mut canvas = test_canvas(60, 60);
        canvas.put(5, 5, PLAYER);
        let field = EnemyField::new(vec![EnemySeed::new(30, 30, 4.0)], ENEMY);
        field.stamp(&mut canvas);
        assert_eq!(canvas.get(30, 30), ENEMY);
        assert_eq!(canvas.get(30, 34), ENEMY);
        assert_eq!(canvas.get(30, 40)[3], 0);
        // Pixels outside the circle are untouched.
        assert_eq!(canvas.get(5, 5), PLAYER);
    }

    #[test]
    fn scatter_places_non_overlapping_seeds() {
        let mut rng = StdRng::seed_from_u64(42);
        let field = EnemyField::scatter(4, 8.0, 200, 200, ENEMY, &mut rng);
        assert_eq!(field.seeds().len(), 4);
        for (i, a) in field.seeds().iter().enumerate() {
            for b in &field.seeds()[i + 1..] {
                let dx = (a.position.0 - b.position.0) as f32;
                let dy = (a.position.1 - b.position.1) as f32;
                assert!((dx * dx + dy * dy).sqrt() > 16.0);
            }
            assert!(a.position.0 >= 10 && a.position.0 <= 190);
            assert!(a.position.1 >= 10 && a.position.1 <= 190);
        }
    }
}
