// ============================================================================
// STROKE CAPTURE — smoothed pointer sampling and shape validity
// ============================================================================

/// Minimum number of accepted samples for a stroke to count as a shape.
pub const MIN_STROKE_POINTS: usize = 5;

/// An ordered sequence of 2D points in canvas pixel space, produced by
/// sampling smoothed pointer motion. Treated as a closed polygon by the
/// scanline fill (last point connects back to the first).
#[derive(Clone, Debug)]
pub struct StrokePath {
    pub points: Vec<(f32, f32)>,
    /// Total pointer travel accumulated while drawing, in canvas pixels.
    pub distance_moved: f32,
}

impl StrokePath {
    /// A stroke is a valid fill shape when it has enough samples and at
    /// least one point departs from the start by more than
    /// `closure_threshold`. Invalid strokes are silently discarded.
    pub fn is_valid_shape(&self, closure_threshold: f32) -> bool {
        if self.points.len() < MIN_STROKE_POINTS {
            return false;
        }
        let (x0, y0) = self.points[0];
        self.points.iter().any(|&(x, y)| {
            let dx = x - x0;
            let dy = y - y0;
            (dx * dx + dy * dy).sqrt() > closure_threshold
        })
    }

    /// Ink consumed by this stroke: pointer travel × consumption rate.
    pub fn ink_cost(&self, consumption_rate: f32) -> f32 {
        self.distance_moved * consumption_rate
    }
}

/// Accumulates raw pointer samples into a [`StrokePath`].
///
/// Raw positions are run through an exponential moving average (factor in
/// (0, 1]; 1.0 disables smoothing) and resampled so consecutive accepted
/// points are at least `min_step` pixels apart. `distance_moved` tracks the
/// raw (pre-smoothing) travel, which is what ink consumption charges for.
#[derive(Clone, Debug)]
pub struct StrokeSampler {
    smoothing: f32,
    min_step: f32,
    smoothed: Option<(f32, f32)>,
    last_raw: Option<(f32, f32)>,
    points: Vec<(f32, f32)>,
    distance_moved: f32,
}

impl StrokeSampler {
    pub fn new(smoothing: f32, min_step: f32) -> Self {
        Self {
            smoothing: smoothing.clamp(0.01, 1.0),
            min_step: min_step.max(1.0),
            smoothed: None,
            last_raw: None,
            points: Vec::new(),
            distance_moved: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn distance_moved(&self) -> f32 {
        self.distance_moved
    }

    /// Raw distance from the last fed sample to `(x, y)`, without feeding
    /// it. Lets the caller price a sample before accepting it.
    pub fn pending_step(&self, x: f32, y: f32) -> f32 {
        match self.last_raw {
            Some((lx, ly)) => {
                let dx = x - lx;
                let dy = y - ly;
                (dx * dx + dy * dy).sqrt()
            }
            None => 0.0,
        }
    }

    /// Feed one raw pointer position in canvas pixel coordinates.
    ///
    /// Returns the raw distance travelled since the previous sample, so the
    /// caller can charge ink incrementally and force-end the stroke when the
    /// budget runs out.
    pub fn push(&mut self, x: f32, y: f32) -> f32 {
        let step = match self.last_raw {
            Some((lx, ly)) => {
                let dx = x - lx;
                let dy = y - ly;
                (dx * dx + dy * dy).sqrt()
            }
            None => 0.0,
        };
        self.last_raw = Some((x, y));
        self.distance_moved += step;

        let (sx, sy) = match self.smoothed {
            Some((px, py)) => (
                px + (x - px) * self.smoothing,
                py + (y - py) * self.smoothing,
            ),
            None => (x, y),
        };
        self.smoothed = Some((sx, sy));

        let accept = match self.points.last() {
            Some(&(ax, ay)) => {
                let dx = sx - ax;
                let dy = sy - ay;
                dx * dx + dy * dy >= self.min_step * self.min_step
            }
            None => true,
        };
        if accept {
            self.points.push((sx, sy));
        }
        step
    }

    /// Finish the stroke, consuming the sampler.
    pub fn finish(self) -> StrokePath {
        StrokePath {
            points: self.points,
            distance_moved: self.distance_moved,
        }
    }
}
