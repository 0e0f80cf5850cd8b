// ============================================================================
// GAME ENGINE — pipeline orchestration, turn flow, ink budget
// ============================================================================
//
// The per-stroke and per-turn pipelines are explicit state machines driven
// by `advance(dt)`, so the same logic runs under a real frame loop or a
// synchronous test harness. Only one pipeline is ever in flight per canvas:
// stroke and turn requests made while an animation runs are silently
// ignored, never queued. External readers (pixel counts, colliders) are
// refreshed only between completed operations, never mid-animation.

use image::Rgba;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::canvas::{PixelCanvas, PixelCounts, PixelTransform};
use crate::config::LevelConfig;
use crate::ops::collider::{self, ColliderShape};
use crate::ops::distance_field::build_stroke_field;
use crate::ops::enemy::{EnemyField, ExpansionAnimation};
use crate::ops::gradient;
use crate::ops::reveal::{RevealAnimation, RevealPlan};
use crate::stroke::StrokeSampler;

/// Receives raw pixel counts after every completed fill/expand/capture
/// operation. Implemented by the turn/win-loss rule orchestrator; the
/// engine never surfaces errors through this interface, only counts.
pub trait ProgressSink {
    fn report_progress(&mut self, total_pixels: usize, filled_pixels: usize, enemy_pixels: usize);
}

/// Terminal result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    Won,
    Lost,
}

/// Signals exposed to the UI / orchestrator, drained via
/// [`GameEngine::take_events`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    TurnStarted(u32),
    SeedCaptured(usize),
    AllSeedsCaptured,
    Won,
    Lost,
}

/// Current stage of the single in-flight pipeline.
enum Phase {
    Idle,
    StrokeFill(RevealAnimation),
    EnemyThinking { remaining: f32 },
    EnemyExpand(ExpansionAnimation),
    VictoryFill(RevealAnimation),
    Finished(GameOutcome),
}

/// The painting/territory-control engine for one level session.
///
/// Owns the canvas and the enemy field for the session lifetime; the
/// progress sink is injected at construction. Pointer input arrives in
/// world coordinates and is mapped through the canvas transform.
pub struct GameEngine {
    config: LevelConfig,
    canvas: PixelCanvas,
    enemies: EnemyField,
    sink: Box<dyn ProgressSink>,
    rng: StdRng,
    phase: Phase,
    sampler: Option<StrokeSampler>,
    colliders: Vec<ColliderShape>,
    events: Vec<GameEvent>,
    ink: f32,
    turn: u32,
}

impl GameEngine {
    pub fn new(config: LevelConfig, sink: Box<dyn ProgressSink>) -> Self {
        let config = config.validated();
        let w = config.canvas_width();
        let h = config.canvas_height();
        let transform = PixelTransform::new(1.0 / config.canvas_scale);
        let canvas = PixelCanvas::new(w, h, transform);

        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let enemies = EnemyField::scatter(
            config.enemy_count,
            config.enemy_start_radius,
            w,
            h,
            Rgba(config.enemy_color),
            &mut rng,
        );

        let mut engine = Self {
            ink: config.max_ink,
            config,
            canvas,
            enemies,
            sink,
            rng,
            phase: Phase::Idle,
            sampler: None,
            colliders: Vec::new(),
            events: Vec::new(),
            turn: 1,
        };
        engine.enemies.stamp(&mut engine.canvas);
        engine.refresh_board_state();
        engine.events.push(GameEvent::TurnStarted(1));
        crate::log_info!(
            "session start: {}x{} canvas, {} enemy seeds",
            engine.canvas.width(),
            engine.canvas.height(),
            engine.enemies.seeds().len()
        );
        engine
    }

    // ---- read access ---------------------------------------------------

    pub fn canvas(&self) -> &PixelCanvas {
        &self.canvas
    }

    pub fn enemies(&self) -> &EnemyField {
        &self.enemies
    }

    /// Collision outlines as of the last completed operation.
    pub fn colliders(&self) -> &[ColliderShape] {
        &self.colliders
    }

    pub fn ink(&self) -> f32 {
        self.ink
    }

    pub fn max_ink(&self) -> f32 {
        self.config.max_ink
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// True while a fill or expansion animation is in flight. New strokes
    /// and turn transitions are rejected while busy.
    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Finished(_))
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.phase {
            Phase::Finished(o) => Some(o),
            _ => None,
        }
    }

    /// Drain pending event signals in emission order.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- stroke input (world coordinates) ------------------------------

    /// Start capturing a stroke. Silently ignored while an animation is in
    /// flight or after the game has finished.
    pub fn begin_stroke(&mut self, wx: f32, wy: f32) {
        if !matches!(self.phase, Phase::Idle) {
            crate::log_info!("stroke ignored: engine busy");
            return;
        }
        let mut sampler = StrokeSampler::new(
            self.config.stroke_smoothing,
            self.config.stroke_min_step,
        );
        let (px, py) = self.canvas.transform().to_pixel(wx, wy);
        sampler.push(px, py);
        self.sampler = Some(sampler);
    }

    /// Feed pointer motion. Returns false when the stroke was force-ended
    /// because the ink budget ran out (the turn then auto-advances through
    /// the usual fill pipeline).
    pub fn stroke_to(&mut self, wx: f32, wy: f32) -> bool {
        let Some(sampler) = self.sampler.as_mut() else {
            return false;
        };
        let (px, py) = self.canvas.transform().to_pixel(wx, wy);
        let cost = sampler.pending_step(px, py) * self.config.ink_consumption_rate;
        if cost > self.ink {
            // Out of ink: keep the last affordable point and submit.
            crate::log_info!("ink exhausted mid-stroke, force-ending");
            self.ink = 0.0;
            self.end_stroke();
            return false;
        }
        self.ink -= cost;
        sampler.push(px, py);
        true
    }

    /// Finish the stroke and, if it forms a valid closed shape, run the
    /// fill pipeline: distance field → gradient shading → sorted reveal.
    /// Invalid shapes are silently discarded.
    pub fn end_stroke(&mut self) {
        let Some(sampler) = self.sampler.take() else {
            return;
        };
        let path = sampler.finish();
        if !path.is_valid_shape(self.config.closure_threshold) {
            crate::log_info!("stroke discarded: {} points, not a closed shape", path.points.len());
            return;
        }

        // Backup snapshot seeds the field from the pre-stroke board.
        let snapshot = self.canvas.snapshot();
        let grid = build_stroke_field(
            &snapshot,
            &path,
            self.config.gradient_width,
            Rgba(self.config.enemy_color),
        );
        let shaded = gradient::shade(
            &grid,
            self.config.gradient_width,
            self.config.smoothness,
            Rgba(self.config.center_color),
        );
        let plan = RevealPlan::from_shaded(&shaded, &grid, self.canvas.pixels());
        crate::log_info!("stroke fill: {} pixels queued", plan.len());
        self.phase = Phase::StrokeFill(RevealAnimation::new(plan, self.config.fill_duration));
    }

    // ---- frame drive ---------------------------------------------------

    /// Advance the in-flight pipeline by `dt` seconds. A no-op while idle
    /// or finished.
    pub fn advance(&mut self, dt: f32) {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => {}
            Phase::Finished(o) => self.phase = Phase::Finished(o),
            Phase::StrokeFill(mut anim) => {
                if anim.advance(dt, &mut self.canvas) {
                    self.after_player_fill();
                } else {
                    self.phase = Phase::StrokeFill(anim);
                }
            }
            Phase::EnemyThinking { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.run_enemy_turn();
                } else {
                    self.phase = Phase::EnemyThinking { remaining };
                }
            }
            Phase::EnemyExpand(mut anim) => {
                if anim.advance(dt, &mut self.enemies, &mut self.canvas) {
                    self.after_enemy_turn();
                } else {
                    self.phase = Phase::EnemyExpand(anim);
                }
            }
            Phase::VictoryFill(mut anim) => {
                if anim.advance(dt, &mut self.canvas) {
                    self.refresh_board_state();
                    self.finish(GameOutcome::Won);
                } else {
                    self.phase = Phase::VictoryFill(anim);
                }
            }
        }
    }

    // ---- pipeline tails ------------------------------------------------

    /// Recompute colliders and counts from the settled canvas and report.
    /// Only called between completed operations.
    fn refresh_board_state(&mut self) -> PixelCounts {
        let enemy_color = Rgba(self.config.enemy_color);
        self.colliders = collider::extract_colliders(
            &self.canvas,
            enemy_color,
            self.config.collider_dilation_passes,
        );
        let counts = self.canvas.count_pixels(enemy_color);
        self.sink
            .report_progress(counts.total, counts.player, counts.enemy);
        counts
    }

    fn after_player_fill(&mut self) {
        let counts = self.refresh_board_state();
        if counts.player_percent() >= self.config.win_threshold {
            self.finish(GameOutcome::Won);
            return;
        }
        self.phase = Phase::EnemyThinking {
            remaining: self.config.enemy_thinking_delay,
        };
    }

    /// The enemy turn body: captures, then collision shrink, then expansion.
    /// Capturing the last seed triggers the full-canvas victory fill instead
    /// of an expansion.
    fn run_enemy_turn(&mut self) {
        for idx in self.enemies.check_captures(&self.canvas) {
            self.events.push(GameEvent::SeedCaptured(idx));
        }

        if !self.enemies.seeds().is_empty() && self.enemies.all_captured() {
            self.events.push(GameEvent::AllSeedsCaptured);
            let plan = RevealPlan::full_canvas(
                self.canvas.pixels(),
                Rgba(self.config.center_color),
                &mut self.rng,
            );
            crate::log_info!("all seeds captured: victory fill of {} pixels", plan.len());
            self.phase = Phase::VictoryFill(RevealAnimation::new(plan, self.config.fill_duration));
            return;
        }

        self.enemies.shrink_on_collision(&self.canvas);
        self.phase = Phase::EnemyExpand(ExpansionAnimation::new(
            &self.enemies,
            self.config.enemy_expansion_per_turn,
            self.config.expand_duration,
        ));
    }

    fn after_enemy_turn(&mut self) {
        let counts = self.refresh_board_state();
        if counts.enemy_percent() >= self.config.lose_threshold {
            self.finish(GameOutcome::Lost);
            return;
        }
        if self.turn >= self.config.max_turns {
            // Out of turns: the endgame evaluation applies the win threshold.
            let outcome = if counts.player_percent() >= self.config.win_threshold {
                GameOutcome::Won
            } else {
                GameOutcome::Lost
            };
            self.finish(outcome);
            return;
        }
        self.turn += 1;
        self.ink = self.config.max_ink;
        self.events.push(GameEvent::TurnStarted(self.turn));
        self.phase = Phase::Idle;
    }

    fn finish(&mut self, outcome: GameOutcome) {
        crate::log_info!("session finished: {:?} on turn {}", outcome, self.turn);
        self.events.push(match outcome {
            GameOutcome::Won => GameEvent::Won,
            GameOutcome::Lost => GameEvent::Lost,
        });
        self.phase = Phase::Finished(outcome);
    }
}
