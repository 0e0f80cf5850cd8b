//! Level configuration — a plain immutable record consumed at session start.
//!
//! Every field has a sensible default so a config file only needs to name
//! the values it overrides. Loaded from JSON via [`LevelConfig::load`], or
//! built in code for tests.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Immutable per-level parameters for the painting engine.
///
/// Colors are RGBA byte arrays. Percentages are in `0.0..=100.0`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Display surface size in world units (points).
    pub display_width: u32,
    pub display_height: u32,
    /// Canvas resolution = display size × this factor, clamped to 0.1–1.0.
    pub canvas_scale: f32,

    /// Player territory percentage required to win.
    pub win_threshold: f32,
    /// Enemy territory percentage that loses the game.
    pub lose_threshold: f32,
    /// Turns available before the endgame evaluation.
    pub max_turns: u32,

    /// Number of enemy seeds scattered at level start.
    pub enemy_count: u32,
    /// Initial radius of each enemy seed, in canvas pixels.
    pub enemy_start_radius: f32,
    /// Radius gained by every active seed per enemy turn.
    pub enemy_expansion_per_turn: f32,
    /// Simulated enemy "thinking" pause before expansion, in seconds.
    pub enemy_thinking_delay: f32,

    /// Ink available per turn.
    pub max_ink: f32,
    /// Ink consumed per world unit of pointer travel.
    pub ink_consumption_rate: f32,

    /// Pixels over which fill alpha falls from full to zero.
    pub gradient_width: f32,
    /// Falloff exponent: 1.0 linear, >1 sharper, <1 softer.
    pub smoothness: f32,

    /// Duration of the sorted fill reveal, in seconds.
    pub fill_duration: f32,
    /// Duration of the eased enemy expansion, in seconds.
    pub expand_duration: f32,

    /// Player ink color.
    pub center_color: [u8; 4],
    /// Enemy ink color. Must differ from `center_color` in RGB.
    pub enemy_color: [u8; 4],

    /// Minimum distance a stroke must depart from its first point to count
    /// as a closed shape, in canvas pixels.
    pub closure_threshold: f32,
    /// Exponential smoothing factor applied to raw pointer samples, in (0, 1].
    pub stroke_smoothing: f32,
    /// Minimum spacing between accepted stroke samples, in canvas pixels.
    pub stroke_min_step: f32,

    /// Binary dilation passes applied before contour extraction.
    pub collider_dilation_passes: u32,

    /// RNG seed for seed scatter and full-canvas reveal shuffles.
    /// `None` draws entropy from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            display_width: 800,
            display_height: 600,
            canvas_scale: 0.5,
            win_threshold: 80.0,
            lose_threshold: 50.0,
            max_turns: 10,
            enemy_count: 3,
            enemy_start_radius: 12.0,
            enemy_expansion_per_turn: 6.0,
            enemy_thinking_delay: 0.6,
            max_ink: 1000.0,
            ink_consumption_rate: 1.0,
            gradient_width: 12.0,
            smoothness: 2.0,
            fill_duration: 0.8,
            expand_duration: 0.6,
            center_color: [40, 40, 160, 255],
            enemy_color: [200, 40, 40, 255],
            closure_threshold: 10.0,
            stroke_smoothing: 0.5,
            stroke_min_step: 2.0,
            collider_dilation_passes: 2,
            rng_seed: None,
        }
    }
}

impl LevelConfig {
    /// Load a config from a JSON file and clamp out-of-range values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let cfg: LevelConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(cfg.validated())
    }

    /// Clamp every field into its documented range.
    pub fn validated(mut self) -> Self {
        self.canvas_scale = self.canvas_scale.clamp(0.1, 1.0);
        self.win_threshold = self.win_threshold.clamp(0.0, 100.0);
        self.lose_threshold = self.lose_threshold.clamp(0.0, 100.0);
        self.gradient_width = self.gradient_width.max(1.0);
        self.smoothness = self.smoothness.max(0.01);
        self.stroke_smoothing = self.stroke_smoothing.clamp(0.01, 1.0);
        self.stroke_min_step = self.stroke_min_step.max(1.0);
        self.enemy_start_radius = self.enemy_start_radius.max(1.0);
        self.ink_consumption_rate = self.ink_consumption_rate.max(0.0);
        self
    }

    /// Canvas width in pixels (display size × scale factor, at least 1).
    pub fn canvas_width(&self) -> u32 {
        ((self.display_width as f32 * self.canvas_scale) as u32).max(1)
    }

    /// Canvas height in pixels (display size × scale factor, at least 1).
    pub fn canvas_height(&self) -> u32 {
        ((self.display_height as f32 * self.canvas_scale) as u32).max(1)
    }
}

/// Errors raised while loading a level config file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_range() {
        let cfg = LevelConfig::default().validated();
        assert!(cfg.canvas_scale >= 0.1 && cfg.canvas_scale <= 1.0);
        assert!(cfg.canvas_width() > 0 && cfg.canvas_height() > 0);
        assert_ne!(cfg.center_color, cfg.enemy_color);
    }

    #[test]
    fn validation_clamps_scale() {
        let cfg = LevelConfig {
            canvas_scale: 3.0,
            ..LevelConfig::default()
        }
        .validated();
        assert_eq!(cfg.canvas_scale, 1.0);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: LevelConfig = serde_json::from_str(r#"{"enemy_count": 7}"#).unwrap();
        assert_eq!(cfg.enemy_count, 7);
        assert_eq!(cfg.max_turns, LevelConfig::default().max_turns);
    }
}
