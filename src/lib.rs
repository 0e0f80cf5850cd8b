//! lassoink — the painting / territory-control engine of a turn-based
//! ink-lasso game.
//!
//! The player encloses regions of a shared RGBA canvas with a freehand loop;
//! the enclosed area fills with a distance-weighted soft gradient, revealed
//! pixel-by-pixel over a fixed duration. Enemy seeds expand circularly each
//! turn, shrink when their growth front hits player ink, and are captured
//! when the player paints over their center. Physics collision outlines are
//! re-derived from the canvas after every mutation.
//!
//! The crate is headless: it owns the pixel buffer and the numeric kernels
//! (scanline polygon fill, chamfer distance transform, gradient shading,
//! marching-squares contour extraction) and reports raw pixel counts to an
//! injected [`ProgressSink`](engine::ProgressSink). Rendering, menus and
//! audio live elsewhere.

pub mod canvas;
pub mod config;
pub mod engine;
pub mod logger;
pub mod ops;
pub mod stroke;

pub use canvas::{PixelCanvas, PixelCounts, PixelTransform};
pub use config::LevelConfig;
pub use engine::{GameEngine, GameEvent, GameOutcome, ProgressSink};
pub use stroke::{StrokePath, StrokeSampler};
