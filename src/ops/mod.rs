// ============================================================================
// RASTER KERNELS — the per-stroke / per-turn pixel pipeline
// ============================================================================

pub mod collider;
pub mod distance_field;
pub mod enemy;
pub mod gradient;
pub mod reveal;
