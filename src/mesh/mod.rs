// ============================================================================
// MESH CORE — geometry, color, and patch math shared by every renderer
// ============================================================================

pub mod bezier;
pub mod color;
pub mod ffd;
pub mod geometry;
pub mod grid;
pub mod patch;
