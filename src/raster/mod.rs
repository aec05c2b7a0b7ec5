// ============================================================================
// CPU RASTERIZERS — surface target, FFD fill, subdivision fill, overlays
// ============================================================================

pub mod ffd;
pub mod overlay;
pub mod subdivision;
pub mod surface;
