// ============================================================================
// FRAME ORCHESTRATOR — one render call: mesh state in, pixels out
// ============================================================================
//
// A frame is a discrete unit of work: optionally animate the control
// points, map them into device pixels, group them into curves, assemble
// the Coons patches, hand them to the selected engine, then draw the
// overlays. Control state only changes between frames, so nothing here
// locks. A failed frame leaves the caller's previous pixels untouched
// apart from the clear the caller chose to do.

use serde::{Deserialize, Serialize};

use crate::gpu::{GpuError, SubdivisionRenderer};
use crate::mesh::color::ColorModel;
use crate::mesh::geometry::Vec2;
use crate::mesh::grid::MeshState;
use crate::mesh::patch::{MAX_SUBDIVISION_DEPTH, MeshError};
use crate::raster::ffd::render_tensor_patch;
use crate::raster::overlay::{draw_bezier_curves, draw_control_points};
use crate::raster::subdivision::{collect_sorted_leaves, render_coons_patch, render_leaves, tensor_entries};
use crate::raster::surface::Surface;

/// Which rasterizer fills the gradient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Engine {
    /// CPU: recursive Coons subdivision, flat leaf quads.
    Coons,
    /// CPU: forward-differencing scanline fill of tensor patches.
    Ffd,
    /// Quad-tree subdivision, GPU when available.
    Subdivision,
}

impl Engine {
    pub fn all() -> &'static [Engine] {
        &[Engine::Coons, Engine::Ffd, Engine::Subdivision]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Engine::Coons => "Coons (CPU)",
            Engine::Ffd => "FFD (CPU)",
            Engine::Subdivision => "Subdivision",
        }
    }

    pub fn parse(s: &str) -> Result<Engine, String> {
        match s.to_ascii_lowercase().as_str() {
            "coons" => Ok(Engine::Coons),
            "ffd" => Ok(Engine::Ffd),
            "subdivision" | "subdiv" => Ok(Engine::Subdivision),
            other => Err(format!(
                "unknown engine '{}' (expected coons, ffd, or subdivision)",
                other
            )),
        }
    }
}

/// Everything the UI can tweak between frames.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ControlState {
    pub color_model: ColorModel,
    pub engine: Engine,
    /// Quad-tree levels for the subdivision engine, 0..=8.
    pub subdivision_depth: u32,
    /// Retro mode: one flat UV per leaf instead of the smoothed blend.
    pub use_simple_uv: bool,
    pub show_control_points: bool,
    pub show_bezier_curves: bool,
    pub animate: bool,
    /// Time multiplier, 0.1..=5.
    pub animation_speed: f64,
    /// Drift amplitude in canvas units, 1..=15.
    pub animation_amplitude: f64,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            color_model: ColorModel::Rgba,
            engine: Engine::Subdivision,
            subdivision_depth: 4,
            use_simple_uv: false,
            show_control_points: true,
            show_bezier_curves: true,
            animate: false,
            animation_speed: 1.0,
            animation_amplitude: 5.0,
        }
    }
}

impl ControlState {
    /// Clamp every field into its documented range.
    pub fn sanitize(&mut self) {
        self.subdivision_depth = self.subdivision_depth.min(MAX_SUBDIVISION_DEPTH);
        self.animation_speed = self.animation_speed.clamp(0.1, 5.0);
        self.animation_amplitude = self.animation_amplitude.clamp(1.0, 15.0);
    }
}

/// Why a frame failed. The frame loop logs it and keeps the previous
/// framebuffer on screen.
#[derive(Clone, Debug)]
pub enum RenderError {
    Mesh(MeshError),
    Gpu(GpuError),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Mesh(e) => write!(f, "mesh error: {}", e),
            RenderError::Gpu(e) => write!(f, "gpu error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<MeshError> for RenderError {
    fn from(e: MeshError) -> Self {
        RenderError::Mesh(e)
    }
}

impl From<GpuError> for RenderError {
    fn from(e: GpuError) -> Self {
        RenderError::Gpu(e)
    }
}

/// Render one frame of the mesh into the surface.
///
/// `time` is the animation clock in seconds; it is ignored unless
/// `state.animate` is set. `gpu` selects the GPU subdivision path when
/// present; without it the subdivision engine runs its CPU fallback.
pub fn render_frame(
    mesh: &MeshState,
    state: &ControlState,
    time: f64,
    surface: &mut Surface,
    gpu: Option<&mut SubdivisionRenderer>,
) -> Result<(), RenderError> {
    let points = if state.animate {
        mesh.animated_points(time * state.animation_speed, state.animation_amplitude)
    } else {
        mesh.points.clone()
    };
    let points_px: Vec<Vec2> = points.iter().map(|&p| surface.map_point(p)).collect();

    let row_curves = mesh.row_curves(&points_px);
    let column_curves = mesh.column_curves(&points_px);
    let entries = mesh.assemble_patches(&row_curves, &column_curves, state.color_model)?;

    match state.engine {
        Engine::Coons => {
            for entry in &entries {
                render_coons_patch(&entry.patch, surface);
            }
        }
        Engine::Ffd => {
            for entry in &entries {
                render_tensor_patch(&entry.patch.to_tensor(), surface);
            }
        }
        Engine::Subdivision => {
            let tensors = tensor_entries(&entries);
            let leaves = collect_sorted_leaves(&tensors, state.subdivision_depth);
            let grid_colors = mesh.colors_in_model(state.color_model);
            match gpu {
                Some(renderer) => {
                    let bytes = renderer.render(
                        &leaves,
                        &grid_colors,
                        mesh.cols(),
                        mesh.rows(),
                        state.color_model,
                        state.use_simple_uv,
                        surface.width(),
                        surface.height(),
                    )?;
                    if bytes.len() == surface.width() as usize * surface.height() as usize * 4 {
                        surface.blit_rgba8(&bytes);
                    }
                }
                None => {
                    render_leaves(
                        &leaves,
                        &grid_colors,
                        mesh.cols(),
                        state.use_simple_uv,
                        surface,
                    );
                }
            }
        }
    }
    surface.finish();

    if state.show_bezier_curves {
        draw_bezier_curves(&row_curves, surface);
        draw_bezier_curves(&column_curves, surface);
    }
    if state.show_control_points {
        draw_control_points(&points_px, surface);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::surface::Margins;

    #[test]
    fn control_state_sanitize_clamps() {
        let mut state = ControlState {
            subdivision_depth: 99,
            animation_speed: 0.0,
            animation_amplitude: 100.0,
            ..ControlState::default()
        };
        state.sanitize();
        assert_eq!(state.subdivision_depth, 8);
        assert_eq!(state.animation_speed, 0.1);
        assert_eq!(state.animation_amplitude, 15.0);
    }

    #[test]
    fn engine_parse() {
        assert_eq!(Engine::parse("ffd"), Ok(Engine::Ffd));
        assert_eq!(Engine::parse("Subdivision"), Ok(Engine::Subdivision));
        assert!(Engine::parse("raytrace").is_err());
    }

    #[test]
    fn frame_renders_default_mesh_on_every_engine() {
        let mesh = MeshState::with_default_geometry(2, 2);
        for engine in Engine::all() {
            let state = ControlState { engine: *engine, ..ControlState::default() };
            let mut buf = vec![0u8; 160 * 120 * 4];
            let mut surface =
                Surface::new(&mut buf, 160, 120, state.color_model, Margins::default());
            surface.fill([255, 255, 255, 255]);
            render_frame(&mesh, &state, 0.0, &mut surface, None).unwrap();
            // the gradient must have produced non-background pixels
            assert!(buf.chunks_exact(4).any(|px| px != [255, 255, 255, 255]));
        }
    }

    #[test]
    fn animated_frame_is_deterministic() {
        let mesh = MeshState::with_default_geometry(1, 1);
        let state = ControlState {
            engine: Engine::Ffd,
            animate: true,
            show_control_points: false,
            show_bezier_curves: false,
            ..ControlState::default()
        };
        let render = || {
            let mut buf = vec![0u8; 80 * 60 * 4];
            let mut surface =
                Surface::new(&mut buf, 80, 60, state.color_model, Margins::default());
            render_frame(&mesh, &state, 2.5, &mut surface, None).unwrap();
            buf
        };
        assert_eq!(render(), render());
    }
}
