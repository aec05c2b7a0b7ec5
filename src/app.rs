// ============================================================================
// GradientFE APP — egui editor around the render core
// ============================================================================
//
// The editor owns the mesh state and a CPU pixel buffer. Every frame it
// renders the mesh into a scratch buffer (GPU subdivision when a device
// exists, CPU otherwise), swaps it in on success, and shows it as one
// egui texture. Control points drag with the mouse; everything else lives
// in the side panel. A failed frame keeps the previous image on screen.

use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, Sense, TextureHandle, TextureOptions};

use crate::gpu::{GpuContext, SubdivisionRenderer};
use crate::mesh::color::rgba_to_hex;
use crate::mesh::geometry::Vec2;
use crate::mesh::grid::MeshState;
use crate::raster::overlay::CONTROL_POINT_RADIUS;
use crate::raster::surface::{Margins, Surface};
use crate::render::{ControlState, Engine, render_frame};
use crate::{log_err, log_info, log_warn};

/// Extra pixels around a control point that still count as a hit.
const HIT_SLOP: f64 = 3.0;

pub struct GradientFEApp {
    mesh: MeshState,
    control: ControlState,
    gpu: Option<SubdivisionRenderer>,

    pixels: Vec<u8>,
    scratch: Vec<u8>,
    canvas_w: u32,
    canvas_h: u32,
    texture: Option<TextureHandle>,

    /// Index of the control point being dragged.
    dragging: Option<usize>,
    /// Pending grid shape from the sliders; applied on change.
    grid_rows: usize,
    grid_cols: usize,

    last_error: Option<String>,
}

impl GradientFEApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let gpu = match GpuContext::new() {
            Some(ctx) => {
                let name = ctx.adapter_name.clone();
                match SubdivisionRenderer::new(ctx) {
                    Ok(renderer) => {
                        log_info!("GPU subdivision renderer on '{}'", name);
                        Some(renderer)
                    }
                    Err(e) => {
                        log_err!("GPU pipeline unavailable ({}), using CPU fallback", e);
                        None
                    }
                }
            }
            None => {
                log_warn!("no GPU adapter, subdivision engine runs on CPU");
                None
            }
        };

        Self {
            mesh: MeshState::with_default_geometry(2, 2),
            control: ControlState::default(),
            gpu,
            pixels: Vec::new(),
            scratch: Vec::new(),
            canvas_w: 0,
            canvas_h: 0,
            texture: None,
            dragging: None,
            grid_rows: 2,
            grid_cols: 2,
            last_error: None,
        }
    }

    // ========================================================================
    // SIDE PANEL
    // ========================================================================

    fn controls_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Mesh");
        let mut reshaped = false;
        reshaped |= ui
            .add(egui::Slider::new(&mut self.grid_rows, 1..=4).text("Rows"))
            .changed();
        reshaped |= ui
            .add(egui::Slider::new(&mut self.grid_cols, 1..=4).text("Columns"))
            .changed();
        if reshaped {
            // Reshaping regenerates geometry; colors don't transfer between
            // grid sizes.
            self.mesh = MeshState::with_default_geometry(self.grid_rows, self.grid_cols);
            self.dragging = None;
        }

        ui.separator();
        ui.heading("Rendering");

        egui::ComboBox::from_label("Engine")
            .selected_text(self.control.engine.label())
            .show_ui(ui, |ui| {
                for engine in Engine::all() {
                    ui.selectable_value(&mut self.control.engine, *engine, engine.label());
                }
            });

        egui::ComboBox::from_label("Color model")
            .selected_text(self.control.color_model.label())
            .show_ui(ui, |ui| {
                for model in crate::mesh::color::ColorModel::all() {
                    ui.selectable_value(&mut self.control.color_model, *model, model.label());
                }
            });

        let subdivision = self.control.engine == Engine::Subdivision;
        ui.add_enabled(
            subdivision,
            egui::Slider::new(&mut self.control.subdivision_depth, 0..=8).text("Depth"),
        );
        ui.add_enabled_ui(subdivision, |ui| {
            ui.checkbox(&mut self.control.use_simple_uv, "Simple UV (retro)");
        });

        ui.checkbox(&mut self.control.show_control_points, "Show control points");
        ui.checkbox(&mut self.control.show_bezier_curves, "Show curves");

        ui.separator();
        ui.heading("Animation");
        ui.checkbox(&mut self.control.animate, "Animate");
        ui.add_enabled(
            self.control.animate,
            egui::Slider::new(&mut self.control.animation_speed, 0.1..=5.0).text("Speed"),
        );
        ui.add_enabled(
            self.control.animate,
            egui::Slider::new(&mut self.control.animation_amplitude, 1.0..=15.0).text("Amplitude"),
        );

        ui.separator();
        ui.heading("Vertex colors");
        self.vertex_colors_ui(ui);

        ui.separator();
        if ui.button("Export PNG…").clicked() {
            self.export_png();
        }
        ui.horizontal(|ui| {
            if ui.button("Save project…").clicked() {
                self.save_project();
            }
            if ui.button("Load project…").clicked() {
                self.load_project();
            }
        });

        ui.separator();
        match &self.gpu {
            Some(renderer) => {
                ui.label(format!("GPU: {}", renderer.adapter_name()));
            }
            None => {
                ui.label("GPU: unavailable (CPU fallback)");
            }
        }
        if let Some(err) = &self.last_error {
            ui.colored_label(Color32::from_rgb(220, 80, 80), err);
        }
    }

    /// One color button per grid vertex, laid out like the grid.
    fn vertex_colors_ui(&mut self, ui: &mut egui::Ui) {
        let cols = self.mesh.cols();
        for i in 0..=self.mesh.rows() {
            ui.horizontal(|ui| {
                for j in 0..=cols {
                    let idx = i * (cols + 1) + j;
                    let c = self.mesh.colors[idx];
                    let mut color = Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]);
                    if ui.color_edit_button_srgba(&mut color).changed() {
                        self.mesh.colors[idx] = color.to_array();
                    }
                }
            });
        }
        if let Some(c) = self.mesh.colors.first() {
            // quick reference for the hovered model
            let model = self.control.color_model;
            ui.label(format!(
                "vertex 0: {}  ({})",
                rgba_to_hex(*c),
                model.css_string(model.from_rgba8(*c))
            ));
        }
    }

    // ========================================================================
    // CANVAS
    // ========================================================================

    fn canvas_ui(&mut self, ui: &mut egui::Ui) {
        let avail = ui.available_size();
        let w = (avail.x.floor() as u32).max(64);
        let h = (avail.y.floor() as u32).max(64);
        if (w, h) != (self.canvas_w, self.canvas_h) {
            self.canvas_w = w;
            self.canvas_h = h;
            self.pixels = vec![255; (w * h * 4) as usize];
            self.scratch = vec![255; (w * h * 4) as usize];
        }

        let time = ui.input(|i| i.time);
        self.render_into_scratch(time);

        let image = ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &self.pixels);
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::NEAREST),
            None => {
                self.texture =
                    Some(ui.ctx().load_texture("canvas", image, TextureOptions::NEAREST));
            }
        }

        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(w as f32, h as f32), Sense::click_and_drag());
        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        self.handle_drag(&response, rect);
    }

    fn render_into_scratch(&mut self, time: f64) {
        self.control.sanitize();
        self.scratch.fill(255);
        let mut surface = Surface::new(
            &mut self.scratch,
            self.canvas_w,
            self.canvas_h,
            self.control.color_model,
            Margins::default(),
        );
        match render_frame(&self.mesh, &self.control, time, &mut surface, self.gpu.as_mut()) {
            Ok(()) => {
                std::mem::swap(&mut self.pixels, &mut self.scratch);
                self.last_error = None;
            }
            Err(e) => {
                // keep the previous framebuffer on screen
                let msg = e.to_string();
                log_err!("frame failed: {}", msg);
                self.last_error = Some(msg);
            }
        }
    }

    fn handle_drag(&mut self, response: &egui::Response, rect: Rect) {
        let to_canvas = |pos: Pos2| {
            Vec2::new(
                (pos.x - rect.min.x) as f64 / rect.width() as f64 * 100.0,
                (pos.y - rect.min.y) as f64 / rect.height() as f64 * 100.0,
            )
        };
        let to_screen = |p: Vec2| {
            Pos2::new(
                rect.min.x + (p.x / 100.0 * rect.width() as f64) as f32,
                rect.min.y + (p.y / 100.0 * rect.height() as f64) as f32,
            )
        };

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                let radius = CONTROL_POINT_RADIUS + HIT_SLOP;
                self.dragging = self
                    .mesh
                    .points
                    .iter()
                    .position(|&p| {
                        let sp = to_screen(p);
                        ((sp.x - pos.x) as f64).hypot((sp.y - pos.y) as f64) <= radius
                    });
            }
        }
        if response.dragged()
            && let Some(idx) = self.dragging
            && let Some(pos) = response.interact_pointer_pos()
        {
            let p = to_canvas(pos);
            self.mesh.points[idx] = Vec2::new(p.x.clamp(0.0, 100.0), p.y.clamp(0.0, 100.0));
        }
        if response.drag_released() {
            self.dragging = None;
        }
    }

    // ========================================================================
    // FILE ACTIONS
    // ========================================================================

    fn export_png(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name("gradient.png")
            .save_file()
        else {
            return;
        };
        match image::RgbaImage::from_raw(self.canvas_w, self.canvas_h, self.pixels.clone()) {
            Some(img) => {
                if let Err(e) = img.save(&path) {
                    self.last_error = Some(format!("export failed: {}", e));
                    log_err!("export to {:?} failed: {}", path, e);
                } else {
                    log_info!("exported canvas to {:?}", path);
                }
            }
            None => {
                self.last_error = Some("export failed: no rendered frame".into());
            }
        }
    }

    fn save_project(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("GradientFE project", &["gfe"])
            .set_file_name("mesh.gfe")
            .save_file()
        else {
            return;
        };
        if let Err(e) = crate::project::save_gfe(&self.mesh, &self.control, &path) {
            self.last_error = Some(format!("save failed: {}", e));
            log_err!("project save to {:?} failed: {}", path, e);
        } else {
            log_info!("saved project to {:?}", path);
        }
    }

    fn load_project(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("GradientFE project", &["gfe"])
            .pick_file()
        else {
            return;
        };
        match crate::project::load_gfe(&path) {
            Ok((mesh, control)) => {
                self.grid_rows = mesh.rows();
                self.grid_cols = mesh.cols();
                self.mesh = mesh;
                self.control = control;
                self.dragging = None;
                log_info!("loaded project from {:?}", path);
            }
            Err(e) => {
                self.last_error = Some(format!("load failed: {}", e));
                log_err!("project load from {:?} failed: {}", path, e);
            }
        }
    }
}

impl eframe::App for GradientFEApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::right("controls")
            .min_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.controls_ui(ui));
            });
        egui::CentralPanel::default().show(ctx, |ui| self.canvas_ui(ui));

        // one frame per display tick while animating
        if self.control.animate {
            ctx.request_repaint();
        }
    }
}
