// ============================================================================
// GradientFE CLI — headless rendering via command-line arguments
// ============================================================================
//
// Usage examples:
//   gradientfe --output out.png
//   gradientfe -o out.png --rows 3 --cols 3 --engine subdivision --depth 6
//   gradientfe -o out.png --colors "#ff0000,#00ff00,#0000ff,#ff00ff"
//   gradientfe -o out.png --project mesh.gfe --model oklab
//
// No GUI is opened in CLI mode. Rendering runs synchronously on the
// current thread using the CPU engines only (no wgpu).

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::mesh::color::{ColorModel, hex_to_rgba};
use crate::mesh::grid::MeshState;
use crate::project::load_gfe;
use crate::render::{ControlState, Engine, render_frame};
use crate::raster::surface::{Margins, Surface};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// GradientFE headless mesh-gradient renderer.
///
/// Render a patch-grid gradient straight to a PNG — no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "gradientfe",
    about = "GradientFE headless mesh-gradient renderer",
    long_about = "Render a mesh gradient to a PNG without opening the editor.\n\n\
                  Example:\n  \
                  gradientfe --output out.png --rows 2 --cols 2 --engine ffd\n  \
                  gradientfe -o out.png --project mesh.gfe --model oklab --depth 6"
)]
pub struct CliArgs {
    /// Output PNG file path.
    #[arg(short, long, value_name = "FILE.png")]
    pub output: PathBuf,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Patch grid rows (1–4). Ignored with --project.
    #[arg(long, default_value_t = 2)]
    pub rows: usize,

    /// Patch grid columns (1–4). Ignored with --project.
    #[arg(long, default_value_t = 2)]
    pub cols: usize,

    /// Rasterizer: coons, ffd, or subdivision (CPU fallback path).
    #[arg(short, long, default_value = "ffd")]
    pub engine: String,

    /// Interpolation space: rgba, hsla, or oklab.
    #[arg(short, long, default_value = "rgba")]
    pub model: String,

    /// Subdivision depth 0–8 (subdivision engine only).
    #[arg(short, long, default_value_t = 4)]
    pub depth: u32,

    /// Flat per-leaf UVs — the retro faceted look.
    #[arg(long)]
    pub simple_uv: bool,

    /// Comma-separated #rrggbb grid-vertex colors in row-major order,
    /// (rows+1)·(cols+1) entries. Defaults to a hue ramp.
    #[arg(long, value_name = "HEX,HEX,…")]
    pub colors: Option<String>,

    /// Load mesh and settings from a .gfe project instead of defaults.
    #[arg(short, long, value_name = "FILE.gfe")]
    pub project: Option<PathBuf>,

    /// Canvas margins in pixels: left,right,top,bottom.
    #[arg(long, default_value = "0,0,0,0", value_name = "L,R,T,B")]
    pub margins: String,

    /// Draw the control-point and curve overlays into the output.
    #[arg(long)]
    pub overlays: bool,

    /// Print render timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process
    /// arguments. Used by `main()` to route before creating a window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--output" || a == "-o")
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the headless render and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    match run_inner(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            ExitCode::FAILURE
        }
    }
}

fn run_inner(args: &CliArgs) -> Result<(), String> {
    let model = ColorModel::parse(&args.model)?;
    let engine = Engine::parse(&args.engine)?;
    let margins = parse_margins(&args.margins)?;

    let (mesh, mut control) = match &args.project {
        Some(path) => load_gfe(path).map_err(|e| format!("loading {}: {}", path.display(), e))?,
        None => {
            let mut mesh = MeshState::with_default_geometry(args.rows, args.cols);
            if let Some(list) = &args.colors {
                mesh.colors = parse_colors(list, mesh.grid_vertex_count())?;
            }
            (mesh, ControlState::default())
        }
    };

    control.color_model = model;
    control.engine = engine;
    control.subdivision_depth = args.depth;
    control.use_simple_uv = args.simple_uv;
    control.show_control_points = args.overlays;
    control.show_bezier_curves = args.overlays;
    control.animate = false;
    control.sanitize();

    if args.width == 0 || args.height == 0 {
        return Err("canvas dimensions must be non-zero".into());
    }

    let start = Instant::now();
    let mut pixels = vec![0u8; args.width as usize * args.height as usize * 4];
    let mut surface = Surface::new(&mut pixels, args.width, args.height, model, margins);
    surface.fill([255, 255, 255, 255]);
    render_frame(&mesh, &control, 0.0, &mut surface, None).map_err(|e| e.to_string())?;
    let render_ms = start.elapsed().as_millis();

    let image = image::RgbaImage::from_raw(args.width, args.height, pixels)
        .ok_or("internal: pixel buffer size mismatch")?;
    image
        .save(&args.output)
        .map_err(|e| format!("writing {}: {}", args.output.display(), e))?;

    if args.verbose {
        println!(
            "rendered {}x{} ({} engine, {} model) in {} ms -> {}",
            args.width,
            args.height,
            engine.label(),
            model.label(),
            render_ms,
            args.output.display()
        );
    }
    Ok(())
}

fn parse_margins(s: &str) -> Result<Margins, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return Err(format!("margins '{}' (expected L,R,T,B)", s));
    }
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|_| format!("bad margin value '{}'", v))
    };
    Ok(Margins {
        left: parse(parts[0])?,
        right: parse(parts[1])?,
        top: parse(parts[2])?,
        bottom: parse(parts[3])?,
    })
}

fn parse_colors(list: &str, expected: usize) -> Result<Vec<[u8; 4]>, String> {
    let colors: Result<Vec<_>, _> = list.split(',').map(|c| hex_to_rgba(c.trim())).collect();
    let colors = colors?;
    if colors.len() != expected {
        return Err(format!(
            "expected {} grid-vertex colors, got {}",
            expected,
            colors.len()
        ));
    }
    Ok(colors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_parsing() {
        let m = parse_margins("1,2,3.5,4").unwrap();
        assert_eq!((m.left, m.right, m.top, m.bottom), (1.0, 2.0, 3.5, 4.0));
        assert!(parse_margins("1,2,3").is_err());
        assert!(parse_margins("a,b,c,d").is_err());
    }

    #[test]
    fn color_list_parsing() {
        let colors = parse_colors("#ff0000, #00ff00, #0000ff, #ffffff", 4).unwrap();
        assert_eq!(colors[0], [255, 0, 0, 255]);
        assert_eq!(colors[3], [255, 255, 255, 255]);
        assert!(parse_colors("#ff0000", 4).is_err());
        assert!(parse_colors("#ff0000,#bad,#0000ff,#ffffff", 4).is_err());
    }
}
