// End-to-end rendering scenarios on the CPU engines: 800×600 canvas,
// zero margins, RGBA interpolation unless stated otherwise.

use gradientfe::mesh::color::ColorModel;
use gradientfe::mesh::geometry::Vec2;
use gradientfe::mesh::grid::MeshState;
use gradientfe::raster::surface::{Margins, Surface};
use gradientfe::render::{ControlState, Engine, render_frame};

const W: u32 = 800;
const H: u32 = 600;

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const MAGENTA: [u8; 4] = [255, 0, 255, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn bare_state(engine: Engine) -> ControlState {
    ControlState {
        engine,
        show_control_points: false,
        show_bezier_curves: false,
        ..ControlState::default()
    }
}

fn render(mesh: &MeshState, state: &ControlState) -> Vec<u8> {
    let mut pixels = vec![0u8; (W * H * 4) as usize];
    let mut surface = Surface::new(&mut pixels, W, H, state.color_model, Margins::default());
    surface.fill(WHITE);
    render_frame(mesh, state, 0.0, &mut surface, None).expect("frame failed");
    pixels
}

fn pixel(buf: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * W + x) * 4) as usize;
    [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
}

fn channel_close(actual: [u8; 4], expected: [u8; 4], tol: i16) -> bool {
    (0..3).all(|i| (actual[i] as i16 - expected[i] as i16).abs() <= tol)
}

/// Single patch over the full canvas with the classic four-color corners:
/// NW red, NE green, SE blue, SW magenta.
fn four_color_mesh() -> MeshState {
    let mut mesh = MeshState::with_default_geometry(1, 1);
    // row-major grid vertices: NW, NE, SW, SE
    mesh.colors = vec![RED, GREEN, MAGENTA, BLUE];
    mesh
}

// ============================================================================
// Scenario 1: unit square, four distinct corner colors, subdivision depth 4
// ============================================================================

#[test]
fn corner_pixels_take_corner_colors_at_depth_4() {
    let state = ControlState {
        subdivision_depth: 4,
        ..bare_state(Engine::Subdivision)
    };
    let buf = render(&four_color_mesh(), &state);

    assert!(channel_close(pixel(&buf, 0, 0), RED, 2), "NW {:?}", pixel(&buf, 0, 0));
    assert!(channel_close(pixel(&buf, 799, 0), GREEN, 2), "NE {:?}", pixel(&buf, 799, 0));
    assert!(channel_close(pixel(&buf, 799, 599), BLUE, 2), "SE {:?}", pixel(&buf, 799, 599));
    assert!(channel_close(pixel(&buf, 0, 599), MAGENTA, 2), "SW {:?}", pixel(&buf, 0, 599));
}

#[test]
fn ffd_engine_agrees_on_the_corners() {
    let buf = render(&four_color_mesh(), &bare_state(Engine::Ffd));
    assert!(channel_close(pixel(&buf, 0, 0), RED, 2));
    assert!(channel_close(pixel(&buf, 799, 0), GREEN, 2));
    assert!(channel_close(pixel(&buf, 799, 599), BLUE, 2));
    assert!(channel_close(pixel(&buf, 0, 599), MAGENTA, 2));
}

// ============================================================================
// Scenario 2: uniform corner color renders uniformly on every engine
// ============================================================================

#[test]
fn uniform_color_is_exact_everywhere() {
    let gray = [128u8, 128, 128, 255];
    let mut mesh = MeshState::with_default_geometry(1, 1);
    mesh.colors = vec![gray; 4];

    // depth only matters to the subdivision engine
    let runs = [
        (Engine::Coons, 0u32),
        (Engine::Ffd, 0),
        (Engine::Subdivision, 0),
        (Engine::Subdivision, 3),
        (Engine::Subdivision, 6),
    ];
    for (engine, depth) in runs {
        let state = ControlState {
            subdivision_depth: depth,
            ..bare_state(engine)
        };
        let buf = render(&mesh, &state);
        for y in 0..H {
            for x in 0..W {
                assert_eq!(
                    pixel(&buf, x, y),
                    gray,
                    "engine {:?} depth {} at ({}, {})",
                    engine, depth, x, y
                );
            }
        }
    }
}

// ============================================================================
// Scenario 3: fully degenerate patch
// ============================================================================

#[test]
fn degenerate_patch_touches_one_pixel() {
    let mut mesh = MeshState::with_default_geometry(1, 1);
    for p in mesh.points.iter_mut() {
        *p = Vec2::new(50.0, 50.0);
    }
    mesh.colors = vec![RED, RED, RED, RED];

    let buf = render(&mesh, &bare_state(Engine::Ffd));
    let mut touched = Vec::new();
    for y in 0..H {
        for x in 0..W {
            if pixel(&buf, x, y) != WHITE {
                touched.push((x, y));
            }
        }
    }
    // (50%, 50%) of 800×600
    assert_eq!(touched, vec![(400, 300)]);
    assert_eq!(pixel(&buf, 400, 300), RED);
}

// ============================================================================
// Scenario 4: depth-0 subdivision with flat UVs
// ============================================================================

#[test]
fn depth_zero_simple_uv_is_one_flat_quad() {
    let state = ControlState {
        subdivision_depth: 0,
        use_simple_uv: true,
        ..bare_state(Engine::Subdivision)
    };
    let buf = render(&four_color_mesh(), &state);

    // bilinear(corners, 0.5, 0.5): top = (red+green)/2, bottom =
    // (magenta+blue)/2, mixed halfway
    let expected = [127u8, 64, 128, 255];
    for y in (0..H).step_by(17) {
        for x in (0..W).step_by(13) {
            assert!(
                channel_close(pixel(&buf, x, y), expected, 1),
                "pixel ({}, {}) = {:?}",
                x, y, pixel(&buf, x, y)
            );
        }
    }
}

// ============================================================================
// Scenario 5: 2×2 grid meets seamlessly at interior boundaries
// ============================================================================

#[test]
fn two_by_two_grid_has_no_seams() {
    let mut mesh = MeshState::with_default_geometry(2, 2);
    // diagonal red-to-blue ramp over the nine grid vertices
    mesh.colors = (0..9)
        .map(|i| {
            let (row, col) = (i / 3, i % 3);
            let t = (row + col) as f32 / 4.0;
            [
                (255.0 * (1.0 - t)).round() as u8,
                0,
                (255.0 * t).round() as u8,
                255,
            ]
        })
        .collect();

    let state = ControlState {
        subdivision_depth: 5,
        ..bare_state(Engine::Subdivision)
    };
    let buf = render(&mesh, &state);

    // full coverage: a seam would leave background pixels along a boundary
    for y in 0..H {
        for x in 0..W {
            assert!(
                pixel(&buf, x, y) != WHITE || x < 2 || x > W - 3 || y < 2 || y > H - 3,
                "uncovered pixel at ({}, {})",
                x, y
            );
        }
    }

    // crossing the vertical patch boundary at x=400 stays continuous
    for y in (10..H - 10).step_by(37) {
        let a = pixel(&buf, 398, y);
        let b = pixel(&buf, 402, y);
        for ch in 0..3 {
            assert!(
                (a[ch] as i16 - b[ch] as i16).abs() <= 8,
                "seam at (400, {}): {:?} vs {:?}",
                y, a, b
            );
        }
    }
    // and the horizontal boundary at y=300
    for x in (10..W - 10).step_by(37) {
        let a = pixel(&buf, x, 298);
        let b = pixel(&buf, x, 302);
        for ch in 0..3 {
            assert!(
                (a[ch] as i16 - b[ch] as i16).abs() <= 8,
                "seam at ({}, 300): {:?} vs {:?}",
                x, a, b
            );
        }
    }
}

// ============================================================================
// Scenario 6: Coons renderer vs FFD over the converted tensor patch
// ============================================================================

#[test]
fn coons_and_ffd_agree_on_rectilinear_patch() {
    let mesh = four_color_mesh();
    let coons = render(&mesh, &bare_state(Engine::Coons));
    let ffd = render(&mesh, &bare_state(Engine::Ffd));

    let mut mismatched = 0usize;
    for y in 0..H {
        for x in 0..W {
            if !channel_close(pixel(&coons, x, y), pixel(&ffd, x, y), 1) {
                mismatched += 1;
            }
        }
    }
    let total = (W * H) as usize;
    assert!(
        mismatched * 100 <= total,
        "{} of {} pixels disagree beyond 1 per channel",
        mismatched, total
    );
}

// ============================================================================
// Non-RGBA models stay usable end to end
// ============================================================================

#[test]
fn hsla_and_oklab_render_without_artifacts() {
    for model in [ColorModel::Hsla, ColorModel::Oklab] {
        let state = ControlState {
            color_model: model,
            ..bare_state(Engine::Ffd)
        };
        let buf = render(&four_color_mesh(), &state);
        assert!(channel_close(pixel(&buf, 0, 0), RED, 3), "{:?} NW", model);
        assert!(channel_close(pixel(&buf, 799, 0), GREEN, 3), "{:?} NE", model);
        // interior pixels are fully opaque and written
        assert_eq!(pixel(&buf, 400, 300)[3], 255);
        assert!(pixel(&buf, 400, 300) != WHITE);
    }
}

// ============================================================================
// Overlays draw on top of the gradient
// ============================================================================

#[test]
fn overlays_paint_control_points_and_curves() {
    let mut state = bare_state(Engine::Ffd);
    state.show_control_points = true;
    state.show_bezier_curves = true;
    let mut mesh = four_color_mesh();
    mesh.colors = vec![[0, 0, 0, 255]; 4];
    let buf = render(&mesh, &state);

    // a control point sits at every canvas corner; the nearest interior
    // pixel must be overlay white on the black gradient
    assert_eq!(pixel(&buf, 1, 1), WHITE);
    // the north boundary curve runs along y=0
    assert!(pixel(&buf, 200, 0)[0] > 200);
}
