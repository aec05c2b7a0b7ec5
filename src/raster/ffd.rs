// ============================================================================
// FFD RASTERIZER — scanline fill of a tensor patch by forward differencing
// ============================================================================
//
// The patch's v iso-curve at a fixed u is the cubic whose control points
// are the four row curves evaluated at u. So the fill walks all four row
// curves simultaneously with one outer FFD per curve, and at every u-step
// scans the transient "spine" cubic through the current four points with
// an inner FFD, splatting a pixel per step.
//
// Patch geometry must already be in device pixels — the step estimator
// sizes the walks so consecutive writes land roughly one pixel apart.

use crate::mesh::color::{ModelColor, bilinear_pixel_interpolation};
use crate::mesh::ffd::{CurveDifferences, bezier_to_fd, estimate_step_count};
use crate::mesh::geometry::Vec2;
use crate::mesh::patch::{ParametricValues, TensorPatch};

use super::surface::Surface;

/// Fill one tensor patch into the surface.
pub fn render_tensor_patch(patch: &TensorPatch<ModelColor>, surface: &mut Surface) {
    let curves = patch.curves();

    // The coarsest curve decides the outer resolution.
    let shift = curves
        .iter()
        .map(|c| estimate_step_count(c))
        .max()
        .unwrap_or(0);
    let max_steps = 1u32 << shift;
    let du = 1.0 / max_steps as f32;

    let mut points = [curves[0][0], curves[1][0], curves[2][0], curves[3][0]];
    let mut diffs: [CurveDifferences; 4] = [
        bezier_to_fd(curves[0]).halve_n(shift),
        bezier_to_fd(curves[1]).halve_n(shift),
        bezier_to_fd(curves[2]).halve_n(shift),
        bezier_to_fd(curves[3]).halve_n(shift),
    ];

    let mut u = 0.0f32;
    for _ in 0..max_steps {
        let spine = [points[0], points[1], points[2], points[3]];
        scan_spine(&spine, u, &patch.values, surface);
        for (point, diff) in points.iter_mut().zip(diffs.iter_mut()) {
            diff.step(point);
        }
        u += du;
    }
    // Close the east boundary: the outer walk stops one step short of u=1.
    let spine = [points[0], points[1], points[2], points[3]];
    scan_spine(&spine, 1.0, &patch.values, surface);
}

/// Inner FFD loop: walk one spine from v=0 to v=1 writing pixels.
fn scan_spine(
    spine: &[Vec2; 4],
    u: f32,
    values: &ParametricValues<ModelColor>,
    surface: &mut Surface,
) {
    let shift = estimate_step_count(spine);
    let steps = 1u32 << shift;
    let dv = 1.0 / steps as f32;

    let mut fd = bezier_to_fd(spine).halve_n(shift);
    let mut p = spine[0];
    let mut v = 0.0f32;
    for _ in 0..steps {
        surface.splat(p.x, p.y, bilinear_pixel_interpolation(values, u, v));
        fd.step(&mut p);
        v += dv;
    }
    surface.splat(p.x, p.y, bilinear_pixel_interpolation(values, u, 1.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::bezier::straight_line;
    use crate::mesh::color::ColorModel;
    use crate::mesh::patch::CoonsPatch;
    use crate::raster::surface::Margins;

    fn pixel(buf: &[u8], w: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * w + x) * 4) as usize;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    fn square_tensor(size: f64) -> TensorPatch<ModelColor> {
        let nw = Vec2::new(0.0, 0.0);
        let ne = Vec2::new(size, 0.0);
        let se = Vec2::new(size, size);
        let sw = Vec2::new(0.0, size);
        CoonsPatch {
            north: straight_line(nw, ne),
            east: straight_line(ne, se),
            south: straight_line(se, sw),
            west: straight_line(sw, nw),
            values: ParametricValues {
                north: [255.0, 0.0, 0.0, 255.0],
                east: [0.0, 255.0, 0.0, 255.0],
                south: [0.0, 0.0, 255.0, 255.0],
                west: [255.0, 0.0, 255.0, 255.0],
            },
        }
        .to_tensor()
    }

    #[test]
    fn corners_receive_corner_colors() {
        let mut buf = vec![0u8; 64 * 64 * 4];
        let mut s = Surface::new(&mut buf, 64, 64, ColorModel::Rgba, Margins::default());
        render_tensor_patch(&square_tensor(64.0), &mut s);
        s.finish();
        let nw = pixel(&buf, 64, 0, 0);
        assert!(nw[0] >= 253 && nw[1] <= 2);
        let ne = pixel(&buf, 64, 63, 0);
        assert!(ne[1] >= 250, "NE {:?}", ne);
        let se = pixel(&buf, 64, 63, 63);
        assert!(se[2] >= 250, "SE {:?}", se);
        let sw = pixel(&buf, 64, 0, 63);
        assert!(sw[0] >= 250 && sw[2] >= 250, "SW {:?}", sw);
    }

    #[test]
    fn fill_leaves_no_interior_holes() {
        let mut buf = vec![0u8; 64 * 64 * 4];
        let mut s = Surface::new(&mut buf, 64, 64, ColorModel::Rgba, Margins::default());
        render_tensor_patch(&square_tensor(64.0), &mut s);
        s.finish();
        // every alpha byte inside the patch must have been written
        for y in 0..64u32 {
            for x in 0..64u32 {
                assert_eq!(pixel(&buf, 64, x, y)[3], 255, "hole at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn degenerate_patch_writes_single_pixel() {
        let p = Vec2::new(50.0, 50.0);
        let degenerate = CoonsPatch {
            north: [p, p, p, p],
            east: [p, p, p, p],
            south: [p, p, p, p],
            west: [p, p, p, p],
            values: ParametricValues {
                north: [255.0, 255.0, 255.0, 255.0],
                east: [255.0, 255.0, 255.0, 255.0],
                south: [255.0, 255.0, 255.0, 255.0],
                west: [255.0, 255.0, 255.0, 255.0],
            },
        }
        .to_tensor();

        let mut buf = vec![0u8; 100 * 100 * 4];
        let mut s = Surface::new(&mut buf, 100, 100, ColorModel::Rgba, Margins::default());
        render_tensor_patch(&degenerate, &mut s);
        s.finish();

        let mut touched = Vec::new();
        for y in 0..100u32 {
            for x in 0..100u32 {
                if pixel(&buf, 100, x, y)[3] != 0 {
                    touched.push((x, y));
                }
            }
        }
        assert_eq!(touched, vec![(50, 50)]);
    }
}
