// ============================================================================
// OVERLAYS — control-point handles and Bézier curve strokes
// ============================================================================
//
// Drawn straight into the RGBA byte buffer after the gradient pass, with
// smoothstep edge coverage blended over whatever the gradient produced.

use crate::mesh::bezier::{CubicBezier, eval};
use crate::mesh::geometry::Vec2;

use super::surface::Surface;

/// Handle radius in device pixels.
pub const CONTROL_POINT_RADIUS: f64 = 4.0;

/// Stroke thickness of the curve overlay in device pixels.
pub const CURVE_THICKNESS: f64 = 1.5;

/// Segments per cubic when tessellating the curve overlay.
const CURVE_SEGMENTS: u32 = 100;

const OVERLAY_COLOR: [u8; 3] = [255, 255, 255];

/// Filled white circles at every control point.
pub fn draw_control_points(points_px: &[Vec2], surface: &mut Surface) {
    for &p in points_px {
        draw_disc(surface, p, CONTROL_POINT_RADIUS);
    }
}

/// Stroke every curve as a 100-segment polyline.
pub fn draw_bezier_curves(curves_px: &[CubicBezier], surface: &mut Surface) {
    for curve in curves_px {
        let mut prev = eval(curve, 0.0);
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f64 / CURVE_SEGMENTS as f64;
            let next = eval(curve, t);
            stroke_segment(surface, prev, next, CURVE_THICKNESS * 0.5);
            prev = next;
        }
    }
}

fn draw_disc(surface: &mut Surface, center: Vec2, radius: f64) {
    let min_x = (center.x - radius - 1.0).floor() as i64;
    let min_y = (center.y - radius - 1.0).floor() as i64;
    let max_x = (center.x + radius + 1.0).ceil() as i64;
    let max_y = (center.y + radius + 1.0).ceil() as i64;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let d = Vec2::new(x as f64 + 0.5, y as f64 + 0.5).distance(center) - radius;
            blend_coverage(surface, x, y, smoothstep(0.5, -0.5, d));
        }
    }
}

fn stroke_segment(surface: &mut Surface, a: Vec2, b: Vec2, half_width: f64) {
    let pad = half_width + 1.0;
    let min_x = (a.x.min(b.x) - pad).floor() as i64;
    let min_y = (a.y.min(b.y) - pad).floor() as i64;
    let max_x = (a.x.max(b.x) + pad).ceil() as i64;
    let max_y = (a.y.max(b.y) + pad).ceil() as i64;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = Vec2::new(x as f64 + 0.5, y as f64 + 0.5);
            let d = segment_distance(p, a, b) - half_width;
            blend_coverage(surface, x, y, smoothstep(0.5, -0.5, d));
        }
    }
}

/// Distance from `p` to segment `ab`.
fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq < 1e-12 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Blend the overlay color over the existing pixel by coverage.
fn blend_coverage(surface: &mut Surface, x: i64, y: i64, coverage: f64) {
    if coverage <= 0.001 {
        return;
    }
    if x < 0 || y < 0 || x >= surface.width() as i64 || y >= surface.height() as i64 {
        return;
    }
    let existing = surface.read_rgba8(x, y);
    let mix = |under: u8, over: u8| {
        (under as f64 + (over as f64 - under as f64) * coverage).round() as u8
    };
    surface.put_rgba8(
        x,
        y,
        [
            mix(existing[0], OVERLAY_COLOR[0]),
            mix(existing[1], OVERLAY_COLOR[1]),
            mix(existing[2], OVERLAY_COLOR[2]),
            255,
        ],
    );
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::bezier::straight_line;
    use crate::mesh::color::ColorModel;
    use crate::raster::surface::Margins;

    #[test]
    fn control_point_paints_a_disc() {
        let mut buf = vec![0u8; 32 * 32 * 4];
        {
            let mut s = Surface::new(&mut buf, 32, 32, ColorModel::Rgba, Margins::default());
            draw_control_points(&[Vec2::new(16.0, 16.0)], &mut s);
        }
        let center = ((16 * 32 + 16) * 4) as usize;
        assert_eq!(buf[center], 255);
        // well outside the radius stays untouched
        let far = ((2 * 32 + 2) * 4) as usize;
        assert_eq!(buf[far], 0);
    }

    #[test]
    fn curve_stroke_covers_the_line() {
        let mut buf = vec![0u8; 64 * 16 * 4];
        {
            let mut s = Surface::new(&mut buf, 64, 16, ColorModel::Rgba, Margins::default());
            let line = straight_line(Vec2::new(2.0, 8.0), Vec2::new(62.0, 8.0));
            draw_bezier_curves(&[line], &mut s);
        }
        for x in 4..60i64 {
            let idx = ((8 * 64 + x) * 4) as usize;
            assert!(buf[idx] > 200, "gap at x={}", x);
        }
    }
}
