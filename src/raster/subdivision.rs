// ============================================================================
// SUBDIVISION RASTERIZER (CPU SIDE) — leaf collection + triangle fill
// ============================================================================
//
// Both subdivision engines share the leaf list built here: each patch is
// quad-tree split to the configured depth with UV corner values riding
// along, then every leaf becomes a screen quad (two triangles). On the
// GPU the quads go through the vertex/fragment pipeline; on this CPU path
// the same per-vertex UV rule (inverse-distance weighting of the four
// leaf corners, or the flat average in simple-UV mode) is interpolated
// barycentrically and fed to the bilinear color sample per pixel, so the
// two paths agree pixel-for-pixel up to rounding.
//
// Leaves are sorted by global (minV, minU) before painting; with
// last-writer-wins pixels, the bottom/right neighbour of a shared
// boundary paints last.

use crate::mesh::color::{ModelColor, bilinear_pixel_interpolation};
use crate::mesh::geometry::{Vec2, mean};
use crate::mesh::grid::PatchEntry;
use crate::mesh::patch::{
    CoonsPatch, MAX_SUBDIVISION_DEPTH, ParametricValues, TensorPatch, subdivide_to_leaves,
    uv_square,
};

use super::surface::Surface;

/// Softening of the inverse-distance UV weights; at a leaf corner the
/// 1/ε term dwarfs the other three so corner vertices keep their UVs.
pub const UV_WEIGHT_EPS: f64 = 1e-4;

const EDGE_EPS: f64 = 1e-7;

/// One leaf quad of a subdivided patch, in device pixels.
#[derive(Clone, Copy, Debug)]
pub struct Leaf {
    /// Screen corners NW, NE, SE, SW.
    pub corners: [Vec2; 4],
    /// Matching UV corners (north, east, south, west labels).
    pub uvs: [Vec2; 4],
    pub grid_x: u32,
    pub grid_y: u32,
}

impl Leaf {
    #[inline]
    pub fn min_uv(&self) -> Vec2 {
        let mut min = self.uvs[0];
        for uv in &self.uvs[1..] {
            min.x = min.x.min(uv.x);
            min.y = min.y.min(uv.y);
        }
        min
    }
}

/// Subdivide every patch to `depth` and return all leaves sorted by
/// global grid coordinate (minV, minU).
pub fn collect_sorted_leaves<T: Copy>(
    entries: &[(TensorPatch<T>, u32, u32)],
    depth: u32,
) -> Vec<Leaf> {
    let depth = depth.min(MAX_SUBDIVISION_DEPTH);
    let mut leaves = Vec::with_capacity(entries.len() * 4usize.pow(depth));
    for (patch, grid_x, grid_y) in entries {
        let uv_patch = TensorPatch {
            curve0: patch.curve0,
            curve1: patch.curve1,
            curve2: patch.curve2,
            curve3: patch.curve3,
            values: uv_square(),
        };
        for leaf in subdivide_to_leaves(&uv_patch, depth) {
            leaves.push(Leaf {
                corners: [leaf.nw(), leaf.ne(), leaf.se(), leaf.sw()],
                uvs: [
                    leaf.values.north,
                    leaf.values.east,
                    leaf.values.south,
                    leaf.values.west,
                ],
                grid_x: *grid_x,
                grid_y: *grid_y,
            });
        }
    }
    leaves.sort_by(|a, b| {
        let ka = a.min_uv();
        let kb = b.min_uv();
        let a_key = (a.grid_y as f64 + ka.y, a.grid_x as f64 + ka.x);
        let b_key = (b.grid_y as f64 + kb.y, b.grid_x as f64 + kb.x);
        a_key.partial_cmp(&b_key).unwrap_or(std::cmp::Ordering::Equal)
    });
    leaves
}

/// Per-vertex UV: weights 1/(dist+ε) over the four leaf corners.
fn inverse_distance_uv(pos: Vec2, corners: &[Vec2; 4], uvs: &[Vec2; 4]) -> Vec2 {
    let mut num = Vec2::ZERO;
    let mut den = 0.0;
    for (corner, uv) in corners.iter().zip(uvs) {
        let w = 1.0 / (pos.distance(*corner) + UV_WEIGHT_EPS);
        num += *uv * w;
        den += w;
    }
    num * (1.0 / den)
}

/// Paint sorted leaves, sampling colors from the grid-vertex color array
/// exactly the way the fragment stage samples its color texture: the four
/// texels around `(grid_x, grid_y)` blended with the interpolated UV.
pub fn render_leaves(
    leaves: &[Leaf],
    grid_colors: &[ModelColor],
    grid_cols: usize,
    simple_uv: bool,
    surface: &mut Surface,
) {
    for leaf in leaves {
        let texel = |dx: usize, dy: usize| {
            grid_colors[(leaf.grid_y as usize + dy) * (grid_cols + 1) + leaf.grid_x as usize + dx]
        };
        let corner_colors = ParametricValues {
            north: texel(0, 0),
            east: texel(1, 0),
            south: texel(1, 1),
            west: texel(0, 1),
        };

        let uvs: [Vec2; 4] = if simple_uv {
            let flat = mean(&leaf.uvs);
            [flat; 4]
        } else {
            [
                inverse_distance_uv(leaf.corners[0], &leaf.corners, &leaf.uvs),
                inverse_distance_uv(leaf.corners[1], &leaf.corners, &leaf.uvs),
                inverse_distance_uv(leaf.corners[2], &leaf.corners, &leaf.uvs),
                inverse_distance_uv(leaf.corners[3], &leaf.corners, &leaf.uvs),
            ]
        };

        // quad NW,NE,SE,SW as two triangles
        fill_triangle(
            surface,
            [leaf.corners[0], leaf.corners[1], leaf.corners[2]],
            [uvs[0], uvs[1], uvs[2]],
            &corner_colors,
        );
        fill_triangle(
            surface,
            [leaf.corners[0], leaf.corners[2], leaf.corners[3]],
            [uvs[0], uvs[2], uvs[3]],
            &corner_colors,
        );
    }
}

/// Edge-function triangle fill with barycentric UV interpolation.
fn fill_triangle(
    surface: &mut Surface,
    p: [Vec2; 3],
    uv: [Vec2; 3],
    colors: &ParametricValues<ModelColor>,
) {
    let area = edge(p[0], p[1], p[2]);
    if area.abs() < 1e-12 {
        return;
    }

    let min_x = p[0].x.min(p[1].x).min(p[2].x).floor().max(0.0) as i64;
    let min_y = p[0].y.min(p[1].y).min(p[2].y).floor().max(0.0) as i64;
    let max_x = (p[0].x.max(p[1].x).max(p[2].x).ceil() as i64).min(surface.width() as i64 - 1);
    let max_y = (p[0].y.max(p[1].y).max(p[2].y).ceil() as i64).min(surface.height() as i64 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let c = Vec2::new(x as f64 + 0.5, y as f64 + 0.5);
            let w0 = edge(p[1], p[2], c) / area;
            let w1 = edge(p[2], p[0], c) / area;
            let w2 = edge(p[0], p[1], c) / area;
            if w0 >= -EDGE_EPS && w1 >= -EDGE_EPS && w2 >= -EDGE_EPS {
                let u = w0 * uv[0].x + w1 * uv[1].x + w2 * uv[2].x;
                let v = w0 * uv[0].y + w1 * uv[1].y + w2 * uv[2].y;
                surface.put(x, y, bilinear_pixel_interpolation(colors, u as f32, v as f32));
            }
        }
    }
}

#[inline]
fn edge(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

// ============================================================================
// COONS-PATCH RENDERER
// ============================================================================

/// Render a Coons patch directly by recursive subdivision (explicit
/// stack). Each leaf quad is filled with its own corner values
/// interpolated bilinearly, so adjacent leaves stay continuous and a
/// rectilinear patch reproduces the global gradient exactly.
pub fn render_coons_patch(patch: &CoonsPatch<ModelColor>, surface: &mut Surface) {
    let depth = estimate_coons_depth(patch);
    let unit: [Vec2; 4] = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];
    let mut stack: Vec<(CoonsPatch<ModelColor>, u32)> =
        Vec::with_capacity(3 * depth as usize + 1);
    stack.push((*patch, 0));
    while let Some((p, d)) = stack.pop() {
        if d == depth {
            let nw = p.north[0];
            let ne = p.north[3];
            let se = p.south[0];
            let sw = p.south[3];
            fill_triangle(surface, [nw, ne, se], [unit[0], unit[1], unit[2]], &p.values);
            fill_triangle(surface, [nw, se, sw], [unit[0], unit[2], unit[3]], &p.values);
            continue;
        }
        let [nw, ne, sw, se] = p.subdivide();
        stack.push((se, d + 1));
        stack.push((sw, d + 1));
        stack.push((ne, d + 1));
        stack.push((nw, d + 1));
    }
}

/// Depth that flattens leaf quads to a few pixels, capped at the
/// quad-tree bound.
fn estimate_coons_depth(patch: &CoonsPatch<ModelColor>) -> u32 {
    let mut min = patch.north[0];
    let mut max = patch.north[0];
    for curve in [&patch.north, &patch.east, &patch.south, &patch.west] {
        for p in curve {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
    }
    let extent = (max.x - min.x).max(max.y - min.y).max(1.0);
    let depth = (extent / 4.0).log2().ceil().max(0.0) as u32;
    depth.min(MAX_SUBDIVISION_DEPTH)
}

/// Convenience: convert patch entries to tensor form for leaf collection.
pub fn tensor_entries<T: Copy>(entries: &[PatchEntry<T>]) -> Vec<(TensorPatch<T>, u32, u32)> {
    entries
        .iter()
        .map(|e| (e.patch.to_tensor(), e.grid_x, e.grid_y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::bezier::straight_line;
    use crate::mesh::color::ColorModel;
    use crate::raster::surface::Margins;

    fn unit_patch(size: f64) -> CoonsPatch<ModelColor> {
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
    }

    fn pixel(buf: &[u8], w: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * w + x) * 4) as usize;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    #[test]
    fn leaf_count_and_order() {
        let entries = vec![(unit_patch(32.0).to_tensor(), 0u32, 0u32)];
        let leaves = collect_sorted_leaves(&entries, 2);
        assert_eq!(leaves.len(), 16);
        // sorted by (minV, minU): first leaf owns the UV origin
        let first = leaves[0].min_uv();
        assert_eq!((first.x, first.y), (0.0, 0.0));
        let last = leaves.last().unwrap().min_uv();
        assert_eq!((last.x, last.y), (0.75, 0.75));
    }

    #[test]
    fn leaves_tile_the_patch_quad() {
        let entries = vec![(unit_patch(64.0).to_tensor(), 0u32, 0u32)];
        let depth = 3;
        let leaves = collect_sorted_leaves(&entries, depth);
        let mut min = Vec2::new(f64::MAX, f64::MAX);
        let mut max = Vec2::new(f64::MIN, f64::MIN);
        for leaf in &leaves {
            for c in &leaf.corners {
                min.x = min.x.min(c.x);
                min.y = min.y.min(c.y);
                max.x = max.x.max(c.x);
                max.y = max.y.max(c.y);
            }
        }
        assert!((min.x - 0.0).abs() < 1e-9 && (min.y - 0.0).abs() < 1e-9);
        assert!((max.x - 64.0).abs() < 1e-9 && (max.y - 64.0).abs() < 1e-9);
    }

    #[test]
    fn depth_zero_simple_uv_is_flat_center_color() {
        let entries = vec![(unit_patch(16.0).to_tensor(), 0u32, 0u32)];
        let leaves = collect_sorted_leaves(&entries, 0);
        assert_eq!(leaves.len(), 1);

        let grid_colors = vec![
            [255.0, 0.0, 0.0, 255.0],
            [0.0, 255.0, 0.0, 255.0],
            [255.0, 0.0, 255.0, 255.0],
            [0.0, 0.0, 255.0, 255.0],
        ];
        let mut buf = vec![0u8; 16 * 16 * 4];
        let mut s = Surface::new(&mut buf, 16, 16, ColorModel::Rgba, Margins::default());
        render_leaves(&leaves, &grid_colors, 1, true, &mut s);
        s.finish();

        // bilinear(corners, 0.5, 0.5) of the four texels
        let expected = [127u8, 64, 128, 255];
        for y in 0..16u32 {
            for x in 0..16u32 {
                let px = pixel(&buf, 16, x, y);
                for ch in 0..3 {
                    assert!(
                        (px[ch] as i16 - expected[ch] as i16).abs() <= 1,
                        "pixel ({},{}) = {:?}",
                        x, y, px
                    );
                }
            }
        }
    }

    #[test]
    fn smooth_uv_pins_corners() {
        let entries = vec![(unit_patch(32.0).to_tensor(), 0u32, 0u32)];
        let leaves = collect_sorted_leaves(&entries, 3);
        let grid_colors = vec![
            [255.0, 0.0, 0.0, 255.0],
            [0.0, 255.0, 0.0, 255.0],
            [255.0, 0.0, 255.0, 255.0],
            [0.0, 0.0, 255.0, 255.0],
        ];
        let mut buf = vec![0u8; 32 * 32 * 4];
        let mut s = Surface::new(&mut buf, 32, 32, ColorModel::Rgba, Margins::default());
        render_leaves(&leaves, &grid_colors, 1, false, &mut s);
        s.finish();
        let nw = pixel(&buf, 32, 0, 0);
        assert!(nw[0] > 240 && nw[1] < 15, "NW {:?}", nw);
        let ne = pixel(&buf, 32, 31, 0);
        assert!(ne[1] > 230, "NE {:?}", ne);
    }

    #[test]
    fn coons_renderer_covers_patch_without_nan() {
        let mut buf = vec![0u8; 64 * 64 * 4];
        let mut s = Surface::new(&mut buf, 64, 64, ColorModel::Rgba, Margins::default());
        render_coons_patch(&unit_patch(64.0), &mut s);
        s.finish();
        for y in 0..64u32 {
            for x in 0..64u32 {
                assert_eq!(pixel(&buf, 64, x, y)[3], 255, "hole at ({},{})", x, y);
            }
        }
    }
}
