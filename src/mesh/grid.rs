// ============================================================================
// CONTROL-POINT GRID — editable lattice, curve grouping, patch assembly
// ============================================================================
//
// An R×C patch grid is edited through a (3R+1)×(3C+1) lattice of Bézier
// control points in the crosshair pattern: only points on a row line or a
// column line exist, the 4 interior off-axis points of each patch cell are
// omitted. Total point count: (3R+1)(3C+1) − 4RC.
//
// Lattice rows whose index is a multiple of 3 are full rows (3C+1 points,
// the row curves); the two rows between them carry only the C+1
// column-aligned handles.

use serde::{Deserialize, Serialize};

use super::bezier::{CubicBezier, inverse};
use super::color::{ColorModel, ModelColor, Rgba8, hsla_to_rgba};
use super::geometry::Vec2;
use super::patch::{CoonsPatch, MeshError, ParametricValues};

/// A patch with its position in the grid, ready for rendering.
#[derive(Clone, Copy, Debug)]
pub struct PatchEntry<T> {
    pub patch: CoonsPatch<T>,
    pub grid_x: u32,
    pub grid_y: u32,
}

/// The editable mesh: grid shape, control points, grid-vertex colors.
///
/// Point coordinates are canvas-normalized `[0,100]`. Colors are stored as
/// RGBA bytes and converted into the active model at assembly time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeshState {
    rows: usize,
    cols: usize,
    pub points: Vec<Vec2>,
    pub colors: Vec<Rgba8>,
}

impl MeshState {
    /// Points in the crosshair lattice for an R×C grid.
    pub fn expected_point_count(rows: usize, cols: usize) -> usize {
        (3 * rows + 1) * (3 * cols + 1) - 4 * rows * cols
    }

    /// Evenly spaced default geometry (straight boundary curves) with a
    /// hue ramp over the grid vertices.
    pub fn with_default_geometry(rows: usize, cols: usize) -> Self {
        let rows = rows.clamp(1, 4);
        let cols = cols.clamp(1, 4);
        let mut points = Vec::with_capacity(Self::expected_point_count(rows, cols));
        for r in 0..=3 * rows {
            let y = 100.0 * r as f64 / (3 * rows) as f64;
            if r % 3 == 0 {
                for c in 0..=3 * cols {
                    points.push(Vec2::new(100.0 * c as f64 / (3 * cols) as f64, y));
                }
            } else {
                for c in 0..=cols {
                    points.push(Vec2::new(100.0 * c as f64 / cols as f64, y));
                }
            }
        }

        let vertex_count = (rows + 1) * (cols + 1);
        let mut colors = Vec::with_capacity(vertex_count);
        for i in 0..=rows {
            for j in 0..=cols {
                let t = (i * (cols + 1) + j) as f32 / vertex_count as f32;
                colors.push(hsla_to_rgba([t * 300.0, 85.0, 55.0, 255.0]));
            }
        }

        Self { rows, cols, points, colors }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn grid_vertex_count(&self) -> usize {
        (self.rows + 1) * (self.cols + 1)
    }

    /// Length of one lattice row: full on row lines, sparse between them.
    fn lattice_row_len(&self, r: usize) -> usize {
        if r % 3 == 0 { 3 * self.cols + 1 } else { self.cols + 1 }
    }

    /// Flat index of lattice point (row `r`, lattice column `c`).
    ///
    /// On sparse rows `c` must be a multiple of 3 (the crosshair pattern
    /// has no other points there).
    pub fn point_index(&self, r: usize, c: usize) -> usize {
        let mut offset = 0;
        for row in 0..r {
            offset += self.lattice_row_len(row);
        }
        if r % 3 == 0 {
            offset + c
        } else {
            debug_assert!(c % 3 == 0, "off-axis lattice point ({}, {})", r, c);
            offset + c / 3
        }
    }

    fn point_at<'a>(&self, points: &'a [Vec2], r: usize, c: usize) -> Vec2 {
        points[self.point_index(r, c)]
    }

    /// Check the stored arrays against the grid shape.
    pub fn validate_shape(&self) -> Result<(), MeshError> {
        let expected = Self::expected_point_count(self.rows, self.cols);
        if self.points.len() != expected {
            return Err(MeshError::GridShape {
                what: "control points",
                expected,
                actual: self.points.len(),
            });
        }
        if self.colors.len() != self.grid_vertex_count() {
            return Err(MeshError::GridShape {
                what: "grid vertex colors",
                expected: self.grid_vertex_count(),
                actual: self.colors.len(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // CURVE GROUPING
    // ========================================================================

    /// Row curves, indexed `i·C + j` for row line `i`, span `j..j+1`.
    pub fn row_curves(&self, points: &[Vec2]) -> Vec<CubicBezier> {
        let mut curves = Vec::with_capacity((self.rows + 1) * self.cols);
        for i in 0..=self.rows {
            for j in 0..self.cols {
                curves.push([
                    self.point_at(points, 3 * i, 3 * j),
                    self.point_at(points, 3 * i, 3 * j + 1),
                    self.point_at(points, 3 * i, 3 * j + 2),
                    self.point_at(points, 3 * i, 3 * j + 3),
                ]);
            }
        }
        curves
    }

    /// Column curves, indexed `j·R + i` for column line `j`, span `i..i+1`.
    pub fn column_curves(&self, points: &[Vec2]) -> Vec<CubicBezier> {
        let mut curves = Vec::with_capacity((self.cols + 1) * self.rows);
        for j in 0..=self.cols {
            for i in 0..self.rows {
                curves.push([
                    self.point_at(points, 3 * i, 3 * j),
                    self.point_at(points, 3 * i + 1, 3 * j),
                    self.point_at(points, 3 * i + 2, 3 * j),
                    self.point_at(points, 3 * i + 3, 3 * j),
                ]);
            }
        }
        curves
    }

    // ========================================================================
    // PATCH ASSEMBLY
    // ========================================================================

    /// Build the R×C Coons patches from grouped curves, with corner colors
    /// converted into `model` space. Every patch is validated; a corner
    /// mismatch aborts the frame.
    pub fn assemble_patches(
        &self,
        row_curves: &[CubicBezier],
        column_curves: &[CubicBezier],
        model: ColorModel,
    ) -> Result<Vec<PatchEntry<ModelColor>>, MeshError> {
        self.validate_shape()?;
        let (r_count, c_count) = (self.rows, self.cols);
        if row_curves.len() != (r_count + 1) * c_count {
            return Err(MeshError::GridShape {
                what: "row curves",
                expected: (r_count + 1) * c_count,
                actual: row_curves.len(),
            });
        }
        if column_curves.len() != (c_count + 1) * r_count {
            return Err(MeshError::GridShape {
                what: "column curves",
                expected: (c_count + 1) * r_count,
                actual: column_curves.len(),
            });
        }

        let mut entries = Vec::with_capacity(r_count * c_count);
        for i in 0..r_count {
            for j in 0..c_count {
                let north = row_curves[i * c_count + j];
                let south = inverse(&row_curves[(i + 1) * c_count + j]);
                let east = column_curves[(j + 1) * r_count + i];
                let west = inverse(&column_curves[j * r_count + i]);

                let color = |row: usize, col: usize| {
                    model.from_rgba8(self.colors[row * (c_count + 1) + col])
                };
                let patch = CoonsPatch {
                    north,
                    east,
                    south,
                    west,
                    values: ParametricValues {
                        north: color(i, j),
                        east: color(i, j + 1),
                        south: color(i + 1, j + 1),
                        west: color(i + 1, j),
                    },
                };
                patch.validate()?;
                entries.push(PatchEntry { patch, grid_x: j as u32, grid_y: i as u32 });
            }
        }
        Ok(entries)
    }

    /// Grid-vertex colors in model space, row-major — the texel layout of
    /// the subdivision engine's color texture.
    pub fn colors_in_model(&self, model: ColorModel) -> Vec<ModelColor> {
        self.colors.iter().map(|&c| model.from_rgba8(c)).collect()
    }

    // ========================================================================
    // ANIMATION
    // ========================================================================

    /// Every control point perturbed by its stable seed (its index).
    pub fn animated_points(&self, time: f64, amplitude: f64) -> Vec<Vec2> {
        self.points
            .iter()
            .enumerate()
            .map(|(seed, &p)| animate_point(p, time, seed as i64, amplitude))
            .collect()
    }
}

/// Smooth pseudo-random drift of one control point. The seed is opaque;
/// it only has to stay stable across frames for the motion to be coherent.
pub fn animate_point(p: Vec2, time: f64, seed: i64, amplitude: f64) -> Vec2 {
    let s = seed as f64;
    let dx = (0.3 * time + 0.1 * s).sin() * (0.15 * time + 0.2 * s).cos() * amplitude;
    let dy = (0.3 * time + 0.3 * s).cos() * (0.21 * time + 0.4 * s).sin() * amplitude;
    Vec2::new(p.x + dx, p.y + dy)
}
