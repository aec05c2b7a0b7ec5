// ============================================================================
// RASTER SURFACE — caller-owned RGBA buffer with clipped writes
// ============================================================================
//
// The host hands in its pixel buffer; the surface maps canvas-normalized
// [0,100] geometry into the margin-inset pixel rectangle and performs all
// writes with silent clipping. Later writes to a pixel win — there is no
// blending anywhere in the pipeline.
//
// In RGBA mode splats convert to bytes immediately. In HSLA/Oklab mode
// each written pixel is staged as 4 floats in model space and converted in
// one pass at the end of the frame, so intermediate lerps keep full
// precision and the gamma/Oklab math never sees quantized channels.

use rayon::prelude::*;

use crate::mesh::color::{ColorModel, ModelColor, Rgba8};
use crate::mesh::geometry::Vec2;

/// Pixel margins around the drawable area.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

pub struct Surface<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
    model: ColorModel,
    margins: Margins,
    /// Model-space staging plane; `None` in RGBA mode. Untouched pixels
    /// carry a negative alpha sentinel and are skipped at blit time.
    plane: Option<Vec<ModelColor>>,
}

const UNWRITTEN: f32 = -1.0;

impl<'a> Surface<'a> {
    pub fn new(
        pixels: &'a mut [u8],
        width: u32,
        height: u32,
        model: ColorModel,
        margins: Margins,
    ) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize * 4,
            "pixel buffer does not match {}x{}",
            width,
            height
        );
        let plane = (model != ColorModel::Rgba)
            .then(|| vec![[0.0, 0.0, 0.0, UNWRITTEN]; width as usize * height as usize]);
        Self { pixels, width, height, model, margins, plane }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn model(&self) -> ColorModel {
        self.model
    }

    /// Map a canvas-normalized point into pixel coordinates.
    pub fn map_point(&self, p: Vec2) -> Vec2 {
        let m = &self.margins;
        let w = self.width as f64 - m.left - m.right;
        let h = self.height as f64 - m.top - m.bottom;
        Vec2::new(p.x / 100.0 * w + m.left, p.y / 100.0 * h + m.top)
    }

    pub fn fill(&mut self, color: Rgba8) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
        if let Some(plane) = &mut self.plane {
            plane.fill([0.0, 0.0, 0.0, UNWRITTEN]);
        }
    }

    /// Write a model color at a fractional pixel position. Coordinates
    /// floor to the containing pixel; out-of-range writes are dropped.
    #[inline]
    pub fn splat(&mut self, x: f64, y: f64, color: ModelColor) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        self.put(x.floor() as i64, y.floor() as i64, color);
    }

    /// Write a model color at integer pixel coordinates, clipped.
    #[inline]
    pub fn put(&mut self, x: i64, y: i64, color: ModelColor) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        match &mut self.plane {
            Some(plane) => plane[idx] = color,
            None => {
                let c = self.model.to_rgba8(color);
                self.pixels[idx * 4..idx * 4 + 4].copy_from_slice(&c);
            }
        }
    }

    /// Direct byte write for overlays (always RGBA, drawn after `finish`).
    #[inline]
    pub fn put_rgba8(&mut self, x: i64, y: i64, color: Rgba8) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }

    /// Read a pixel's current bytes; out-of-range reads come back black.
    #[inline]
    pub fn read_rgba8(&self, x: i64, y: i64) -> Rgba8 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return [0, 0, 0, 0];
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Replace the whole byte buffer (GPU readback path).
    pub fn blit_rgba8(&mut self, bytes: &[u8]) {
        debug_assert_eq!(bytes.len(), self.pixels.len());
        self.pixels.copy_from_slice(bytes);
    }

    /// Convert the staged model plane into the byte buffer. Only pixels a
    /// rasterizer actually touched are painted. No-op in RGBA mode.
    pub fn finish(&mut self) {
        let Some(plane) = self.plane.take() else { return };
        let model = self.model;
        let width = self.width as usize;
        self.pixels
            .par_chunks_mut(width * 4)
            .zip(plane.par_chunks(width))
            .for_each(|(row_bytes, row_plane)| {
                for (px, staged) in row_bytes.chunks_exact_mut(4).zip(row_plane) {
                    if staged[3] >= 0.0 {
                        px.copy_from_slice(&model.to_rgba8(*staged));
                    }
                }
            });
    }
}
