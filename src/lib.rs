//! GradientFE — interactive mesh-gradient rasterizer.
//!
//! A grid of cubic Bézier curves plus one color per grid vertex defines a
//! mesh of Coons patches; the crate fills a pixel canvas with the
//! resulting gradient through one of three engines: direct Coons
//! subdivision (CPU), forward-differencing scanlines over tensor patches
//! (CPU), or quad-tree subdivision rendered as textured triangles (GPU
//! with a CPU fallback). Colors interpolate in RGBA, HSLA, or Oklab.
//!
//! The core (`mesh`, `raster`, `gpu`, `render`) is pure with respect to
//! its inputs: a render call takes the mesh state plus a small config and
//! mutates the caller's pixel buffer. The GUI editor (`app`) and the
//! headless CLI (`cli`) are thin hosts over that core.

#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub mod logger;

pub mod app;
pub mod cli;
pub mod gpu;
pub mod mesh;
pub mod project;
pub mod raster;
pub mod render;
