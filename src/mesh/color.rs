// ============================================================================
// COLOR MODELS — RGBA / HSLA / Oklab conversions, bilinear interpolation,
// hex parsing and CSS-string formatting
// ============================================================================
//
// Gradient interpolation runs in the *selected* model's component space so
// that e.g. an Oklab gradient between red and blue passes through
// perceptually plausible midpoints instead of muddy RGB averages. A model
// color is `[f32; 4]` in model-specific ranges:
//
//   RGBA:  r,g,b ∈ [0,255]              a ∈ [0,255]
//   HSLA:  h ∈ [0,360)  s,l ∈ [0,100]   a ∈ [0,255]
//   Oklab: L ∈ [0,1]    a,b ∈ ≈[-0.5,0.5]  alpha ∈ [0,255]
//
// Byte buffers always hold RGBA; conversion happens at the edges.

use serde::{Deserialize, Serialize};

use super::patch::ParametricValues;

/// 8-bit RGBA pixel as stored in byte buffers and grid vertex colors.
pub type Rgba8 = [u8; 4];

/// A color expressed in the currently selected model's component ranges.
pub type ModelColor = [f32; 4];

/// Component space used for gradient interpolation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorModel {
    Rgba,
    Hsla,
    Oklab,
}

impl ColorModel {
    pub fn all() -> &'static [ColorModel] {
        &[ColorModel::Rgba, ColorModel::Hsla, ColorModel::Oklab]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColorModel::Rgba => "RGBA",
            ColorModel::Hsla => "HSLA",
            ColorModel::Oklab => "Oklab",
        }
    }

    /// Parse a user-supplied model name. Rejected at the interface
    /// boundary; the renderers never see an unknown model.
    pub fn parse(s: &str) -> Result<ColorModel, String> {
        match s.to_ascii_lowercase().as_str() {
            "rgba" | "rgb" => Ok(ColorModel::Rgba),
            "hsla" | "hsl" => Ok(ColorModel::Hsla),
            "oklab" => Ok(ColorModel::Oklab),
            other => Err(format!(
                "unknown color model '{}' (expected rgba, hsla, or oklab)",
                other
            )),
        }
    }

    /// Convert a byte color into this model's component space.
    pub fn from_rgba8(&self, c: Rgba8) -> ModelColor {
        match self {
            ColorModel::Rgba => [c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32],
            ColorModel::Hsla => rgba_to_hsla(c),
            ColorModel::Oklab => rgba_to_oklab(c),
        }
    }

    /// Convert a model color back to bytes for the framebuffer.
    pub fn to_rgba8(&self, c: ModelColor) -> Rgba8 {
        match self {
            ColorModel::Rgba => [
                c[0].round().clamp(0.0, 255.0) as u8,
                c[1].round().clamp(0.0, 255.0) as u8,
                c[2].round().clamp(0.0, 255.0) as u8,
                c[3].round().clamp(0.0, 255.0) as u8,
            ],
            ColorModel::Hsla => hsla_to_rgba(c),
            ColorModel::Oklab => oklab_to_rgba(c),
        }
    }

    /// CSS color string for UI display of a model color.
    pub fn css_string(&self, c: ModelColor) -> String {
        match self {
            ColorModel::Rgba => format!(
                "rgba({},{},{},{})",
                c[0].round() as i32,
                c[1].round() as i32,
                c[2].round() as i32,
                trim_float(c[3] / 255.0),
            ),
            ColorModel::Hsla => format!(
                "hsla({},{}%,{}%,{})",
                trim_float(c[0]),
                trim_float(c[1]),
                trim_float(c[2]),
                trim_float(c[3] / 255.0),
            ),
            ColorModel::Oklab => format!(
                "oklab({} {} {} / {})",
                trim_float(c[0]),
                trim_float(c[1]),
                trim_float(c[2]),
                trim_float(c[3] / 255.0),
            ),
        }
    }
}

/// Format with up to 3 decimals, trailing zeros trimmed.
fn trim_float(v: f32) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() { "0".into() } else { s.into() }
}

// ============================================================================
// INTERPOLATION
// ============================================================================

/// Componentwise lerp of the first three channels; the result is opaque.
#[inline]
pub fn lerp_color(t: f32, c1: ModelColor, c2: ModelColor) -> ModelColor {
    let mt = 1.0 - t;
    [
        mt * c1[0] + t * c2[0],
        mt * c1[1] + t * c2[1],
        mt * c1[2] + t * c2[2],
        255.0,
    ]
}

/// Two-step lerp across the unit square.
///
/// The "top" edge runs `(north, east)` and the "bottom" edge `(west,
/// south)` — the rasterizers bake this corner labelling in, so it must
/// not be reordered to match geometric north/south.
#[inline]
pub fn bilinear_pixel_interpolation(
    values: &ParametricValues<ModelColor>,
    u: f32,
    v: f32,
) -> ModelColor {
    let top = lerp_color(u, values.north, values.east);
    let bot = lerp_color(u, values.west, values.south);
    lerp_color(v, top, bot)
}

// ============================================================================
// RGBA ↔ HSLA
// ============================================================================

/// RGBA bytes → HSLA (H: 0..360, S/L: 0..100, A: 0..255).
pub fn rgba_to_hsla(c: Rgba8) -> ModelColor {
    let r = c[0] as f32 / 255.0;
    let g = c[1] as f32 / 255.0;
    let b = c[2] as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < 1e-6 {
        return [0.0, 0.0, l * 100.0, c[3] as f32];
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };

    let h = if (max - r).abs() < 1e-6 {
        let mut h = (g - b) / d;
        if h < 0.0 { h += 6.0; }
        h
    } else if (max - g).abs() < 1e-6 {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    [h * 60.0, s * 100.0, l * 100.0, c[3] as f32]
}

/// HSLA (H: 0..360, S/L: 0..100, A: 0..255) → RGBA bytes.
pub fn hsla_to_rgba(c: ModelColor) -> Rgba8 {
    let h = (c[0].rem_euclid(360.0)) / 360.0;
    let s = (c[1] / 100.0).clamp(0.0, 1.0);
    let l = (c[2] / 100.0).clamp(0.0, 1.0);
    let a = c[3].round().clamp(0.0, 255.0) as u8;

    if s.abs() < 1e-6 {
        let v = (l * 255.0).round() as u8;
        return [v, v, v, a];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    [
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
        a,
    ]
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 { t += 1.0; }
    if t > 1.0 { t -= 1.0; }
    if t < 1.0 / 6.0 { return p + (q - p) * 6.0 * t; }
    if t < 1.0 / 2.0 { return q; }
    if t < 2.0 / 3.0 { return p + (q - p) * (2.0 / 3.0 - t) * 6.0; }
    p
}

// ============================================================================
// RGBA ↔ Oklab
// ============================================================================

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

#[inline]
fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 { c * 12.92 } else { 1.055 * c.powf(1.0 / 2.4) - 0.055 }
}

/// RGBA bytes → Oklab (L: 0..1, a/b: ≈±0.5, alpha: 0..255).
///
/// Gamma-linearize, project into LMS, cube-root, project into Lab.
pub fn rgba_to_oklab(c: Rgba8) -> ModelColor {
    let r = srgb_to_linear(c[0] as f32 / 255.0);
    let g = srgb_to_linear(c[1] as f32 / 255.0);
    let b = srgb_to_linear(c[2] as f32 / 255.0);

    let l = (0.412_221_47 * r + 0.536_332_55 * g + 0.051_445_995 * b).cbrt();
    let m = (0.211_903_5 * r + 0.680_699_5 * g + 0.107_396_96 * b).cbrt();
    let s = (0.088_302_46 * r + 0.281_718_85 * g + 0.629_978_7 * b).cbrt();

    [
        0.210_454_26 * l + 0.793_617_8 * m - 0.004_072_047 * s,
        1.977_998_5 * l - 2.428_592_2 * m + 0.450_593_7 * s,
        0.025_904_037 * l + 0.782_771_77 * m - 0.808_675_77 * s,
        c[3] as f32,
    ]
}

/// Oklab → RGBA bytes, clamping out-of-gamut results.
pub fn oklab_to_rgba(c: ModelColor) -> Rgba8 {
    let l_ = c[0] + 0.396_337_78 * c[1] + 0.215_803_76 * c[2];
    let m_ = c[0] - 0.105_561_346 * c[1] - 0.063_854_17 * c[2];
    let s_ = c[0] - 0.089_484_18 * c[1] - 1.291_485_5 * c[2];

    let l = l_ * l_ * l_;
    let m = m_ * m_ * m_;
    let s = s_ * s_ * s_;

    let r = 4.076_741_7 * l - 3.307_711_6 * m + 0.230_969_94 * s;
    let g = -1.268_438 * l + 2.609_757_4 * m - 0.341_319_38 * s;
    let b = -0.004_196_086_3 * l - 0.703_418_6 * m + 1.707_614_7 * s;

    [
        (linear_to_srgb(r).clamp(0.0, 1.0) * 255.0).round() as u8,
        (linear_to_srgb(g).clamp(0.0, 1.0) * 255.0).round() as u8,
        (linear_to_srgb(b).clamp(0.0, 1.0) * 255.0).round() as u8,
        c[3].round().clamp(0.0, 255.0) as u8,
    ]
}

// ============================================================================
// HEX STRINGS
// ============================================================================

/// Parse `#rrggbb` into an opaque byte color.
pub fn hex_to_rgba(s: &str) -> Result<Rgba8, String> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("invalid hex color '{}' (expected #rrggbb)", s));
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0);
    Ok([channel(0), channel(2), channel(4), 255])
}

pub fn rgba_to_hex(c: Rgba8) -> String {
    format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        for c in [[0u8, 0, 0, 255], [255, 255, 255, 255], [18, 52, 86, 255], [200, 5, 90, 255]] {
            let parsed = hex_to_rgba(&rgba_to_hex(c)).unwrap();
            assert_eq!(parsed[0], c[0]);
            assert_eq!(parsed[1], c[1]);
            assert_eq!(parsed[2], c[2]);
        }
        assert!(hex_to_rgba("#12345").is_err());
        assert!(hex_to_rgba("nothex").is_err());
    }

    #[test]
    fn hsla_round_trip_within_one() {
        let samples = [
            [255u8, 0, 0, 255],
            [0, 255, 0, 255],
            [12, 200, 99, 255],
            [128, 128, 128, 255],
            [240, 10, 250, 128],
        ];
        for c in samples {
            let back = hsla_to_rgba(rgba_to_hsla(c));
            for i in 0..4 {
                assert!(
                    (back[i] as i16 - c[i] as i16).abs() <= 1,
                    "channel {} of {:?} came back as {:?}",
                    i, c, back
                );
            }
        }
    }

    #[test]
    fn oklab_round_trip_within_one() {
        let samples = [[255u8, 0, 0, 255], [0, 0, 255, 255], [90, 200, 40, 255], [255, 255, 255, 255]];
        for c in samples {
            let back = oklab_to_rgba(rgba_to_oklab(c));
            for i in 0..3 {
                assert!(
                    (back[i] as i16 - c[i] as i16).abs() <= 1,
                    "channel {} of {:?} came back as {:?}",
                    i, c, back
                );
            }
        }
    }

    #[test]
    fn oklab_white_is_l1() {
        let lab = rgba_to_oklab([255, 255, 255, 255]);
        assert!((lab[0] - 1.0).abs() < 1e-3);
        assert!(lab[1].abs() < 1e-3);
        assert!(lab[2].abs() < 1e-3);
    }

    #[test]
    fn bilinear_hits_corners_per_rasterizer_convention() {
        let v = ParametricValues {
            north: [10.0, 0.0, 0.0, 255.0],
            east: [0.0, 20.0, 0.0, 255.0],
            south: [0.0, 0.0, 30.0, 255.0],
            west: [40.0, 40.0, 40.0, 255.0],
        };
        assert_eq!(bilinear_pixel_interpolation(&v, 0.0, 0.0)[0], v.north[0]);
        assert_eq!(bilinear_pixel_interpolation(&v, 1.0, 0.0)[1], v.east[1]);
        assert_eq!(bilinear_pixel_interpolation(&v, 1.0, 1.0)[2], v.south[2]);
        assert_eq!(bilinear_pixel_interpolation(&v, 0.0, 1.0)[0], v.west[0]);
    }

    #[test]
    fn lerp_color_forces_opaque() {
        let c = lerp_color(0.5, [0.0, 0.0, 0.0, 10.0], [100.0, 50.0, 20.0, 90.0]);
        assert_eq!(c, [50.0, 25.0, 10.0, 255.0]);
    }

    #[test]
    fn css_strings() {
        assert_eq!(
            ColorModel::Rgba.css_string([255.0, 0.0, 10.0, 255.0]),
            "rgba(255,0,10,1)"
        );
        assert_eq!(
            ColorModel::Hsla.css_string([120.0, 50.0, 25.0, 255.0]),
            "hsla(120,50%,25%,1)"
        );
    }

    #[test]
    fn model_parse_rejects_unknown() {
        assert!(ColorModel::parse("rgba").is_ok());
        assert!(ColorModel::parse("OKLAB").is_ok());
        assert!(ColorModel::parse("cmyk").is_err());
    }
}
