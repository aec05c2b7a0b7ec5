// ============================================================================
// GPU SHADERS — all WGSL code kept inline for containment
// ============================================================================

// ============================================================================
// MESH SHADER — subdivision-leaf quads with smoothed UVs and a grid color
// texture sampled bilinearly per fragment
// ============================================================================
//
// Every vertex of a leaf quad carries the leaf's four UV corners and four
// screen corners.  The vertex stage turns them into one UV per vertex:
// either the flat average (retro "simple UV" mode) or an inverse-distance
// blend keyed on how close this vertex sits to each corner — corner
// vertices keep their own UV, and the rasterizer's interpolation spreads
// the blend smoothly across curved quads.
//
// The fragment stage fetches the four grid-vertex texels around the
// leaf's patch and mixes them with the interpolated UV.  Texels hold raw
// model-space components (RGBA bytes, HSLA, or Oklab as f32); the shader
// converts to display RGB after the mix so gradients interpolate in the
// selected model.
pub const MESH_SHADER: &str = r#"
struct MeshUniforms {
    viewport: vec2<f32>,     // Render target size in pixels
    grid: vec2<f32>,         // (columns, rows) of the patch grid
    simple_uv: u32,          // 1 = flat per-leaf UV
    color_model: u32,        // 0 = RGBA, 1 = HSLA, 2 = Oklab
    _pad: vec2<f32>,
};

@group(0) @binding(0) var<uniform> u: MeshUniforms;
@group(1) @binding(0) var grid_tex: texture_2d<f32>;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv_north: vec2<f32>,
    @location(2) uv_east: vec2<f32>,
    @location(3) uv_south: vec2<f32>,
    @location(4) uv_west: vec2<f32>,
    @location(5) corner_nw: vec2<f32>,
    @location(6) corner_ne: vec2<f32>,
    @location(7) corner_se: vec2<f32>,
    @location(8) corner_sw: vec2<f32>,
    @location(9) texcoord: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) texcoord: vec2<f32>,
};

const UV_EPS: f32 = 1e-4;

@vertex
fn vs_mesh(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;

    // Pixel coords to NDC, y flipped for wgpu conventions
    let ndc = vec2<f32>(
        in.position.x / u.viewport.x * 2.0 - 1.0,
        1.0 - in.position.y / u.viewport.y * 2.0,
    );
    out.position = vec4<f32>(ndc, 0.0, 1.0);

    if (u.simple_uv == 1u) {
        out.uv = (in.uv_north + in.uv_east + in.uv_south + in.uv_west) * 0.25;
    } else {
        let wn = 1.0 / (distance(in.position, in.corner_nw) + UV_EPS);
        let we = 1.0 / (distance(in.position, in.corner_ne) + UV_EPS);
        let ws = 1.0 / (distance(in.position, in.corner_se) + UV_EPS);
        let ww = 1.0 / (distance(in.position, in.corner_sw) + UV_EPS);
        out.uv = (in.uv_north * wn + in.uv_east * we + in.uv_south * ws + in.uv_west * ww)
            / (wn + we + ws + ww);
    }

    out.texcoord = in.texcoord;
    return out;
}

@fragment
fn fs_mesh(in: VertexOutput) -> @location(0) vec4<f32> {
    // Texel of this patch's NW grid vertex; neighbours sit at +1
    let base = vec2<i32>(round(in.texcoord * u.grid));
    let cn = textureLoad(grid_tex, base, 0);
    let ce = textureLoad(grid_tex, base + vec2<i32>(1, 0), 0);
    let cs = textureLoad(grid_tex, base + vec2<i32>(1, 1), 0);
    let cw = textureLoad(grid_tex, base + vec2<i32>(0, 1), 0);

    // top edge (north, east), bottom edge (west, south)
    let top = mix(cn, ce, in.uv.x);
    let bot = mix(cw, cs, in.uv.x);
    let c = mix(top, bot, in.uv.y);

    var rgb: vec3<f32>;
    switch u.color_model {
        case 1u: { rgb = hsla_to_rgb(c); }
        case 2u: { rgb = oklab_to_rgb(c); }
        default: { rgb = c.rgb / 255.0; }
    }
    return vec4<f32>(rgb, 1.0);
}

// ---- HSLA (h 0..360, s/l 0..100) ------------------------------------------

fn hsla_to_rgb(c: vec4<f32>) -> vec3<f32> {
    let h = fract(c.x / 360.0);
    let s = clamp(c.y / 100.0, 0.0, 1.0);
    let l = clamp(c.z / 100.0, 0.0, 1.0);
    if (s < 1e-6) {
        return vec3<f32>(l, l, l);
    }
    var q: f32;
    if (l < 0.5) {
        q = l * (1.0 + s);
    } else {
        q = l + s - l * s;
    }
    let p = 2.0 * l - q;
    return vec3<f32>(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    );
}

fn hue_to_rgb(p: f32, q: f32, t_in: f32) -> f32 {
    var t = t_in;
    if (t < 0.0) { t = t + 1.0; }
    if (t > 1.0) { t = t - 1.0; }
    if (t < 1.0 / 6.0) { return p + (q - p) * 6.0 * t; }
    if (t < 1.0 / 2.0) { return q; }
    if (t < 2.0 / 3.0) { return p + (q - p) * (2.0 / 3.0 - t) * 6.0; }
    return p;
}

// ---- Oklab (L 0..1, a/b ~±0.5) --------------------------------------------

fn oklab_to_rgb(c: vec4<f32>) -> vec3<f32> {
    let l_ = c.x + 0.3963378 * c.y + 0.2158038 * c.z;
    let m_ = c.x - 0.1055613 * c.y - 0.0638542 * c.z;
    let s_ = c.x - 0.0894842 * c.y - 1.2914855 * c.z;

    let l = l_ * l_ * l_;
    let m = m_ * m_ * m_;
    let s = s_ * s_ * s_;

    let lin = vec3<f32>(
        4.0767417 * l - 3.3077116 * m + 0.2309699 * s,
        -1.2684380 * l + 2.6097574 * m - 0.3413194 * s,
        -0.0041961 * l - 0.7034186 * m + 1.7076147 * s,
    );
    return linear_to_srgb(clamp(lin, vec3<f32>(0.0), vec3<f32>(1.0)));
}

fn linear_to_srgb(c: vec3<f32>) -> vec3<f32> {
    let lo = c * 12.92;
    let hi = 1.055 * pow(c, vec3<f32>(1.0 / 2.4)) - 0.055;
    return select(hi, lo, c <= vec3<f32>(0.0031308));
}
"#;
