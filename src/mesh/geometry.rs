use serde::{Deserialize, Serialize};

/// 2D point / vector with f64 components.
///
/// Canvas-space when used as geometry (normalized `[0,100]` before the
/// surface maps it to pixels), unit-square `[0,1]²` when used as a UV
/// coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[inline]
    pub fn distance_sq(self, other: Vec2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance(self, other: Vec2) -> f64 {
        self.distance_sq(other).sqrt()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, s: f64) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl std::ops::AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

/// `(1-t)·a + t·b`, componentwise. Exact at both endpoints.
#[inline]
pub fn lerp(t: f64, a: Vec2, b: Vec2) -> Vec2 {
    let mt = 1.0 - t;
    Vec2::new(mt * a.x + t * b.x, mt * a.y + t * b.y)
}

#[inline]
pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}

/// Average of an ordered sequence of points.
pub fn mean(points: &[Vec2]) -> Vec2 {
    let mut acc = Vec2::ZERO;
    for p in points {
        acc += *p;
    }
    acc * (1.0 / points.len() as f64)
}

#[inline]
pub fn clamp(lo: f64, hi: f64, x: f64) -> f64 {
    x.max(lo).min(hi)
}
