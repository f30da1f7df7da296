//! Axis-aligned boxes and scalar interpolation.

use serde::{Deserialize, Serialize};

/// Linear interpolation from `a` to `b` by `t`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// An axis-aligned rectangle: origin `(x, y)` and size `(width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl GeometryBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom edge (`y + height`).
    pub fn y2(&self) -> f64 {
        self.y + self.height
    }

    /// Right edge (`x + width`).
    pub fn x2(&self) -> f64 {
        self.x + self.width
    }

    /// Whether all four components are finite and the size is non-negative.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Interpolate origin and size independently toward `other`.
    ///
    /// `progress` is not clamped; callers pass a value in `[0, 1]`.
    pub fn interpolate(&self, other: &GeometryBox, progress: f64) -> GeometryBox {
        GeometryBox {
            x: lerp(self.x, other.x, progress),
            y: lerp(self.y, other.y, progress),
            width: lerp(self.width, other.width, progress),
            height: lerp(self.height, other.height, progress),
        }
    }
}
