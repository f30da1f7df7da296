//! Easing curves for eased transitions.
//!
//! Every curve maps normalized time `u` in `[0, 1]` to an eased fraction with
//! `ease(0) == 0` and `ease(1) == 1` exactly, so a completed transition never
//! depends on floating-point luck to land on its target.

use serde::{Deserialize, Serialize};

/// An easing curve.
///
/// Deserialises from a snake_case name (`"linear"`, `"ease_out_quad"`, …)
/// or from `{"cubic_bezier": [x1, y1, x2, y2]}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// No easing.
    Linear,
    /// Quadratic deceleration.
    #[default]
    EaseOutQuad,
    /// Cubic deceleration.
    EaseOutCubic,
    /// Quadratic acceleration then deceleration.
    EaseInOutQuad,
    /// CSS `ease` == `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    Ease,
    /// CSS-like cubic Bézier with control points (0,0), (x1,y1), (x2,y2), (1,1).
    CubicBezier([f64; 4]),
}

impl Easing {
    /// Apply the curve to `u`, clamped to `[0, 1]`.
    pub fn apply(self, u: f64) -> f64 {
        let u = clamp01(u);
        if u <= 0.0 {
            return 0.0;
        }
        if u >= 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => u,
            Easing::EaseOutQuad => 1.0 - (1.0 - u) * (1.0 - u),
            Easing::EaseOutCubic => 1.0 - (1.0 - u).powi(3),
            Easing::EaseInOutQuad => {
                if u < 0.5 {
                    2.0 * u * u
                } else {
                    1.0 - (-2.0 * u + 2.0).powi(2) / 2.0
                }
            }
            Easing::Ease => cubic_bezier(u, 0.25, 0.10, 0.25, 1.00),
            Easing::CubicBezier([x1, y1, x2, y2]) => cubic_bezier(u, x1, y1, x2, y2),
        }
    }
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Evaluate a CSS-like cubic Bézier easing at normalized time `u`.
///
/// The x control coordinates are clamped to `[0, 1]` so `x(t)` stays
/// monotonic and the solve below is well defined.
pub fn cubic_bezier(u: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let x1 = clamp01(x1);
    let x2 = clamp01(x2);

    // x(t) = ((ax*t + bx)*t + cx)*t, likewise for y, with endpoints fixed
    // at (0,0) and (1,1).
    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;

    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let t = solve_t_for_x(clamp01(u), ax, bx, cx);
    sample_curve(ay, by, cy, t)
}

#[inline]
fn sample_curve(a: f64, b: f64, c: f64, t: f64) -> f64 {
    ((a * t + b) * t + c) * t
}

/// Solve `x(t) = u` for `t` in `[0, 1]`.
fn solve_t_for_x(u: f64, ax: f64, bx: f64, cx: f64) -> f64 {
    // Newton-Raphson from t = u.
    let mut t = u;
    for _ in 0..8 {
        let x = sample_curve(ax, bx, cx, t) - u;
        if x.abs() < 1e-9 {
            return t;
        }
        let dx = (3.0 * ax * t + 2.0 * bx) * t + cx;
        if dx.abs() < 1e-9 {
            break;
        }
        t -= x / dx;
        if !(0.0..=1.0).contains(&t) {
            break;
        }
    }

    // Bisection fallback.
    let mut lo = 0.0;
    let mut hi = 1.0;
    t = u;
    for _ in 0..48 {
        let x = sample_curve(ax, bx, cx, t);
        if (x - u).abs() < 1e-10 {
            return t;
        }
        if x < u {
            lo = t;
        } else {
            hi = t;
        }
        t = 0.5 * (lo + hi);
    }
    t
}
