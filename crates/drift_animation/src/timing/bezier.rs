//! Cubic bezier easing
//!
//! The curve runs from (0, 0) to (1, 1); only the two inner control points
//! are configurable. Progress `t` is treated as the curve's x coordinate and
//! the eased progress is the matching y.

/// A cubic bezier timing curve, CSS `cubic-bezier(x1, y1, x2, y2)` style
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CubicBezier {
    /// The identity curve; output equals linear interpolation
    pub const LINEAR: CubicBezier = CubicBezier::new(0.0, 0.0, 1.0, 1.0);
    pub const EASE: CubicBezier = CubicBezier::new(0.25, 0.1, 0.25, 1.0);
    pub const EASE_IN: CubicBezier = CubicBezier::new(0.42, 0.0, 1.0, 1.0);
    pub const EASE_OUT: CubicBezier = CubicBezier::new(0.0, 0.0, 0.58, 1.0);
    pub const EASE_IN_OUT: CubicBezier = CubicBezier::new(0.42, 0.0, 0.58, 1.0);

    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// All four control points, including the fixed endpoints
    pub fn control_points(&self) -> [(f32, f32); 4] {
        [(0.0, 0.0), (self.x1, self.y1), (self.x2, self.y2), (1.0, 1.0)]
    }

    /// Eased progress for linear progress `t` (clamped to 0..=1)
    pub fn solve(&self, t: f32) -> f32 {
        // Endpoints are always exact
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        let p = self.parameter_for_x(t as f64);
        bezier_sample(p, self.y1 as f64, self.y2 as f64) as f32
    }

    /// Slope of the eased curve (dy/dx) at linear progress `t`
    pub fn slope(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0) as f64;
        let p = self.parameter_for_x(t);
        let dx = bezier_slope(p, self.x1 as f64, self.x2 as f64);
        if dx.abs() < 1e-7 {
            return 0.0;
        }
        (bezier_slope(p, self.y1 as f64, self.y2 as f64) / dx) as f32
    }

    /// Solve for the curve parameter `p` where bezier_x(p) == x.
    ///
    /// Newton-Raphson, falling back to binary search if the slope is too flat.
    /// Computed in f64 to avoid f32 jitter at high frame rates.
    fn parameter_for_x(&self, x: f64) -> f64 {
        let x1 = self.x1 as f64;
        let x2 = self.x2 as f64;

        let mut p = x;
        for _ in 0..8 {
            let err = bezier_sample(p, x1, x2) - x;
            if err.abs() < 1e-7 {
                return p;
            }
            let slope = bezier_slope(p, x1, x2);
            if slope.abs() < 1e-7 {
                break;
            }
            p -= err / slope;
        }

        // Binary search fallback (always converges)
        let mut lo = 0.0_f64;
        let mut hi = 1.0_f64;
        p = x;
        for _ in 0..32 {
            let val = bezier_sample(p, x1, x2);
            if (val - x).abs() < 1e-7 {
                break;
            }
            if val < x {
                lo = p;
            } else {
                hi = p;
            }
            p = (lo + hi) * 0.5;
        }
        p
    }
}

impl Default for CubicBezier {
    fn default() -> Self {
        Self::EASE_IN_OUT
    }
}

/// Evaluate cubic bezier at parameter t: B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

/// Derivative of cubic bezier: B'(t) = 3(1-t)²·p1 + 6(1-t)t·(p2-p1) + 3t²·(1-p2)
#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}
