//! Spring physics timing
//!
//! Damped harmonic oscillator solved in closed form, so the position at any
//! elapsed time depends only on the starting displacement and velocity. Covers
//! underdamped (oscillating), critically damped and overdamped springs.

use super::{Sample, Segment};

/// Displacement below which a spring may come to rest
const REST_DISPLACEMENT: f64 = 0.001;
/// Velocity below which a spring may come to rest
const REST_VELOCITY: f64 = 0.01;

/// Configuration for a spring animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    /// Spring constant (stiffness)
    pub tension: f32,
    pub damping: f32,
    pub mass: f32,
}

impl SpringConfig {
    /// Create a new spring configuration
    pub fn new(tension: f32, damping: f32, mass: f32) -> Self {
        Self {
            tension,
            damping,
            mass,
        }
    }

    /// A gentle, slow spring (good for page transitions)
    pub fn gentle() -> Self {
        Self::new(120.0, 14.0, 1.0)
    }

    /// A wobbly spring with overshoot (good for playful UI)
    pub fn wobbly() -> Self {
        Self::new(180.0, 12.0, 1.0)
    }

    /// A stiff, snappy spring (good for buttons)
    pub fn stiff() -> Self {
        Self::new(400.0, 30.0, 1.0)
    }

    /// A very stiff spring with minimal oscillation (good for quick responses)
    pub fn snappy() -> Self {
        Self::new(600.0, 40.0, 1.0)
    }

    /// A slow spring with no overshoot (critically damped)
    pub fn molasses() -> Self {
        Self::new(100.0, 20.0, 1.0)
    }

    /// Calculate critical damping for this spring's tension and mass
    pub fn critical_damping(&self) -> f32 {
        2.0 * (self.tension * self.mass).sqrt()
    }

    /// Check if the spring is underdamped (will oscillate)
    pub fn is_underdamped(&self) -> bool {
        !self.is_critically_damped() && self.damping < self.critical_damping()
    }

    /// Check if the spring is critically damped (no oscillation, fastest settling)
    pub fn is_critically_damped(&self) -> bool {
        (self.damping - self.critical_damping()).abs() < 0.01
    }

    /// Check if the spring is overdamped (slow settling, no oscillation)
    pub fn is_overdamped(&self) -> bool {
        !self.is_critically_damped() && self.damping > self.critical_damping()
    }

    /// Displacement and velocity after `t` seconds, starting from
    /// displacement `x0` (relative to the rest position) and velocity `v0`
    pub fn oscillate(&self, x0: f32, v0: f32, t: f32) -> (f32, f32) {
        let k = self.tension as f64;
        let c = self.damping as f64;
        let m = self.mass as f64;
        let (x0, v0, t) = (x0 as f64, v0 as f64, t as f64);

        let omega = (k / m).sqrt();
        let zeta = c / (2.0 * (k * m).sqrt());

        let (x, v) = if self.is_critically_damped() {
            let b = v0 + omega * x0;
            let envelope = (-omega * t).exp();
            let x = envelope * (x0 + b * t);
            let v = envelope * (b - omega * (x0 + b * t));
            (x, v)
        } else if zeta < 1.0 {
            let omega_d = omega * (1.0 - zeta * zeta).sqrt();
            let decay = zeta * omega;
            let envelope = (-decay * t).exp();
            let a = x0;
            let b = (v0 + decay * x0) / omega_d;
            let (sin, cos) = (omega_d * t).sin_cos();
            let x = envelope * (a * cos + b * sin);
            let v = envelope * ((b * omega_d - a * decay) * cos - (a * omega_d + b * decay) * sin);
            (x, v)
        } else {
            let root = (zeta * zeta - 1.0).sqrt();
            let r1 = -omega * (zeta - root);
            let r2 = -omega * (zeta + root);
            let c2 = (v0 - r1 * x0) / (r2 - r1);
            let c1 = x0 - c2;
            let (e1, e2) = ((r1 * t).exp(), (r2 * t).exp());
            (c1 * e1 + c2 * e2, r1 * c1 * e1 + r2 * c2 * e2)
        };

        (x as f32, v as f32)
    }

    /// Upper bounds on |displacement| and |velocity| from `t` onwards
    ///
    /// Both bounds never increase with `t`, so once a spring is at rest it
    /// stays at rest.
    fn rest_envelope(&self, x0: f64, v0: f64, t: f64) -> (f64, f64) {
        let k = self.tension as f64;
        let c = self.damping as f64;
        let m = self.mass as f64;

        let omega = (k / m).sqrt();
        let zeta = c / (2.0 * (k * m).sqrt());

        if self.is_critically_damped() {
            // t * exp(-omega t) peaks at t = 1 / omega
            let linear = if t * omega >= 1.0 {
                t * (-omega * t).exp()
            } else {
                1.0 / (omega * std::f64::consts::E)
            };
            let b = v0 + omega * x0;
            let envelope = (-omega * t).exp();
            let x = x0.abs() * envelope + b.abs() * linear;
            let v = (b - omega * x0).abs() * envelope + omega * b.abs() * linear;
            (x, v)
        } else if zeta < 1.0 {
            let omega_d = omega * (1.0 - zeta * zeta).sqrt();
            let decay = zeta * omega;
            let b = (v0 + decay * x0) / omega_d;
            let amplitude = (-decay * t).exp() * (x0 * x0 + b * b).sqrt();
            (amplitude, amplitude * omega)
        } else {
            let root = (zeta * zeta - 1.0).sqrt();
            let r1 = -omega * (zeta - root);
            let r2 = -omega * (zeta + root);
            let c2 = (v0 - r1 * x0) / (r2 - r1);
            let c1 = x0 - c2;
            let (e1, e2) = ((r1 * t).exp(), (r2 * t).exp());
            (
                c1.abs() * e1 + c2.abs() * e2,
                (r1 * c1).abs() * e1 + (r2 * c2).abs() * e2,
            )
        }
    }

    pub(crate) fn sample(&self, elapsed: f32, segment: &Segment) -> Sample {
        if !(self.tension > 0.0 && self.mass > 0.0) || self.damping < 0.0 {
            return Sample::settled(segment.to);
        }

        let t = elapsed.max(0.0);
        let x0 = segment.from - segment.to;
        let (x_bound, v_bound) = self.rest_envelope(x0 as f64, segment.velocity as f64, t as f64);
        if x_bound < REST_DISPLACEMENT && v_bound < REST_VELOCITY {
            return Sample::settled(segment.to);
        }

        let (x, v) = self.oscillate(x0, segment.velocity, t);
        Sample {
            value: segment.to + x,
            velocity: v,
            completed: false,
        }
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::stiff()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(from: f32, to: f32) -> Segment {
        Segment::new(from, to, f32::INFINITY, 0.0)
    }

    #[test]
    fn test_spring_presets() {
        // Presets oscillate slightly for a snappy feel
        assert!(SpringConfig::wobbly().is_underdamped());
        assert!(SpringConfig::gentle().is_underdamped());
        assert!(SpringConfig::stiff().is_underdamped());

        assert!(SpringConfig::molasses().is_critically_damped());
        assert!(SpringConfig::new(100.0, 40.0, 1.0).is_overdamped());
    }

    #[test]
    fn test_starts_at_from() {
        for config in [
            SpringConfig::wobbly(),
            SpringConfig::molasses(),
            SpringConfig::new(100.0, 40.0, 1.0),
        ] {
            let s = config.sample(0.0, &segment(0.0, 100.0));
            assert!((s.value - 0.0).abs() < 1e-4);
            assert!(!s.completed);
        }
    }

    #[test]
    fn test_spring_settles_to_target() {
        for config in [
            SpringConfig::stiff(),
            SpringConfig::molasses(),
            SpringConfig::new(100.0, 40.0, 1.0),
        ] {
            let s = config.sample(10.0, &segment(0.0, 100.0));
            assert!(s.completed);
            assert_eq!(s.value, 100.0);
            assert_eq!(s.velocity, 0.0);
        }
    }

    #[test]
    fn test_underdamped_overshoots() {
        let config = SpringConfig::wobbly();
        let peak = (1..120)
            .map(|i| config.sample(i as f32 / 60.0, &segment(0.0, 100.0)).value)
            .fold(f32::MIN, f32::max);
        assert!(peak > 100.0);
    }

    #[test]
    fn test_critically_damped_never_overshoots() {
        let config = SpringConfig::molasses();
        for i in 0..600 {
            let s = config.sample(i as f32 / 60.0, &segment(0.0, 100.0));
            assert!(s.value <= 100.0 + 1e-3);
        }
    }

    #[test]
    fn test_inherits_velocity() {
        // Starting at rest position with velocity moves away from it first
        let config = SpringConfig::stiff();
        let s = config.sample(0.01, &Segment::new(50.0, 50.0, f32::INFINITY, 500.0));
        assert!(s.value > 50.0);
        assert!(!s.completed);
    }

    #[test]
    fn test_oscillate_matches_numeric_derivative() {
        let config = SpringConfig::gentle();
        let h = 1e-2;
        let (_, v) = config.oscillate(-100.0, 0.0, 0.3);
        let (before, _) = config.oscillate(-100.0, 0.0, 0.3 - h);
        let (after, _) = config.oscillate(-100.0, 0.0, 0.3 + h);
        assert!(((after - before) / (2.0 * h) - v).abs() < 1.0);
    }

    #[test]
    fn test_completion_is_permanent() {
        for config in [
            SpringConfig::gentle(),
            SpringConfig::wobbly(),
            SpringConfig::molasses(),
            SpringConfig::new(100.0, 40.0, 1.0),
        ] {
            let segment = Segment::new(0.0, 100.0, f32::INFINITY, -250.0);
            let mut settled = false;
            for i in 0..3000 {
                let s = config.sample(i as f32 / 120.0, &segment);
                assert!(!settled || s.completed);
                settled = s.completed;
            }
            assert!(settled);
        }
    }

    #[test]
    fn test_envelope_bounds_motion() {
        let config = SpringConfig::wobbly();
        for i in 0..240 {
            let t = i as f64 / 120.0;
            let (x, v) = config.oscillate(-100.0, 40.0, t as f32);
            let (x_bound, v_bound) = config.rest_envelope(-100.0, 40.0, t);
            assert!((x as f64).abs() <= x_bound + 1e-3);
            assert!((v as f64).abs() <= v_bound + 1e-3);
        }
    }

    #[test]
    fn test_different_mass() {
        // Heavier mass should still settle, just slower
        let config = SpringConfig::new(400.0, 25.0, 2.0);
        let early = config.sample(0.5, &segment(0.0, 100.0));
        assert!(!early.completed);
        let late = config.sample(8.0, &segment(0.0, 100.0));
        assert!(late.completed);
        assert!(late.value.is_finite());
    }
}
