//! Decay (deceleration) timing
//!
//! Exponential velocity decay, `v(t) = v0 * exp(-k t)`, the motion of a
//! flicked scroll view. The position is the integral of the velocity and comes
//! to rest at `from + v0 / k`.
//!
//! When bounds are set, motion past a bound is rubber-banded: the excursion
//! is compressed so it never exceeds the configured bounce allowance, then
//! relaxes back onto the bound. Each axis is banded independently. Motion
//! that starts outside the bounds still starts at `from`, then relaxes onto
//! the nearer bound; only travel past the starting offset is banded.

use drift_core::{components_for_value, value_from_components, Components, Value};

use super::{Sample, Segment};
use crate::error::{AnimationError, Result};

/// Compression applied to motion past a bound
const RUBBER_BAND_COEFFICIENT: f32 = 0.55;

/// Decay constant used when a configuration has a non-positive constant
const FALLBACK_CONSTANT: f32 = 1.0;

/// Configuration for a decay animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecayConfig {
    /// Exponential decay rate, per second
    pub constant: f32,
    /// Furthest distance motion may travel past a bound
    pub bounce: f32,
    /// Speed below which motion is considered stopped
    pub sensitivity: f32,
}

impl DecayConfig {
    pub fn new(constant: f32) -> Self {
        Self {
            constant,
            bounce: 0.0,
            sensitivity: 0.5,
        }
    }

    /// Build from a per-millisecond velocity retention rate (scroll view style)
    pub fn from_rate_per_ms(rate: f32) -> Self {
        Self::new(-rate.ln() * 1000.0)
    }

    /// Normal scroll deceleration
    pub fn normal() -> Self {
        Self::from_rate_per_ms(0.998)
    }

    /// Fast scroll deceleration
    pub fn fast() -> Self {
        Self::from_rate_per_ms(0.99)
    }

    pub fn with_bounce(mut self, bounce: f32) -> Self {
        self.bounce = bounce.max(0.0);
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity.max(0.0);
        self
    }

    fn effective_constant(&self) -> f32 {
        if self.constant > 0.0 && self.constant.is_finite() {
            self.constant
        } else {
            FALLBACK_CONSTANT
        }
    }

    /// Where motion starting at `from` with `velocity` comes to rest
    pub fn resting_value(&self, from: f32, velocity: f32) -> f32 {
        from + velocity / self.effective_constant()
    }

    /// Component-wise [`DecayConfig::resting_value`] for structured values
    pub fn resting_value_of(&self, from: &Value, velocity: &Value) -> Result<Value> {
        if !from.same_shape(velocity) {
            return Err(AnimationError::ShapeMismatch {
                expected: from.kind(),
                found: velocity.kind(),
            });
        }
        let from_components = components_for_value(from)?;
        let velocity_components = components_for_value(velocity)?;
        let rest: Components = from_components
            .iter()
            .zip(velocity_components.iter())
            .map(|(f, v)| self.resting_value(*f, *v))
            .collect();
        Ok(value_from_components(&rest, from)?)
    }

    /// Seconds until `velocity` decays below the sensitivity threshold
    pub fn duration_to_rest(&self, velocity: f32) -> f32 {
        let speed = velocity.abs();
        if speed <= self.sensitivity {
            return 0.0;
        }
        if self.sensitivity <= 0.0 {
            return f32::INFINITY;
        }
        (speed / self.sensitivity).ln() / self.effective_constant()
    }

    /// Where a segment's motion ends and its decay rate
    ///
    /// A velocity heading toward `to` sets the rate that lands exactly there.
    /// A velocity that contradicts `to` wins: the motion decays from it at the
    /// configured constant. Without a velocity the configured constant carries
    /// the motion to `to`.
    fn motion(&self, segment: &Segment) -> (f32, f32) {
        let distance = segment.to - segment.from;
        let v = segment.velocity;
        if v != 0.0 && v.is_finite() {
            if distance != 0.0 {
                let rate = v / distance;
                if rate > 0.0 && rate.is_finite() {
                    return (segment.to, rate);
                }
            }
            return (self.resting_value(segment.from, v), self.effective_constant());
        }
        (segment.to, self.effective_constant())
    }

    pub(crate) fn sample(&self, elapsed: f32, segment: &Segment) -> Sample {
        let (to, k) = self.motion(segment);
        let rest = match segment.bounds {
            Some(bounds) => bounds.clamp(to),
            None => to,
        };
        let distance = to - segment.from;
        let t = elapsed.max(0.0);

        let decay = (-k * t).exp();
        let raw = segment.from + distance * (1.0 - decay);
        let raw_velocity = k * distance * decay;

        let Some(bounds) = segment.bounds else {
            if raw_velocity.abs() < self.sensitivity {
                return Sample::settled(rest);
            }
            return Sample {
                value: raw,
                velocity: raw_velocity,
                completed: false,
            };
        };

        let (bound, direction) = if raw > bounds.max {
            (bounds.max, 1.0)
        } else if raw < bounds.min {
            (bounds.min, -1.0)
        } else {
            if raw_velocity.abs() < self.sensitivity {
                return Sample::settled(rest);
            }
            return Sample {
                value: raw,
                velocity: raw_velocity,
                completed: false,
            };
        };

        // Offsets past the bound, positive outward
        let overshoot = direction * (raw - bound);
        let initial = (direction * (segment.from - bound)).max(0.0);
        let outward_speed = direction * raw_velocity;

        // Up to the starting offset the motion is followed as is; anything
        // beyond it is compressed into the bounce allowance
        let t_cross = crossing_time(segment.from, distance, bound, k);
        let relaxing = t > t_cross;
        let relax = (-k * (t - t_cross).max(0.0)).exp();
        let beyond = overshoot - initial;
        let offset = overshoot.min(initial) + rubber_band(beyond, self.bounce);
        let excursion = offset * relax;

        let offset_rate = if beyond < 0.0 || outward_speed < 0.0 {
            outward_speed
        } else {
            rubber_band_slope(beyond, self.bounce) * outward_speed
        };
        let relax_rate = if relaxing { k } else { 0.0 };
        let speed = relax * offset_rate - relax_rate * excursion;

        if raw_velocity.abs() < self.sensitivity && k * excursion < self.sensitivity {
            return Sample::settled(rest);
        }

        Sample {
            value: bound + direction * excursion,
            velocity: direction * speed,
            completed: false,
        }
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self::normal()
    }
}

/// Time at which `from + distance * (1 - exp(-k t))` reaches `bound`, or 0
/// if it starts past it
fn crossing_time(from: f32, distance: f32, bound: f32, k: f32) -> f32 {
    if distance == 0.0 {
        return 0.0;
    }
    let fraction = (bound - from) / distance;
    if fraction <= 0.0 {
        return 0.0;
    }
    if fraction >= 1.0 {
        return f32::INFINITY;
    }
    -(1.0 - fraction).ln() / k
}

/// Compressed excursion for an overshoot `offset` past a bound, always below
/// `bounce`
fn rubber_band(offset: f32, bounce: f32) -> f32 {
    if bounce <= 0.0 || offset <= 0.0 {
        return 0.0;
    }
    bounce * (1.0 - 1.0 / (offset * RUBBER_BAND_COEFFICIENT / bounce + 1.0))
}

fn rubber_band_slope(offset: f32, bounce: f32) -> f32 {
    if bounce <= 0.0 || offset < 0.0 {
        return 0.0;
    }
    let denom = offset * RUBBER_BAND_COEFFICIENT / bounce + 1.0;
    RUBBER_BAND_COEFFICIENT / (denom * denom)
}
