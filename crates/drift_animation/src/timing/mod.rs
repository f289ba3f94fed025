//! Timing functions
//!
//! A timing function maps elapsed time onto one scalar component of an
//! animation. Every variant is a pure function of `(elapsed, segment)`: the
//! animation owns the clock and calls [`TimingFunction::sample`] once per
//! component per tick.
//!
//! - **Linear**: constant rate over a fixed duration
//! - **Bezier**: CSS-style cubic bezier easing over a fixed duration
//! - **Spring**: damped harmonic oscillator, settles on its own schedule
//! - **Decay**: exponential deceleration with optional rubber-band bounds

pub mod bezier;
pub mod decay;
pub mod spring;

pub use bezier::CubicBezier;
pub use decay::DecayConfig;
pub use spring::SpringConfig;

/// Rubber-band limits for one component of a decay animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

impl Bounds {
    /// Bounds spanning `a` and `b`, in either order
    pub fn new(a: f32, b: f32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }
}

/// One scalar component's slice of an animation
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Segment {
    pub from: f32,
    pub to: f32,
    /// Seconds; only meaningful for Linear and Bezier
    pub duration: f32,
    /// Initial velocity, units per second
    pub velocity: f32,
    pub bounds: Option<Bounds>,
}

impl Segment {
    pub fn new(from: f32, to: f32, duration: f32, velocity: f32) -> Self {
        Self {
            from,
            to,
            duration,
            velocity,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// Result of sampling a timing function
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub value: f32,
    /// Instantaneous velocity, units per second
    pub velocity: f32,
    pub completed: bool,
}

impl Sample {
    /// A finished sample resting at `value`
    pub fn settled(value: f32) -> Self {
        Self {
            value,
            velocity: 0.0,
            completed: true,
        }
    }
}

/// How an animation's value progresses over time
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimingFunction {
    Linear,
    Bezier(CubicBezier),
    Spring(SpringConfig),
    Decay(DecayConfig),
}

impl TimingFunction {
    pub fn linear() -> Self {
        TimingFunction::Linear
    }

    pub fn bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        TimingFunction::Bezier(CubicBezier::new(x1, y1, x2, y2))
    }

    pub fn ease() -> Self {
        TimingFunction::Bezier(CubicBezier::EASE)
    }

    pub fn ease_in() -> Self {
        TimingFunction::Bezier(CubicBezier::EASE_IN)
    }

    pub fn ease_out() -> Self {
        TimingFunction::Bezier(CubicBezier::EASE_OUT)
    }

    pub fn ease_in_out() -> Self {
        TimingFunction::Bezier(CubicBezier::EASE_IN_OUT)
    }

    pub fn spring(config: SpringConfig) -> Self {
        TimingFunction::Spring(config)
    }

    pub fn decay(config: DecayConfig) -> Self {
        TimingFunction::Decay(config)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TimingFunction::Linear => "linear",
            TimingFunction::Bezier(_) => "bezier",
            TimingFunction::Spring(_) => "spring",
            TimingFunction::Decay(_) => "decay",
        }
    }

    /// Whether the function runs for a fixed duration
    pub fn is_timed(&self) -> bool {
        matches!(self, TimingFunction::Linear | TimingFunction::Bezier(_))
    }

    /// Sample one component `elapsed` seconds into the segment
    pub fn sample(&self, elapsed: f32, segment: &Segment) -> Sample {
        match self {
            TimingFunction::Linear => sample_timed(elapsed, segment, |t| (t, 1.0)),
            TimingFunction::Bezier(curve) => {
                sample_timed(elapsed, segment, |t| (curve.solve(t), curve.slope(t)))
            }
            TimingFunction::Spring(config) => config.sample(elapsed, segment),
            TimingFunction::Decay(config) => config.sample(elapsed, segment),
        }
    }
}

impl Default for TimingFunction {
    fn default() -> Self {
        TimingFunction::ease_in_out()
    }
}

/// Shared sampling for fixed-duration curves; `ease` returns eased progress
/// and its slope for linear progress `t`
fn sample_timed<F>(elapsed: f32, segment: &Segment, ease: F) -> Sample
where
    F: Fn(f32) -> (f32, f32),
{
    if segment.duration <= 0.0 || elapsed >= segment.duration {
        return Sample::settled(segment.to);
    }

    let distance = segment.to - segment.from;
    let t = (elapsed / segment.duration).clamp(0.0, 1.0);
    let (progress, slope) = ease(t);

    Sample {
        value: segment.from + distance * progress,
        velocity: distance * slope / segment.duration,
        completed: false,
    }
}
