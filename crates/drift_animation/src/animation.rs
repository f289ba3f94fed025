//! Property animations
//!
//! An [`Animation`] drives one key path on a target from a start value to an
//! end value using a [`TimingFunction`]. Animations are plain values until they
//! are registered with an [`AnimationScheduler`](crate::AnimationScheduler) and
//! attached to a target, at which point they are bound:
//!
//! - the start value is captured from the target if none was supplied
//! - the missing input (duration, velocity or to-value) is derived
//! - elapsed time and the completed flag are reset
//!
//! Each tick then samples every scalar component of the value, rebuilds the
//! structured value and writes it back through the key path.

use std::rc::{Rc, Weak};

use drift_core::{components_for_value, set_target_value, target_value, value_from_components};
use drift_core::{Animatable, Components, Value};
use smallvec::SmallVec;

use crate::error::{AnimationError, ConfigurationError, Result};
use crate::scheduler::AnimationId;
use crate::timing::{Bounds, Segment, TimingFunction};

/// Why an animation stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The timing function reported completion
    Completed,
    /// The animation was removed before completing, or its target was dropped
    Removed,
    /// A tick failed to read or write the target
    Failed,
}

/// Receives lifecycle notifications for an animation
///
/// Callbacks run on the tick thread once the scheduler has finished its pass,
/// so they may freely call back into the scheduler.
pub trait AnimationDelegate {
    /// First tick after the animation was attached
    fn animation_started(&self, _id: AnimationId) {}

    /// The animation wrote a new value to its target
    fn animation_updated(&self, _id: AnimationId) {}

    fn animation_stopped(&self, _id: AnimationId, _reason: StopReason) {}
}

/// What a single step did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct StepOutcome {
    pub started: bool,
    pub completed: bool,
}

/// Per-component motion resolved at bind time
#[derive(Clone, Debug)]
struct Plan {
    template: Value,
    to: Value,
    segments: SmallVec<[Segment; 8]>,
}

/// An animation of one key path on a target
#[derive(Clone)]
pub struct Animation {
    key_path: String,
    timing: TimingFunction,
    from: Option<Value>,
    to: Option<Value>,
    duration: Option<f32>,
    velocity: Option<Value>,
    bounds: Option<(Value, Value)>,
    removed_on_completion: bool,
    delegate: Option<Weak<dyn AnimationDelegate>>,

    plan: Option<Plan>,
    elapsed: f32,
    completed: bool,
    started: bool,
}

impl Animation {
    pub fn builder(key_path: impl Into<String>) -> AnimationBuilder {
        AnimationBuilder::new(key_path)
    }

    /// Animate `key_path` to `to` over `duration` seconds
    pub fn with_duration(
        key_path: impl Into<String>,
        timing: TimingFunction,
        to: impl Into<Value>,
        duration: f32,
    ) -> Result<Self> {
        Self::builder(key_path)
            .timing(timing)
            .to(to)
            .duration(duration)
            .build()
    }

    /// Animate `key_path` to `to`, starting with `velocity`
    ///
    /// For timed curves the duration is derived from the velocity; springs
    /// inherit it as their initial velocity.
    pub fn with_velocity(
        key_path: impl Into<String>,
        timing: TimingFunction,
        to: impl Into<Value>,
        velocity: impl Into<Value>,
    ) -> Result<Self> {
        Self::builder(key_path)
            .timing(timing)
            .to(to)
            .velocity(velocity)
            .build()
    }

    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    pub fn timing(&self) -> TimingFunction {
        self.timing
    }

    /// Start value, if one was supplied rather than captured
    pub fn from_value(&self) -> Option<Value> {
        self.from
    }

    /// End value as supplied
    pub fn to_value(&self) -> Option<Value> {
        self.to
    }

    pub fn duration(&self) -> Option<f32> {
        self.duration
    }

    pub fn velocity(&self) -> Option<Value> {
        self.velocity
    }

    /// End value after binding, including derived ones
    pub fn resolved_to_value(&self) -> Option<Value> {
        self.plan.as_ref().map(|plan| plan.to)
    }

    /// Start value after binding, including one captured from the target
    pub fn resolved_from_value(&self) -> Option<Value> {
        let plan = self.plan.as_ref()?;
        let from: Components = plan.segments.iter().map(|s| s.from).collect();
        value_from_components(&from, &plan.template).ok()
    }

    /// Duration after binding; `None` for open-ended springs
    pub fn resolved_duration(&self) -> Option<f32> {
        let plan = self.plan.as_ref()?;
        match self.timing {
            TimingFunction::Linear | TimingFunction::Bezier(_) => {
                plan.segments.first().map(|s| s.duration)
            }
            TimingFunction::Decay(config) => Some(
                plan.segments
                    .iter()
                    .map(|s| config.duration_to_rest(s.velocity))
                    .fold(0.0, f32::max),
            ),
            TimingFunction::Spring(_) => None,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_bound(&self) -> bool {
        self.plan.is_some()
    }

    pub fn removed_on_completion(&self) -> bool {
        self.removed_on_completion
    }

    pub fn set_removed_on_completion(&mut self, removed: bool) {
        self.removed_on_completion = removed;
    }

    pub fn delegate(&self) -> Option<Rc<dyn AnimationDelegate>> {
        self.delegate.as_ref().and_then(Weak::upgrade)
    }

    /// Attach a delegate; the animation only keeps a weak reference
    pub fn set_delegate<D: AnimationDelegate + 'static>(&mut self, delegate: &Rc<D>) {
        self.delegate = Some(downgrade_delegate(delegate));
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    pub(crate) fn delegate_ref(&self) -> Option<Weak<dyn AnimationDelegate>> {
        self.delegate.clone()
    }

    /// Rewind to the start without rebinding
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.completed = false;
        self.started = false;
    }

    /// Value at `elapsed` seconds into the bound motion
    pub fn value_at(&self, elapsed: f32) -> Result<Value> {
        let plan = self.plan.as_ref().ok_or(AnimationError::Unbound)?;
        let (components, _) = self.sample_components(plan, elapsed);
        Ok(value_from_components(&components, &plan.template)?)
    }

    fn sample_components(&self, plan: &Plan, elapsed: f32) -> (Components, bool) {
        let mut completed = true;
        let components = plan
            .segments
            .iter()
            .map(|segment| {
                let sample = self.timing.sample(elapsed, segment);
                completed &= sample.completed;
                sample.value
            })
            .collect();
        (components, completed)
    }

    /// Capture the start value from `target` and resolve every component's
    /// motion. Leaves the animation untouched on error.
    pub(crate) fn bind(&mut self, target: &dyn Animatable) -> Result<()> {
        let current = target_value(target, &self.key_path)?;
        let from = self.from.unwrap_or(current);
        for value in [Some(from), self.to, self.velocity] {
            expect_shape(&current, value)?;
        }

        let from_components = components_for_value(&from)?;
        let to_components = self.to.map(|to| components_for_value(&to)).transpose()?;
        let velocity_components = self
            .velocity
            .map(|velocity| components_for_value(&velocity))
            .transpose()?;

        let segments = match self.timing {
            TimingFunction::Linear | TimingFunction::Bezier(_) => timed_segments(
                &from_components,
                to_components.as_deref(),
                velocity_components.as_deref(),
                self.duration,
            )?,
            TimingFunction::Spring(_) => {
                let to = to_components.ok_or(ConfigurationError::MissingToValue("spring"))?;
                from_components
                    .iter()
                    .enumerate()
                    .map(|(i, &from)| {
                        let velocity = velocity_components.as_ref().map_or(0.0, |v| v[i]);
                        Segment::new(from, to[i], f32::INFINITY, velocity)
                    })
                    .collect()
            }
            TimingFunction::Decay(config) => {
                let velocity =
                    velocity_components.ok_or(ConfigurationError::MissingVelocity("decay"))?;
                if let Some(to) = &to_components {
                    decay_reaches(&from_components, to, &velocity)?;
                }
                let bounds = match self.bounds {
                    Some((min, max)) => {
                        expect_shape(&current, Some(min))?;
                        expect_shape(&current, Some(max))?;
                        Some((components_for_value(&min)?, components_for_value(&max)?))
                    }
                    None => None,
                };
                from_components
                    .iter()
                    .enumerate()
                    .map(|(i, &from)| {
                        let to = to_components
                            .as_ref()
                            .map_or_else(|| config.resting_value(from, velocity[i]), |to| to[i]);
                        let segment = Segment::new(from, to, f32::INFINITY, velocity[i]);
                        match &bounds {
                            Some((min, max)) => segment.with_bounds(Bounds::new(min[i], max[i])),
                            None => segment,
                        }
                    })
                    .collect()
            }
        };

        let to: Components = segments.iter().map(|s| s.to).collect();
        let to = value_from_components(&to, &from)?;

        self.plan = Some(Plan {
            template: from,
            to,
            segments,
        });
        self.reset();
        Ok(())
    }

    /// Advance by `dt` seconds and write the new value to `target`
    pub(crate) fn step(&mut self, dt: f32, target: &mut dyn Animatable) -> Result<StepOutcome> {
        let plan = self.plan.as_ref().ok_or(AnimationError::Unbound)?;
        let started = !self.started;
        let elapsed = self.elapsed + dt.max(0.0);

        let (components, completed) = self.sample_components(plan, elapsed);
        let value = value_from_components(&components, &plan.template)?;
        set_target_value(target, &self.key_path, value)?;

        self.started = true;
        self.elapsed = elapsed;
        self.completed = completed;
        Ok(StepOutcome { started, completed })
    }
}

impl std::fmt::Debug for Animation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("key_path", &self.key_path)
            .field("timing", &self.timing)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("velocity", &self.velocity)
            .field("elapsed", &self.elapsed)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

fn downgrade_delegate<D: AnimationDelegate + 'static>(delegate: &Rc<D>) -> Weak<dyn AnimationDelegate> {
    let delegate: Rc<dyn AnimationDelegate> = delegate.clone();
    Rc::downgrade(&delegate)
}

fn expect_shape(expected: &Value, value: Option<Value>) -> Result<()> {
    match value {
        Some(value) if !expected.same_shape(&value) => Err(AnimationError::ShapeMismatch {
            expected: expected.kind(),
            found: value.kind(),
        }),
        _ => Ok(()),
    }
}

/// A decay only lands on a supplied to-value if every component's velocity
/// heads toward it; a component that stays put must not move.
fn decay_reaches(from: &[f32], to: &[f32], velocity: &[f32]) -> Result<()> {
    for ((&from, &to), &v) in from.iter().zip(to).zip(velocity) {
        let distance = to - from;
        let reachable = if distance == 0.0 {
            v == 0.0
        } else {
            let rate = v / distance;
            rate > 0.0 && rate.is_finite()
        };
        if !reachable {
            return Err(ConfigurationError::UnreachableTarget.into());
        }
    }
    Ok(())
}

/// Resolve Linear/Bezier segments from exactly two of duration, to-value and
/// velocity. All components share one duration.
fn timed_segments(
    from: &[f32],
    to: Option<&[f32]>,
    velocity: Option<&[f32]>,
    duration: Option<f32>,
) -> Result<SmallVec<[Segment; 8]>> {
    let segments = match (to, velocity, duration) {
        (Some(to), None, Some(duration)) => from
            .iter()
            .zip(to)
            .map(|(&from, &to)| {
                let velocity = if duration > 0.0 { (to - from) / duration } else { 0.0 };
                Segment::new(from, to, duration, velocity)
            })
            .collect(),
        (None, Some(velocity), Some(duration)) => from
            .iter()
            .zip(velocity)
            .map(|(&from, &v)| Segment::new(from, from + v * duration, duration, v))
            .collect(),
        (Some(to), Some(velocity), None) => {
            let mut duration = 0.0_f32;
            for ((&from, &to), &v) in from.iter().zip(to).zip(velocity) {
                let distance = (to - from).abs();
                if distance == 0.0 {
                    continue;
                }
                if v == 0.0 || !v.is_finite() {
                    return Err(ConfigurationError::UnreachableTarget.into());
                }
                duration = duration.max(distance / v.abs());
            }
            from.iter()
                .zip(to)
                .zip(velocity)
                .map(|((&from, &to), &v)| Segment::new(from, to, duration, v))
                .collect()
        }
        _ => {
            let supplied = [to.is_some(), velocity.is_some(), duration.is_some()]
                .iter()
                .filter(|supplied| **supplied)
                .count();
            return Err(ConfigurationError::InputCount { supplied }.into());
        }
    };
    Ok(segments)
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Animation`]
///
/// ```rust
/// use drift_animation::{Animation, TimingFunction};
///
/// let fade = Animation::builder("opacity")
///     .timing(TimingFunction::Linear)
///     .to(0.0)
///     .duration(0.25)
///     .build()
///     .unwrap();
/// assert_eq!(fade.key_path(), "opacity");
/// ```
#[must_use]
pub struct AnimationBuilder {
    key_path: String,
    timing: TimingFunction,
    from: Option<Value>,
    to: Option<Value>,
    duration: Option<f32>,
    velocity: Option<Value>,
    bounds: Option<(Value, Value)>,
    removed_on_completion: bool,
    delegate: Option<Weak<dyn AnimationDelegate>>,
}

impl AnimationBuilder {
    fn new(key_path: impl Into<String>) -> Self {
        Self {
            key_path: key_path.into(),
            timing: TimingFunction::default(),
            from: None,
            to: None,
            duration: None,
            velocity: None,
            bounds: None,
            removed_on_completion: true,
            delegate: None,
        }
    }

    pub fn timing(mut self, timing: TimingFunction) -> Self {
        self.timing = timing;
        self
    }

    pub fn from(mut self, from: impl Into<Value>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn to(mut self, to: impl Into<Value>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Duration in seconds
    pub fn duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Velocity in units per second, one component per value component
    pub fn velocity(mut self, velocity: impl Into<Value>) -> Self {
        self.velocity = Some(velocity.into());
        self
    }

    /// Rubber-band limits for decay animations
    pub fn bounds(mut self, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        self.bounds = Some((min.into(), max.into()));
        self
    }

    pub fn removed_on_completion(mut self, removed: bool) -> Self {
        self.removed_on_completion = removed;
        self
    }

    pub fn delegate<D: AnimationDelegate + 'static>(mut self, delegate: &Rc<D>) -> Self {
        self.delegate = Some(downgrade_delegate(delegate));
        self
    }

    pub fn build(self) -> Result<Animation> {
        if self.key_path.is_empty() {
            return Err(ConfigurationError::EmptyKeyPath.into());
        }
        if let Some(duration) = self.duration {
            if !(duration >= 0.0 && duration.is_finite()) {
                return Err(ConfigurationError::InvalidDuration(duration).into());
            }
        }

        let name = self.timing.name();
        match self.timing {
            TimingFunction::Linear | TimingFunction::Bezier(_) => {
                let supplied = [self.to.is_some(), self.velocity.is_some(), self.duration.is_some()]
                    .iter()
                    .filter(|supplied| **supplied)
                    .count();
                if supplied != 2 {
                    return Err(ConfigurationError::InputCount { supplied }.into());
                }
            }
            TimingFunction::Spring(_) => {
                if self.to.is_none() {
                    return Err(ConfigurationError::MissingToValue(name).into());
                }
                if self.duration.is_some() {
                    return Err(ConfigurationError::DurationNotAllowed(name).into());
                }
            }
            TimingFunction::Decay(_) => {
                if self.velocity.is_none() {
                    return Err(ConfigurationError::MissingVelocity(name).into());
                }
                if self.duration.is_some() {
                    return Err(ConfigurationError::DurationNotAllowed(name).into());
                }
            }
        }
        if self.bounds.is_some() && !matches!(self.timing, TimingFunction::Decay(_)) {
            return Err(ConfigurationError::BoundsRequireDecay.into());
        }

        // Every supplied value must decompose and agree on shape
        let bounds = self.bounds.into_iter().flat_map(|(min, max)| [min, max]);
        let supplied = [self.from, self.to, self.velocity]
            .into_iter()
            .flatten()
            .chain(bounds);
        let mut reference: Option<Value> = None;
        for value in supplied {
            components_for_value(&value)?;
            match reference {
                Some(ref expected) => expect_shape(expected, Some(value))?,
                None => reference = Some(value),
            }
        }

        Ok(Animation {
            key_path: self.key_path,
            timing: self.timing,
            from: self.from,
            to: self.to,
            duration: self.duration,
            velocity: self.velocity,
            bounds: self.bounds,
            removed_on_completion: self.removed_on_completion,
            delegate: self.delegate,
            plan: None,
            elapsed: 0.0,
            completed: false,
            started: false,
        })
    }
}
