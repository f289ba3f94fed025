//! Animation error types

use drift_core::{KeyPathError, ValueKind};
use thiserror::Error;

/// An animation's inputs do not describe a runnable animation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Timed animations need exactly two of duration, velocity and to-value
    #[error("timed animations need exactly two of duration, velocity and to-value, got {supplied}")]
    InputCount { supplied: usize },

    #[error("{0} animations require a to-value")]
    MissingToValue(&'static str),

    #[error("{0} animations require a velocity")]
    MissingVelocity(&'static str),

    #[error("{0} animations do not accept a duration")]
    DurationNotAllowed(&'static str),

    #[error("invalid duration: {0}")]
    InvalidDuration(f32),

    /// Velocity cannot reach the to-value: zero on a component that must
    /// move, or a decay velocity pointing away from it
    #[error("velocity cannot reach the to-value")]
    UnreachableTarget,

    #[error("bounds only apply to decay animations")]
    BoundsRequireDecay,

    #[error("key path is empty")]
    EmptyKeyPath,
}

/// Errors raised while configuring, binding or ticking animations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    #[error("Invalid animation: {0}")]
    Configuration(#[from] ConfigurationError),

    /// From, to, velocity or bounds disagree in value kind
    #[error("Shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: ValueKind, found: ValueKind },

    #[error("Key path error: {0}")]
    KeyPath(#[from] KeyPathError),

    /// The animation's target was dropped or is borrowed elsewhere
    #[error("Animation target is no longer available")]
    TargetGone,

    /// The id does not name a registered animation
    #[error("Unknown animation")]
    UnknownAnimation,

    /// A handle outlived its scheduler
    #[error("Animation scheduler has been dropped")]
    SchedulerGone,

    /// The animation was stepped before being bound to a target
    #[error("Animation is not bound to a target")]
    Unbound,
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
