//! Drift Animation System
//!
//! Property animations driven by timing functions and a per-frame scheduler.
//!
//! # Features
//!
//! - **Timing Functions**: linear, cubic bezier, closed-form springs, and
//!   exponential decay with rubber-band bounds
//! - **Structured Values**: points, rects, colors, insets and transforms are
//!   animated per component and written back through key paths
//! - **Derived Inputs**: supply two of duration, velocity and to-value; the
//!   third is resolved when the animation is attached
//! - **Scheduler**: weak target registry, idempotent attach, deferred
//!   delegate callbacks
//! - **Thread-Shared Scheduler**: an optional per-thread scheduler plus the
//!   [`AnimatableExt`] extension for shared targets

pub mod animation;
pub mod error;
pub mod scheduler;
pub mod shared;
pub mod timing;

pub use animation::{Animation, AnimationBuilder, AnimationDelegate, StopReason};
pub use error::{AnimationError, ConfigurationError, Result};
pub use scheduler::{AnimationId, AnimationScheduler, SchedulerConfig, SchedulerHandle};
pub use shared::{get_scheduler, with_scheduler, AnimatableExt};
pub use timing::{
    Bounds, CubicBezier, DecayConfig, Sample, Segment, SpringConfig, TimingFunction,
};
