//! Thread-shared scheduler
//!
//! Hosts that do not want to pass a scheduler around can use the one owned by
//! the current thread. It is created on first use and lives as long as the
//! thread; the UI thread is the intended owner.

use std::cell::RefCell;
use std::rc::Rc;

use drift_core::Animatable;

use crate::animation::Animation;
use crate::error::Result;
use crate::scheduler::{AnimationId, AnimationScheduler, SchedulerHandle};

thread_local! {
    static SCHEDULER: AnimationScheduler = AnimationScheduler::new();
}

/// Run `f` with this thread's scheduler
pub fn with_scheduler<F, R>(f: F) -> R
where
    F: FnOnce(&AnimationScheduler) -> R,
{
    SCHEDULER.with(f)
}

/// Get this thread's scheduler
pub fn get_scheduler() -> AnimationScheduler {
    with_scheduler(AnimationScheduler::clone)
}

/// Get a weak handle to this thread's scheduler
pub fn handle() -> SchedulerHandle {
    with_scheduler(AnimationScheduler::handle)
}

// ============================================================================
// Target Extension
// ============================================================================

/// Animate a shared target directly through the thread's scheduler
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use drift_animation::{shared, Animation, AnimatableExt, TimingFunction};
/// use drift_core::PropertyMap;
///
/// let view = Rc::new(RefCell::new(PropertyMap::new().with("opacity", 0.0)));
/// let fade_in = Animation::with_duration("opacity", TimingFunction::ease_out(), 1.0, 0.2).unwrap();
///
/// let id = view.add_animation(fade_in).unwrap();
/// assert!(view.has_animations());
///
/// view.remove_animation(id);
/// assert!(!view.has_animations());
/// assert!(!shared::with_scheduler(|scheduler| scheduler.contains(id)));
/// ```
pub trait AnimatableExt {
    /// Register `animation` and attach it to this target
    ///
    /// The thread's scheduler frees the animation once it is detached, so
    /// fire-and-forget animations do not accumulate.
    fn add_animation(&self, animation: Animation) -> Result<AnimationId>;

    /// Detach `id` from this target
    fn remove_animation(&self, id: AnimationId) -> bool;

    fn remove_all_animations(&self);

    fn has_animations(&self) -> bool;

    fn animation_ids(&self) -> Vec<AnimationId>;
}

impl<T: Animatable + 'static> AnimatableExt for Rc<RefCell<T>> {
    fn add_animation(&self, animation: Animation) -> Result<AnimationId> {
        with_scheduler(|scheduler| scheduler.add_transient(animation, self))
    }

    fn remove_animation(&self, id: AnimationId) -> bool {
        with_scheduler(|scheduler| scheduler.remove_animation(id, self))
    }

    fn remove_all_animations(&self) {
        with_scheduler(|scheduler| scheduler.remove_all_animations(self))
    }

    fn has_animations(&self) -> bool {
        with_scheduler(|scheduler| scheduler.has_animations(self))
    }

    fn animation_ids(&self) -> Vec<AnimationId> {
        with_scheduler(|scheduler| scheduler.animations_for(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimingFunction;
    use drift_core::{Point, PropertyMap, Value};

    #[test]
    fn test_shared_scheduler_is_per_thread() {
        let first = handle();
        let second = handle();
        assert!(first.is_alive());

        let id = first
            .register(Animation::with_duration("x", TimingFunction::Linear, 1.0, 1.0).unwrap())
            .unwrap();
        assert!(second.with_animation(id, |_| ()).is_some());

        let elsewhere = std::thread::spawn(move || {
            with_scheduler(|scheduler| scheduler.animation_count())
        })
        .join()
        .unwrap();
        assert_eq!(elsewhere, 0);
        get_scheduler().unregister(id);
    }

    #[test]
    fn test_extension_drives_target() {
        let view = Rc::new(RefCell::new(
            PropertyMap::new().with("center", Point::new(0.0, 0.0)),
        ));
        let slide =
            Animation::with_duration("center.x", TimingFunction::Linear, 40.0, 1.0).unwrap();
        let id = view.add_animation(slide).unwrap();
        assert_eq!(view.animation_ids(), vec![id]);

        with_scheduler(|scheduler| scheduler.advance(0.5));
        assert_eq!(
            view.borrow().get("center"),
            Some(Value::Point(Point::new(20.0, 0.0)))
        );

        view.remove_all_animations();
        assert!(!view.has_animations());
        assert!(!get_scheduler().contains(id));
    }

    #[test]
    fn test_completed_extension_animations_are_freed() {
        let view = Rc::new(RefCell::new(PropertyMap::new().with("opacity", 0.0)));
        let before = get_scheduler().animation_count();

        for _ in 0..100 {
            let pulse =
                Animation::with_duration("opacity", TimingFunction::Linear, 1.0, 0.1).unwrap();
            view.add_animation(pulse).unwrap();
            while with_scheduler(|scheduler| scheduler.advance(0.05)) {}
        }

        assert!(!view.has_animations());
        assert_eq!(get_scheduler().animation_count(), before);
        assert_eq!(view.borrow().get("opacity"), Some(Value::Scalar(1.0)));
    }

    #[test]
    fn test_extension_unregisters_on_failure() {
        let view = Rc::new(RefCell::new(PropertyMap::new()));
        let before = get_scheduler().animation_count();
        let missing =
            Animation::with_duration("opacity", TimingFunction::Linear, 0.0, 1.0).unwrap();
        assert!(view.add_animation(missing).is_err());
        assert_eq!(get_scheduler().animation_count(), before);
    }
}
