//! Animation scheduler
//!
//! Owns every registered animation and drives the attached ones from a single
//! per-frame tick. Targets are held weakly: dropping a target silently
//! detaches its animations on the next pass.
//!
//! - Animations live in an arena and are addressed by [`AnimationId`]
//! - Each target keeps its animations in attach order
//! - Delegate callbacks are collected during a pass and delivered after it,
//!   so delegates may add or remove animations from inside a callback

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use drift_core::Animatable;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::animation::{Animation, AnimationDelegate, StopReason};
use crate::error::{AnimationError, Result};

new_key_type! {
    /// Handle to a registered animation
    pub struct AnimationId;
}

/// Scheduler tuning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Largest time step applied in one tick, in seconds
    ///
    /// Keeps animations from jumping after the host stalls.
    pub max_frame_delta: f32,
    /// Frame rate used by [`AnimationScheduler::advance_frame`]
    pub target_fps: u32,
}

impl SchedulerConfig {
    pub fn frame_interval(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: 0.5,
            target_fps: 120,
        }
    }
}

/// Identity of a target: the address of its shared allocation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct TargetKey(usize);

impl TargetKey {
    fn of<T: ?Sized>(target: &Rc<RefCell<T>>) -> Self {
        TargetKey(Rc::as_ptr(target) as *const () as usize)
    }
}

struct TargetEntry {
    target: Weak<RefCell<dyn Animatable>>,
    animations: SmallVec<[AnimationId; 4]>,
}

impl TargetEntry {
    fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }
}

struct AnimationSlot {
    animation: Animation,
    target: Option<TargetKey>,
    /// Registered by [`AnimationScheduler::add_transient`]; freed once detached
    transient: bool,
}

impl AnimationSlot {
    fn is_running(&self) -> bool {
        self.target.is_some() && !self.animation.is_completed()
    }
}

/// A delegate callback waiting for the scheduler to release its state
enum Notice {
    Started,
    Updated,
    Stopped(StopReason),
}

struct Notification {
    id: AnimationId,
    delegate: Weak<dyn AnimationDelegate>,
    notice: Notice,
}

#[derive(Default)]
struct Notifications(Vec<Notification>);

impl Notifications {
    fn push(&mut self, id: AnimationId, animation: &Animation, notice: Notice) {
        if let Some(delegate) = animation.delegate_ref() {
            self.0.push(Notification {
                id,
                delegate,
                notice,
            });
        }
    }

    fn dispatch(self) {
        for Notification {
            id,
            delegate,
            notice,
        } in self.0
        {
            let Some(delegate) = delegate.upgrade() else {
                continue;
            };
            match notice {
                Notice::Started => delegate.animation_started(id),
                Notice::Updated => delegate.animation_updated(id),
                Notice::Stopped(reason) => delegate.animation_stopped(id, reason),
            }
        }
    }
}

/// Internal state of the animation scheduler
struct SchedulerInner {
    animations: SlotMap<AnimationId, AnimationSlot>,
    targets: IndexMap<TargetKey, TargetEntry, FxBuildHasher>,
    last_frame: Option<Instant>,
    config: SchedulerConfig,
}

impl SchedulerInner {
    fn new(config: SchedulerConfig) -> Self {
        Self {
            animations: SlotMap::with_key(),
            targets: IndexMap::default(),
            last_frame: None,
            config,
        }
    }

    fn has_running(&self) -> bool {
        self.animations.values().any(AnimationSlot::is_running)
    }

    /// Live entry for `key`, ignoring one left behind by a dropped target
    fn live_entry(&self, key: TargetKey) -> Option<&TargetEntry> {
        self.targets.get(&key).filter(|entry| entry.is_alive())
    }

    /// Detach `id` from its target, reporting `Removed` if it was still running
    fn detach(&mut self, id: AnimationId, notes: &mut Notifications) -> bool {
        let Some(slot) = self.animations.get_mut(id) else {
            return false;
        };
        let running = slot.is_running();
        let Some(key) = slot.target.take() else {
            return false;
        };
        if running {
            notes.push(id, &slot.animation, Notice::Stopped(StopReason::Removed));
        }
        if let Some(entry) = self.targets.get_mut(&key) {
            entry.animations.retain(|other| *other != id);
            if entry.animations.is_empty() {
                self.targets.shift_remove(&key);
            }
        }
        tracing::debug!("AnimationScheduler: detached {:?}", id);
        true
    }

    /// Free a transient animation that is no longer attached anywhere
    fn release(&mut self, id: AnimationId) {
        let detached = self
            .animations
            .get(id)
            .is_some_and(|slot| slot.transient && slot.target.is_none());
        if detached {
            self.animations.remove(id);
            tracing::trace!("AnimationScheduler: released transient {:?}", id);
        }
    }

    /// Drop a target entry and detach everything on it
    fn drop_target(&mut self, key: TargetKey, notes: &mut Notifications) {
        let Some(entry) = self.targets.shift_remove(&key) else {
            return;
        };
        for id in entry.animations {
            if let Some(slot) = self.animations.get_mut(id) {
                if slot.is_running() {
                    notes.push(id, &slot.animation, Notice::Stopped(StopReason::Removed));
                }
                slot.target = None;
            }
            self.release(id);
        }
    }

    fn attach(
        &mut self,
        id: AnimationId,
        key: TargetKey,
        target: Weak<RefCell<dyn Animatable>>,
        host: &dyn Animatable,
        notes: &mut Notifications,
    ) -> Result<()> {
        let slot = self
            .animations
            .get(id)
            .ok_or(AnimationError::UnknownAnimation)?;
        // Re-adding a running animation is a no-op, whichever target it names
        if slot.is_running() {
            return Ok(());
        }

        if !self.has_running() {
            // Avoid a huge first dt after an idle period
            self.last_frame = Some(Instant::now());
        }

        let slot = self
            .animations
            .get_mut(id)
            .ok_or(AnimationError::UnknownAnimation)?;
        slot.animation.bind(host)?;
        let previous = slot.target;

        if let Some(previous) = previous {
            // Completed but still attached; move it
            if let Some(entry) = self.targets.get_mut(&previous) {
                entry.animations.retain(|other| *other != id);
                if entry.animations.is_empty() {
                    self.targets.shift_remove(&previous);
                }
            }
        }

        if self.targets.get(&key).is_some_and(|entry| !entry.is_alive()) {
            // Address reused by a new target after the old one was dropped
            self.drop_target(key, notes);
        }
        let entry = self.targets.entry(key).or_insert_with(|| TargetEntry {
            target,
            animations: SmallVec::new(),
        });
        entry.animations.push(id);
        if let Some(slot) = self.animations.get_mut(id) {
            slot.target = Some(key);
            tracing::debug!(
                "AnimationScheduler: attached {:?} ({}, {})",
                id,
                slot.animation.key_path(),
                slot.animation.timing().name()
            );
        }
        Ok(())
    }

    /// One simulation pass over a snapshot of the registry
    fn advance(&mut self, dt: f32, notes: &mut Notifications) {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_frame_delta)
        } else {
            0.0
        };

        let keys: SmallVec<[TargetKey; 16]> = self.targets.keys().copied().collect();
        let mut stepped = 0usize;

        for key in keys {
            let Some(entry) = self.targets.get(&key) else {
                continue;
            };
            let ids = entry.animations.clone();
            let Some(target) = entry.target.upgrade() else {
                tracing::warn!("AnimationScheduler: target dropped with {} animations", ids.len());
                self.drop_target(key, notes);
                continue;
            };
            let Ok(mut host) = target.try_borrow_mut() else {
                tracing::warn!("AnimationScheduler: target busy, skipping this frame");
                continue;
            };

            for id in ids {
                let Some(slot) = self.animations.get_mut(id) else {
                    continue;
                };
                // Removed or finished earlier in this pass
                if slot.target != Some(key) || slot.animation.is_completed() {
                    continue;
                }

                let result = slot.animation.step(dt, &mut *host);
                stepped += 1;
                match result {
                    Ok(outcome) => {
                        if outcome.started {
                            notes.push(id, &slot.animation, Notice::Started);
                        }
                        notes.push(id, &slot.animation, Notice::Updated);
                        if outcome.completed {
                            tracing::debug!(
                                "AnimationScheduler: {:?} completed ({})",
                                id,
                                slot.animation.key_path()
                            );
                            notes.push(id, &slot.animation, Notice::Stopped(StopReason::Completed));
                            if slot.animation.removed_on_completion() {
                                self.detach(id, notes);
                                self.release(id);
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!(
                            "AnimationScheduler: {:?} ({}) failed: {}",
                            id,
                            slot.animation.key_path(),
                            err
                        );
                        notes.push(id, &slot.animation, Notice::Stopped(StopReason::Failed));
                        // Report Failed only, not Removed as well
                        slot.target = None;
                        if let Some(entry) = self.targets.get_mut(&key) {
                            entry.animations.retain(|other| *other != id);
                            if entry.animations.is_empty() {
                                self.targets.shift_remove(&key);
                            }
                        }
                        self.release(id);
                    }
                }
            }
        }

        tracing::trace!(
            "AnimationScheduler: stepped {} animations (dt={:.4}s, {} targets)",
            stepped,
            dt,
            self.targets.len()
        );
    }
}

/// The animation scheduler that ticks all attached animations
///
/// Cloning is cheap and yields another owner of the same scheduler. Components
/// that should not keep the scheduler alive hold a [`SchedulerHandle`].
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use drift_animation::{Animation, AnimationScheduler, TimingFunction};
/// use drift_core::{PropertyMap, Value};
///
/// let scheduler = AnimationScheduler::new();
/// let layer = Rc::new(RefCell::new(PropertyMap::new().with("opacity", 1.0)));
///
/// let fade = Animation::with_duration("opacity", TimingFunction::Linear, 0.0, 0.5).unwrap();
/// let id = scheduler.register(fade);
/// scheduler.add_animation(id, &layer).unwrap();
///
/// scheduler.advance(0.25);
/// assert_eq!(layer.borrow().get("opacity"), Some(Value::Scalar(0.5)));
/// ```
#[derive(Clone)]
pub struct AnimationScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner::new(config))),
        }
    }

    /// Get a weak handle to this scheduler
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.inner.borrow().config
    }

    pub fn set_config(&self, config: SchedulerConfig) {
        self.inner.borrow_mut().config = config;
    }

    // =========================================================================
    // Arena
    // =========================================================================

    /// Take ownership of an animation; it stays detached until added to a target
    pub fn register(&self, animation: Animation) -> AnimationId {
        self.inner.borrow_mut().animations.insert(AnimationSlot {
            animation,
            target: None,
            transient: false,
        })
    }

    /// Detach and drop an animation, returning it
    pub fn unregister(&self, id: AnimationId) -> Option<Animation> {
        let mut notes = Notifications::default();
        let removed = {
            let mut inner = self.inner.borrow_mut();
            inner.detach(id, &mut notes);
            inner.animations.remove(id).map(|slot| slot.animation)
        };
        notes.dispatch();
        removed
    }

    /// Apply a function to a registered animation
    ///
    /// Changes to inputs take effect the next time the animation is added.
    /// The scheduler is borrowed for the duration of `f`.
    pub fn with_animation<F, R>(&self, id: AnimationId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Animation) -> R,
    {
        self.inner
            .borrow_mut()
            .animations
            .get_mut(id)
            .map(|slot| f(&mut slot.animation))
    }

    /// Whether the animation has completed
    ///
    /// Unknown animations count as completed since nothing is animating.
    pub fn is_completed(&self, id: AnimationId) -> bool {
        self.inner
            .borrow()
            .animations
            .get(id)
            .map(|slot| slot.animation.is_completed())
            .unwrap_or(true)
    }

    pub fn contains(&self, id: AnimationId) -> bool {
        self.inner.borrow().animations.contains_key(id)
    }

    // =========================================================================
    // Attach / Detach
    // =========================================================================

    /// Attach a registered animation to `target` and bind it
    ///
    /// Adding an animation that is already running is a no-op. A completed
    /// animation that was kept attached restarts from scratch.
    pub fn add_animation<T>(&self, id: AnimationId, target: &Rc<RefCell<T>>) -> Result<()>
    where
        T: Animatable + 'static,
    {
        let host = target.try_borrow().map_err(|_| AnimationError::TargetGone)?;
        let shared: Rc<RefCell<dyn Animatable>> = target.clone();
        let weak = Rc::downgrade(&shared);

        let mut notes = Notifications::default();
        let result =
            self.inner
                .borrow_mut()
                .attach(id, TargetKey::of(target), weak, &*host, &mut notes);
        drop(host);
        notes.dispatch();
        result
    }

    /// Register `animation` and attach it to `target` in one step
    ///
    /// The scheduler keeps the animation only while it is attached: once it
    /// is removed, evicted on completion, fails, or loses its target, the id
    /// is released and stops naming anything. Nothing is registered if
    /// attaching fails.
    pub fn add_transient<T>(
        &self,
        animation: Animation,
        target: &Rc<RefCell<T>>,
    ) -> Result<AnimationId>
    where
        T: Animatable + 'static,
    {
        let id = self.inner.borrow_mut().animations.insert(AnimationSlot {
            animation,
            target: None,
            transient: true,
        });
        match self.add_animation(id, target) {
            Ok(()) => Ok(id),
            Err(err) => {
                self.inner.borrow_mut().animations.remove(id);
                Err(err)
            }
        }
    }

    /// Whether `id` is attached to `target`
    pub fn is_attached<T: ?Sized>(&self, id: AnimationId, target: &Rc<RefCell<T>>) -> bool {
        let inner = self.inner.borrow();
        let key = TargetKey::of(target);
        inner.live_entry(key).is_some()
            && inner
                .animations
                .get(id)
                .is_some_and(|slot| slot.target == Some(key))
    }

    /// Detach `id` from `target`; a no-op if it is not attached there
    pub fn remove_animation<T: ?Sized>(&self, id: AnimationId, target: &Rc<RefCell<T>>) -> bool {
        let mut notes = Notifications::default();
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let key = TargetKey::of(target);
            let attached = inner.live_entry(key).is_some()
                && inner
                    .animations
                    .get(id)
                    .is_some_and(|slot| slot.target == Some(key));
            let detached = attached && inner.detach(id, &mut notes);
            inner.release(id);
            detached
        };
        notes.dispatch();
        removed
    }

    /// Whether any animation is attached to `target`
    ///
    /// Completed animations kept attached with `removed_on_completion(false)`
    /// still count; use [`AnimationScheduler::has_active_animations`] to ask
    /// whether anything still needs ticking.
    pub fn has_animations<T: ?Sized>(&self, target: &Rc<RefCell<T>>) -> bool {
        self.inner
            .borrow()
            .live_entry(TargetKey::of(target))
            .is_some_and(|entry| !entry.animations.is_empty())
    }

    /// Ids attached to `target`, in attach order
    pub fn animations_for<T: ?Sized>(&self, target: &Rc<RefCell<T>>) -> Vec<AnimationId> {
        self.inner
            .borrow()
            .live_entry(TargetKey::of(target))
            .map(|entry| entry.animations.to_vec())
            .unwrap_or_default()
    }

    /// Detach every animation from `target`
    pub fn remove_all_animations<T: ?Sized>(&self, target: &Rc<RefCell<T>>) {
        let mut notes = Notifications::default();
        {
            let mut inner = self.inner.borrow_mut();
            let key = TargetKey::of(target);
            if inner.live_entry(key).is_some() {
                inner.drop_target(key, &mut notes);
            }
        }
        notes.dispatch();
    }

    // =========================================================================
    // Ticking
    // =========================================================================

    /// Tick all animations using the time since the previous tick
    ///
    /// Returns true if any animation is still running (needs another tick).
    pub fn tick(&self) -> bool {
        let dt = {
            let mut inner = self.inner.borrow_mut();
            let now = Instant::now();
            let dt = inner
                .last_frame
                .map(|last| (now - last).as_secs_f32())
                .unwrap_or(0.0);
            inner.last_frame = Some(now);
            dt
        };
        self.advance(dt)
    }

    /// Tick all animations by `dt` seconds
    ///
    /// Returns true if any animation is still running (needs another tick).
    pub fn advance(&self, dt: f32) -> bool {
        let mut notes = Notifications::default();
        self.inner.borrow_mut().advance(dt, &mut notes);
        notes.dispatch();
        self.has_active_animations()
    }

    /// Tick by one frame at the configured frame rate
    pub fn advance_frame(&self) -> bool {
        let dt = self.config().frame_interval();
        self.advance(dt)
    }

    /// Check if any attached animation has yet to complete
    pub fn has_active_animations(&self) -> bool {
        self.inner.borrow().has_running()
    }

    /// Number of registered animations, attached or not
    pub fn animation_count(&self) -> usize {
        self.inner.borrow().animations.len()
    }

    /// Number of targets with attached animations
    pub fn target_count(&self) -> usize {
        self.inner.borrow().targets.len()
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to the animation scheduler
///
/// This is passed to components that need to register animations.
/// It won't prevent the scheduler from being dropped; once it is, every
/// operation becomes a no-op.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl SchedulerHandle {
    /// The scheduler, if it is still alive
    pub fn upgrade(&self) -> Option<AnimationScheduler> {
        self.inner
            .upgrade()
            .map(|inner| AnimationScheduler { inner })
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn register(&self, animation: Animation) -> Option<AnimationId> {
        self.upgrade().map(|scheduler| scheduler.register(animation))
    }

    pub fn unregister(&self, id: AnimationId) -> Option<Animation> {
        self.upgrade().and_then(|scheduler| scheduler.unregister(id))
    }

    pub fn with_animation<F, R>(&self, id: AnimationId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Animation) -> R,
    {
        self.upgrade().and_then(|scheduler| scheduler.with_animation(id, f))
    }

    pub fn is_completed(&self, id: AnimationId) -> bool {
        self.upgrade()
            .map(|scheduler| scheduler.is_completed(id))
            .unwrap_or(true)
    }

    pub fn add_animation<T>(&self, id: AnimationId, target: &Rc<RefCell<T>>) -> Result<()>
    where
        T: Animatable + 'static,
    {
        self.upgrade()
            .ok_or(AnimationError::SchedulerGone)?
            .add_animation(id, target)
    }

    pub fn add_transient<T>(
        &self,
        animation: Animation,
        target: &Rc<RefCell<T>>,
    ) -> Result<AnimationId>
    where
        T: Animatable + 'static,
    {
        self.upgrade()
            .ok_or(AnimationError::SchedulerGone)?
            .add_transient(animation, target)
    }

    pub fn is_attached<T: ?Sized>(&self, id: AnimationId, target: &Rc<RefCell<T>>) -> bool {
        self.upgrade()
            .is_some_and(|scheduler| scheduler.is_attached(id, target))
    }

    pub fn remove_animation<T: ?Sized>(&self, id: AnimationId, target: &Rc<RefCell<T>>) -> bool {
        self.upgrade()
            .is_some_and(|scheduler| scheduler.remove_animation(id, target))
    }

    pub fn has_animations<T: ?Sized>(&self, target: &Rc<RefCell<T>>) -> bool {
        self.upgrade()
            .is_some_and(|scheduler| scheduler.has_animations(target))
    }

    pub fn remove_all_animations<T: ?Sized>(&self, target: &Rc<RefCell<T>>) {
        if let Some(scheduler) = self.upgrade() {
            scheduler.remove_all_animations(target);
        }
    }

    pub fn has_active_animations(&self) -> bool {
        self.upgrade()
            .is_some_and(|scheduler| scheduler.has_active_animations())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimingFunction;
    use drift_core::{PropertyMap, Value};

    fn layer() -> Rc<RefCell<PropertyMap>> {
        Rc::new(RefCell::new(PropertyMap::new().with("opacity", 1.0)))
    }

    fn fade(duration: f32) -> Animation {
        Animation::with_duration("opacity", TimingFunction::Linear, 0.0, duration).unwrap()
    }

    fn opacity(target: &Rc<RefCell<PropertyMap>>) -> f32 {
        target
            .borrow()
            .get("opacity")
            .and_then(|value| value.as_scalar())
            .unwrap()
    }

    #[test]
    fn test_register_and_attach() {
        let scheduler = AnimationScheduler::new();
        let target = layer();
        let id = scheduler.register(fade(1.0));

        assert_eq!(scheduler.animation_count(), 1);
        assert!(!scheduler.is_attached(id, &target));
        assert!(!scheduler.has_active_animations());

        scheduler.add_animation(id, &target).unwrap();
        assert!(scheduler.is_attached(id, &target));
        assert!(scheduler.has_animations(&target));
        assert!(scheduler.has_active_animations());
        assert_eq!(scheduler.target_count(), 1);
        assert_eq!(scheduler.animations_for(&target), vec![id]);
    }

    #[test]
    fn test_completion_evicts() {
        let scheduler = AnimationScheduler::new();
        let target = layer();
        let id = scheduler.register(fade(0.5));
        scheduler.add_animation(id, &target).unwrap();

        assert!(scheduler.advance(0.25));
        assert!(!scheduler.advance(0.25));
        assert!(scheduler.is_completed(id));
        assert!(!scheduler.has_animations(&target));
        assert_eq!(scheduler.target_count(), 0);
        // Evicted, but still registered for reuse
        assert_eq!(scheduler.animation_count(), 1);
        assert_eq!(opacity(&target), 0.0);
    }

    #[test]
    fn test_kept_animation_restarts_on_readd() {
        let scheduler = AnimationScheduler::new();
        let target = layer();
        let mut animation = fade(0.5);
        animation.set_removed_on_completion(false);
        let id = scheduler.register(animation);
        scheduler.add_animation(id, &target).unwrap();

        scheduler.advance(0.5);
        assert!(scheduler.is_completed(id));
        assert!(scheduler.is_attached(id, &target));
        assert!(scheduler.has_animations(&target));
        assert!(!scheduler.has_active_animations());

        target.borrow_mut().insert("opacity", 1.0);
        scheduler.add_animation(id, &target).unwrap();
        assert!(!scheduler.is_completed(id));
        scheduler.advance(0.25);
        assert_eq!(opacity(&target), 0.5);
        assert_eq!(scheduler.animations_for(&target).len(), 1);
    }

    #[test]
    fn test_transient_is_freed_when_detached() {
        let scheduler = AnimationScheduler::new();
        let target = layer();

        let completed = scheduler.add_transient(fade(0.5), &target).unwrap();
        let removed = scheduler.add_transient(fade(5.0), &target).unwrap();
        assert_eq!(scheduler.animation_count(), 2);

        scheduler.advance(0.5);
        assert!(!scheduler.contains(completed));
        assert!(scheduler.remove_animation(removed, &target));
        assert!(!scheduler.contains(removed));

        let dropped = layer();
        let orphan = scheduler.add_transient(fade(1.0), &dropped).unwrap();
        drop(dropped);
        scheduler.advance(0.1);
        assert!(!scheduler.contains(orphan));
        assert_eq!(scheduler.animation_count(), 0);
        assert_eq!(scheduler.target_count(), 0);
    }

    #[test]
    fn test_kept_transient_stays_until_removed() {
        let scheduler = AnimationScheduler::new();
        let target = layer();
        let mut animation = fade(0.5);
        animation.set_removed_on_completion(false);

        let id = scheduler.add_transient(animation, &target).unwrap();
        scheduler.advance(0.5);
        assert!(scheduler.is_completed(id));
        assert!(scheduler.contains(id));
        // Completed animations kept attached still count for has_animations
        assert!(scheduler.has_animations(&target));
        assert!(!scheduler.has_active_animations());

        scheduler.remove_all_animations(&target);
        assert!(!scheduler.contains(id));
        assert!(!scheduler.has_animations(&target));
    }

    #[test]
    fn test_failed_transient_is_not_registered() {
        let scheduler = AnimationScheduler::new();
        let target = Rc::new(RefCell::new(PropertyMap::new()));
        let err = scheduler.add_transient(fade(1.0), &target).unwrap_err();
        assert!(matches!(err, AnimationError::KeyPath(_)));
        assert_eq!(scheduler.animation_count(), 0);
    }

    #[test]
    fn test_dead_target_is_pruned() {
        let scheduler = AnimationScheduler::new();
        let target = layer();
        let id = scheduler.register(fade(1.0));
        scheduler.add_animation(id, &target).unwrap();

        drop(target);
        assert!(!scheduler.advance(0.1));
        assert_eq!(scheduler.target_count(), 0);
        assert!(scheduler.contains(id));
        assert!(!scheduler.is_completed(id));
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let scheduler = AnimationScheduler::with_config(SchedulerConfig {
            max_frame_delta: 0.1,
            target_fps: 60,
        });
        let target = layer();
        let id = scheduler.register(fade(1.0));
        scheduler.add_animation(id, &target).unwrap();

        scheduler.advance(5.0);
        assert!((opacity(&target) - 0.9).abs() < 1e-5);
        scheduler.advance(f32::NAN);
        assert!((opacity(&target) - 0.9).abs() < 1e-5);
        scheduler.advance_frame();
        assert!((opacity(&target) - (0.9 - 1.0 / 60.0)).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_animation() {
        let scheduler = AnimationScheduler::new();
        let target = layer();
        let id = scheduler.register(fade(1.0));
        assert!(scheduler.unregister(id).is_some());
        assert_eq!(
            scheduler.add_animation(id, &target),
            Err(AnimationError::UnknownAnimation)
        );
        assert!(scheduler.is_completed(id));
        assert!(scheduler.with_animation(id, |a| a.elapsed()).is_none());
    }

    #[test]
    fn test_handle_outlives_scheduler() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let target = layer();

        let id = handle.register(fade(1.0)).unwrap();
        handle.add_animation(id, &target).unwrap();
        assert!(handle.is_alive());
        assert!(handle.is_attached(id, &target));

        drop(scheduler);
        assert!(!handle.is_alive());
        assert!(handle.register(fade(1.0)).is_none());
        assert_eq!(
            handle.add_animation(id, &target),
            Err(AnimationError::SchedulerGone)
        );
        assert!(!handle.has_animations(&target));
        assert_eq!(target.borrow().get("opacity"), Some(Value::Scalar(1.0)));
    }

    #[test]
    fn test_tick_uses_wall_clock() {
        let scheduler = AnimationScheduler::new();
        let target = layer();
        let id = scheduler.register(fade(60.0));
        scheduler.add_animation(id, &target).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(scheduler.tick());
        let value = opacity(&target);
        assert!(value < 1.0);
        assert!(value > 0.9);
    }
}
