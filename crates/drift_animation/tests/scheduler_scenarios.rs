//! Integration tests for the animation scheduler
//!
//! These tests verify that:
//! - Timed animations advance by exactly the ticked delta and evict on completion
//! - Removal stops updates immediately and leaves the last written value
//! - Adding the same animation twice neither duplicates it nor double-advances it
//! - Delegates observe started/updated/stopped in order and may re-enter the scheduler
//! - A failing animation is evicted without disturbing its neighbours

use std::cell::RefCell;
use std::rc::Rc;

use drift_animation::{
    Animation, AnimationDelegate, AnimationId, AnimationScheduler, SchedulerHandle, StopReason,
    TimingFunction,
};
use drift_core::{Color, Point, PropertyMap, Rect, Value};

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "drift_animation=debug".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Event {
    Started(AnimationId),
    Updated(AnimationId),
    Stopped(AnimationId, StopReason),
}

#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<Event>>,
}

impl Recorder {
    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl AnimationDelegate for Recorder {
    fn animation_started(&self, id: AnimationId) {
        self.events.borrow_mut().push(Event::Started(id));
    }

    fn animation_updated(&self, id: AnimationId) {
        self.events.borrow_mut().push(Event::Updated(id));
    }

    fn animation_stopped(&self, id: AnimationId, reason: StopReason) {
        self.events.borrow_mut().push(Event::Stopped(id, reason));
    }
}

fn view() -> Rc<RefCell<PropertyMap>> {
    Rc::new(RefCell::new(
        PropertyMap::new()
            .with("opacity", 0.0)
            .with("position", Point::new(0.0, 0.0))
            .with("frame", Rect::new(0.0, 0.0, 100.0, 100.0))
            .with("tint", Color::BLACK),
    ))
}

fn scalar(target: &Rc<RefCell<PropertyMap>>, key: &str) -> f32 {
    target
        .borrow()
        .get(key)
        .and_then(|value| value.as_scalar())
        .unwrap()
}

fn linear_to_100(delegate: &Rc<Recorder>) -> Animation {
    Animation::builder("opacity")
        .timing(TimingFunction::Linear)
        .from(0.0)
        .to(100.0)
        .duration(1.0)
        .delegate(delegate)
        .build()
        .unwrap()
}

#[test]
fn test_linear_four_quarter_ticks() {
    init_tracing();
    let scheduler = AnimationScheduler::new();
    let target = view();
    let recorder = Rc::new(Recorder::default());

    let id = scheduler.register(linear_to_100(&recorder));
    scheduler.add_animation(id, &target).unwrap();

    for (tick, expected) in [25.0, 50.0, 75.0].into_iter().enumerate() {
        assert!(scheduler.advance(0.25), "tick {} ended the animation", tick + 1);
        assert_eq!(scalar(&target, "opacity"), expected);
        assert!(!scheduler.is_completed(id));
    }

    assert!(!scheduler.advance(0.25));
    assert_eq!(scalar(&target, "opacity"), 100.0);
    assert!(scheduler.is_completed(id));
    assert!(!scheduler.has_animations(&target));

    assert_eq!(
        recorder.take(),
        vec![
            Event::Started(id),
            Event::Updated(id),
            Event::Updated(id),
            Event::Updated(id),
            Event::Updated(id),
            Event::Stopped(id, StopReason::Completed),
        ]
    );
}

#[test]
fn test_removal_after_second_tick_holds_value() {
    init_tracing();
    let scheduler = AnimationScheduler::new();
    let target = view();
    let recorder = Rc::new(Recorder::default());

    let id = scheduler.register(linear_to_100(&recorder));
    scheduler.add_animation(id, &target).unwrap();
    scheduler.advance(0.25);
    scheduler.advance(0.25);

    assert!(scheduler.remove_animation(id, &target));
    assert!(!scheduler.is_attached(id, &target));
    // Second removal is a no-op
    assert!(!scheduler.remove_animation(id, &target));

    scheduler.advance(0.25);
    scheduler.advance(0.25);
    assert_eq!(scalar(&target, "opacity"), 50.0);
    assert!(!scheduler.is_completed(id));

    let events = recorder.take();
    assert_eq!(events.last(), Some(&Event::Stopped(id, StopReason::Removed)));
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, Event::Stopped(..)))
            .count(),
        1
    );
}

#[test]
fn test_add_is_idempotent() {
    init_tracing();
    let scheduler = AnimationScheduler::new();
    let target = view();
    let other = view();
    let recorder = Rc::new(Recorder::default());

    let id = scheduler.register(linear_to_100(&recorder));
    scheduler.add_animation(id, &target).unwrap();
    scheduler.add_animation(id, &target).unwrap();
    // Running animations stay where they are
    scheduler.add_animation(id, &other).unwrap();

    assert_eq!(scheduler.animations_for(&target), vec![id]);
    assert!(!scheduler.is_attached(id, &other));
    assert_eq!(scheduler.target_count(), 1);

    scheduler.advance(0.25);
    assert_eq!(scalar(&target, "opacity"), 25.0);
    assert_eq!(scalar(&other, "opacity"), 0.0);
}

#[test]
fn test_readd_after_completion_restarts() {
    init_tracing();
    let scheduler = AnimationScheduler::new();
    let target = view();
    let recorder = Rc::new(Recorder::default());

    let id = scheduler.register(linear_to_100(&recorder));
    scheduler.add_animation(id, &target).unwrap();
    scheduler.advance(0.5);
    scheduler.advance(0.5);
    assert!(scheduler.is_completed(id));
    recorder.take();

    // Explicit from-value: restarts at 0 even though the target reads 100
    scheduler.add_animation(id, &target).unwrap();
    scheduler.advance(0.25);
    assert_eq!(scalar(&target, "opacity"), 25.0);
    assert_eq!(recorder.take(), vec![Event::Started(id), Event::Updated(id)]);
}

/// Removes its own animation from inside the first update callback
struct RemoveOnUpdate {
    scheduler: SchedulerHandle,
    target: Rc<RefCell<PropertyMap>>,
    stops: RefCell<Vec<StopReason>>,
}

impl AnimationDelegate for RemoveOnUpdate {
    fn animation_updated(&self, id: AnimationId) {
        self.scheduler.remove_animation(id, &self.target);
    }

    fn animation_stopped(&self, _id: AnimationId, reason: StopReason) {
        self.stops.borrow_mut().push(reason);
    }
}

#[test]
fn test_delegate_may_remove_during_callback() {
    init_tracing();
    let scheduler = AnimationScheduler::new();
    let target = view();
    let delegate = Rc::new(RemoveOnUpdate {
        scheduler: scheduler.handle(),
        target: target.clone(),
        stops: RefCell::new(Vec::new()),
    });

    let animation = Animation::builder("position.x")
        .timing(TimingFunction::Linear)
        .to(100.0)
        .duration(1.0)
        .delegate(&delegate)
        .build()
        .unwrap();
    let id = scheduler.register(animation);
    scheduler.add_animation(id, &target).unwrap();

    assert!(!scheduler.advance(0.1));
    scheduler.advance(0.1);
    assert_eq!(
        target.borrow().get("position"),
        Some(Value::Point(Point::new(10.0, 0.0)))
    );
    assert_eq!(*delegate.stops.borrow(), vec![StopReason::Removed]);
}

/// Starts a follow-up animation when the first one completes
struct Chain {
    scheduler: SchedulerHandle,
    target: Rc<RefCell<PropertyMap>>,
    next: AnimationId,
}

impl AnimationDelegate for Chain {
    fn animation_stopped(&self, _id: AnimationId, reason: StopReason) {
        if reason == StopReason::Completed {
            self.scheduler.add_animation(self.next, &self.target).unwrap();
        }
    }
}

#[test]
fn test_completion_callback_can_chain() {
    init_tracing();
    let scheduler = AnimationScheduler::new();
    let target = view();

    let second = scheduler.register(
        Animation::with_duration("opacity", TimingFunction::Linear, 0.0, 0.5).unwrap(),
    );
    let chain = Rc::new(Chain {
        scheduler: scheduler.handle(),
        target: target.clone(),
        next: second,
    });
    let first = scheduler.register(
        Animation::builder("opacity")
            .timing(TimingFunction::Linear)
            .to(1.0)
            .duration(0.5)
            .delegate(&chain)
            .build()
            .unwrap(),
    );
    scheduler.add_animation(first, &target).unwrap();

    scheduler.advance(0.5);
    assert_eq!(scalar(&target, "opacity"), 1.0);
    assert!(scheduler.is_attached(second, &target));

    scheduler.advance(0.25);
    assert_eq!(scalar(&target, "opacity"), 0.5);
}

#[test]
fn test_failure_evicts_only_offender() {
    init_tracing();
    let scheduler = AnimationScheduler::new();
    let target = view();
    let recorder = Rc::new(Recorder::default());

    let fade = scheduler.register(linear_to_100(&recorder));
    let slide = scheduler.register(
        Animation::builder("position")
            .timing(TimingFunction::Linear)
            .to(Point::new(100.0, 40.0))
            .duration(1.0)
            .delegate(&recorder)
            .build()
            .unwrap(),
    );
    scheduler.add_animation(fade, &target).unwrap();
    scheduler.add_animation(slide, &target).unwrap();
    scheduler.advance(0.25);
    recorder.take();

    target.borrow_mut().remove("opacity");
    assert!(scheduler.advance(0.25));

    assert!(!scheduler.is_attached(fade, &target));
    assert!(scheduler.is_attached(slide, &target));
    assert_eq!(
        target.borrow().get("position"),
        Some(Value::Point(Point::new(50.0, 20.0)))
    );
    assert_eq!(
        recorder.take(),
        vec![
            Event::Stopped(fade, StopReason::Failed),
            Event::Updated(slide),
        ]
    );
}

#[test]
fn test_dropped_target_reports_removed() {
    init_tracing();
    let scheduler = AnimationScheduler::new();
    let target = view();
    let recorder = Rc::new(Recorder::default());

    let id = scheduler.register(linear_to_100(&recorder));
    scheduler.add_animation(id, &target).unwrap();
    scheduler.advance(0.25);
    recorder.take();

    drop(target);
    assert!(!scheduler.advance(0.25));
    assert_eq!(recorder.take(), vec![Event::Stopped(id, StopReason::Removed)]);
    assert_eq!(scheduler.target_count(), 0);
}

#[test]
fn test_remove_all_animations() {
    init_tracing();
    let scheduler = AnimationScheduler::new();
    let target = view();
    let recorder = Rc::new(Recorder::default());

    let fade = scheduler.register(linear_to_100(&recorder));
    let grow = scheduler.register(
        Animation::with_duration("frame.size", TimingFunction::ease(), Point::new(1.0, 1.0), 1.0)
            .unwrap(),
    );
    scheduler.add_animation(fade, &target).unwrap();
    // Point does not fit a size: rejected at bind, never attached
    assert!(scheduler.add_animation(grow, &target).is_err());
    assert!(!scheduler.is_attached(grow, &target));

    scheduler.remove_all_animations(&target);
    assert!(!scheduler.has_animations(&target));
    assert!(!scheduler.has_active_animations());
    assert_eq!(recorder.take(), vec![Event::Stopped(fade, StopReason::Removed)]);
}

#[test]
fn test_structured_values_animate_per_component() {
    init_tracing();
    let scheduler = AnimationScheduler::new();
    let target = view();

    let frame = scheduler.register(
        Animation::with_duration(
            "frame",
            TimingFunction::Linear,
            Rect::new(100.0, 50.0, 200.0, 300.0),
            1.0,
        )
        .unwrap(),
    );
    let tint = scheduler.register(
        Animation::with_duration("tint.red", TimingFunction::Linear, 1.0, 0.5).unwrap(),
    );
    scheduler.add_animation(frame, &target).unwrap();
    scheduler.add_animation(tint, &target).unwrap();

    scheduler.advance(0.25);
    assert_eq!(
        target.borrow().get("frame"),
        Some(Value::Rect(Rect::new(25.0, 12.5, 125.0, 150.0)))
    );
    assert_eq!(
        target.borrow().get("tint"),
        Some(Value::Color(Color::rgba(0.5, 0.0, 0.0, 1.0)))
    );

    scheduler.advance(0.5);
    assert!(scheduler.advance(0.125));
    assert!(!scheduler.advance(0.125));
    assert_eq!(
        target.borrow().get("frame"),
        Some(Value::Rect(Rect::new(100.0, 50.0, 200.0, 300.0)))
    );
}
