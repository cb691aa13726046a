//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use horizon_touch::{
    GestureArena, GestureState, Point, RawTouch, RecognizerId, Touch, TouchDispatcher, TouchId,
    TouchPhase, ViewHost, ViewId,
};
use slotmap::SlotMap;

/// A rectangular view in window coordinates.
pub struct TestView {
    pub parent: Option<ViewId>,
    pub min: Point,
    pub max: Point,
}

/// One raw delivery the dispatcher made to a view.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCall {
    pub view: ViewId,
    pub phase: TouchPhase,
    pub touches: Vec<TouchId>,
}

/// View tree that records everything the engine tells it.
#[derive(Default)]
pub struct RecordingHost {
    pub views: SlotMap<ViewId, TestView>,
    pub calls: Vec<RawCall>,
    pub haptics: Vec<ViewId>,
    pub clicks: Vec<ViewId>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a view covering `min..max`. Later views are hit first.
    pub fn add_view(&mut self, parent: Option<ViewId>, min: (f32, f32), max: (f32, f32)) -> ViewId {
        self.views.insert(TestView {
            parent,
            min: min.into(),
            max: max.into(),
        })
    }

    pub fn calls_for(&self, view: ViewId) -> Vec<TouchPhase> {
        self.calls
            .iter()
            .filter(|c| c.view == view)
            .map(|c| c.phase)
            .collect()
    }

    fn record(&mut self, view: ViewId, phase: TouchPhase, touches: &[Touch]) {
        self.calls.push(RawCall {
            view,
            phase,
            touches: touches.iter().map(Touch::id).collect(),
        });
    }
}

impl ViewHost for RecordingHost {
    fn hit_test(&self, point: Point) -> Option<ViewId> {
        self.views
            .iter()
            .filter(|(_, v)| {
                point.x >= v.min.x && point.x < v.max.x && point.y >= v.min.y && point.y < v.max.y
            })
            .map(|(id, _)| id)
            .last()
    }

    fn parent(&self, view: ViewId) -> Option<ViewId> {
        self.views.get(view).and_then(|v| v.parent)
    }

    fn window_to_local(&self, view: ViewId, point: Point) -> Point {
        match self.views.get(view) {
            Some(v) => point - v.min,
            None => point,
        }
    }

    fn touches_began(&mut self, view: ViewId, touches: &[Touch]) {
        self.record(view, TouchPhase::Began, touches);
    }

    fn touches_moved(&mut self, view: ViewId, touches: &[Touch]) {
        self.record(view, TouchPhase::Moved, touches);
    }

    fn touches_ended(&mut self, view: ViewId, touches: &[Touch]) {
        self.record(view, TouchPhase::Ended, touches);
    }

    fn touches_cancelled(&mut self, view: ViewId, touches: &[Touch]) {
        self.record(view, TouchPhase::Cancelled, touches);
    }

    fn perform_haptic_feedback(&mut self, view: ViewId) {
        self.haptics.push(view);
    }

    fn play_click_sound(&mut self, view: ViewId) {
        self.clicks.push(view);
    }
}

/// Records the states a recognizer reported to its handlers.
#[derive(Clone, Default)]
pub struct StateLog(Rc<RefCell<Vec<GestureState>>>);

impl StateLog {
    pub fn attach(arena: &mut GestureArena, id: RecognizerId) -> Self {
        let log = Self::default();
        let sink = log.0.clone();
        arena
            .add_handler(id, move |gesture| sink.borrow_mut().push(gesture.state()))
            .unwrap();
        log
    }

    pub fn states(&self) -> Vec<GestureState> {
        self.0.borrow().clone()
    }
}

/// Route engine logs to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Dispatcher plus host with a millisecond clock.
pub struct Rig {
    pub dispatcher: TouchDispatcher,
    pub host: RecordingHost,
    t0: Instant,
}

impl Rig {
    pub fn new(host: RecordingHost) -> Self {
        init_tracing();
        Self {
            dispatcher: TouchDispatcher::new(),
            host,
            t0: Instant::now(),
        }
    }

    pub fn arena(&mut self) -> &mut GestureArena {
        self.dispatcher.arena_mut()
    }

    pub fn at(&self, ms: u64) -> Instant {
        self.t0 + Duration::from_millis(ms)
    }

    pub fn send(&mut self, ms: u64, contact: u64, phase: TouchPhase, location: (f32, f32)) {
        let now = self.at(ms);
        self.dispatcher
            .dispatch(now, &[RawTouch::new(contact, phase, location)], &mut self.host);
    }

    pub fn tick(&mut self, ms: u64) {
        let now = self.at(ms);
        self.dispatcher.tick_at(now, &mut self.host);
    }

    pub fn state(&self, id: RecognizerId) -> GestureState {
        self.dispatcher.arena().state(id).unwrap()
    }
}
