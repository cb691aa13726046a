//! Horizon Touch - gesture recognition and touch dispatch.
//!
//! Raw contacts go in; arbitrated gesture notifications come out. Recognizers
//! attached to views along the hit-tested path compete for the same touches,
//! wait on each other through failure requirements, and may pre-empt the
//! views' own touch handling once they recognize.
//!
//! # Architecture
//!
//! - [`TouchDispatcher`] maps platform contacts to [`Touch`]es and routes each
//!   [`TouchEvent`] through the arena and on to the view tree.
//! - [`GestureArena`] owns every recognizer and runs the shared state
//!   machine, failure dependencies and the prevention test.
//! - [`GestureBehavior`] is the per-recognizer part. The built-in
//!   [`recognizers`] cover tap, long-press, pan, swipe and pinch.
//! - [`ViewHost`] is implemented by the toolkit to expose its view tree.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use horizon_touch::{
//!     GestureState, Point, RawTouch, TapGesture, TouchDispatcher, TouchPhase, ViewHost, ViewId,
//! };
//!
//! struct Window(ViewId);
//!
//! impl ViewHost for Window {
//!     fn hit_test(&self, _point: Point) -> Option<ViewId> {
//!         Some(self.0)
//!     }
//!
//!     fn parent(&self, _view: ViewId) -> Option<ViewId> {
//!         None
//!     }
//! }
//!
//! let mut views = slotmap::SlotMap::<ViewId, ()>::with_key();
//! let mut window = Window(views.insert(()));
//!
//! let mut dispatcher = TouchDispatcher::new();
//! let tap = dispatcher
//!     .arena_mut()
//!     .add_recognizer_to_view(window.0, TapGesture::new());
//!
//! let t0 = Instant::now();
//! dispatcher.dispatch(t0, &[RawTouch::new(1, TouchPhase::Began, (10.0, 10.0))], &mut window);
//! dispatcher.dispatch(
//!     t0 + Duration::from_millis(50),
//!     &[RawTouch::new(1, TouchPhase::Ended, (10.0, 10.0))],
//!     &mut window,
//! );
//! assert_eq!(dispatcher.arena().state(tap), Some(GestureState::Recognized));
//!
//! // The next run-loop iteration resets the recognizer.
//! dispatcher.tick_at(t0 + Duration::from_millis(50), &mut window);
//! assert_eq!(dispatcher.arena().state(tap), Some(GestureState::Possible));
//! ```

mod arbitration;
mod behavior;
mod config;
mod delegate;
mod dispatcher;
mod event;
mod recognizer;
pub mod recognizers;
mod state;
mod touch;
mod view;

pub use behavior::{GestureBehavior, GestureContext, GestureKind, TimerToken};
pub use config::{
    DEFAULT_DOUBLE_TAP_TIMEOUT_MS, DEFAULT_LONG_PRESS_TIMEOUT_MS, DEFAULT_PAN_THRESHOLD,
    DEFAULT_PINCH_THRESHOLD, DEFAULT_SWIPE_MAX_DEVIATION, DEFAULT_SWIPE_MAX_DURATION_MS,
    DEFAULT_SWIPE_MIN_DISTANCE, DEFAULT_SWIPE_MIN_VELOCITY, DEFAULT_TAP_SLOP,
    DEFAULT_TAP_TIMEOUT_MS, GestureConfig,
};
pub use delegate::{GestureDelegate, SimultaneousGesturePolicy};
pub use dispatcher::{RawTouch, TouchDispatcher};
pub use event::TouchEvent;
pub use recognizer::{Gesture, GestureArena, GestureHandler};
pub use recognizers::{
    LongPressGesture, PanGesture, PinchGesture, SwipeDirection, SwipeDirections, SwipeGesture,
    TapGesture,
};
pub use state::GestureState;
pub use touch::{Touch, TouchPhase, TouchTable};
pub use view::{ViewHost, ancestor_path};

pub use horizon_touch_core::logging;
pub use horizon_touch_core::{
    HandlerId, Point, RecognizerId, Result, TouchError, TouchId, ViewId,
};
