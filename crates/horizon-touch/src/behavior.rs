//! The contract concrete recognizers implement.
//!
//! The arena owns the shared state machine. A concrete recognizer (tap, pan,
//! ...) supplies a [`GestureBehavior`]: touch-phase hooks that look at the
//! touches and ask for state transitions through their [`GestureContext`].
//!
//! Requests made through the context are applied by the arena in the order
//! they were made, as soon as the hook returns and before the next hook or the
//! next recognizer runs. Each request goes through the full normalizing
//! transition function, so a hook may simply say `Changed` on every move and
//! let the arena turn the first one into `Began`.
//!
//! ```
//! use std::time::Duration;
//! use horizon_touch::{GestureBehavior, GestureContext, GestureKind, GestureState, TimerToken};
//!
//! /// Recognizes a two-second press that never moves.
//! #[derive(Default)]
//! struct Hold;
//!
//! const HOLD: TimerToken = TimerToken(0);
//!
//! impl GestureBehavior for Hold {
//!     fn kind(&self) -> GestureKind {
//!         GestureKind::Custom("hold")
//!     }
//!
//!     fn touches_began(&mut self, cx: &mut GestureContext<'_>) {
//!         cx.start_timer(HOLD, Duration::from_secs(2));
//!     }
//!
//!     fn touches_moved(&mut self, cx: &mut GestureContext<'_>) {
//!         cx.set_state(GestureState::Failed);
//!     }
//!
//!     fn touches_ended(&mut self, cx: &mut GestureContext<'_>) {
//!         cx.set_state(GestureState::Failed);
//!     }
//!
//!     fn timer_fired(&mut self, cx: &mut GestureContext<'_>, _token: TimerToken) {
//!         cx.set_state(GestureState::Recognized);
//!     }
//! }
//! ```

use std::any::Any;
use std::time::{Duration, Instant};

use horizon_touch_core::{Point, RecognizerId, TouchId, ViewId};

use crate::recognizer::Gesture;
use crate::state::GestureState;
use crate::touch::{Touch, TouchTable};

/// The family a recognizer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// Single or multi-tap.
    Tap,
    /// Press and hold.
    LongPress,
    /// Drag.
    Pan,
    /// Quick directional flick.
    Swipe,
    /// Two-finger pinch.
    Pinch,
    /// Application-defined recognizer.
    Custom(&'static str),
}

/// Names a timer started by a behavior. Each behavior picks its own tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Command {
    SetState(GestureState),
    StartTimer(TimerToken, Duration),
    CancelTimer(TimerToken),
    IgnoreTouch(TouchId),
}

/// What a behavior hook can see and request.
pub struct GestureContext<'a> {
    id: RecognizerId,
    view: Option<ViewId>,
    state: GestureState,
    touches: &'a [TouchId],
    tracking: &'a [TouchId],
    table: &'a TouchTable,
    timestamp: Instant,
    commands: Vec<Command>,
}

impl<'a> GestureContext<'a> {
    pub(crate) fn new(
        id: RecognizerId,
        view: Option<ViewId>,
        state: GestureState,
        touches: &'a [TouchId],
        tracking: &'a [TouchId],
        table: &'a TouchTable,
        timestamp: Instant,
    ) -> Self {
        Self {
            id,
            view,
            state,
            touches,
            tracking,
            table,
            timestamp,
            commands: Vec::new(),
        }
    }

    pub(crate) fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    /// The recognizer running this hook.
    pub fn id(&self) -> RecognizerId {
        self.id
    }

    /// The view the recognizer is attached to.
    pub fn view(&self) -> Option<ViewId> {
        self.view
    }

    /// The recognizer's state when the hook was called.
    ///
    /// Requests made during the hook are not reflected here.
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Time of the event (or timer) that triggered the hook.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// The touches that entered this hook's phase. Empty for timer hooks.
    pub fn touches(&self) -> impl Iterator<Item = &'a Touch> + '_ {
        let table = self.table;
        self.touches.iter().filter_map(move |id| table.get(*id))
    }

    /// Every touch tracked this attempt, including lifted ones.
    pub fn tracking_touches(&self) -> impl Iterator<Item = &'a Touch> + '_ {
        let table = self.table;
        self.tracking.iter().filter_map(move |id| table.get(*id))
    }

    /// Tracked touches that are still down.
    pub fn active_touches(&self) -> impl Iterator<Item = &'a Touch> + '_ {
        self.tracking_touches().filter(|t| t.is_active())
    }

    /// Number of tracked touches that are still down.
    pub fn number_of_touches(&self) -> usize {
        self.active_touches().count()
    }

    /// Look up any touch by ID.
    pub fn touch(&self, id: TouchId) -> Option<&'a Touch> {
        self.table.get(id)
    }

    /// Centroid of the active touches, in window coordinates.
    pub fn location(&self) -> Option<Point> {
        Point::centroid(self.active_touches().map(Touch::location))
    }

    /// Request a state transition.
    pub fn set_state(&mut self, state: GestureState) {
        self.commands.push(Command::SetState(state));
    }

    /// Start (or restart) the timer named `token`; `timer_fired` runs after `delay`.
    pub fn start_timer(&mut self, token: TimerToken, delay: Duration) {
        self.commands.push(Command::StartTimer(token, delay));
    }

    /// Cancel the timer named `token` if it is pending.
    pub fn cancel_timer(&mut self, token: TimerToken) {
        self.commands.push(Command::CancelTimer(token));
    }

    /// Stop tracking `touch` for the rest of this attempt.
    pub fn ignore_touch(&mut self, touch: TouchId) {
        self.commands.push(Command::IgnoreTouch(touch));
    }
}

/// Touch-phase hooks and capability queries of a concrete recognizer.
///
/// Every hook has a default. A behavior that overrides nothing but
/// [`kind`](Self::kind) never leaves `Possible` on its own, and fails when its
/// touches are cancelled.
pub trait GestureBehavior: Any {
    /// The family this recognizer belongs to.
    fn kind(&self) -> GestureKind;

    /// New touches arrived.
    fn touches_began(&mut self, _cx: &mut GestureContext<'_>) {}

    /// Tracked touches moved.
    fn touches_moved(&mut self, _cx: &mut GestureContext<'_>) {}

    /// Tracked touches were lifted.
    fn touches_ended(&mut self, _cx: &mut GestureContext<'_>) {}

    /// Tracked touches were cancelled by the system.
    ///
    /// Requests `Failed`, which the arena turns into `Cancelled` for a gesture
    /// that has already begun.
    fn touches_cancelled(&mut self, cx: &mut GestureContext<'_>) {
        cx.set_state(GestureState::Failed);
    }

    /// A timer started through the context fired.
    fn timer_fired(&mut self, _cx: &mut GestureContext<'_>, _token: TimerToken) {}

    /// Clear per-attempt state. Called whenever the recognizer returns to `Possible`.
    fn reset(&mut self) {}

    /// Whether this recognizer, once recognized, blocks `other` from recognizing.
    fn can_prevent(&self, _other: &Gesture<'_>) -> bool {
        true
    }

    /// Whether `other`, once recognized, blocks this recognizer.
    fn can_be_prevented_by(&self, _other: &Gesture<'_>) -> bool {
        true
    }

    /// Whether this recognizer should wait for `other` to fail before recognizing.
    fn should_require_failure_of(&self, _other: &Gesture<'_>) -> bool {
        false
    }

    /// Whether `other` should wait for this recognizer to fail before recognizing.
    fn should_be_required_to_fail_by(&self, _other: &Gesture<'_>) -> bool {
        false
    }
}
