//! Tap recognizer.

use std::time::Duration;

use horizon_touch_core::Point;

use crate::behavior::{GestureBehavior, GestureContext, GestureKind, TimerToken};
use crate::config::GestureConfig;
use crate::state::GestureState;

/// The current tap took too long.
const TAP_TIMEOUT: TimerToken = TimerToken(0);
/// The next tap of a multi-tap did not start in time.
const NEXT_TAP: TimerToken = TimerToken(1);

/// Recognizes one or more taps with a fixed number of fingers.
///
/// Each tap must be lifted within the tap timeout, the next tap must start
/// within the multi-tap interval, and no touch may drift further than the
/// allowable movement from where the first tap landed.
#[derive(Debug, Clone)]
pub struct TapGesture {
    number_of_taps_required: u32,
    number_of_touches_required: usize,
    tap_timeout: Duration,
    tap_interval: Duration,
    allowable_movement: f32,

    taps: u32,
    /// Most fingers down at once during the current tap.
    touches_in_tap: usize,
    origin: Option<Point>,
}

impl Default for TapGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl TapGesture {
    /// Single tap, single finger, default thresholds.
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    /// Single tap, single finger, thresholds from `config`.
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            number_of_taps_required: 1,
            number_of_touches_required: 1,
            tap_timeout: config.tap_timeout,
            tap_interval: config.double_tap_timeout,
            allowable_movement: config.tap_slop,
            taps: 0,
            touches_in_tap: 0,
            origin: None,
        }
    }

    /// Require `taps` consecutive taps.
    pub fn with_taps(mut self, taps: u32) -> Self {
        self.number_of_taps_required = taps.max(1);
        self
    }

    /// Require `touches` fingers per tap.
    pub fn with_touches(mut self, touches: usize) -> Self {
        self.number_of_touches_required = touches.max(1);
        self
    }

    /// Number of taps required.
    pub fn number_of_taps_required(&self) -> u32 {
        self.number_of_taps_required
    }

    /// Number of fingers required per tap.
    pub fn number_of_touches_required(&self) -> usize {
        self.number_of_touches_required
    }

    /// Taps completed so far in the current attempt.
    pub fn taps(&self) -> u32 {
        self.taps
    }

    fn drifted(&self, cx: &GestureContext<'_>) -> bool {
        cx.touches()
            .any(|t| t.location().distance_to(t.initial_location()) > self.allowable_movement)
    }
}

impl GestureBehavior for TapGesture {
    fn kind(&self) -> GestureKind {
        GestureKind::Tap
    }

    fn touches_began(&mut self, cx: &mut GestureContext<'_>) {
        cx.cancel_timer(NEXT_TAP);
        let down = cx.number_of_touches();
        if down > self.number_of_touches_required {
            cx.set_state(GestureState::Failed);
            return;
        }
        if self.touches_in_tap == 0 {
            cx.start_timer(TAP_TIMEOUT, self.tap_timeout);
        }
        self.touches_in_tap = self.touches_in_tap.max(down);

        let location = cx.location();
        match self.origin {
            None => self.origin = location,
            Some(origin) => {
                if location.is_some_and(|p| p.distance_to(origin) > self.allowable_movement) {
                    cx.set_state(GestureState::Failed);
                }
            }
        }
    }

    fn touches_moved(&mut self, cx: &mut GestureContext<'_>) {
        if self.drifted(cx) {
            cx.set_state(GestureState::Failed);
        }
    }

    fn touches_ended(&mut self, cx: &mut GestureContext<'_>) {
        if self.drifted(cx) {
            cx.set_state(GestureState::Failed);
            return;
        }
        if cx.number_of_touches() > 0 {
            return;
        }

        cx.cancel_timer(TAP_TIMEOUT);
        if self.touches_in_tap != self.number_of_touches_required {
            cx.set_state(GestureState::Failed);
            return;
        }
        self.taps += 1;
        self.touches_in_tap = 0;
        if self.taps >= self.number_of_taps_required {
            cx.set_state(GestureState::Recognized);
        } else {
            cx.start_timer(NEXT_TAP, self.tap_interval);
        }
    }

    fn timer_fired(&mut self, cx: &mut GestureContext<'_>, _token: TimerToken) {
        cx.set_state(GestureState::Failed);
    }

    fn reset(&mut self) {
        self.taps = 0;
        self.touches_in_tap = 0;
        self.origin = None;
    }
}
