//! Long-press recognizer.

use std::time::Duration;

use crate::behavior::{GestureBehavior, GestureContext, GestureKind, TimerToken};
use crate::config::GestureConfig;
use crate::state::GestureState;

const PRESS: TimerToken = TimerToken(0);

/// Recognizes fingers held still for a minimum duration.
///
/// The gesture is continuous: it begins when the press duration elapses,
/// reports `Changed` as the fingers move afterwards, and ends when they lift.
/// Moving further than the allowable movement before the press completes, or
/// lifting early, fails it.
#[derive(Debug, Clone)]
pub struct LongPressGesture {
    minimum_press_duration: Duration,
    number_of_touches_required: usize,
    allowable_movement: f32,
}

impl Default for LongPressGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl LongPressGesture {
    /// Single-finger long-press with default thresholds.
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    /// Single-finger long-press with thresholds from `config`.
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            minimum_press_duration: config.long_press_timeout,
            number_of_touches_required: 1,
            allowable_movement: config.tap_slop,
        }
    }

    /// Require `touches` fingers.
    pub fn with_touches(mut self, touches: usize) -> Self {
        self.number_of_touches_required = touches.max(1);
        self
    }

    /// How long the fingers must be held.
    pub fn minimum_press_duration(&self) -> Duration {
        self.minimum_press_duration
    }

    /// Maximum movement before the press completes.
    pub fn allowable_movement(&self) -> f32 {
        self.allowable_movement
    }
}

impl GestureBehavior for LongPressGesture {
    fn kind(&self) -> GestureKind {
        GestureKind::LongPress
    }

    fn touches_began(&mut self, cx: &mut GestureContext<'_>) {
        let down = cx.number_of_touches();
        if down > self.number_of_touches_required {
            // Fails before the press, cancels after it.
            cx.set_state(GestureState::Failed);
        } else if down == self.number_of_touches_required && cx.state() == GestureState::Possible {
            cx.start_timer(PRESS, self.minimum_press_duration);
        }
    }

    fn touches_moved(&mut self, cx: &mut GestureContext<'_>) {
        if cx.state() == GestureState::Possible {
            let strayed = cx.touches().any(|t| {
                t.location().distance_to(t.initial_location()) > self.allowable_movement
            });
            if strayed {
                cx.set_state(GestureState::Failed);
            }
        } else {
            cx.set_state(GestureState::Changed);
        }
    }

    fn touches_ended(&mut self, cx: &mut GestureContext<'_>) {
        if cx.state() == GestureState::Possible {
            cx.set_state(GestureState::Failed);
        } else if cx.number_of_touches() < self.number_of_touches_required {
            cx.set_state(GestureState::Ended);
        }
    }

    fn timer_fired(&mut self, cx: &mut GestureContext<'_>, _token: TimerToken) {
        if cx.number_of_touches() == self.number_of_touches_required {
            cx.set_state(GestureState::Began);
        } else {
            cx.set_state(GestureState::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizers::harness::Harness;

    #[test]
    fn test_long_press_lifecycle() {
        let mut h = Harness::new(LongPressGesture::new());
        let t = h.down(0, &[(100.0, 100.0)]);
        h.tick(499);
        assert_eq!(h.state(), GestureState::Possible);

        h.tick(500);
        assert_eq!(h.state(), GestureState::Began);

        h.moved(600, t[0], (150.0, 100.0));
        assert_eq!(h.state(), GestureState::Changed);

        h.up(700, t[0], (150.0, 100.0));
        assert_eq!(h.state(), GestureState::Ended);
        assert_eq!(
            h.reported(),
            vec![
                GestureState::Began,
                GestureState::Changed,
                GestureState::Ended
            ]
        );
    }

    #[test]
    fn test_early_lift_fails() {
        let mut h = Harness::new(LongPressGesture::new());
        let t = h.down(0, &[(100.0, 100.0)]);
        h.up(200, t[0], (100.0, 100.0));
        assert_eq!(h.state(), GestureState::Failed);

        // The press timer died with the attempt.
        h.tick(200);
        h.tick(600);
        assert_eq!(h.state(), GestureState::Possible);
        assert!(h.reported().is_empty());
    }

    #[test]
    fn test_movement_before_press_fails() {
        let mut h = Harness::new(LongPressGesture::new());
        let t = h.down(0, &[(100.0, 100.0)]);
        h.moved(100, t[0], (100.0, 120.0));
        assert_eq!(h.state(), GestureState::Failed);
    }

    #[test]
    fn test_small_movement_is_tolerated() {
        let mut h = Harness::new(LongPressGesture::new());
        let t = h.down(0, &[(100.0, 100.0)]);
        h.moved(100, t[0], (104.0, 103.0));
        h.tick(500);
        assert_eq!(h.state(), GestureState::Began);
    }
}
