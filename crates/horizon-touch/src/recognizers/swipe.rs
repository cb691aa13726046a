//! Swipe recognizer.

use std::ops::BitOr;
use std::time::{Duration, Instant};

use horizon_touch_core::Point;

use crate::behavior::{GestureBehavior, GestureContext, GestureKind, TimerToken};
use crate::config::GestureConfig;
use crate::state::GestureState;

const MAX_DURATION: TimerToken = TimerToken(0);

/// Direction of a recognized swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SwipeDirection {
    /// Towards increasing x.
    Right,
    /// Towards decreasing x.
    Left,
    /// Towards decreasing y.
    Up,
    /// Towards increasing y.
    Down,
}

impl SwipeDirection {
    /// Dominant direction of a displacement. Window coordinates grow downwards.
    pub fn from_delta(delta: Point) -> Self {
        if delta.x.abs() > delta.y.abs() {
            if delta.x > 0.0 { Self::Right } else { Self::Left }
        } else if delta.y > 0.0 {
            Self::Down
        } else {
            Self::Up
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::Right => 1,
            Self::Left => 1 << 1,
            Self::Up => 1 << 2,
            Self::Down => 1 << 3,
        }
    }
}

/// Set of directions a [`SwipeGesture`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwipeDirections(u8);

impl SwipeDirections {
    /// Rightward swipes only.
    pub const RIGHT: Self = Self(1);
    /// Leftward swipes only.
    pub const LEFT: Self = Self(1 << 1);
    /// Upward swipes only.
    pub const UP: Self = Self(1 << 2);
    /// Downward swipes only.
    pub const DOWN: Self = Self(1 << 3);
    /// Left or right.
    pub const HORIZONTAL: Self = Self(Self::RIGHT.0 | Self::LEFT.0);
    /// Up or down.
    pub const VERTICAL: Self = Self(Self::UP.0 | Self::DOWN.0);
    /// Any direction.
    pub const ALL: Self = Self(Self::HORIZONTAL.0 | Self::VERTICAL.0);

    /// Whether `direction` is in the set.
    pub fn contains(self, direction: SwipeDirection) -> bool {
        self.0 & direction.bit() != 0
    }
}

impl Default for SwipeDirections {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for SwipeDirections {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl From<SwipeDirection> for SwipeDirections {
    fn from(direction: SwipeDirection) -> Self {
        Self(direction.bit())
    }
}

/// Recognizes a quick, straight flick.
///
/// The touches must travel the minimum distance along one axis, at the
/// minimum velocity, within the maximum duration, without straying more than
/// the maximum deviation along the other axis.
#[derive(Debug, Clone)]
pub struct SwipeGesture {
    directions: SwipeDirections,
    number_of_touches_required: usize,
    min_distance: f32,
    min_velocity: f32,
    max_duration: Duration,
    max_deviation: f32,

    start: Option<(Point, Instant)>,
    /// The duration timer runs from the first finger down.
    timing: bool,
    direction: Option<SwipeDirection>,
}

impl Default for SwipeGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl SwipeGesture {
    /// Single-finger swipe in any direction with default thresholds.
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    /// Single-finger swipe in any direction with thresholds from `config`.
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            directions: SwipeDirections::ALL,
            number_of_touches_required: 1,
            min_distance: config.swipe_min_distance,
            min_velocity: config.swipe_min_velocity,
            max_duration: config.swipe_max_duration,
            max_deviation: config.swipe_max_deviation,
            start: None,
            timing: false,
            direction: None,
        }
    }

    /// Accept only swipes in `directions`.
    pub fn with_directions(mut self, directions: impl Into<SwipeDirections>) -> Self {
        self.directions = directions.into();
        self
    }

    /// Require `touches` fingers.
    pub fn with_touches(mut self, touches: usize) -> Self {
        self.number_of_touches_required = touches.max(1);
        self
    }

    /// Accepted directions.
    pub fn directions(&self) -> SwipeDirections {
        self.directions
    }

    /// Direction of the recognized swipe, once recognized.
    pub fn direction(&self) -> Option<SwipeDirection> {
        self.direction
    }

    /// Judge the travel from the start point. `None` while undecided.
    fn judge(&mut self, location: Point, now: Instant) -> Option<GestureState> {
        let (origin, started) = self.start?;
        let delta = location - origin;
        let (along, across) = if delta.x.abs() > delta.y.abs() {
            (delta.x.abs(), delta.y.abs())
        } else {
            (delta.y.abs(), delta.x.abs())
        };

        if across > self.max_deviation {
            return Some(GestureState::Failed);
        }
        if along < self.min_distance {
            return None;
        }

        let direction = SwipeDirection::from_delta(delta);
        let elapsed = now.saturating_duration_since(started).as_secs_f32();
        let fast_enough = elapsed <= 0.0 || along / elapsed >= self.min_velocity;
        if fast_enough && self.directions.contains(direction) {
            self.direction = Some(direction);
            Some(GestureState::Recognized)
        } else {
            Some(GestureState::Failed)
        }
    }
}

impl GestureBehavior for SwipeGesture {
    fn kind(&self) -> GestureKind {
        GestureKind::Swipe
    }

    fn touches_began(&mut self, cx: &mut GestureContext<'_>) {
        let down = cx.number_of_touches();
        if down > self.number_of_touches_required {
            cx.set_state(GestureState::Failed);
            return;
        }
        if !self.timing {
            self.timing = true;
            cx.start_timer(MAX_DURATION, self.max_duration);
        }
        if down == self.number_of_touches_required {
            self.start = cx.location().map(|p| (p, cx.timestamp()));
        }
    }

    fn touches_moved(&mut self, cx: &mut GestureContext<'_>) {
        let Some(location) = cx.location() else {
            return;
        };
        if let Some(state) = self.judge(location, cx.timestamp()) {
            cx.cancel_timer(MAX_DURATION);
            cx.set_state(state);
        }
    }

    fn touches_ended(&mut self, cx: &mut GestureContext<'_>) {
        if cx.number_of_touches() > 0 {
            return;
        }
        // Every touch is up; judge by where they lifted.
        let state = Point::centroid(cx.tracking_touches().map(|t| t.location()))
            .and_then(|lifted| self.judge(lifted, cx.timestamp()))
            .unwrap_or(GestureState::Failed);
        cx.cancel_timer(MAX_DURATION);
        cx.set_state(state);
    }

    fn timer_fired(&mut self, cx: &mut GestureContext<'_>, _token: TimerToken) {
        cx.set_state(GestureState::Failed);
    }

    fn reset(&mut self) {
        self.start = None;
        self.timing = false;
        self.direction = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizers::harness::Harness;

    #[test]
    fn test_swipe_right() {
        let mut h = Harness::new(SwipeGesture::new());
        let t = h.down(0, &[(100.0, 100.0)]);
        h.moved(16, t[0], (130.0, 100.0));
        assert_eq!(h.state(), GestureState::Possible);

        h.moved(50, t[0], (200.0, 102.0));
        assert_eq!(h.state(), GestureState::Recognized);
        assert_eq!(
            h.behavior::<SwipeGesture>().direction(),
            Some(SwipeDirection::Right)
        );
        assert_eq!(h.reported(), vec![GestureState::Recognized]);
    }

    #[test]
    fn test_swipe_recognized_on_lift() {
        let mut h = Harness::new(SwipeGesture::new());
        let t = h.down(0, &[(100.0, 200.0)]);
        h.up(60, t[0], (100.0, 120.0));
        assert_eq!(h.state(), GestureState::Recognized);
        assert_eq!(
            h.behavior::<SwipeGesture>().direction(),
            Some(SwipeDirection::Up)
        );
    }

    #[test]
    fn test_slow_swipe_fails() {
        let mut h = Harness::new(SwipeGesture::new());
        let t = h.down(0, &[(100.0, 100.0)]);
        h.moved(400, t[0], (160.0, 100.0));
        assert_eq!(h.state(), GestureState::Failed);
    }

    #[test]
    fn test_deviation_fails() {
        let mut h = Harness::new(SwipeGesture::new());
        let t = h.down(0, &[(100.0, 100.0)]);
        h.moved(30, t[0], (160.0, 170.0));
        assert_eq!(h.state(), GestureState::Failed);
    }

    #[test]
    fn test_disallowed_direction_fails() {
        let mut h = Harness::new(SwipeGesture::new().with_directions(SwipeDirections::LEFT));
        let t = h.down(0, &[(100.0, 100.0)]);
        h.moved(50, t[0], (200.0, 100.0));
        assert_eq!(h.state(), GestureState::Failed);
        assert_eq!(h.behavior::<SwipeGesture>().direction(), None);
    }

    #[test]
    fn test_swipe_times_out() {
        let mut h = Harness::new(SwipeGesture::new());
        h.down(0, &[(100.0, 100.0)]);
        h.tick(500);
        assert_eq!(h.state(), GestureState::Failed);
    }

    #[test]
    fn test_duration_runs_from_first_finger() {
        let mut h = Harness::new(SwipeGesture::new().with_touches(2));
        h.down(0, &[(100.0, 100.0)]);
        h.down(200, &[(140.0, 100.0)]);
        h.tick(499);
        assert_eq!(h.state(), GestureState::Possible);
        h.tick(500);
        assert_eq!(h.state(), GestureState::Failed);
    }

    #[test]
    fn test_short_lift_fails() {
        let mut h = Harness::new(SwipeGesture::new());
        let t = h.down(0, &[(100.0, 100.0)]);
        h.up(30, t[0], (120.0, 100.0));
        assert_eq!(h.state(), GestureState::Failed);
    }

    #[test]
    fn test_direction_sets() {
        assert!(SwipeDirections::HORIZONTAL.contains(SwipeDirection::Left));
        assert!(!SwipeDirections::HORIZONTAL.contains(SwipeDirection::Up));
        let set = SwipeDirections::UP | SwipeDirections::RIGHT;
        assert!(set.contains(SwipeDirection::Right));
        assert!(!set.contains(SwipeDirection::Down));
        assert_eq!(SwipeDirection::from_delta(Point::new(-3.0, 1.0)), SwipeDirection::Left);
        assert_eq!(SwipeDirection::from_delta(Point::new(0.0, 5.0)), SwipeDirection::Down);
    }
}
