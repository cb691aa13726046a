//! Recognition thresholds.
//!
//! [`GestureConfig`] collects the distances and durations the built-in
//! recognizers use. Toolkits usually build one per platform and hand it to
//! each recognizer's `with_config`.

use std::time::Duration;

/// Default tap timeout in milliseconds.
///
/// Each tap must be lifted within this duration to count.
pub const DEFAULT_TAP_TIMEOUT_MS: u64 = 300;

/// Default multi-tap interval in milliseconds.
///
/// The next tap of a multi-tap must start within this duration of the last lift.
pub const DEFAULT_DOUBLE_TAP_TIMEOUT_MS: u64 = 300;

/// Default long-press timeout in milliseconds.
///
/// A touch must be held for at least this duration to trigger a long-press.
pub const DEFAULT_LONG_PRESS_TIMEOUT_MS: u64 = 500;

/// Default maximum movement for a tap or long-press in pixels.
///
/// Movement beyond this threshold fails tap recognition.
pub const DEFAULT_TAP_SLOP: f32 = 10.0;

/// Default distance a pan must travel before it begins, in pixels.
pub const DEFAULT_PAN_THRESHOLD: f32 = 10.0;

/// Default minimum distance for a swipe in pixels.
pub const DEFAULT_SWIPE_MIN_DISTANCE: f32 = 50.0;

/// Default minimum velocity for a swipe in pixels per second.
pub const DEFAULT_SWIPE_MIN_VELOCITY: f32 = 300.0;

/// Default time limit for a swipe in milliseconds.
pub const DEFAULT_SWIPE_MAX_DURATION_MS: u64 = 500;

/// Default maximum perpendicular drift for a swipe in pixels.
pub const DEFAULT_SWIPE_MAX_DEVIATION: f32 = 50.0;

/// Default relative change in finger spread before a pinch begins.
pub const DEFAULT_PINCH_THRESHOLD: f32 = 0.05;

/// Thresholds for the built-in recognizers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GestureConfig {
    /// Maximum duration of a single tap.
    pub tap_timeout: Duration,
    /// Maximum pause between taps of a multi-tap.
    pub double_tap_timeout: Duration,
    /// Duration a touch must be held for a long-press.
    pub long_press_timeout: Duration,
    /// Maximum movement allowed for a tap or long-press.
    pub tap_slop: f32,
    /// Distance a pan must travel before it begins.
    pub pan_threshold: f32,
    /// Minimum distance for a swipe.
    pub swipe_min_distance: f32,
    /// Minimum average velocity for a swipe.
    pub swipe_min_velocity: f32,
    /// Maximum duration of a swipe.
    pub swipe_max_duration: Duration,
    /// Maximum drift perpendicular to the swipe direction.
    pub swipe_max_deviation: f32,
    /// Relative spread change before a pinch begins.
    pub pinch_threshold: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_timeout: Duration::from_millis(DEFAULT_TAP_TIMEOUT_MS),
            double_tap_timeout: Duration::from_millis(DEFAULT_DOUBLE_TAP_TIMEOUT_MS),
            long_press_timeout: Duration::from_millis(DEFAULT_LONG_PRESS_TIMEOUT_MS),
            tap_slop: DEFAULT_TAP_SLOP,
            pan_threshold: DEFAULT_PAN_THRESHOLD,
            swipe_min_distance: DEFAULT_SWIPE_MIN_DISTANCE,
            swipe_min_velocity: DEFAULT_SWIPE_MIN_VELOCITY,
            swipe_max_duration: Duration::from_millis(DEFAULT_SWIPE_MAX_DURATION_MS),
            swipe_max_deviation: DEFAULT_SWIPE_MAX_DEVIATION,
            pinch_threshold: DEFAULT_PINCH_THRESHOLD,
        }
    }
}

impl GestureConfig {
    /// Creates a configuration with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tap timeout.
    pub fn with_tap_timeout(mut self, timeout: Duration) -> Self {
        self.tap_timeout = timeout;
        self
    }

    /// Set the multi-tap interval.
    pub fn with_double_tap_timeout(mut self, timeout: Duration) -> Self {
        self.double_tap_timeout = timeout;
        self
    }

    /// Set the long-press duration.
    pub fn with_long_press_timeout(mut self, timeout: Duration) -> Self {
        self.long_press_timeout = timeout;
        self
    }

    /// Set the tap slop.
    pub fn with_tap_slop(mut self, slop: f32) -> Self {
        self.tap_slop = slop;
        self
    }

    /// Set the pan threshold.
    pub fn with_pan_threshold(mut self, threshold: f32) -> Self {
        self.pan_threshold = threshold;
        self
    }

    /// Set the minimum swipe distance.
    pub fn with_swipe_min_distance(mut self, distance: f32) -> Self {
        self.swipe_min_distance = distance;
        self
    }

    /// Set the minimum swipe velocity.
    pub fn with_swipe_min_velocity(mut self, velocity: f32) -> Self {
        self.swipe_min_velocity = velocity;
        self
    }

    /// Set the maximum swipe duration.
    pub fn with_swipe_max_duration(mut self, duration: Duration) -> Self {
        self.swipe_max_duration = duration;
        self
    }

    /// Set the maximum swipe deviation.
    pub fn with_swipe_max_deviation(mut self, deviation: f32) -> Self {
        self.swipe_max_deviation = deviation;
        self
    }

    /// Set the pinch threshold.
    pub fn with_pinch_threshold(mut self, threshold: f32) -> Self {
        self.pinch_threshold = threshold;
        self
    }
}
