//! Pinch (zoom) recognizer.

use std::time::Instant;

use horizon_touch_core::Point;

use crate::behavior::{GestureBehavior, GestureContext, GestureKind};
use crate::config::GestureConfig;
use crate::state::GestureState;

/// Recognizes two or more fingers moving apart or together.
///
/// Scale is the ratio of the current spread of the touches (their mean
/// distance from the centroid) to the spread when they went down. Fingers
/// joining or leaving re-base the spread so the scale stays continuous.
#[derive(Debug, Clone)]
pub struct PinchGesture {
    threshold: f32,

    scale: f32,
    /// Scale change per second.
    velocity: f32,
    base_scale: f32,
    base_spread: Option<f32>,
    last_time: Option<Instant>,
}

impl Default for PinchGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl PinchGesture {
    /// Pinch with the default threshold.
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    /// Pinch with the threshold from `config`.
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            threshold: config.pinch_threshold,
            scale: 1.0,
            velocity: 0.0,
            base_scale: 1.0,
            base_spread: None,
            last_time: None,
        }
    }

    /// Relative scale change needed before the pinch begins.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Scale relative to the spread when the touches went down.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Latest scale change per second.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    fn spread(cx: &GestureContext<'_>) -> Option<f32> {
        if cx.number_of_touches() < 2 {
            return None;
        }
        let center = cx.location()?;
        let locations: Vec<Point> = cx.active_touches().map(|t| t.location()).collect();
        let total: f32 = locations.iter().map(|p| p.distance_to(center)).sum();
        Some(total / locations.len() as f32)
    }

    fn rebase(&mut self, cx: &GestureContext<'_>) {
        self.base_scale = self.scale;
        self.base_spread = Self::spread(cx).filter(|s| *s > 0.0);
        self.last_time = Some(cx.timestamp());
    }
}

impl GestureBehavior for PinchGesture {
    fn kind(&self) -> GestureKind {
        GestureKind::Pinch
    }

    fn touches_began(&mut self, cx: &mut GestureContext<'_>) {
        self.rebase(cx);
    }

    fn touches_moved(&mut self, cx: &mut GestureContext<'_>) {
        let (Some(base), Some(spread)) = (self.base_spread, Self::spread(cx)) else {
            return;
        };
        let scale = self.base_scale * spread / base;
        if let Some(last_time) = self.last_time {
            let dt = cx.timestamp().saturating_duration_since(last_time).as_secs_f32();
            if dt > 0.0 {
                self.velocity = (scale - self.scale) / dt;
            }
        }
        self.scale = scale;
        self.last_time = Some(cx.timestamp());

        if cx.state() == GestureState::Possible {
            if (self.scale - 1.0).abs() >= self.threshold {
                cx.set_state(GestureState::Began);
            }
        } else {
            cx.set_state(GestureState::Changed);
        }
    }

    fn touches_ended(&mut self, cx: &mut GestureContext<'_>) {
        let remaining = cx.number_of_touches();
        if cx.state() == GestureState::Possible {
            if remaining == 0 {
                cx.set_state(GestureState::Failed);
            }
        } else if remaining < 2 {
            cx.set_state(GestureState::Ended);
        }
        self.rebase(cx);
    }

    fn reset(&mut self) {
        self.scale = 1.0;
        self.velocity = 0.0;
        self.base_scale = 1.0;
        self.base_spread = None;
        self.last_time = None;
    }
}
