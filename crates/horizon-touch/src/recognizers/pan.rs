//! Pan (drag) recognizer.

use std::time::Instant;

use horizon_touch_core::Point;

use crate::behavior::{GestureBehavior, GestureContext, GestureKind};
use crate::config::GestureConfig;
use crate::state::GestureState;

/// Recognizes fingers dragged across the view.
///
/// The pan begins once the centroid of the touches has travelled the
/// threshold distance. Translation accumulates centroid movement, so fingers
/// joining or leaving mid-pan do not make it jump.
#[derive(Debug, Clone)]
pub struct PanGesture {
    minimum_number_of_touches: usize,
    maximum_number_of_touches: usize,
    threshold: f32,

    translation: Point,
    /// Pixels per second.
    velocity: Point,
    last_centroid: Option<Point>,
    last_time: Option<Instant>,
}

impl Default for PanGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl PanGesture {
    /// Pan with any number of fingers and the default threshold.
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    /// Pan with any number of fingers and the threshold from `config`.
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            minimum_number_of_touches: 1,
            maximum_number_of_touches: usize::MAX,
            threshold: config.pan_threshold,
            translation: Point::ZERO,
            velocity: Point::ZERO,
            last_centroid: None,
            last_time: None,
        }
    }

    /// Require at least `touches` fingers.
    pub fn with_minimum_touches(mut self, touches: usize) -> Self {
        self.minimum_number_of_touches = touches.max(1);
        self
    }

    /// Allow at most `touches` fingers.
    pub fn with_maximum_touches(mut self, touches: usize) -> Self {
        self.maximum_number_of_touches = touches.max(1);
        self
    }

    /// Distance the touches must travel before the pan begins.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Distance travelled since the touches went down.
    pub fn translation(&self) -> Point {
        self.translation
    }

    /// Move the origin of the translation, e.g. after consuming it.
    pub fn set_translation(&mut self, translation: Point) {
        self.translation = translation;
        self.velocity = Point::ZERO;
    }

    /// Latest velocity in pixels per second.
    pub fn velocity(&self) -> Point {
        self.velocity
    }

    fn rebase(&mut self, cx: &GestureContext<'_>) {
        self.last_centroid = cx.location();
        self.last_time = Some(cx.timestamp());
    }
}

impl GestureBehavior for PanGesture {
    fn kind(&self) -> GestureKind {
        GestureKind::Pan
    }

    fn touches_began(&mut self, cx: &mut GestureContext<'_>) {
        if cx.number_of_touches() > self.maximum_number_of_touches {
            if cx.state() == GestureState::Possible {
                cx.set_state(GestureState::Failed);
                return;
            }
            let extra: Vec<_> = cx.touches().map(|t| t.id()).collect();
            for touch in extra {
                cx.ignore_touch(touch);
            }
            return;
        }
        self.rebase(cx);
    }

    fn touches_moved(&mut self, cx: &mut GestureContext<'_>) {
        let Some(centroid) = cx.location() else {
            return;
        };
        let delta = match self.last_centroid {
            Some(last) => centroid - last,
            None => Point::ZERO,
        };
        self.translation = self.translation + delta;
        if let Some(last_time) = self.last_time {
            let dt = cx.timestamp().saturating_duration_since(last_time).as_secs_f32();
            if dt > 0.0 {
                self.velocity = delta.scale(1.0 / dt);
            }
        }
        self.rebase(cx);

        if cx.state() == GestureState::Possible {
            if cx.number_of_touches() >= self.minimum_number_of_touches
                && self.translation.length() >= self.threshold
            {
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
        } else if remaining < self.minimum_number_of_touches {
            cx.set_state(GestureState::Ended);
        }
        self.rebase(cx);
    }

    fn reset(&mut self) {
        self.translation = Point::ZERO;
        self.velocity = Point::ZERO;
        self.last_centroid = None;
        self.last_time = None;
    }
}
