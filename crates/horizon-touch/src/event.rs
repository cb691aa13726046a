//! Touch events.

use std::time::Instant;

use horizon_touch_core::{RecognizerId, TouchId, ViewId};

use crate::touch::{TouchPhase, TouchTable};

/// An ordered batch of touches delivered together.
///
/// The event names touches by ID; their current phase and location live in
/// the [`TouchTable`] of the arena that received the event.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    timestamp: Instant,
    touches: Vec<TouchId>,
}

impl TouchEvent {
    /// Create an empty event.
    pub fn new(timestamp: Instant) -> Self {
        Self {
            timestamp,
            touches: Vec::new(),
        }
    }

    /// Create an event carrying the given touches, in order.
    pub fn with_touches(timestamp: Instant, touches: Vec<TouchId>) -> Self {
        Self { timestamp, touches }
    }

    /// Append a touch to the batch.
    pub fn push(&mut self, touch: TouchId) {
        if !self.touches.contains(&touch) {
            self.touches.push(touch);
        }
    }

    /// When the event was produced.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Every touch in the event.
    pub fn all_touches(&self) -> &[TouchId] {
        &self.touches
    }

    /// Number of touches in the event.
    pub fn len(&self) -> usize {
        self.touches.len()
    }

    /// Whether the event is empty.
    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    /// The touches in this event that `recognizer` is tracking.
    pub fn touches_for_recognizer(
        &self,
        table: &TouchTable,
        recognizer: RecognizerId,
    ) -> Vec<TouchId> {
        self.filter(table, |t| t.gesture_recognizers().contains(&recognizer))
    }

    /// The touches in this event that were hit-tested to `view`.
    pub fn touches_for_view(&self, table: &TouchTable, view: ViewId) -> Vec<TouchId> {
        self.filter(table, |t| t.view() == Some(view))
    }

    /// The touches in this event currently in `phase`.
    pub fn touches_with_phase(&self, table: &TouchTable, phase: TouchPhase) -> Vec<TouchId> {
        self.filter(table, |t| t.phase() == phase)
    }

    fn filter<F>(&self, table: &TouchTable, pred: F) -> Vec<TouchId>
    where
        F: Fn(&crate::touch::Touch) -> bool,
    {
        self.touches
            .iter()
            .copied()
            .filter(|id| table.get(*id).is_some_and(&pred))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_touch_core::Point;
    use slotmap::SlotMap;

    #[test]
    fn test_queries() {
        let now = Instant::now();
        let mut views: SlotMap<ViewId, ()> = SlotMap::with_key();
        let mut recognizers: SlotMap<RecognizerId, ()> = SlotMap::with_key();
        let (v1, v2) = (views.insert(()), views.insert(()));
        let r = recognizers.insert(());

        let mut table = TouchTable::new();
        let a = table.begin(Some(v1), Point::ZERO, now);
        let b = table.begin(Some(v2), Point::ZERO, now);
        table.attach(b, r);
        table.update(a, TouchPhase::Moved, Point::new(1.0, 1.0), now);

        let mut event = TouchEvent::new(now);
        event.push(a);
        event.push(b);
        event.push(a);

        assert_eq!(event.all_touches(), &[a, b]);
        assert_eq!(event.touches_for_recognizer(&table, r), vec![b]);
        assert_eq!(event.touches_for_view(&table, v1), vec![a]);
        assert_eq!(event.touches_with_phase(&table, TouchPhase::Began), vec![b]);
    }
}
