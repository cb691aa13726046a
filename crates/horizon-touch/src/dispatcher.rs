//! Routing raw contacts to recognizers and views.
//!
//! The [`TouchDispatcher`] is the entry point for platform input. It owns the
//! [`GestureArena`] and turns each batch of raw contacts into a
//! [`TouchEvent`].
//!
//! # Event Flow
//!
//! For every call to [`dispatch`](TouchDispatcher::dispatch):
//!
//! 1. **Touch table**: Platform contact ids are mapped to [`TouchId`]s.
//!    `Began` contacts are hit-tested through [`ViewHost::hit_test`]; later
//!    phases update the existing touch.
//!
//! 2. **Offer**: Each `Began` touch is offered to every recognizer attached
//!    to the hit view and its ancestors before any recognizer sees the event,
//!    so sibling queries and failure dependencies see the full picture.
//!
//! 3. **Recognize**: Recognizers receive their touches innermost view first,
//!    insertion order within a view.
//!
//! 4. **Raw delivery**: The hit views receive the raw phases, except for
//!    touches a recognizer has cancelled for the view.
//!
//! 5. **Teardown**: Ended and cancelled touches are released, failing any
//!    recognizer left with nothing to recognize.
//!
//! The owning run loop must also call [`tick`](TouchDispatcher::tick) once
//! per iteration to run resets and recognizer timers.

use std::collections::HashMap;
use std::time::Instant;

use horizon_touch_core::logging::{span_names, targets};
use horizon_touch_core::{Point, RecognizerId, TouchId, ViewId};

use crate::event::TouchEvent;
use crate::recognizer::GestureArena;
use crate::touch::TouchPhase;
use crate::view::{ViewHost, ancestor_path};

/// One platform contact as reported by the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTouch {
    /// Platform identifier, stable for the life of the contact.
    pub id: u64,
    /// What happened to the contact in this batch.
    pub phase: TouchPhase,
    /// Location in window coordinates.
    pub location: Point,
}

impl RawTouch {
    /// Create a contact report.
    ///
    /// ```
    /// use horizon_touch::{Point, RawTouch, TouchPhase};
    ///
    /// let contact = RawTouch::new(3, TouchPhase::Moved, (4.0, 5.0));
    /// assert_eq!(contact.phase, TouchPhase::Moved);
    /// assert_eq!(contact.location, Point::new(4.0, 5.0));
    /// ```
    pub fn new(id: u64, phase: TouchPhase, location: impl Into<Point>) -> Self {
        Self {
            id,
            phase,
            location: location.into(),
        }
    }
}

/// Routes raw contacts through the gesture arena to the view tree.
#[derive(Debug, Default)]
pub struct TouchDispatcher {
    arena: GestureArena,
    /// Platform contact id to live touch.
    active_touches: HashMap<u64, TouchId>,
}

impl TouchDispatcher {
    /// Create a dispatcher with an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher around an existing arena.
    pub fn with_arena(arena: GestureArena) -> Self {
        Self {
            arena,
            active_touches: HashMap::new(),
        }
    }

    /// The gesture arena.
    pub fn arena(&self) -> &GestureArena {
        &self.arena
    }

    /// The gesture arena, for registering and configuring recognizers.
    pub fn arena_mut(&mut self) -> &mut GestureArena {
        &mut self.arena
    }

    /// Number of contacts currently down.
    pub fn active_touch_count(&self) -> usize {
        self.active_touches.len()
    }

    /// The touch for a platform contact id, if it is down.
    pub fn touch_for_contact(&self, contact: u64) -> Option<TouchId> {
        self.active_touches.get(&contact).copied()
    }

    /// Deliver one batch of contacts.
    ///
    /// Returns the event that was delivered. Contacts in a non-`Began` phase
    /// with an unknown id are dropped.
    ///
    /// A `Began` for a contact that is still down cancels the old touch first,
    /// through the recognizers and the view, as its own event.
    pub fn dispatch(
        &mut self,
        timestamp: Instant,
        contacts: &[RawTouch],
        host: &mut dyn ViewHost,
    ) -> TouchEvent {
        let _span = tracing::trace_span!(
            target: targets::DISPATCH,
            span_names::DISPATCH,
            count = contacts.len()
        )
        .entered();

        let stale = self.stale_contacts(contacts);
        if !stale.is_empty() {
            tracing::warn!(target: targets::DISPATCH, count = stale.len(), "contact began twice, cancelling the old touch");
            self.dispatch(timestamp, &stale, host);
        }

        let event = self.update_touches(timestamp, contacts, host);
        if event.is_empty() {
            return event;
        }
        self.arena.advance_clock(timestamp);

        let (order, offers) = self.route(&event, host);
        for (&id, began) in order.iter().zip(&offers) {
            if !began.is_empty() {
                self.arena.offer_touches(id, began);
            }
        }
        for &id in &order {
            self.arena.ensure_failure_dependencies(id);
        }

        for &id in &order {
            let touches = event.touches_for_recognizer(self.arena.touches(), id);
            if !touches.is_empty() {
                self.arena.recognize_touches(id, &touches, &event, host);
            }
        }

        self.deliver_raw(&event, host);

        let finished: Vec<TouchId> = event
            .all_touches()
            .iter()
            .copied()
            .filter(|t| {
                self.arena
                    .touches()
                    .get(*t)
                    .is_some_and(|t| t.phase().is_terminal())
            })
            .collect();
        if !finished.is_empty() {
            self.arena.end_touches(&finished, host);
            self.active_touches.retain(|_, t| !finished.contains(t));
        }
        event
    }

    /// Cancel every contact that is down, as when the window loses focus.
    pub fn cancel_all(&mut self, timestamp: Instant, host: &mut dyn ViewHost) -> TouchEvent {
        let contacts: Vec<RawTouch> = self
            .active_touches
            .iter()
            .filter_map(|(&contact, &touch)| {
                let location = self.arena.touches().get(touch)?.location();
                Some(RawTouch::new(contact, TouchPhase::Cancelled, location))
            })
            .collect();
        self.dispatch(timestamp, &contacts, host)
    }

    /// Run due resets and timers. See [`GestureArena::tick`].
    pub fn tick(&mut self, host: &mut dyn ViewHost) -> usize {
        self.arena.tick(host)
    }

    /// Run tasks due at `now`. See [`GestureArena::tick_at`].
    pub fn tick_at(&mut self, now: Instant, host: &mut dyn ViewHost) -> usize {
        self.arena.tick_at(now, host)
    }

    /// `Cancelled` reports for `Began` contacts whose previous touch is still down.
    fn stale_contacts(&self, contacts: &[RawTouch]) -> Vec<RawTouch> {
        contacts
            .iter()
            .filter(|contact| contact.phase == TouchPhase::Began)
            .filter_map(|contact| {
                let touch = self.active_touches.get(&contact.id)?;
                let location = self.arena.touches().get(*touch)?.location();
                Some(RawTouch::new(contact.id, TouchPhase::Cancelled, location))
            })
            .collect()
    }

    fn update_touches(
        &mut self,
        timestamp: Instant,
        contacts: &[RawTouch],
        host: &dyn ViewHost,
    ) -> TouchEvent {
        let mut event = TouchEvent::new(timestamp);
        for contact in contacts {
            if contact.phase == TouchPhase::Began {
                let view = host.hit_test(contact.location);
                let touch = self
                    .arena
                    .touches_mut()
                    .begin(view, contact.location, timestamp);
                tracing::trace!(target: targets::DISPATCH, contact = contact.id, ?view, "touch began");
                self.active_touches.insert(contact.id, touch);
                event.push(touch);
                continue;
            }

            let Some(&touch) = self.active_touches.get(&contact.id) else {
                tracing::debug!(target: targets::DISPATCH, contact = contact.id, phase = ?contact.phase, "unknown contact");
                continue;
            };
            self.arena
                .touches_mut()
                .update(touch, contact.phase, contact.location, timestamp);
            event.push(touch);
        }
        event
    }

    /// Recognizers along the paths of the event's touches, innermost first,
    /// each paired with the `Began` touches to offer it.
    fn route(
        &self,
        event: &TouchEvent,
        host: &dyn ViewHost,
    ) -> (Vec<RecognizerId>, Vec<Vec<TouchId>>) {
        let mut order: Vec<RecognizerId> = Vec::new();
        let mut offers: Vec<Vec<TouchId>> = Vec::new();
        let mut paths: HashMap<ViewId, Vec<ViewId>> = HashMap::new();

        for &touch_id in event.all_touches() {
            let Some(touch) = self.arena.touches().get(touch_id) else {
                continue;
            };
            let Some(view) = touch.view() else {
                continue;
            };
            let path = paths
                .entry(view)
                .or_insert_with(|| ancestor_path(host, view));
            let began = touch.phase() == TouchPhase::Began;

            for &v in path.iter() {
                for &id in self.arena.recognizers_for_view(v) {
                    let slot = match order.iter().position(|r| *r == id) {
                        Some(slot) => slot,
                        None => {
                            order.push(id);
                            offers.push(Vec::new());
                            order.len() - 1
                        }
                    };
                    if began {
                        offers[slot].push(touch_id);
                    }
                }
            }
        }
        (order, offers)
    }

    fn deliver_raw(&self, event: &TouchEvent, host: &mut dyn ViewHost) {
        let table = self.arena.touches();
        let mut views: Vec<ViewId> = Vec::new();
        for touch in event.all_touches().iter().filter_map(|t| table.get(*t)) {
            if let Some(view) = touch.view()
                && !views.contains(&view)
            {
                views.push(view);
            }
        }

        for view in views {
            for phase in [
                TouchPhase::Began,
                TouchPhase::Moved,
                TouchPhase::Ended,
                TouchPhase::Cancelled,
            ] {
                let touches: Vec<_> = event
                    .all_touches()
                    .iter()
                    .filter_map(|t| table.get(*t))
                    .filter(|t| {
                        t.view() == Some(view) && t.phase() == phase && !t.is_cancelled_for_view()
                    })
                    .cloned()
                    .collect();
                if touches.is_empty() {
                    continue;
                }
                match phase {
                    TouchPhase::Began => host.touches_began(view, &touches),
                    TouchPhase::Moved => host.touches_moved(view, &touches),
                    TouchPhase::Ended => host.touches_ended(view, &touches),
                    TouchPhase::Cancelled => host.touches_cancelled(view, &touches),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizers::{PanGesture, TapGesture};
    use crate::state::GestureState;
    use crate::touch::Touch;
    use std::time::Duration;

    use slotmap::{SecondaryMap, SlotMap};

    /// Two nested views: `outer` covers everything, `inner` covers x < 100.
    struct Nested {
        outer: ViewId,
        inner: ViewId,
        parents: SecondaryMap<ViewId, ViewId>,
        log: Vec<(ViewId, TouchPhase, usize)>,
    }

    impl Nested {
        fn new() -> Self {
            let mut views: SlotMap<ViewId, ()> = SlotMap::with_key();
            let outer = views.insert(());
            let inner = views.insert(());
            let mut parents = SecondaryMap::new();
            parents.insert(inner, outer);
            Self {
                outer,
                inner,
                parents,
                log: Vec::new(),
            }
        }
    }

    impl ViewHost for Nested {
        fn hit_test(&self, point: Point) -> Option<ViewId> {
            Some(if point.x < 100.0 { self.inner } else { self.outer })
        }

        fn parent(&self, view: ViewId) -> Option<ViewId> {
            self.parents.get(view).copied()
        }

        fn touches_began(&mut self, view: ViewId, touches: &[Touch]) {
            self.log.push((view, TouchPhase::Began, touches.len()));
        }

        fn touches_moved(&mut self, view: ViewId, touches: &[Touch]) {
            self.log.push((view, TouchPhase::Moved, touches.len()));
        }

        fn touches_ended(&mut self, view: ViewId, touches: &[Touch]) {
            self.log.push((view, TouchPhase::Ended, touches.len()));
        }

        fn touches_cancelled(&mut self, view: ViewId, touches: &[Touch]) {
            self.log.push((view, TouchPhase::Cancelled, touches.len()));
        }
    }

    #[test]
    fn test_touch_reaches_ancestor_recognizers() {
        let mut host = Nested::new();
        let mut dispatcher = TouchDispatcher::new();
        let outer_tap = dispatcher
            .arena_mut()
            .add_recognizer_to_view(host.outer, TapGesture::new());
        let inner_tap = dispatcher
            .arena_mut()
            .add_recognizer_to_view(host.inner, TapGesture::new());

        let t0 = Instant::now();
        dispatcher.dispatch(t0, &[RawTouch::new(7, TouchPhase::Began, (50.0, 50.0))], &mut host);
        let touch = dispatcher.touch_for_contact(7).unwrap();
        assert_eq!(
            dispatcher.arena().touches().get(touch).unwrap().gesture_recognizers(),
            &[inner_tap, outer_tap]
        );
        assert_eq!(dispatcher.active_touch_count(), 1);
    }

    #[test]
    fn test_touch_outside_inner_view_skips_it() {
        let mut host = Nested::new();
        let mut dispatcher = TouchDispatcher::new();
        let inner_tap = dispatcher
            .arena_mut()
            .add_recognizer_to_view(host.inner, TapGesture::new());

        let t0 = Instant::now();
        dispatcher.dispatch(t0, &[RawTouch::new(1, TouchPhase::Began, (150.0, 50.0))], &mut host);
        assert_eq!(dispatcher.arena().number_of_touches(inner_tap), 0);
        assert_eq!(host.log, vec![(host.outer, TouchPhase::Began, 1)]);
    }

    #[test]
    fn test_raw_delivery_and_teardown() {
        let mut host = Nested::new();
        let mut dispatcher = TouchDispatcher::new();
        let tap = dispatcher
            .arena_mut()
            .add_recognizer_to_view(host.inner, TapGesture::new());
        dispatcher
            .arena_mut()
            .set_cancels_touches_in_view(tap, false)
            .unwrap();

        let t0 = Instant::now();
        dispatcher.dispatch(t0, &[RawTouch::new(1, TouchPhase::Began, (50.0, 50.0))], &mut host);
        dispatcher.dispatch(
            t0 + Duration::from_millis(40),
            &[RawTouch::new(1, TouchPhase::Ended, (50.0, 50.0))],
            &mut host,
        );

        assert_eq!(dispatcher.arena().state(tap), Some(GestureState::Recognized));
        assert_eq!(
            host.log,
            vec![
                (host.inner, TouchPhase::Began, 1),
                (host.inner, TouchPhase::Ended, 1)
            ]
        );
        assert_eq!(dispatcher.active_touch_count(), 0);

        dispatcher.tick_at(t0 + Duration::from_millis(40), &mut host);
        assert_eq!(dispatcher.arena().state(tap), Some(GestureState::Possible));
        assert!(dispatcher.arena().touches().is_empty());
    }

    #[test]
    fn test_recognized_pan_cancels_raw_delivery() {
        let mut host = Nested::new();
        let mut dispatcher = TouchDispatcher::new();
        let pan = dispatcher
            .arena_mut()
            .add_recognizer_to_view(host.outer, PanGesture::new());

        let t0 = Instant::now();
        let at = |ms| t0 + Duration::from_millis(ms);
        dispatcher.dispatch(at(0), &[RawTouch::new(1, TouchPhase::Began, (50.0, 50.0))], &mut host);
        dispatcher.dispatch(at(16), &[RawTouch::new(1, TouchPhase::Moved, (80.0, 50.0))], &mut host);
        assert_eq!(dispatcher.arena().state(pan), Some(GestureState::Began));
        dispatcher.dispatch(at(32), &[RawTouch::new(1, TouchPhase::Moved, (90.0, 50.0))], &mut host);
        dispatcher.dispatch(at(48), &[RawTouch::new(1, TouchPhase::Ended, (90.0, 50.0))], &mut host);

        assert_eq!(
            host.log,
            vec![
                (host.inner, TouchPhase::Began, 1),
                (host.inner, TouchPhase::Cancelled, 1)
            ]
        );
        assert_eq!(dispatcher.arena().state(pan), Some(GestureState::Ended));
    }

    #[test]
    fn test_repeated_began_cancels_old_touch() {
        let mut host = Nested::new();
        let mut dispatcher = TouchDispatcher::new();
        let pan = dispatcher
            .arena_mut()
            .add_recognizer_to_view(host.outer, PanGesture::new());

        let t0 = Instant::now();
        let at = |ms| t0 + Duration::from_millis(ms);
        dispatcher.dispatch(at(0), &[RawTouch::new(1, TouchPhase::Began, (150.0, 50.0))], &mut host);
        let stale = dispatcher.touch_for_contact(1).unwrap();
        dispatcher.dispatch(at(10), &[RawTouch::new(1, TouchPhase::Began, (160.0, 50.0))], &mut host);

        assert_ne!(dispatcher.touch_for_contact(1), Some(stale));
        assert_eq!(dispatcher.arena().state(pan), Some(GestureState::Failed));
        assert_eq!(dispatcher.arena().number_of_touches(pan), 0);

        dispatcher.dispatch(at(20), &[RawTouch::new(1, TouchPhase::Ended, (160.0, 50.0))], &mut host);
        dispatcher.tick_at(at(20), &mut host);

        assert_eq!(
            host.log,
            vec![
                (host.outer, TouchPhase::Began, 1),
                (host.outer, TouchPhase::Cancelled, 1),
                (host.outer, TouchPhase::Began, 1),
                (host.outer, TouchPhase::Ended, 1)
            ]
        );
        assert_eq!(dispatcher.arena().state(pan), Some(GestureState::Possible));
        assert_eq!(dispatcher.active_touch_count(), 0);
        assert!(dispatcher.arena().touches().is_empty());
    }

    #[test]
    fn test_unknown_contact_is_dropped() {
        let mut host = Nested::new();
        let mut dispatcher = TouchDispatcher::new();
        let event = dispatcher.dispatch(
            Instant::now(),
            &[RawTouch::new(9, TouchPhase::Moved, (10.0, 10.0))],
            &mut host,
        );
        assert!(event.is_empty());
        assert!(host.log.is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let mut host = Nested::new();
        let mut dispatcher = TouchDispatcher::new();
        let pan = dispatcher
            .arena_mut()
            .add_recognizer_to_view(host.outer, PanGesture::new());
        dispatcher
            .arena_mut()
            .set_cancels_touches_in_view(pan, false)
            .unwrap();

        let t0 = Instant::now();
        dispatcher.dispatch(
            t0,
            &[
                RawTouch::new(1, TouchPhase::Began, (150.0, 50.0)),
                RawTouch::new(2, TouchPhase::Began, (160.0, 50.0)),
            ],
            &mut host,
        );
        dispatcher.cancel_all(t0 + Duration::from_millis(10), &mut host);

        assert_eq!(dispatcher.active_touch_count(), 0);
        assert_eq!(dispatcher.arena().state(pan), Some(GestureState::Failed));
        assert_eq!(host.log.last(), Some(&(host.outer, TouchPhase::Cancelled, 2)));
    }
}
