//! Touches and the touch table.
//!
//! A [`Touch`] is one continuous contact. Its identity is fixed for the life of
//! the contact, while its phase, location and timestamp are updated as new
//! events arrive. Each touch also records the recognizers currently tracking
//! it, which is how "who else is looking at this finger" queries are answered.
//!
//! The [`TouchTable`] owns every live touch. A touch stays in the table after
//! it ends for as long as some recognizer still tracks it, so sibling queries
//! stay accurate until the whole gesture attempt has reset.

use std::time::Instant;

use horizon_touch_core::{Point, RecognizerId, TouchId, ViewId};
use slotmap::SlotMap;

/// The phase of a touch within one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// The finger touched the surface.
    Began,
    /// The finger moved.
    Moved,
    /// The finger was lifted.
    Ended,
    /// The system cancelled the touch.
    Cancelled,
}

impl TouchPhase {
    /// Whether the contact is over.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled)
    }
}

/// A single contact point.
#[derive(Debug, Clone)]
pub struct Touch {
    id: TouchId,
    phase: TouchPhase,
    /// Current location in window coordinates.
    location: Point,
    /// Location before the most recent update.
    previous_location: Point,
    /// Location where the contact began.
    initial_location: Point,
    timestamp: Instant,
    initial_timestamp: Instant,
    /// The hit-tested view that owns the touch's raw delivery.
    view: Option<ViewId>,
    /// Recognizers currently tracking this touch.
    recognizers: Vec<RecognizerId>,
    /// Set once a recognizer has cancelled the view's own handling of this touch.
    cancelled_for_view: bool,
    /// Set once the dispatcher has delivered the terminal phase.
    released: bool,
}

impl Touch {
    fn new(id: TouchId, view: Option<ViewId>, location: Point, timestamp: Instant) -> Self {
        Self {
            id,
            phase: TouchPhase::Began,
            location,
            previous_location: location,
            initial_location: location,
            timestamp,
            initial_timestamp: timestamp,
            view,
            recognizers: Vec::new(),
            cancelled_for_view: false,
            released: false,
        }
    }

    /// The touch's identity.
    pub fn id(&self) -> TouchId {
        self.id
    }

    /// The phase of the most recent update.
    pub fn phase(&self) -> TouchPhase {
        self.phase
    }

    /// Current location in window coordinates.
    pub fn location(&self) -> Point {
        self.location
    }

    /// Location before the most recent update.
    pub fn previous_location(&self) -> Point {
        self.previous_location
    }

    /// Location where the contact began.
    pub fn initial_location(&self) -> Point {
        self.initial_location
    }

    /// Time of the most recent update.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Time the contact began.
    pub fn initial_timestamp(&self) -> Instant {
        self.initial_timestamp
    }

    /// The view the touch was hit-tested to.
    pub fn view(&self) -> Option<ViewId> {
        self.view
    }

    /// Recognizers currently tracking this touch, in the order they accepted it.
    pub fn gesture_recognizers(&self) -> &[RecognizerId] {
        &self.recognizers
    }

    /// Whether the contact is still down.
    pub fn is_active(&self) -> bool {
        !self.phase.is_terminal()
    }

    /// Whether a recognizer has taken this touch away from its view.
    pub fn is_cancelled_for_view(&self) -> bool {
        self.cancelled_for_view
    }
}

/// Storage for every live touch.
#[derive(Debug, Default)]
pub struct TouchTable {
    touches: SlotMap<TouchId, Touch>,
}

impl TouchTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            touches: SlotMap::with_key(),
        }
    }

    /// Register a new contact in the `Began` phase.
    pub fn begin(&mut self, view: Option<ViewId>, location: Point, timestamp: Instant) -> TouchId {
        self.touches
            .insert_with_key(|id| Touch::new(id, view, location, timestamp))
    }

    /// Apply a new phase and location to an existing contact.
    ///
    /// Returns `false` if the touch is unknown.
    pub fn update(
        &mut self,
        id: TouchId,
        phase: TouchPhase,
        location: Point,
        timestamp: Instant,
    ) -> bool {
        let Some(touch) = self.touches.get_mut(id) else {
            return false;
        };
        touch.previous_location = touch.location;
        touch.location = location;
        touch.phase = phase;
        touch.timestamp = timestamp;
        true
    }

    /// Look up a touch.
    pub fn get(&self, id: TouchId) -> Option<&Touch> {
        self.touches.get(id)
    }

    /// Whether the table holds this touch.
    pub fn contains(&self, id: TouchId) -> bool {
        self.touches.contains_key(id)
    }

    /// Number of touches held, including ended ones still tracked by a recognizer.
    pub fn len(&self) -> usize {
        self.touches.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    /// Iterate over all touches.
    pub fn iter(&self) -> impl Iterator<Item = &Touch> + '_ {
        self.touches.values()
    }

    /// Snapshot the given touches, skipping unknown IDs.
    pub fn snapshot(&self, ids: &[TouchId]) -> Vec<Touch> {
        ids.iter()
            .filter_map(|id| self.touches.get(*id))
            .cloned()
            .collect()
    }

    pub(crate) fn attach(&mut self, id: TouchId, recognizer: RecognizerId) {
        if let Some(touch) = self.touches.get_mut(id)
            && !touch.recognizers.contains(&recognizer)
        {
            touch.recognizers.push(recognizer);
        }
    }

    /// The touch forgets the recognizer. Drops the touch if nothing needs it anymore.
    pub(crate) fn detach(&mut self, id: TouchId, recognizer: RecognizerId) {
        if let Some(touch) = self.touches.get_mut(id) {
            touch.recognizers.retain(|r| *r != recognizer);
        }
        self.prune(id);
    }

    /// Returns `true` the first time, while the view still owns the touch.
    pub(crate) fn mark_cancelled_for_view(&mut self, id: TouchId) -> bool {
        match self.touches.get_mut(id) {
            Some(touch) if !touch.cancelled_for_view && !touch.released => {
                touch.cancelled_for_view = true;
                true
            }
            _ => false,
        }
    }

    /// Mark a terminal touch as fully delivered. Drops it if no recognizer tracks it.
    pub(crate) fn release(&mut self, id: TouchId) {
        if let Some(touch) = self.touches.get_mut(id) {
            touch.released = true;
        }
        self.prune(id);
    }

    fn prune(&mut self, id: TouchId) {
        let done = self
            .touches
            .get(id)
            .is_some_and(|t| t.released && t.recognizers.is_empty());
        if done {
            self.touches.remove(id);
        }
    }
}
