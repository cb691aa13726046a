//! The gesture arena: recognizer registry and the shared state machine.
//!
//! Every recognizer lives in a [`GestureArena`] and is named by a
//! [`RecognizerId`]. The arena owns the parts every recognizer has in common
//! (state, tracked touches, handlers, delegate, failure requirements) and
//! runs the normalizing transition function. The recognizer-specific part is
//! a boxed [`GestureBehavior`].
//!
//! # Usage
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use horizon_touch::{GestureArena, GestureState, TapGesture};
//!
//! let mut arena = GestureArena::new();
//! let tap = arena.add_recognizer(TapGesture::new());
//!
//! let taps = Rc::new(Cell::new(0));
//! let counter = taps.clone();
//! arena
//!     .add_handler(tap, move |gesture| {
//!         if gesture.state() == GestureState::Recognized {
//!             counter.set(counter.get() + 1);
//!         }
//!     })
//!     .unwrap();
//!
//! assert_eq!(arena.state(tap), Some(GestureState::Possible));
//! ```
//!
//! # Attempts
//!
//! A recognizer runs one *attempt* at a time: it starts tracking touches in
//! `Possible`, ends in a finished state, and is reset to `Possible` by a
//! zero-delay task on the arena's deferred queue. The owning run loop drives
//! that queue with [`GestureArena::tick`].

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use horizon_touch_core::logging::{span_names, targets};
use horizon_touch_core::{
    DeferredQueue, HandlerId, Point, RecognizerId, Result, TaskId, TouchError, TouchId, ViewId,
};
use slotmap::SlotMap;

use crate::arbitration::FailureGraph;
use crate::behavior::{Command, GestureBehavior, GestureContext, GestureKind, TimerToken};
use crate::delegate::GestureDelegate;
use crate::event::TouchEvent;
use crate::state::GestureState;
use crate::touch::{Touch, TouchPhase, TouchTable};
use crate::view::ViewHost;

/// A callback invoked when a recognizer reports a state.
pub type GestureHandler = Box<dyn FnMut(&Gesture<'_>)>;

/// Work queued on the arena's deferred queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Deferred {
    Reset(RecognizerId),
    Timer {
        recognizer: RecognizerId,
        token: TimerToken,
    },
    /// A requirement went away without resolving; check a delayed recognizer again.
    Reevaluate(RecognizerId),
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Touches(TouchPhase),
    Timer(TimerToken),
}

/// The state every recognizer carries, whatever its kind.
pub(crate) struct RecognizerCore {
    pub(crate) state: GestureState,
    pub(crate) view: Option<ViewId>,
    pub(crate) enabled: bool,
    pub(crate) cancels_touches_in_view: bool,
    pub(crate) haptic_feedback_enabled: bool,
    pub(crate) sound_effects_enabled: bool,
    /// Touches accepted this attempt, in acceptance order. Lifted touches stay until reset.
    pub(crate) tracking_touches: Vec<TouchId>,
    pub(crate) ignored_touches: Vec<TouchId>,
    /// Declared with `require_to_fail`. Liveness is checked on use.
    pub(crate) static_requirements: Vec<RecognizerId>,
    pub(crate) graph: FailureGraph,
    /// Recognized, but handlers wait for the failure requirements.
    pub(crate) recognition_delayed: bool,
    /// Whether the current attempt has accepted any touch.
    pub(crate) attempt_active: bool,
    /// Whether `set_state` ran during the current touch delivery.
    state_set: bool,
    pub(crate) pending_reset: Option<TaskId>,
    pub(crate) timers: HashMap<TimerToken, TaskId>,
    pub(crate) delegate: Option<Rc<dyn GestureDelegate>>,
    last_location: Option<Point>,
}

impl RecognizerCore {
    fn new() -> Self {
        Self {
            state: GestureState::Possible,
            view: None,
            enabled: true,
            cancels_touches_in_view: true,
            haptic_feedback_enabled: false,
            sound_effects_enabled: false,
            tracking_touches: Vec::new(),
            ignored_touches: Vec::new(),
            static_requirements: Vec::new(),
            graph: FailureGraph::default(),
            recognition_delayed: false,
            attempt_active: false,
            state_set: false,
            pending_reset: None,
            timers: HashMap::new(),
            delegate: None,
            last_location: None,
        }
    }

    fn active_touches<'t>(&'t self, table: &'t TouchTable) -> impl Iterator<Item = &'t Touch> + 't {
        self.tracking_touches
            .iter()
            .filter_map(|id| table.get(*id))
            .filter(|touch| touch.is_active())
    }
}

/// A registered recognizer.
pub(crate) struct RecognizerSlot {
    pub(crate) core: RecognizerCore,
    pub(crate) behavior: Box<dyn GestureBehavior>,
    handlers: SlotMap<HandlerId, GestureHandler>,
}

/// A read-only view of one recognizer, handed to handlers and delegates.
#[derive(Clone, Copy)]
pub struct Gesture<'a> {
    pub(crate) arena: &'a GestureArena,
    pub(crate) slot: &'a RecognizerSlot,
    id: RecognizerId,
    state: GestureState,
}

impl<'a> Gesture<'a> {
    /// The recognizer's ID.
    pub fn id(&self) -> RecognizerId {
        self.id
    }

    /// The state being reported.
    ///
    /// This is the recognizer's real state except during a delayed delivery,
    /// where handlers first see `Began` even if the gesture has already moved on.
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// The recognizer's family.
    pub fn kind(&self) -> GestureKind {
        self.slot.behavior.kind()
    }

    /// The view the recognizer is attached to.
    pub fn view(&self) -> Option<ViewId> {
        self.slot.core.view
    }

    /// Number of tracked touches still down.
    pub fn number_of_touches(&self) -> usize {
        self.slot.core.active_touches(&self.arena.touches).count()
    }

    /// Centroid of the tracked touches in window coordinates.
    ///
    /// After the last touch lifts this is where the touches were last seen.
    pub fn location(&self) -> Option<Point> {
        Point::centroid(
            self.slot
                .core
                .active_touches(&self.arena.touches)
                .map(Touch::location),
        )
        .or(self.slot.core.last_location)
    }

    /// Touches tracked this attempt.
    pub fn tracking_touches(&self) -> &'a [TouchId] {
        &self.slot.core.tracking_touches
    }

    /// The arena's touch table.
    pub fn touches(&self) -> &'a TouchTable {
        &self.arena.touches
    }

    /// The arena this recognizer lives in.
    pub fn arena(&self) -> &'a GestureArena {
        self.arena
    }

    /// Downcast the recognizer's behavior, e.g. to read a pan's translation.
    pub fn behavior<T: GestureBehavior>(&self) -> Option<&'a T> {
        let behavior: &'a dyn std::any::Any = &*self.slot.behavior;
        behavior.downcast_ref::<T>()
    }
}

impl fmt::Debug for Gesture<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gesture")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("state", &self.state)
            .field("view", &self.view())
            .finish()
    }
}

/// Owner of every recognizer, the touch table and the deferred task queue.
pub struct GestureArena {
    pub(crate) recognizers: SlotMap<RecognizerId, RecognizerSlot>,
    /// Recognizers attached to each view, in attachment order.
    views: HashMap<ViewId, Vec<RecognizerId>>,
    pub(crate) touches: TouchTable,
    pub(crate) deferred: DeferredQueue<Deferred>,
    /// Latest event or tick time seen; deferred tasks are posted relative to it.
    pub(crate) now: Instant,
}

impl Default for GestureArena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GestureArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureArena")
            .field("recognizers", &self.recognizers.len())
            .field("touches", &self.touches.len())
            .field("pending_tasks", &self.deferred.pending_count())
            .finish()
    }
}

impl GestureArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            recognizers: SlotMap::with_key(),
            views: HashMap::new(),
            touches: TouchTable::new(),
            deferred: DeferredQueue::new(),
            now: Instant::now(),
        }
    }

    // -------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------

    /// Register a recognizer. It receives no touches until attached to a view.
    pub fn add_recognizer<B: GestureBehavior>(&mut self, behavior: B) -> RecognizerId {
        let kind = behavior.kind();
        let id = self.recognizers.insert(RecognizerSlot {
            core: RecognizerCore::new(),
            behavior: Box::new(behavior),
            handlers: SlotMap::with_key(),
        });
        tracing::trace!(target: targets::RECOGNIZER, ?id, ?kind, "registered recognizer");
        id
    }

    /// Register a recognizer and attach it to `view`.
    pub fn add_recognizer_to_view<B: GestureBehavior>(
        &mut self,
        view: ViewId,
        behavior: B,
    ) -> RecognizerId {
        let id = self.add_recognizer(behavior);
        self.views.entry(view).or_default().push(id);
        if let Some(core) = self.core_mut(id) {
            core.view = Some(view);
        }
        id
    }

    /// Attach a recognizer to `view`, or detach it with `None`.
    ///
    /// Moving a recognizer always resets it.
    pub fn attach_to_view(&mut self, id: RecognizerId, view: Option<ViewId>) -> Result<()> {
        let old = self.core(id).ok_or(TouchError::InvalidRecognizer)?.view;
        self.unlink_view(id, old);
        self.reset(id);
        if let Some(view) = view {
            self.views.entry(view).or_default().push(id);
        }
        if let Some(core) = self.core_mut(id) {
            core.view = view;
        }
        tracing::debug!(target: targets::RECOGNIZER, ?id, ?old, new = ?view, "recognizer attached");
        Ok(())
    }

    /// Remove a recognizer.
    ///
    /// A recognizer removed mid-attempt counts as failed for the recognizers
    /// waiting on it.
    pub fn remove_recognizer(&mut self, id: RecognizerId, host: &mut dyn ViewHost) -> Result<()> {
        let core = self.core(id).ok_or(TouchError::InvalidRecognizer)?;
        let unresolved = !core.graph.dependents.is_empty() && !core.graph.has_notified();
        let view = core.view;
        if unresolved {
            self.notify_dependents_of_failure(id, host);
        }
        self.reset(id);
        self.unlink_view(id, view);
        self.recognizers.remove(id);
        for slot in self.recognizers.values_mut() {
            slot.core.static_requirements.retain(|r| *r != id);
        }
        tracing::trace!(target: targets::RECOGNIZER, ?id, "removed recognizer");
        Ok(())
    }

    /// Whether `id` names a registered recognizer.
    pub fn contains(&self, id: RecognizerId) -> bool {
        self.recognizers.contains_key(id)
    }

    /// Number of registered recognizers.
    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    /// Whether no recognizer is registered.
    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    /// Recognizers attached to `view`, in attachment order.
    pub fn recognizers_for_view(&self, view: ViewId) -> &[RecognizerId] {
        self.views.get(&view).map(Vec::as_slice).unwrap_or(&[])
    }

    fn unlink_view(&mut self, id: RecognizerId, view: Option<ViewId>) {
        let Some(view) = view else {
            return;
        };
        if let Some(list) = self.views.get_mut(&view) {
            list.retain(|r| *r != id);
            if list.is_empty() {
                self.views.remove(&view);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// Register a handler, called with every reported state.
    pub fn add_handler<F>(&mut self, id: RecognizerId, handler: F) -> Result<HandlerId>
    where
        F: FnMut(&Gesture<'_>) + 'static,
    {
        let slot = self
            .recognizers
            .get_mut(id)
            .ok_or(TouchError::InvalidRecognizer)?;
        Ok(slot.handlers.insert(Box::new(handler)))
    }

    /// Unregister a handler.
    pub fn remove_handler(&mut self, id: RecognizerId, handler: HandlerId) -> Result<()> {
        let slot = self
            .recognizers
            .get_mut(id)
            .ok_or(TouchError::InvalidRecognizer)?;
        slot.handlers
            .remove(handler)
            .map(|_| ())
            .ok_or(TouchError::InvalidHandler)
    }

    /// Number of handlers registered on a recognizer.
    pub fn handler_count(&self, id: RecognizerId) -> usize {
        self.recognizers.get(id).map_or(0, |slot| slot.handlers.len())
    }

    /// Make `id` wait for `requirement` to fail before it may recognize.
    ///
    /// The requirement is held by ID; removing `requirement` later simply drops it.
    pub fn require_to_fail(&mut self, id: RecognizerId, requirement: RecognizerId) -> Result<()> {
        if !self.contains(id) || !self.contains(requirement) {
            return Err(TouchError::InvalidRecognizer);
        }
        if id == requirement {
            return Err(TouchError::SelfDependency);
        }
        if self.statically_requires(requirement, id) {
            tracing::warn!(target: targets::ARBITRATION, dependent = ?id, ?requirement, "rejected cyclic failure requirement");
            return Err(TouchError::DependencyCycle {
                dependent: id,
                requirement,
            });
        }
        if let Some(core) = self.core_mut(id)
            && !core.static_requirements.contains(&requirement)
        {
            core.static_requirements.push(requirement);
        }
        Ok(())
    }

    /// Drop a failure requirement declared with [`require_to_fail`](Self::require_to_fail).
    pub fn remove_failure_requirement(
        &mut self,
        id: RecognizerId,
        requirement: RecognizerId,
    ) -> Result<()> {
        let core = self.core_mut(id).ok_or(TouchError::InvalidRecognizer)?;
        core.static_requirements.retain(|r| *r != requirement);
        Ok(())
    }

    /// Set or clear the recognizer's delegate.
    pub fn set_delegate(
        &mut self,
        id: RecognizerId,
        delegate: Option<Rc<dyn GestureDelegate>>,
    ) -> Result<()> {
        self.core_mut(id).ok_or(TouchError::InvalidRecognizer)?.delegate = delegate;
        Ok(())
    }

    /// Enable or disable a recognizer.
    ///
    /// Disabling a gesture in progress cancels it (or fails it, if it has not
    /// begun yet).
    pub fn set_enabled(
        &mut self,
        id: RecognizerId,
        enabled: bool,
        host: &mut dyn ViewHost,
    ) -> Result<()> {
        let core = self.core(id).ok_or(TouchError::InvalidRecognizer)?;
        let (state, active) = (core.state, core.attempt_active);
        if !enabled {
            if state.is_recognized() && !state.is_finished() {
                self.set_state(id, GestureState::Cancelled, host);
            } else if state == GestureState::Possible && active {
                self.set_state(id, GestureState::Failed, host);
            }
        }
        if let Some(core) = self.core_mut(id) {
            core.enabled = enabled;
        }
        Ok(())
    }

    /// Whether a recognized gesture cancels its view's own handling of the touches.
    pub fn set_cancels_touches_in_view(&mut self, id: RecognizerId, cancels: bool) -> Result<()> {
        self.core_mut(id)
            .ok_or(TouchError::InvalidRecognizer)?
            .cancels_touches_in_view = cancels;
        Ok(())
    }

    /// Play haptic feedback when the gesture begins or is recognized.
    pub fn set_haptic_feedback_enabled(&mut self, id: RecognizerId, enabled: bool) -> Result<()> {
        self.core_mut(id)
            .ok_or(TouchError::InvalidRecognizer)?
            .haptic_feedback_enabled = enabled;
        Ok(())
    }

    /// Play the click sound when the gesture begins or is recognized.
    pub fn set_sound_effects_enabled(&mut self, id: RecognizerId, enabled: bool) -> Result<()> {
        self.core_mut(id)
            .ok_or(TouchError::InvalidRecognizer)?
            .sound_effects_enabled = enabled;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// The recognizer's current state.
    pub fn state(&self, id: RecognizerId) -> Option<GestureState> {
        self.core(id).map(|core| core.state)
    }

    /// The view the recognizer is attached to.
    pub fn view(&self, id: RecognizerId) -> Option<ViewId> {
        self.core(id).and_then(|core| core.view)
    }

    /// Whether the recognizer accepts touches.
    pub fn is_enabled(&self, id: RecognizerId) -> bool {
        self.core(id).is_some_and(|core| core.enabled)
    }

    /// Number of tracked touches still down.
    pub fn number_of_touches(&self, id: RecognizerId) -> usize {
        self.core(id)
            .map_or(0, |core| core.active_touches(&self.touches).count())
    }

    /// Where the gesture is, in `view`'s coordinates or in window coordinates for `None`.
    pub fn location_in_view(
        &self,
        id: RecognizerId,
        view: Option<ViewId>,
        host: &dyn ViewHost,
    ) -> Option<Point> {
        let location = self.gesture(id)?.location()?;
        Some(match view {
            Some(view) => host.window_to_local(view, location),
            None => location,
        })
    }

    /// Touches tracked this attempt.
    pub fn tracking_touches(&self, id: RecognizerId) -> &[TouchId] {
        self.core(id)
            .map(|core| core.tracking_touches.as_slice())
            .unwrap_or(&[])
    }

    /// Touches the recognizer was offered this attempt but did not take.
    pub fn ignored_touches(&self, id: RecognizerId) -> &[TouchId] {
        self.core(id)
            .map(|core| core.ignored_touches.as_slice())
            .unwrap_or(&[])
    }

    /// Live failure requirements declared with `require_to_fail`.
    pub fn failure_requirements(&self, id: RecognizerId) -> Vec<RecognizerId> {
        self.core(id).map_or_else(Vec::new, |core| {
            core.static_requirements
                .iter()
                .copied()
                .filter(|r| self.contains(*r))
                .collect()
        })
    }

    /// Whether the recognizer is recognized but waiting on its failure requirements.
    pub fn is_recognition_delayed(&self, id: RecognizerId) -> bool {
        self.core(id).is_some_and(|core| core.recognition_delayed)
    }

    /// Whether a reset is scheduled for the recognizer.
    pub fn has_pending_reset(&self, id: RecognizerId) -> bool {
        self.core(id).is_some_and(|core| core.pending_reset.is_some())
    }

    /// A read-only handle reporting the current state.
    pub fn gesture(&self, id: RecognizerId) -> Option<Gesture<'_>> {
        let slot = self.recognizers.get(id)?;
        Some(Gesture {
            arena: self,
            slot,
            id,
            state: slot.core.state,
        })
    }

    /// Downcast a recognizer's behavior.
    pub fn behavior<T: GestureBehavior>(&self, id: RecognizerId) -> Option<&T> {
        let behavior: &dyn std::any::Any = &*self.recognizers.get(id)?.behavior;
        behavior.downcast_ref::<T>()
    }

    /// Downcast a recognizer's behavior for reconfiguration.
    pub fn behavior_mut<T: GestureBehavior>(&mut self, id: RecognizerId) -> Option<&mut T> {
        let behavior: &mut dyn std::any::Any = &mut *self.recognizers.get_mut(id)?.behavior;
        behavior.downcast_mut::<T>()
    }

    /// The touch table.
    pub fn touches(&self) -> &TouchTable {
        &self.touches
    }

    pub(crate) fn touches_mut(&mut self) -> &mut TouchTable {
        &mut self.touches
    }

    /// Number of deferred resets and timers waiting to run.
    pub fn pending_task_count(&self) -> usize {
        self.deferred.pending_count()
    }

    /// Time until the next deferred task is due.
    pub fn time_until_next_task(&mut self, now: Instant) -> Option<Duration> {
        self.deferred.time_until_next(now)
    }

    pub(crate) fn core(&self, id: RecognizerId) -> Option<&RecognizerCore> {
        self.recognizers.get(id).map(|slot| &slot.core)
    }

    pub(crate) fn core_mut(&mut self, id: RecognizerId) -> Option<&mut RecognizerCore> {
        self.recognizers.get_mut(id).map(|slot| &mut slot.core)
    }

    pub(crate) fn advance_clock(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    // -------------------------------------------------------------------------
    // Touch delivery
    // -------------------------------------------------------------------------

    /// Offer newly began touches to a recognizer.
    ///
    /// Each touch the delegate accepts joins the tracking set and the touch
    /// learns about the recognizer; rejected touches are ignored for the rest
    /// of the attempt. Touches already seen are skipped.
    pub fn offer_touches(&mut self, id: RecognizerId, touches: &[TouchId]) {
        let Some(slot) = self.recognizers.get(id) else {
            return;
        };
        let core = &slot.core;
        if !core.enabled || core.view.is_none() || core.state.is_finished() {
            return;
        }

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for &touch_id in touches {
            let Some(touch) = self.touches.get(touch_id) else {
                continue;
            };
            if touch.phase() != TouchPhase::Began
                || core.tracking_touches.contains(&touch_id)
                || core.ignored_touches.contains(&touch_id)
            {
                continue;
            }
            let receive = match &core.delegate {
                Some(delegate) => {
                    let gesture = Gesture {
                        arena: self,
                        slot,
                        id,
                        state: core.state,
                    };
                    delegate.should_receive_touch(&gesture, touch)
                }
                None => true,
            };
            if receive {
                accepted.push(touch_id);
            } else {
                rejected.push(touch_id);
            }
        }

        if !rejected.is_empty() {
            tracing::trace!(target: targets::RECOGNIZER, ?id, count = rejected.len(), "delegate rejected touches");
        }
        for &touch_id in &accepted {
            self.touches.attach(touch_id, id);
        }
        if let Some(core) = self.core_mut(id) {
            core.attempt_active |= !accepted.is_empty();
            core.tracking_touches.extend(accepted);
            core.ignored_touches.extend(rejected);
        }
    }

    /// Deliver touches to a recognizer.
    ///
    /// New `Began` touches are offered first (see
    /// [`offer_touches`](Self::offer_touches)). The tracked ones are then
    /// handed to the behavior's phase hooks, one hook per phase. A finished or
    /// disabled recognizer ignores the call.
    #[tracing::instrument(skip(self, touches, event, host), target = "horizon_touch::recognizer", level = "trace")]
    pub fn recognize_touches(
        &mut self,
        id: RecognizerId,
        touches: &[TouchId],
        event: &TouchEvent,
        host: &mut dyn ViewHost,
    ) {
        self.advance_clock(event.timestamp());
        let Some(core) = self.core(id) else {
            return;
        };
        if !core.enabled || core.state.is_finished() {
            tracing::trace!(target: targets::RECOGNIZER, state = ?core.state, enabled = core.enabled, "not accepting touches");
            return;
        }

        self.offer_touches(id, touches);
        self.ensure_failure_dependencies(id);

        let relevant: Vec<TouchId> = match self.core(id) {
            Some(core) => touches
                .iter()
                .copied()
                .filter(|t| core.tracking_touches.contains(t))
                .collect(),
            None => return,
        };
        if relevant.is_empty() {
            return;
        }
        if let Some(core) = self.core_mut(id) {
            core.state_set = false;
        }

        for phase in [
            TouchPhase::Began,
            TouchPhase::Moved,
            TouchPhase::Ended,
            TouchPhase::Cancelled,
        ] {
            let group: Vec<TouchId> = relevant
                .iter()
                .copied()
                .filter(|t| self.touches.get(*t).is_some_and(|t| t.phase() == phase))
                .collect();
            if group.is_empty() {
                continue;
            }
            let live = self
                .core(id)
                .is_some_and(|core| core.enabled && !core.state.is_finished());
            if !live {
                break;
            }
            self.run_hook(id, Hook::Touches(phase), &group, host);
        }

        self.remember_location(id, &relevant);

        let silent_change = self.core(id).is_some_and(|core| {
            core.state == GestureState::Changed && !core.state_set && !core.recognition_delayed
        });
        if silent_change && self.are_failure_requirements_satisfied(id) {
            self.notify_handlers(id, GestureState::Changed, host);
        }
    }

    /// Finish an event: release the lifted touches and fail recognizers that
    /// can no longer recognize.
    ///
    /// A recognizer still `Possible` after its last touch lifted, with no timer
    /// pending, is failed so the recognizers waiting on it can proceed. Lifted
    /// touches are released before that, so their views never see a cancel
    /// after the terminal phase.
    pub fn end_touches(&mut self, lifted: &[TouchId], host: &mut dyn ViewHost) {
        let mut affected: Vec<RecognizerId> = Vec::new();
        for &touch_id in lifted {
            if let Some(touch) = self.touches.get(touch_id) {
                for &r in touch.gesture_recognizers() {
                    if !affected.contains(&r) {
                        affected.push(r);
                    }
                }
            }
        }
        for &touch_id in lifted {
            self.touches.release(touch_id);
        }

        for id in affected {
            let idle = self.core(id).is_some_and(|core| {
                core.state == GestureState::Possible
                    && core.timers.is_empty()
                    && core.active_touches(&self.touches).next().is_none()
            });
            if idle {
                tracing::debug!(target: targets::RECOGNIZER, ?id, "touches lifted without recognition");
                self.set_state(id, GestureState::Failed, host);
            }
        }
    }

    fn remember_location(&mut self, id: RecognizerId, delivered: &[TouchId]) {
        let location = self.core(id).and_then(|core| {
            Point::centroid(core.active_touches(&self.touches).map(Touch::location)).or_else(|| {
                Point::centroid(
                    delivered
                        .iter()
                        .filter_map(|t| self.touches.get(*t))
                        .map(Touch::location),
                )
            })
        });
        if let Some(core) = self.core_mut(id)
            && location.is_some()
        {
            core.last_location = location;
        }
    }

    fn run_hook(
        &mut self,
        id: RecognizerId,
        hook: Hook,
        phase_touches: &[TouchId],
        host: &mut dyn ViewHost,
    ) {
        let now = self.now;
        let commands = {
            let Self {
                recognizers,
                touches,
                ..
            } = self;
            let Some(slot) = recognizers.get_mut(id) else {
                return;
            };
            let RecognizerSlot { core, behavior, .. } = slot;
            let mut cx = GestureContext::new(
                id,
                core.view,
                core.state,
                phase_touches,
                &core.tracking_touches,
                touches,
                now,
            );
            match hook {
                Hook::Touches(TouchPhase::Began) => behavior.touches_began(&mut cx),
                Hook::Touches(TouchPhase::Moved) => behavior.touches_moved(&mut cx),
                Hook::Touches(TouchPhase::Ended) => behavior.touches_ended(&mut cx),
                Hook::Touches(TouchPhase::Cancelled) => behavior.touches_cancelled(&mut cx),
                Hook::Timer(token) => behavior.timer_fired(&mut cx, token),
            }
            cx.into_commands()
        };
        self.apply_commands(id, commands, host);
    }

    fn apply_commands(&mut self, id: RecognizerId, commands: Vec<Command>, host: &mut dyn ViewHost) {
        for command in commands {
            if !self.contains(id) {
                break;
            }
            match command {
                Command::SetState(state) => self.set_state(id, state, host),
                Command::StartTimer(token, delay) => self.start_timer(id, token, delay),
                Command::CancelTimer(token) => self.cancel_timer(id, token),
                Command::IgnoreTouch(touch) => self.ignore_touch(id, touch, host),
            }
        }
    }

    fn start_timer(&mut self, id: RecognizerId, token: TimerToken, delay: Duration) {
        let now = self.now;
        let Self {
            recognizers,
            deferred,
            ..
        } = self;
        let Some(slot) = recognizers.get_mut(id) else {
            return;
        };
        if let Some(old) = slot.core.timers.remove(&token) {
            deferred.cancel(old);
        }
        let task = deferred.perform_after_delay(
            now,
            delay,
            Deferred::Timer {
                recognizer: id,
                token,
            },
        );
        slot.core.timers.insert(token, task);
    }

    fn cancel_timer(&mut self, id: RecognizerId, token: TimerToken) {
        let Self {
            recognizers,
            deferred,
            ..
        } = self;
        if let Some(task) = recognizers
            .get_mut(id)
            .and_then(|slot| slot.core.timers.remove(&token))
        {
            deferred.cancel(task);
        }
    }

    fn ignore_touch(&mut self, id: RecognizerId, touch: TouchId, host: &mut dyn ViewHost) {
        let Some(core) = self.core_mut(id) else {
            return;
        };
        let Some(index) = core.tracking_touches.iter().position(|t| *t == touch) else {
            return;
        };
        core.tracking_touches.remove(index);
        core.ignored_touches.push(touch);
        let abandoned = core.tracking_touches.is_empty()
            && core.timers.is_empty()
            && core.state == GestureState::Possible;
        self.touches.detach(touch, id);
        if abandoned {
            self.set_state(id, GestureState::Failed, host);
        }
    }

    // -------------------------------------------------------------------------
    // State machine
    // -------------------------------------------------------------------------

    /// Request a state transition.
    ///
    /// This is the normalizing transition function rather than a setter:
    ///
    /// - a finished recognizer only accepts `Possible` (which resets it); any
    ///   other request is logged and dropped;
    /// - `Possible → Changed` becomes `Began`, and `Changed → Began` stays `Changed`;
    /// - `Failed` after leaving `Possible` becomes `Cancelled`;
    /// - leaving `Possible` for a recognized state asks the delegate's
    ///   `should_begin` and runs the prevention test, failing the gesture if
    ///   either says no;
    /// - handlers are only notified once the failure requirements are
    ///   satisfied; until then the recognition is delayed.
    pub fn set_state(&mut self, id: RecognizerId, requested: GestureState, host: &mut dyn ViewHost) {
        let _span =
            tracing::trace_span!(target: targets::RECOGNIZER, span_names::SET_STATE, ?id, ?requested)
                .entered();
        let Some(current) = self.state(id) else {
            return;
        };

        if requested == GestureState::Possible {
            self.reset(id);
            return;
        }
        if current.is_finished() {
            tracing::warn!(target: targets::RECOGNIZER, ?current, ?requested, "dropped transition out of a finished state");
            return;
        }

        let next = match (current, requested) {
            (GestureState::Possible, GestureState::Changed) => GestureState::Began,
            (GestureState::Changed, GestureState::Began) => GestureState::Changed,
            (current, GestureState::Failed) if current != GestureState::Possible => {
                GestureState::Cancelled
            }
            (_, requested) => requested,
        };
        if let Some(core) = self.core_mut(id) {
            core.state_set = true;
        }

        if current == GestureState::Possible && next.is_recognized() {
            self.build_failure_dependencies(id);
            let begins = self.gesture(id).is_some_and(|gesture| {
                gesture
                    .slot
                    .core
                    .delegate
                    .as_ref()
                    .is_none_or(|delegate| delegate.should_begin(&gesture))
            });
            if !begins || !self.did_pass_prevention_test(id, false) {
                tracing::debug!(target: targets::ARBITRATION, ?id, ?next, delegate_refused = !begins, "recognition prevented");
                if let Some(core) = self.core_mut(id) {
                    core.state = GestureState::Failed;
                }
                self.notify_dependents_of_failure(id, host);
                self.schedule_reset(id);
                return;
            }
        }

        if let Some(core) = self.core_mut(id) {
            core.state = next;
        }
        tracing::trace!(target: targets::RECOGNIZER, ?current, ?next, "state committed");

        if next.notifies_handlers() {
            if next == GestureState::Cancelled {
                if self.did_pass_prevention_test(id, false) {
                    if let Some(core) = self.core_mut(id) {
                        core.recognition_delayed = false;
                    }
                    self.notify_handlers(id, next, host);
                }
            } else if self.are_failure_requirements_satisfied(id) {
                if self.is_recognition_delayed(id) {
                    self.deliver_delayed_recognition(id, host);
                } else {
                    self.notify_handlers(id, next, host);
                    if next.is_recognized() {
                        self.cancel_touches_in_view(id, host);
                        if current == GestureState::Possible {
                            self.notify_dependents_of_recognition(id, host);
                        }
                    }
                }
            } else {
                tracing::debug!(target: targets::ARBITRATION, ?id, ?next, "recognition delayed until failure requirements resolve");
                if let Some(core) = self.core_mut(id) {
                    core.recognition_delayed = true;
                }
            }
        }

        if next.needs_reset() && !self.is_recognition_delayed(id) {
            self.schedule_reset(id);
        }
        if matches!(next, GestureState::Failed | GestureState::Cancelled) {
            self.notify_dependents_of_failure(id, host);
        }
    }

    /// Call every handler with `reported` as the state, then play feedback.
    pub(crate) fn notify_handlers(
        &mut self,
        id: RecognizerId,
        reported: GestureState,
        host: &mut dyn ViewHost,
    ) {
        let Some(slot) = self.recognizers.get_mut(id) else {
            return;
        };
        let mut handlers = std::mem::take(&mut slot.handlers);
        tracing::trace!(target: targets::RECOGNIZER, ?id, ?reported, handler_count = handlers.len(), "notifying handlers");
        if let Some(slot) = self.recognizers.get(id) {
            let gesture = Gesture {
                arena: self,
                slot,
                id,
                state: reported,
            };
            for (_, handler) in handlers.iter_mut() {
                handler(&gesture);
            }
        }

        let Some(slot) = self.recognizers.get_mut(id) else {
            return;
        };
        slot.handlers = handlers;

        let core = &slot.core;
        if matches!(reported, GestureState::Began | GestureState::Recognized)
            && let Some(view) = core.view
        {
            if core.haptic_feedback_enabled {
                host.perform_haptic_feedback(view);
            }
            if core.sound_effects_enabled {
                host.play_click_sound(view);
            }
        }
    }

    /// Take the tracked touches away from the views that own them.
    pub(crate) fn cancel_touches_in_view(&mut self, id: RecognizerId, host: &mut dyn ViewHost) {
        let Some(core) = self.core(id) else {
            return;
        };
        if !core.cancels_touches_in_view {
            return;
        }
        let tracked = core.tracking_touches.clone();

        let mut by_view: Vec<(ViewId, Vec<TouchId>)> = Vec::new();
        for touch_id in tracked {
            let Some(view) = self.touches.get(touch_id).and_then(Touch::view) else {
                continue;
            };
            if !self.touches.mark_cancelled_for_view(touch_id) {
                continue;
            }
            match by_view.iter_mut().find(|(v, _)| *v == view) {
                Some((_, ids)) => ids.push(touch_id),
                None => by_view.push((view, vec![touch_id])),
            }
        }

        for (view, ids) in by_view {
            tracing::debug!(target: targets::RECOGNIZER, ?id, ?view, count = ids.len(), "cancelling touches in view");
            let snapshot = self.touches.snapshot(&ids);
            host.touches_cancelled(view, &snapshot);
        }
    }

    pub(crate) fn schedule_reset(&mut self, id: RecognizerId) {
        let now = self.now;
        let Self {
            recognizers,
            deferred,
            ..
        } = self;
        if let Some(slot) = recognizers.get_mut(id)
            && slot.core.pending_reset.is_none()
        {
            slot.core.pending_reset = Some(deferred.post(now, Deferred::Reset(id)));
        }
    }

    /// Return a recognizer to `Possible` and forget the current attempt.
    ///
    /// Cancels the scheduled reset and every timer, detaches from all touches,
    /// clears the tracked and ignored sets and tears down the failure
    /// dependencies of the attempt. Calling it again is a no-op.
    pub fn reset(&mut self, id: RecognizerId) {
        let now = self.now;
        let Self {
            recognizers,
            touches,
            deferred,
            ..
        } = self;
        let Some(slot) = recognizers.get_mut(id) else {
            return;
        };
        let core = &mut slot.core;
        if let Some(task) = core.pending_reset.take() {
            deferred.cancel(task);
        }
        for (_, task) in core.timers.drain() {
            deferred.cancel(task);
        }
        for touch in core.tracking_touches.drain(..) {
            touches.detach(touch, id);
        }
        core.ignored_touches.clear();
        let previous = core.state;
        core.state = GestureState::Possible;
        core.recognition_delayed = false;
        core.attempt_active = false;
        core.state_set = false;
        core.last_location = None;
        let graph = std::mem::take(&mut core.graph);
        slot.behavior.reset();
        if previous != GestureState::Possible {
            tracing::trace!(target: targets::RECOGNIZER, ?id, ?previous, "reset");
        }

        for requirement in graph.requirements {
            if let Some(other) = recognizers.get_mut(requirement) {
                other.core.graph.dependents.retain(|d| *d != id);
            }
        }
        for dependent in graph.dependents {
            let Some(other) = recognizers.get_mut(dependent) else {
                continue;
            };
            other.core.graph.requirements.retain(|r| *r != id);
            if other.core.recognition_delayed {
                deferred.post(now, Deferred::Reevaluate(dependent));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Deferred work
    // -------------------------------------------------------------------------

    /// Run deferred resets and timers that are due now.
    pub fn tick(&mut self, host: &mut dyn ViewHost) -> usize {
        self.tick_at(Instant::now(), host)
    }

    /// Run deferred resets and timers due at `now`.
    ///
    /// Tasks posted while the batch runs wait for the next tick. Returns the
    /// number of tasks executed.
    pub fn tick_at(&mut self, now: Instant, host: &mut dyn ViewHost) -> usize {
        let _span = tracing::trace_span!(target: targets::RECOGNIZER, span_names::TICK).entered();
        self.advance_clock(now);
        let mut ran = 0;
        for task in self.deferred.due_tasks(now) {
            let Some(job) = self.deferred.take(task) else {
                continue;
            };
            ran += 1;
            match job {
                Deferred::Reset(id) => {
                    if let Some(core) = self.core_mut(id)
                        && core.pending_reset == Some(task)
                    {
                        core.pending_reset = None;
                    }
                    self.reset(id);
                }
                Deferred::Timer { recognizer, token } => {
                    let live = match self.core_mut(recognizer) {
                        Some(core) if core.timers.get(&token) == Some(&task) => {
                            core.timers.remove(&token);
                            core.enabled && !core.state.is_finished()
                        }
                        _ => false,
                    };
                    if live {
                        tracing::trace!(target: targets::RECOGNIZER, ?recognizer, ?token, "timer fired");
                        self.run_hook(recognizer, Hook::Timer(token), &[], host);
                    }
                }
                Deferred::Reevaluate(id) => self.reevaluate_delayed(id, host),
            }
        }
        ran
    }
}

static_assertions::assert_not_impl_any!(GestureArena: Send, Sync);
