//! Failure dependencies and the prevention test.
//!
//! Two mechanisms decide whether a recognizer may report its gesture:
//!
//! - **Failure requirements.** A recognizer can be made to wait for others to
//!   fail, statically with [`GestureArena::require_to_fail`] or dynamically
//!   through behavior and delegate hooks. The edges of one attempt are built
//!   when the recognizer first accepts a touch and torn down on reset. While a
//!   requirement is unresolved the recognizer's handlers are held back
//!   ("recognition delayed").
//! - **The prevention test.** A recognizer leaving `Possible` is blocked by any
//!   other recognizer on the same touches that has already recognized, unless
//!   one of the two delegates allows simultaneous recognition.
//!
//! Resolution fans out synchronously and depth-first: a requirement that fails
//! immediately releases (or fails) the recognizers waiting on it, which may in
//! turn release their own dependents before the original call returns.

use horizon_touch_core::RecognizerId;
use horizon_touch_core::logging::targets;

use crate::recognizer::{Gesture, GestureArena};
use crate::state::GestureState;
use crate::view::ViewHost;

/// Per-attempt dependency bookkeeping of one recognizer.
#[derive(Debug, Default)]
pub(crate) struct FailureGraph {
    pub(crate) built: bool,
    /// Recognizers that must fail before this one may notify.
    pub(crate) requirements: Vec<RecognizerId>,
    /// Recognizers waiting on this one.
    pub(crate) dependents: Vec<RecognizerId>,
    /// Requirements that reported failure this attempt.
    pub(crate) failed_requirements: Vec<RecognizerId>,
    pub(crate) requirements_satisfied: bool,
    pub(crate) passed_prevention_test: bool,
    pub(crate) notified_failure: bool,
    pub(crate) notified_recognition: bool,
}

impl FailureGraph {
    pub(crate) fn has_notified(&self) -> bool {
        self.notified_failure || self.notified_recognition
    }
}

impl GestureArena {
    /// Other recognizers tracking any touch `id` tracks, in discovery order.
    pub fn recognizers_sharing_touches(&self, id: RecognizerId) -> Vec<RecognizerId> {
        let mut others = Vec::new();
        let Some(core) = self.core(id) else {
            return others;
        };
        for touch in core
            .tracking_touches
            .iter()
            .filter_map(|t| self.touches.get(*t))
        {
            for &other in touch.gesture_recognizers() {
                if other != id && self.contains(other) && !others.contains(&other) {
                    others.push(other);
                }
            }
        }
        others
    }

    /// Whether every failure requirement of the current attempt has resolved as failed.
    ///
    /// A requirement counts as failed once it reported failure, or when it is
    /// gone, detached from its view, or not taking part in any attempt. Once
    /// true the answer is cached until the recognizer resets.
    pub fn are_failure_requirements_satisfied(&mut self, id: RecognizerId) -> bool {
        let Some(core) = self.core(id) else {
            return false;
        };
        if core.graph.requirements_satisfied {
            return true;
        }
        let satisfied = core.graph.requirements.iter().all(|r| {
            core.graph.failed_requirements.contains(r) || self.is_out_of_contention(*r)
        });
        if satisfied && let Some(core) = self.core_mut(id) {
            core.graph.requirements_satisfied = true;
            tracing::trace!(target: targets::ARBITRATION, ?id, "failure requirements satisfied");
        }
        satisfied
    }

    fn is_out_of_contention(&self, id: RecognizerId) -> bool {
        match self.core(id) {
            None => true,
            Some(core) => {
                core.view.is_none()
                    || matches!(core.state, GestureState::Failed | GestureState::Cancelled)
                    || (core.state == GestureState::Possible && !core.attempt_active)
            }
        }
    }

    /// Whether `id` may recognize alongside the recognizers already recognized on its touches.
    ///
    /// With `require_satisfied`, unresolved failure requirements fail the test.
    /// A pass is remembered for the rest of the attempt once the requirements
    /// are satisfied.
    pub fn did_pass_prevention_test(&mut self, id: RecognizerId, require_satisfied: bool) -> bool {
        let Some(core) = self.core(id) else {
            return false;
        };
        if core.graph.passed_prevention_test {
            return true;
        }
        let satisfied = self.are_failure_requirements_satisfied(id);
        if require_satisfied && !satisfied {
            return false;
        }

        for other in self.recognizers_sharing_touches(id) {
            let Some(other_core) = self.core(other) else {
                continue;
            };
            if !other_core.state.is_recognized() || other_core.recognition_delayed {
                continue;
            }
            if self.prevents(other, id) && !self.recognize_simultaneously(id, other) {
                tracing::debug!(target: targets::ARBITRATION, ?id, preventer = ?other, "prevented by a recognized gesture");
                return false;
            }
        }

        if satisfied && let Some(core) = self.core_mut(id) {
            core.graph.passed_prevention_test = true;
        }
        true
    }

    fn prevents(&self, preventer: RecognizerId, target: RecognizerId) -> bool {
        let (Some(p), Some(t)) = (self.gesture(preventer), self.gesture(target)) else {
            return false;
        };
        p.slot.behavior.can_prevent(&t) && t.slot.behavior.can_be_prevented_by(&p)
    }

    fn recognize_simultaneously(&self, a: RecognizerId, b: RecognizerId) -> bool {
        let (Some(ga), Some(gb)) = (self.gesture(a), self.gesture(b)) else {
            return false;
        };
        let asks = |this: &Gesture<'_>, other: &Gesture<'_>| {
            this.slot
                .core
                .delegate
                .as_ref()
                .is_some_and(|d| d.should_recognize_simultaneously(this, other))
        };
        asks(&ga, &gb) || asks(&gb, &ga)
    }

    fn wants_to_require(&self, waiter: RecognizerId, requirement: RecognizerId) -> bool {
        let (Some(w), Some(r)) = (self.gesture(waiter), self.gesture(requirement)) else {
            return false;
        };
        w.slot.core.static_requirements.contains(&requirement)
            || w.slot.behavior.should_require_failure_of(&r)
            || r.slot.behavior.should_be_required_to_fail_by(&w)
            || w.slot
                .core
                .delegate
                .as_ref()
                .is_some_and(|d| d.should_require_failure_of(&w, &r))
            || r.slot
                .core
                .delegate
                .as_ref()
                .is_some_and(|d| d.should_be_required_to_fail_by(&r, &w))
    }

    // -------------------------------------------------------------------------
    // Building the graph
    // -------------------------------------------------------------------------

    /// Build the attempt's failure dependencies once the recognizer has touches.
    pub(crate) fn ensure_failure_dependencies(&mut self, id: RecognizerId) {
        if self.core(id).is_some_and(|core| core.attempt_active) {
            self.build_failure_dependencies(id);
        }
    }

    pub(crate) fn build_failure_dependencies(&mut self, id: RecognizerId) {
        let Some(core) = self.core_mut(id) else {
            return;
        };
        if core.graph.built {
            return;
        }
        core.graph.built = true;
        let declared = core.static_requirements.clone();

        for requirement in declared {
            if self.core(requirement).is_some_and(|c| c.view.is_some()) {
                self.add_failure_edge(requirement, id);
            }
        }

        for other in self.recognizers_sharing_touches(id) {
            if self.state(other) != Some(GestureState::Possible) {
                continue;
            }
            if self.wants_to_require(id, other) {
                self.add_failure_edge(other, id);
            }
            if self.wants_to_require(other, id) {
                self.add_failure_edge(id, other);
            }
        }

        if let Some(core) = self.core(id) {
            tracing::trace!(
                target: targets::ARBITRATION,
                ?id,
                requirements = core.graph.requirements.len(),
                dependents = core.graph.dependents.len(),
                "failure dependencies built"
            );
        }
    }

    /// Record that `dependent` waits on `requirement` for this attempt.
    fn add_failure_edge(&mut self, requirement: RecognizerId, dependent: RecognizerId) {
        if requirement == dependent {
            return;
        }
        let Some(dep) = self.core(dependent) else {
            return;
        };
        if dep.graph.requirements.contains(&requirement) {
            return;
        }
        // A finished requirement belongs to an attempt that is already over.
        if self
            .core(requirement)
            .is_none_or(|core| core.state.is_finished())
        {
            return;
        }
        if self.waits_on(requirement, dependent) {
            tracing::warn!(target: targets::ARBITRATION, ?requirement, ?dependent, "skipped failure dependency that would close a cycle");
            return;
        }

        if let Some(core) = self.core_mut(dependent) {
            core.graph.requirements.push(requirement);
        }
        if let Some(core) = self.core_mut(requirement) {
            core.graph.dependents.push(dependent);
        }
        tracing::trace!(target: targets::ARBITRATION, ?requirement, ?dependent, "failure dependency added");
    }

    /// Whether `from` waits, directly or not, on `to` in the current attempt.
    fn waits_on(&self, from: RecognizerId, to: RecognizerId) -> bool {
        self.reaches(from, to, |core| &core.graph.requirements)
    }

    /// Whether `from` requires, directly or not, the failure of `to` through `require_to_fail`.
    pub(crate) fn statically_requires(&self, from: RecognizerId, to: RecognizerId) -> bool {
        self.reaches(from, to, |core| &core.static_requirements)
    }

    fn reaches<F>(&self, from: RecognizerId, to: RecognizerId, edges: F) -> bool
    where
        F: Fn(&crate::recognizer::RecognizerCore) -> &Vec<RecognizerId>,
    {
        let mut stack = vec![from];
        let mut seen = Vec::new();
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if seen.contains(&node) {
                continue;
            }
            seen.push(node);
            if let Some(core) = self.core(node) {
                stack.extend(edges(core).iter().copied());
            }
        }
        false
    }

    // -------------------------------------------------------------------------
    // Fan-out
    // -------------------------------------------------------------------------

    /// Tell every dependent that `id` failed. Runs at most once per attempt.
    pub(crate) fn notify_dependents_of_failure(&mut self, id: RecognizerId, host: &mut dyn ViewHost) {
        let Some(core) = self.core_mut(id) else {
            return;
        };
        if core.graph.notified_failure {
            return;
        }
        core.graph.notified_failure = true;
        let dependents = core.graph.dependents.clone();
        if !dependents.is_empty() {
            tracing::trace!(target: targets::ARBITRATION, ?id, count = dependents.len(), "notifying dependents of failure");
        }
        for dependent in dependents {
            self.failure_requirement_did_fail(dependent, id, host);
        }
    }

    /// Tell every dependent that `id` recognized. Runs at most once per attempt.
    pub(crate) fn notify_dependents_of_recognition(
        &mut self,
        id: RecognizerId,
        host: &mut dyn ViewHost,
    ) {
        let Some(core) = self.core_mut(id) else {
            return;
        };
        if core.graph.notified_recognition {
            return;
        }
        core.graph.notified_recognition = true;
        let dependents = core.graph.dependents.clone();
        if !dependents.is_empty() {
            tracing::trace!(target: targets::ARBITRATION, ?id, count = dependents.len(), "notifying dependents of recognition");
        }
        for dependent in dependents {
            self.failure_requirement_was_recognized(dependent, id, host);
        }
    }

    fn failure_requirement_did_fail(
        &mut self,
        id: RecognizerId,
        requirement: RecognizerId,
        host: &mut dyn ViewHost,
    ) {
        let Some(core) = self.core_mut(id) else {
            return;
        };
        if !core.graph.failed_requirements.contains(&requirement) {
            core.graph.failed_requirements.push(requirement);
        }
        self.reevaluate_delayed(id, host);
    }

    fn failure_requirement_was_recognized(
        &mut self,
        id: RecognizerId,
        requirement: RecognizerId,
        host: &mut dyn ViewHost,
    ) {
        let waiting = self.core(id).is_some_and(|core| {
            core.state == GestureState::Possible || core.recognition_delayed
        });
        if waiting {
            tracing::debug!(target: targets::ARBITRATION, ?id, ?requirement, "failure requirement recognized first");
            self.force_fail(id, host);
        }
    }

    /// Settle a delayed recognizer whose requirements may have resolved.
    pub(crate) fn reevaluate_delayed(&mut self, id: RecognizerId, host: &mut dyn ViewHost) {
        if !self.is_recognition_delayed(id) || !self.are_failure_requirements_satisfied(id) {
            return;
        }
        if self.did_pass_prevention_test(id, true) {
            self.deliver_delayed_recognition(id, host);
        } else {
            self.force_fail(id, host);
        }
    }

    /// Report a recognition that was held back.
    ///
    /// The first report is `Began` for a continuous gesture even if it has
    /// already changed; an ended gesture reports `Began` and then `Ended`.
    pub(crate) fn deliver_delayed_recognition(&mut self, id: RecognizerId, host: &mut dyn ViewHost) {
        let Some(core) = self.core_mut(id) else {
            return;
        };
        core.recognition_delayed = false;
        let state = core.state;
        tracing::debug!(target: targets::ARBITRATION, ?id, ?state, "delivering delayed recognition");

        match state {
            GestureState::Began | GestureState::Changed => {
                self.notify_handlers(id, GestureState::Began, host);
            }
            GestureState::Ended => {
                self.notify_handlers(id, GestureState::Began, host);
                self.notify_handlers(id, GestureState::Ended, host);
            }
            GestureState::Recognized => {
                self.notify_handlers(id, GestureState::Recognized, host);
            }
            _ => {}
        }

        self.cancel_touches_in_view(id, host);
        self.notify_dependents_of_recognition(id, host);
        if state.needs_reset() {
            self.schedule_reset(id);
        }
    }

    /// Fail a recognizer that lost to its requirements, bypassing the transition rules.
    fn force_fail(&mut self, id: RecognizerId, host: &mut dyn ViewHost) {
        let Some(core) = self.core_mut(id) else {
            return;
        };
        core.recognition_delayed = false;
        core.state = GestureState::Failed;
        tracing::debug!(target: targets::ARBITRATION, ?id, "forced to fail");
        self.notify_dependents_of_failure(id, host);
        self.schedule_reset(id);
    }
}
