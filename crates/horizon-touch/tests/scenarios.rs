//! End-to-end gesture scenarios driven through the dispatcher.

mod common;

use std::rc::Rc;

use common::{RecordingHost, Rig, StateLog};
use horizon_touch::{
    Gesture, GestureBehavior, GestureDelegate, GestureKind, GestureState, PanGesture,
    RecognizerId, TapGesture, Touch, TouchPhase,
};

/// Makes its recognizer wait for one other recognizer to fail.
struct WaitFor(RecognizerId);

impl GestureDelegate for WaitFor {
    fn should_require_failure_of(&self, _gesture: &Gesture<'_>, other: &Gesture<'_>) -> bool {
        other.id() == self.0
    }
}

/// Accepts only touches left of x = 100.
struct LeftOnly;

impl GestureDelegate for LeftOnly {
    fn should_receive_touch(&self, _gesture: &Gesture<'_>, touch: &Touch) -> bool {
        touch.location().x < 100.0
    }
}

/// Never decides anything; fails only when its touches lift.
struct Undecided;

impl GestureBehavior for Undecided {
    fn kind(&self) -> GestureKind {
        GestureKind::Custom("undecided")
    }
}

#[test]
fn test_single_tap_recognizes_once_then_resets() {
    let mut host = RecordingHost::new();
    let view = host.add_view(None, (0.0, 0.0), (200.0, 200.0));
    let mut rig = Rig::new(host);
    let tap = rig.arena().add_recognizer_to_view(view, TapGesture::new());
    let log = StateLog::attach(rig.arena(), tap);

    rig.send(0, 1, TouchPhase::Began, (50.0, 50.0));
    assert_eq!(rig.state(tap), GestureState::Possible);
    rig.send(80, 1, TouchPhase::Ended, (52.0, 50.0));
    assert_eq!(rig.state(tap), GestureState::Recognized);
    assert_eq!(log.states(), vec![GestureState::Recognized]);

    rig.tick(80);
    assert_eq!(rig.state(tap), GestureState::Possible);
    assert_eq!(log.states(), vec![GestureState::Recognized]);
    assert!(rig.dispatcher.arena().tracking_touches(tap).is_empty());
}

#[test]
fn test_pan_recognizing_fails_waiting_tap() {
    let mut host = RecordingHost::new();
    let view = host.add_view(None, (0.0, 0.0), (200.0, 200.0));
    let mut rig = Rig::new(host);
    let pan = rig
        .arena()
        .add_recognizer_to_view(view, PanGesture::new().with_threshold(5.0));
    let tap = rig.arena().add_recognizer_to_view(view, TapGesture::new());
    rig.arena().require_to_fail(tap, pan).unwrap();
    let pan_log = StateLog::attach(rig.arena(), pan);
    let tap_log = StateLog::attach(rig.arena(), tap);

    rig.send(0, 1, TouchPhase::Began, (50.0, 50.0));
    assert_eq!(rig.dispatcher.arena().failure_requirements(tap), vec![pan]);

    // Within the tap slop, past the pan threshold.
    rig.send(20, 1, TouchPhase::Moved, (58.0, 50.0));
    assert_eq!(rig.state(pan), GestureState::Began);
    assert_eq!(rig.state(tap), GestureState::Failed);

    rig.send(40, 1, TouchPhase::Ended, (58.0, 50.0));
    assert_eq!(rig.state(tap), GestureState::Failed);
    assert_eq!(pan_log.states(), vec![GestureState::Began, GestureState::Ended]);
    assert!(tap_log.states().is_empty());
}

#[test]
fn test_outer_failure_releases_delayed_inner_pan() {
    let mut host = RecordingHost::new();
    let outer = host.add_view(None, (0.0, 0.0), (400.0, 400.0));
    let inner = host.add_view(Some(outer), (0.0, 0.0), (200.0, 200.0));
    let mut rig = Rig::new(host);
    let outer_pan = rig
        .arena()
        .add_recognizer_to_view(outer, PanGesture::new().with_threshold(1000.0));
    let inner_pan = rig.arena().add_recognizer_to_view(inner, PanGesture::new());
    rig.arena()
        .set_delegate(inner_pan, Some(Rc::new(WaitFor(outer_pan))))
        .unwrap();
    let inner_log = StateLog::attach(rig.arena(), inner_pan);

    rig.send(0, 1, TouchPhase::Began, (50.0, 50.0));
    rig.send(16, 1, TouchPhase::Moved, (80.0, 50.0));
    assert_eq!(rig.state(inner_pan), GestureState::Began);
    assert!(rig.dispatcher.arena().is_recognition_delayed(inner_pan));

    rig.send(32, 1, TouchPhase::Moved, (110.0, 50.0));
    assert_eq!(rig.state(inner_pan), GestureState::Changed);
    assert!(inner_log.states().is_empty());

    rig.send(48, 1, TouchPhase::Ended, (110.0, 50.0));
    assert_eq!(rig.state(outer_pan), GestureState::Failed);
    assert_eq!(rig.state(inner_pan), GestureState::Ended);
    assert!(!rig.dispatcher.arena().is_recognition_delayed(inner_pan));
    assert_eq!(
        inner_log.states(),
        vec![GestureState::Began, GestureState::Ended]
    );

    rig.tick(48);
    assert_eq!(rig.state(inner_pan), GestureState::Possible);
    assert_eq!(rig.state(outer_pan), GestureState::Possible);
}

#[test]
fn test_recognized_pan_cancels_view_touches() {
    let mut host = RecordingHost::new();
    let left = host.add_view(None, (0.0, 0.0), (100.0, 200.0));
    let right = host.add_view(None, (100.0, 0.0), (200.0, 200.0));
    let mut rig = Rig::new(host);
    let pan = rig.arena().add_recognizer_to_view(left, PanGesture::new());

    rig.send(0, 1, TouchPhase::Began, (50.0, 50.0));
    rig.send(0, 2, TouchPhase::Began, (150.0, 50.0));
    let tracked = rig.dispatcher.touch_for_contact(1).unwrap();
    let other = rig.dispatcher.touch_for_contact(2).unwrap();

    rig.send(10, 1, TouchPhase::Moved, (54.0, 50.0));
    assert_eq!(rig.state(pan), GestureState::Possible);
    rig.send(20, 1, TouchPhase::Moved, (80.0, 50.0));
    assert_eq!(rig.state(pan), GestureState::Began);

    rig.send(30, 1, TouchPhase::Moved, (90.0, 50.0));
    rig.send(30, 2, TouchPhase::Moved, (160.0, 50.0));
    rig.send(40, 1, TouchPhase::Ended, (90.0, 50.0));
    rig.send(40, 2, TouchPhase::Ended, (160.0, 50.0));

    assert_eq!(
        rig.host.calls_for(left),
        vec![
            TouchPhase::Began,
            TouchPhase::Moved,
            TouchPhase::Cancelled
        ]
    );
    let cancelled: Vec<_> = rig
        .host
        .calls
        .iter()
        .filter(|c| c.phase == TouchPhase::Cancelled)
        .collect();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].touches, vec![tracked]);

    assert_eq!(
        rig.host.calls_for(right),
        vec![TouchPhase::Began, TouchPhase::Moved, TouchPhase::Ended]
    );
    assert!(rig.host.calls.iter().all(|c| c.view != right || c.touches == vec![other]));
}

#[test]
fn test_view_keeps_touches_when_cancelling_disabled() {
    let mut host = RecordingHost::new();
    let view = host.add_view(None, (0.0, 0.0), (200.0, 200.0));
    let mut rig = Rig::new(host);
    let pan = rig.arena().add_recognizer_to_view(view, PanGesture::new());
    rig.arena().set_cancels_touches_in_view(pan, false).unwrap();

    rig.send(0, 1, TouchPhase::Began, (50.0, 50.0));
    rig.send(20, 1, TouchPhase::Moved, (80.0, 50.0));
    rig.send(40, 1, TouchPhase::Ended, (80.0, 50.0));

    assert_eq!(rig.state(pan), GestureState::Ended);
    assert_eq!(
        rig.host.calls_for(view),
        vec![TouchPhase::Began, TouchPhase::Moved, TouchPhase::Ended]
    );
}

#[test]
fn test_feedback_on_recognition() {
    let mut host = RecordingHost::new();
    let view = host.add_view(None, (0.0, 0.0), (200.0, 200.0));
    let mut rig = Rig::new(host);
    let tap = rig.arena().add_recognizer_to_view(view, TapGesture::new());
    rig.arena().set_haptic_feedback_enabled(tap, true).unwrap();
    rig.arena().set_sound_effects_enabled(tap, true).unwrap();

    rig.send(0, 1, TouchPhase::Began, (50.0, 50.0));
    rig.send(30, 1, TouchPhase::Ended, (50.0, 50.0));

    assert_eq!(rig.host.haptics, vec![view]);
    assert_eq!(rig.host.clicks, vec![view]);
}

#[test]
fn test_location_in_view() {
    let mut host = RecordingHost::new();
    let outer = host.add_view(None, (0.0, 0.0), (400.0, 400.0));
    let inner = host.add_view(Some(outer), (100.0, 100.0), (300.0, 300.0));
    let mut rig = Rig::new(host);
    let pan = rig.arena().add_recognizer_to_view(inner, PanGesture::new());

    rig.send(0, 1, TouchPhase::Began, (150.0, 120.0));
    let arena = rig.dispatcher.arena();
    assert_eq!(arena.number_of_touches(pan), 1);
    assert_eq!(
        arena.location_in_view(pan, None, &rig.host),
        Some(horizon_touch::Point::new(150.0, 120.0))
    );
    assert_eq!(
        arena.location_in_view(pan, Some(inner), &rig.host),
        Some(horizon_touch::Point::new(50.0, 20.0))
    );
}

#[test]
fn test_ended_touch_is_not_cancelled_by_late_release() {
    let mut host = RecordingHost::new();
    let view = host.add_view(None, (0.0, 0.0), (200.0, 200.0));
    let mut rig = Rig::new(host);
    let pan = rig.arena().add_recognizer_to_view(view, PanGesture::new());
    let blocker = rig.arena().add_recognizer_to_view(view, Undecided);
    rig.arena().require_to_fail(pan, blocker).unwrap();
    let log = StateLog::attach(rig.arena(), pan);

    rig.send(0, 1, TouchPhase::Began, (50.0, 50.0));
    rig.send(16, 1, TouchPhase::Moved, (90.0, 50.0));
    assert!(rig.dispatcher.arena().is_recognition_delayed(pan));

    // The blocker only fails once the touch has ended in the view.
    rig.send(32, 1, TouchPhase::Ended, (90.0, 50.0));
    assert_eq!(rig.state(blocker), GestureState::Failed);
    assert_eq!(log.states(), vec![GestureState::Began, GestureState::Ended]);
    assert_eq!(
        rig.host.calls_for(view),
        vec![TouchPhase::Began, TouchPhase::Moved, TouchPhase::Ended]
    );
}

#[test]
fn test_delegate_rejected_touch_is_ignored() {
    let mut host = RecordingHost::new();
    let view = host.add_view(None, (0.0, 0.0), (200.0, 200.0));
    let mut rig = Rig::new(host);
    let pan = rig.arena().add_recognizer_to_view(view, PanGesture::new());
    rig.arena().set_delegate(pan, Some(Rc::new(LeftOnly))).unwrap();

    rig.send(0, 1, TouchPhase::Began, (50.0, 50.0));
    rig.send(0, 2, TouchPhase::Began, (150.0, 50.0));
    let left = rig.dispatcher.touch_for_contact(1).unwrap();
    let right = rig.dispatcher.touch_for_contact(2).unwrap();

    let arena = rig.dispatcher.arena();
    assert_eq!(arena.tracking_touches(pan), &[left]);
    assert_eq!(arena.ignored_touches(pan), &[right]);
    assert!(arena.touches().get(right).unwrap().gesture_recognizers().is_empty());

    rig.send(16, 2, TouchPhase::Moved, (190.0, 50.0));
    assert_eq!(rig.state(pan), GestureState::Possible);

    rig.send(32, 1, TouchPhase::Moved, (90.0, 50.0));
    assert_eq!(rig.state(pan), GestureState::Began);
    assert_eq!(rig.dispatcher.arena().number_of_touches(pan), 1);
}
