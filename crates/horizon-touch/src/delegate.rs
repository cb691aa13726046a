//! Delegates: application-supplied policy for a recognizer.
//!
//! Every method has a default, so a delegate overrides only the capabilities it
//! cares about. A recognizer without a delegate behaves as if it had one that
//! overrides nothing.

use std::collections::HashSet;

use crate::behavior::GestureKind;
use crate::recognizer::Gesture;
use crate::touch::Touch;

/// Policy hooks consulted by the arena during recognition.
pub trait GestureDelegate {
    /// Whether the gesture may leave `Possible` for a recognized state.
    ///
    /// Returning `false` fails the gesture.
    fn should_begin(&self, _gesture: &Gesture<'_>) -> bool {
        true
    }

    /// Whether the recognizer should track a newly began touch.
    ///
    /// A rejected touch is ignored for the rest of the attempt.
    fn should_receive_touch(&self, _gesture: &Gesture<'_>, _touch: &Touch) -> bool {
        true
    }

    /// Whether `gesture` and `other` may both be recognized at once.
    ///
    /// Asked of both recognizers' delegates; either one saying yes is enough.
    fn should_recognize_simultaneously(&self, _gesture: &Gesture<'_>, _other: &Gesture<'_>) -> bool {
        false
    }

    /// Whether `gesture` must wait for `other` to fail before recognizing.
    fn should_require_failure_of(&self, _gesture: &Gesture<'_>, _other: &Gesture<'_>) -> bool {
        false
    }

    /// Whether `other` must wait for `gesture` to fail before recognizing.
    fn should_be_required_to_fail_by(&self, _gesture: &Gesture<'_>, _other: &Gesture<'_>) -> bool {
        false
    }
}

/// A delegate that allows simultaneous recognition by gesture kind.
///
/// Pairs are unordered, so allowing `(Pinch, Pan)` also allows `(Pan, Pinch)`.
///
/// ```
/// use horizon_touch::{GestureKind, SimultaneousGesturePolicy};
///
/// let mut policy = SimultaneousGesturePolicy::new();
/// policy.allow_simultaneous(GestureKind::Pinch, GestureKind::Pan);
/// assert!(policy.can_be_simultaneous(GestureKind::Pan, GestureKind::Pinch));
/// assert!(!policy.can_be_simultaneous(GestureKind::Tap, GestureKind::Pan));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimultaneousGesturePolicy {
    allowed_pairs: HashSet<(GestureKind, GestureKind)>,
    allow_all: bool,
}

impl SimultaneousGesturePolicy {
    /// Creates a policy with no allowed simultaneous gestures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy that lets every gesture be recognized alongside any other.
    pub fn allow_all() -> Self {
        Self {
            allowed_pairs: HashSet::new(),
            allow_all: true,
        }
    }

    /// Allows two gesture kinds to be recognized simultaneously.
    pub fn allow_simultaneous(&mut self, a: GestureKind, b: GestureKind) {
        self.allowed_pairs.insert((a, b));
        self.allowed_pairs.insert((b, a));
    }

    /// Disallows two gesture kinds from being recognized simultaneously.
    pub fn disallow_simultaneous(&mut self, a: GestureKind, b: GestureKind) {
        self.allowed_pairs.remove(&(a, b));
        self.allowed_pairs.remove(&(b, a));
    }

    /// Returns whether two gesture kinds can be recognized simultaneously.
    pub fn can_be_simultaneous(&self, a: GestureKind, b: GestureKind) -> bool {
        self.allow_all || self.allowed_pairs.contains(&(a, b))
    }
}

impl GestureDelegate for SimultaneousGesturePolicy {
    fn should_recognize_simultaneously(&self, gesture: &Gesture<'_>, other: &Gesture<'_>) -> bool {
        self.can_be_simultaneous(gesture.kind(), other.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_are_unordered() {
        let mut policy = SimultaneousGesturePolicy::new();
        policy.allow_simultaneous(GestureKind::Pinch, GestureKind::Pan);
        assert!(policy.can_be_simultaneous(GestureKind::Pinch, GestureKind::Pan));
        assert!(policy.can_be_simultaneous(GestureKind::Pan, GestureKind::Pinch));

        policy.disallow_simultaneous(GestureKind::Pan, GestureKind::Pinch);
        assert!(!policy.can_be_simultaneous(GestureKind::Pinch, GestureKind::Pan));
    }

    #[test]
    fn test_same_kind_needs_explicit_pair() {
        let mut policy = SimultaneousGesturePolicy::new();
        assert!(!policy.can_be_simultaneous(GestureKind::Pan, GestureKind::Pan));
        policy.allow_simultaneous(GestureKind::Pan, GestureKind::Pan);
        assert!(policy.can_be_simultaneous(GestureKind::Pan, GestureKind::Pan));
    }

    #[test]
    fn test_allow_all() {
        let policy = SimultaneousGesturePolicy::allow_all();
        assert!(policy.can_be_simultaneous(GestureKind::Tap, GestureKind::Custom("hold")));
    }
}
