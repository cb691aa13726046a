//! Recognizer states.

/// The state of a gesture recognizer.
///
/// Discrete gestures (tap, swipe) go `Possible → Recognized`. Continuous
/// gestures (pan, pinch, long-press) go `Possible → Began → Changed* → Ended`
/// or end in `Cancelled`. Any gesture that cannot happen goes to `Failed`.
/// Every terminal state eventually returns to `Possible` through a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureState {
    /// Waiting for touches; the gesture may still happen.
    #[default]
    Possible,
    /// A continuous gesture has started.
    Began,
    /// A continuous gesture has changed.
    Changed,
    /// A continuous gesture has finished.
    Ended,
    /// A gesture that had begun was cancelled.
    Cancelled,
    /// The gesture cannot be recognized for this attempt.
    Failed,
    /// A discrete gesture was recognized.
    Recognized,
}

impl GestureState {
    /// Whether this state counts as an active, recognized gesture.
    pub fn is_recognized(self) -> bool {
        matches!(
            self,
            Self::Began | Self::Changed | Self::Ended | Self::Recognized
        )
    }

    /// Whether the recognizer must be reset to `Possible` after entering this state.
    pub fn needs_reset(self) -> bool {
        matches!(
            self,
            Self::Ended | Self::Cancelled | Self::Failed | Self::Recognized
        )
    }

    /// Whether handlers are called when this state is entered.
    pub fn notifies_handlers(self) -> bool {
        matches!(
            self,
            Self::Began | Self::Changed | Self::Ended | Self::Cancelled | Self::Recognized
        )
    }

    /// Whether the attempt is over. A finished recognizer only moves to `Possible`.
    pub fn is_finished(self) -> bool {
        self.needs_reset()
    }
}

static_assertions::assert_impl_all!(GestureState: Copy, Send, Sync);
