//! Stable handle types.
//!
//! Every cross-reference in Horizon Touch is a generational handle into an
//! arena rather than a pointer. A handle whose slot has been freed simply
//! stops resolving, so dangling references are pruned by a liveness check
//! instead of by dereferencing a cleared weak pointer.

use slotmap::new_key_type;

new_key_type! {
    /// A view in the host toolkit's view tree.
    ///
    /// The view tree itself is owned by the toolkit; Horizon Touch only stores
    /// these handles and hands them back through `ViewHost` callbacks.
    pub struct ViewId;
}

new_key_type! {
    /// A gesture recognizer registered in a gesture arena.
    ///
    /// The ID becomes invalid once the recognizer is removed. Failure
    /// requirements and dependents that still name it are ignored from then on.
    pub struct RecognizerId;
}

new_key_type! {
    /// One continuous contact, from the moment it begins until it ends or is
    /// cancelled.
    pub struct TouchId;
}

new_key_type! {
    /// A registered gesture handler.
    ///
    /// Returned by `add_handler`, used to remove the handler again.
    pub struct HandlerId;
}

impl ViewId {
    /// Convert the ViewId to a raw u64 value.
    ///
    /// Useful when the host toolkit keys its views by plain integers.
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }

    /// Create a ViewId from a raw u64 value produced by [`ViewId::as_raw`].
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

static_assertions::assert_impl_all!(ViewId: Copy, Send, Sync);
static_assertions::assert_impl_all!(RecognizerId: Copy, Send, Sync);
static_assertions::assert_impl_all!(TouchId: Copy, Send, Sync);
static_assertions::assert_impl_all!(HandlerId: Copy, Send, Sync);
