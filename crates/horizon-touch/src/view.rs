//! The view layer as seen from the gesture engine.
//!
//! The toolkit owns its view tree. The gesture engine only needs a handful of
//! things from it, which the toolkit provides by implementing [`ViewHost`]
//! for whatever stores its views:
//!
//! ```ignore
//! use horizon_touch::{Point, Touch, ViewHost, ViewId};
//!
//! struct MyViewTree { /* ... */ }
//!
//! impl ViewHost for MyViewTree {
//!     fn hit_test(&self, point: Point) -> Option<ViewId> {
//!         self.deepest_view_at(point)
//!     }
//!
//!     fn parent(&self, view: ViewId) -> Option<ViewId> {
//!         self.parent_of(view)
//!     }
//!
//!     fn touches_cancelled(&mut self, view: ViewId, touches: &[Touch]) {
//!         self.view_mut(view).cancel_tracking(touches);
//!     }
//! }
//! ```

use horizon_touch_core::logging::targets;
use horizon_touch_core::{Point, ViewId};

use crate::touch::Touch;

/// Interface to the host toolkit's view tree.
///
/// Only [`hit_test`](Self::hit_test) and [`parent`](Self::parent) are
/// required. Every other method defaults to doing nothing, so a host that has
/// no raw touch handling or feedback hooks implements just those two.
pub trait ViewHost {
    /// Find the deepest view that should receive a touch at `point` (window coordinates).
    fn hit_test(&self, point: Point) -> Option<ViewId>;

    /// The parent of `view`, or `None` for the root.
    fn parent(&self, view: ViewId) -> Option<ViewId>;

    /// Convert a window-coordinate point into `view`'s coordinate space.
    fn window_to_local(&self, _view: ViewId, point: Point) -> Point {
        point
    }

    /// Raw delivery: touches began in `view`.
    fn touches_began(&mut self, _view: ViewId, _touches: &[Touch]) {}

    /// Raw delivery: touches moved in `view`.
    fn touches_moved(&mut self, _view: ViewId, _touches: &[Touch]) {}

    /// Raw delivery: touches ended in `view`.
    fn touches_ended(&mut self, _view: ViewId, _touches: &[Touch]) {}

    /// The view must stop handling `touches`.
    ///
    /// Called by the system when a contact is cancelled, and by a recognizer
    /// that has recognized its gesture and takes the touches over.
    fn touches_cancelled(&mut self, _view: ViewId, _touches: &[Touch]) {}

    /// Play haptic feedback for a gesture recognized on `view`.
    fn perform_haptic_feedback(&mut self, _view: ViewId) {}

    /// Play the click sound for a gesture recognized on `view`.
    fn play_click_sound(&mut self, _view: ViewId) {}
}

/// Collect `view` and its ancestors, innermost first.
pub fn ancestor_path(host: &dyn ViewHost, view: ViewId) -> Vec<ViewId> {
    let mut path = vec![view];
    let mut current = host.parent(view);
    while let Some(parent) = current {
        if path.contains(&parent) {
            tracing::warn!(target: targets::DISPATCH, ?parent, "view tree has a parent cycle");
            break;
        }
        path.push(parent);
        current = host.parent(parent);
    }
    path
}
