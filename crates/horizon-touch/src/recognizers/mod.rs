//! Built-in recognizers.
//!
//! Each recognizer is a [`GestureBehavior`](crate::GestureBehavior) with its
//! own geometry. They all follow the same contract with the arena: fail from
//! `Possible` as soon as the touches rule the gesture out, report `Changed`
//! while a continuous gesture moves, and finish with `Ended` or `Recognized`.
//!
//! | Recognizer | Kind | Finishes with |
//! |------------|------|---------------|
//! | [`TapGesture`] | discrete | `Recognized` |
//! | [`SwipeGesture`] | discrete | `Recognized` |
//! | [`LongPressGesture`] | continuous | `Ended` |
//! | [`PanGesture`] | continuous | `Ended` |
//! | [`PinchGesture`] | continuous | `Ended` |

mod long_press;
mod pan;
mod pinch;
mod swipe;
mod tap;

pub use long_press::LongPressGesture;
pub use pan::PanGesture;
pub use pinch::PinchGesture;
pub use swipe::{SwipeDirection, SwipeDirections, SwipeGesture};
pub use tap::TapGesture;
