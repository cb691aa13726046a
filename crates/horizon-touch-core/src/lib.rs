//! Core plumbing for Horizon Touch.
//!
//! This crate provides the pieces of the gesture engine that know nothing
//! about gestures:
//!
//! - **Handles**: Generational IDs for views, recognizers, touches and handlers
//! - **Geometry**: The [`Point`] type used for touch locations
//! - **Task Queue**: A cancellable deferred task queue drained once per tick
//! - **Errors**: The [`TouchError`] taxonomy for configuration calls
//! - **Logging**: Target and span names for `tracing` filters

mod error;
mod geometry;
mod handle;
pub mod logging;
mod task;

pub use error::{Result, TouchError};
pub use geometry::Point;
pub use handle::{HandlerId, RecognizerId, TouchId, ViewId};
pub use task::{DeferredQueue, TaskId};
