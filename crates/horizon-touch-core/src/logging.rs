//! Logging facilities for Horizon Touch.
//!
//! Horizon Touch uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! use tracing_subscriber;
//!
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_touch::arbitration=trace")
//!         .init();
//! }
//! ```

/// Span names used throughout Horizon Touch for tracing.
pub mod span_names {
    /// Delivery of one touch event through the dispatcher.
    pub const DISPATCH: &str = "horizon_touch::dispatch";
    /// A recognizer's state transition request.
    pub const SET_STATE: &str = "horizon_touch::set_state";
    /// Draining the deferred task queue.
    pub const TICK: &str = "horizon_touch::tick";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Deferred task queue target.
    pub const TASK: &str = "horizon_touch_core::task";
    /// Recognizer state machine target.
    pub const RECOGNIZER: &str = "horizon_touch::recognizer";
    /// Failure dependencies and the prevention test.
    pub const ARBITRATION: &str = "horizon_touch::arbitration";
    /// Touch routing target.
    pub const DISPATCH: &str = "horizon_touch::dispatch";
}
