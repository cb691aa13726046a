//! Error types for Horizon Touch.
//!
//! Only configuration calls (registering recognizers, handlers and failure
//! requirements) report errors. Recognition itself never fails with an error:
//! an invalid state transition is logged and dropped, and "the gesture was
//! never recognized" is an ordinary terminal outcome.

use crate::handle::RecognizerId;

/// Result type alias for Horizon Touch operations.
pub type Result<T> = std::result::Result<T, TouchError>;

/// Errors reported by the gesture arena's configuration API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TouchError {
    /// The recognizer ID is invalid or the recognizer has been removed.
    #[error("invalid or removed gesture recognizer")]
    InvalidRecognizer,

    /// The handler ID is invalid or has already been removed.
    #[error("invalid or removed gesture handler")]
    InvalidHandler,

    /// A recognizer was asked to wait for its own failure.
    #[error("a gesture recognizer cannot require its own failure")]
    SelfDependency,

    /// The failure requirement would close a dependency cycle.
    #[error("failure requirement {requirement:?} already waits on {dependent:?}")]
    DependencyCycle {
        /// The recognizer that would wait.
        dependent: RecognizerId,
        /// The recognizer it would wait on.
        requirement: RecognizerId,
    },
}
