//! Error types for the change bus.

use thiserror::Error;

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Errors that can occur on the change bus.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    /// The dispatcher task has stopped.
    #[error("change bus closed")]
    Closed,

    /// A background bus was requested outside a tokio runtime.
    #[error("no tokio runtime available to run the dispatcher")]
    NoRuntime,
}
