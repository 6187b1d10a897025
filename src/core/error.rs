//! Error types for the worker pool and its bounded-wait queue.

use thiserror::Error;

/// Errors produced by pool and queue operations.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PoolError {
    /// The bounded-wait queue has been closed; no further items may be
    /// pushed, and pop found it empty after closure.
    #[error("queue closed")]
    QueueClosed,

    /// `submit` was called while the pool's phase was not `Running`.
    #[error("pool stopped")]
    PoolStopped,

    /// A bound mutation would invert `lower <= upper`.
    #[error("bound violation: lower ({lower}) > upper ({upper})")]
    BoundViolation {
        /// The lower bound that was requested or currently in effect.
        lower: usize,
        /// The upper bound that was requested or currently in effect.
        upper: usize,
    },

    /// The submitted closure panicked; its `JoinHandle` cannot produce a
    /// result.
    #[error("task panicked")]
    TaskPanicked,

    /// The task was dropped without running, because the pool stopped
    /// before it was dispatched.
    #[error("task aborted: pool stopped before dispatch")]
    TaskAborted,
}
