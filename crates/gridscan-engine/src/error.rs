//! Error types for scanner control and operation.

use thiserror::Error;

/// Errors reported by scanner control calls and the scan loop.
#[derive(Debug, Error)]
pub enum ScanError {
    /// `start()` was called on a scanner that is already running.
    #[error("Scanner for grid '{grid}' is already running")]
    AlreadyRunning { grid: String },

    /// `stop()` was called on a scanner that is not running.
    #[error("Scanner for grid '{grid}' is not running")]
    NotRunning { grid: String },

    /// The worker task panicked; the strategy state is lost and the
    /// scanner cannot be restarted.
    #[error("Scanner worker for grid '{grid}' panicked")]
    WorkerPanicked { grid: String },

    /// The scanner previously faulted in a way that lost its strategy
    /// state.
    #[error("Scanner for grid '{grid}' is faulted and cannot be restarted")]
    Unrecoverable { grid: String },

    /// A traversal step could not land on any button.
    #[error("No button reachable in grid '{grid}' at [{x}, {y}]")]
    NoButtonReachable { grid: String, x: i32, y: i32 },

    /// The two-level state machine kept switching phases without
    /// settling on a selection (possible with a local cycle limit of
    /// zero on a single-line grid).
    #[error("Scan state machine did not settle in grid '{grid}'")]
    Unsettled { grid: String },

    /// The loop was cancelled while waiting. Not a fault; used
    /// internally to unwind out of the loop on `stop()`.
    #[error("Scan loop interrupted")]
    Interrupted,
}

impl ScanError {
    /// Whether this error is a cooperative cancellation rather than a
    /// runtime fault.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ScanError::Interrupted)
    }
}
