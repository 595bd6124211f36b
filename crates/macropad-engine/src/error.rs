use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors surfaced by the orchestrator itself.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport reached end-of-stream or failed while reading.
    #[error("Transport closed")]
    TransportClosed,
}

/// Failure of a single action execution.
///
/// These never reach the dispatch loop; the task running the action logs them.
#[derive(Debug, Error)]
pub enum ActionError {
    /// An external command could not be spawned or exited unsuccessfully.
    #[error("{program} failed ({cause}): {output}")]
    ExternalCommand {
        /// Program that was run.
        program: String,
        /// Combined stdout/stderr captured before the failure.
        output: String,
        /// Exit status or spawn error.
        cause: String,
    },

    /// The time-tracking service rejected or failed a request.
    #[error("Time tracking failed: {0}")]
    RemoteService(#[from] time_track::Error),
}
