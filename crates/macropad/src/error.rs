use std::{io, path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Result type for the binary's startup and run phases.
pub type Result<T> = StdResult<T, Error>;

/// Fatal errors; each ends the process with a non-zero status.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be resolved, read, or validated.
    #[error("{}", .0.pretty())]
    Config(#[from] config::Error),

    /// No keypad device was found while probing.
    #[error("No keypad found in {dir} (looked for {patterns})")]
    NoPort {
        /// Directory that was scanned.
        dir: PathBuf,
        /// Device name prefixes that were accepted.
        patterns: String,
    },

    /// The keypad device could not be opened.
    #[error("Failed to open {path}: {source}")]
    OpenPort {
        /// Device path.
        path: PathBuf,
        /// Underlying error.
        source: tokio_serial::Error,
    },

    /// The time-tracking client could not be built.
    #[error("Time tracking setup failed: {0}")]
    Tracking(#[from] time_track::Error),

    /// The dispatch loop ended with an error.
    #[error(transparent)]
    Engine(#[from] macropad_engine::Error),

    /// Other I/O failure (runtime setup, directory scan).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
