//! Collaborator seams injected into actions at construction time.

use std::{io, process::Command};

use async_trait::async_trait;
use time_track::TimeTrack;
use tracing::trace;

use crate::error::ActionError;

// ---- External commands ----

/// Result of running an external command to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Stdout followed by stderr.
    pub combined: String,
    /// True when the process exited with status zero.
    pub success: bool,
    /// Human-readable exit status (e.g. `exit status: 1`).
    pub status: String,
}

/// Runs external programs. Blocking; callers run it on the blocking pool.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and capture its combined output.
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        trace!(program, ?args, "command_run");
        let output = Command::new(program).args(args).output()?;
        // Unify stdout and stderr into a single message
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        let err = String::from_utf8_lossy(&output.stderr);
        if !err.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&err);
        }
        Ok(CommandOutput {
            combined,
            success: output.status.success(),
            status: output.status.to_string(),
        })
    }
}

/// Run a command, mapping spawn failures and non-zero exits to [`ActionError`].
pub fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
) -> Result<String, ActionError> {
    match runner.run(program, args) {
        Ok(out) if out.success => Ok(out.combined),
        Ok(out) => Err(ActionError::ExternalCommand {
            program: program.to_string(),
            output: out.combined,
            cause: out.status,
        }),
        Err(e) => Err(ActionError::ExternalCommand {
            program: program.to_string(),
            output: String::new(),
            cause: e.to_string(),
        }),
    }
}

// ---- Time tracking ----

/// Minimal time-tracking API used by the Track action.
#[async_trait]
pub trait TimeTracker: Send + Sync {
    /// Open a record and return its server id.
    async fn create(&self, record: &TimeTrack) -> Result<u64, ActionError>;
    /// Update (close) an existing record.
    async fn update(&self, record: &TimeTrack) -> Result<(), ActionError>;
}

/// [`TimeTracker`] backed by the Auxilium HTTP client.
pub struct RealTimeTracker {
    /// HTTP client.
    inner: time_track::Client,
}

impl RealTimeTracker {
    /// Wrap an HTTP client.
    pub fn new(inner: time_track::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl TimeTracker for RealTimeTracker {
    async fn create(&self, record: &TimeTrack) -> Result<u64, ActionError> {
        Ok(self.inner.create_time_track(record).await?)
    }

    async fn update(&self, record: &TimeTrack) -> Result<(), ActionError> {
        self.inner.update_time_track(record).await?;
        Ok(())
    }
}
