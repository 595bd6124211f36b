//! Type and Macro actions: run an external program once per press.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task;
use tracing::{debug, info};

use super::{Action, ActionKind};
use crate::{
    deps::{CommandRunner, run_checked},
    error::ActionError,
    message::{ActionMessage, MessageSender},
};

/// Keystroke injector invoked by [`TypeAction`].
pub const TYPE_PROGRAM: &str = "cliclick";

/// Run `program` on the blocking pool.
async fn run_blocking(
    runner: Arc<dyn CommandRunner>,
    program: String,
    args: Vec<String>,
) -> Result<String, ActionError> {
    let name = program.clone();
    task::spawn_blocking(move || run_checked(runner.as_ref(), &program, &args))
        .await
        .map_err(|e| ActionError::ExternalCommand {
            program: name,
            output: String::new(),
            cause: e.to_string(),
        })?
}

/// Types a fixed sequence through `cliclick`.
pub struct TypeAction {
    /// Key this action is bound to.
    name: String,
    /// `cliclick` command arguments.
    args: Vec<String>,
    /// Process runner.
    runner: Arc<dyn CommandRunner>,
}

impl TypeAction {
    /// Create a Type action for key `name`.
    pub fn new(name: impl Into<String>, args: Vec<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            name: name.into(),
            args,
            runner,
        }
    }
}

#[async_trait]
impl Action for TypeAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Type
    }

    async fn execute(&self) -> Result<(), ActionError> {
        debug!(key = %self.name, "type_execute");
        run_blocking(
            self.runner.clone(),
            TYPE_PROGRAM.to_string(),
            self.args.clone(),
        )
        .await?;
        Ok(())
    }
}

/// Runs an arbitrary command, optionally showing its output.
pub struct MacroAction {
    /// Key this action is bound to.
    name: String,
    /// Program to run.
    program: String,
    /// Arguments passed to `program`.
    args: Vec<String>,
    /// Send the command output as a notification.
    display_output: bool,
    /// Process runner.
    runner: Arc<dyn CommandRunner>,
    /// Outcome queue.
    messages: MessageSender,
}

impl MacroAction {
    /// Create a Macro action from `command` (program followed by its
    /// arguments). Returns `None` if `command` is empty.
    pub fn new(
        name: impl Into<String>,
        command: Vec<String>,
        display_output: bool,
        runner: Arc<dyn CommandRunner>,
        messages: MessageSender,
    ) -> Option<Self> {
        let mut command = command.into_iter();
        let program = command.next()?;
        Some(Self {
            name: name.into(),
            program,
            args: command.collect(),
            display_output,
            runner,
            messages,
        })
    }
}

#[async_trait]
impl Action for MacroAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Macro
    }

    async fn execute(&self) -> Result<(), ActionError> {
        info!(key = %self.name, program = %self.program, "macro_execute");
        let output =
            run_blocking(self.runner.clone(), self.program.clone(), self.args.clone()).await?;
        if self.display_output {
            self.messages
                .send(ActionMessage::new(&self.name).with_notify(output))
                .await;
        }
        Ok(())
    }
}
