//! Macropad Engine
//!
//! The engine drives a serial macro keypad:
//! - decodes press/release lines from the device transport
//! - runs the [`Action`] bound to each pressed key on its own task
//! - turns action outcomes into LED/progress writes and desktop notifications
//! - provides the cancellable [`PeriodicTimer`] behind the Pomodoro action
//!
//! Construct an [`Orchestrator`] over the transport halves, build actions
//! with [`build_action`] using [`Orchestrator::messages`], register them,
//! then drive [`Orchestrator::run`].
mod action;
mod deps;
mod error;
mod message;
mod notification;
mod orchestrator;
mod protocol;
mod timer;

pub mod test_support;

pub use action::{
    Action, ActionContext, ActionKind, COMPLETE_TEXT, MacroAction, PomodoroAction, TYPE_PROGRAM,
    TrackAction, TypeAction, build_action, tick_progress,
};
pub use deps::{CommandOutput, CommandRunner, RealCommandRunner, RealTimeTracker, TimeTracker};
pub use error::{ActionError, Error, Result};
pub use message::{ActionMessage, LedState, MessageSender};
pub use notification::{
    LogNotifier, NOTIFIER_PROGRAM, NotificationDispatcher, NotificationSink, TerminalNotifier,
};
pub use orchestrator::{
    EVENT_QUEUE_CAPACITY, MAX_LINE_LENGTH, OUTCOME_QUEUE_CAPACITY, Orchestrator, ShutdownHandle,
};
pub use protocol::{KeyEvent, Transition, encode_progress, encode_status, progress_name};
pub use timer::{PeriodicTimer, STEPS, TickStream, TimerError, TimerHandle};
