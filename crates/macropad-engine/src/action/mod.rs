//! Actions bound to keypad keys.
//!
//! Every key is bound to one [`Action`]. The four variants share a single
//! contract: [`Action::execute`] runs once per key press on its own task and
//! [`Action::stop`] releases whatever the action holds open. Outcomes travel
//! back to the dispatch loop as [`ActionMessage`](crate::ActionMessage)s.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use config::ActionDescriptor;
use tracing::warn;

use crate::{deps::CommandRunner, deps::TimeTracker, error::ActionError, message::MessageSender};

mod pomodoro;
mod shell;
mod track;

pub use pomodoro::{COMPLETE_TEXT, PomodoroAction, tick_progress};
pub use shell::{MacroAction, TYPE_PROGRAM, TypeAction};
pub use track::TrackAction;

/// The closed set of action variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Inject keystrokes through `cliclick`.
    Type,
    /// Run an arbitrary command.
    Macro,
    /// Toggle a remote time-tracking record.
    Track,
    /// Toggle a periodic countdown timer.
    Pomodoro,
}

impl ActionKind {
    /// Parse a descriptor kind name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Type, Self::Macro, Self::Track, Self::Pomodoro]
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }

    /// Canonical name, as written in configuration.
    pub fn name(self) -> &'static str {
        match self {
            Self::Type => "Type",
            Self::Macro => "Macro",
            Self::Track => "Track",
            Self::Pomodoro => "Pomodoro",
        }
    }

    /// Whether messages from this kind also drive the key's progress bar.
    pub fn reports_progress(self) -> bool {
        matches!(self, Self::Type | Self::Pomodoro)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A unit of work bound to one key.
#[async_trait]
pub trait Action: Send + Sync {
    /// Variant of this action.
    fn kind(&self) -> ActionKind;

    /// Run the action once. Called on a dedicated task for every press.
    async fn execute(&self) -> Result<(), ActionError>;

    /// Release anything the action holds open. Best-effort.
    async fn stop(&self) {}
}

/// Collaborators handed to actions when they are built.
#[derive(Clone)]
pub struct ActionContext {
    /// Outcome queue of the orchestrator.
    pub messages: MessageSender,
    /// Process runner for Type and Macro.
    pub runner: Arc<dyn CommandRunner>,
    /// Time-tracking service for Track; `None` when not configured.
    pub tracker: Option<Arc<dyn TimeTracker>>,
}

/// Build the action described by `desc` for key `key`.
///
/// Returns `None` (with a warning) for an unknown kind, a Macro without a
/// command, or a Track when no time tracker is available.
pub fn build_action(
    key: &str,
    desc: &ActionDescriptor,
    ctx: &ActionContext,
) -> Option<Arc<dyn Action>> {
    let Some(kind) = ActionKind::from_name(&desc.kind) else {
        warn!(key, kind = %desc.kind, "invalid_action_kind");
        return None;
    };
    let action: Arc<dyn Action> = match kind {
        ActionKind::Type => Arc::new(TypeAction::new(
            key,
            desc.args.clone(),
            ctx.runner.clone(),
        )),
        ActionKind::Macro => {
            let Some(action) = MacroAction::new(
                key,
                desc.args.clone(),
                desc.display_output,
                ctx.runner.clone(),
                ctx.messages.clone(),
            ) else {
                warn!(key, "macro_without_command");
                return None;
            };
            Arc::new(action)
        }
        ActionKind::Track => {
            let Some(tracker) = ctx.tracker.clone() else {
                warn!(key, "track_without_tracker");
                return None;
            };
            Arc::new(TrackAction::new(
                key,
                desc.id,
                desc.label.clone(),
                desc.profile.clone(),
                tracker,
                ctx.messages.clone(),
            ))
        }
        ActionKind::Pomodoro => Arc::new(PomodoroAction::new(
            key,
            Duration::from_secs(desc.duration.saturating_mul(60)),
            ctx.messages.clone(),
        )),
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockCommandRunner, MockTimeTracker};

    fn ctx(tracker: bool) -> ActionContext {
        let (messages, _rx) = MessageSender::channel(4);
        ActionContext {
            messages,
            runner: Arc::new(MockCommandRunner::new()),
            tracker: tracker.then(|| Arc::new(MockTimeTracker::new()) as Arc<dyn TimeTracker>),
        }
    }

    fn desc(kind: &str) -> ActionDescriptor {
        ActionDescriptor {
            kind: kind.into(),
            ..ActionDescriptor::default()
        }
    }

    #[test]
    fn kind_names_parse_case_insensitively() {
        assert_eq!(ActionKind::from_name("Type"), Some(ActionKind::Type));
        assert_eq!(ActionKind::from_name("pomodoro"), Some(ActionKind::Pomodoro));
        assert_eq!(ActionKind::from_name("TRACK"), Some(ActionKind::Track));
        assert_eq!(ActionKind::from_name("Sleep"), None);
    }

    #[test]
    fn only_type_and_pomodoro_report_progress() {
        assert!(ActionKind::Type.reports_progress());
        assert!(ActionKind::Pomodoro.reports_progress());
        assert!(!ActionKind::Macro.reports_progress());
        assert!(!ActionKind::Track.reports_progress());
    }

    #[test]
    fn unknown_kind_builds_nothing() {
        assert!(build_action("K1", &desc("Sleep"), &ctx(true)).is_none());
    }

    #[test]
    fn macro_needs_a_command() {
        assert!(build_action("K1", &desc("Macro"), &ctx(true)).is_none());
        let mut d = desc("Macro");
        d.args = vec!["open".into()];
        let a = build_action("K1", &d, &ctx(true)).expect("macro");
        assert_eq!(a.kind(), ActionKind::Macro);
    }

    #[test]
    fn track_needs_a_tracker() {
        assert!(build_action("K3", &desc("Track"), &ctx(false)).is_none());
        let a = build_action("K3", &desc("Track"), &ctx(true)).expect("track");
        assert_eq!(a.kind(), ActionKind::Track);
    }

    #[tokio::test]
    async fn builds_each_kind() {
        let c = ctx(true);
        for (name, kind) in [("Type", ActionKind::Type), ("Pomodoro", ActionKind::Pomodoro)] {
            let mut d = desc(name);
            d.duration = 1;
            let a = build_action("K1", &d, &c).expect("built");
            assert_eq!(a.kind(), kind);
        }
    }
}
