use std::sync::Arc;

use tokio::task;
use tracing::{info, warn};

use crate::deps::{CommandRunner, RealCommandRunner, run_checked};

/// Desktop notifier used by [`TerminalNotifier`].
pub const NOTIFIER_PROGRAM: &str = "terminal-notifier";

/// Seconds a notification stays on screen.
const NOTIFY_TIMEOUT_SECS: &str = "2";

/// Receives user-facing notification text. Best-effort and blocking.
pub trait NotificationSink: Send + Sync {
    /// Show `text` to the user.
    fn notify(&self, text: &str);
}

/// Shows notifications through `terminal-notifier`.
pub struct TerminalNotifier {
    /// Process runner.
    runner: Arc<dyn CommandRunner>,
}

impl TerminalNotifier {
    /// Create a notifier using `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new(Arc::new(RealCommandRunner))
    }
}

impl NotificationSink for TerminalNotifier {
    fn notify(&self, text: &str) {
        let args = [
            "-message".to_string(),
            text.to_string(),
            "-timeout".to_string(),
            NOTIFY_TIMEOUT_SECS.to_string(),
        ];
        if let Err(e) = run_checked(self.runner.as_ref(), NOTIFIER_PROGRAM, &args) {
            warn!(error = %e, "notification_failed");
        }
    }
}

/// Writes notifications to the log only, for hosts without a desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, text: &str) {
        info!(text, "notification_logged");
    }
}

/// Hands notification text to a sink off the dispatch task.
#[derive(Clone)]
pub struct NotificationDispatcher {
    /// Destination sink.
    sink: Arc<dyn NotificationSink>,
}

impl NotificationDispatcher {
    /// Create a dispatcher that delivers to `sink`.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Deliver `text` on the blocking pool. Empty text is ignored.
    pub fn dispatch(&self, action: &str, text: String) {
        if text.is_empty() {
            return;
        }
        info!(action, text = %text, "notification_display");
        let sink = self.sink.clone();
        task::spawn_blocking(move || sink.notify(&text));
    }
}
