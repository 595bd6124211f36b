//! Outcome messages sent from actions back to the dispatch loop.

use tokio::sync::mpsc;
use tracing::debug;

/// Requested LED state for the key that produced a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LedState {
    /// Turn the LED off.
    Off,
    /// Turn the LED on.
    On,
    /// Leave the LED as it is.
    #[default]
    Unchanged,
}

/// An asynchronous outcome reported by an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionMessage {
    /// Name of the reporting action (its key identifier).
    pub action_name: String,
    /// User-facing notification text; empty for none.
    pub notify: String,
    /// LED state to set on the device.
    pub state: LedState,
    /// Progress on the device's display scale (0..=255).
    pub progress: u8,
}

impl ActionMessage {
    /// A message from `action_name` that changes nothing yet.
    pub fn new(action_name: impl Into<String>) -> Self {
        Self {
            action_name: action_name.into(),
            ..Self::default()
        }
    }

    /// Set the notification text.
    pub fn with_notify(mut self, text: impl Into<String>) -> Self {
        self.notify = text.into();
        self
    }

    /// Set the LED state.
    pub fn with_state(mut self, state: LedState) -> Self {
        self.state = state;
        self
    }

    /// Set the progress value.
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress;
        self
    }
}

/// Sending half of the outcome queue, handed to every action.
#[derive(Debug, Clone)]
pub struct MessageSender {
    /// Outcome queue.
    tx: mpsc::Sender<ActionMessage>,
}

impl MessageSender {
    /// Wrap the sending half of an outcome queue.
    pub fn new(tx: mpsc::Sender<ActionMessage>) -> Self {
        Self { tx }
    }

    /// Create a standalone queue of `capacity`, for driving actions without an orchestrator.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ActionMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Wait for room in the queue and hold it.
    ///
    /// Lets a caller wait for capacity before taking a lock and then queue a
    /// message under that lock without awaiting. Returns `None` once the loop
    /// has shut down.
    pub async fn reserve(&self) -> Option<mpsc::Permit<'_, ActionMessage>> {
        self.tx.reserve().await.ok()
    }

    /// Queue `msg`, waiting for room. Returns false once the loop has shut down.
    pub async fn send(&self, msg: ActionMessage) -> bool {
        match self.tx.send(msg).await {
            Ok(()) => true,
            Err(e) => {
                debug!(action = %e.0.action_name, "outcome_dropped_after_shutdown");
                false
            }
        }
    }
}
