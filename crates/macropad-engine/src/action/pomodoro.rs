//! Pomodoro action: a cancellable countdown shown on the key's progress bar.
//!
//! Each press toggles: an idle key starts a fresh [`PeriodicTimer`] and a
//! relay task forwarding every tick to the outcome queue; a running key
//! cancels its timer. Every message of a run is queued under the run state
//! lock, so once a cancel returns no further tick of that run reaches the
//! queue. Queue room is reserved before the lock is taken; nothing waits on
//! the outcome queue while holding it.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::Permit};
use tracing::{debug, info};

use super::{Action, ActionKind};
use crate::{
    error::ActionError,
    message::{ActionMessage, LedState, MessageSender},
    timer::{PeriodicTimer, STEPS, TickStream, TimerHandle},
};

/// Notification sent when a run completes on its own.
pub const COMPLETE_TEXT: &str = "Pomodoro complete";

/// Full-scale value of the device's progress bar.
const PROGRESS_MAX: u16 = 255;

/// Map a timer tick (0..=100) onto the progress bar (1..=255).
///
/// Tick 0 maps to 1 so the bar lights up as soon as a run starts.
pub fn tick_progress(tick: u8) -> u8 {
    if tick == 0 {
        return 1;
    }
    let scaled = u16::from(tick.min(STEPS)) * PROGRESS_MAX / u16::from(STEPS);
    u8::try_from(scaled).unwrap_or(u8::MAX)
}

/// The timer currently driven by a Pomodoro key.
struct ActiveRun {
    /// Identifies the run to its relay task.
    id: u64,
    /// Control side of the timer.
    timer: TimerHandle,
}

/// Mutable state of a Pomodoro key.
#[derive(Default)]
struct Runs {
    /// Id handed to the next run.
    next_id: u64,
    /// Live run, if any.
    active: Option<ActiveRun>,
}

impl Runs {
    /// True if run `id` is still the live one.
    fn is_current(&self, id: u64) -> bool {
        self.active.as_ref().is_some_and(|r| r.id == id)
    }
}

/// Toggles a countdown of fixed duration.
pub struct PomodoroAction {
    /// Key this action is bound to.
    name: String,
    /// Length of one run.
    duration: Duration,
    /// Outcome queue.
    messages: MessageSender,
    /// Run state, shared with relay tasks.
    runs: Arc<Mutex<Runs>>,
}

impl PomodoroAction {
    /// Create a Pomodoro action for key `name` lasting `duration`.
    pub fn new(name: impl Into<String>, duration: Duration, messages: MessageSender) -> Self {
        Self {
            name: name.into(),
            duration,
            messages,
            runs: Arc::new(Mutex::new(Runs::default())),
        }
    }

    /// True while a run is ticking.
    pub async fn is_running(&self) -> bool {
        self.runs
            .lock()
            .await
            .active
            .as_ref()
            .is_some_and(|r| r.timer.is_running())
    }

    /// Message turning the key off and clearing its progress bar.
    fn off_message(&self) -> ActionMessage {
        ActionMessage::new(&self.name)
            .with_state(LedState::Off)
            .with_progress(0)
    }

    /// Cancel the live run, if any, queueing the Off message on `permit`.
    /// Returns true if a run was cancelled.
    fn cancel_active(&self, runs: &mut Runs, permit: Option<Permit<'_, ActionMessage>>) -> bool {
        let Some(run) = runs.active.take() else {
            return false;
        };
        if run.timer.cancel().is_err() {
            // Completed but not yet reaped by its relay
            return false;
        }
        info!(key = %self.name, run = run.id, "pomodoro_cancelled");
        if let Some(permit) = permit {
            permit.send(self.off_message());
        }
        true
    }
}

#[async_trait]
impl Action for PomodoroAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Pomodoro
    }

    async fn execute(&self) -> Result<(), ActionError> {
        let permit = self.messages.reserve().await;
        let mut runs = self.runs.lock().await;
        if self.cancel_active(&mut runs, permit) {
            return Ok(());
        }
        let id = runs.next_id;
        runs.next_id += 1;
        let (timer, ticks) = PeriodicTimer::new(self.duration).start();
        runs.active = Some(ActiveRun { id, timer });
        info!(key = %self.name, run = id, secs = self.duration.as_secs(), "pomodoro_started");
        tokio::spawn(relay(
            self.name.clone(),
            id,
            ticks,
            self.runs.clone(),
            self.messages.clone(),
        ));
        Ok(())
    }

    async fn stop(&self) {
        let permit = self.messages.reserve().await;
        let mut runs = self.runs.lock().await;
        self.cancel_active(&mut runs, permit);
    }
}

/// Forward the ticks of run `id` until the timer ends or the run is replaced.
async fn relay(
    name: String,
    id: u64,
    mut ticks: TickStream,
    runs: Arc<Mutex<Runs>>,
    messages: MessageSender,
) {
    while let Some(tick) = ticks.next().await {
        let Some(permit) = messages.reserve().await else {
            return;
        };
        let guard = runs.lock().await;
        if !guard.is_current(id) {
            debug!(key = %name, run = id, tick, "pomodoro_tick_after_cancel");
            return;
        }
        let mut msg = ActionMessage::new(&name).with_progress(tick_progress(tick));
        if tick == 0 {
            msg = msg.with_state(LedState::On);
        }
        permit.send(msg);
    }

    let permit = messages.reserve().await;
    let mut guard = runs.lock().await;
    if !guard.is_current(id) {
        return;
    }
    guard.active = None;
    let mut last = ActionMessage::new(&name)
        .with_state(LedState::Off)
        .with_progress(0);
    if ticks.completed() {
        info!(key = %name, run = id, "pomodoro_completed");
        last = last.with_notify(COMPLETE_TEXT);
    }
    if let Some(permit) = permit {
        permit.send(last);
    }
}
