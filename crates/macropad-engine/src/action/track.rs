//! Track action: toggles a record on the remote time-tracking service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use time_track::TimeTrack;
use tokio::{sync::Mutex, time::Instant};
use tracing::{info, warn};

use super::{Action, ActionKind};
use crate::{
    deps::TimeTracker,
    error::ActionError,
    message::{ActionMessage, LedState, MessageSender},
};

/// Status of a record while it is being tracked.
const STATUS_RUNNING: &str = "running";
/// Status of a closed record.
const STATUS_STOPPED: &str = "stopped";

/// A record opened on the service and not yet closed.
#[derive(Debug)]
struct OpenRecord {
    /// Server id.
    id: u64,
    /// Local start time, used to compute the duration.
    since: Instant,
}

/// Toggles time tracking on one project.
pub struct TrackAction {
    /// Key this action is bound to.
    name: String,
    /// Project id on the service.
    project_id: u64,
    /// Human-readable project label.
    label: String,
    /// Tracking profile, if any.
    profile: Option<String>,
    /// Remote service.
    tracker: Arc<dyn TimeTracker>,
    /// Outcome queue.
    messages: MessageSender,
    /// Open record, held across network calls so presses serialize.
    open: Mutex<Option<OpenRecord>>,
}

impl TrackAction {
    /// Create a Track action for key `name`. An empty label falls back to the key name.
    pub fn new(
        name: impl Into<String>,
        project_id: u64,
        label: impl Into<String>,
        profile: impl Into<String>,
        tracker: Arc<dyn TimeTracker>,
        messages: MessageSender,
    ) -> Self {
        let name = name.into();
        let mut label = label.into();
        if label.is_empty() {
            label = name.clone();
        }
        let profile = Some(profile.into()).filter(|p| !p.is_empty());
        Self {
            name,
            project_id,
            label,
            profile,
            tracker,
            messages,
            open: Mutex::new(None),
        }
    }

    /// True while a record is open.
    pub async fn is_tracking(&self) -> bool {
        self.open.lock().await.is_some()
    }

    /// Open a new record.
    async fn start(&self, slot: &mut Option<OpenRecord>) -> Result<(), ActionError> {
        let record = TimeTrack {
            project_id: self.project_id,
            profile: self.profile.clone(),
            started: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            status: Some(STATUS_RUNNING.to_string()),
            ..TimeTrack::default()
        };
        let id = self.tracker.create(&record).await?;
        *slot = Some(OpenRecord {
            id,
            since: Instant::now(),
        });
        info!(key = %self.name, project = self.project_id, id, "track_started");
        self.messages
            .send(
                ActionMessage::new(&self.name)
                    .with_notify(format!("Started tracking {}", self.label))
                    .with_state(LedState::On),
            )
            .await;
        Ok(())
    }

    /// Close the open record. On failure the record stays open.
    async fn finish(&self, slot: &mut Option<OpenRecord>) -> Result<(), ActionError> {
        let Some(open) = slot.as_ref() else {
            return Ok(());
        };
        let seconds = open.since.elapsed().as_secs();
        let record = TimeTrack {
            id: open.id,
            project_id: self.project_id,
            duration: seconds,
            status: Some(STATUS_STOPPED.to_string()),
            ..TimeTrack::default()
        };
        self.tracker.update(&record).await?;
        info!(key = %self.name, id = open.id, seconds, "track_stopped");
        *slot = None;
        self.messages
            .send(
                ActionMessage::new(&self.name)
                    .with_notify(format!(
                        "Stopped tracking {} ({})",
                        self.label,
                        format_elapsed(seconds)
                    ))
                    .with_state(LedState::Off),
            )
            .await;
        Ok(())
    }
}

#[async_trait]
impl Action for TrackAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Track
    }

    async fn execute(&self) -> Result<(), ActionError> {
        let mut open = self.open.lock().await;
        if open.is_some() {
            self.finish(&mut open).await
        } else {
            self.start(&mut open).await
        }
    }

    async fn stop(&self) {
        let mut open = self.open.lock().await;
        if let Err(e) = self.finish(&mut open).await {
            warn!(key = %self.name, error = %e, "track_close_on_stop_failed");
        }
    }
}

/// Render a duration in seconds as `1h05m` or `4m07s`.
fn format_elapsed(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if h > 0 {
        format!("{h}h{m:02}m")
    } else {
        format!("{m}m{s:02}s")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc::Receiver;

    use super::*;
    use crate::test_support::MockTimeTracker;

    fn action(tracker: Arc<MockTimeTracker>) -> (TrackAction, Receiver<ActionMessage>) {
        let (tx, rx) = MessageSender::channel(8);
        (
            TrackAction::new("K3", 42, "Support", "dev", tracker, tx),
            rx,
        )
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(0), "0m00s");
        assert_eq!(format_elapsed(247), "4m07s");
        assert_eq!(format_elapsed(3900), "1h05m");
    }

    #[tokio::test(start_paused = true)]
    async fn toggles_open_then_closed() {
        let tracker = Arc::new(MockTimeTracker::new());
        let (a, mut rx) = action(tracker.clone());

        a.execute().await.expect("start");
        let started = rx.recv().await.expect("start message");
        assert_eq!(started.state, LedState::On);
        assert_eq!(started.notify, "Started tracking Support");
        assert!(a.is_tracking().await);

        tokio::time::advance(Duration::from_secs(90)).await;
        a.execute().await.expect("stop");
        let stopped = rx.recv().await.expect("stop message");
        assert_eq!(stopped.state, LedState::Off);
        assert_eq!(stopped.notify, "Stopped tracking Support (1m30s)");
        assert!(!a.is_tracking().await);

        let created = tracker.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].project_id, 42);
        assert_eq!(created[0].profile.as_deref(), Some("dev"));
        assert_eq!(created[0].status.as_deref(), Some(STATUS_RUNNING));
        let updated = tracker.updated();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, 1);
        assert_eq!(updated[0].duration, 90);
        assert_eq!(updated[0].status.as_deref(), Some(STATUS_STOPPED));
    }

    #[tokio::test]
    async fn failed_close_keeps_record_open() {
        let tracker = Arc::new(MockTimeTracker::new());
        let (a, mut rx) = action(tracker.clone());
        a.execute().await.expect("start");
        rx.recv().await.expect("start message");

        tracker.fail_updates(true);
        assert!(matches!(
            a.execute().await,
            Err(ActionError::RemoteService(_))
        ));
        assert!(a.is_tracking().await);
        assert!(rx.try_recv().is_err());

        tracker.fail_updates(false);
        a.execute().await.expect("retry close");
        assert_eq!(rx.recv().await.expect("stop").state, LedState::Off);
    }

    #[tokio::test]
    async fn failed_open_sends_nothing() {
        let tracker = Arc::new(MockTimeTracker::new());
        tracker.fail_creates(true);
        let (a, mut rx) = action(tracker);
        assert!(a.execute().await.is_err());
        assert!(!a.is_tracking().await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stop_closes_open_record() {
        let tracker = Arc::new(MockTimeTracker::new());
        let (a, mut rx) = action(tracker.clone());
        a.stop().await;
        assert!(tracker.updated().is_empty());

        a.execute().await.expect("start");
        rx.recv().await.expect("start message");
        a.stop().await;
        assert!(!a.is_tracking().await);
        assert_eq!(tracker.updated().len(), 1);
    }

    #[test]
    fn empty_label_uses_key() {
        let (tx, _rx) = MessageSender::channel(1);
        let a = TrackAction::new("K9", 1, "", "", Arc::new(MockTimeTracker::new()), tx);
        assert_eq!(a.label, "K9");
        assert_eq!(a.profile, None);
    }
}
