//! Dispatch loop between the keypad transport and the bound actions.
//!
//! The orchestrator owns three moving parts:
//! - a decoder task turning the inbound byte stream into lines on a bounded
//!   event queue,
//! - the dispatch loop ([`Orchestrator::run`]) which starts actions for key
//!   presses and turns their outcome messages into device writes and
//!   notifications,
//! - the key registry, which is only mutable while the loop is not running.

use std::{collections::HashMap, sync::Arc};

use futures::StreamExt;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};
use tokio_util::{
    codec::{FramedRead, LinesCodec, LinesCodecError},
    sync::CancellationToken,
};
use tracing::{debug, info, trace, warn};

use crate::{
    action::Action,
    error::{Error, Result},
    message::{ActionMessage, MessageSender},
    notification::{NotificationDispatcher, NotificationSink},
    protocol::{KeyEvent, Transition, encode_progress, encode_status},
};

/// Capacity of the inbound event queue. The decoder waits when it is full.
pub const EVENT_QUEUE_CAPACITY: usize = 10;

/// Capacity of the outcome queue shared by all actions.
pub const OUTCOME_QUEUE_CAPACITY: usize = 10;

/// Longest inbound line accepted; longer lines are discarded.
pub const MAX_LINE_LENGTH: usize = 256;

/// Requests termination of a running [`Orchestrator`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    /// Shared with the dispatch loop and the decoder task.
    token: CancellationToken,
}

impl ShutdownHandle {
    /// Ask the dispatch loop and the decoder to stop.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// True once shutdown was requested.
    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Boxed outbound half of the transport.
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Routes key events to actions and action outcomes back to the device.
pub struct Orchestrator {
    /// Key → action bindings.
    actions: HashMap<String, Arc<dyn Action>>,
    /// Lines from the decoder task.
    events: mpsc::Receiver<String>,
    /// Outcome messages from actions.
    outcomes: mpsc::Receiver<ActionMessage>,
    /// Sending half of the outcome queue, handed out to actions.
    messages: MessageSender,
    /// Outbound half of the transport.
    writer: Writer,
    /// Notification delivery.
    notifier: NotificationDispatcher,
    /// Shutdown signal.
    shutdown: CancellationToken,
}

impl Orchestrator {
    /// Create an orchestrator over a transport and start decoding `reader`.
    ///
    /// Must be called within a tokio runtime.
    pub fn new<R, W>(reader: R, writer: W, notifier: Arc<dyn NotificationSink>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let shutdown = CancellationToken::new();
        let (event_tx, events) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (messages, outcomes) = MessageSender::channel(OUTCOME_QUEUE_CAPACITY);
        tokio::spawn(decode_lines(reader, event_tx, shutdown.clone()));
        Self {
            actions: HashMap::new(),
            events,
            outcomes,
            messages,
            writer: Box::new(writer),
            notifier: NotificationDispatcher::new(notifier),
            shutdown,
        }
    }

    /// Sender for the outcome queue; pass it to actions at construction.
    pub fn messages(&self) -> MessageSender {
        self.messages.clone()
    }

    /// Bind `action` to `key`, replacing any previous binding.
    pub fn register_action(&mut self, key: impl Into<String>, action: Arc<dyn Action>) {
        let key = key.into();
        debug!(key = %key, kind = %action.kind(), "action_registered");
        if self.actions.insert(key.clone(), action).is_some() {
            debug!(key = %key, "action_replaced");
        }
    }

    /// Action bound to `key`, if any.
    pub fn action(&self, key: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(key).cloned()
    }

    /// Number of bound keys.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True if no key is bound.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Handle that can stop [`Orchestrator::run`] from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            token: self.shutdown.clone(),
        }
    }

    /// Run the dispatch loop until shutdown or transport end-of-stream.
    ///
    /// Returns `Ok(())` after [`ShutdownHandle::shutdown`], and
    /// [`Error::TransportClosed`] once the inbound stream ends.
    pub async fn run(&mut self) -> Result<()> {
        info!(keys = self.actions.len(), "orchestrator_run");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    self.events.close();
                    self.outcomes.close();
                    info!("orchestrator_shutdown");
                    return Ok(());
                }
                line = self.events.recv() => match line {
                    Some(line) => self.handle_line(&line),
                    None => {
                        self.outcomes.close();
                        warn!("transport_closed");
                        return Err(Error::TransportClosed);
                    }
                },
                Some(msg) = self.outcomes.recv() => self.handle_message(msg).await,
            }
        }
    }

    /// Call `stop` on every bound action.
    pub async fn stop_actions(&self) {
        for (key, action) in &self.actions {
            trace!(key = %key, "action_stop");
            action.stop().await;
        }
    }

    /// Dispatch one inbound line.
    fn handle_line(&self, line: &str) {
        let Some(event) = KeyEvent::parse(line) else {
            debug!(line, "malformed_line");
            return;
        };
        if event.transition == Transition::Released {
            trace!(key = %event.key, "key_released");
            return;
        }
        let Some(action) = self.actions.get(&event.key).cloned() else {
            debug!(key = %event.key, "unbound_key");
            return;
        };
        let key = event.key;
        info!(key = %key, kind = %action.kind(), "key_pressed");
        tokio::spawn(async move {
            if let Err(e) = action.execute().await {
                warn!(key = %key, error = %e, "action_failed");
            }
        });
    }

    /// Apply one outcome message.
    async fn handle_message(&mut self, msg: ActionMessage) {
        let ActionMessage {
            action_name,
            notify,
            state,
            progress,
        } = msg;
        self.notifier.dispatch(&action_name, notify);
        if let Some(line) = encode_status(&action_name, state) {
            self.write_line(&line).await;
        }
        let reports_progress = self
            .actions
            .get(&action_name)
            .is_some_and(|a| a.kind().reports_progress());
        if reports_progress {
            self.write_line(&encode_progress(&action_name, progress))
                .await;
        }
    }

    /// Write a line to the device; failures are logged only.
    async fn write_line(&mut self, line: &str) {
        trace!(line = line.trim_end(), "device_write");
        let res = async {
            self.writer.write_all(line.as_bytes()).await?;
            self.writer.flush().await
        }
        .await;
        if let Err(e) = res {
            warn!(line = line.trim_end(), error = %e, "device_write_failed");
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Split `reader` into lines and queue them until end-of-stream or shutdown.
async fn decode_lines<R>(reader: R, events: mpsc::Sender<String>, shutdown: CancellationToken)
where
    R: AsyncRead + Send + Unpin,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = lines.next() => next,
        };
        match next {
            Some(Ok(line)) => {
                let line = line.trim_end_matches('\r');
                if line.is_empty() {
                    continue;
                }
                trace!(line, "device_read");
                let queued = tokio::select! {
                    _ = shutdown.cancelled() => false,
                    r = events.send(line.to_string()) => r.is_ok(),
                };
                if !queued {
                    break;
                }
            }
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                warn!(max = MAX_LINE_LENGTH, "line_too_long");
            }
            Some(Err(LinesCodecError::Io(e))) => {
                warn!(error = %e, "transport_read_failed");
                break;
            }
            None => {
                debug!("transport_eof");
                break;
            }
        }
    }
    debug!("decoder_stopped");
}
