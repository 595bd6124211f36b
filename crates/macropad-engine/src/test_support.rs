//! Test support utilities for macropad-engine unit and integration tests.
//! These helpers are public so the integration suite can share them.
//! They are intended for use by the test suite only.

use std::{
    collections::VecDeque,
    io,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use time_track::TimeTrack;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::mpsc,
    time::{sleep, timeout},
};

use crate::{
    deps::{CommandOutput, CommandRunner, TimeTracker},
    error::ActionError,
    notification::NotificationSink,
};

/// [`CommandRunner`] that records invocations and replays queued outputs.
///
/// With nothing queued every run succeeds with empty output.
#[derive(Default)]
pub struct MockCommandRunner {
    /// Recorded `(program, args)` pairs.
    calls: Mutex<Vec<(String, Vec<String>)>>,
    /// Outputs returned by the next runs, in order.
    responses: Mutex<VecDeque<CommandOutput>>,
}

impl MockCommandRunner {
    /// Create an empty runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output of the next run.
    pub fn respond(&self, output: CommandOutput) {
        self.responses.lock().push_back(output);
    }

    /// Queue a successful run printing `text`.
    pub fn respond_ok(&self, text: &str) {
        self.respond(CommandOutput {
            combined: text.to_string(),
            success: true,
            status: "exit status: 0".into(),
        });
    }

    /// All invocations so far.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().clone()
    }
}

impl CommandRunner for MockCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        self.calls.lock().push((program.to_string(), args.to_vec()));
        Ok(self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| CommandOutput {
                success: true,
                status: "exit status: 0".into(),
                ..CommandOutput::default()
            }))
    }
}

/// [`TimeTracker`] keeping records in memory. Ids start at 1.
#[derive(Default)]
pub struct MockTimeTracker {
    /// Last id handed out.
    last_id: AtomicU64,
    /// Records passed to `create`.
    created: Mutex<Vec<TimeTrack>>,
    /// Records passed to `update`.
    updated: Mutex<Vec<TimeTrack>>,
    /// Fail every `create`.
    fail_creates: AtomicBool,
    /// Fail every `update`.
    fail_updates: AtomicBool,
}

impl MockTimeTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create` fail while `fail` is set.
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Make `update` fail while `fail` is set.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Successfully created records.
    pub fn created(&self) -> Vec<TimeTrack> {
        self.created.lock().clone()
    }

    /// Successfully updated records.
    pub fn updated(&self) -> Vec<TimeTrack> {
        self.updated.lock().clone()
    }

    /// Error returned while failing.
    fn unavailable(method: &str) -> ActionError {
        ActionError::RemoteService(time_track::Error::Api {
            method: method.to_string(),
            url: "mock://time_tracks".into(),
            status: 503,
            message: "unavailable".into(),
        })
    }
}

#[async_trait]
impl TimeTracker for MockTimeTracker {
    async fn create(&self, record: &TimeTrack) -> Result<u64, ActionError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(Self::unavailable("POST"));
        }
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.created.lock().push(record.clone());
        Ok(id)
    }

    async fn update(&self, record: &TimeTrack) -> Result<(), ActionError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Self::unavailable("PUT"));
        }
        self.updated.lock().push(record.clone());
        Ok(())
    }
}

/// [`NotificationSink`] that records every text it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    /// Received texts, in order.
    texts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts received so far.
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }

    /// Wait until at least `n` texts arrived, up to one second.
    pub async fn wait_for(&self, n: usize) -> bool {
        timeout(Duration::from_secs(1), async {
            while self.texts.lock().len() < n {
                sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .is_ok()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, text: &str) {
        self.texts.lock().push(text.to_string());
    }
}

/// Receive messages until `pred` matches one, up to `timeout_ms`.
pub async fn recv_until<T, F>(rx: &mut mpsc::Receiver<T>, timeout_ms: u64, mut pred: F) -> bool
where
    F: FnMut(&T) -> bool,
{
    timeout(Duration::from_millis(timeout_ms), async {
        while let Some(msg) = rx.recv().await {
            if pred(&msg) {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false)
}

/// Read `n` lines from `reader`, without terminators, up to `timeout_ms`.
///
/// Returns the lines read before the deadline or end-of-stream.
pub async fn read_lines<R>(reader: &mut BufReader<R>, n: usize, timeout_ms: u64) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = Vec::with_capacity(n);
    let _ = timeout(Duration::from_millis(timeout_ms), async {
        let mut buf = String::new();
        while lines.len() < n {
            buf.clear();
            match reader.read_line(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => lines.push(buf.trim_end_matches(['\n', '\r']).to_string()),
            }
        }
    })
    .await;
    lines
}
