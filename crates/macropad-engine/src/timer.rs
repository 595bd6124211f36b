//! Cancellable periodic timer counting from 0 to 100.
//!
//! A [`PeriodicTimer`] splits its total duration into 100 equal steps and
//! emits the step counter once per step, starting immediately with 0 and
//! finishing with 100 after the full duration. The timer is single-use:
//! [`PeriodicTimer::start`] consumes it and returns a [`TimerHandle`] for
//! control and a [`TickStream`] for the counter values.
//!
//! The tick channel's sender lives inside the ticking task and is dropped
//! when that task ends, whether by completion or cancellation, so the stream
//! closes exactly once. [`TimerHandle::cancel`] consumes the handle, so a
//! timer cannot be cancelled twice.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use thiserror::Error;
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Final counter value; the timer completes after emitting it.
pub const STEPS: u8 = 100;

/// Shortest step the timer will use, so tiny durations still tick.
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Capacity of the tick channel.
const TICK_BUFFER: usize = 8;

/// Misuse of a timer handle.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TimerError {
    /// The timer already completed.
    #[error("Timer is not running")]
    NotRunning,
}

/// An idle timer, ready to start.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTimer {
    /// Time between counter values.
    tick: Duration,
}

impl PeriodicTimer {
    /// Create a timer that runs for `total`.
    pub fn new(total: Duration) -> Self {
        Self {
            tick: (total / u32::from(STEPS)).max(MIN_TICK),
        }
    }

    /// Time between two counter values.
    pub fn tick_interval(&self) -> Duration {
        self.tick
    }

    /// Start ticking. Must be called within a tokio runtime.
    pub fn start(self) -> (TimerHandle, TickStream) {
        let token = CancellationToken::new();
        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel(TICK_BUFFER);

        let cancel = token.clone();
        let running_task = running.clone();
        let tick = self.tick;
        tokio::spawn(async move {
            trace!(tick_ms = tick.as_millis(), "timer_start");
            let mut ticker = time::interval(tick);
            // Counter values must not be skipped, only delayed
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut counter: u8 = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        trace!(counter, "timer_cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        let sent = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => false,
                            r = tx.send(counter) => r.is_ok(),
                        };
                        if !sent {
                            trace!(counter, "timer_stopped_while_sending");
                            break;
                        }
                        if counter == STEPS {
                            trace!("timer_completed");
                            break;
                        }
                        counter += 1;
                    }
                }
            }
            running_task.store(false, Ordering::SeqCst);
            // `tx` drops here: the only place the tick stream closes.
        });

        (
            TimerHandle {
                token: token.clone(),
                running,
            },
            TickStream {
                rx,
                token,
                completed: false,
            },
        )
    }
}

/// Control side of a started timer. Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct TimerHandle {
    /// Cancellation signal shared with the ticking task and the stream.
    token: CancellationToken,
    /// Cleared by the ticking task when it exits.
    running: Arc<AtomicBool>,
}

impl TimerHandle {
    /// True between start and completion or cancellation.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.token.is_cancelled()
    }

    /// Stop the timer. Fails with [`TimerError::NotRunning`] if it already completed.
    pub fn cancel(self) -> Result<(), TimerError> {
        if !self.is_running() {
            return Err(TimerError::NotRunning);
        }
        self.token.cancel();
        Ok(())
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Receive side of a started timer.
#[derive(Debug)]
pub struct TickStream {
    /// Counter values from the ticking task.
    rx: mpsc::Receiver<u8>,
    /// Cancellation signal; once set no further values are yielded.
    token: CancellationToken,
    /// Set once the final value has been yielded.
    completed: bool,
}

impl TickStream {
    /// Next counter value, or `None` once the timer completed or was cancelled.
    ///
    /// Values still buffered when cancellation is requested are discarded.
    pub async fn next(&mut self) -> Option<u8> {
        if self.token.is_cancelled() {
            return None;
        }
        let value = tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            v = self.rx.recv() => v,
        };
        if value == Some(STEPS) {
            self.completed = true;
        }
        value
    }

    /// True once the final counter value has been yielded.
    pub fn completed(&self) -> bool {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_is_one_hundredth_of_total() {
        let t = PeriodicTimer::new(Duration::from_secs(100));
        assert_eq!(t.tick_interval(), Duration::from_secs(1));
        let t = PeriodicTimer::new(Duration::from_secs(25 * 60));
        assert_eq!(t.tick_interval(), Duration::from_secs(15));
    }

    #[test]
    fn tiny_durations_clamp_to_min_tick() {
        assert_eq!(PeriodicTimer::new(Duration::ZERO).tick_interval(), MIN_TICK);
    }

    #[tokio::test(start_paused = true)]
    async fn emits_zero_through_hundred_then_closes() {
        let (handle, mut ticks) = PeriodicTimer::new(Duration::from_secs(10)).start();
        assert!(handle.is_running());
        let mut seen = Vec::new();
        while let Some(v) = ticks.next().await {
            seen.push(v);
        }
        assert_eq!(seen, (0..=STEPS).collect::<Vec<_>>());
        assert!(ticks.completed());
        time::sleep(Duration::from_millis(1)).await;
        assert!(!handle.is_running());
        assert_eq!(handle.cancel(), Err(TimerError::NotRunning));
    }

    #[tokio::test(start_paused = true)]
    async fn full_run_takes_total_duration() {
        let start = time::Instant::now();
        let (_handle, mut ticks) = PeriodicTimer::new(Duration::from_secs(10)).start();
        while ticks.next().await.is_some() {}
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks() {
        let (handle, mut ticks) = PeriodicTimer::new(Duration::from_secs(10)).start();
        assert_eq!(ticks.next().await, Some(0));
        assert_eq!(ticks.next().await, Some(1));
        assert_eq!(handle.cancel(), Ok(()));
        assert_eq!(ticks.next().await, None);
        assert!(!ticks.completed());
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(ticks.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let (handle, mut ticks) = PeriodicTimer::new(Duration::from_secs(10)).start();
        assert_eq!(ticks.next().await, Some(0));
        drop(handle);
        assert_eq!(ticks.next().await, None);
    }
}
