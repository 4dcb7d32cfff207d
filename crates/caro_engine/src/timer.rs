//! Single-flight turn timer.
//!
//! `TurnTimer` owns the bookkeeping: which countdown is live and what
//! generation it carries. A `TimerDriver` does the actual scheduling and
//! reports back through `TimerSignal`s that the owner feeds into
//! [`TurnTimer::accept`]. Signals from any generation other than the live
//! one are dropped, so a countdown that was stopped or replaced can never
//! fire.

use derive_more::Display;
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace, warn};

/// Identifies one `start` of a turn timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Default)]
#[display("gen#{_0}")]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

/// What a countdown is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignalKind {
    /// One second elapsed; `seconds_left` remain.
    Tick {
        /// Seconds remaining, always above zero.
        seconds_left: u32,
    },
    /// The countdown reached zero.
    Expired,
}

/// Report from a timer driver, stamped with the countdown it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new)]
pub struct TimerSignal {
    /// Countdown that produced the signal.
    pub generation: Generation,
    /// What happened.
    pub kind: TimerSignalKind,
}

/// Scheduling facility behind a `TurnTimer`.
///
/// Implementations deliver `TimerSignal`s back to the session's queue;
/// they never touch session state directly.
pub trait TimerDriver: Send + Debug {
    /// Schedules a countdown of `seconds` for `generation`, replacing any
    /// countdown previously armed.
    fn arm(&mut self, generation: Generation, seconds: u32);

    /// Cancels the armed countdown, if any.
    fn disarm(&mut self);
}

/// Countdown bookkeeping for one session.
#[derive(Debug)]
pub struct TurnTimer {
    driver: Box<dyn TimerDriver>,
    issued: Generation,
    live: Option<Generation>,
    seconds_left: u32,
}

impl TurnTimer {
    /// Creates a stopped timer backed by `driver`.
    pub fn new(driver: Box<dyn TimerDriver>) -> Self {
        Self {
            driver,
            issued: Generation::default(),
            live: None,
            seconds_left: 0,
        }
    }

    /// Starts a new countdown, cancelling any live one first.
    ///
    /// Returns the generation of the new countdown.
    #[instrument(skip(self), fields(live = ?self.live))]
    pub fn start(&mut self, seconds: u32) -> Generation {
        if let Some(previous) = self.live {
            warn!(%previous, "timer misuse: start while a countdown is live, superseding it");
            self.driver.disarm();
        }
        self.issued = self.issued.next();
        self.live = Some(self.issued);
        self.seconds_left = seconds;
        self.driver.arm(self.issued, seconds);
        debug!(generation = %self.issued, seconds, "Countdown started");
        self.issued
    }

    /// Cancels the live countdown. Safe to call when nothing is running.
    #[instrument(skip(self), fields(live = ?self.live))]
    pub fn stop(&mut self) {
        if let Some(generation) = self.live.take() {
            self.driver.disarm();
            debug!(%generation, seconds_left = self.seconds_left, "Countdown stopped");
        }
    }

    /// Returns true while a countdown is live.
    pub fn is_running(&self) -> bool {
        self.live.is_some()
    }

    /// Generation of the live countdown.
    pub fn live_generation(&self) -> Option<Generation> {
        self.live
    }

    /// Seconds remaining on the live countdown as last reported.
    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    /// Filters a driver signal against the live countdown.
    ///
    /// Returns the signal kind when it belongs to the live countdown and
    /// `None` when it is stale. An accepted expiry ends the countdown, so
    /// at most one expiry per generation is ever accepted.
    #[instrument(skip(self), fields(live = ?self.live))]
    pub fn accept(&mut self, signal: TimerSignal) -> Option<TimerSignalKind> {
        if self.live != Some(signal.generation) {
            debug!(generation = %signal.generation, "Discarding stale timer signal");
            return None;
        }
        match signal.kind {
            TimerSignalKind::Tick { seconds_left } => {
                trace!(seconds_left, "Tick");
                self.seconds_left = seconds_left;
            }
            TimerSignalKind::Expired => {
                self.seconds_left = 0;
                self.live = None;
            }
        }
        Some(signal.kind)
    }
}

// ─────────────────────────────────────────────────────────────
//  Tokio driver
// ─────────────────────────────────────────────────────────────

/// Timer driver that counts on the tokio clock and posts signals into an
/// unbounded queue.
#[derive(Debug)]
pub struct TokioTimerDriver<T> {
    tx: mpsc::UnboundedSender<T>,
    task: Option<JoinHandle<()>>,
}

impl<T> TokioTimerDriver<T>
where
    T: From<TimerSignal> + Send + 'static,
{
    /// Creates a driver posting into `tx`.
    pub fn new(tx: mpsc::UnboundedSender<T>) -> Self {
        Self { tx, task: None }
    }
}

impl<T> TimerDriver for TokioTimerDriver<T>
where
    T: From<TimerSignal> + Send + Debug + 'static,
{
    fn arm(&mut self, generation: Generation, seconds: u32) {
        self.disarm();
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut left = seconds;
            while left > 0 {
                tokio::time::sleep(Duration::from_secs(1)).await;
                left -= 1;
                let kind = if left == 0 {
                    TimerSignalKind::Expired
                } else {
                    TimerSignalKind::Tick { seconds_left: left }
                };
                if tx.send(TimerSignal::new(generation, kind).into()).is_err() {
                    return;
                }
            }
            if seconds == 0 {
                let _ = tx.send(TimerSignal::new(generation, TimerSignalKind::Expired).into());
            }
        }));
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> Drop for TokioTimerDriver<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
