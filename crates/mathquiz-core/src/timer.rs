//! Countdown timer abstraction.
//!
//! A countdown is started per round and reports remaining time on a fixed
//! tick, then expires exactly once. Each instance carries a [`TimerId`] so the
//! engine can discard events from a countdown it has already cancelled.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::session::QuizEvent;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Generation stamp of one countdown instance. Unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

impl TimerId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Something a countdown reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    Tick { remaining_ms: u64 },
    Expired,
}

/// A countdown signal stamped with the countdown that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub timer: TimerId,
    pub signal: TimerSignal,
}

impl TimerEvent {
    pub fn tick(timer: TimerId, remaining_ms: u64) -> Self {
        Self {
            timer,
            signal: TimerSignal::Tick { remaining_ms },
        }
    }

    pub fn expired(timer: TimerId) -> Self {
        Self {
            timer,
            signal: TimerSignal::Expired,
        }
    }
}

/// Handle to a running countdown. Cancellation is idempotent and final.
#[derive(Debug, Clone)]
pub struct CountdownHandle {
    id: TimerId,
    cancelled: Arc<AtomicBool>,
    task: Option<AbortHandle>,
}

impl CountdownHandle {
    pub fn new(id: TimerId) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    fn with_task(mut self, task: AbortHandle) -> Self {
        self.task = Some(task);
        self
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Stop ticking and expiry. Safe to call any number of times.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            if let Some(task) = &self.task {
                task.abort();
            }
            tracing::trace!("{} cancelled", self.id);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Starts countdowns on behalf of the round engine.
pub trait CountdownScheduler: Send {
    /// Start a countdown of `duration`, reporting every `tick`.
    fn start(&mut self, id: TimerId, duration: Duration, tick: Duration) -> CountdownHandle;
}

/// Countdown backed by a tokio task that posts [`TimerEvent`]s onto the
/// host's event queue.
///
/// Must be used from within a tokio runtime.
pub struct TokioCountdown {
    events: UnboundedSender<QuizEvent>,
}

impl TokioCountdown {
    pub fn new(events: UnboundedSender<QuizEvent>) -> Self {
        Self { events }
    }
}

impl CountdownScheduler for TokioCountdown {
    fn start(&mut self, id: TimerId, duration: Duration, tick: Duration) -> CountdownHandle {
        let handle = CountdownHandle::new(id);
        let cancelled = Arc::clone(&handle.cancelled);
        let events = self.events.clone();
        let tick = tick.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let start = Instant::now();
            let deadline = start + duration;
            let mut next_tick = start + tick;

            loop {
                tokio::time::sleep_until(next_tick.min(deadline)).await;
                if cancelled.load(Ordering::SeqCst) {
                    return;
                }

                let now = Instant::now();
                if now >= deadline {
                    let _ = events.send(TimerEvent::expired(id).into());
                    return;
                }

                let remaining_ms = deadline.duration_since(now).as_millis() as u64;
                if events.send(TimerEvent::tick(id, remaining_ms).into()).is_err() {
                    // Host went away.
                    return;
                }
                // Skip ticks that were missed while the task was delayed.
                while next_tick <= now {
                    next_tick += tick;
                }
            }
        });

        tracing::trace!("{id} started: {duration:?} every {tick:?}");
        handle.with_task(task.abort_handle())
    }
}
