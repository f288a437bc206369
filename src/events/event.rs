//! # Runtime events emitted by the supervisor, poll loops and shutdown path.
//!
//! [`EventKind`] classifies events into four groups:
//! - **Mode**: the operating mode decision.
//! - **Task lifecycle**: supervised task start/stop/failure.
//! - **Polling**: per-iteration outcomes and the sleeps scheduled after them.
//! - **Shutdown**: signal observation, grace outcome and teardown steps.
//!
//! Each [`Event`] carries a process-wide monotonic `seq`, so consumers can discard stale
//! updates delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use gitglow::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::PollFailed)
//!     .with_task("pr-events")
//!     .with_reason("rate limited")
//!     .with_attempt(3)
//!     .with_delay(Duration::from_secs(60));
//!
//! assert_eq!(ev.kind, EventKind::PollFailed);
//! assert_eq!(ev.task.as_deref(), Some("pr-events"));
//! assert_eq!(ev.delay_ms, Some(60_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Mode ===
    /// Operating mode decided at startup. `reason` holds the mode name.
    ModeSelected,

    // === Task lifecycle ===
    /// Supervised task spawned. Sets `task`.
    TaskStarting,

    /// Task finished on its own or after observing the shutdown signal. Sets `task`.
    TaskStopped,

    /// Task returned an unrecoverable error. Sets `task`, `reason`.
    TaskFailed,

    // === Polling ===
    /// One fetch + sink iteration succeeded. Sets `task`, `attempt`.
    PollSucceeded,

    /// One iteration failed (fetch, sink or timeout). Sets `task`, `attempt`, `reason`.
    PollFailed,

    /// Iteration exceeded its timeout. Sets `task`, `attempt`, `timeout_ms`.
    TimeoutHit,

    /// Retry sleep scheduled after a failure. Sets `task`, `attempt`, `delay_ms`, `reason`.
    BackoffScheduled,

    /// Regular sleep scheduled after a success. Sets `task`, `delay_ms`.
    IntervalScheduled,

    // === Shutdown ===
    /// Shutdown started. `reason` describes the trigger.
    ShutdownRequested,

    /// All tasks stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; `reason` lists the stuck tasks.
    GraceExceeded,

    /// Another signal arrived during the grace period; remaining tasks were aborted.
    /// `reason` holds the signal name.
    ShutdownForced,

    /// A teardown step failed. Sets `task` (step name), `reason`.
    TeardownStepFailed,

    /// Teardown finished.
    ShutdownComplete,

    // === Subscribers ===
    /// Subscriber queue full or closed; event dropped for it. Sets `task`, `reason`.
    SubscriberOverflow,

    /// Subscriber panicked while handling an event. Sets `task`, `reason`.
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Task, stream or teardown step name.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, mode, stuck list).
    pub reason: Option<Arc<str>>,
    /// Iteration counter of a poll loop (starting from 1).
    pub attempt: Option<u64>,
    /// Scheduled sleep in milliseconds.
    pub delay_ms: Option<u64>,
    /// Iteration timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Event {
    /// Creates an event of the given kind stamped with the current time and next sequence.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            attempt: None,
            delay_ms: None,
            timeout_ms: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u64) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a sleep duration (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(millis(d));
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_fill_optional_fields() {
        let ev = Event::new(EventKind::TimeoutHit)
            .with_task("contributions")
            .with_attempt(2)
            .with_timeout(Duration::from_millis(1500));
        assert_eq!(ev.attempt, Some(2));
        assert_eq!(ev.timeout_ms, Some(1500));
        assert!(ev.reason.is_none());
    }

    #[test]
    fn subscriber_overflow_names_subscriber() {
        let ev = Event::subscriber_overflow("log", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.task.as_deref(), Some("log"));
        assert_eq!(ev.reason.as_deref(), Some("full"));
    }
}
