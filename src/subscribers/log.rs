//! # LogWriter: turns runtime events into `tracing` records
//!
//! Example output (fmt layer):
//! ```text
//! INFO  gitglow::events: mode selected mode="normal"
//! INFO  gitglow::events: task starting task="pr-events"
//! WARN  gitglow::events: poll failed task="contributions" attempt=3 error="rate limited"
//! INFO  gitglow::events: retry scheduled task="contributions" delay_ms=60000
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event-to-tracing subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::ModeSelected => {
                info!(target: "gitglow::events", mode = reason, "mode selected");
            }
            EventKind::TaskStarting => {
                info!(target: "gitglow::events", task, "task starting");
            }
            EventKind::TaskStopped => {
                info!(target: "gitglow::events", task, "task stopped");
            }
            EventKind::TaskFailed => {
                error!(target: "gitglow::events", task, error = reason, "task failed");
            }
            EventKind::PollSucceeded => {
                debug!(target: "gitglow::events", task, attempt = ?e.attempt, "poll succeeded");
            }
            EventKind::PollFailed => {
                warn!(
                    target: "gitglow::events",
                    task,
                    attempt = ?e.attempt,
                    error = reason,
                    "poll failed"
                );
            }
            EventKind::TimeoutHit => {
                warn!(target: "gitglow::events", task, timeout_ms = ?e.timeout_ms, "poll timed out");
            }
            EventKind::BackoffScheduled => {
                info!(target: "gitglow::events", task, delay_ms = ?e.delay_ms, "retry scheduled");
            }
            EventKind::IntervalScheduled => {
                debug!(target: "gitglow::events", task, delay_ms = ?e.delay_ms, "next poll scheduled");
            }
            EventKind::ShutdownRequested => {
                info!(target: "gitglow::events", trigger = reason, "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                info!(target: "gitglow::events", "all tasks stopped within grace");
            }
            EventKind::GraceExceeded => {
                warn!(target: "gitglow::events", stuck = reason, "grace exceeded");
            }
            EventKind::ShutdownForced => {
                warn!(target: "gitglow::events", signal = reason, "shutdown forced");
            }
            EventKind::TeardownStepFailed => {
                warn!(target: "gitglow::events", step = task, error = reason, "teardown step failed");
            }
            EventKind::ShutdownComplete => {
                info!(target: "gitglow::events", "shutdown complete");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "gitglow::events", subscriber = task, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                error!(target: "gitglow::events", subscriber = task, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
