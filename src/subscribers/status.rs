//! # StatusBoard: per-task health derived from the event stream.
//!
//! Backs the web `/api/status` endpoint. Entries are keyed by task name and guarded by the
//! event sequence number: an event with `seq <= last_seq` for its task is ignored, so
//! out-of-order delivery cannot roll a task back to an older state.
//!
//! ```text
//! TaskStarting   → Running
//! PollSucceeded  → last_success = at, consecutive_failures = 0
//! PollFailed     → consecutive_failures += 1, last_error = reason
//! TaskStopped    → Completed
//! TaskFailed     → Failed, last_error = reason
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::core::TaskState;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Snapshot of one task as seen through events.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatus {
    /// Lifecycle state.
    pub state: TaskState,
    /// Time of the last successful poll iteration.
    pub last_success: Option<DateTime<Utc>>,
    /// Failed iterations since the last success.
    pub consecutive_failures: u32,
    /// Most recent error message.
    pub last_error: Option<String>,
    /// Sleep scheduled after the last iteration, in milliseconds.
    pub next_delay_ms: Option<u64>,
    #[serde(skip)]
    last_seq: u64,
}

impl TaskStatus {
    fn new() -> Self {
        Self {
            state: TaskState::Running,
            last_success: None,
            consecutive_failures: 0,
            last_error: None,
            next_delay_ms: None,
            last_seq: 0,
        }
    }
}

/// Event-driven table of task health.
#[derive(Default)]
pub struct StatusBoard {
    tasks: RwLock<BTreeMap<String, TaskStatus>>,
}

impl StatusBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event. Returns `false` if it was irrelevant or stale.
    pub async fn update(&self, ev: &Event) -> bool {
        let Some(name) = ev.task.as_deref() else {
            return false;
        };
        if !tracks(ev.kind) {
            return false;
        }

        let mut tasks = self.tasks.write().await;
        let entry = tasks.entry(name.to_string()).or_insert_with(TaskStatus::new);
        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;

        match ev.kind {
            EventKind::TaskStarting => entry.state = TaskState::Running,
            EventKind::TaskStopped => entry.state = TaskState::Completed,
            EventKind::TaskFailed => {
                entry.state = TaskState::Failed;
                entry.last_error = ev.reason.as_deref().map(str::to_string);
            }
            EventKind::PollSucceeded => {
                entry.last_success = Some(DateTime::<Utc>::from(ev.at));
                entry.consecutive_failures = 0;
            }
            EventKind::PollFailed => {
                entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
                entry.last_error = ev.reason.as_deref().map(str::to_string);
            }
            EventKind::BackoffScheduled | EventKind::IntervalScheduled => {
                entry.next_delay_ms = ev.delay_ms;
            }
            _ => {}
        }
        true
    }

    /// Copy of the current table, sorted by task name.
    pub async fn snapshot(&self) -> BTreeMap<String, TaskStatus> {
        self.tasks.read().await.clone()
    }
}

fn tracks(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::TaskStarting
            | EventKind::TaskStopped
            | EventKind::TaskFailed
            | EventKind::PollSucceeded
            | EventKind::PollFailed
            | EventKind::BackoffScheduled
            | EventKind::IntervalScheduled
    )
}

#[async_trait]
impl Subscribe for StatusBoard {
    async fn on_event(&self, event: &Event) {
        self.update(event).await;
    }

    fn name(&self) -> &'static str {
        "StatusBoard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn failures_accumulate_until_success() {
        let board = StatusBoard::new();
        board
            .update(&Event::new(EventKind::TaskStarting).with_task("pr-events"))
            .await;
        for _ in 0..3 {
            board
                .update(
                    &Event::new(EventKind::PollFailed)
                        .with_task("pr-events")
                        .with_reason("boom"),
                )
                .await;
        }
        let snap = board.snapshot().await;
        let st = &snap["pr-events"];
        assert_eq!(st.consecutive_failures, 3);
        assert_eq!(st.last_error.as_deref(), Some("boom"));
        assert!(st.last_success.is_none());

        board
            .update(&Event::new(EventKind::PollSucceeded).with_task("pr-events"))
            .await;
        board
            .update(
                &Event::new(EventKind::IntervalScheduled)
                    .with_task("pr-events")
                    .with_delay(Duration::from_secs(60)),
            )
            .await;
        let st = board.snapshot().await["pr-events"].clone();
        assert_eq!(st.consecutive_failures, 0);
        assert!(st.last_success.is_some());
        assert_eq!(st.next_delay_ms, Some(60_000));
    }

    #[tokio::test]
    async fn stale_events_are_rejected() {
        let board = StatusBoard::new();
        let starting = Event::new(EventKind::TaskStarting).with_task("web");
        let stopped = Event::new(EventKind::TaskStopped).with_task("web");

        assert!(board.update(&stopped).await);
        assert!(!board.update(&starting).await);
        assert_eq!(board.snapshot().await["web"].state, TaskState::Completed);
    }

    #[tokio::test]
    async fn events_without_task_are_ignored() {
        let board = StatusBoard::new();
        assert!(!board.update(&Event::new(EventKind::ShutdownRequested)).await);
        assert!(board.snapshot().await.is_empty());
    }
}
