//! # gitglow
//!
//! **gitglow** drives a small LED matrix that shows a GitHub account's contribution
//! calendar and flashes pull-request activity on monitored repositories.
//!
//! The process runs in one of two modes, chosen once at startup:
//! - **Setup**: settings are incomplete. A Wi-Fi hotspot comes up and a local web server
//!   accepts the configuration.
//! - **Normal**: two poll loops (contributions, pull-request events) feed the display while
//!   the web interface reports status.
//!
//! ## Architecture
//! ```text
//!   Settings ──► ModeController ──► TaskSet ──────────────┐
//!                                                          ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                        │
//! │  - spawns every task with a child ShutdownSignal                   │
//! │  - waits for: OS signal | fatal task error | all tasks done        │
//! │  - fires the signal, waits `grace`, aborts stragglers              │
//! │  - hands over to ShutdownCoordinator (clear display, stop hotspot) │
//! └──────┬──────────────────────┬──────────────────────┬──────────────┘
//!        ▼                      ▼                      ▼
//!  ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//!  │  PollLoop    │      │  PollLoop    │      │ WebServerTask│
//!  │ contributions│      │  pr-events   │      │    (axum)    │
//!  └──────┬───────┘      └──────┬───────┘      └──────────────┘
//!         │ PollSucceeded / PollFailed / BackoffScheduled / ...
//!         ▼                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Bus (broadcast channel)                         │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                          ┌────────┴────────┐
//!                          ▼                 ▼
//!                      LogWriter        StatusBoard
//! ```
//!
//! ## Poll loop
//! ```text
//! loop {
//!   ├─► stop if the signal fired
//!   ├─► fetch ─► sink            (bounded by the fetch timeout, cancellable)
//!   │     ├─ Ok  ─► PollSucceeded, IntervalScheduled{ adaptive interval }
//!   │     └─ Err ─► PollFailed,    BackoffScheduled{ retry delay }
//!   └─► sleep (cancellable)
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                         |
//! |-------------------|----------------------------------------------------------|--------------------------------------------|
//! | **Supervision**   | Run tasks, stop on signal or fatal error, bounded grace. | [`Supervisor`], [`TerminationReason`]      |
//! | **Tasks**         | Async units of work observing a shutdown signal.         | [`Task`], [`TaskFn`], [`TaskRef`]          |
//! | **Policies**      | Work-hours intervals, retry backoff with jitter.         | [`IntervalPolicy`], [`BackoffPolicy`]      |
//! | **Events**        | Typed runtime events and subscribers.                    | [`Event`], [`Subscribe`], [`StatusBoard`]  |
//! | **Errors**        | Typed errors per concern.                                | [`TaskError`], [`ServiceError`]            |
//! | **Configuration** | TOML settings with env overrides.                        | [`Settings`], [`SupervisorConfig`]         |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use gitglow::{ShutdownSignal, Supervisor, SupervisorConfig, TaskError, TaskFn, TaskRef, TerminationReason};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sup = Supervisor::builder(SupervisorConfig::default()).build();
//!
//!     let hello: TaskRef = TaskFn::arc("hello", |signal: ShutdownSignal| async move {
//!         if signal.is_fired() {
//!             return Ok::<_, TaskError>(());
//!         }
//!         tokio::time::sleep(Duration::from_millis(1)).await;
//!         Ok(())
//!     });
//!
//!     let reason = sup.run_until(vec![hello], futures::stream::pending()).await;
//!     assert!(matches!(reason, TerminationReason::AllCompleted));
//! }
//! ```

mod core;
mod error;

pub mod app;
pub mod display;
pub mod events;
pub mod logging;
pub mod mode;
pub mod network;
pub mod poll;
pub mod policies;
pub mod remote;
pub mod settings;
pub mod subscribers;
pub mod tasks;
pub mod web;

// ---- Public re-exports ----

pub use core::{
    ShutdownCoordinator, ShutdownSignal, SignalStream, Supervisor, SupervisorBuilder,
    SupervisorConfig, TaskHandle, TaskState, TerminationReason, shutdown_signals,
};
pub use error::{RuntimeError, ServiceError, SettingsError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use mode::OperatingMode;
pub use policies::{BackoffPolicy, IntervalPolicy, JitterPolicy};
pub use settings::{Settings, SettingsStore};
pub use subscribers::{LogWriter, StatusBoard, Subscribe, SubscriberSet};
pub use tasks::{Task, TaskFn, TaskRef};
