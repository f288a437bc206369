//! Runtime core: orchestration and lifecycle.
//!
//! - [`supervisor`]: runs the task set, picks the termination reason, drives shutdown;
//! - [`builder`]: wires bus, subscribers and the shutdown coordinator;
//! - [`coordinator`]: ordered, run-once teardown of external resources;
//! - [`signal`]: the process-wide [`ShutdownSignal`];
//! - [`os_signals`]: cross-platform termination signal stream, installed eagerly;
//! - [`handle`]: per-task state tracked by the supervisor.

mod builder;
mod config;
mod coordinator;
mod handle;
mod os_signals;
mod signal;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use coordinator::ShutdownCoordinator;
pub use handle::{TaskHandle, TaskState};
pub use os_signals::{SignalStream, shutdown_signals};
pub use signal::ShutdownSignal;
pub use supervisor::{Supervisor, TerminationReason};
