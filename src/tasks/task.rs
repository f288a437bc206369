//! # Task abstraction.
//!
//! A [`Task`] is one concurrently running unit supervised by the
//! [`Supervisor`](crate::Supervisor): a poll loop or the web server. It receives the
//! process-wide [`ShutdownSignal`] and must return promptly once it fires.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::ShutdownSignal;
use crate::error::TaskError;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit of work.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use gitglow::{ShutdownSignal, Task, TaskError};
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Task for Heartbeat {
///     fn name(&self) -> &str { "heartbeat" }
///
///     async fn run(&self, shutdown: ShutdownSignal) -> Result<(), TaskError> {
///         shutdown.fired().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Stable, human-readable name; used as the key in events and status.
    fn name(&self) -> &str;

    /// Runs until completion, unrecoverable failure, or shutdown.
    ///
    /// Returning `Ok(())` or `Err(TaskError::Canceled)` is a clean exit. Any other error is
    /// treated by the supervisor as fatal for the whole process.
    async fn run(&self, shutdown: ShutdownSignal) -> Result<(), TaskError>;
}
