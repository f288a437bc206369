//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(ShutdownSignal) -> Fut`, producing a fresh future per
//! run. Shared state goes through explicit `Arc<...>` captures.
//!
//! ```rust
//! use gitglow::{ShutdownSignal, TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc("idle", |shutdown: ShutdownSignal| async move {
//!     shutdown.fired().await;
//!     Ok::<_, TaskError>(())
//! });
//! assert_eq!(t.name(), "idle");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::ShutdownSignal;
use crate::error::TaskError;
use crate::tasks::task::Task;

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(ShutdownSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, shutdown: ShutdownSignal) -> Result<(), TaskError> {
        (self.f)(shutdown).await
    }
}
