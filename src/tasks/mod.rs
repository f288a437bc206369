//! # Task abstractions.
//!
//! - [`Task`]: async, cancelable unit supervised by the runtime.
//! - [`TaskFn`]: closure-backed task.
//! - [`TaskRef`]: shared handle (`Arc<dyn Task>`).

mod task;
mod task_fn;

pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
