//! # Event subscribers.
//!
//! ```text
//! Bus ──► Supervisor listener ──► SubscriberSet::emit(&Event)
//!                                     ├──► LogWriter   (tracing output)
//!                                     └──► StatusBoard (per-task health for /api/status)
//! ```
//!
//! Custom subscribers implement [`Subscribe`] and are registered through
//! [`SupervisorBuilder::with_subscribers`](crate::SupervisorBuilder::with_subscribers).

mod log;
mod set;
mod status;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use status::{StatusBoard, TaskStatus};
pub use subscribe::Subscribe;
