//! Runtime events: types and broadcast bus.
//!
//! - [`EventKind`], [`Event`]: classification and payload metadata.
//! - [`Bus`]: thin wrapper over `tokio::sync::broadcast`.
//!
//! Publishers: `Supervisor`, `PollLoop`, `ModeController`, `ShutdownCoordinator`,
//! `SubscriberSet` workers (overflow/panic). The only consumer of the bus is the supervisor's
//! listener, which fans out to the [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
