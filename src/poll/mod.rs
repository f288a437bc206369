//! # Poll loops.
//!
//! Each data stream (`contributions`, `pr-events`) runs in its own [`PollLoop`], a supervised
//! [`Task`](crate::Task) that fetches, sinks and sleeps until the shutdown signal fires.
//! Failures stay inside the loop; the supervisor only ever sees a clean exit.

mod poller;
mod runner;
mod stream;

pub use poller::{PollLoop, PollState};
pub use stream::{Fetch, PollStream, Sink, StreamId};
