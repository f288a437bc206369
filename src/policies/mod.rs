//! Timing policies.
//!
//! - [`IntervalPolicy`]: how long a poll loop sleeps after a successful iteration
//!   (time-of-day aware for `pr-events`).
//! - [`BackoffPolicy`]: how long it sleeps after a failed iteration.
//! - [`JitterPolicy`]: randomization applied to the backoff.
//!
//! ```text
//! PollLoop::run
//!   ├─ Ok  ─► IntervalPolicy::interval_for(stream, Local::now())
//!   └─ Err ─► BackoffPolicy::next(consecutive_failures - 1)
//! ```

mod backoff;
mod interval;
mod jitter;

pub use backoff::BackoffPolicy;
pub use interval::IntervalPolicy;
pub use jitter::JitterPolicy;
