//! # Adaptive polling interval.
//!
//! [`IntervalPolicy::interval_for`] is a pure function of the stream and the local wall-clock
//! hour:
//!
//! ```text
//! contributions → contributions_interval                  (900s, any hour)
//! pr-events     → work_hours_interval   if start <= h < end   (60s)
//!               → off_hours_interval    otherwise              (300s)
//! ```
//!
//! The window is half-open. `start == end` describes an empty window, so the off-hours
//! interval applies all day; the same holds for `start > end` (windows do not wrap past
//! midnight).
//!
//! Poll loops consult the policy after every successful iteration, so a run crossing the
//! window boundary picks up the new cadence on its next sleep.

use std::time::Duration;

use chrono::Timelike;

use crate::poll::StreamId;

/// Time-of-day dependent polling cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalPolicy {
    /// First hour (0–23, local) of the work window, inclusive.
    pub work_start_hour: u32,
    /// Hour (0–23, local) at which the work window ends, exclusive.
    pub work_end_hour: u32,
    /// `pr-events` interval inside the window.
    pub work_hours_interval: Duration,
    /// `pr-events` interval outside the window.
    pub off_hours_interval: Duration,
    /// Fixed `contributions` interval.
    pub contributions_interval: Duration,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self {
            work_start_hour: 9,
            work_end_hour: 18,
            work_hours_interval: Duration::from_secs(60),
            off_hours_interval: Duration::from_secs(300),
            contributions_interval: Duration::from_secs(900),
        }
    }
}

impl IntervalPolicy {
    /// True if `hour` falls inside `[work_start_hour, work_end_hour)`.
    #[inline]
    pub fn is_work_hour(&self, hour: u32) -> bool {
        self.work_start_hour <= hour && hour < self.work_end_hour
    }

    /// Polling period for `stream` at local time `now`.
    pub fn interval_for<T: Timelike>(&self, stream: StreamId, now: &T) -> Duration {
        match stream {
            StreamId::Contributions => self.contributions_interval,
            StreamId::PrEvents if self.is_work_hour(now.hour()) => self.work_hours_interval,
            StreamId::PrEvents => self.off_hours_interval,
        }
    }
}
