//! # Failure backoff for poll loops.
//!
//! [`BackoffPolicy`] decides how long a poll loop waits after a failed iteration before it
//! retries. The delay for the `n`-th consecutive failure (0-indexed) is
//! `first × factor^n`, clamped to `max`, then jittered. The base never depends on a previous
//! jittered value, so delays cannot drift downwards over a long outage.
//!
//! The default is a fixed 60 second retry (`factor = 1.0`), matching the appliance's
//! "retry in a minute" behaviour.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use gitglow::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_secs(10),
//!     max: Duration::from_secs(300),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//! assert_eq!(backoff.next(0), Duration::from_secs(10));
//! assert_eq!(backoff.next(2), Duration::from_secs(40));
//! assert_eq!(backoff.next(10), Duration::from_secs(300));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry delay policy applied after failed poll iterations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth per consecutive failure (`1.0` = constant).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Fixed 60s retry without jitter.
    fn default() -> Self {
        Self::fixed(Duration::from_secs(60))
    }
}

impl BackoffPolicy {
    /// Constant delay `d` for every retry.
    pub fn fixed(d: Duration) -> Self {
        Self {
            first: d,
            max: d,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Returns a copy with the given jitter.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay after `failures` previous consecutive failures (0 = first retry).
    pub fn next(&self, failures: u32) -> Duration {
        let exp = failures.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fixed_one_minute() {
        let policy = BackoffPolicy::default();
        for failures in [0, 1, 2, 50] {
            assert_eq!(policy.next(failures), Duration::from_secs(60));
        }
    }

    #[test]
    fn exponential_growth_is_capped() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(0), Duration::from_millis(100));
        assert_eq!(policy.next(1), Duration::from_millis(200));
        assert_eq!(policy.next(3), Duration::from_millis(800));
        assert_eq!(policy.next(4), Duration::from_secs(1));
    }

    #[test]
    fn first_above_max_is_clamped() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 1.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn overflow_clamps_to_max() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(10),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn equal_jitter_stays_within_half_and_base() {
        let policy = BackoffPolicy::fixed(Duration::from_secs(60)).with_jitter(JitterPolicy::Equal);
        for failures in 0..50 {
            let d = policy.next(failures);
            assert!(d >= Duration::from_secs(30), "{d:?} below half");
            assert!(d <= Duration::from_secs(60), "{d:?} above base");
        }
    }
}
