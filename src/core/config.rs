//! # Supervisor runtime configuration.
//!
//! [`SupervisorConfig`] holds the runtime knobs;
//! [`Settings::supervisor_config`](crate::Settings::supervisor_config) derives it from the
//! persisted settings.
//!
//! ## Sentinel values
//! - `fetch_timeout = 0s` → poll iterations are unbounded
//! - `teardown_step_timeout = 0s` → teardown steps are unbounded

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Runtime configuration for the [`Supervisor`](crate::Supervisor).
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum wait for tasks to stop after the shutdown signal fires.
    ///
    /// Tasks still running afterwards are reported as stuck and aborted.
    pub grace: Duration,

    /// Capacity of the event bus ring buffer (min 1; clamped by the bus).
    pub bus_capacity: usize,

    /// Retry delay after a failed poll iteration.
    pub backoff: BackoffPolicy,

    /// Bound on one poll iteration (`Duration::ZERO` = none).
    pub fetch_timeout: Duration,

    /// Bound on each shutdown teardown step (`Duration::ZERO` = none).
    pub teardown_step_timeout: Duration,
}

impl SupervisorConfig {
    /// Poll iteration bound as an `Option`.
    #[inline]
    pub fn iteration_timeout(&self) -> Option<Duration> {
        Some(self.fetch_timeout).filter(|d| !d.is_zero())
    }

    /// Teardown step bound as an `Option`.
    #[inline]
    pub fn step_timeout(&self) -> Option<Duration> {
        Some(self.teardown_step_timeout).filter(|d| !d.is_zero())
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    /// - `backoff = fixed 60s`
    /// - `fetch_timeout = 30s`
    /// - `teardown_step_timeout = 5s`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            backoff: BackoffPolicy::default(),
            fetch_timeout: Duration::from_secs(30),
            teardown_step_timeout: Duration::from_secs(5),
        }
    }
}
