//! # Poll stream definition.
//!
//! A [`PollStream`] bundles everything one poll loop needs: which stream it is, where data
//! comes from ([`Fetch`]), where it goes ([`Sink`]), and how long to wait between iterations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Timelike;

use crate::error::ServiceError;
use crate::policies::IntervalPolicy;

/// Identity of a polled data stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamId {
    /// Contribution calendar.
    Contributions,
    /// Pull-request events on monitored repositories.
    PrEvents,
}

impl StreamId {
    /// Stable name used as task name and log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamId::Contributions => "contributions",
            StreamId::PrEvents => "pr-events",
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source half of a stream.
#[async_trait]
pub trait Fetch<T>: Send + Sync + 'static {
    async fn fetch(&self) -> Result<T, ServiceError>;
}

/// Destination half of a stream.
#[async_trait]
pub trait Sink<T>: Send + Sync + 'static {
    async fn sink(&self, item: T) -> Result<(), ServiceError>;
}

/// One polled stream, owned by its running loop.
pub struct PollStream<T> {
    pub id: StreamId,
    pub fetch: Arc<dyn Fetch<T>>,
    pub sink: Arc<dyn Sink<T>>,
    /// Sleep after a successful iteration when no adaptive rule is set.
    pub base_interval: Duration,
    /// Time-of-day rule; overrides `base_interval` when present.
    pub adaptive: Option<IntervalPolicy>,
    /// Bound on one fetch + sink iteration.
    pub timeout: Option<Duration>,
}

impl<T> PollStream<T> {
    pub fn new(
        id: StreamId,
        fetch: Arc<dyn Fetch<T>>,
        sink: Arc<dyn Sink<T>>,
        base_interval: Duration,
    ) -> Self {
        Self {
            id,
            fetch,
            sink,
            base_interval,
            adaptive: None,
            timeout: None,
        }
    }

    /// Consults `policy` after every successful iteration.
    pub fn with_adaptive(mut self, policy: IntervalPolicy) -> Self {
        self.adaptive = Some(policy);
        self
    }

    /// Bounds each iteration; `Duration::ZERO` disables the bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout).filter(|d| !d.is_zero());
        self
    }

    /// Sleep to schedule after a successful iteration finishing at local time `now`.
    pub fn next_interval<C: Timelike>(&self, now: &C) -> Duration {
        match &self.adaptive {
            Some(policy) => policy.interval_for(self.id, now),
            None => self.base_interval,
        }
    }
}

impl<T> fmt::Debug for PollStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollStream")
            .field("id", &self.id)
            .field("base_interval", &self.base_interval)
            .field("adaptive", &self.adaptive)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    struct Nothing;

    #[async_trait]
    impl Fetch<()> for Nothing {
        async fn fetch(&self) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    #[async_trait]
    impl Sink<()> for Nothing {
        async fn sink(&self, _item: ()) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    fn stream(id: StreamId) -> PollStream<()> {
        PollStream::new(id, Arc::new(Nothing), Arc::new(Nothing), Duration::from_secs(42))
    }

    #[test]
    fn base_interval_without_policy() {
        let at = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        assert_eq!(stream(StreamId::PrEvents).next_interval(&at), Duration::from_secs(42));
    }

    #[test]
    fn adaptive_policy_wins() {
        let s = stream(StreamId::PrEvents).with_adaptive(IntervalPolicy::default());
        let work = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let night = NaiveTime::from_hms_opt(20, 0, 0).unwrap();
        assert_eq!(s.next_interval(&work), Duration::from_secs(60));
        assert_eq!(s.next_interval(&night), Duration::from_secs(300));
    }

    #[test]
    fn zero_timeout_disables_bound() {
        let s = stream(StreamId::Contributions).with_timeout(Duration::ZERO);
        assert_eq!(s.timeout, None);
        assert_eq!(StreamId::PrEvents.to_string(), "pr-events");
    }
}
