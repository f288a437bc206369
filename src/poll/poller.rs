//! # PollLoop: fetch → sink → sleep, forever.
//!
//! ```text
//! Idle ─► Fetching ─► Sinking ─► Sleeping ─► Fetching ─► …
//!            │           │           │
//!            └───────────┴───────────┴──── signal fired ──► Stopped
//! ```
//!
//! ## Rules
//! - Iterations are strictly sequential.
//! - A failed iteration (fetch, sink or timeout) publishes `PollFailed` and
//!   `BackoffScheduled`, then sleeps for the backoff delay. It never ends the loop.
//! - A successful iteration publishes `PollSucceeded` and `IntervalScheduled`, with the delay
//!   computed from the current local time.
//! - The only exit is the shutdown signal; the loop then returns `Ok(())`.

use std::fmt;

use async_trait::async_trait;
use chrono::{Local, NaiveTime};
use tokio::sync::watch;
use tokio::time;

use super::runner::run_iteration;
use super::stream::PollStream;
use crate::core::ShutdownSignal;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;
use crate::tasks::Task;

/// Observable state of a [`PollLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    Sinking,
    Sleeping,
    Stopped,
}

fn local_time() -> NaiveTime {
    Local::now().time()
}

/// Supervised loop driving one [`PollStream`].
pub struct PollLoop<T> {
    stream: PollStream<T>,
    bus: Bus,
    backoff: BackoffPolicy,
    clock: fn() -> NaiveTime,
    state: watch::Sender<PollState>,
}

impl<T: Send + 'static> PollLoop<T> {
    pub fn new(stream: PollStream<T>, bus: Bus, backoff: BackoffPolicy) -> Self {
        let (state, _) = watch::channel(PollState::Idle);
        Self {
            stream,
            bus,
            backoff,
            clock: local_time,
            state,
        }
    }

    /// Replaces the local wall clock used for interval decisions.
    pub fn with_clock(mut self, clock: fn() -> NaiveTime) -> Self {
        self.clock = clock;
        self
    }

    /// Receiver tracking the loop state.
    pub fn watch(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    fn event(&self, kind: EventKind, attempt: u64) -> Event {
        Event::new(kind)
            .with_task(self.stream.id.as_str())
            .with_attempt(attempt)
    }
}

impl<T> fmt::Debug for PollLoop<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollLoop")
            .field("stream", &self.stream)
            .field("backoff", &self.backoff)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: Send + 'static> Task for PollLoop<T> {
    fn name(&self) -> &str {
        self.stream.id.as_str()
    }

    async fn run(&self, shutdown: ShutdownSignal) -> Result<(), TaskError> {
        let mut attempt: u64 = 0;
        let mut failures: u32 = 0;

        loop {
            if shutdown.is_fired() {
                break;
            }
            attempt += 1;

            let delay = match run_iteration(&self.stream, &shutdown, &self.state, attempt, &self.bus)
                .await
            {
                Ok(()) => {
                    failures = 0;
                    let delay = self.stream.next_interval(&(self.clock)());
                    self.bus.publish(self.event(EventKind::PollSucceeded, attempt));
                    self.bus.publish(
                        self.event(EventKind::IntervalScheduled, attempt)
                            .with_delay(delay),
                    );
                    delay
                }
                Err(TaskError::Canceled) => break,
                Err(e) => {
                    let delay = self.backoff.next(failures);
                    failures = failures.saturating_add(1);
                    let reason = e.to_string();
                    self.bus.publish(
                        self.event(EventKind::PollFailed, attempt)
                            .with_reason(reason.as_str()),
                    );
                    self.bus.publish(
                        self.event(EventKind::BackoffScheduled, attempt)
                            .with_delay(delay)
                            .with_reason(reason),
                    );
                    delay
                }
            };

            self.state.send_replace(PollState::Sleeping);
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = shutdown.fired() => break,
            }
        }

        self.state.send_replace(PollState::Stopped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::error::ServiceError;
    use crate::poll::{Fetch, Sink, StreamId};
    use crate::policies::IntervalPolicy;

    /// Records call instants; fails when `fail` is set, hangs when `hang` is set.
    #[derive(Default)]
    struct Source {
        calls: Mutex<Vec<Instant>>,
        fail: bool,
        hang: bool,
    }

    #[async_trait]
    impl Fetch<u32> for Source {
        async fn fetch(&self) -> Result<u32, ServiceError> {
            self.calls.lock().unwrap().push(Instant::now());
            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.fail {
                return Err(ServiceError::Status {
                    status: 502,
                    message: "bad gateway".into(),
                });
            }
            Ok(7)
        }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<u32>>);

    #[async_trait]
    impl Sink<u32> for Collect {
        async fn sink(&self, item: u32) -> Result<(), ServiceError> {
            self.0.lock().unwrap().push(item);
            Ok(())
        }
    }

    fn ten_am() -> NaiveTime {
        NaiveTime::from_hms_opt(10, 0, 0).unwrap()
    }

    fn poll_loop(id: StreamId, src: Arc<Source>, sink: Arc<Collect>, bus: &Bus) -> PollLoop<u32> {
        let stream = PollStream::new(id, src, sink, Duration::from_secs(900))
            .with_adaptive(IntervalPolicy::default());
        PollLoop::new(stream, bus.clone(), BackoffPolicy::default()).with_clock(ten_am)
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn failing_fetch_retries_every_minute() {
        let bus = Bus::new(256);
        let mut rx = bus.subscribe();
        let src = Arc::new(Source {
            fail: true,
            ..Default::default()
        });
        let lp = Arc::new(poll_loop(
            StreamId::PrEvents,
            src.clone(),
            Arc::default(),
            &bus,
        ));

        let signal = ShutdownSignal::new();
        let handle = tokio::spawn({
            let lp = lp.clone();
            let signal = signal.clone();
            async move { lp.run(signal).await }
        });

        time::sleep(Duration::from_secs(185)).await;
        assert!(!handle.is_finished());
        signal.fire();
        handle.await.unwrap().unwrap();

        let calls = src.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 4);
        for pair in calls.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_secs(60));
        }

        let failed: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::PollFailed)
            .collect();
        assert_eq!(failed.len(), 4);
        assert_eq!(failed[2].attempt, Some(3));
        assert!(failed[0].reason.as_deref().unwrap().starts_with("execution failed: fetch:"));
    }

    #[tokio::test(start_paused = true)]
    async fn signal_interrupts_long_sleep() {
        let bus = Bus::new(64);
        let src = Arc::new(Source::default());
        let sink = Arc::new(Collect::default());
        let lp = Arc::new(poll_loop(StreamId::Contributions, src, sink.clone(), &bus));
        let mut state = lp.watch();

        let signal = ShutdownSignal::new();
        let handle = tokio::spawn({
            let lp = lp.clone();
            let signal = signal.clone();
            async move { lp.run(signal).await }
        });

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*state.borrow_and_update(), PollState::Sleeping);
        assert_eq!(*sink.0.lock().unwrap(), vec![7]);

        let fired_at = Instant::now();
        signal.fire();
        time::timeout(Duration::from_millis(50), handle)
            .await
            .expect("loop must stop promptly")
            .unwrap()
            .unwrap();
        assert!(fired_at.elapsed() < Duration::from_millis(50));
        assert_eq!(*state.borrow(), PollState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn success_schedules_adaptive_interval() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let lp = poll_loop(
            StreamId::PrEvents,
            Arc::default(),
            Arc::default(),
            &bus,
        );

        let signal = ShutdownSignal::new();
        let stopper = signal.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(1)).await;
            stopper.fire();
        });
        lp.run(signal).await.unwrap();

        let events = drain(&mut rx);
        let scheduled = events
            .iter()
            .find(|e| e.kind == EventKind::IntervalScheduled)
            .unwrap();
        assert_eq!(scheduled.delay_ms, Some(60_000));
        assert_eq!(scheduled.task.as_deref(), Some("pr-events"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_fetch_hits_timeout_and_backs_off() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let src = Arc::new(Source {
            hang: true,
            ..Default::default()
        });
        let stream = PollStream::new(
            StreamId::Contributions,
            src.clone(),
            Arc::new(Collect::default()),
            Duration::from_secs(900),
        )
        .with_timeout(Duration::from_secs(30));
        let lp = PollLoop::new(stream, bus.clone(), BackoffPolicy::default());

        let signal = ShutdownSignal::new();
        let stopper = signal.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(35)).await;
            stopper.fire();
        });
        lp.run(signal).await.unwrap();

        let kinds: Vec<_> = drain(&mut rx).into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::TimeoutHit,
                EventKind::PollFailed,
                EventKind::BackoffScheduled
            ]
        );
        assert_eq!(src.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fired_before_start_never_fetches() {
        let bus = Bus::new(8);
        let src = Arc::new(Source::default());
        let lp = poll_loop(StreamId::PrEvents, src.clone(), Arc::default(), &bus);

        let signal = ShutdownSignal::new();
        signal.fire();
        lp.run(signal).await.unwrap();
        assert!(src.calls.lock().unwrap().is_empty());
    }
}
