//! # Supervisor: runs the task set, decides when to stop, shuts down once.
//!
//! ```text
//! run(tasks)
//!   ├─► spawn every task with signal.child()          (TaskStarting)
//!   ├─► wait for the first trigger:
//!   │     ├─ OS signal / external signal.fire()       → SignalReceived
//!   │     ├─ task returns Err(e), e != Canceled       → TaskFailed { task, error }
//!   │     └─ JoinSet empty                            → AllCompleted
//!   ├─► ShutdownRequested, signal.fire()
//!   ├─► wait up to `grace`:
//!   │     ├─ all joined      → AllStoppedWithin
//!   │     ├─ still running   → GraceExceeded (stuck list) → abort_all()
//!   │     └─ another signal  → ShutdownForced → abort_all()
//!   └─► coordinator.shutdown()                        (exactly once)
//! ```
//!
//! Event fan-out (wired by the builder):
//! ```text
//! tasks / supervisor / coordinator ── publish ──► Bus ──► listener ──► SubscriberSet::emit
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use gitglow::{ShutdownSignal, Supervisor, SupervisorConfig, TaskError, TaskFn, TaskRef,
//!     TerminationReason};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sup = Supervisor::builder(SupervisorConfig::default()).build();
//!
//!     let once: TaskRef = TaskFn::arc("once", |_s: ShutdownSignal| async move {
//!         tokio::time::sleep(Duration::from_millis(5)).await;
//!         Ok::<_, TaskError>(())
//!     });
//!
//!     let reason = sup.run(vec![once]).await;
//!     assert!(matches!(reason, TerminationReason::AllCompleted));
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{Fuse, FusedStream, Stream, StreamExt};
use tokio::sync::RwLock;
use tokio::task::{Id, JoinError, JoinSet};
use tokio::time;
use tracing::{info, warn};

use super::builder::SupervisorBuilder;
use super::config::SupervisorConfig;
use super::coordinator::ShutdownCoordinator;
use super::handle::{TaskHandle, TaskState};
use super::os_signals;
use super::signal::ShutdownSignal;
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::TaskRef;

/// Why [`Supervisor::run`] returned.
#[derive(Debug, Clone)]
pub enum TerminationReason {
    /// OS termination signal, or the shutdown signal fired from outside.
    SignalReceived,
    /// A task returned an unrecoverable error.
    TaskFailed { task: String, error: TaskError },
    /// Every task returned on its own.
    AllCompleted,
}

impl TerminationReason {
    /// Process exit status for this reason.
    pub fn exit_code(&self) -> i32 {
        match self {
            TerminationReason::TaskFailed { .. } => 1,
            TerminationReason::SignalReceived | TerminationReason::AllCompleted => 0,
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::SignalReceived => f.write_str("signal received"),
            TerminationReason::TaskFailed { task, error } => {
                write!(f, "task {task} failed: {error}")
            }
            TerminationReason::AllCompleted => f.write_str("all tasks completed"),
        }
    }
}

/// Owns the running task set and the shutdown path.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    signal: ShutdownSignal,
    coordinator: Arc<ShutdownCoordinator>,
    handles: RwLock<BTreeMap<String, TaskHandle>>,
}

impl Supervisor {
    /// Starts building a supervisor.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        bus: Bus,
        signal: ShutdownSignal,
        coordinator: Arc<ShutdownCoordinator>,
    ) -> Self {
        Self {
            cfg,
            bus,
            signal,
            coordinator,
            handles: RwLock::new(BTreeMap::new()),
        }
    }

    /// Event bus shared by every component of this run.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Process-wide shutdown signal. Firing it stops the run with `SignalReceived`.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    /// Teardown coordinator invoked at the end of [`run`](Self::run).
    pub fn coordinator(&self) -> Arc<ShutdownCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Current handles, sorted by task name.
    pub async fn handles(&self) -> Vec<TaskHandle> {
        self.handles.read().await.values().cloned().collect()
    }

    /// Runs `tasks` until an OS signal, a fatal task error or completion of every task.
    ///
    /// Installs the signal listeners on entry; use [`run_until`](Self::run_until) with
    /// [`shutdown_signals`](crate::shutdown_signals) to install them earlier.
    pub async fn run(&self, tasks: Vec<TaskRef>) -> TerminationReason {
        self.run_until(tasks, os_signals::shutdown_signals()).await
    }

    /// Like [`run`](Self::run), with `stop` standing in for the OS signal listener.
    ///
    /// The first item starts the shutdown; a second one during the grace period aborts the
    /// remaining tasks at once. An `Err` item is logged and ignored; a finished stream
    /// leaves the shutdown signal, task failure or completion to end the run.
    pub async fn run_until<S>(&self, tasks: Vec<TaskRef>, stop: S) -> TerminationReason
    where
        S: Stream<Item = Result<&'static str, RuntimeError>>,
    {
        let stop = stop.fuse();
        tokio::pin!(stop);

        let mut set = JoinSet::new();
        let names = self.spawn_tasks(&mut set, tasks).await;

        let reason = self.wait_for_trigger(&mut set, &names, &mut stop).await;
        info!(%reason, "shutting down");
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(reason.to_string()));
        self.signal.fire();

        self.wait_all_with_grace(&mut set, &names, &mut stop).await;
        self.coordinator.shutdown().await;
        reason
    }

    async fn spawn_tasks(
        &self,
        set: &mut JoinSet<Result<(), TaskError>>,
        tasks: Vec<TaskRef>,
    ) -> HashMap<Id, String> {
        let mut names = HashMap::with_capacity(tasks.len());
        let mut handles = self.handles.write().await;

        for task in tasks {
            let name = task.name().to_string();
            handles.insert(name.clone(), TaskHandle::running(name.as_str()));
            self.bus
                .publish(Event::new(EventKind::TaskStarting).with_task(name.as_str()));

            let child = self.signal.child();
            let id = set.spawn(async move { task.run(child).await }).id();
            names.insert(id, name);
        }
        names
    }

    async fn wait_for_trigger<S>(
        &self,
        set: &mut JoinSet<Result<(), TaskError>>,
        names: &HashMap<Id, String>,
        stop: &mut Pin<&mut Fuse<S>>,
    ) -> TerminationReason
    where
        S: Stream<Item = Result<&'static str, RuntimeError>>,
    {
        loop {
            tokio::select! {
                res = stop.next(), if !stop.is_terminated() => match res {
                    Some(Ok(signal)) => {
                        info!(signal, "termination signal received");
                        return TerminationReason::SignalReceived;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, label = e.as_label(), "os signals unavailable");
                    }
                    None => {}
                },
                _ = self.signal.fired() => return TerminationReason::SignalReceived,
                joined = set.join_next_with_id() => match joined {
                    None => return TerminationReason::AllCompleted,
                    Some(joined) => {
                        if let Some(failure) = self.record(joined, names).await {
                            return failure;
                        }
                    }
                },
            }
        }
    }

    async fn wait_all_with_grace<S>(
        &self,
        set: &mut JoinSet<Result<(), TaskError>>,
        names: &HashMap<Id, String>,
        stop: &mut Pin<&mut Fuse<S>>,
    ) where
        S: Stream<Item = Result<&'static str, RuntimeError>>,
    {
        let grace = self.cfg.grace;
        let forced = {
            let drain = async {
                while let Some(joined) = set.join_next_with_id().await {
                    self.record(joined, names).await;
                }
            };
            let timed = time::timeout(grace, drain);
            tokio::pin!(timed);

            loop {
                tokio::select! {
                    res = &mut timed => {
                        if res.is_ok() {
                            self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                            return;
                        }
                        break None;
                    }
                    res = stop.next(), if !stop.is_terminated() => {
                        if let Some(Ok(signal)) = res {
                            break Some(signal);
                        }
                    }
                }
            }
        };

        let stuck = self.mark_stuck().await;
        match forced {
            Some(signal) => {
                warn!(signal, stuck = ?stuck, "second signal; aborting without waiting for grace");
                self.bus
                    .publish(Event::new(EventKind::ShutdownForced).with_reason(signal));
            }
            None => {
                let err = RuntimeError::GraceExceeded {
                    grace,
                    stuck: stuck.clone(),
                };
                warn!(error = %err, "aborting stuck tasks");
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(", ")));
            }
        }

        set.abort_all();
        while set.join_next().await.is_some() {}
    }

    /// Marks every still-running handle as failed and returns their names.
    async fn mark_stuck(&self) -> Vec<String> {
        let mut handles = self.handles.write().await;
        let mut stuck = Vec::new();
        for h in handles.values_mut() {
            if h.state == TaskState::Running {
                h.finish(Err(TaskError::fatal("aborted after shutdown grace period")));
                stuck.push(h.name.clone());
            }
        }
        stuck
    }

    /// Records a joined task; returns the termination reason if it failed.
    async fn record(
        &self,
        joined: Result<(Id, Result<(), TaskError>), JoinError>,
        names: &HashMap<Id, String>,
    ) -> Option<TerminationReason> {
        let (id, outcome) = match joined {
            Ok((id, outcome)) => (id, outcome),
            Err(e) if e.is_panic() => (e.id(), Err(TaskError::fatal("task panicked"))),
            Err(e) => (e.id(), Err(TaskError::Canceled)),
        };
        let name = names.get(&id).cloned().unwrap_or_else(|| id.to_string());

        let failure = match &outcome {
            Ok(()) | Err(TaskError::Canceled) => {
                self.bus
                    .publish(Event::new(EventKind::TaskStopped).with_task(name.as_str()));
                None
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::TaskFailed)
                        .with_task(name.as_str())
                        .with_reason(e.to_string()),
                );
                Some(TerminationReason::TaskFailed {
                    task: name.clone(),
                    error: e.clone(),
                })
            }
        };

        if let Some(handle) = self.handles.write().await.get_mut(&name) {
            handle.finish(outcome);
        }
        failure
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;

    use futures::stream;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::tasks::TaskFn;

    fn sup(grace: Duration) -> Arc<Supervisor> {
        Supervisor::builder(SupervisorConfig {
            grace,
            ..SupervisorConfig::default()
        })
        .build()
    }

    fn never() -> impl Stream<Item = Result<&'static str, RuntimeError>> {
        stream::pending()
    }

    fn until_fired(name: &'static str) -> TaskRef {
        TaskFn::arc(name, |s: ShutdownSignal| async move {
            s.fired().await;
            Err::<(), _>(TaskError::Canceled)
        })
    }

    #[tokio::test]
    async fn empty_task_set_completes() {
        let sup = sup(Duration::from_secs(1));
        let reason = sup.run_until(vec![], never()).await;
        assert!(matches!(reason, TerminationReason::AllCompleted));
        assert!(sup.coordinator().is_complete());
    }

    #[tokio::test]
    async fn fatal_task_stops_everyone() {
        let sup = sup(Duration::from_secs(1));
        let other_stopped = Arc::new(AtomicBool::new(false));
        let flag = other_stopped.clone();

        let web: TaskRef = TaskFn::arc("web", |_s: ShutdownSignal| async move {
            Err::<(), _>(TaskError::fatal("address in use"))
        });
        let poller: TaskRef = TaskFn::arc("pr-events", move |s: ShutdownSignal| {
            let flag = flag.clone();
            async move {
                s.fired().await;
                flag.store(true, Ordering::SeqCst);
                Ok::<_, TaskError>(())
            }
        });

        let reason = sup.run_until(vec![web, poller], never()).await;
        match &reason {
            TerminationReason::TaskFailed { task, error } => {
                assert_eq!(task, "web");
                assert_eq!(error.as_label(), "task_fatal");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(reason.exit_code(), 1);
        assert!(other_stopped.load(Ordering::SeqCst));

        let handles = sup.handles().await;
        let states: Vec<_> = handles.iter().map(|h| (h.name.as_str(), h.state)).collect();
        assert_eq!(
            states,
            vec![("pr-events", TaskState::Completed), ("web", TaskState::Failed)]
        );
    }

    #[tokio::test]
    async fn stop_future_maps_to_signal_received() {
        let sup = sup(Duration::from_secs(1));
        let mut rx = sup.bus().subscribe();
        let stop = stream::once(async { Ok::<_, RuntimeError>("SIGTERM") });

        let reason = sup
            .run_until(vec![until_fired("contributions")], stop)
            .await;
        assert!(matches!(reason, TerminationReason::SignalReceived));
        assert_eq!(reason.exit_code(), 0);

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::TaskStarting,
                EventKind::ShutdownRequested,
                EventKind::TaskStopped,
                EventKind::AllStoppedWithin,
                EventKind::ShutdownComplete,
            ]
        );
    }

    #[tokio::test]
    async fn external_fire_is_a_signal() {
        let sup = sup(Duration::from_secs(1));
        let signal = sup.shutdown_signal();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            signal.fire();
        });
        let reason = sup.run_until(vec![until_fired("web")], never()).await;
        assert!(matches!(reason, TerminationReason::SignalReceived));
    }

    #[tokio::test]
    async fn broken_signal_listener_is_not_fatal() {
        let sup = sup(Duration::from_secs(1));
        let stop = stream::once(async {
            Err(RuntimeError::SignalRegistration(std::io::Error::other("no signals")))
        });
        let done: TaskRef = TaskFn::arc("once", |_s: ShutdownSignal| async move { Ok::<_, TaskError>(()) });
        let reason = sup.run_until(vec![done], stop).await;
        assert!(matches!(reason, TerminationReason::AllCompleted));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_task_is_aborted_after_grace() {
        let sup = sup(Duration::from_secs(5));
        let mut rx = sup.bus().subscribe();
        let stubborn: TaskRef = TaskFn::arc("stubborn", |_s: ShutdownSignal| async move {
            pending::<()>().await;
            Ok::<_, TaskError>(())
        });
        let stop = stream::once(async { Ok::<_, RuntimeError>("SIGINT") });

        let reason = sup.run_until(vec![stubborn], stop).await;
        assert!(matches!(reason, TerminationReason::SignalReceived));

        let grace = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|e| e.kind == EventKind::GraceExceeded)
            .unwrap();
        assert_eq!(grace.reason.as_deref(), Some("stubborn"));
        assert_eq!(sup.handles().await[0].state, TaskState::Failed);
        assert!(sup.coordinator().is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn second_signal_skips_grace() {
        let sup = sup(Duration::from_secs(60));
        let mut rx = sup.bus().subscribe();
        let stubborn: TaskRef = TaskFn::arc("stubborn", |_s: ShutdownSignal| async move {
            pending::<()>().await;
            Ok::<_, TaskError>(())
        });
        let stop = stream::iter([Ok::<_, RuntimeError>("SIGINT"), Ok("SIGINT")]);

        let started = tokio::time::Instant::now();
        let reason = sup.run_until(vec![stubborn], stop).await;
        assert!(matches!(reason, TerminationReason::SignalReceived));
        assert!(started.elapsed() < Duration::from_secs(60));

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert!(kinds.contains(&EventKind::ShutdownForced));
        assert!(!kinds.contains(&EventKind::GraceExceeded));
        assert_eq!(sup.handles().await[0].state, TaskState::Failed);
        assert!(sup.coordinator().is_complete());
    }
}
