//! # Ordered, run-once teardown.
//!
//! ```text
//! shutdown() ──► OnceCell::get_or_init ──► 1. clear-display
//!   (any caller,                            2. stop-hotspot
//!    any number of times)                   3. fire signal + ShutdownComplete
//! ```
//!
//! ## Rules
//! - Teardown runs once; concurrent callers wait for the first run to finish.
//! - Steps run in fixed order. A failed or timed-out step publishes `TeardownStepFailed`
//!   and the next step still runs.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time;
use tracing::{debug, info};

use super::signal::ShutdownSignal;
use crate::display::DisplayRenderer;
use crate::error::ServiceError;
use crate::events::{Bus, Event, EventKind};
use crate::network::NetworkManager;

/// Releases stateful external resources on the way out.
pub struct ShutdownCoordinator {
    display: Option<Arc<dyn DisplayRenderer>>,
    network: Option<Arc<dyn NetworkManager>>,
    signal: ShutdownSignal,
    bus: Bus,
    step_timeout: Option<Duration>,
    done: OnceCell<()>,
}

impl ShutdownCoordinator {
    pub(crate) fn new(
        display: Option<Arc<dyn DisplayRenderer>>,
        network: Option<Arc<dyn NetworkManager>>,
        signal: ShutdownSignal,
        bus: Bus,
        step_timeout: Option<Duration>,
    ) -> Self {
        Self {
            display,
            network,
            signal,
            bus,
            step_timeout,
            done: OnceCell::new(),
        }
    }

    /// Runs the teardown sequence, or waits for the run already in progress.
    pub async fn shutdown(&self) {
        self.done.get_or_init(|| self.teardown()).await;
    }

    /// True once a teardown has finished.
    pub fn is_complete(&self) -> bool {
        self.done.initialized()
    }

    async fn teardown(&self) {
        if let Some(display) = &self.display {
            self.step("clear-display", display.clear()).await;
        }
        if let Some(network) = &self.network {
            self.step("stop-hotspot", network.stop_hotspot()).await;
        }
        self.signal.fire();
        self.bus.publish(Event::new(EventKind::ShutdownComplete));
        info!("shutdown complete");
    }

    async fn step<F>(&self, name: &'static str, fut: F)
    where
        F: Future<Output = Result<(), ServiceError>>,
    {
        let res = match self.step_timeout {
            Some(dur) => match time::timeout(dur, fut).await {
                Ok(res) => res.map_err(|e| e.to_string()),
                Err(_elapsed) => Err(format!("timed out after {dur:?}")),
            },
            None => fut.await.map_err(|e| e.to_string()),
        };

        match res {
            Ok(()) => debug!(step = name, "teardown step done"),
            Err(reason) => self.bus.publish(
                Event::new(EventKind::TeardownStepFailed)
                    .with_task(name)
                    .with_reason(reason),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::remote::{ContributionData, PrEvent};

    #[derive(Default)]
    struct Journal(Mutex<Vec<&'static str>>);

    impl Journal {
        fn push(&self, s: &'static str) {
            self.0.lock().unwrap().push(s);
        }
        fn entries(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    struct FakeDisplay {
        journal: Arc<Journal>,
        fail: bool,
    }

    #[async_trait]
    impl DisplayRenderer for FakeDisplay {
        async fn render(&self, _: &ContributionData) -> Result<(), ServiceError> {
            Ok(())
        }
        async fn overlay_notification(&self, _: &PrEvent) -> Result<(), ServiceError> {
            Ok(())
        }
        async fn clear(&self) -> Result<(), ServiceError> {
            self.journal.push("clear");
            if self.fail {
                return Err(ServiceError::Display("spi bus gone".into()));
            }
            Ok(())
        }
    }

    struct FakeNetwork {
        journal: Arc<Journal>,
        hang: bool,
    }

    #[async_trait]
    impl NetworkManager for FakeNetwork {
        async fn start_hotspot(&self, _: &str, _: &str) -> Result<(), ServiceError> {
            Ok(())
        }
        async fn stop_hotspot(&self) -> Result<(), ServiceError> {
            self.journal.push("stop-hotspot");
            if self.hang {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    fn coordinator(fail_display: bool, hang_network: bool) -> (Arc<ShutdownCoordinator>, Arc<Journal>, Bus) {
        let journal = Arc::new(Journal::default());
        let bus = Bus::new(64);
        let coord = ShutdownCoordinator::new(
            Some(Arc::new(FakeDisplay {
                journal: journal.clone(),
                fail: fail_display,
            })),
            Some(Arc::new(FakeNetwork {
                journal: journal.clone(),
                hang: hang_network,
            })),
            ShutdownSignal::new(),
            bus.clone(),
            Some(Duration::from_secs(5)),
        );
        (Arc::new(coord), journal, bus)
    }

    #[tokio::test]
    async fn runs_steps_in_order_once() {
        let (coord, journal, bus) = coordinator(false, false);
        let mut rx = bus.subscribe();

        coord.shutdown().await;
        coord.shutdown().await;

        assert_eq!(journal.entries(), vec!["clear", "stop-hotspot"]);
        assert!(coord.is_complete());
        assert!(coord.signal.is_fired());
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::ShutdownComplete);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_run() {
        let (coord, journal, _bus) = coordinator(false, false);
        let a = tokio::spawn({
            let c = coord.clone();
            async move { c.shutdown().await }
        });
        let b = tokio::spawn({
            let c = coord.clone();
            async move { c.shutdown().await }
        });
        a.await.unwrap();
        b.await.unwrap();
        assert_eq!(journal.entries().len(), 2);
    }

    #[tokio::test]
    async fn failed_step_does_not_stop_later_steps() {
        let (coord, journal, bus) = coordinator(true, false);
        let mut rx = bus.subscribe();
        coord.shutdown().await;

        assert_eq!(journal.entries(), vec!["clear", "stop-hotspot"]);
        let failed = rx.try_recv().unwrap();
        assert_eq!(failed.kind, EventKind::TeardownStepFailed);
        assert_eq!(failed.task.as_deref(), Some("clear-display"));
        assert!(failed.reason.as_deref().unwrap().contains("spi bus gone"));
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::ShutdownComplete);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_step_is_bounded() {
        let (coord, _journal, bus) = coordinator(false, true);
        let mut rx = bus.subscribe();
        coord.shutdown().await;

        let failed = rx.try_recv().unwrap();
        assert_eq!(failed.task.as_deref(), Some("stop-hotspot"));
        assert!(failed.reason.as_deref().unwrap().starts_with("timed out"));
        assert!(coord.signal.is_fired());
    }
}
