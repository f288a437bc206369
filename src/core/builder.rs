use std::sync::Arc;

use super::config::SupervisorConfig;
use super::coordinator::ShutdownCoordinator;
use super::signal::ShutdownSignal;
use super::supervisor::Supervisor;
use crate::display::DisplayRenderer;
use crate::events::Bus;
use crate::network::NetworkManager;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for a [`Supervisor`] and the collaborators its shutdown path tears down.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    display: Option<Arc<dyn DisplayRenderer>>,
    network: Option<Arc<dyn NetworkManager>>,
    bus: Option<Bus>,
}

impl SupervisorBuilder {
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            display: None,
            network: None,
            bus: None,
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets a dedicated worker with a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Display cleared on shutdown.
    pub fn with_display(mut self, display: Arc<dyn DisplayRenderer>) -> Self {
        self.display = Some(display);
        self
    }

    /// Network manager whose hotspot is stopped on shutdown.
    pub fn with_network(mut self, network: Arc<dyn NetworkManager>) -> Self {
        self.network = Some(network);
        self
    }

    /// Publishes onto an existing bus instead of creating one.
    ///
    /// Lets components built before the supervisor (the mode controller, poll loops) share
    /// its event stream.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the supervisor and starts forwarding bus events to the subscribers.
    ///
    /// Must be called within a tokio runtime.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = self
            .bus
            .unwrap_or_else(|| Bus::new(self.cfg.bus_capacity_clamped()));
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let signal = ShutdownSignal::new();

        let coordinator = Arc::new(ShutdownCoordinator::new(
            self.display,
            self.network,
            signal.clone(),
            bus.clone(),
            self.cfg.step_timeout(),
        ));

        if !subs.is_empty() {
            subscriber_listener(&bus, Arc::clone(&subs));
        }
        Arc::new(Supervisor::new_internal(
            self.cfg,
            bus,
            signal,
            coordinator,
        ))
    }
}

/// Forwards bus events to the subscriber set until the bus closes.
fn subscriber_listener(bus: &Bus, set: Arc<SubscriberSet>) {
    use tokio::sync::broadcast::error::RecvError;

    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });
}
