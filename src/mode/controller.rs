use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{error, info};

use super::{OperatingMode, select_mode};
use crate::error::ServiceError;
use crate::events::{Bus, Event, EventKind};
use crate::network::NetworkManager;
use crate::settings::Settings;

/// Decides the operating mode once at startup.
pub struct ModeController {
    network: Arc<dyn NetworkManager>,
    bus: Bus,
    hotspot_timeout: Option<Duration>,
}

impl ModeController {
    pub fn new(network: Arc<dyn NetworkManager>, bus: Bus) -> Self {
        Self {
            network,
            bus,
            hotspot_timeout: None,
        }
    }

    /// Bounds the hotspot start; `None` waits as long as the network manager takes.
    pub fn with_hotspot_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.hotspot_timeout = timeout;
        self
    }

    /// Picks the mode and, for setup, raises the hotspot before any task starts.
    ///
    /// `force_setup` selects setup regardless of the settings; stored settings are kept.
    /// A hotspot failure is logged and setup continues, so the configuration server stays
    /// reachable over any existing network.
    pub async fn decide(&self, settings: &Settings, force_setup: bool) -> OperatingMode {
        let mode = if force_setup {
            OperatingMode::Setup
        } else {
            select_mode(settings)
        };

        if mode == OperatingMode::Setup {
            let start = self
                .network
                .start_hotspot(&settings.setup_ssid, &settings.setup_password);
            let res = match self.hotspot_timeout {
                Some(limit) => time::timeout(limit, start).await.unwrap_or_else(|_| {
                    Err(ServiceError::Network(format!(
                        "hotspot start timed out after {limit:?}"
                    )))
                }),
                None => start.await,
            };
            match res {
                Ok(()) => info!(ssid = %settings.setup_ssid, "setup hotspot up"),
                Err(e) => error!(error = %e, label = e.as_label(), "failed to start setup hotspot"),
            }
        }

        info!(mode = %mode, forced = force_setup, "operating mode selected");
        self.bus
            .publish(Event::new(EventKind::ModeSelected).with_reason(mode.as_str()));
        mode
    }
}
