//! Process wiring: settings, collaborators, mode, tasks, supervisor.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::core::{Supervisor, SupervisorConfig, TerminationReason, shutdown_signals};
use crate::display::{DisplayRenderer, MatrixDisplay};
use crate::events::Bus;
use crate::mode::{ModeController, OperatingMode, TaskContext, TaskSet};
use crate::network::{NetworkManager, NmcliHotspot};
use crate::remote::{GithubClient, RemoteClient};
use crate::settings::{Settings, SettingsStore};
use crate::subscribers::{LogWriter, StatusBoard, Subscribe};
use crate::web::WebState;

/// HTTP timeout when per-fetch timeouts are disabled.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Command-line choices for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Settings file; the per-user default when absent.
    pub config_path: Option<PathBuf>,
    /// Enter setup mode even when settings are complete.
    pub force_setup: bool,
    /// Listen address overriding the mode's port.
    pub bind: Option<SocketAddr>,
}

impl RunOptions {
    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(Settings::default_config_path)
    }
}

/// Per-request HTTP timeout: half the iteration budget, so a hung request fails on its own
/// before the whole poll iteration times out.
fn request_timeout(config: &SupervisorConfig) -> Duration {
    config
        .iteration_timeout()
        .map(|t| (t / 2).max(Duration::from_secs(1)))
        .unwrap_or(REQUEST_TIMEOUT)
}

/// Runs the appliance until shutdown and reports why it stopped.
///
/// # Errors
/// Only for failures before any task starts (an unusable GitHub token).
pub async fn run(opts: RunOptions) -> anyhow::Result<TerminationReason> {
    // Before any startup work, so an early SIGTERM still gets an ordered teardown.
    let signals = shutdown_signals();

    let store = Arc::new(SettingsStore::open(opts.config_path()));
    let mut settings = store.load().await;
    settings.apply_env();
    settings.sanitize();
    info!(
        path = %store.path().display(),
        configured = settings.is_configured(),
        "settings loaded"
    );

    let config = settings.supervisor_config();
    let bus = Bus::new(config.bus_capacity_clamped());

    let network: Arc<dyn NetworkManager> = Arc::new(NmcliHotspot::default());
    let display: Arc<dyn DisplayRenderer> = Arc::new(MatrixDisplay::new(
        settings.matrix_width,
        settings.matrix_height,
        settings.display_height,
        settings.led_brightness,
    ));
    let remote: Arc<dyn RemoteClient> = Arc::new(
        GithubClient::new(
            &settings.github_token,
            request_timeout(&config),
        )
        .context("creating GitHub client")?,
    );

    let status = Arc::new(StatusBoard::new());
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), status.clone()];

    let supervisor = Supervisor::builder(config.clone())
        .with_bus(bus.clone())
        .with_display(Arc::clone(&display))
        .with_network(Arc::clone(&network))
        .with_subscribers(subscribers)
        .build();

    let mode = ModeController::new(network, bus.clone())
        .with_hotspot_timeout(config.step_timeout())
        .decide(&settings, opts.force_setup)
        .await;

    let ctx = TaskContext {
        web: WebState {
            mode,
            settings: store,
            status,
            display: (mode == OperatingMode::Normal).then(|| Arc::clone(&display)),
        },
        settings,
        config,
        bus,
        remote,
        display,
        bind: opts.bind,
    };
    let set = TaskSet::for_mode(mode, &ctx);
    info!(mode = %set.mode, tasks = ?set.names(), "starting tasks");

    let reason = supervisor.run_until(set.tasks, signals).await;
    info!(%reason, code = reason.exit_code(), "gitglow stopped");
    Ok(reason)
}
