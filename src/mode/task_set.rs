use std::net::SocketAddr;
use std::sync::Arc;

use super::OperatingMode;
use super::adapters::{ContributionsFetch, NotificationSink, PrEventsFetch, RenderSink};
use crate::core::SupervisorConfig;
use crate::display::DisplayRenderer;
use crate::events::Bus;
use crate::poll::{PollLoop, PollStream, StreamId};
use crate::remote::RemoteClient;
use crate::settings::Settings;
use crate::tasks::TaskRef;
use crate::web::{self, WebServerTask, WebState};

/// Everything needed to build the tasks of either mode.
pub struct TaskContext {
    pub settings: Settings,
    pub config: SupervisorConfig,
    pub bus: Bus,
    pub remote: Arc<dyn RemoteClient>,
    pub display: Arc<dyn DisplayRenderer>,
    pub web: WebState,
    /// Overrides the mode's default listen address.
    pub bind: Option<SocketAddr>,
}

/// Tasks started for one operating mode.
pub struct TaskSet {
    pub mode: OperatingMode,
    pub tasks: Vec<TaskRef>,
}

impl TaskSet {
    /// - Setup: configuration web server only.
    /// - Normal: contributions loop, pr-events loop, web server.
    pub fn for_mode(mode: OperatingMode, ctx: &TaskContext) -> Self {
        let tasks = match mode {
            OperatingMode::Setup => vec![web_task(ctx, ctx.settings.setup_addr())],
            OperatingMode::Normal => vec![
                contributions_task(ctx),
                pr_events_task(ctx),
                web_task(ctx, ctx.settings.web_addr()),
            ],
        };
        Self { mode, tasks }
    }

    /// Task names, in start order.
    pub fn names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }
}

fn web_task(ctx: &TaskContext, default_addr: SocketAddr) -> TaskRef {
    Arc::new(WebServerTask::new(
        ctx.bind.unwrap_or(default_addr),
        web::router(ctx.web.clone()),
    ))
}

fn contributions_task(ctx: &TaskContext) -> TaskRef {
    let policy = ctx.settings.interval_policy();
    let fetch = ContributionsFetch::new(
        Arc::clone(&ctx.remote),
        ctx.settings.github_username.trim(),
        ctx.settings.contribution_weeks,
    );
    let mut stream = PollStream::new(
        StreamId::Contributions,
        Arc::new(fetch),
        Arc::new(RenderSink::new(Arc::clone(&ctx.display))),
        policy.contributions_interval,
    )
    .with_adaptive(policy);
    if let Some(t) = ctx.config.iteration_timeout() {
        stream = stream.with_timeout(t);
    }
    Arc::new(PollLoop::new(stream, ctx.bus.clone(), ctx.config.backoff))
}

fn pr_events_task(ctx: &TaskContext) -> TaskRef {
    let policy = ctx.settings.interval_policy();
    let fetch = PrEventsFetch::new(Arc::clone(&ctx.remote), ctx.settings.repositories());
    let mut stream = PollStream::new(
        StreamId::PrEvents,
        Arc::new(fetch),
        Arc::new(NotificationSink::new(Arc::clone(&ctx.display))),
        policy.off_hours_interval,
    )
    .with_adaptive(policy);
    if let Some(t) = ctx.config.iteration_timeout() {
        stream = stream.with_timeout(t);
    }
    Arc::new(PollLoop::new(stream, ctx.bus.clone(), ctx.config.backoff))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::display::MatrixDisplay;
    use crate::error::ServiceError;
    use crate::remote::{ContributionData, PrEvent};
    use crate::settings::SettingsStore;
    use crate::subscribers::StatusBoard;

    struct Offline;

    #[async_trait]
    impl RemoteClient for Offline {
        async fn fetch_contributions(
            &self,
            _account: &str,
            _window_weeks: u32,
        ) -> Result<ContributionData, ServiceError> {
            Err(ServiceError::Request("offline".into()))
        }
        async fn fetch_pr_events(&self, _repos: &[String]) -> Result<Vec<PrEvent>, ServiceError> {
            Err(ServiceError::Request("offline".into()))
        }
    }

    fn ctx(mode: OperatingMode) -> TaskContext {
        let display: Arc<dyn DisplayRenderer> = Arc::new(MatrixDisplay::new(32, 8, 7, 128));
        TaskContext {
            settings: Settings::default(),
            config: SupervisorConfig::default(),
            bus: Bus::new(16),
            remote: Arc::new(Offline),
            display: display.clone(),
            web: WebState {
                mode,
                settings: Arc::new(SettingsStore::new("/nonexistent/config.toml", Settings::default())),
                status: Arc::new(StatusBoard::new()),
                display: Some(display),
            },
            bind: None,
        }
    }

    #[test]
    fn setup_runs_only_the_web_server() {
        let set = TaskSet::for_mode(OperatingMode::Setup, &ctx(OperatingMode::Setup));
        assert_eq!(set.names(), vec!["web"]);
    }

    #[test]
    fn normal_runs_both_pollers_and_web() {
        let set = TaskSet::for_mode(OperatingMode::Normal, &ctx(OperatingMode::Normal));
        assert_eq!(set.names(), vec!["contributions", "pr-events", "web"]);
        assert_eq!(set.mode, OperatingMode::Normal);
    }
}
