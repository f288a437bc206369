//! Fetch and sink halves wiring the remote client and the display into poll streams.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::display::DisplayRenderer;
use crate::error::ServiceError;
use crate::poll::{Fetch, Sink};
use crate::remote::{ContributionData, PrEvent, RemoteClient};

/// Ids remembered by [`NotificationSink`].
const SEEN_CAPACITY: usize = 256;

/// Contribution calendar of one account.
pub struct ContributionsFetch {
    remote: Arc<dyn RemoteClient>,
    account: String,
    weeks: u32,
}

impl ContributionsFetch {
    pub fn new(remote: Arc<dyn RemoteClient>, account: impl Into<String>, weeks: u32) -> Self {
        Self {
            remote,
            account: account.into(),
            weeks,
        }
    }
}

#[async_trait]
impl Fetch<ContributionData> for ContributionsFetch {
    async fn fetch(&self) -> Result<ContributionData, ServiceError> {
        self.remote
            .fetch_contributions(&self.account, self.weeks)
            .await
    }
}

/// Pull-request events across the monitored repositories.
pub struct PrEventsFetch {
    remote: Arc<dyn RemoteClient>,
    repos: Vec<String>,
}

impl PrEventsFetch {
    pub fn new(remote: Arc<dyn RemoteClient>, repos: Vec<String>) -> Self {
        Self { remote, repos }
    }
}

#[async_trait]
impl Fetch<Vec<PrEvent>> for PrEventsFetch {
    async fn fetch(&self) -> Result<Vec<PrEvent>, ServiceError> {
        self.remote.fetch_pr_events(&self.repos).await
    }
}

/// Paints every fetched calendar.
pub struct RenderSink {
    display: Arc<dyn DisplayRenderer>,
}

impl RenderSink {
    pub fn new(display: Arc<dyn DisplayRenderer>) -> Self {
        Self { display }
    }
}

#[async_trait]
impl Sink<ContributionData> for RenderSink {
    async fn sink(&self, item: ContributionData) -> Result<(), ServiceError> {
        self.display.render(&item).await
    }
}

/// Overlays each pull-request event once, oldest first.
///
/// Remembers the last [`SEEN_CAPACITY`] event ids; an id is marked seen only after its
/// overlay succeeded, so a failed overlay is retried on the next poll.
pub struct NotificationSink {
    display: Arc<dyn DisplayRenderer>,
    seen: Mutex<Seen>,
}

#[derive(Default)]
struct Seen {
    order: VecDeque<String>,
    ids: HashSet<String>,
}

impl Seen {
    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn insert(&mut self, id: String) {
        if !self.ids.insert(id.clone()) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > SEEN_CAPACITY {
            if let Some(old) = self.order.pop_front() {
                self.ids.remove(&old);
            }
        }
    }
}

impl NotificationSink {
    pub fn new(display: Arc<dyn DisplayRenderer>) -> Self {
        Self {
            display,
            seen: Mutex::new(Seen::default()),
        }
    }
}

#[async_trait]
impl Sink<Vec<PrEvent>> for NotificationSink {
    async fn sink(&self, item: Vec<PrEvent>) -> Result<(), ServiceError> {
        let mut seen = self.seen.lock().await;
        for event in item {
            if seen.contains(&event.id) {
                continue;
            }
            self.display.overlay_notification(&event).await?;
            debug!(repo = %event.repo, number = event.number, action = ?event.action, "notified");
            seen.insert(event.id);
        }
        Ok(())
    }
}
