//! Remote data source: contribution history and pull-request activity.
//!
//! [`RemoteClient`] is the seam the poll loops fetch through; [`GithubClient`] is the
//! production implementation. Both calls are plain reads and safe to retry.

mod github;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub use github::GithubClient;

/// Contributions recorded on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionDay {
    /// Calendar day.
    pub date: NaiveDate,
    /// Number of contributions.
    pub count: u32,
}

/// Contribution calendar for one account, oldest week first.
///
/// Each inner vector is one week starting on Sunday; the first and last weeks may be partial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionData {
    /// Account the calendar belongs to.
    pub account: String,
    /// Weeks of days.
    pub weeks: Vec<Vec<ContributionDay>>,
}

impl ContributionData {
    /// Sum over all days.
    pub fn total(&self) -> u64 {
        self.days().map(|d| u64::from(d.count)).sum()
    }

    /// Highest single-day count (0 for an empty calendar).
    pub fn max_count(&self) -> u32 {
        self.days().map(|d| d.count).max().unwrap_or(0)
    }

    fn days(&self) -> impl Iterator<Item = &ContributionDay> {
        self.weeks.iter().flatten()
    }
}

/// Kind of pull-request activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    Opened,
    Reopened,
    Closed,
    Merged,
    ReviewRequested,
    Reviewed,
    Other,
}

/// One pull-request event on a monitored repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrEvent {
    /// Remote event id; unique per event.
    pub id: String,
    /// `owner/name` of the repository.
    pub repo: String,
    /// What happened.
    pub action: PrAction,
    /// Pull request number.
    pub number: u64,
    /// Pull request title.
    pub title: String,
    /// Login of the user who triggered the event.
    pub actor: String,
    /// When the event happened.
    pub created_at: DateTime<Utc>,
}

/// Read access to the remote service.
#[async_trait]
pub trait RemoteClient: Send + Sync + 'static {
    /// Contribution calendar of `account` covering the last `window_weeks` weeks.
    async fn fetch_contributions(
        &self,
        account: &str,
        window_weeks: u32,
    ) -> Result<ContributionData, ServiceError>;

    /// Recent pull-request events across `repos`, oldest first.
    async fn fetch_pr_events(&self, repos: &[String]) -> Result<Vec<PrEvent>, ServiceError>;
}
