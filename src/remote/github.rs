//! GitHub implementation of [`RemoteClient`].
//!
//! - Contributions: GraphQL `contributionsCollection.contributionCalendar`.
//! - Pull-request activity: REST `GET /repos/{owner}/{repo}/events`, keeping
//!   `PullRequestEvent` and `PullRequestReviewEvent`.
//!
//! Repositories are fetched concurrently; each request is bounded by the client timeout.
//!
//! Rate limiting: a 403/429 with `x-ratelimit-remaining: 0` maps to
//! [`ServiceError::RateLimited`]; the poll loop's backoff handles the wait.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{ContributionData, ContributionDay, PrAction, PrEvent, RemoteClient};
use crate::error::ServiceError;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const EVENTS_PER_PAGE: u32 = 30;

const CONTRIBUTIONS_QUERY: &str = "query($login: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $login) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar { weeks { contributionDays { date contributionCount } } }
    }
  }
}";

/// Authenticated GitHub API client.
#[derive(Clone, Debug)]
pub struct GithubClient {
    http: Client,
    api_base: String,
}

impl GithubClient {
    /// Client against `api.github.com` using `token`.
    pub fn new(token: &str, request_timeout: Duration) -> Result<Self, ServiceError> {
        Self::with_base_url(token, DEFAULT_API_BASE, request_timeout)
    }

    /// Client against a custom API root (GitHub Enterprise, tests).
    pub fn with_base_url(
        token: &str,
        api_base: &str,
        request_timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ServiceError::Config("github_token contains invalid characters"))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("gitglow/", env!("CARGO_PKG_VERSION"))),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn repo_events(&self, repo: &str) -> Result<Vec<PrEvent>, ServiceError> {
        let url = format!("{}/repos/{repo}/events", self.api_base);
        let resp = self
            .http
            .get(&url)
            .query(&[("per_page", EVENTS_PER_PAGE)])
            .send()
            .await?;
        let raw: Vec<RawEvent> = check(resp).await?.json().await?;
        Ok(raw.into_iter().filter_map(RawEvent::into_pr_event).collect())
    }
}

#[async_trait]
impl RemoteClient for GithubClient {
    async fn fetch_contributions(
        &self,
        account: &str,
        window_weeks: u32,
    ) -> Result<ContributionData, ServiceError> {
        let to = Utc::now();
        let from = to - chrono::Duration::weeks(i64::from(window_weeks));
        let body = json!({
            "query": CONTRIBUTIONS_QUERY,
            "variables": { "login": account, "from": from.to_rfc3339(), "to": to.to_rfc3339() },
        });

        let resp = self
            .http
            .post(format!("{}/graphql", self.api_base))
            .json(&body)
            .send()
            .await?;
        let parsed: GraphqlResponse = check(resp).await?.json().await?;

        if let Some(err) = parsed.errors.and_then(|errs| errs.into_iter().next()) {
            return Err(ServiceError::Response(err.message));
        }
        let calendar = parsed
            .data
            .and_then(|d| d.user)
            .ok_or_else(|| ServiceError::Response(format!("unknown user {account}")))?
            .contributions_collection
            .contribution_calendar;

        let weeks = calendar
            .weeks
            .into_iter()
            .map(|w| {
                w.contribution_days
                    .into_iter()
                    .map(|d| ContributionDay {
                        date: d.date,
                        count: d.contribution_count,
                    })
                    .collect()
            })
            .collect();
        Ok(ContributionData {
            account: account.to_string(),
            weeks,
        })
    }

    async fn fetch_pr_events(&self, repos: &[String]) -> Result<Vec<PrEvent>, ServiceError> {
        // Concurrent, so one slow repository costs one request timeout, not the iteration.
        let results = join_all(repos.iter().map(|repo| self.repo_events(repo))).await;

        let mut events = Vec::new();
        let mut last_err = None;
        let mut succeeded = 0usize;
        for (repo, result) in repos.iter().zip(results) {
            match result {
                Ok(mut evs) => {
                    debug!(repo = %repo, count = evs.len(), "fetched pull-request events");
                    succeeded += 1;
                    events.append(&mut evs);
                }
                Err(e) => {
                    warn!(repo = %repo, error = %e, "failed to fetch repository events");
                    last_err = Some(e);
                }
            }
        }

        if succeeded == 0 {
            if let Some(e) = last_err {
                return Err(e);
            }
        }
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }
}

/// Maps non-success statuses to [`ServiceError`].
async fn check(resp: Response) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let header = |name: &str| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let exhausted = header("x-ratelimit-remaining").as_deref() == Some("0");
    if status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && exhausted) {
        let reset = header("x-ratelimit-reset").and_then(|v| v.parse().ok());
        return Err(ServiceError::RateLimited { reset });
    }

    let message = resp.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        message,
    })
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<GraphqlData>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct GraphqlData {
    user: Option<GraphqlUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlUser {
    contributions_collection: ContributionsCollection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}

#[derive(Deserialize)]
struct ContributionCalendar {
    weeks: Vec<CalendarWeek>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarWeek {
    contribution_days: Vec<CalendarDay>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarDay {
    date: NaiveDate,
    contribution_count: u32,
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    actor: RawActor,
    repo: RawRepo,
    payload: RawPayload,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawActor {
    login: String,
}

#[derive(Deserialize)]
struct RawRepo {
    name: String,
}

#[derive(Deserialize)]
struct RawPayload {
    action: Option<String>,
    number: Option<u64>,
    pull_request: Option<RawPullRequest>,
}

#[derive(Deserialize)]
struct RawPullRequest {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    merged: bool,
}

impl RawEvent {
    fn into_pr_event(self) -> Option<PrEvent> {
        let review = match self.kind.as_str() {
            "PullRequestEvent" => false,
            "PullRequestReviewEvent" => true,
            _ => return None,
        };
        let pr = self.payload.pull_request?;
        let action = match (review, self.payload.action.as_deref()) {
            (true, _) => PrAction::Reviewed,
            (false, Some("opened")) => PrAction::Opened,
            (false, Some("reopened")) => PrAction::Reopened,
            (false, Some("closed")) if pr.merged => PrAction::Merged,
            (false, Some("closed")) => PrAction::Closed,
            (false, Some("review_requested")) => PrAction::ReviewRequested,
            _ => PrAction::Other,
        };
        Some(PrEvent {
            id: self.id,
            repo: self.repo.name,
            action,
            number: self.payload.number.unwrap_or(pr.number),
            title: pr.title,
            actor: self.actor.login,
            created_at: self.created_at,
        })
    }
}
