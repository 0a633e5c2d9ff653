//! REST gateway for PostgREST-style hosted databases.
//!
//! Rows live in a `bookmarks` table exposed at `{service_url}/rest/v1`.
//! Every request carries the public service key as `apikey`; the bearer
//! token is the signed-in user's access token when one is supplied, which
//! lets the service enforce owner-scoped row access.
//!
//! The change subscription is a polling feed: a background task re-fetches
//! the owner's rows every `poll_interval` and turns the difference between
//! two fetches into `Created`/`Deleted` events with [`diff_rows`].

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::gateway::{RemoteGateway, Subscription};
use async_trait::async_trait;
use markit_core::{Bookmark, BookmarkId, ChangeEvent, NewBookmark, OwnerId};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Path of the bookmarks table relative to the service URL.
pub const BOOKMARKS_PATH: &str = "/rest/v1/bookmarks";

/// Consecutive poll failures after which the feed reports a lost stream.
pub const MAX_POLL_FAILURES: u32 = 3;

/// HTTP gateway to the hosted bookmarks table.
#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    config: ServiceConfig,
    access_token: Option<String>,
}

impl RestGateway {
    /// Creates a gateway from an explicit service configuration.
    pub fn new(config: ServiceConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ServiceError::transport_fatal(format!("failed to create HTTP client: {e}"))
            })?;

        info!(url = %config.service_url, "initializing REST gateway");

        Ok(Self {
            client,
            config,
            access_token: None,
        })
    }

    /// Authenticates requests with the user's access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns the bookmarks table URL.
    pub fn table_url(&self) -> String {
        format!("{}{}", self.config.service_url, BOOKMARKS_PATH)
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let bearer = self
            .access_token
            .as_deref()
            .unwrap_or(&self.config.service_key);

        self.client
            .request(method, self.table_url())
            .header("apikey", &self.config.service_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }

    async fn send(&self, request: RequestBuilder) -> ServiceResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        check_status(response).await
    }

    async fn fetch_rows(&self, owner: &OwnerId) -> ServiceResult<Vec<Bookmark>> {
        let request = self.request(Method::GET).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{owner}")),
            ("order", "created_at.desc".to_string()),
        ]);
        let response = self.send(request).await?;

        response
            .json::<Vec<Bookmark>>()
            .await
            .map_err(|e| ServiceError::Decode(format!("failed to parse bookmarks: {e}")))
    }
}

#[async_trait]
impl RemoteGateway for RestGateway {
    async fn fetch_all(&self, owner: &OwnerId) -> ServiceResult<Vec<Bookmark>> {
        let rows = self.fetch_rows(owner).await?;
        debug!(owner = %owner, count = rows.len(), "fetched bookmarks");
        Ok(rows)
    }

    async fn create(&self, draft: &NewBookmark) -> ServiceResult<()> {
        let request = self
            .request(Method::POST)
            .header("Prefer", "return=minimal")
            .json(&[draft]);
        self.send(request).await?;
        Ok(())
    }

    async fn remove(&self, id: &BookmarkId) -> ServiceResult<()> {
        let request = self
            .request(Method::DELETE)
            .query(&[("id", format!("eq.{id}"))]);
        self.send(request).await?;
        Ok(())
    }

    async fn subscribe(&self, owner: &OwnerId) -> ServiceResult<Subscription> {
        let baseline = self.fetch_rows(owner).await?;
        let (tx, subscription) = Subscription::channel(owner.clone());

        let gateway = self.clone();
        let owner = owner.clone();
        tokio::spawn(async move {
            let interval = gateway.config.poll_interval;
            let mut known = baseline;
            let mut failures = 0u32;

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                match gateway.fetch_rows(&owner).await {
                    Ok(rows) => {
                        failures = 0;
                        for event in diff_rows(&known, &rows) {
                            if tx.send(event).is_err() {
                                return;
                            }
                        }
                        known = rows;
                    }
                    Err(e) => {
                        failures += 1;
                        warn!(owner = %owner, failures, "poll failed: {e}");
                        if failures >= MAX_POLL_FAILURES {
                            // dropping the sender ends the subscription
                            break;
                        }
                    }
                }
            }
            debug!(owner = %owner, "polling feed stopped");
        });

        Ok(subscription)
    }
}

/// Computes the change events that turn `before` into `after`.
///
/// Deletions come first, followed by creations oldest first, so applying
/// the events in order reproduces the insertion sequence.
pub fn diff_rows(before: &[Bookmark], after: &[Bookmark]) -> Vec<ChangeEvent> {
    let before_ids: HashSet<&BookmarkId> = before.iter().map(|b| &b.id).collect();
    let after_ids: HashSet<&BookmarkId> = after.iter().map(|b| &b.id).collect();

    let mut events: Vec<ChangeEvent> = before
        .iter()
        .filter(|b| !after_ids.contains(&b.id))
        .map(|b| ChangeEvent::deleted(b.id.clone()))
        .collect();

    let mut created: Vec<&Bookmark> = after
        .iter()
        .filter(|b| !before_ids.contains(&b.id))
        .collect();
    created.sort_by(|a, b| Bookmark::newest_first(b, a));
    events.extend(created.into_iter().cloned().map(ChangeEvent::Created));

    events
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_builder() {
        ServiceError::transport_fatal(e.to_string())
    } else {
        ServiceError::transport_retryable(e.to_string())
    }
}

async fn check_status(response: Response) -> ServiceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body))
}

fn status_error(status: StatusCode, body: String) -> ServiceError {
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Unauthorized(message),
        _ => ServiceError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(id: &str, secs: i64) -> Bookmark {
        Bookmark::new(
            id,
            OwnerId::new("alice"),
            id,
            format!("https://{id}.example"),
            Utc.timestamp_opt(secs, 0).unwrap(),
        )
    }

    #[test]
    fn diff_detects_creates_and_deletes() {
        let before = vec![row("b", 2), row("a", 1)];
        let after = vec![row("d", 4), row("c", 3), row("a", 1)];

        let events = diff_rows(&before, &after);
        assert_eq!(
            events,
            vec![
                ChangeEvent::deleted("b"),
                ChangeEvent::Created(row("c", 3)),
                ChangeEvent::Created(row("d", 4)),
            ]
        );
    }

    #[test]
    fn diff_of_identical_sets_is_empty() {
        let rows = vec![row("a", 1), row("b", 2)];
        assert!(diff_rows(&rows, &rows).is_empty());
        assert!(diff_rows(&[], &[]).is_empty());
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, r#"{"message":"JWT expired"}"#.into()),
            ServiceError::Unauthorized("JWT expired".into())
        );
        assert_eq!(
            status_error(StatusCode::CONFLICT, "duplicate".into()),
            ServiceError::Rejected {
                status: 409,
                message: "duplicate".into()
            }
        );
        assert!(status_error(StatusCode::BAD_GATEWAY, String::new()).is_retryable());
    }

    #[test]
    fn table_url_and_token() {
        let config = ServiceConfig::new("https://abc.example.co/", "anon").unwrap();
        let gateway = RestGateway::new(config).unwrap().with_access_token("jwt");

        assert_eq!(gateway.table_url(), "https://abc.example.co/rest/v1/bookmarks");
        assert_eq!(gateway.access_token.as_deref(), Some("jwt"));
        assert_eq!(gateway.config().service_key, "anon");
    }
}
