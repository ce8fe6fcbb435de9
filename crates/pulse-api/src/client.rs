//! Collaborator REST endpoints
//!
//! The feed asks the backend a handful of questions; each maps to one
//! endpoint. A 304 on the list endpoint means "no new data", not an error.
//! The two sweep endpoints are idempotent server-side materializers: they
//! scan for newly-overdue tasks (or unread chat messages), create the
//! corresponding notification records, and report how many they created.

use crate::error::ApiError;
use crate::session::TokenStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_model::{Notification, NotificationId};
use serde::Deserialize;

/// Result shape of the materializing sweep endpoints.
#[derive(Debug, Deserialize)]
struct SweepResponse {
    #[serde(rename = "notificationsCreated")]
    notifications_created: u64,
}

/// REST surface of the collaborator's notification endpoints.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait FeedApi: Send + Sync {
    /// List notifications, optionally restricted to those created after
    /// `since`. Called with `None` for the authoritative full list.
    async fn list_notifications(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Notification>, ApiError>;

    /// Materialize notifications for newly-overdue tasks; returns how many
    /// records the sweep created.
    async fn check_overdue_tasks(&self) -> Result<u64, ApiError>;

    /// Materialize notifications for unread chat messages; returns how many
    /// records the sweep created.
    async fn check_new_messages(&self) -> Result<u64, ApiError>;

    /// Mark one notification read.
    async fn mark_read(&self, id: &NotificationId) -> Result<(), ApiError>;

    /// Mark every notification read.
    async fn mark_all_read(&self) -> Result<(), ApiError>;
}

/// reqwest-backed implementation of [`FeedApi`].
///
/// Every request reads the bearer token at call time, so a token cleared at
/// logout fails the next request instead of riding a stale copy.
#[derive(Debug, Clone)]
pub struct HttpFeedApi {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl HttpFeedApi {
    /// Create a client against `base_url` (no trailing slash needed).
    #[must_use]
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, tokens)
    }

    /// Create a client reusing an existing connection pool.
    #[must_use]
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: TokenStore,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn sweep(&self, path: &str) -> Result<u64, ApiError> {
        let token = self.tokens.require()?;
        let resp = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                status: resp.status().as_u16(),
            });
        }

        let body: SweepResponse = resp.json().await?;
        Ok(body.notifications_created)
    }

    async fn put_ok(&self, path: &str) -> Result<(), ApiError> {
        let token = self.tokens.require()?;
        let resp = self
            .http
            .put(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::Status {
                status: resp.status().as_u16(),
            })
        }
    }
}

#[async_trait]
impl FeedApi for HttpFeedApi {
    async fn list_notifications(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Notification>, ApiError> {
        let token = self.tokens.require()?;
        let mut req = self
            .http
            .get(self.url("/notifications"))
            .bearer_auth(token);
        if let Some(since) = since {
            req = req.query(&[("since", since.to_rfc3339())]);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.json().await?)
        } else if status == reqwest::StatusCode::NOT_MODIFIED {
            // The window held no new data; not a failure.
            Ok(Vec::new())
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
            })
        }
    }

    async fn check_overdue_tasks(&self) -> Result<u64, ApiError> {
        self.sweep("/notifications/check-overdue-tasks").await
    }

    async fn check_new_messages(&self) -> Result<u64, ApiError> {
        self.sweep("/notifications/check-new-messages").await
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        self.put_ok(&format!("/notifications/{id}/read")).await
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.put_ok("/notifications/read-all").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let api = HttpFeedApi::new("https://pulse.example.com/api/", TokenStore::new());
        assert_eq!(
            api.url("/notifications"),
            "https://pulse.example.com/api/notifications"
        );
    }

    #[test]
    fn sweep_response_uses_wire_name() {
        let body: SweepResponse =
            serde_json::from_str(r#"{"notificationsCreated": 3}"#).unwrap();
        assert_eq!(body.notifications_created, 3);
    }

    #[tokio::test]
    async fn calls_without_token_fail_fast() {
        let api = HttpFeedApi::new("https://pulse.example.com", TokenStore::new());

        let err = api.list_notifications(None).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingToken));

        let err = api.mark_all_read().await.unwrap_err();
        assert!(matches!(err, ApiError::MissingToken));
    }
}
