//! REST Gateway Client
//!
//! HTTP client for the hosted row API (`/rest/v1/<table>`).
//! Filters use the `column=eq.value` convention; inserts ask for the
//! stored row back with `Prefer: return=representation`.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::RwLock;

use super::auth::{is_auth_rejection, read_session_file, StoredSession};
use super::{tables, Gateway, GatewayError, GatewayResult};
use crate::config::GatewayConfig;
use crate::model::{Comment, Entry, EntryThread, Like, NewComment, NewEntry, NewLike};
use crate::session::SessionStore;

/// Embedded select used for the day view
const ENTRY_THREAD_SELECT: &str = "*,comments(*),likes(*)";

/// Client for the hosted data and auth APIs
pub struct RestGateway {
    pub(super) client: Client,
    pub(super) config: GatewayConfig,
    /// Tokens of the signed-in user, if any
    pub(super) tokens: RwLock<Option<StoredSession>>,
    pub(super) session: SessionStore,
}

impl RestGateway {
    /// Create a client; a token remembered in `session_file` is picked up.
    pub fn new(config: GatewayConfig, session: SessionStore) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        let remembered = config
            .session_file
            .as_ref()
            .and_then(|path| read_session_file(&PathBuf::from(path)));

        Ok(Self {
            client,
            config,
            tokens: RwLock::new(remembered),
            session,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub(super) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url(), table)
    }

    /// Attach the API key and the bearer token (user token or anon key)
    fn authorized(&self, builder: RequestBuilder, user_token: Option<&str>) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(user_token.unwrap_or(&self.config.anon_key))
    }

    /// Send a data request as the current viewer.
    ///
    /// A rejected user token is refreshed once. When the refresh fails the
    /// session ends and the request is repeated with the anon key, so
    /// readable rows stay readable.
    async fn send_as_viewer<F>(&self, build: F) -> GatewayResult<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        self.ensure_fresh().await;
        let token = self.user_token().await;
        let result = self.send(self.authorized(build(), token.as_deref())).await;

        match result {
            Err(GatewayError::ApiError { status, .. })
                if token.is_some() && is_auth_rejection(status) =>
            {
                tracing::info!(status, "Access token rejected, refreshing session");
                if let Err(e) = self.refresh_session().await {
                    tracing::warn!(error = %e, "Session refresh failed, continuing anonymously");
                    self.end_session().await;
                }

                let token = self.user_token().await;
                self.send(self.authorized(build(), token.as_deref())).await
            }
            other => other,
        }
    }

    /// Send a request and turn non-2xx responses into errors
    pub(super) async fn send(&self, builder: RequestBuilder) -> GatewayResult<Response> {
        let response = builder.send().await.map_err(GatewayError::from_transport)?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(GatewayError::ApiError {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    /// Read a JSON body
    pub(super) async fn decode<T: DeserializeOwned>(response: Response) -> GatewayResult<T> {
        let body = response.text().await.map_err(GatewayError::from_transport)?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn insert_row<B, T>(&self, table: &'static str, body: &B) -> GatewayResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.rest_url(table);
        let response = self
            .send_as_viewer(|| {
                self.client
                    .post(&url)
                    .header("Prefer", "return=representation")
                    .json(body)
            })
            .await?;
        let rows: Vec<T> = Self::decode(response).await?;

        rows.into_iter()
            .next()
            .ok_or(GatewayError::EmptyResponse(table))
    }
}

#[async_trait]
impl Gateway for RestGateway {
    async fn entry_for_date(&self, date: NaiveDate) -> GatewayResult<Option<EntryThread>> {
        let filter = format!("eq.{}", date.format("%Y-%m-%d"));
        tracing::debug!(date = %filter, "Fetching entry");

        let url = self.rest_url(tables::ENTRIES);
        let response = self
            .send_as_viewer(|| {
                self.client.get(&url).query(&[
                    ("select", ENTRY_THREAD_SELECT),
                    ("date", filter.as_str()),
                    ("comments.order", "created_at.asc"),
                ])
            })
            .await?;
        let mut rows: Vec<EntryThread> = Self::decode(response).await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            count => Err(GatewayError::MultipleRows {
                table: tables::ENTRIES,
                count,
            }),
        }
    }

    async fn insert_like(&self, like: &NewLike) -> GatewayResult<Like> {
        self.insert_row(tables::LIKES, like).await
    }

    async fn delete_like(&self, like_id: &str) -> GatewayResult<()> {
        let filter = format!("eq.{}", like_id);
        let url = self.rest_url(tables::LIKES);
        self.send_as_viewer(|| self.client.delete(&url).query(&[("id", filter.as_str())]))
            .await?;
        Ok(())
    }

    async fn insert_comment(&self, comment: &NewComment) -> GatewayResult<Comment> {
        self.insert_row(tables::COMMENTS, comment).await
    }

    async fn insert_entry(&self, entry: &NewEntry) -> GatewayResult<Entry> {
        self.insert_row(tables::ENTRIES, entry).await
    }
}
