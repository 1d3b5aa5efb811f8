//! Auth API client
//!
//! Password sign-in, token refresh, sign-out and current-user lookup against
//! `/auth/v1`. Every change of session is published to the injected
//! [`SessionStore`] and, when configured, remembered in a small JSON file
//! (owner-only permissions) so a later run starts signed in.
//!
//! Access tokens are short-lived. A token close to expiry is refreshed
//! before it is used; a token the backend rejects is refreshed once, and
//! when that fails the session ends and the viewer becomes anonymous.
//!
//! [`SessionStore`]: crate::session::SessionStore

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::rest::RestGateway;
use super::{AuthGateway, GatewayError, GatewayResult};
use crate::model::{AuthUser, Viewer};

/// Refresh this many seconds before the access token expires
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    expires_in: Option<i64>,
    /// Unix seconds
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> (StoredSession, AuthUser) {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now + secs));
        let session = StoredSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        };
        (session, self.user)
    }
}

/// Tokens of the signed-in user, as kept in memory and in the session file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct StoredSession {
    pub(super) access_token: String,
    #[serde(default)]
    pub(super) refresh_token: Option<String>,
    /// Unix seconds
    #[serde(default)]
    pub(super) expires_at: Option<i64>,
}

impl StoredSession {
    fn expires_soon(&self, now: i64) -> bool {
        self.expires_at
            .map_or(false, |at| at - now <= REFRESH_MARGIN_SECS)
    }
}

/// Status codes meaning "this token is not accepted"
pub(super) fn is_auth_rejection(status: u16) -> bool {
    status == StatusCode::UNAUTHORIZED.as_u16() || status == StatusCode::FORBIDDEN.as_u16()
}

pub(super) fn read_session_file(path: &Path) -> Option<StoredSession> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<StoredSession>(&content) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!("Ignoring unreadable session file {:?}: {}", path, e);
            None
        }
    }
}

/// Write the session readable by the owner only
async fn write_session_file(path: &Path, session: &StoredSession) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let body = serde_json::to_vec(session)?;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    // An existing file keeps its old mode on open.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }
    file.write_all(&body).await?;
    file.flush().await
}

async fn remove_session_file(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl RestGateway {
    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.config.base_url(), endpoint)
    }

    fn session_path(&self) -> Option<PathBuf> {
        self.config.session_file.as_ref().map(PathBuf::from)
    }

    async fn remember(&self, session: Option<StoredSession>) {
        if let Some(path) = self.session_path() {
            let result = match &session {
                Some(session) => write_session_file(&path, session).await,
                None => remove_session_file(&path).await,
            };
            if let Err(e) = result {
                tracing::warn!("Could not update session file {:?}: {}", path, e);
            }
        }

        *self.tokens.write().await = session;
    }

    /// Whether a user token is currently held
    pub async fn has_session(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    /// Access token of the signed-in user
    pub(super) async fn user_token(&self) -> Option<String> {
        self.tokens
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    /// Forget the stored session and publish an anonymous viewer
    pub(super) async fn end_session(&self) {
        self.remember(None).await;
        self.session.publish(Viewer::Anonymous);
    }

    async fn request_token<B: Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> GatewayResult<Response> {
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.config.anon_key)
            .json(body);

        self.send(request).await
    }

    async fn store_grant(&self, response: Response) -> GatewayResult<AuthUser> {
        let grant: TokenResponse = Self::decode(response).await?;
        let (session, user) = grant.into_session(Utc::now().timestamp());
        self.remember(Some(session)).await;
        self.session.publish(Viewer::from(user.clone()));
        Ok(user)
    }

    /// Trade the refresh token for a new access token.
    ///
    /// A missing or rejected refresh token is [`GatewayError::SessionExpired`].
    pub(super) async fn refresh_session(&self) -> GatewayResult<AuthUser> {
        let refresh_token = self
            .tokens
            .read()
            .await
            .as_ref()
            .and_then(|session| session.refresh_token.clone())
            .ok_or(GatewayError::SessionExpired)?;

        let grant = RefreshGrant {
            refresh_token: &refresh_token,
        };
        let response = match self.request_token("refresh_token", &grant).await {
            Ok(response) => response,
            Err(GatewayError::ApiError { status, .. })
                if status == StatusCode::BAD_REQUEST.as_u16() || is_auth_rejection(status) =>
            {
                return Err(GatewayError::SessionExpired);
            }
            Err(e) => return Err(e),
        };

        let user = self.store_grant(response).await?;
        tracing::info!(user_id = %user.id, "Session refreshed");
        Ok(user)
    }

    /// Refresh a token that is about to expire.
    ///
    /// An expired session ends here; transport failures keep the token and
    /// leave it to the request that follows.
    pub(super) async fn ensure_fresh(&self) {
        let expiring = match self.tokens.read().await.as_ref() {
            Some(session) => session.expires_soon(Utc::now().timestamp()),
            None => false,
        };
        if !expiring {
            return;
        }

        match self.refresh_session().await {
            Ok(_) => {}
            Err(GatewayError::SessionExpired) => {
                tracing::info!("Session expired, continuing anonymously");
                self.end_session().await;
            }
            Err(e) => tracing::warn!(error = %e, "Could not refresh session"),
        }
    }
}

#[async_trait]
impl AuthGateway for RestGateway {
    async fn current_user(&self) -> GatewayResult<Option<AuthUser>> {
        self.ensure_fresh().await;
        let token = match self.user_token().await {
            Some(token) => token,
            None => return Ok(None),
        };

        let request = self
            .client
            .get(self.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token);

        match self.send(request).await {
            Ok(response) => Ok(Some(Self::decode(response).await?)),
            Err(GatewayError::ApiError { status, .. }) if is_auth_rejection(status) => {
                match self.refresh_session().await {
                    Ok(user) => Ok(Some(user)),
                    Err(e) => {
                        tracing::info!(error = %e, "Stored session is no longer valid");
                        self.end_session().await;
                        Ok(None)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<AuthUser> {
        let response = match self
            .request_token("password", &PasswordGrant { email, password })
            .await
        {
            Ok(response) => response,
            Err(GatewayError::ApiError { status, .. })
                if status == StatusCode::BAD_REQUEST.as_u16()
                    || status == StatusCode::UNAUTHORIZED.as_u16() =>
            {
                return Err(GatewayError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let user = self.store_grant(response).await?;
        tracing::info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        let result = match self.user_token().await {
            Some(token) => {
                let request = self
                    .client
                    .post(self.auth_url("logout"))
                    .header("apikey", &self.config.anon_key)
                    .bearer_auth(token);
                self.send(request).await.map(|_| ())
            }
            None => Ok(()),
        };

        // The local session ends even when the remote call fails.
        self.end_session().await;
        tracing::info!("Signed out");
        result
    }
}
