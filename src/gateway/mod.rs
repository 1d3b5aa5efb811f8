//! Remote Data Gateway
//!
//! The hosted backend is consumed, never re-implemented. Two traits describe
//! the contract this client needs from it:
//!
//! - [`Gateway`]: row-filtered select/insert/delete over `entries`,
//!   `comments` and `likes`
//! - [`AuthGateway`]: current-session lookup plus password sign-in/sign-out
//!
//! ## Implementations
//!
//! - [`RestGateway`]: HTTP client for the hosted REST and auth APIs
//! - [`MemoryGateway`]: in-process rows, used by tests and offline mode

mod auth;
mod memory;
mod rest;

pub use memory::{CallCounts, MemoryGateway, SAMPLE_EMAIL, SAMPLE_PASSWORD};
pub use rest::RestGateway;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::model::{AuthUser, Comment, Entry, EntryThread, Like, NewComment, NewEntry, NewLike};
use crate::session::SessionStore;

/// Table and column names shared by every implementation
pub mod tables {
    pub const ENTRIES: &str = "entries";
    pub const COMMENTS: &str = "comments";
    pub const LIKES: &str = "likes";
}

/// Data access contract
#[async_trait]
pub trait Gateway: Send + Sync {
    /// The entry whose `date` equals `date`, with its comments and likes.
    ///
    /// Zero rows is `Ok(None)`; more than one row is an error.
    async fn entry_for_date(&self, date: NaiveDate) -> GatewayResult<Option<EntryThread>>;

    async fn insert_like(&self, like: &NewLike) -> GatewayResult<Like>;

    async fn delete_like(&self, like_id: &str) -> GatewayResult<()>;

    async fn insert_comment(&self, comment: &NewComment) -> GatewayResult<Comment>;

    async fn insert_entry(&self, entry: &NewEntry) -> GatewayResult<Entry>;
}

/// Authentication contract
///
/// Implementations publish every sign-in and sign-out to the
/// [`SessionStore`](crate::session::SessionStore) they were built with.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// User behind the current session, `None` when there is no session
    async fn current_user(&self) -> GatewayResult<Option<AuthUser>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<AuthUser>;

    async fn sign_out(&self) -> GatewayResult<()>;
}

/// Both halves of one backend, as the views consume them
#[derive(Clone)]
pub struct Backend {
    pub data: Arc<dyn Gateway>,
    pub auth: Arc<dyn AuthGateway>,
}

impl Backend {
    pub fn new<G>(gateway: Arc<G>) -> Self
    where
        G: Gateway + AuthGateway + 'static,
    {
        Self {
            data: gateway.clone(),
            auth: gateway,
        }
    }

    /// The hosted backend described by `config`
    pub fn remote(config: &GatewayConfig, session: &SessionStore) -> GatewayResult<Self> {
        tracing::info!(url = %config.base_url(), "Using hosted gateway");
        let gateway = RestGateway::new(config.clone(), session.clone())?;
        Ok(Self::new(Arc::new(gateway)))
    }

    /// In-process backend with a few sample days
    pub async fn offline(session: &SessionStore) -> Self {
        tracing::info!("Using offline sample data");
        let gateway = MemoryGateway::with_sample_days(session.clone()).await;
        Self::new(Arc::new(gateway))
    }
}

/// Errors that can occur when talking to the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Gateway unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Expected at most one row from {table}, got {count}")]
    MultipleRows { table: &'static str, count: usize },

    #[error("No row returned from {0}")]
    EmptyResponse(&'static str),

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Session expired")]
    SessionExpired,
}

impl GatewayError {
    /// Map a transport error the way every caller wants it classified
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else if e.is_connect() {
            GatewayError::Unavailable
        } else {
            GatewayError::Request(e)
        }
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
