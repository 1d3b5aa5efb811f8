//! # Daybook
//!
//! A date-indexed journal reader for "Daily Reflections". One entry per
//! calendar day lives in a hosted backend; readers step through the days,
//! and signed-in readers like entries and leave comments.
//!
//! ## Modules
//!
//! - [`gateway`]: contract with the hosted backend, REST and in-memory implementations
//! - [`session`]: observable viewer identity
//! - [`journal`]: date cursor, per-day loading, likes and comments, view state
//! - [`share`]: native share with clipboard fallback
//! - [`render`] and [`shell`]: the terminal presentation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use daybook::{Backend, Journal, SessionStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = SessionStore::new();
//!     let backend = Backend::offline(&session).await;
//!     session.resolve_initial(backend.auth.as_ref()).await;
//!
//!     let mut journal = Journal::open(
//!         backend.data.clone(),
//!         &session,
//!         chrono::Local::now().date_naive(),
//!     )
//!     .await;
//!     journal.previous_day().await;
//!
//!     println!("{}", daybook::render::render_home(&journal));
//!     journal.close();
//! }
//! ```

pub mod config;
pub mod gateway;
pub mod journal;
pub mod logging;
pub mod model;
pub mod render;
pub mod session;
pub mod share;
pub mod shell;

pub use config::{AboutConfig, AboutStat, Config, ConfigError, GatewayConfig, LoggingConfig, ShareConfig};

pub use gateway::{
    AuthGateway, Backend, Gateway, GatewayError, GatewayResult, MemoryGateway, RestGateway,
};

pub use journal::{
    CommentOutcome, DateCursor, EntryLoader, Journal, LikeOutcome, LoadedDay, MonthGrid, Page,
    SocialHandler,
};

pub use model::{AuthUser, Comment, Entry, EntryThread, Like, Viewer};

pub use session::{SessionStore, SessionSubscription};

pub use share::{SharePayload, ShareOutcome, Sharer};

pub use shell::{Command, Reply, Shell};
