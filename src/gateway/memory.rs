//! In-memory gateway
//!
//! Holds rows in process and implements both gateway traits. Backs the
//! offline mode of the binaries and the behavior tests; call counters make
//! "no remote call was made" observable.

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{tables, AuthGateway, Gateway, GatewayError, GatewayResult};
use crate::model::{
    AuthUser, Comment, Entry, EntryThread, Like, NewComment, NewEntry, NewLike, Viewer,
};
use crate::session::SessionStore;

/// Account available in offline mode
pub const SAMPLE_EMAIL: &str = "reader@daybook.local";
pub const SAMPLE_PASSWORD: &str = "daybook";

#[derive(Default)]
struct Rows {
    entries: Vec<Entry>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
    /// email -> (password, user)
    users: HashMap<String, (String, AuthUser)>,
    signed_in: Option<AuthUser>,
}

/// Number of gateway calls by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub selects: usize,
    pub inserts: usize,
    pub deletes: usize,
}

impl CallCounts {
    /// Calls that would have written to the backend
    pub fn writes(&self) -> usize {
        self.inserts + self.deletes
    }
}

/// Gateway keeping its rows in memory
pub struct MemoryGateway {
    rows: Mutex<Rows>,
    session: SessionStore,
    selects: AtomicUsize,
    inserts: AtomicUsize,
    deletes: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryGateway {
    pub fn new(session: SessionStore) -> Self {
        Self {
            rows: Mutex::new(Rows::default()),
            session,
            selects: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Gateway holding the last three days and a sample account
    /// (`reader@daybook.local` / `daybook`)
    pub async fn with_sample_days(session: SessionStore) -> Self {
        let gateway = Self::new(session);
        let today = Local::now().date_naive();

        let samples = [
            (
                0,
                "Started the morning with a slow coffee and no plans. \
                 Wrote down three things worth remembering.",
                "calm",
            ),
            (
                1,
                "Long day, short walk. The light at six o'clock made up for most of it.",
                "tired",
            ),
            (
                2,
                "Finished the book I kept putting off. The ending was worth the wait.",
                "content",
            ),
        ];
        for (days_ago, content, mood) in samples {
            let date = today - Duration::days(days_ago);
            let entry = gateway.seed_entry(date, content, mood).await;
            if days_ago == 1 {
                gateway
                    .seed_comment(&entry, "sample-friend", "That six o'clock light is the best.")
                    .await;
            }
        }

        gateway.register_user(SAMPLE_EMAIL, SAMPLE_PASSWORD).await;
        gateway
    }

    /// Make every following data call fail as if the backend were down
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            selects: self.selects.load(Ordering::SeqCst),
            inserts: self.inserts.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }

    /// Store an entry directly, bypassing call accounting
    pub async fn seed_entry(
        &self,
        date: NaiveDate,
        content: impl Into<String>,
        mood: impl Into<String>,
    ) -> Entry {
        let entry = Entry {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            content: content.into(),
            mood: mood.into(),
            user_id: None,
            date,
        };
        self.rows.lock().await.entries.push(entry.clone());
        entry
    }

    /// Store a comment directly, bypassing call accounting
    pub async fn seed_comment(&self, entry: &Entry, user_id: &str, content: &str) -> Comment {
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            content: content.to_string(),
            entry_id: entry.id.clone(),
            user_id: user_id.to_string(),
        };
        self.rows.lock().await.comments.push(comment.clone());
        comment
    }

    /// Register an account that can sign in with a password
    pub async fn register_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        self.rows
            .lock()
            .await
            .users
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    /// Number of stored likes for an entry
    pub async fn like_count(&self, entry_id: &str) -> usize {
        self.rows
            .lock()
            .await
            .likes
            .iter()
            .filter(|like| like.entry_id == entry_id)
            .count()
    }

    fn check_available(&self) -> GatewayResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(GatewayError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn entry_for_date(&self, date: NaiveDate) -> GatewayResult<Option<EntryThread>> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let rows = self.rows.lock().await;
        let matching: Vec<&Entry> = rows.entries.iter().filter(|e| e.date == date).collect();

        let entry = match matching.as_slice() {
            [] => return Ok(None),
            [entry] => (*entry).clone(),
            many => {
                return Err(GatewayError::MultipleRows {
                    table: tables::ENTRIES,
                    count: many.len(),
                })
            }
        };

        let comments = rows
            .comments
            .iter()
            .filter(|c| c.entry_id == entry.id)
            .cloned()
            .collect();
        let likes = rows
            .likes
            .iter()
            .filter(|l| l.entry_id == entry.id)
            .cloned()
            .collect();

        Ok(Some(EntryThread {
            entry,
            comments,
            likes,
        }))
    }

    async fn insert_like(&self, like: &NewLike) -> GatewayResult<Like> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let row = Like {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            entry_id: like.entry_id.clone(),
            user_id: like.user_id.clone(),
        };
        self.rows.lock().await.likes.push(row.clone());
        Ok(row)
    }

    async fn delete_like(&self, like_id: &str) -> GatewayResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        // Deleting a missing row matches nothing and is not an error.
        self.rows.lock().await.likes.retain(|like| like.id != like_id);
        Ok(())
    }

    async fn insert_comment(&self, comment: &NewComment) -> GatewayResult<Comment> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let row = Comment {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            content: comment.content.clone(),
            entry_id: comment.entry_id.clone(),
            user_id: comment.user_id.clone(),
        };
        self.rows.lock().await.comments.push(row.clone());
        Ok(row)
    }

    async fn insert_entry(&self, entry: &NewEntry) -> GatewayResult<Entry> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let row = Entry {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            content: entry.content.clone(),
            mood: entry.mood.clone(),
            user_id: None,
            date: entry.date,
        };
        self.rows.lock().await.entries.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl AuthGateway for MemoryGateway {
    async fn current_user(&self) -> GatewayResult<Option<AuthUser>> {
        Ok(self.rows.lock().await.signed_in.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<AuthUser> {
        let user = {
            let mut rows = self.rows.lock().await;
            let user = match rows.users.get(email) {
                Some((stored, user)) if stored == password => user.clone(),
                _ => return Err(GatewayError::InvalidCredentials),
            };
            rows.signed_in = Some(user.clone());
            user
        };

        self.session.publish(Viewer::from(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        self.rows.lock().await.signed_in = None;
        self.session.publish(Viewer::Anonymous);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[tokio::test]
    async fn test_entry_for_date_embeds_relations() {
        let gateway = MemoryGateway::new(SessionStore::new());
        let entry = gateway.seed_entry(day(1), "May day", "bright").await;
        gateway.seed_entry(day(2), "Next", "tired").await;
        gateway.seed_comment(&entry, "u1", "first").await;

        let thread = gateway.entry_for_date(day(1)).await.unwrap().unwrap();
        assert_eq!(thread.entry, entry);
        assert_eq!(thread.comments.len(), 1);
        assert!(gateway.entry_for_date(day(3)).await.unwrap().is_none());
        assert_eq!(gateway.calls().selects, 2);
    }

    #[tokio::test]
    async fn test_duplicate_dates_are_an_error() {
        let gateway = MemoryGateway::new(SessionStore::new());
        gateway.seed_entry(day(1), "one", "a").await;
        gateway.seed_entry(day(1), "two", "b").await;

        let err = gateway.entry_for_date(day(1)).await.unwrap_err();
        assert!(matches!(err, GatewayError::MultipleRows { count: 2, .. }));
    }

    #[tokio::test]
    async fn test_sample_days() {
        let gateway = MemoryGateway::with_sample_days(SessionStore::new()).await;
        let today = Local::now().date_naive();

        assert!(gateway.entry_for_date(today).await.unwrap().is_some());
        let yesterday = gateway
            .entry_for_date(today - Duration::days(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(yesterday.comments.len(), 1);
        assert!(gateway
            .sign_in_with_password(SAMPLE_EMAIL, SAMPLE_PASSWORD)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_failing_gateway() {
        let gateway = MemoryGateway::new(SessionStore::new());
        gateway.set_failing(true);

        assert!(matches!(
            gateway.entry_for_date(day(1)).await,
            Err(GatewayError::Unavailable)
        ));
        assert_eq!(gateway.calls().selects, 1);
    }

    #[tokio::test]
    async fn test_password_sign_in_publishes_viewer() {
        let store = SessionStore::new();
        let gateway = MemoryGateway::new(store.clone());
        let user = gateway.register_user("reader@example.com", "pw").await;

        assert!(matches!(
            gateway.sign_in_with_password("reader@example.com", "nope").await,
            Err(GatewayError::InvalidCredentials)
        ));

        gateway.sign_in_with_password("reader@example.com", "pw").await.unwrap();
        assert_eq!(store.current().user_id(), Some(user.id.as_str()));
        assert_eq!(gateway.current_user().await.unwrap(), Some(user));

        gateway.sign_out().await.unwrap();
        assert_eq!(store.current(), Viewer::Anonymous);
    }
}
