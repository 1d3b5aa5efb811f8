//! Entry Loader
//!
//! Fetches the entry for one date together with its comments and likes.
//! Loading never fails from the caller's point of view: gateway errors are
//! logged and degrade to an empty day.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::gateway::Gateway;
use crate::model::{Comment, Entry, EntryThread, Like};

/// Everything shown for one date
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDay {
    pub date: NaiveDate,
    pub entry: Option<Entry>,
    /// Oldest first
    pub comments: Vec<Comment>,
    pub likes: Vec<Like>,
}

impl LoadedDay {
    /// A date with no entry
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            entry: None,
            comments: Vec::new(),
            likes: Vec::new(),
        }
    }

    fn from_thread(date: NaiveDate, thread: EntryThread) -> Self {
        let mut comments = thread.comments;
        // Stable: rows with equal timestamps keep arrival order.
        comments.sort_by_key(|c| c.created_at);

        Self {
            date,
            entry: Some(thread.entry),
            comments,
            likes: thread.likes,
        }
    }

    pub fn has_entry(&self) -> bool {
        self.entry.is_some()
    }
}

/// Loads one day at a time from the gateway
#[derive(Clone)]
pub struct EntryLoader {
    gateway: Arc<dyn Gateway>,
}

impl EntryLoader {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Load the entry for `date`; any failure yields [`LoadedDay::empty`].
    pub async fn load(&self, date: NaiveDate) -> LoadedDay {
        tracing::debug!(date = %date.format("%Y-%m-%d"), "Loading entry");

        match self.gateway.entry_for_date(date).await {
            Ok(Some(thread)) => LoadedDay::from_thread(date, thread),
            Ok(None) => LoadedDay::empty(date),
            Err(e) => {
                tracing::error!(date = %date, error = %e, "Error fetching entry");
                LoadedDay::empty(date)
            }
        }
    }
}
