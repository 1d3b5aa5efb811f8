//! Journal Data Model
//!
//! Row types for the three gateway collections (`entries`, `comments`,
//! `likes`), the insert payloads sent to it, and the viewer identity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Mood label given to entries published from this client
pub const DEFAULT_MOOD: &str = "neutral";

/// One day's journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    /// Free-form mood label
    pub mood: String,
    /// Owning user; entries published without a session carry none
    #[serde(default)]
    pub user_id: Option<String>,
    /// Calendar date (`YYYY-MM-DD` on the wire)
    pub date: NaiveDate,
}

/// A comment on an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub entry_id: String,
    pub user_id: String,
}

/// A like on an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub entry_id: String,
    pub user_id: String,
}

/// An entry together with its embedded comments and likes,
/// as returned by `select=*,comments(*),likes(*)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntryThread {
    #[serde(flatten)]
    pub entry: Entry,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub likes: Vec<Like>,
}

/// Insert payload for `likes`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLike {
    pub entry_id: String,
    pub user_id: String,
}

/// Insert payload for `comments`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewComment {
    pub content: String,
    pub entry_id: String,
    pub user_id: String,
}

/// Insert payload for `entries`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEntry {
    pub content: String,
    pub mood: String,
    pub date: NaiveDate,
}

impl NewEntry {
    /// Entry for `date` with the default mood
    pub fn neutral(content: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            content: content.into(),
            mood: DEFAULT_MOOD.to_string(),
            date,
        }
    }
}

/// User record returned by the auth gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The current user of the client
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    Authenticated {
        user_id: String,
        email: Option<String>,
    },
}

impl Viewer {
    /// User id when authenticated
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Authenticated { user_id, .. } => Some(user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::Authenticated { .. })
    }

    /// Short label for display
    pub fn label(&self) -> String {
        match self {
            Viewer::Anonymous => "anonymous".to_string(),
            Viewer::Authenticated {
                email: Some(email), ..
            } => email.clone(),
            Viewer::Authenticated { user_id, .. } => user_id.clone(),
        }
    }
}

impl From<AuthUser> for Viewer {
    fn from(user: AuthUser) -> Self {
        Viewer::Authenticated {
            user_id: user.id,
            email: user.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_thread_decodes_embedded_rows() {
        let json = serde_json::json!({
            "id": "e1",
            "created_at": "2024-03-05T08:15:00.123456+00:00",
            "content": "Walked along the river.",
            "mood": "calm",
            "user_id": null,
            "date": "2024-03-05",
            "comments": [{
                "id": "c1",
                "created_at": "2024-03-05T09:00:00+00:00",
                "content": "Lovely",
                "entry_id": "e1",
                "user_id": "u1"
            }],
            "likes": []
        });

        let thread: EntryThread = serde_json::from_value(json).unwrap();
        assert_eq!(thread.entry.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(thread.entry.user_id, None);
        assert_eq!(thread.comments.len(), 1);
        assert!(thread.likes.is_empty());
    }

    #[test]
    fn test_new_entry_wire_format() {
        let entry = NewEntry::neutral("hello", NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"content": "hello", "mood": "neutral", "date": "2024-01-09"})
        );
    }

    #[test]
    fn test_viewer_identity() {
        let viewer = Viewer::from(AuthUser {
            id: "u1".to_string(),
            email: Some("reader@example.com".to_string()),
        });
        assert!(viewer.is_authenticated());
        assert_eq!(viewer.user_id(), Some("u1"));
        assert_eq!(viewer.label(), "reader@example.com");

        assert_eq!(Viewer::default().user_id(), None);
        assert_eq!(Viewer::Anonymous.label(), "anonymous");
    }
}
