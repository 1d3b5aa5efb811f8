//! Social Interaction Handler
//!
//! Like toggling and commenting on the loaded entry. Local state changes
//! only after the remote write succeeded; unmet preconditions make no
//! remote call at all.

use std::sync::Arc;

use crate::gateway::Gateway;
use crate::model::{Comment, Entry, Like, NewComment, NewLike, Viewer};

/// Why an interaction did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Anonymous,
    NoEntry,
    EmptyComment,
}

/// Result of a like toggle
#[derive(Debug, Clone, PartialEq)]
pub enum LikeOutcome {
    Liked(Like),
    /// Id of the removed like
    Unliked(String),
    Skipped(SkipReason),
    Failed,
}

/// Result of a comment submission
#[derive(Debug, Clone, PartialEq)]
pub enum CommentOutcome {
    Added(Comment),
    Skipped(SkipReason),
    Failed,
}

fn preconditions<'a>(
    entry: Option<&'a Entry>,
    viewer: &'a Viewer,
) -> Result<(&'a Entry, &'a str), SkipReason> {
    let user_id = viewer.user_id().ok_or(SkipReason::Anonymous)?;
    let entry = entry.ok_or(SkipReason::NoEntry)?;
    Ok((entry, user_id))
}

/// Performs likes and comments against the gateway
#[derive(Clone)]
pub struct SocialHandler {
    gateway: Arc<dyn Gateway>,
}

impl SocialHandler {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Like the entry, or remove the viewer's existing like.
    pub async fn toggle_like(
        &self,
        entry: Option<&Entry>,
        viewer: &Viewer,
        likes: &mut Vec<Like>,
    ) -> LikeOutcome {
        let (entry, user_id) = match preconditions(entry, viewer) {
            Ok(found) => found,
            Err(reason) => return LikeOutcome::Skipped(reason),
        };

        let existing = likes
            .iter()
            .find(|like| like.user_id == user_id)
            .map(|like| like.id.clone());

        match existing {
            Some(like_id) => match self.gateway.delete_like(&like_id).await {
                Ok(()) => {
                    likes.retain(|like| like.id != like_id);
                    tracing::info!(entry_id = %entry.id, like_id = %like_id, "Removed like");
                    LikeOutcome::Unliked(like_id)
                }
                Err(e) => {
                    tracing::error!(entry_id = %entry.id, error = %e, "Error removing like");
                    LikeOutcome::Failed
                }
            },
            None => {
                let new_like = NewLike {
                    entry_id: entry.id.clone(),
                    user_id: user_id.to_string(),
                };
                match self.gateway.insert_like(&new_like).await {
                    Ok(like) => {
                        tracing::info!(entry_id = %entry.id, like_id = %like.id, "Added like");
                        likes.push(like.clone());
                        LikeOutcome::Liked(like)
                    }
                    Err(e) => {
                        tracing::error!(entry_id = %entry.id, error = %e, "Error adding like");
                        LikeOutcome::Failed
                    }
                }
            }
        }
    }

    /// Post the trimmed `draft` as a comment; the draft is cleared on success.
    pub async fn add_comment(
        &self,
        entry: Option<&Entry>,
        viewer: &Viewer,
        draft: &mut String,
        comments: &mut Vec<Comment>,
    ) -> CommentOutcome {
        let (entry, user_id) = match preconditions(entry, viewer) {
            Ok(found) => found,
            Err(reason) => return CommentOutcome::Skipped(reason),
        };

        let content = draft.trim();
        if content.is_empty() {
            return CommentOutcome::Skipped(SkipReason::EmptyComment);
        }

        let new_comment = NewComment {
            content: content.to_string(),
            entry_id: entry.id.clone(),
            user_id: user_id.to_string(),
        };

        match self.gateway.insert_comment(&new_comment).await {
            Ok(comment) => {
                tracing::info!(entry_id = %entry.id, comment_id = %comment.id, "Added comment");
                comments.push(comment.clone());
                draft.clear();
                CommentOutcome::Added(comment)
            }
            Err(e) => {
                tracing::error!(entry_id = %entry.id, error = %e, "Error adding comment");
                CommentOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use crate::session::SessionStore;
    use chrono::NaiveDate;

    async fn setup() -> (Arc<MemoryGateway>, SocialHandler, Entry) {
        let gateway = Arc::new(MemoryGateway::new(SessionStore::new()));
        let entry = gateway
            .seed_entry(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), "Spring", "hopeful")
            .await;
        let handler = SocialHandler::new(gateway.clone());
        (gateway, handler, entry)
    }

    fn reader() -> Viewer {
        Viewer::Authenticated {
            user_id: "reader".to_string(),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_like_then_unlike() {
        let (gateway, handler, entry) = setup().await;
        let mut likes = Vec::new();

        let outcome = handler.toggle_like(Some(&entry), &reader(), &mut likes).await;
        assert!(matches!(outcome, LikeOutcome::Liked(_)));
        assert_eq!(likes.len(), 1);
        assert_eq!(gateway.like_count(&entry.id).await, 1);

        let outcome = handler.toggle_like(Some(&entry), &reader(), &mut likes).await;
        assert!(matches!(outcome, LikeOutcome::Unliked(_)));
        assert!(likes.is_empty());
        assert_eq!(gateway.like_count(&entry.id).await, 0);
    }

    #[tokio::test]
    async fn test_other_viewers_likes_are_kept() {
        let (gateway, handler, entry) = setup().await;
        let other = Viewer::Authenticated {
            user_id: "other".to_string(),
            email: None,
        };
        let mut likes = Vec::new();

        handler.toggle_like(Some(&entry), &other, &mut likes).await;
        handler.toggle_like(Some(&entry), &reader(), &mut likes).await;
        handler.toggle_like(Some(&entry), &reader(), &mut likes).await;

        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].user_id, "other");
        assert_eq!(gateway.like_count(&entry.id).await, 1);
    }

    #[tokio::test]
    async fn test_anonymous_makes_no_call() {
        let (gateway, handler, entry) = setup().await;
        let mut likes = Vec::new();
        let mut comments = Vec::new();
        let mut draft = "hello".to_string();

        let like = handler.toggle_like(Some(&entry), &Viewer::Anonymous, &mut likes).await;
        let comment = handler
            .add_comment(Some(&entry), &Viewer::Anonymous, &mut draft, &mut comments)
            .await;

        assert_eq!(like, LikeOutcome::Skipped(SkipReason::Anonymous));
        assert_eq!(comment, CommentOutcome::Skipped(SkipReason::Anonymous));
        assert_eq!(gateway.calls().writes(), 0);
        assert_eq!(draft, "hello");
        assert!(likes.is_empty() && comments.is_empty());
    }

    #[tokio::test]
    async fn test_no_entry_makes_no_call() {
        let (gateway, handler, _entry) = setup().await;
        let mut likes = Vec::new();

        let outcome = handler.toggle_like(None, &reader(), &mut likes).await;
        assert_eq!(outcome, LikeOutcome::Skipped(SkipReason::NoEntry));
        assert_eq!(gateway.calls().writes(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_comment_rejected() {
        let (gateway, handler, entry) = setup().await;
        let mut comments = Vec::new();
        let mut draft = " \t\n ".to_string();

        let outcome = handler
            .add_comment(Some(&entry), &reader(), &mut draft, &mut comments)
            .await;

        assert_eq!(outcome, CommentOutcome::Skipped(SkipReason::EmptyComment));
        assert_eq!(gateway.calls().inserts, 0);
        assert!(comments.is_empty());
        assert_eq!(draft, " \t\n ");
    }

    #[tokio::test]
    async fn test_comment_trimmed_appended_and_draft_cleared() {
        let (gateway, handler, entry) = setup().await;
        let mut comments = Vec::new();
        let mut draft = "  first!  ".to_string();

        handler
            .add_comment(Some(&entry), &reader(), &mut draft, &mut comments)
            .await;
        draft.push_str("second");
        handler
            .add_comment(Some(&entry), &reader(), &mut draft, &mut comments)
            .await;

        let contents: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first!", "second"]);
        assert!(draft.is_empty());
        assert_eq!(gateway.calls().inserts, 2);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state() {
        let (gateway, handler, entry) = setup().await;
        gateway.set_failing(true);
        let mut likes = Vec::new();
        let mut comments = Vec::new();
        let mut draft = "kept".to_string();

        assert_eq!(
            handler.toggle_like(Some(&entry), &reader(), &mut likes).await,
            LikeOutcome::Failed
        );
        assert_eq!(
            handler
                .add_comment(Some(&entry), &reader(), &mut draft, &mut comments)
                .await,
            CommentOutcome::Failed
        );
        assert!(likes.is_empty());
        assert!(comments.is_empty());
        assert_eq!(draft, "kept");
    }
}
