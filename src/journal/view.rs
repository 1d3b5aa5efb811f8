//! Journal view state
//!
//! Everything the presentation shell renders: page selection, the date
//! cursor, the loaded day and the comment draft. Every cursor move fetches
//! the day again; nothing is cached across dates.

use chrono::{Local, NaiveDate};
use std::sync::Arc;

use super::calendar::MonthGrid;
use super::cursor::DateCursor;
use super::loader::{EntryLoader, LoadedDay};
use super::social::{CommentOutcome, LikeOutcome, SocialHandler};
use crate::gateway::Gateway;
use crate::model::{Comment, Entry, Like, NewEntry, Viewer};
use crate::session::{SessionStore, SessionSubscription};
use crate::share::SharePayload;

/// The two views of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    About,
}

/// Tag for one fetch; results carrying an outdated ticket are dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    date: NaiveDate,
}

impl FetchTicket {
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Single-view state of the journal client
pub struct Journal {
    cursor: DateCursor,
    page: Page,
    day: LoadedDay,
    draft: String,
    comments_open: bool,
    calendar_open: bool,
    loader: EntryLoader,
    social: SocialHandler,
    gateway: Arc<dyn Gateway>,
    session: SessionSubscription,
    issued: u64,
}

impl Journal {
    /// Create the view on `date` without loading anything yet
    pub fn new(gateway: Arc<dyn Gateway>, session: &SessionStore, date: NaiveDate) -> Self {
        Self {
            cursor: DateCursor::new(date),
            page: Page::Home,
            day: LoadedDay::empty(date),
            draft: String::new(),
            comments_open: false,
            calendar_open: false,
            loader: EntryLoader::new(gateway.clone()),
            social: SocialHandler::new(gateway.clone()),
            gateway,
            session: session.subscribe(),
            issued: 0,
        }
    }

    /// Create the view on `date` and load it
    pub async fn open(gateway: Arc<dyn Gateway>, session: &SessionStore, date: NaiveDate) -> Self {
        let mut journal = Self::new(gateway, session, date);
        journal.refresh().await;
        journal
    }

    // ---- state accessors ----

    pub fn date(&self) -> NaiveDate {
        self.cursor.date()
    }

    pub fn cursor(&self) -> &DateCursor {
        &self.cursor
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn day(&self) -> &LoadedDay {
        &self.day
    }

    pub fn entry(&self) -> Option<&Entry> {
        self.day.entry.as_ref()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.day.comments
    }

    pub fn likes(&self) -> &[Like] {
        &self.day.likes
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn comments_open(&self) -> bool {
        self.comments_open
    }

    pub fn calendar_open(&self) -> bool {
        self.calendar_open
    }

    /// Viewer as last published to the session store
    pub fn viewer(&self) -> Viewer {
        self.session.viewer()
    }

    pub fn like_count(&self) -> usize {
        self.day.likes.len()
    }

    pub fn comment_count(&self) -> usize {
        self.day.comments.len()
    }

    pub fn viewer_has_liked(&self) -> bool {
        match self.viewer().user_id() {
            Some(user_id) => self.day.likes.iter().any(|like| like.user_id == user_id),
            None => false,
        }
    }

    pub fn month_grid(&self) -> MonthGrid {
        MonthGrid::for_date(self.cursor.date())
    }

    // ---- loading ----

    /// Issue a ticket for the current cursor date
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket {
            seq: self.issued,
            date: self.cursor.date(),
        }
    }

    /// Loader usable while the view is not borrowed
    pub fn loader(&self) -> EntryLoader {
        self.loader.clone()
    }

    /// Install a fetched day unless a newer fetch was issued since.
    ///
    /// Returns whether the day was applied.
    pub fn apply(&mut self, ticket: FetchTicket, day: LoadedDay) -> bool {
        if ticket.seq != self.issued || ticket.date != self.cursor.date() {
            tracing::debug!(
                requested = %ticket.date,
                current = %self.cursor.date(),
                "Discarding stale entry response"
            );
            return false;
        }

        self.day = day;
        true
    }

    /// Fetch the current date again
    pub async fn refresh(&mut self) {
        let ticket = self.begin_fetch();
        let day = self.loader.load(ticket.date).await;
        self.apply(ticket, day);
    }

    // ---- navigation ----

    pub async fn next_day(&mut self) {
        self.cursor.advance();
        self.refresh().await;
    }

    pub async fn previous_day(&mut self) {
        self.cursor.retreat();
        self.refresh().await;
    }

    pub async fn jump_to(&mut self, date: NaiveDate) {
        self.cursor.jump_to(date);
        self.refresh().await;
    }

    pub async fn today(&mut self) {
        self.jump_to(Local::now().date_naive()).await;
    }

    pub fn toggle_calendar(&mut self) {
        self.calendar_open = !self.calendar_open;
    }

    /// Jump to a day of the shown month and close the picker.
    ///
    /// Returns false when the month has no such day.
    pub async fn pick_calendar_day(&mut self, day_of_month: u32) -> bool {
        match self.month_grid().day(day_of_month) {
            Some(date) => {
                self.calendar_open = false;
                self.jump_to(date).await;
                true
            }
            None => false,
        }
    }

    pub fn show_home(&mut self) {
        self.page = Page::Home;
    }

    pub fn show_about(&mut self) {
        self.page = Page::About;
    }

    pub fn toggle_page(&mut self) {
        self.page = match self.page {
            Page::Home => Page::About,
            Page::About => Page::Home,
        };
    }

    pub fn toggle_comments(&mut self) {
        self.comments_open = !self.comments_open;
    }

    // ---- social ----

    pub async fn toggle_like(&mut self) -> LikeOutcome {
        let viewer = self.viewer();
        self.social
            .toggle_like(self.day.entry.as_ref(), &viewer, &mut self.day.likes)
            .await
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Submit the current draft
    pub async fn add_comment(&mut self) -> CommentOutcome {
        let viewer = self.viewer();
        self.social
            .add_comment(
                self.day.entry.as_ref(),
                &viewer,
                &mut self.draft,
                &mut self.day.comments,
            )
            .await
    }

    /// Insert an entry for today with the default mood, then reload.
    pub async fn publish_entry(&mut self, text: &str) -> Option<Entry> {
        self.publish_entry_on(text, Local::now().date_naive()).await
    }

    /// Insert an entry for `date` with the default mood, then reload.
    pub async fn publish_entry_on(&mut self, text: &str, date: NaiveDate) -> Option<Entry> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let new_entry = NewEntry::neutral(text, date);
        match self.gateway.insert_entry(&new_entry).await {
            Ok(entry) => {
                tracing::info!(entry_id = %entry.id, date = %entry.date, "New entry added");
                self.refresh().await;
                Some(entry)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error adding new entry");
                None
            }
        }
    }

    /// What to share for the loaded entry, if any
    pub fn share_payload(&self, url: &str) -> Option<SharePayload> {
        self.entry().map(|entry| SharePayload::for_entry(entry, url))
    }

    /// Tear down the view and cancel its session subscription
    pub fn close(mut self) {
        self.session.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{AuthGateway, MemoryGateway};
    use crate::journal::social::SkipReason;

    fn march(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    struct Fixture {
        gateway: Arc<MemoryGateway>,
        store: SessionStore,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = SessionStore::new();
            let gateway = Arc::new(MemoryGateway::new(store.clone()));
            gateway.seed_entry(march(5), "Tuesday thoughts", "content").await;
            gateway.seed_entry(march(6), "Wednesday thoughts", "restless").await;
            gateway.register_user("reader@example.com", "pw").await;
            Self { gateway, store }
        }

        async fn journal(&self, date: NaiveDate) -> Journal {
            Journal::open(self.gateway.clone(), &self.store, date).await
        }

        async fn sign_in(&self) {
            self.gateway
                .sign_in_with_password("reader@example.com", "pw")
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_open_loads_entry() {
        let fixture = Fixture::new().await;
        let journal = fixture.journal(march(5)).await;

        let entry = journal.entry().unwrap();
        assert_eq!(entry.content, "Tuesday thoughts");
        assert_eq!(entry.mood, "content");
        assert_eq!(journal.page(), Page::Home);
    }

    #[tokio::test]
    async fn test_empty_date() {
        let fixture = Fixture::new().await;
        let journal = fixture.journal(march(20)).await;

        assert!(journal.entry().is_none());
        assert_eq!(journal.like_count(), 0);
        assert_eq!(journal.comment_count(), 0);
    }

    #[tokio::test]
    async fn test_forward_and_back_refetches() {
        let fixture = Fixture::new().await;
        let mut journal = fixture.journal(march(5)).await;
        let original = journal.entry().cloned();

        journal.next_day().await;
        assert_eq!(journal.date(), march(6));
        assert_eq!(journal.entry().unwrap().content, "Wednesday thoughts");

        journal.previous_day().await;
        assert_eq!(journal.date(), march(5));
        assert_eq!(journal.entry().cloned(), original);
        assert_eq!(fixture.gateway.calls().selects, 3);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let fixture = Fixture::new().await;
        let mut journal = fixture.journal(march(5)).await;

        let stale = journal.begin_fetch();
        let stale_day = journal.loader().load(stale.date()).await;

        journal.next_day().await;
        assert!(!journal.apply(stale, stale_day));
        assert_eq!(journal.date(), march(6));
        assert_eq!(journal.entry().unwrap().content, "Wednesday thoughts");
    }

    #[tokio::test]
    async fn test_superseded_ticket_for_same_date_is_discarded() {
        let fixture = Fixture::new().await;
        let mut journal = fixture.journal(march(5)).await;

        let first = journal.begin_fetch();
        let second = journal.begin_fetch();
        let loader = journal.loader();

        assert!(!journal.apply(first, LoadedDay::empty(first.date())));
        assert!(journal.apply(second, loader.load(second.date()).await));
        assert!(journal.entry().is_some());
    }

    #[tokio::test]
    async fn test_like_toggle_counts() {
        let fixture = Fixture::new().await;
        let mut journal = fixture.journal(march(5)).await;
        fixture.sign_in().await;
        let before = journal.like_count();

        assert!(matches!(journal.toggle_like().await, LikeOutcome::Liked(_)));
        assert_eq!(journal.like_count(), before + 1);
        assert!(journal.viewer_has_liked());

        assert!(matches!(journal.toggle_like().await, LikeOutcome::Unliked(_)));
        assert_eq!(journal.like_count(), before);
        assert!(!journal.viewer_has_liked());
    }

    #[tokio::test]
    async fn test_viewer_follows_session() {
        let fixture = Fixture::new().await;
        let journal = fixture.journal(march(5)).await;
        assert!(!journal.viewer().is_authenticated());

        fixture.sign_in().await;
        assert_eq!(journal.viewer().label(), "reader@example.com");

        fixture.gateway.sign_out().await.unwrap();
        assert!(!journal.viewer().is_authenticated());
    }

    #[tokio::test]
    async fn test_anonymous_actions_do_nothing() {
        let fixture = Fixture::new().await;
        let mut journal = fixture.journal(march(5)).await;
        journal.set_draft("hi");

        assert_eq!(
            journal.toggle_like().await,
            LikeOutcome::Skipped(SkipReason::Anonymous)
        );
        assert_eq!(
            journal.add_comment().await,
            CommentOutcome::Skipped(SkipReason::Anonymous)
        );
        assert_eq!(fixture.gateway.calls().writes(), 0);
        assert_eq!(journal.draft(), "hi");
        assert_eq!(journal.comment_count(), 0);
    }

    #[tokio::test]
    async fn test_comment_flow() {
        let fixture = Fixture::new().await;
        let mut journal = fixture.journal(march(5)).await;
        fixture.sign_in().await;

        journal.set_draft("   ");
        assert_eq!(
            journal.add_comment().await,
            CommentOutcome::Skipped(SkipReason::EmptyComment)
        );
        assert_eq!(fixture.gateway.calls().inserts, 0);

        journal.set_draft(" Beautiful. ");
        assert!(matches!(journal.add_comment().await, CommentOutcome::Added(_)));
        assert_eq!(journal.comment_count(), 1);
        assert_eq!(journal.comments()[0].content, "Beautiful.");
        assert_eq!(journal.draft(), "");

        // survives a re-fetch
        journal.refresh().await;
        assert_eq!(journal.comment_count(), 1);
    }

    #[tokio::test]
    async fn test_calendar_pick() {
        let fixture = Fixture::new().await;
        let mut journal = fixture.journal(march(20)).await;
        journal.toggle_calendar();
        assert!(journal.calendar_open());

        assert!(!journal.pick_calendar_day(40).await);
        assert!(journal.calendar_open());

        assert!(journal.pick_calendar_day(6).await);
        assert!(!journal.calendar_open());
        assert_eq!(journal.date(), march(6));
        assert!(journal.entry().is_some());
    }

    #[tokio::test]
    async fn test_pages() {
        let fixture = Fixture::new().await;
        let mut journal = fixture.journal(march(5)).await;

        journal.toggle_page();
        assert_eq!(journal.page(), Page::About);
        journal.toggle_page();
        assert_eq!(journal.page(), Page::Home);
        journal.show_about();
        assert_eq!(journal.page(), Page::About);
        journal.show_home();
        assert_eq!(journal.page(), Page::Home);
    }

    #[tokio::test]
    async fn test_publish_entry_reloads_current_date() {
        let fixture = Fixture::new().await;
        let mut journal = fixture.journal(march(7)).await;
        assert!(journal.entry().is_none());

        assert!(journal.publish_entry_on("   ", journal.date()).await.is_none());
        assert_eq!(fixture.gateway.calls().inserts, 0);

        let entry = journal
            .publish_entry_on("Wrote this today.", journal.date())
            .await
            .unwrap();
        assert_eq!(entry.mood, "neutral");
        assert_eq!(entry.date, march(7));
        assert_eq!(entry.user_id, None);
        assert_eq!(journal.entry().unwrap().id, entry.id);
    }

    #[tokio::test]
    async fn test_publish_entry_uses_local_today() {
        let fixture = Fixture::new().await;
        let mut journal = fixture.journal(march(5)).await;

        let before = Local::now().date_naive();
        let entry = journal.publish_entry("Wrote this today.").await.unwrap();
        let after = Local::now().date_naive();
        assert!(entry.date == before || entry.date == after);
    }

    #[tokio::test]
    async fn test_share_payload_requires_entry() {
        let fixture = Fixture::new().await;
        let mut journal = fixture.journal(march(20)).await;
        assert!(journal.share_payload("https://x.example/").is_none());

        journal.jump_to(march(5)).await;
        let payload = journal.share_payload("https://x.example/").unwrap();
        assert_eq!(payload.title, "Daily Reflection - March 5, 2024");
    }

    #[tokio::test]
    async fn test_close_unsubscribes() {
        let fixture = Fixture::new().await;
        let journal = fixture.journal(march(5)).await;
        assert_eq!(fixture.store.subscriber_count(), 1);

        journal.close();
        assert_eq!(fixture.store.subscriber_count(), 0);
    }
}
