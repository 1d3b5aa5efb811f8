//! Journal
//!
//! The date-indexed data flow of the client:
//!
//! 1. [`DateCursor`] holds the viewed date
//! 2. [`EntryLoader`] fetches that date's entry, comments and likes
//! 3. [`SocialHandler`] toggles likes and posts comments
//! 4. [`Journal`] ties them to the session and the page state the shell renders
//!
//! [`MonthGrid`] lays out the calendar picker.

mod calendar;
mod cursor;
mod loader;
mod social;
mod view;

pub use calendar::{MonthGrid, WEEKDAY_HEADER};
pub use cursor::{DateCursor, Direction};
pub use loader::{EntryLoader, LoadedDay};
pub use social::{CommentOutcome, LikeOutcome, SkipReason, SocialHandler};
pub use view::{FetchTicket, Journal, Page};
