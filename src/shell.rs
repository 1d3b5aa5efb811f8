//! Interactive shell
//!
//! Parses one line of input into a [`Command`] and applies it to the
//! journal. Failed or skipped interactions stay quiet; the next render shows
//! the state as it is.

use chrono::NaiveDate;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::gateway::AuthGateway;
use crate::journal::{CommentOutcome, Journal, LikeOutcome};
use crate::render;
use crate::share::{ShareOutcome, Sharer, COPIED_NOTICE};

pub const HELP: &str = "\
Commands:
  next | prev | today        move one day, or back to today
  goto YYYY-MM-DD            jump to a date
  calendar                   show or hide the month picker
  pick N                     open day N of the shown month
  like                       like or unlike the entry
  comments                   show or hide comments
  comment <text>             add a comment
  share                      share this reflection
  home | about               switch page
  login <email> | logout     sign in or out
  publish <text>             post an entry for today
  refresh | help | quit";

/// One user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Today,
    Goto(NaiveDate),
    Calendar,
    Pick(u32),
    Like,
    Comments,
    Comment(String),
    Share,
    Home,
    About,
    Login(String),
    Logout,
    Publish(String),
    Refresh,
    Help,
    Quit,
}

/// Input that is not a command
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),

    #[error("Invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid day `{0}`")]
    InvalidDay(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let required = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(rest.to_string())
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "next" | "n" => Ok(Command::Next),
            "prev" | "p" => Ok(Command::Prev),
            "today" => Ok(Command::Today),
            "goto" | "g" => {
                let arg = required("goto")?;
                NaiveDate::parse_from_str(&arg, "%Y-%m-%d")
                    .map(Command::Goto)
                    .map_err(|_| CommandError::InvalidDate(arg))
            }
            "calendar" | "cal" => Ok(Command::Calendar),
            "pick" => {
                let arg = required("pick")?;
                arg.parse()
                    .map(Command::Pick)
                    .map_err(|_| CommandError::InvalidDay(arg))
            }
            "like" | "l" => Ok(Command::Like),
            "comments" | "c" => Ok(Command::Comments),
            // An empty comment still goes through so it can be rejected quietly.
            "comment" => Ok(Command::Comment(rest.to_string())),
            "share" => Ok(Command::Share),
            "home" => Ok(Command::Home),
            "about" => Ok(Command::About),
            "login" => required("login").map(Command::Login),
            "logout" => Ok(Command::Logout),
            "publish" => required("publish").map(Command::Publish),
            "refresh" | "r" => Ok(Command::Refresh),
            "help" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// What the loop should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Continue(Option<String>),
    /// Ask for the password of this email, then call [`Shell::login`]
    NeedPassword(String),
    Quit,
}

/// Journal plus everything the commands need around it
pub struct Shell {
    journal: Journal,
    auth: Arc<dyn AuthGateway>,
    sharer: Sharer,
    config: Config,
}

impl Shell {
    pub fn new(
        journal: Journal,
        auth: Arc<dyn AuthGateway>,
        sharer: Sharer,
        config: Config,
    ) -> Self {
        Self {
            journal,
            auth,
            sharer,
            config,
        }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Current page as text
    pub fn render(&self) -> String {
        render::render(&self.journal, &self.config.about)
    }

    pub async fn execute(&mut self, command: Command) -> Reply {
        let message = match command {
            Command::Next => {
                self.journal.next_day().await;
                None
            }
            Command::Prev => {
                self.journal.previous_day().await;
                None
            }
            Command::Today => {
                self.journal.today().await;
                None
            }
            Command::Goto(date) => {
                self.journal.jump_to(date).await;
                None
            }
            Command::Calendar => {
                self.journal.toggle_calendar();
                None
            }
            Command::Pick(day) => {
                if self.journal.pick_calendar_day(day).await {
                    None
                } else {
                    Some(format!("No day {} in {}", day, self.journal.month_grid().title()))
                }
            }
            Command::Like => match self.journal.toggle_like().await {
                LikeOutcome::Liked(_) => Some("Liked.".to_string()),
                LikeOutcome::Unliked(_) => Some("Like removed.".to_string()),
                LikeOutcome::Skipped(_) | LikeOutcome::Failed => None,
            },
            Command::Comments => {
                self.journal.toggle_comments();
                None
            }
            Command::Comment(text) => {
                self.journal.set_draft(text);
                match self.journal.add_comment().await {
                    CommentOutcome::Added(_) => Some("Comment added.".to_string()),
                    CommentOutcome::Skipped(_) | CommentOutcome::Failed => None,
                }
            }
            Command::Share => self.share().await,
            Command::Home => {
                self.journal.show_home();
                None
            }
            Command::About => {
                self.journal.show_about();
                None
            }
            Command::Login(email) => return Reply::NeedPassword(email),
            Command::Logout => {
                if let Err(e) = self.auth.sign_out().await {
                    tracing::error!(error = %e, "Error signing out");
                }
                Some("Signed out.".to_string())
            }
            Command::Publish(text) => self
                .journal
                .publish_entry(&text)
                .await
                .map(|entry| format!("Published entry for {}.", entry.date)),
            Command::Refresh => {
                self.journal.refresh().await;
                None
            }
            Command::Help => Some(HELP.to_string()),
            Command::Quit => return Reply::Quit,
        };

        Reply::Continue(message)
    }

    async fn share(&self) -> Option<String> {
        let payload = self.journal.share_payload(&self.config.share.url)?;
        match self.sharer.share(&payload).await {
            ShareOutcome::Copied => Some(COPIED_NOTICE.to_string()),
            ShareOutcome::Shared | ShareOutcome::Failed => None,
        }
    }

    /// Finish a `login` command
    pub async fn login(&mut self, email: &str, password: &str) -> String {
        match self.auth.sign_in_with_password(email, password).await {
            Ok(user) => format!("Signed in as {}.", user.email.unwrap_or(user.id)),
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in failed");
                "Sign-in failed.".to_string()
            }
        }
    }

    /// Tear down the view
    pub fn close(self) {
        self.journal.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Backend, MemoryGateway, SAMPLE_EMAIL, SAMPLE_PASSWORD};
    use crate::journal::Page;
    use crate::session::SessionStore;
    use crate::share::{Clipboard, ShareError};
    use chrono::{Duration, Local};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Clipboard for Recorder {
        fn write_text(&self, text: &str) -> Result<(), ShareError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    async fn shell() -> (Shell, Recorder, Arc<MemoryGateway>) {
        let store = SessionStore::new();
        let gateway = Arc::new(MemoryGateway::with_sample_days(store.clone()).await);
        let backend = Backend::new(gateway.clone());
        let journal = Journal::open(backend.data.clone(), &store, Local::now().date_naive()).await;
        let clipboard = Recorder::default();
        let sharer = Sharer::new(None, Box::new(clipboard.clone()));
        (
            Shell::new(journal, backend.auth, sharer, Config::default()),
            clipboard,
            gateway,
        )
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("next".parse::<Command>(), Ok(Command::Next));
        assert_eq!("  P ".parse::<Command>(), Ok(Command::Prev));
        assert_eq!(
            "goto 2024-03-05".parse::<Command>(),
            Ok(Command::Goto(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()))
        );
        assert_eq!("pick 12".parse::<Command>(), Ok(Command::Pick(12)));
        assert_eq!(
            "comment  nice one ".parse::<Command>(),
            Ok(Command::Comment("nice one".to_string()))
        );
        assert_eq!("comment".parse::<Command>(), Ok(Command::Comment(String::new())));
        assert_eq!(
            "login reader@example.com".parse::<Command>(),
            Ok(Command::Login("reader@example.com".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "dance".parse::<Command>(),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            "goto".parse::<Command>(),
            Err(CommandError::MissingArgument("goto"))
        );
        assert_eq!(
            "goto 05/03/2024".parse::<Command>(),
            Err(CommandError::InvalidDate("05/03/2024".to_string()))
        );
        assert_eq!(
            "pick x".parse::<Command>(),
            Err(CommandError::InvalidDay("x".to_string()))
        );
    }

    #[tokio::test]
    async fn test_navigation_commands() {
        let (mut shell, _, _) = shell().await;
        let today = Local::now().date_naive();

        shell.execute(Command::Prev).await;
        assert_eq!(shell.journal().date(), today - Duration::days(1));
        assert_eq!(shell.journal().comment_count(), 1);

        shell.execute(Command::Next).await;
        assert_eq!(shell.journal().date(), today);

        shell.execute(Command::About).await;
        assert_eq!(shell.journal().page(), Page::About);
        assert!(shell.render().contains("About"));
    }

    #[tokio::test]
    async fn test_login_like_and_comment() {
        let (mut shell, _, gateway) = shell().await;

        assert_eq!(shell.execute(Command::Like).await, Reply::Continue(None));
        assert_eq!(gateway.calls().writes(), 0);

        let reply = shell.execute(Command::Login(SAMPLE_EMAIL.to_string())).await;
        assert_eq!(reply, Reply::NeedPassword(SAMPLE_EMAIL.to_string()));
        assert_eq!(shell.login(SAMPLE_EMAIL, "wrong").await, "Sign-in failed.");
        assert_eq!(
            shell.login(SAMPLE_EMAIL, SAMPLE_PASSWORD).await,
            format!("Signed in as {}.", SAMPLE_EMAIL)
        );

        assert_eq!(
            shell.execute(Command::Like).await,
            Reply::Continue(Some("Liked.".to_string()))
        );
        assert_eq!(
            shell.execute(Command::Comment("  ".to_string())).await,
            Reply::Continue(None)
        );
        assert_eq!(
            shell.execute(Command::Comment("Well said".to_string())).await,
            Reply::Continue(Some("Comment added.".to_string()))
        );
        assert_eq!(shell.journal().like_count(), 1);
        assert_eq!(shell.journal().comment_count(), 1);

        shell.execute(Command::Logout).await;
        assert!(!shell.journal().viewer().is_authenticated());
    }

    #[tokio::test]
    async fn test_share_copies_link() {
        let (mut shell, clipboard, _) = shell().await;

        let reply = shell.execute(Command::Share).await;
        assert_eq!(reply, Reply::Continue(Some(COPIED_NOTICE.to_string())));
        assert_eq!(*clipboard.0.lock().unwrap(), vec![Config::default().share.url]);

        shell.execute(Command::Goto(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap())).await;
        assert_eq!(shell.execute(Command::Share).await, Reply::Continue(None));
        assert_eq!(clipboard.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_quit() {
        let (mut shell, _, _) = shell().await;
        assert_eq!(shell.execute(Command::Quit).await, Reply::Quit);
        shell.close();
    }
}
