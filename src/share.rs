//! Sharing
//!
//! Hands a title/text/url payload to a native share facility when the host
//! has one. Otherwise the URL goes to the clipboard and the user is told so.
//! Failures are only logged.

use async_trait::async_trait;
use base64::Engine;
use std::io::Write;
use thiserror::Error;

use crate::model::Entry;

/// Message shown after the clipboard fallback succeeded
pub const COPIED_NOTICE: &str = "Link copied to clipboard!";

/// What gets shared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    /// Payload for an entry, e.g. "Daily Reflection - March 5, 2024"
    pub fn for_entry(entry: &Entry, url: &str) -> Self {
        Self {
            title: format!("Daily Reflection - {}", entry.date.format("%B %-d, %Y")),
            text: entry.content.clone(),
            url: url.to_string(),
        }
    }
}

/// Errors from a share target
#[derive(Error, Debug)]
pub enum ShareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Share cancelled")]
    Cancelled,

    #[error("Share failed: {0}")]
    Failed(String),
}

/// Host-provided share sheet
#[async_trait]
pub trait NativeShare: Send + Sync {
    async fn share(&self, payload: &SharePayload) -> Result<(), ShareError>;
}

/// Somewhere a link can be copied to
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ShareError>;
}

/// Copies through the terminal with an OSC 52 escape sequence
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalClipboard;

impl TerminalClipboard {
    /// The escape sequence that puts `text` on the system clipboard
    pub fn sequence(text: &str) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text);
        format!("\x1b]52;c;{}\x07", encoded)
    }
}

impl Clipboard for TerminalClipboard {
    fn write_text(&self, text: &str) -> Result<(), ShareError> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(Self::sequence(text).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

/// Result of a share request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Handed to the native facility
    Shared,
    /// URL copied; the caller shows [`COPIED_NOTICE`]
    Copied,
    Failed,
}

/// Picks the native facility when present, the clipboard otherwise
pub struct Sharer {
    native: Option<Box<dyn NativeShare>>,
    clipboard: Box<dyn Clipboard>,
}

impl Sharer {
    pub fn new(native: Option<Box<dyn NativeShare>>, clipboard: Box<dyn Clipboard>) -> Self {
        Self { native, clipboard }
    }

    /// Terminal setup: no share sheet, OSC 52 clipboard
    pub fn terminal() -> Self {
        Self::new(None, Box::new(TerminalClipboard))
    }

    pub async fn share(&self, payload: &SharePayload) -> ShareOutcome {
        let result = match &self.native {
            Some(native) => native.share(payload).await.map(|_| ShareOutcome::Shared),
            None => self
                .clipboard
                .write_text(&payload.url)
                .map(|_| ShareOutcome::Copied),
        };

        match result {
            Ok(outcome) => {
                tracing::info!(title = %payload.title, ?outcome, "Shared entry");
                outcome
            }
            Err(e) => {
                tracing::error!(error = %e, "Error sharing");
                ShareOutcome::Failed
            }
        }
    }
}
