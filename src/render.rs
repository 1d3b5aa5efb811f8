//! Text rendering of the journal views.
//!
//! Pure functions of [`Journal`] state; nothing here talks to the gateway.

use chrono::Datelike;
use std::fmt::Write;

use crate::config::AboutConfig;
use crate::journal::{Journal, MonthGrid, Page, WEEKDAY_HEADER};

pub const APP_TITLE: &str = "Daily Reflections";
pub const NO_ENTRY_MESSAGE: &str = "No entry for this date.";

const WORDS_PER_MINUTE: usize = 200;

/// Estimated reading time in whole minutes, at least one
pub fn reading_minutes(content: &str) -> usize {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Render whichever page is active
pub fn render(journal: &Journal, about: &AboutConfig) -> String {
    match journal.page() {
        Page::Home => render_home(journal),
        Page::About => render_about(about),
    }
}

fn header(out: &mut String, subtitle: &str) {
    let _ = writeln!(out, "== {} ==  {}", APP_TITLE, subtitle);
    let _ = writeln!(out);
}

/// Home page: the day's entry with its likes and comments
pub fn render_home(journal: &Journal) -> String {
    let mut out = String::new();
    let viewer = journal.viewer();
    header(
        &mut out,
        &format!(
            "{}  [{}]",
            journal.date().format("%A, %B %-d, %Y"),
            viewer.label()
        ),
    );

    if journal.calendar_open() {
        out.push_str(&render_calendar(&journal.month_grid()));
        out.push('\n');
    }

    let entry = match journal.entry() {
        Some(entry) => entry,
        None => {
            let _ = writeln!(out, "{}", NO_ENTRY_MESSAGE);
            return out;
        }
    };

    let _ = writeln!(out, "{}", entry.date.format("%A"));
    let _ = writeln!(
        out,
        "{} min read | mood: {}",
        reading_minutes(&entry.content),
        entry.mood
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", entry.content);
    let _ = writeln!(out);

    let liked = if journal.viewer_has_liked() { " (liked)" } else { "" };
    let _ = writeln!(
        out,
        "{} Likes{} | {} Comments",
        journal.like_count(),
        liked,
        journal.comment_count()
    );

    if journal.comments_open() {
        let _ = writeln!(out);
        for comment in journal.comments() {
            let _ = writeln!(out, "  {}", comment.content);
            let _ = writeln!(out, "    {}", comment.created_at.format("%b %-d, %Y %H:%M"));
        }
        if viewer.is_authenticated() {
            let _ = writeln!(out, "  (comment <text> to add a comment...)");
        }
    }

    out
}

/// Calendar picker for one month, selected day in brackets
pub fn render_calendar(grid: &MonthGrid) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:^28}", grid.title());
    for day in WEEKDAY_HEADER {
        let _ = write!(out, " {:>2} ", day);
    }
    out.push('\n');

    for week in grid.weeks() {
        for cell in week {
            match cell {
                Some(day) if grid.is_selected(day) => {
                    let _ = write!(out, "[{:>2}]", day.day());
                }
                Some(day) => {
                    let _ = write!(out, " {:>2} ", day.day());
                }
                None => out.push_str("    "),
            }
        }
        out.push('\n');
    }
    out
}

/// About page from the configured biography
pub fn render_about(about: &AboutConfig) -> String {
    let mut out = String::new();
    header(&mut out, "About");

    let _ = writeln!(out, "{}", about.name);
    let _ = writeln!(out);
    for paragraph in &about.paragraphs {
        let _ = writeln!(out, "{}", paragraph);
        let _ = writeln!(out);
    }

    for stat in &about.stats {
        let _ = writeln!(out, "{}: {}", stat.label, stat.value);
    }
    if !about.stats.is_empty() {
        let _ = writeln!(out);
    }

    if !about.skills.is_empty() {
        let _ = writeln!(out, "Skills: {}", about.skills.join(", "));
    }
    for link in &about.links {
        let _ = writeln!(out, "{}: {}", link.label, link.url);
    }
    out
}
