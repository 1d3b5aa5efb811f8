//! Date Cursor
//!
//! The single calendar date being viewed. Moving it never validates a range:
//! dates outside the stored data simply have no entry.

use chrono::{Local, NaiveDate};

/// How the cursor last moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Jump,
}

/// Currently viewed calendar date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateCursor {
    date: NaiveDate,
    direction: Option<Direction>,
}

impl DateCursor {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            direction: None,
        }
    }

    /// Cursor on the local calendar's current day
    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Direction of the last move, `None` before the first
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Move one day forward (saturates at the last representable date)
    pub fn advance(&mut self) -> NaiveDate {
        self.date = self.date.succ_opt().unwrap_or(self.date);
        self.direction = Some(Direction::Forward);
        self.date
    }

    /// Move one day back (saturates at the first representable date)
    pub fn retreat(&mut self) -> NaiveDate {
        self.date = self.date.pred_opt().unwrap_or(self.date);
        self.direction = Some(Direction::Backward);
        self.date
    }

    pub fn jump_to(&mut self, date: NaiveDate) -> NaiveDate {
        self.date = date;
        self.direction = Some(Direction::Jump);
        self.date
    }

    /// ISO calendar form used for the gateway filter
    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
