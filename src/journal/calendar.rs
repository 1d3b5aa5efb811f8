//! Month grid for the calendar picker.

use chrono::{Datelike, NaiveDate};

/// Weekday header, Sunday first
pub const WEEKDAY_HEADER: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];

/// Every day of one month laid out on a Sunday-first week grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    /// Days from the first to the last of the month
    pub days: Vec<NaiveDate>,
    /// Blank cells before the first day
    pub leading_blanks: u32,
    pub selected: NaiveDate,
}

impl MonthGrid {
    /// Grid for the month containing `date`, with `date` selected
    pub fn for_date(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let days: Vec<NaiveDate> = first
            .iter_days()
            .take_while(|d| d.month() == first.month())
            .collect();

        Self {
            days,
            leading_blanks: first.weekday().num_days_from_sunday(),
            selected: date,
        }
    }

    /// Title such as "March 2024"
    pub fn title(&self) -> String {
        self.selected.format("%B %Y").to_string()
    }

    /// The day with the given day-of-month number
    pub fn day(&self, number: u32) -> Option<NaiveDate> {
        self.days.iter().copied().find(|d| d.day() == number)
    }

    pub fn is_selected(&self, day: NaiveDate) -> bool {
        day == self.selected
    }

    /// Cells row by row; `None` for padding
    pub fn weeks(&self) -> Vec<Vec<Option<NaiveDate>>> {
        let mut cells: Vec<Option<NaiveDate>> = (0..self.leading_blanks).map(|_| None).collect();
        cells.extend(self.days.iter().copied().map(Some));
        while cells.len() % 7 != 0 {
            cells.push(None);
        }
        cells.chunks(7).map(|week| week.to_vec()).collect()
    }
}
