//! Inclusive date ranges used by listings and reports.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Inclusive `[start, end]` range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included.
    pub start: NaiveDate,
    /// Last day included.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    ///
    /// # Errors
    ///
    /// Returns a validation error on `start_date` when the range is inverted.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, LedgerError> {
        if start > end {
            return Err(LedgerError::validation(
                "start_date",
                format!("start_date {start} is after end_date {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// The calendar month containing `date`.
    #[must_use]
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(start);
        Self { start, end }
    }

    /// First of the month through `today`.
    #[must_use]
    pub fn month_to_date(today: NaiveDate) -> Self {
        Self {
            start: today.with_day(1).unwrap_or(today),
            end: today,
        }
    }

    /// Parses a `YYYY-MM` month into its full date range.
    ///
    /// # Errors
    ///
    /// Returns a validation error on `month` for anything else.
    pub fn parse_month(month: &str) -> Result<Self, LedgerError> {
        NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
            .ok()
            .filter(|_| month.len() == 7)
            .map(Self::month_of)
            .ok_or_else(|| LedgerError::validation("month", "month must be in YYYY-MM format"))
    }

    /// Returns true if the given date falls within this range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Formats the month of `start` as `YYYY-MM`.
    #[must_use]
    pub fn month_label(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }
}
