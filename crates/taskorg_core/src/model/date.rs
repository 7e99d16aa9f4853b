//! Calendar-day due dates and the `MM/DD/YYYY` boundary format.
//!
//! # Invariants
//! - Only exact `MM/DD/YYYY` text naming a real calendar date parses.
//! - Every `DueDate` formats back to text that parses to the same value.

use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// `chrono` pattern for the boundary date format.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

const MAX_YEAR: i32 = 9999;

static DATE_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid date shape regex"));

/// Date parsing or arithmetic failure (`MalformedDate`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Input text is not a real `MM/DD/YYYY` date.
    Malformed(String),
    /// Adding `days` to `date` leaves the representable range.
    OutOfRange { date: DueDate, days: u32 },
}

impl Display for DateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => {
                write!(f, "malformed date `{value}`; expected MM/DD/YYYY")
            }
            Self::OutOfRange { date, days } => {
                write!(f, "date {date} plus {days} day(s) is out of range")
            }
        }
    }
}

impl Error for DateError {}

/// Task due date with calendar-day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DueDate(NaiveDate);

impl DueDate {
    /// Parses boundary text in `MM/DD/YYYY` form.
    ///
    /// Single-digit fields, surrounding whitespace and impossible dates
    /// (`02/30/2024`) are rejected.
    pub fn parse(text: &str) -> Result<Self, DateError> {
        if !DATE_SHAPE_RE.is_match(text) {
            return Err(DateError::Malformed(text.to_string()));
        }
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(Self)
            .map_err(|_| DateError::Malformed(text.to_string()))
    }

    /// Returns this date shifted forward by `days`.
    ///
    /// Fails instead of wrapping or producing a year the text format cannot
    /// carry.
    pub fn checked_add_days(self, days: u32) -> Result<Self, DateError> {
        self.0
            .checked_add_days(Days::new(u64::from(days)))
            .filter(|date| date.year() <= MAX_YEAR)
            .map(Self)
            .ok_or(DateError::OutOfRange { date: self, days })
    }

    /// Whether this date is strictly before `today`.
    pub fn is_before(&self, today: NaiveDate) -> bool {
        self.0 < today
    }
}

impl Display for DueDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for DueDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DueDate {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DueDate> for String {
    fn from(value: DueDate) -> Self {
        value.to_string()
    }
}

/// Returns whether `date_string` is a valid `MM/DD/YYYY` date.
///
/// Callers at the input boundary must check this before building tasks from
/// user text.
pub fn validate_date(date_string: &str) -> bool {
    DueDate::parse(date_string).is_ok()
}
