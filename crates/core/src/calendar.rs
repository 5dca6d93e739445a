//! Calendar-date helpers shared by the classifier and the todo aggregator.
//!
//! Reminder and due dates are compared as whole days. Timestamps are
//! truncated in UTC so that a caller's local timezone can never move "today"
//! relative to a stored date.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{CalendarDate, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const WEEK_START_SUNDAY: &str = "sunday";
pub const WEEK_START_MONDAY: &str = "monday";

/// All valid week-start configuration values.
pub const VALID_WEEK_STARTS: &[&str] = &[WEEK_START_SUNDAY, WEEK_START_MONDAY];

// ---------------------------------------------------------------------------
// Week convention
// ---------------------------------------------------------------------------

/// First day of the week used for "due this week" windows.
///
/// Defaults to Sunday, matching the list views the todo filter was built for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Convert from a configuration string (case-insensitive).
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            WEEK_START_SUNDAY => Ok(Self::Sunday),
            WEEK_START_MONDAY => Ok(Self::Monday),
            _ => Err(CoreError::Validation(format!(
                "Invalid week start '{s}'. Must be one of: {}",
                VALID_WEEK_STARTS.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunday => WEEK_START_SUNDAY,
            Self::Monday => WEEK_START_MONDAY,
        }
    }

    /// Number of days `date` lies after the start of its week.
    fn offset_of(&self, date: CalendarDate) -> u64 {
        let weekday = date.weekday();
        let days = match self {
            Self::Sunday => weekday.num_days_from_sunday(),
            Self::Monday => weekday.num_days_from_monday(),
        };
        u64::from(days)
    }
}

// ---------------------------------------------------------------------------
// Truncation and parsing
// ---------------------------------------------------------------------------

/// The UTC calendar date of a timestamp.
pub fn utc_date(ts: Timestamp) -> CalendarDate {
    ts.date_naive()
}

/// Parse a stored date leniently.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (converted to UTC before
/// truncation) and naive `YYYY-MM-DDTHH:MM:SS[.fff]` values. Anything else
/// yields `None` so that a malformed value behaves like an absent one.
pub fn parse_calendar_date(raw: &str) -> Option<CalendarDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(date);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(utc_date(ts.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.date())
}

/// The literal date portion of a stored value (everything before `T`).
///
/// Due dates are stored as dates; when a timestamp slips through, its
/// written day is the intended one, so no timezone conversion happens here.
pub fn date_portion(raw: &str) -> Option<CalendarDate> {
    let head = raw.trim().split('T').next()?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

/// Inclusive first and last day of the week containing `reference`.
///
/// Saturates at the edges of the representable date range instead of
/// overflowing.
pub fn week_bounds(reference: CalendarDate, week_start: WeekStart) -> (CalendarDate, CalendarDate) {
    let offset = week_start.offset_of(reference);
    let start = reference
        .checked_sub_days(Days::new(offset))
        .unwrap_or(NaiveDate::MIN);
    let end = reference
        .checked_add_days(Days::new(6 - offset))
        .unwrap_or(NaiveDate::MAX);
    (start, end)
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: CalendarDate, to: CalendarDate) -> i64 {
    to.signed_duration_since(from).num_days()
}
