//! Query windows for the metering API.
//!
//! The metering API takes a pair of naive local timestamps formatted as
//! `YYYY-MM-DD HH:MM:SS`. A window always covers one full calendar day:
//! midnight of the day up to midnight of the following day.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Wire format for window bounds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Nominal end date used by scheduled runs.
pub const SCHEDULED_DATE_TO: &str = "2023-12-31 23:59:59";

/// A `[from, to)` range of local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl TimeWindow {
    /// Midnight of `date` to midnight of the following day.
    pub fn day_of(date: NaiveDate) -> Self {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        Self {
            from: date.and_time(NaiveTime::MIN),
            to: next.and_time(NaiveTime::MIN),
        }
    }

    /// The day containing `now`, evaluated in `tz`.
    pub fn day_containing(now: DateTime<Utc>, tz: Tz) -> Self {
        Self::day_of(tz.from_utc_datetime(&now.naive_utc()).date_naive())
    }

    /// The current day in `tz`.
    pub fn today(tz: Tz) -> Self {
        Self::day_containing(Utc::now(), tz)
    }

    pub fn from_param(&self) -> String {
        format_timestamp(&self.from)
    }

    pub fn to_param(&self) -> String {
        format_timestamp(&self.to)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.from_param(), self.to_param())
    }
}

/// `YYYY-MM-DD`, zero padded, independent of locale.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
