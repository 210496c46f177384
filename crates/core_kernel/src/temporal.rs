//! Effective-dated validity windows
//!
//! Rows in the schema are never changed in place when a party, payment method
//! or rate changes. Instead the current row's window is closed and a new row
//! is inserted whose window starts where the old one ended. This module holds
//! the window value object and the timezone used for "today" defaults.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

/// `9999-12-31T23:59:59.999999Z` in microseconds since the epoch
const END_OF_TIME_MICROS: i64 = 253_402_300_799_999_999;

/// The sentinel "maximum" instant used for open-ended windows
pub fn end_of_time() -> DateTime<Utc> {
    DateTime::from_timestamp_micros(END_OF_TIME_MICROS).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Timezone wrapper used to decide when "today" starts
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Timezone {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s)
            .map(Timezone)
            .map_err(|_| TemporalError::UnknownTimezone(s.to_string()))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Gets the start of day (00:00:00) in this timezone as UTC
    ///
    /// On days where local midnight does not exist the earliest valid
    /// local time is used.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        midnight
            .and_local_timezone(self.0)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    }

    /// Today's date in this timezone
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.0).date_naive()
    }

    /// Start of today in this timezone, as UTC
    pub fn start_of_today(&self) -> DateTime<Utc> {
        self.start_of_day(self.today())
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// Errors related to validity windows
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid window: start {start} must be before end {end}")]
    InvalidWindow {
        start: String,
        end: String,
    },

    #[error("Instant {at} lies outside the window [{start}, {end})")]
    OutsideWindow {
        at: String,
        start: String,
        end: String,
    },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// The window during which a row is in effect
///
/// Stored as `from_dttm` / `to_dttm`. The start is inclusive and the end is
/// exclusive; an unspecified end is the [`end_of_time`] sentinel rather than
/// NULL so that range predicates never need a NULL branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Validity {
    /// Start of the window (inclusive)
    #[cfg_attr(feature = "sqlx", sqlx(rename = "from_dttm"))]
    pub valid_from: DateTime<Utc>,
    /// End of the window (exclusive)
    #[cfg_attr(feature = "sqlx", sqlx(rename = "to_dttm"))]
    pub valid_until: DateTime<Utc>,
}

impl Validity {
    /// Creates a window, rejecting empty or inverted ranges
    pub fn new(valid_from: DateTime<Utc>, valid_until: DateTime<Utc>) -> Result<Self, TemporalError> {
        if valid_from >= valid_until {
            return Err(TemporalError::InvalidWindow {
                start: valid_from.to_string(),
                end: valid_until.to_string(),
            });
        }
        Ok(Self { valid_from, valid_until })
    }

    /// Creates a window with no end
    pub fn open_ended(valid_from: DateTime<Utc>) -> Self {
        Self {
            valid_from,
            valid_until: end_of_time(),
        }
    }

    /// Creates an open-ended window starting at the beginning of today
    pub fn starting_today(tz: &Timezone) -> Self {
        Self::open_ended(tz.start_of_today())
    }

    /// Returns true while `valid_from <= at < valid_until`
    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at && at < self.valid_until
    }

    /// Returns true if the window still runs to the sentinel
    pub fn is_open_ended(&self) -> bool {
        self.valid_until >= end_of_time()
    }

    /// Returns true if this window overlaps with another
    pub fn overlaps(&self, other: &Validity) -> bool {
        self.valid_from < other.valid_until && other.valid_from < self.valid_until
    }

    /// Closes the window at the given instant
    ///
    /// The instant must fall strictly after the start and no later than the
    /// current end.
    pub fn close_at(&mut self, at: DateTime<Utc>) -> Result<(), TemporalError> {
        if at <= self.valid_from || at > self.valid_until {
            return Err(self.outside(at));
        }
        self.valid_until = at;
        Ok(())
    }

    /// The window of the row that replaces this one from `at` onwards
    pub fn successor_at(&self, at: DateTime<Utc>) -> Result<Validity, TemporalError> {
        if !self.is_effective_at(at) || at == self.valid_from {
            return Err(self.outside(at));
        }
        Validity::new(at, self.valid_until)
    }

    /// Returns the duration of the window, if it has a real end
    pub fn duration(&self) -> Option<chrono::Duration> {
        (!self.is_open_ended()).then(|| self.valid_until - self.valid_from)
    }

    fn outside(&self, at: DateTime<Utc>) -> TemporalError {
        TemporalError::OutsideWindow {
            at: at.to_string(),
            start: self.valid_from.to_string(),
            end: self.valid_until.to_string(),
        }
    }
}

impl Default for Validity {
    fn default() -> Self {
        Self::starting_today(&Timezone::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_end_of_time_sentinel() {
        let sentinel = end_of_time();
        assert_eq!(sentinel.year(), 9999);
        assert_eq!(sentinel.month(), 12);
        assert_eq!(sentinel.day(), 31);
        assert_eq!(sentinel.nanosecond(), 999_999_000);
    }

    #[test]
    fn test_default_window_is_open_ended_from_midnight() {
        let window = Validity::default();
        assert!(window.is_open_ended());
        assert_eq!(window.valid_from.hour(), 0);
        assert!(window.is_effective_at(Utc::now()));
    }

    #[test]
    fn test_window_end_is_exclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let window = Validity::new(start, end).unwrap();

        assert!(window.is_effective_at(start));
        assert!(!window.is_effective_at(end));
    }

    #[test]
    fn test_london_midnight_in_summer() {
        let tz: Timezone = "Europe/London".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let start = tz.start_of_day(date);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 30, 23, 0, 0).unwrap());
    }
}
