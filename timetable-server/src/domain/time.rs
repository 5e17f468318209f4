//! Service time handling for schedule records.
//!
//! Schedules express times as "HH:MM:SS" strings relative to the start of
//! the service day, so trips that run past midnight carry hours of 24 and
//! above. This module keeps those times as plain seconds
//! since the start of the service day, never wrapping them.

use chrono::NaiveTime;
use std::fmt;
use std::ops::{Add, Sub};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Seconds in one calendar day.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// A time of the service day, in seconds since its start.
///
/// Values of a day or more are valid and mean the trip is still running
/// after midnight. Ordering is plain numeric ordering, so `25:10:00` sorts
/// after `23:59:59`.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::ServiceTime;
///
/// let t = ServiceTime::parse_hms("25:10:00").unwrap();
/// assert_eq!(t.seconds(), 25 * 3600 + 600);
/// assert_eq!(t.to_string(), "25:10:00");
/// ```
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Midnight at the start of the service day.
    pub const MIDNIGHT: ServiceTime = ServiceTime(0);

    /// Create a time from seconds since the start of the service day.
    pub const fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Create a time from hour, minute and second components.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Self {
        Self(hour * 3600 + minute * 60 + second)
    }

    /// Parse a time from "H:MM:SS" or "HH:MM:SS" format.
    ///
    /// Hours are unbounded (within `u32` range) to allow after-midnight
    /// times. A leading space, as some feeds emit, is tolerated.
    ///
    /// # Examples
    ///
    /// ```
    /// use timetable_server::domain::ServiceTime;
    ///
    /// assert!(ServiceTime::parse_hms("08:00:00").is_ok());
    /// assert!(ServiceTime::parse_hms("8:00:00").is_ok());
    /// assert!(ServiceTime::parse_hms("26:30:00").is_ok());
    ///
    /// assert!(ServiceTime::parse_hms("08:00").is_err());
    /// assert!(ServiceTime::parse_hms("08:60:00").is_err());
    /// assert!(ServiceTime::parse_hms("ab:00:00").is_err());
    /// ```
    pub fn parse_hms(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.trim_start().split(':');

        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected HH:MM:SS format"));
        };

        if h.is_empty() || h.len() > 3 {
            return Err(TimeError::new("invalid hour digits"));
        }
        let hour = parse_digits(h).ok_or_else(|| TimeError::new("invalid hour digits"))?;

        let minute = parse_two_digits(m).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = parse_two_digits(sec).ok_or_else(|| TimeError::new("invalid second digits"))?;
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Ok(Self::from_hms(hour, minute, second))
    }

    /// Returns seconds since the start of the service day.
    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// Returns whole minutes since the start of the service day.
    pub fn minutes(&self) -> u32 {
        self.0 / 60
    }

    /// Returns the hour, which may be 24 or more.
    pub fn hour(&self) -> u32 {
        self.0 / 3600
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        (self.0 % 3600) / 60
    }

    /// Returns the second (0-59).
    pub fn second(&self) -> u32 {
        self.0 % 60
    }

    /// Whether this time falls after the midnight ending the service day.
    pub fn is_after_midnight(&self) -> bool {
        self.0 >= SECONDS_PER_DAY
    }

    /// The wall-clock time this service time is displayed as.
    pub fn wall_clock(&self) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt(self.0 % SECONDS_PER_DAY, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// Format the wall-clock time with a chrono format string.
    ///
    /// # Examples
    ///
    /// ```
    /// use timetable_server::domain::ServiceTime;
    ///
    /// let t = ServiceTime::parse_hms("25:05:00").unwrap();
    /// assert_eq!(t.format("%H:%M"), "01:05");
    /// ```
    pub fn format(&self, fmt: &str) -> String {
        self.wall_clock().format(fmt).to_string()
    }

    /// Subtract, returning `None` if the result would be negative.
    pub fn checked_sub(&self, other: ServiceTime) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Absolute difference between two times, in seconds.
    pub fn abs_diff(&self, other: ServiceTime) -> u32 {
        self.0.abs_diff(other.0)
    }
}

impl Add<u32> for ServiceTime {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl Sub<u32> for ServiceTime {
    type Output = Self;

    fn sub(self, rhs: u32) -> Self::Output {
        Self(self.0.saturating_sub(rhs))
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({self})")
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

impl TryFrom<String> for ServiceTime {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hms(&value)
    }
}

impl From<ServiceTime> for String {
    fn from(value: ServiceTime) -> Self {
        value.to_string()
    }
}

/// Parse exactly two ASCII digits into a u32.
fn parse_two_digits(s: &str) -> Option<u32> {
    if s.len() != 2 {
        return None;
    }
    parse_digits(s)
}

fn parse_digits(s: &str) -> Option<u32> {
    s.bytes().try_fold(0u32, |acc, b| {
        let d = (b as char).to_digit(10)?;
        acc.checked_mul(10)?.checked_add(d)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ServiceTime {
        ServiceTime::parse_hms(s).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        let time = t("00:00:00");
        assert_eq!(time.seconds(), 0);

        let time = t("14:30:15");
        assert_eq!(time.hour(), 14);
        assert_eq!(time.minute(), 30);
        assert_eq!(time.second(), 15);

        let time = t("7:05:00");
        assert_eq!(time.hour(), 7);
        assert_eq!(time.minute(), 5);
    }

    #[test]
    fn parse_after_midnight() {
        let time = t("24:00:00");
        assert_eq!(time.seconds(), SECONDS_PER_DAY);
        assert!(time.is_after_midnight());

        let time = t("27:15:00");
        assert_eq!(time.hour(), 27);
        assert!(!t("23:59:59").is_after_midnight());
    }

    #[test]
    fn parse_tolerates_leading_space() {
        assert_eq!(t(" 08:00:00"), t("08:00:00"));
    }

    #[test]
    fn parse_invalid_format() {
        assert!(ServiceTime::parse_hms("").is_err());
        assert!(ServiceTime::parse_hms("08:00").is_err());
        assert!(ServiceTime::parse_hms("08:00:00:00").is_err());
        assert!(ServiceTime::parse_hms("08-00-00").is_err());
        assert!(ServiceTime::parse_hms("08:0:00").is_err());
        assert!(ServiceTime::parse_hms("ab:cd:ef").is_err());
        assert!(ServiceTime::parse_hms(":00:00").is_err());
    }

    #[test]
    fn parse_invalid_values() {
        assert!(ServiceTime::parse_hms("12:60:00").is_err());
        assert!(ServiceTime::parse_hms("12:00:60").is_err());
    }

    #[test]
    fn display_format() {
        assert_eq!(t("8:05:00").to_string(), "08:05:00");
        assert_eq!(t("25:10:30").to_string(), "25:10:30");
    }

    #[test]
    fn wall_clock_wraps() {
        assert_eq!(t("25:10:00").format("%H:%M"), "01:10");
        assert_eq!(t("13:45:00").format("%-I:%M%P"), "1:45pm");
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(t("23:59:59") < t("24:00:00"));
        assert!(t("9:00:00") < t("10:00:00"));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(t("08:00:00") + 600, t("08:10:00"));
        assert_eq!(t("08:00:00") - 3600, t("07:00:00"));
        assert_eq!(t("00:10:00") - 3600, ServiceTime::MIDNIGHT);
        assert_eq!(t("08:00:00").checked_sub(t("09:00:00")), None);
        assert_eq!(t("08:00:00").abs_diff(t("08:10:00")), 600);
    }

    #[test]
    fn serde_roundtrip_as_string() {
        let json = serde_json::to_string(&t("25:00:00")).unwrap();
        assert_eq!(json, "\"25:00:00\"");

        let parsed: ServiceTime = serde_json::from_str("\"06:30:00\"").unwrap();
        assert_eq!(parsed, t("06:30:00"));

        assert!(serde_json::from_str::<ServiceTime>("\"6:30\"").is_err());
    }
}
