//! Service calendars and weekday patterns.
//!
//! A `DayMask` is a seven-bit weekday set (Monday is bit 0). Calendars carry
//! one alongside a validity range; calendar exceptions add or remove a
//! single date for a service.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Error returned when parsing an invalid `YYYYMMDD` date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date {value:?}: {reason}")]
pub struct InvalidDate {
    value: String,
    reason: &'static str,
}

/// Error returned when parsing an invalid calendar code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid calendar code: {reason}")]
pub struct InvalidDayMask {
    reason: &'static str,
}

/// Parse a feed date in `YYYYMMDD` form.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::parse_feed_date;
/// use chrono::NaiveDate;
///
/// assert_eq!(
///     parse_feed_date("20240315").unwrap(),
///     NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
/// );
/// assert!(parse_feed_date("2024-03-15").is_err());
/// assert!(parse_feed_date("20240230").is_err());
/// ```
pub fn parse_feed_date(s: &str) -> Result<NaiveDate, InvalidDate> {
    let invalid = |reason| InvalidDate {
        value: s.to_string(),
        reason,
    };

    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected YYYYMMDD"));
    }

    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| invalid("no such calendar date"))
}

/// Format a date in `YYYYMMDD` form.
pub fn format_feed_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Serde adapter reading `YYYYMMDD` (or ISO `YYYY-MM-DD`) dates.
pub(crate) mod feed_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_feed_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_feed_date(&s)
            .or_else(|e| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| e))
            .map_err(serde::de::Error::custom)
    }
}

/// A set of weekdays.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::DayMask;
///
/// let weekdays = DayMask::from_code("1111100").unwrap();
/// assert_eq!(weekdays, DayMask::WEEKDAYS);
/// assert_eq!(weekdays.to_code(), "1111100");
/// assert!(weekdays.contains(chrono::Weekday::Wed));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayMask(u8);

impl DayMask {
    /// No days.
    pub const EMPTY: DayMask = DayMask(0);
    /// Monday to Friday.
    pub const WEEKDAYS: DayMask = DayMask(0b001_1111);
    /// Saturday and Sunday.
    pub const WEEKEND: DayMask = DayMask(0b110_0000);
    /// Every day of the week.
    pub const ALL: DayMask = DayMask(0b111_1111);

    /// Build a mask from per-day flags, Monday first.
    pub fn from_flags(flags: [bool; 7]) -> Self {
        flags
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(Self::EMPTY, |mask, (i, _)| DayMask(mask.0 | (1 << i)))
    }

    /// Mask containing a single weekday.
    pub fn single(day: Weekday) -> Self {
        DayMask(1 << day.num_days_from_monday())
    }

    /// Parse a seven-character calendar code such as `"1111100"`.
    pub fn from_code(code: &str) -> Result<Self, InvalidDayMask> {
        if code.len() != 7 {
            return Err(InvalidDayMask {
                reason: "must be exactly 7 characters",
            });
        }

        let mut flags = [false; 7];
        for (i, b) in code.bytes().enumerate() {
            flags[i] = match b {
                b'1' => true,
                b'0' => false,
                _ => {
                    return Err(InvalidDayMask {
                        reason: "must contain only 0 and 1",
                    });
                }
            };
        }

        Ok(Self::from_flags(flags))
    }

    /// The seven-character calendar code for this mask.
    pub fn to_code(&self) -> String {
        (0..7)
            .map(|i| if self.0 & (1 << i) != 0 { '1' } else { '0' })
            .collect()
    }

    /// Per-day flags, Monday first.
    pub fn flags(&self) -> [bool; 7] {
        std::array::from_fn(|i| self.0 & (1 << i) != 0)
    }

    /// Raw bits, Monday in bit 0.
    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::single(day).0 != 0
    }

    pub fn intersects(&self, other: DayMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of days in the mask.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Format the mask as a day list using the given day names (Monday first).
    ///
    /// Runs of three or more consecutive days are collapsed into a range.
    ///
    /// # Examples
    ///
    /// ```
    /// use timetable_server::domain::DayMask;
    ///
    /// let names = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    /// assert_eq!(DayMask::WEEKDAYS.format_list(&names), "Mon - Fri");
    /// assert_eq!(DayMask::WEEKEND.format_list(&names), "Sat, Sun");
    /// assert_eq!(DayMask::from_code("1010100").unwrap().format_list(&names), "Mon, Wed, Fri");
    /// ```
    pub fn format_list<S: AsRef<str>>(&self, names: &[S]) -> String {
        let flags = self.flags();
        let mut parts: Vec<String> = Vec::new();
        let mut i = 0;

        while i < 7 {
            if !flags[i] {
                i += 1;
                continue;
            }
            let start = i;
            while i + 1 < 7 && flags[i + 1] {
                i += 1;
            }
            let end = i;

            let name = |idx: usize| names.get(idx).map(|s| s.as_ref()).unwrap_or("?");
            if end - start >= 2 {
                parts.push(format!("{} - {}", name(start), name(end)));
            } else {
                parts.extend((start..=end).map(|d| name(d).to_string()));
            }
            i += 1;
        }

        parts.join(", ")
    }
}

impl BitOr for DayMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        DayMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for DayMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DayMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        DayMask(self.0 & rhs.0)
    }
}

impl fmt::Debug for DayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DayMask({})", self.to_code())
    }
}

/// Weekly service pattern with a validity range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub service_id: String,
    #[serde(default)]
    pub monday: bool,
    #[serde(default)]
    pub tuesday: bool,
    #[serde(default)]
    pub wednesday: bool,
    #[serde(default)]
    pub thursday: bool,
    #[serde(default)]
    pub friday: bool,
    #[serde(default)]
    pub saturday: bool,
    #[serde(default)]
    pub sunday: bool,
    #[serde(with = "feed_date")]
    pub start_date: NaiveDate,
    #[serde(with = "feed_date")]
    pub end_date: NaiveDate,
}

impl Calendar {
    /// Weekdays this calendar runs on.
    pub fn days(&self) -> DayMask {
        DayMask::from_flags([
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ])
    }

    /// Whether the validity range overlaps `[start, end]`; open ends match anything.
    pub fn overlaps(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
        start.is_none_or(|s| self.end_date >= s) && end.is_none_or(|e| self.start_date <= e)
    }
}

/// Whether a calendar exception adds or removes service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ExceptionType {
    Added,
    Removed,
}

impl TryFrom<u8> for ExceptionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ExceptionType::Added),
            2 => Ok(ExceptionType::Removed),
            other => Err(format!("unknown exception_type {other}")),
        }
    }
}

impl From<ExceptionType> for u8 {
    fn from(value: ExceptionType) -> Self {
        match value {
            ExceptionType::Added => 1,
            ExceptionType::Removed => 2,
        }
    }
}

/// A single-date override of a service calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarException {
    pub service_id: String,
    #[serde(with = "feed_date")]
    pub date: NaiveDate,
    pub exception_type: ExceptionType,
}

impl CalendarException {
    /// Whether the date falls inside `[start, end]`; open ends match anything.
    pub fn within(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
        start.is_none_or(|s| self.date >= s) && end.is_none_or(|e| self.date <= e)
    }

    pub fn weekday(&self) -> DayMask {
        DayMask::single(self.date.weekday())
    }
}
