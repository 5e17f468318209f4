//! Headway-based service definitions.

use serde::{Deserialize, Serialize};

use super::ServiceTime;

/// A headway window for a template trip.
///
/// The window is half-open: vehicles leave at `start_time`,
/// `start_time + headway_secs`, ... while strictly before `end_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub trip_id: String,
    pub start_time: ServiceTime,
    pub end_time: ServiceTime,
    pub headway_secs: u32,
    /// 1 when the departures are an exact schedule rather than a headway promise.
    #[serde(default)]
    pub exact_times: Option<u8>,
}

impl Frequency {
    pub fn is_exact(&self) -> bool {
        self.exact_times == Some(1)
    }

    /// Number of departures this window produces.
    ///
    /// # Examples
    ///
    /// ```
    /// use timetable_server::domain::{Frequency, ServiceTime};
    ///
    /// let freq = Frequency {
    ///     trip_id: "T1".into(),
    ///     start_time: ServiceTime::parse_hms("06:00:00").unwrap(),
    ///     end_time: ServiceTime::parse_hms("07:00:00").unwrap(),
    ///     headway_secs: 600,
    ///     exact_times: None,
    /// };
    /// assert_eq!(freq.departure_count(), 6);
    /// ```
    pub fn departure_count(&self) -> u32 {
        if self.headway_secs == 0 {
            return 0;
        }
        let span = self.end_time.seconds().saturating_sub(self.start_time.seconds());
        span.div_ceil(self.headway_secs)
    }
}
