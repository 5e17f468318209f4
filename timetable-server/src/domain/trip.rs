//! Trip and stop time records.
//!
//! A `RawTrip` is one vehicle run as it appears in the feed. Its `StopTime`s
//! are ordered by `stop_sequence` and carry the times and boarding rules at
//! each stop.

use serde::{Deserialize, Serialize};

use super::ServiceTime;

/// A trip as stored in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTrip {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    #[serde(default)]
    pub direction_id: Option<u8>,
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub trip_headsign: Option<String>,
    #[serde(default)]
    pub trip_short_name: Option<String>,
}

impl RawTrip {
    /// The block id, if present and non-empty.
    pub fn block(&self) -> Option<&str> {
        self.block_id.as_deref().filter(|b| !b.is_empty())
    }
}

/// Pickup or drop-off availability at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BoardingRule {
    /// Regularly scheduled.
    #[default]
    Regular,
    /// Not available.
    NotAvailable,
    /// Must phone the agency.
    PhoneAgency,
    /// Must ask the driver.
    CoordinateWithDriver,
}

impl BoardingRule {
    /// Whether riders have to make a request for the vehicle to stop.
    pub fn is_on_request(&self) -> bool {
        matches!(
            self,
            BoardingRule::PhoneAgency | BoardingRule::CoordinateWithDriver
        )
    }
}

impl TryFrom<u8> for BoardingRule {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BoardingRule::Regular),
            1 => Ok(BoardingRule::NotAvailable),
            2 => Ok(BoardingRule::PhoneAgency),
            3 => Ok(BoardingRule::CoordinateWithDriver),
            other => Err(format!("unknown pickup/drop-off type {other}")),
        }
    }
}

impl From<BoardingRule> for u8 {
    fn from(value: BoardingRule) -> Self {
        match value {
            BoardingRule::Regular => 0,
            BoardingRule::NotAvailable => 1,
            BoardingRule::PhoneAgency => 2,
            BoardingRule::CoordinateWithDriver => 3,
        }
    }
}

/// A trip's visit to one stop.
///
/// Arrival and departure are optional: feeds leave them blank at stops
/// whose time is interpolated by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_sequence: u32,
    #[serde(default)]
    pub arrival_time: Option<ServiceTime>,
    #[serde(default)]
    pub departure_time: Option<ServiceTime>,
    #[serde(default)]
    pub pickup_type: BoardingRule,
    #[serde(default)]
    pub drop_off_type: BoardingRule,
    /// 1 for exact times, 0 for approximate; absent means exact when times are given.
    #[serde(default)]
    pub timepoint: Option<u8>,
}

impl StopTime {
    /// Departure time, falling back to arrival.
    pub fn departure_or_arrival(&self) -> Option<ServiceTime> {
        self.departure_time.or(self.arrival_time)
    }

    /// Arrival time, falling back to departure.
    pub fn arrival_or_departure(&self) -> Option<ServiceTime> {
        self.arrival_time.or(self.departure_time)
    }

    /// Whether this stop time counts as a timepoint.
    ///
    /// Explicit `timepoint == 1` counts; an unset flag counts only when both
    /// arrival and departure are present.
    pub fn is_timepoint(&self) -> bool {
        match self.timepoint {
            Some(flag) => flag == 1,
            None => self.arrival_time.is_some() && self.departure_time.is_some(),
        }
    }

    /// Whether the time shown here is an estimate rather than exact.
    pub fn is_interpolated(&self) -> bool {
        self.timepoint == Some(0)
    }

    /// Return a copy with both times shifted by `delta` seconds (may be negative).
    pub fn shifted(&self, delta: i64) -> Self {
        let shift = |t: ServiceTime| {
            let secs = (i64::from(t.seconds()) + delta).max(0);
            ServiceTime::from_seconds(u32::try_from(secs).unwrap_or(u32::MAX))
        };
        Self {
            arrival_time: self.arrival_time.map(shift),
            departure_time: self.departure_time.map(shift),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ServiceTime {
        ServiceTime::parse_hms(s).unwrap()
    }

    fn stop_time(arr: Option<&str>, dep: Option<&str>, timepoint: Option<u8>) -> StopTime {
        StopTime {
            trip_id: "T1".into(),
            stop_id: "A".into(),
            stop_sequence: 1,
            arrival_time: arr.map(t),
            departure_time: dep.map(t),
            pickup_type: BoardingRule::Regular,
            drop_off_type: BoardingRule::Regular,
            timepoint,
        }
    }

    #[test]
    fn timepoint_rules() {
        assert!(stop_time(Some("08:00:00"), Some("08:00:00"), None).is_timepoint());
        assert!(!stop_time(None, Some("08:00:00"), None).is_timepoint());
        assert!(stop_time(None, None, Some(1)).is_timepoint());
        assert!(!stop_time(Some("08:00:00"), Some("08:00:00"), Some(0)).is_timepoint());
        assert!(stop_time(None, None, Some(0)).is_interpolated());
    }

    #[test]
    fn time_fallbacks() {
        let st = stop_time(Some("08:00:00"), None, None);
        assert_eq!(st.departure_or_arrival(), Some(t("08:00:00")));
        let st = stop_time(None, Some("08:05:00"), None);
        assert_eq!(st.arrival_or_departure(), Some(t("08:05:00")));
    }

    #[test]
    fn shift_both_directions() {
        let st = stop_time(Some("08:00:00"), Some("08:02:00"), None);
        let later = st.shifted(600);
        assert_eq!(later.arrival_time, Some(t("08:10:00")));
        assert_eq!(later.departure_time, Some(t("08:12:00")));

        let earlier = st.shifted(-8 * 3600);
        assert_eq!(earlier.arrival_time, Some(ServiceTime::MIDNIGHT));
        assert_eq!(earlier.departure_time, Some(t("00:02:00")));
    }

    #[test]
    fn block_ignores_empty() {
        let mut trip = RawTrip {
            trip_id: "T1".into(),
            route_id: "R1".into(),
            service_id: "S".into(),
            direction_id: Some(0),
            block_id: Some(String::new()),
            trip_headsign: None,
            trip_short_name: None,
        };
        assert_eq!(trip.block(), None);
        trip.block_id = Some("B1".into());
        assert_eq!(trip.block(), Some("B1"));
    }

    #[test]
    fn deserialize_with_defaults() {
        let st: StopTime = serde_json::from_str(
            r#"{"trip_id":"T1","stop_id":"A","stop_sequence":3,"departure_time":"25:00:00","pickup_type":2}"#,
        )
        .unwrap();
        assert_eq!(st.arrival_time, None);
        assert_eq!(st.departure_time, Some(t("25:00:00")));
        assert_eq!(st.pickup_type, BoardingRule::PhoneAgency);
        assert!(st.pickup_type.is_on_request());
        assert_eq!(st.drop_off_type, BoardingRule::Regular);
    }
}
