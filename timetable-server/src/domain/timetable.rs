//! Timetable and timetable page definitions.
//!
//! These are the configured inputs describing which schedules to build. Dates
//! stay as raw `YYYYMMDD` strings here: a bad date only makes the one
//! timetable that carries it unusable, so it is validated at build time.

use serde::{Deserialize, Serialize};

use super::{DayMask, ServiceTime};

/// Layout hint for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Stops as rows, trips as columns.
    #[default]
    Vertical,
    /// Trips as rows, stops as columns.
    Horizontal,
    /// Grouped by hour.
    Hourly,
}

/// One configured timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableDefinition {
    pub timetable_id: String,
    #[serde(default)]
    pub timetable_page_id: Option<String>,
    pub route_ids: Vec<String>,
    #[serde(default)]
    pub direction_id: Option<u8>,
    /// Explicit services; when empty, services are resolved from calendars.
    #[serde(default)]
    pub service_ids: Vec<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
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
    #[serde(default)]
    pub include_exceptions: bool,
    #[serde(default)]
    pub start_time: Option<ServiceTime>,
    #[serde(default)]
    pub end_time: Option<ServiceTime>,
    #[serde(default)]
    pub timetable_label: Option<String>,
    #[serde(default)]
    pub direction_name: Option<String>,
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub timetable_sequence: Option<u32>,
    #[serde(default)]
    pub show_trip_continuation: Option<bool>,
}

impl TimetableDefinition {
    /// A definition covering the given routes with every other option unset.
    pub fn for_routes(timetable_id: impl Into<String>, route_ids: Vec<String>) -> Self {
        Self {
            timetable_id: timetable_id.into(),
            timetable_page_id: None,
            route_ids,
            direction_id: None,
            service_ids: Vec::new(),
            start_date: None,
            end_date: None,
            monday: false,
            tuesday: false,
            wednesday: false,
            thursday: false,
            friday: false,
            saturday: false,
            sunday: false,
            include_exceptions: false,
            start_time: None,
            end_time: None,
            timetable_label: None,
            direction_name: None,
            orientation: None,
            timetable_sequence: None,
            show_trip_continuation: None,
        }
    }

    /// Configured weekdays; no flags set means every day.
    pub fn days(&self) -> DayMask {
        let mask = DayMask::from_flags([
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ]);
        if mask.is_empty() { DayMask::ALL } else { mask }
    }

    /// Page this timetable is shown on; its own id when unassigned.
    pub fn page_id(&self) -> &str {
        self.timetable_page_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.timetable_id)
    }

    pub fn shows_continuations(&self) -> bool {
        self.show_trip_continuation.unwrap_or(true)
    }
}

/// A configured page grouping timetables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetablePageRecord {
    pub timetable_page_id: String,
    #[serde(default)]
    pub page_label: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// One row of a manually specified stop order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopOrderEntry {
    pub timetable_id: String,
    pub stop_id: String,
    pub stop_sequence: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_default_to_all() {
        let mut def = TimetableDefinition::for_routes("T1", vec!["R1".into()]);
        assert_eq!(def.days(), DayMask::ALL);

        def.saturday = true;
        def.sunday = true;
        assert_eq!(def.days(), DayMask::WEEKEND);
    }

    #[test]
    fn page_id_falls_back_to_timetable() {
        let mut def = TimetableDefinition::for_routes("T1", vec![]);
        assert_eq!(def.page_id(), "T1");
        def.timetable_page_id = Some("P1".into());
        assert_eq!(def.page_id(), "P1");
    }

    #[test]
    fn deserialize_minimal() {
        let def: TimetableDefinition = serde_json::from_str(
            r#"{"timetable_id":"T1","route_ids":["R1"],"orientation":"horizontal","start_time":"06:00:00"}"#,
        )
        .unwrap();
        assert_eq!(def.orientation, Some(Orientation::Horizontal));
        assert_eq!(def.start_time, Some(ServiceTime::from_hms(6, 0, 0)));
        assert!(def.shows_continuations());
        assert!(!def.include_exceptions);
    }
}
