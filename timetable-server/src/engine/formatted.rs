//! Resolved timetable view objects.
//!
//! These are what renderers consume. A `FormattedTimetable` pairs the
//! ordered trips with the ordered stops; every stop row holds exactly one
//! cell per ordered trip, in the same order.

use serde::Serialize;

use crate::domain::{
    DayMask, Frequency, Orientation, RawTrip, Route, ServiceTime, Stop, StopTime,
};

use super::error::DataGap;
use super::notes::{NotePlacement, ResolvedNote};

/// Where an expanded trip came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyInstance {
    pub template_trip_id: String,
    /// Position among all instances of the template, counting from 0.
    pub index: u32,
    /// The instances follow an exact schedule.
    pub exact_times: bool,
}

/// Another trip the same vehicle runs directly before or after this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContinuationLink {
    pub trip_id: String,
    pub route_id: String,
    pub route_name: String,
    pub headsign: Option<String>,
}

/// A trip with its stop times and display fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedTrip {
    pub trip: RawTrip,
    pub stop_times: Vec<StopTime>,
    pub days: DayMask,
    pub day_list: String,
    pub route_short_name: String,
    pub frequency: Option<FrequencyInstance>,
    pub continues_from: Option<ContinuationLink>,
    pub continues_as: Option<ContinuationLink>,
    pub note_symbols: Vec<String>,
}

impl FormattedTrip {
    pub fn new(trip: RawTrip, stop_times: Vec<StopTime>) -> Self {
        Self {
            trip,
            stop_times,
            days: DayMask::EMPTY,
            day_list: String::new(),
            route_short_name: String::new(),
            frequency: None,
            continues_from: None,
            continues_as: None,
            note_symbols: Vec::new(),
        }
    }

    pub fn trip_id(&self) -> &str {
        &self.trip.trip_id
    }

    /// Departure from the first stop.
    pub fn first_departure(&self) -> Option<ServiceTime> {
        self.stop_times.first().and_then(StopTime::departure_or_arrival)
    }

    /// Departure from the last stop.
    pub fn last_departure(&self) -> Option<ServiceTime> {
        self.stop_times.last().and_then(StopTime::departure_or_arrival)
    }

    /// Arrival at the last stop.
    pub fn last_arrival(&self) -> Option<ServiceTime> {
        self.stop_times.last().and_then(StopTime::arrival_or_departure)
    }

    /// First visit to a stop.
    pub fn stop_time_at(&self, stop_id: &str) -> Option<&StopTime> {
        self.stop_times.iter().find(|st| st.stop_id == stop_id)
    }

    pub fn departure_at(&self, stop_id: &str) -> Option<ServiceTime> {
        self.stop_time_at(stop_id)
            .and_then(StopTime::departure_or_arrival)
    }

    /// Ordered `(stop, departure)` pairs identifying this trip's schedule.
    pub fn departure_signature(&self) -> Vec<(&str, Option<ServiceTime>)> {
        self.stop_times
            .iter()
            .map(|st| (st.stop_id.as_str(), st.departure_or_arrival()))
            .collect()
    }
}

/// Which of a stop's times a row shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    Both,
    Arrival,
    Departure,
}

/// One entry of a resolved stop order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderedStop {
    pub stop_id: String,
    pub kind: StopKind,
}

impl OrderedStop {
    pub fn both(stop_id: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            kind: StopKind::Both,
        }
    }
}

/// Display markers attached to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CellMarker {
    NoPickup,
    NoDropoff,
    RequestPickup,
    RequestDropoff,
    Interpolated,
    NoService,
}

/// What one trip does at one stop row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopCell {
    pub time: Option<ServiceTime>,
    pub text: String,
    pub markers: Vec<CellMarker>,
    /// Configured symbols for `markers`, in the same order.
    pub symbols: Vec<String>,
    pub note_symbols: Vec<String>,
}

/// Meaning of a marker symbol used in a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub marker: CellMarker,
    pub symbol: String,
    pub text: String,
}

impl StopCell {
    pub fn calls(&self) -> bool {
        !self.markers.contains(&CellMarker::NoService)
    }
}

/// A stop row with one cell per ordered trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedStop {
    pub stop: Stop,
    pub kind: StopKind,
    pub trips: Vec<StopCell>,
    pub note_symbols: Vec<String>,
}

/// One fully resolved timetable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedTimetable {
    pub timetable_id: String,
    pub timetable_page_id: String,
    pub timetable_label: String,
    pub direction_id: Option<u8>,
    pub direction_name: Option<String>,
    pub orientation: Orientation,
    pub routes: Vec<Route>,
    pub service_ids: Vec<String>,
    /// `YYYYMMDD`
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// The date range in the configured `date_format`.
    pub start_date_text: Option<String>,
    pub end_date_text: Option<String>,
    pub days: DayMask,
    pub day_list: String,
    pub calendar_code: String,
    pub stops: Vec<FormattedStop>,
    pub ordered_trips: Vec<FormattedTrip>,
    /// Symbols of notes on the whole timetable.
    pub note_symbols: Vec<String>,
    pub notes: Vec<ResolvedNote>,
    /// Markers that appear in the timetable, in marker order.
    pub legend: Vec<LegendEntry>,
    pub note_placements: Vec<NotePlacement>,
    pub frequencies: Vec<Frequency>,
    pub frequency_exact_times: bool,
    pub warnings: Vec<DataGap>,
}

/// A warning raised while building one timetable of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimetableWarning {
    pub timetable_id: String,
    pub warning: DataGap,
    pub message: String,
}

/// Timetables presented together under one page identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedTimetablePage {
    pub timetable_page_id: String,
    pub page_label: String,
    pub filename: Option<String>,
    pub timetables: Vec<FormattedTimetable>,
    pub route_ids: Vec<String>,
    pub days: DayMask,
    pub day_list: String,
    pub warnings: Vec<TimetableWarning>,
}
