//! Summary counts for a built page.

use std::collections::HashSet;

use serde::Serialize;

use super::formatted::FormattedTimetablePage;

/// Distinct stops, trips, routes and services shown on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimetableStats {
    pub stops: usize,
    pub trips: usize,
    pub routes: usize,
    pub calendars: usize,
}

/// Count what a page shows, each item once however many timetables show it.
pub fn generate_stats(page: &FormattedTimetablePage) -> TimetableStats {
    let mut stops = HashSet::new();
    let mut trips = HashSet::new();
    let mut routes = HashSet::new();
    let mut calendars = HashSet::new();

    for timetable in &page.timetables {
        stops.extend(timetable.stops.iter().map(|s| s.stop.stop_id.as_str()));
        routes.extend(timetable.routes.iter().map(|r| r.route_id.as_str()));
        for trip in &timetable.ordered_trips {
            trips.insert(trip.trip.trip_id.as_str());
            calendars.insert(trip.trip.service_id.as_str());
        }
    }

    TimetableStats {
        stops: stops.len(),
        trips: trips.len(),
        routes: routes.len(),
        calendars: calendars.len(),
    }
}
