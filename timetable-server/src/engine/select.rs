//! Trip selection for one timetable.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{Frequency, Route, StopTime, TimetableDefinition};
use crate::store::{IdFilter, TransitStore, TripQuery};

use super::config::TimetableConfig;
use super::error::{DataGap, Outcome, TimetableError};
use super::formatted::FormattedTrip;
use super::frequency::expand_frequencies;
use super::services::ServiceSelection;
use super::stops::StopIndex;

/// Trips in a timetable's scope, before ordering.
#[derive(Debug, Clone, Default)]
pub struct TripSelection {
    pub trips: Vec<FormattedTrip>,
    pub frequencies: Vec<Frequency>,
    pub stops: StopIndex,
}

fn group_by_trip<T>(records: Vec<T>, trip_id: impl Fn(&T) -> &str) -> HashMap<String, Vec<T>> {
    let mut grouped: HashMap<String, Vec<T>> = HashMap::new();
    for record in records {
        grouped.entry(trip_id(&record).to_string()).or_default().push(record);
    }
    grouped
}

/// Whether a first departure falls in the definition's `[start_time, end_time)` window.
fn in_window(def: &TimetableDefinition, trip: &FormattedTrip) -> bool {
    let Some(departure) = trip.first_departure() else {
        return true;
    };
    def.start_time.is_none_or(|start| departure >= start)
        && def.end_time.is_none_or(|end| departure < end)
}

/// Select the trips of a timetable's routes, direction and services.
///
/// Templates with frequencies are replaced by their expanded instances. A
/// trip without stop times is kept, with a warning, so later filtering
/// decides its fate.
pub fn select_trips<S: TransitStore + ?Sized>(
    store: &S,
    def: &TimetableDefinition,
    services: &ServiceSelection,
    routes: &[Route],
    config: &TimetableConfig,
) -> Result<Outcome<TripSelection>, TimetableError> {
    let mut warnings = Vec::new();

    let raw_trips = store.trips(&TripQuery {
        route_ids: IdFilter::from(def.route_ids.as_slice()),
        service_ids: IdFilter::from(services.service_ids.as_slice()),
        direction_id: def.direction_id,
        ..TripQuery::default()
    })?;
    if raw_trips.is_empty() {
        debug!(timetable_id = %def.timetable_id, "No trips in scope");
        warnings.push(DataGap::NoTrips);
        return Ok(Outcome::with_warnings(TripSelection::default(), warnings));
    }

    let trip_ids: Vec<String> = raw_trips.iter().map(|t| t.trip_id.clone()).collect();
    let trip_filter = IdFilter::from(trip_ids);
    let mut stop_times = group_by_trip(store.stop_times(&trip_filter)?, |st: &StopTime| {
        st.trip_id.as_str()
    });
    let frequencies = store.frequencies(&trip_filter)?;
    let frequencies_by_trip = group_by_trip(frequencies.clone(), |f: &Frequency| f.trip_id.as_str());

    let mut stops = StopIndex::default();
    let stop_ids: Vec<String> = stop_times
        .values()
        .flatten()
        .map(|st| st.stop_id.clone())
        .collect();
    stops.load(store, stop_ids.iter().cloned())?;
    if let Some(unknown) = stop_ids.iter().filter(|id| !stops.contains(id)).min() {
        return Err(TimetableError::UnknownStop {
            timetable_id: def.timetable_id.clone(),
            stop_id: unknown.clone(),
        });
    }

    let route_names: HashMap<&str, &str> = routes
        .iter()
        .map(|r| (r.route_id.as_str(), r.display_name()))
        .collect();

    let mut trips = Vec::with_capacity(raw_trips.len());
    for raw in raw_trips {
        let mut times = stop_times.remove(&raw.trip_id).unwrap_or_default();
        if times.is_empty() {
            warnings.push(DataGap::MissingStopTimes {
                trip_id: raw.trip_id.clone(),
            });
        }

        if config.use_parent_station {
            for st in &mut times {
                st.stop_id = stops.location(&st.stop_id).to_string();
            }
        }

        // Instances are timed from the template's full stop list, so the
        // timepoint filter runs after expansion.
        let mut expanded = match frequencies_by_trip.get(&raw.trip_id) {
            Some(windows) if !times.is_empty() => {
                expand_frequencies(&raw, &times, windows).into_value(&mut warnings)
            }
            _ => vec![FormattedTrip::new(raw, times)],
        };
        if config.show_only_timepoint {
            for trip in &mut expanded {
                trip.stop_times.retain(StopTime::is_timepoint);
            }
        }

        for mut trip in expanded.into_iter().filter(|t| in_window(def, t)) {
            trip.days = services.days_of(&trip.trip.service_id);
            trip.day_list = trip.days.format_list(&config.days_short_strings);
            trip.route_short_name = route_names
                .get(trip.trip.route_id.as_str())
                .copied()
                .unwrap_or(trip.trip.route_id.as_str())
                .to_string();
            trips.push(trip);
        }
    }

    debug!(
        timetable_id = %def.timetable_id,
        trips = trips.len(),
        "Selected trips"
    );

    Ok(Outcome::with_warnings(
        TripSelection {
            trips,
            frequencies,
            stops,
        },
        warnings,
    ))
}

/// Drop the parts of trips that fall outside the resolved stop list.
///
/// Consecutive visits to the same stop are merged (first arrival, last
/// departure), visits to unlisted stops are removed, and trips left with at
/// most one stop time are dropped.
pub fn filter_to_stops(trips: Vec<FormattedTrip>, stop_ids: &[String]) -> Vec<FormattedTrip> {
    trips
        .into_iter()
        .filter_map(|mut trip| {
            let mut merged: Vec<StopTime> = Vec::with_capacity(trip.stop_times.len());
            for st in trip.stop_times.drain(..) {
                match merged.last_mut() {
                    Some(prev) if prev.stop_id == st.stop_id => {
                        prev.departure_time = st.departure_time.or(prev.departure_time);
                        prev.pickup_type = st.pickup_type;
                    }
                    _ => merged.push(st),
                }
            }
            merged.retain(|st| stop_ids.contains(&st.stop_id));

            if merged.len() <= 1 {
                return None;
            }
            trip.stop_times = merged;
            Some(trip)
        })
        .collect()
}

/// Routes sorted into the order the definition lists them.
pub fn ordered_routes(def: &TimetableDefinition, mut routes: Vec<Route>) -> Vec<Route> {
    routes.sort_by_key(|r| {
        def.route_ids
            .iter()
            .position(|id| id == &r.route_id)
            .unwrap_or(usize::MAX)
    });
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoardingRule, RawTrip, ServiceTime};

    fn trip(id: &str, calls: &[(&str, &str, &str)]) -> FormattedTrip {
        let t = |s: &str| ServiceTime::parse_hms(s).unwrap();
        let stop_times = calls
            .iter()
            .enumerate()
            .map(|(i, (stop, arr, dep))| StopTime {
                trip_id: id.into(),
                stop_id: (*stop).into(),
                stop_sequence: i as u32 + 1,
                arrival_time: Some(t(arr)),
                departure_time: Some(t(dep)),
                pickup_type: BoardingRule::Regular,
                drop_off_type: BoardingRule::Regular,
                timepoint: None,
            })
            .collect();
        FormattedTrip::new(
            RawTrip {
                trip_id: id.into(),
                route_id: "R1".into(),
                service_id: "WK".into(),
                direction_id: None,
                block_id: None,
                trip_headsign: None,
                trip_short_name: None,
            },
            stop_times,
        )
    }

    fn stops(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn merges_repeated_stop() {
        let trips = vec![trip(
            "T1",
            &[
                ("A", "08:00:00", "08:01:00"),
                ("A", "08:03:00", "08:05:00"),
                ("B", "08:10:00", "08:10:00"),
            ],
        )];
        let filtered = filter_to_stops(trips, &stops(&["A", "B"]));

        let first = &filtered[0].stop_times[0];
        assert_eq!(filtered[0].stop_times.len(), 2);
        assert_eq!(first.arrival_time, ServiceTime::parse_hms("08:00:00").ok());
        assert_eq!(first.departure_time, ServiceTime::parse_hms("08:05:00").ok());
    }

    #[test]
    fn drops_unlisted_stops_and_short_trips() {
        let trips = vec![
            trip("T1", &[("A", "08:00:00", "08:00:00"), ("X", "08:05:00", "08:05:00"), ("B", "08:10:00", "08:10:00")]),
            trip("T2", &[("A", "09:00:00", "09:00:00"), ("X", "09:05:00", "09:05:00")]),
        ];
        let filtered = filter_to_stops(trips, &stops(&["A", "B"]));

        assert_eq!(filtered.len(), 1);
        let ids: Vec<&str> = filtered[0].stop_times.iter().map(|st| st.stop_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn window_is_half_open() {
        let mut def = TimetableDefinition::for_routes("TT1", vec!["R1".into()]);
        def.start_time = ServiceTime::parse_hms("08:00:00").ok();
        def.end_time = ServiceTime::parse_hms("09:00:00").ok();

        assert!(in_window(&def, &trip("a", &[("A", "08:00:00", "08:00:00")])));
        assert!(!in_window(&def, &trip("b", &[("A", "09:00:00", "09:00:00")])));
        assert!(!in_window(&def, &trip("c", &[("A", "07:59:59", "07:59:59")])));
        assert!(in_window(&def, &trip("d", &[])));
    }

    #[test]
    fn routes_follow_definition_order() {
        let mut def = TimetableDefinition::for_routes("TT1", vec!["R2".into(), "R1".into()]);
        def.direction_id = Some(0);
        let route = |id: &str| Route {
            route_id: id.into(),
            agency_id: None,
            route_short_name: None,
            route_long_name: None,
            route_color: None,
        };
        let routes = ordered_routes(&def, vec![route("R1"), route("R2")]);
        assert_eq!(routes[0].route_id, "R2");
    }
}
