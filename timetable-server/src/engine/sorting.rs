//! Chronological trip ordering and duplicate removal.
//!
//! Each `SortingAlgorithm` has its own `TripSorter`. A sorter orders the
//! trips in place and reports the stop it compared at, which deduplication
//! then uses to group candidate duplicates.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::domain::ServiceTime;

use super::config::SortingAlgorithm;
use super::formatted::FormattedTrip;

/// Orders trips chronologically.
pub trait TripSorter {
    /// Sort `trips` in place, returning the stop the trips were compared at,
    /// if a single one was used.
    fn sort(&self, trips: &mut [FormattedTrip]) -> Option<String>;
}

/// Sort by first departure, then last departure.
pub struct BeginningSorter;

/// Sort by last departure, then first departure.
pub struct EndSorter;

/// Sort by departure at the first stop of the longest trip.
pub struct FirstStopSorter;

/// Sort by departure at the last stop of the longest trip.
pub struct LastStopSorter;

/// Sort by departure at a stop every trip serves.
pub struct CommonStopSorter;

impl SortingAlgorithm {
    pub fn sorter(&self) -> &'static dyn TripSorter {
        match self {
            SortingAlgorithm::Common => &CommonStopSorter,
            SortingAlgorithm::Beginning => &BeginningSorter,
            SortingAlgorithm::End => &EndSorter,
            SortingAlgorithm::First => &FirstStopSorter,
            SortingAlgorithm::Last => &LastStopSorter,
        }
    }
}

/// Missing times sort after every present time.
fn cmp_time(a: Option<ServiceTime>, b: Option<ServiceTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The trip with the most stop times; the earliest such trip on ties.
fn longest_trip(trips: &[FormattedTrip]) -> Option<&FormattedTrip> {
    trips.iter().fold(None, |best: Option<&FormattedTrip>, trip| match best {
        Some(b) if b.stop_times.len() >= trip.stop_times.len() => Some(b),
        _ => Some(trip),
    })
}

fn sort_at_stop(trips: &mut [FormattedTrip], stop_id: &str) {
    trips.sort_by(|a, b| cmp_time(a.departure_at(stop_id), b.departure_at(stop_id)));
}

impl TripSorter for BeginningSorter {
    fn sort(&self, trips: &mut [FormattedTrip]) -> Option<String> {
        trips.sort_by(|a, b| {
            cmp_time(a.first_departure(), b.first_departure())
                .then_with(|| cmp_time(a.last_departure(), b.last_departure()))
        });
        None
    }
}

impl TripSorter for EndSorter {
    fn sort(&self, trips: &mut [FormattedTrip]) -> Option<String> {
        trips.sort_by(|a, b| {
            cmp_time(a.last_departure(), b.last_departure())
                .then_with(|| cmp_time(a.first_departure(), b.first_departure()))
        });
        None
    }
}

impl TripSorter for FirstStopSorter {
    fn sort(&self, trips: &mut [FormattedTrip]) -> Option<String> {
        let stop_id = longest_trip(trips)?.stop_times.first()?.stop_id.clone();
        sort_at_stop(trips, &stop_id);
        Some(stop_id)
    }
}

impl TripSorter for LastStopSorter {
    fn sort(&self, trips: &mut [FormattedTrip]) -> Option<String> {
        let stop_id = longest_trip(trips)?.stop_times.last()?.stop_id.clone();
        sort_at_stop(trips, &stop_id);
        Some(stop_id)
    }
}

/// A stop visited by every trip with an arrival time, in the longest trip's
/// order. A loop's first stop is skipped since it is also its last.
pub fn find_common_stop(trips: &[FormattedTrip]) -> Option<String> {
    let longest = longest_trip(trips)?;
    let is_loop = match (longest.stop_times.first(), longest.stop_times.last()) {
        (Some(first), Some(last)) => longest.stop_times.len() > 1 && first.stop_id == last.stop_id,
        _ => false,
    };

    longest
        .stop_times
        .iter()
        .skip(usize::from(is_loop))
        .map(|st| st.stop_id.as_str())
        .find(|stop_id| {
            trips.iter().all(|trip| {
                trip.stop_time_at(stop_id)
                    .is_some_and(|st| st.arrival_time.is_some())
            })
        })
        .map(str::to_string)
}

impl TripSorter for CommonStopSorter {
    fn sort(&self, trips: &mut [FormattedTrip]) -> Option<String> {
        match find_common_stop(trips) {
            Some(stop_id) => {
                sort_at_stop(trips, &stop_id);
                Some(stop_id)
            }
            None => {
                debug!("No common stop; sorting by first departure");
                BeginningSorter.sort(trips)
            }
        }
    }
}

/// Drop trips whose full schedule repeats an earlier kept trip.
///
/// Trips are grouped by their departure at `comparator` (or at their own
/// first stop); within a group a trip is kept only if no kept trip has the
/// same ordered stop and departure sequence. Relative order is preserved.
pub fn deduplicate(trips: Vec<FormattedTrip>, comparator: Option<&str>) -> Vec<FormattedTrip> {
    let before = trips.len();
    let mut kept: Vec<FormattedTrip> = Vec::with_capacity(trips.len());
    let mut groups: HashMap<Option<ServiceTime>, Vec<usize>> = HashMap::new();

    for trip in trips {
        let key = comparator
            .and_then(|stop_id| trip.stop_time_at(stop_id))
            .or(trip.stop_times.first())
            .and_then(|st| st.departure_or_arrival());

        let group = groups.entry(key).or_default();
        let duplicate = group
            .iter()
            .any(|&i| kept[i].departure_signature() == trip.departure_signature());

        if !duplicate {
            group.push(kept.len());
            kept.push(trip);
        }
    }

    if kept.len() < before {
        debug!(removed = before - kept.len(), "Removed duplicate trips");
    }

    kept
}

/// Sort trips with the configured algorithm, then remove duplicates.
pub fn sort_and_deduplicate(
    mut trips: Vec<FormattedTrip>,
    algorithm: SortingAlgorithm,
) -> Vec<FormattedTrip> {
    let comparator = algorithm.sorter().sort(&mut trips);
    deduplicate(trips, comparator.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoardingRule, RawTrip, StopTime};

    fn t(s: &str) -> ServiceTime {
        ServiceTime::parse_hms(s).unwrap()
    }

    fn trip(id: &str, calls: &[(&str, &str)]) -> FormattedTrip {
        let stop_times = calls
            .iter()
            .enumerate()
            .map(|(i, (stop, time))| StopTime {
                trip_id: id.into(),
                stop_id: (*stop).into(),
                stop_sequence: i as u32 + 1,
                arrival_time: Some(t(time)),
                departure_time: Some(t(time)),
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
                direction_id: Some(0),
                block_id: None,
                trip_headsign: None,
                trip_short_name: None,
            },
            stop_times,
        )
    }

    fn ids(trips: &[FormattedTrip]) -> Vec<&str> {
        trips.iter().map(FormattedTrip::trip_id).collect()
    }

    /// A short trip starting late at B, and two full trips.
    fn sample() -> Vec<FormattedTrip> {
        vec![
            trip("short", &[("B", "08:05:00"), ("C", "08:15:00")]),
            trip("late", &[("A", "09:00:00"), ("B", "09:10:00"), ("C", "09:20:00")]),
            trip("early", &[("A", "07:00:00"), ("B", "07:10:00"), ("C", "07:20:00")]),
        ]
    }

    #[test]
    fn beginning_sorts_by_first_departure() {
        let mut trips = sample();
        assert_eq!(BeginningSorter.sort(&mut trips), None);
        assert_eq!(ids(&trips), vec!["early", "short", "late"]);
    }

    #[test]
    fn end_sorts_by_last_departure() {
        let mut trips = vec![
            trip("x", &[("A", "07:00:00"), ("C", "09:00:00")]),
            trip("y", &[("A", "07:30:00"), ("C", "08:00:00")]),
        ];
        EndSorter.sort(&mut trips);
        assert_eq!(ids(&trips), vec!["y", "x"]);
    }

    #[test]
    fn first_stop_of_longest_trip() {
        let mut trips = sample();
        assert_eq!(FirstStopSorter.sort(&mut trips).as_deref(), Some("A"));
        // "short" never calls at A and sorts last.
        assert_eq!(ids(&trips), vec!["early", "late", "short"]);
    }

    #[test]
    fn last_stop_of_longest_trip() {
        let mut trips = sample();
        assert_eq!(LastStopSorter.sort(&mut trips).as_deref(), Some("C"));
        assert_eq!(ids(&trips), vec!["early", "short", "late"]);
    }

    #[test]
    fn common_stop_used_when_shared() {
        let mut trips = sample();
        assert_eq!(CommonStopSorter.sort(&mut trips).as_deref(), Some("B"));
        assert_eq!(ids(&trips), vec!["early", "short", "late"]);
    }

    #[test]
    fn common_stop_skips_loop_start() {
        let trips = vec![
            trip("loop", &[("A", "07:00:00"), ("B", "07:10:00"), ("A", "07:20:00")]),
            trip("other", &[("A", "08:00:00"), ("B", "08:10:00")]),
        ];
        assert_eq!(find_common_stop(&trips).as_deref(), Some("B"));
    }

    #[test]
    fn common_stop_requires_arrival() {
        let mut trips = sample();
        trips[0].stop_times[0].arrival_time = None;
        // B lacks an arrival on "short", so C is the common stop.
        assert_eq!(find_common_stop(&trips).as_deref(), Some("C"));
    }

    #[test]
    fn common_falls_back_to_beginning() {
        let mut trips = vec![
            trip("b", &[("C", "09:00:00"), ("D", "09:10:00")]),
            trip("a", &[("A", "08:00:00"), ("B", "08:10:00")]),
        ];
        assert_eq!(CommonStopSorter.sort(&mut trips), None);
        assert_eq!(ids(&trips), vec!["a", "b"]);
    }

    #[test]
    fn duplicates_from_overlapping_calendars() {
        let trips = vec![
            trip("wk", &[("A", "08:00:00"), ("B", "08:10:00")]),
            trip("sat", &[("A", "08:00:00"), ("B", "08:10:00")]),
        ];
        let kept = sort_and_deduplicate(trips, SortingAlgorithm::Common);
        assert_eq!(ids(&kept), vec!["wk"]);
    }

    #[test]
    fn shared_timepoint_is_not_a_duplicate() {
        let trips = vec![
            trip("x", &[("A", "08:00:00"), ("B", "08:10:00")]),
            trip("y", &[("A", "08:00:00"), ("B", "08:14:00")]),
        ];
        let kept = deduplicate(trips, Some("A"));
        assert_eq!(ids(&kept), vec!["x", "y"]);
    }
}
