//! In-memory transit store backed by a JSON snapshot.
//!
//! The snapshot is one JSON object with an array per record table. Missing
//! tables are treated as empty.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    Calendar, CalendarException, Frequency, Note, NoteReference, RawTrip, Route, Stop,
    StopOrderEntry, StopTime, TimetableDefinition, TimetablePageRecord,
};

use super::error::StoreError;
use super::filter::{IdFilter, NoteReferenceQuery, StopQuery, TripQuery};
use super::TransitStore;

/// Store holding every record table in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStore {
    pub routes: Vec<Route>,
    pub trips: Vec<RawTrip>,
    pub stop_times: Vec<StopTime>,
    pub calendars: Vec<Calendar>,
    pub calendar_exceptions: Vec<CalendarException>,
    pub frequencies: Vec<Frequency>,
    pub stops: Vec<Stop>,
    pub note_references: Vec<NoteReference>,
    pub notes: Vec<Note>,
    pub timetables: Vec<TimetableDefinition>,
    pub timetable_pages: Vec<TimetablePageRecord>,
    pub timetable_stop_orders: Vec<StopOrderEntry>,
}

impl MemoryStore {
    /// Decode a snapshot from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let mut store: MemoryStore = serde_json::from_str(json)?;
        store.sort_tables();
        Ok(store)
    }

    /// Load a snapshot from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let store = Self::from_json_str(&json)?;

        info!(
            path = %path.display(),
            routes = store.routes.len(),
            trips = store.trips.len(),
            stop_times = store.stop_times.len(),
            timetables = store.timetables.len(),
            "Loaded transit snapshot"
        );

        Ok(store)
    }

    /// Put order-sensitive tables into query order.
    ///
    /// Call after mutating `stop_times` or `timetable_stop_orders` directly.
    pub fn sort_tables(&mut self) {
        self.stop_times
            .sort_by(|a, b| (&a.trip_id, a.stop_sequence).cmp(&(&b.trip_id, b.stop_sequence)));
        self.timetable_stop_orders.sort_by(|a, b| {
            (&a.timetable_id, a.stop_sequence).cmp(&(&b.timetable_id, b.stop_sequence))
        });
    }
}

fn any_of(ids: &[String], value: Option<&str>) -> bool {
    value.is_some_and(|v| ids.iter().any(|id| id == v))
}

impl TransitStore for MemoryStore {
    fn routes(&self, route_ids: &IdFilter) -> Result<Vec<Route>, StoreError> {
        Ok(self
            .routes
            .iter()
            .filter(|r| route_ids.matches(&r.route_id))
            .cloned()
            .collect())
    }

    fn trips(&self, query: &TripQuery) -> Result<Vec<RawTrip>, StoreError> {
        Ok(self
            .trips
            .iter()
            .filter(|t| {
                query.trip_ids.matches(&t.trip_id)
                    && query.route_ids.matches(&t.route_id)
                    && query.service_ids.matches(&t.service_id)
                    && query.block_ids.matches_opt(t.block())
                    && query.direction_id.is_none_or(|d| t.direction_id == Some(d))
            })
            .cloned()
            .collect())
    }

    fn stop_times(&self, trip_ids: &IdFilter) -> Result<Vec<StopTime>, StoreError> {
        Ok(self
            .stop_times
            .iter()
            .filter(|st| trip_ids.matches(&st.trip_id))
            .cloned()
            .collect())
    }

    fn calendars(&self, service_ids: &IdFilter) -> Result<Vec<Calendar>, StoreError> {
        Ok(self
            .calendars
            .iter()
            .filter(|c| service_ids.matches(&c.service_id))
            .cloned()
            .collect())
    }

    fn calendar_exceptions(
        &self,
        service_ids: &IdFilter,
    ) -> Result<Vec<CalendarException>, StoreError> {
        Ok(self
            .calendar_exceptions
            .iter()
            .filter(|c| service_ids.matches(&c.service_id))
            .cloned()
            .collect())
    }

    fn frequencies(&self, trip_ids: &IdFilter) -> Result<Vec<Frequency>, StoreError> {
        Ok(self
            .frequencies
            .iter()
            .filter(|f| trip_ids.matches(&f.trip_id))
            .cloned()
            .collect())
    }

    fn stops(&self, query: &StopQuery) -> Result<Vec<Stop>, StoreError> {
        Ok(self
            .stops
            .iter()
            .filter(|s| {
                query.stop_ids.matches(&s.stop_id)
                    || query
                        .parent_stations
                        .as_ref()
                        .is_some_and(|p| p.matches_opt(s.parent()) && s.parent().is_some())
            })
            .cloned()
            .collect())
    }

    fn note_references(
        &self,
        query: &NoteReferenceQuery,
    ) -> Result<Vec<NoteReference>, StoreError> {
        Ok(self
            .note_references
            .iter()
            .filter(|r| {
                any_of(&query.timetable_ids, r.timetable_id.as_deref())
                    || any_of(&query.route_ids, r.route_id.as_deref())
                    || any_of(&query.trip_ids, r.trip_id.as_deref())
                    || any_of(&query.stop_ids, r.stop_id.as_deref())
            })
            .cloned()
            .collect())
    }

    fn notes(&self, note_ids: &IdFilter) -> Result<Vec<Note>, StoreError> {
        Ok(self
            .notes
            .iter()
            .filter(|n| note_ids.matches(&n.note_id))
            .cloned()
            .collect())
    }

    fn timetables(&self, timetable_ids: &IdFilter) -> Result<Vec<TimetableDefinition>, StoreError> {
        Ok(self
            .timetables
            .iter()
            .filter(|t| timetable_ids.matches(&t.timetable_id))
            .cloned()
            .collect())
    }

    fn timetable_pages(
        &self,
        page_ids: &IdFilter,
    ) -> Result<Vec<TimetablePageRecord>, StoreError> {
        Ok(self
            .timetable_pages
            .iter()
            .filter(|p| page_ids.matches(&p.timetable_page_id))
            .cloned()
            .collect())
    }

    fn timetable_stop_orders(
        &self,
        timetable_ids: &IdFilter,
    ) -> Result<Vec<StopOrderEntry>, StoreError> {
        Ok(self
            .timetable_stop_orders
            .iter()
            .filter(|o| timetable_ids.matches(&o.timetable_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "routes": [{"route_id": "R1", "route_short_name": "1"}],
        "trips": [
            {"trip_id": "T2", "route_id": "R1", "service_id": "WK", "direction_id": 0, "block_id": "B1"},
            {"trip_id": "T1", "route_id": "R1", "service_id": "WK", "direction_id": 1}
        ],
        "stop_times": [
            {"trip_id": "T1", "stop_id": "B", "stop_sequence": 2, "arrival_time": "08:10:00", "departure_time": "08:10:00"},
            {"trip_id": "T1", "stop_id": "A", "stop_sequence": 1, "arrival_time": "08:00:00", "departure_time": "08:00:00"}
        ],
        "stops": [
            {"stop_id": "STN", "stop_name": "Central"},
            {"stop_id": "A", "stop_name": "Central Bay A", "parent_station": "STN"},
            {"stop_id": "B", "stop_name": "Market"}
        ]
    }"#;

    fn store() -> MemoryStore {
        MemoryStore::from_json_str(SNAPSHOT).unwrap()
    }

    #[test]
    fn stop_times_sorted_by_sequence() {
        let store = store();
        let sts = store.stop_times(&IdFilter::from("T1")).unwrap();
        let seqs: Vec<u32> = sts.iter().map(|s| s.stop_sequence).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn trip_filters_combine() {
        let store = store();

        let query = TripQuery {
            route_ids: IdFilter::from("R1"),
            direction_id: Some(0),
            ..TripQuery::default()
        };
        let trips = store.trips(&query).unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].trip_id, "T2");

        let query = TripQuery {
            block_ids: IdFilter::from("B1"),
            ..TripQuery::default()
        };
        assert_eq!(store.trips(&query).unwrap().len(), 1);

        let query = TripQuery {
            service_ids: IdFilter::Many(vec![]),
            ..TripQuery::default()
        };
        assert!(store.trips(&query).unwrap().is_empty());
    }

    #[test]
    fn stops_with_children() {
        let store = store();
        let stops = store
            .stops(&StopQuery::with_children(vec!["STN".into()]))
            .unwrap();
        let mut ids: Vec<&str> = stops.iter().map(|s| s.stop_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["A", "STN"]);
    }

    #[test]
    fn missing_tables_are_empty() {
        let store = MemoryStore::from_json_str("{}").unwrap();
        assert!(store.routes(&IdFilter::Any).unwrap().is_empty());
        assert!(store.timetables(&IdFilter::Any).unwrap().is_empty());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let store = MemoryStore::from_path(file.path()).unwrap();
        assert_eq!(store.trips.len(), 2);
    }

    #[test]
    fn load_missing_file_fails() {
        let err = MemoryStore::from_path("/nonexistent/snapshot.json").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn invalid_time_rejected() {
        let json = r#"{"stop_times":[{"trip_id":"T","stop_id":"A","stop_sequence":1,"arrival_time":"8am"}]}"#;
        assert!(matches!(
            MemoryStore::from_json_str(json),
            Err(StoreError::Json { .. })
        ));
    }
}
