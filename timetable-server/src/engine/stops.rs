//! Stop lookups with parent-station awareness.

use std::collections::HashMap;

use crate::domain::Stop;
use crate::store::{StopQuery, StoreError, TransitStore};

/// Stops loaded for one timetable build.
#[derive(Debug, Clone, Default)]
pub struct StopIndex {
    stops: HashMap<String, Stop>,
}

impl StopIndex {
    pub fn new(stops: impl IntoIterator<Item = Stop>) -> Self {
        Self {
            stops: stops.into_iter().map(|s| (s.stop_id.clone(), s)).collect(),
        }
    }

    pub fn get(&self, stop_id: &str) -> Option<&Stop> {
        self.stops.get(stop_id)
    }

    pub fn contains(&self, stop_id: &str) -> bool {
        self.stops.contains_key(stop_id)
    }

    /// Fetch any of `stop_ids` not yet loaded, with their parent stations.
    pub fn load<S: TransitStore + ?Sized>(
        &mut self,
        store: &S,
        stop_ids: impl IntoIterator<Item = String>,
    ) -> Result<(), StoreError> {
        let mut missing: Vec<String> = stop_ids
            .into_iter()
            .filter(|id| !self.stops.contains_key(id))
            .collect();
        missing.sort();
        missing.dedup();
        if missing.is_empty() {
            return Ok(());
        }

        let found = store.stops(&StopQuery::by_ids(missing))?;
        let parents: Vec<String> = found
            .iter()
            .filter_map(|s| s.parent())
            .filter(|p| !self.stops.contains_key(*p))
            .map(str::to_string)
            .collect();
        self.stops
            .extend(found.into_iter().map(|s| (s.stop_id.clone(), s)));

        if !parents.is_empty() {
            let found = store.stops(&StopQuery::by_ids(parents))?;
            self.stops
                .extend(found.into_iter().map(|s| (s.stop_id.clone(), s)));
        }
        Ok(())
    }

    /// The physical location a stop belongs to: its parent station, or itself.
    ///
    /// Unknown stops are their own location.
    pub fn location<'a>(&'a self, stop_id: &'a str) -> &'a str {
        self.stops
            .get(stop_id)
            .and_then(Stop::parent)
            .unwrap_or(stop_id)
    }

    /// Whether two stops are the same place: equal, siblings under one
    /// parent station, or a parent and one of its children.
    ///
    /// # Examples
    ///
    /// ```
    /// use timetable_server::domain::Stop;
    /// use timetable_server::engine::StopIndex;
    ///
    /// let stop = |id: &str, parent: Option<&str>| Stop {
    ///     stop_id: id.into(),
    ///     stop_name: None,
    ///     stop_code: None,
    ///     parent_station: parent.map(Into::into),
    ///     stop_lat: None,
    ///     stop_lon: None,
    /// };
    /// let index = StopIndex::new([stop("STN", None), stop("A", Some("STN")), stop("B", Some("STN"))]);
    ///
    /// assert!(index.same_location("A", "B"));
    /// assert!(index.same_location("STN", "A"));
    /// assert!(!index.same_location("A", "Z"));
    /// ```
    pub fn same_location(&self, a: &str, b: &str) -> bool {
        self.location(a) == self.location(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn stop(id: &str, parent: Option<&str>) -> Stop {
        Stop {
            stop_id: id.into(),
            stop_name: Some(format!("Stop {id}")),
            stop_code: None,
            parent_station: parent.map(Into::into),
            stop_lat: None,
            stop_lon: None,
        }
    }

    #[test]
    fn load_fetches_parents() {
        let store = MemoryStore {
            stops: vec![stop("STN", None), stop("A", Some("STN")), stop("B", None)],
            ..MemoryStore::default()
        };

        let mut index = StopIndex::default();
        index.load(&store, vec!["A".to_string()]).unwrap();
        assert!(index.contains("A"));
        assert!(index.contains("STN"));
        assert!(!index.contains("B"));
        assert_eq!(index.location("A"), "STN");
    }

    #[test]
    fn unknown_stops_are_their_own_location() {
        let index = StopIndex::new([stop("A", Some("STN"))]);
        assert_eq!(index.location("Q"), "Q");
        assert!(index.same_location("Q", "Q"));
        assert!(!index.same_location("Q", "A"));
    }
}
