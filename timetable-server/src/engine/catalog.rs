//! Which timetables exist and which page shows them.
//!
//! Timetables come from the store's definitions. A feed without any gets
//! one timetable per route and direction, covering every service those
//! trips run on.

use std::collections::BTreeMap;

use tracing::info;

use crate::domain::TimetableDefinition;
use crate::store::{IdFilter, StoreError, TransitStore, TripQuery};

use super::error::TimetableError;

fn synthesize_timetables<S: TransitStore + ?Sized>(
    store: &S,
) -> Result<Vec<TimetableDefinition>, StoreError> {
    let mut groups: BTreeMap<(String, Option<u8>), Vec<String>> = BTreeMap::new();
    for trip in store.trips(&TripQuery::default())? {
        groups
            .entry((trip.route_id, trip.direction_id))
            .or_default()
            .push(trip.service_id);
    }

    let timetables: Vec<TimetableDefinition> = groups
        .into_iter()
        .map(|((route_id, direction_id), mut service_ids)| {
            service_ids.sort();
            service_ids.dedup();

            let timetable_id = match direction_id {
                Some(direction) => format!("{route_id}|{direction}"),
                None => route_id.clone(),
            };
            let mut def = TimetableDefinition::for_routes(timetable_id, vec![route_id]);
            def.direction_id = direction_id;
            def.service_ids = service_ids;
            def
        })
        .collect();

    info!(
        timetables = timetables.len(),
        "No timetables defined; generated one per route and direction"
    );
    Ok(timetables)
}

/// Every timetable, ordered by `timetable_sequence` then id.
pub fn all_timetables<S: TransitStore + ?Sized>(
    store: &S,
) -> Result<Vec<TimetableDefinition>, StoreError> {
    let mut timetables = store.timetables(&IdFilter::Any)?;
    if timetables.is_empty() {
        timetables = synthesize_timetables(store)?;
    }

    timetables.sort_by(|a, b| {
        a.timetable_sequence
            .unwrap_or(u32::MAX)
            .cmp(&b.timetable_sequence.unwrap_or(u32::MAX))
            .then_with(|| a.timetable_id.cmp(&b.timetable_id))
    });
    Ok(timetables)
}

/// Ids of every page, in the order of their first timetable.
pub fn page_ids<S: TransitStore + ?Sized>(store: &S) -> Result<Vec<String>, StoreError> {
    let mut ids: Vec<String> = Vec::new();
    for def in all_timetables(store)? {
        let page_id = def.page_id();
        if !ids.iter().any(|id| id == page_id) {
            ids.push(page_id.to_string());
        }
    }
    Ok(ids)
}

/// Timetables shown on one page.
pub fn timetables_for_page<S: TransitStore + ?Sized>(
    store: &S,
    page_id: &str,
) -> Result<Vec<TimetableDefinition>, TimetableError> {
    let timetables: Vec<TimetableDefinition> = all_timetables(store)?
        .into_iter()
        .filter(|def| def.page_id() == page_id)
        .collect();

    if timetables.is_empty() {
        return Err(TimetableError::UnknownTimetablePage(page_id.to_string()));
    }
    Ok(timetables)
}
