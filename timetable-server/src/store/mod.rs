//! Read-only access to imported schedule data.
//!
//! The timetable engine never owns feed data: it asks a `TransitStore` for
//! the records it needs. `MemoryStore` is the bundled implementation, loaded
//! from a JSON snapshot of every record table.
//!
//! Queries are synchronous. Implementations must be safe to share across
//! threads so independent pages can be built in parallel.

mod error;
mod filter;
mod memory;

pub use error::StoreError;
pub use filter::{IdFilter, NoteReferenceQuery, StopQuery, TripQuery};
pub use memory::MemoryStore;

use crate::domain::{
    Calendar, CalendarException, Frequency, Note, NoteReference, RawTrip, Route, Stop,
    StopOrderEntry, StopTime, TimetableDefinition, TimetablePageRecord,
};

/// Query interface over feed records.
///
/// This abstraction allows the engine to be tested with in-memory data.
pub trait TransitStore {
    fn routes(&self, route_ids: &IdFilter) -> Result<Vec<Route>, StoreError>;

    fn trips(&self, query: &TripQuery) -> Result<Vec<RawTrip>, StoreError>;

    /// Stop times for the given trips, ordered by trip then `stop_sequence`.
    fn stop_times(&self, trip_ids: &IdFilter) -> Result<Vec<StopTime>, StoreError>;

    fn calendars(&self, service_ids: &IdFilter) -> Result<Vec<Calendar>, StoreError>;

    fn calendar_exceptions(
        &self,
        service_ids: &IdFilter,
    ) -> Result<Vec<CalendarException>, StoreError>;

    fn frequencies(&self, trip_ids: &IdFilter) -> Result<Vec<Frequency>, StoreError>;

    fn stops(&self, query: &StopQuery) -> Result<Vec<Stop>, StoreError>;

    fn note_references(
        &self,
        query: &NoteReferenceQuery,
    ) -> Result<Vec<NoteReference>, StoreError>;

    fn notes(&self, note_ids: &IdFilter) -> Result<Vec<Note>, StoreError>;

    fn timetables(&self, timetable_ids: &IdFilter) -> Result<Vec<TimetableDefinition>, StoreError>;

    fn timetable_pages(&self, page_ids: &IdFilter)
    -> Result<Vec<TimetablePageRecord>, StoreError>;

    /// Manual stop order rows, ordered by timetable then `stop_sequence`.
    fn timetable_stop_orders(
        &self,
        timetable_ids: &IdFilter,
    ) -> Result<Vec<StopOrderEntry>, StoreError>;
}
