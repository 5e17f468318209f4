//! Timetable construction engine.
//!
//! This module turns schedule records into resolved timetables. For each
//! timetable it selects trips in scope (expanding headway-based templates),
//! orders and deduplicates them, infers a stop order every trip agrees with,
//! links block continuations across routes and places notes.
//!
//! Recoverable data problems never abort a build: they are returned as
//! `DataGap` warnings next to the result. Only a `TimetableError` stops a
//! page from being built.

mod assemble;
mod catalog;
mod config;
mod continuation;
mod error;
mod formatted;
mod frequency;
mod notes;
mod select;
mod services;
mod sorting;
mod stats;
mod stop_order;
mod stops;


pub use assemble::{TimetableBuilder, build_formatted_timetable_page};
pub use catalog::{all_timetables, page_ids, timetables_for_page};
pub use config::{ConfigError, SortingAlgorithm, TimetableConfig};
pub use continuation::{ContinuationLinker, Continuations, MAX_WINDOW};
pub use error::{DataGap, Outcome, TimetableError};
pub use formatted::{
    CellMarker, ContinuationLink, FormattedStop, FormattedTimetable, FormattedTimetablePage,
    FormattedTrip, FrequencyInstance, LegendEntry, OrderedStop, StopCell, StopKind, TimetableWarning,
};
pub use frequency::expand_frequencies;
pub use notes::{NoteContext, NotePlacement, NoteScope, ResolvedNote, ResolvedNotes, assign_symbols, resolve_notes};
pub use select::{TripSelection, filter_to_stops, select_trips};
pub use services::{ServiceSelection, resolve_services};
pub use sorting::{
    BeginningSorter, CommonStopSorter, EndSorter, FirstStopSorter, LastStopSorter, TripSorter,
    deduplicate, find_common_stop, sort_and_deduplicate,
};
pub use stats::{TimetableStats, generate_stats};
pub use stop_order::{StopOrder, resolve_stop_order, split_arrival_departure};
pub use stops::StopIndex;
