//! Free-text annotations and their scoping references.

use serde::{Deserialize, Serialize};

/// A note shown alongside a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub note_id: String,
    /// Display symbol; generated when absent.
    #[serde(default)]
    pub symbol: Option<String>,
    pub note: String,
}

/// Places a note on a timetable, route, trip, stop, or single stop visit.
///
/// Every scoping field that is set must match for the reference to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteReference {
    pub note_id: String,
    #[serde(default)]
    pub timetable_id: Option<String>,
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub stop_id: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<u32>,
    /// 1 when the symbol should also be printed next to the stop time.
    #[serde(default)]
    pub show_on_stoptime: Option<u8>,
}

impl NoteReference {
    pub fn shows_on_stoptime(&self) -> bool {
        self.show_on_stoptime == Some(1)
    }
}
