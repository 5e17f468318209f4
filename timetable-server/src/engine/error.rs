//! Errors and warnings raised while building timetables.

use serde::Serialize;

use crate::domain::InvalidDate;
use crate::store::StoreError;

/// A condition that makes one timetable page impossible to build.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    /// Store query failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stop time references a stop the store does not know
    #[error("timetable {timetable_id}: unknown stop {stop_id}")]
    UnknownStop {
        timetable_id: String,
        stop_id: String,
    },

    /// A timetable definition carries a date that does not parse
    #[error("timetable {timetable_id}: {source}")]
    InvalidDate {
        timetable_id: String,
        #[source]
        source: InvalidDate,
    },

    /// No timetable is assigned to the requested page
    #[error("unknown timetable page {0}")]
    UnknownTimetablePage(String),
}

/// A recoverable gap in the data. Building continues with a best-effort result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataGap {
    #[error("no trips found")]
    NoTrips,

    #[error("trip {trip_id} has no stop times")]
    MissingStopTimes { trip_id: String },

    #[error("stop order could not be resolved; using longest trip (omitted: {})", omitted.join(", "))]
    StopOrderFallback { omitted: Vec<String> },

    #[error("note reference for note {note_id} is invalid: {reason}")]
    InvalidNoteReference { note_id: String, reason: String },

    #[error("frequency for trip {trip_id} has a zero headway")]
    InvalidFrequency { trip_id: String },
}

/// A value with the warnings raised while computing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<DataGap>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<DataGap>) -> Self {
        Self { value, warnings }
    }

    /// Move the value out, appending its warnings to `sink`.
    pub fn into_value(self, sink: &mut Vec<DataGap>) -> T {
        sink.extend(self.warnings);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_display() {
        let gap = DataGap::StopOrderFallback {
            omitted: vec!["X".into(), "Y".into()],
        };
        assert_eq!(
            gap.to_string(),
            "stop order could not be resolved; using longest trip (omitted: X, Y)"
        );

        let json = serde_json::to_value(DataGap::MissingStopTimes {
            trip_id: "T1".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "missing_stop_times");
        assert_eq!(json["trip_id"], "T1");
    }

    #[test]
    fn outcome_collects_warnings() {
        let mut sink = vec![DataGap::NoTrips];
        let outcome = Outcome::with_warnings(
            5,
            vec![DataGap::InvalidFrequency {
                trip_id: "T1".into(),
            }],
        );
        assert_eq!(outcome.into_value(&mut sink), 5);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn store_errors_convert() {
        let err: TimetableError = StoreError::Query("down".into()).into();
        assert_eq!(err.to_string(), "query failed: down");
    }
}
