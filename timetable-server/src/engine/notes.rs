//! Notes applicable to a timetable and their display symbols.
//!
//! A note reference scopes a note to any combination of timetable, route,
//! trip, stop and stop visit; every scope it sets must match. Notes without
//! an explicit symbol get one generated: walking the notes in `note_id`
//! order, letters `a` to `z` first, then `1`, `2`, ..., never reusing a
//! symbol another note of the same timetable already has.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::domain::{Note, NoteReference, StopTime};
use crate::store::{IdFilter, NoteReferenceQuery, StoreError, TransitStore};

use super::error::{DataGap, Outcome};
use super::formatted::FormattedTrip;

/// A note with its display symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedNote {
    pub note_id: String,
    pub symbol: String,
    pub note: String,
}

/// What part of a timetable a note is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum NoteScope {
    Timetable,
    Trip {
        trip_id: String,
    },
    Stop {
        stop_id: String,
    },
    StopTime {
        trip_id: Option<String>,
        stop_id: String,
        stop_sequence: Option<u32>,
    },
}

/// One applicable note reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotePlacement {
    pub note_id: String,
    pub symbol: String,
    pub scope: NoteScope,
    pub show_on_stoptime: bool,
}

/// Notes and placements for one timetable, both ordered by symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNotes {
    pub notes: Vec<ResolvedNote>,
    pub placements: Vec<NotePlacement>,
}

/// The parts of a timetable notes can be scoped to.
pub struct NoteContext<'a> {
    pub timetable_id: &'a str,
    pub route_ids: &'a [String],
    pub trips: &'a [FormattedTrip],
    pub stop_ids: &'a [String],
}

/// A trip matches a trip id directly or through its frequency template.
fn is_trip(trip: &FormattedTrip, trip_id: &str) -> bool {
    trip.trip.trip_id == trip_id
        || trip
            .frequency
            .as_ref()
            .is_some_and(|f| f.template_trip_id == trip_id)
}

impl NoteContext<'_> {
    fn query(&self) -> NoteReferenceQuery {
        let mut trip_ids: Vec<String> = Vec::new();
        for trip in self.trips {
            trip_ids.push(trip.trip.trip_id.clone());
            if let Some(freq) = &trip.frequency {
                trip_ids.push(freq.template_trip_id.clone());
            }
        }
        trip_ids.sort();
        trip_ids.dedup();

        NoteReferenceQuery {
            timetable_ids: vec![self.timetable_id.to_string()],
            route_ids: self.route_ids.to_vec(),
            trip_ids,
            stop_ids: self.stop_ids.to_vec(),
        }
    }

    /// Whether every scope the reference sets matches this timetable.
    fn applies(&self, reference: &NoteReference) -> Result<bool, String> {
        if reference.stop_sequence.is_some() && reference.stop_id.is_none() {
            return Err("stop_sequence given without stop_id".into());
        }

        if reference
            .timetable_id
            .as_deref()
            .is_some_and(|id| id != self.timetable_id)
        {
            return Ok(false);
        }
        if reference
            .route_id
            .as_ref()
            .is_some_and(|id| !self.route_ids.contains(id))
        {
            return Ok(false);
        }
        if let Some(trip_id) = &reference.trip_id {
            if !self.trips.iter().any(|t| is_trip(t, trip_id)) {
                return Ok(false);
            }
        }
        if let Some(stop_id) = &reference.stop_id {
            if !self.stop_ids.contains(stop_id) {
                return Ok(false);
            }
            if let Some(sequence) = reference.stop_sequence {
                let visited = self
                    .trips
                    .iter()
                    .filter(|t| reference.trip_id.as_deref().is_none_or(|id| is_trip(t, id)))
                    .flat_map(|t| &t.stop_times)
                    .any(|st| &st.stop_id == stop_id && st.stop_sequence == sequence);
                if !visited {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

fn scope_of(reference: &NoteReference) -> NoteScope {
    match (&reference.trip_id, &reference.stop_id) {
        (_, Some(stop_id)) if reference.trip_id.is_some() || reference.stop_sequence.is_some() => {
            NoteScope::StopTime {
                trip_id: reference.trip_id.clone(),
                stop_id: stop_id.clone(),
                stop_sequence: reference.stop_sequence,
            }
        }
        (_, Some(stop_id)) => NoteScope::Stop {
            stop_id: stop_id.clone(),
        },
        (Some(trip_id), None) => NoteScope::Trip {
            trip_id: trip_id.clone(),
        },
        (None, None) => NoteScope::Timetable,
    }
}

/// Yields `a`..`z`, then `1`, `2`, ...
fn generated_symbols() -> impl Iterator<Item = String> {
    ('a'..='z')
        .map(String::from)
        .chain((1u32..).map(|n| n.to_string()))
}

/// Sort key placing letters first, then numbers in numeric order.
fn symbol_key(symbol: &str) -> (bool, u64, &str) {
    match symbol.parse::<u64>() {
        Ok(n) => (true, n, ""),
        Err(_) => (false, 0, symbol),
    }
}

/// Give every note a symbol and sort them for display.
pub fn assign_symbols(mut notes: Vec<Note>) -> Vec<ResolvedNote> {
    notes.sort_by(|a, b| a.note_id.cmp(&b.note_id));
    notes.dedup_by(|a, b| a.note_id == b.note_id);

    let taken: HashSet<String> = notes.iter().filter_map(|n| n.symbol.clone()).collect();
    let mut candidates = generated_symbols().filter(|s| !taken.contains(s));

    let mut resolved: Vec<ResolvedNote> = notes
        .into_iter()
        .map(|n| ResolvedNote {
            symbol: match n.symbol {
                Some(symbol) => symbol,
                None => candidates.next().unwrap_or_default(),
            },
            note_id: n.note_id,
            note: n.note,
        })
        .collect();

    resolved.sort_by(|a, b| {
        symbol_key(&a.symbol)
            .cmp(&symbol_key(&b.symbol))
            .then_with(|| a.note_id.cmp(&b.note_id))
    });
    resolved
}

/// Fetch the notes that apply to a timetable and assign their symbols.
pub fn resolve_notes<S: TransitStore + ?Sized>(
    store: &S,
    context: &NoteContext<'_>,
) -> Result<Outcome<ResolvedNotes>, StoreError> {
    let mut warnings = Vec::new();

    let mut references = Vec::new();
    for reference in store.note_references(&context.query())? {
        match context.applies(&reference) {
            Ok(true) => references.push(reference),
            Ok(false) => {}
            Err(reason) => warnings.push(DataGap::InvalidNoteReference {
                note_id: reference.note_id.clone(),
                reason,
            }),
        }
    }

    let mut note_ids: Vec<String> = references.iter().map(|r| r.note_id.clone()).collect();
    note_ids.sort();
    note_ids.dedup();
    if note_ids.is_empty() {
        return Ok(Outcome::with_warnings(ResolvedNotes::default(), warnings));
    }

    let notes = assign_symbols(store.notes(&IdFilter::from(note_ids))?);
    let symbols: HashMap<&str, &str> = notes
        .iter()
        .map(|n| (n.note_id.as_str(), n.symbol.as_str()))
        .collect();

    let mut placements: Vec<NotePlacement> = Vec::new();
    for reference in &references {
        let Some(symbol) = symbols.get(reference.note_id.as_str()) else {
            warnings.push(DataGap::InvalidNoteReference {
                note_id: reference.note_id.clone(),
                reason: "note does not exist".into(),
            });
            continue;
        };
        let placement = NotePlacement {
            note_id: reference.note_id.clone(),
            symbol: (*symbol).to_string(),
            scope: scope_of(reference),
            show_on_stoptime: reference.shows_on_stoptime(),
        };
        if !placements.contains(&placement) {
            placements.push(placement);
        }
    }
    placements.sort_by(|a, b| symbol_key(&a.symbol).cmp(&symbol_key(&b.symbol)));

    debug!(
        timetable_id = context.timetable_id,
        notes = notes.len(),
        placements = placements.len(),
        "Resolved notes"
    );

    Ok(Outcome::with_warnings(ResolvedNotes { notes, placements }, warnings))
}

impl ResolvedNotes {
    fn symbols_where(&self, pred: impl Fn(&NoteScope) -> bool) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for placement in &self.placements {
            if pred(&placement.scope) && !symbols.contains(&placement.symbol) {
                symbols.push(placement.symbol.clone());
            }
        }
        symbols
    }

    /// Symbols shown with the whole timetable.
    pub fn timetable_symbols(&self) -> Vec<String> {
        self.symbols_where(|scope| matches!(scope, NoteScope::Timetable))
    }

    /// Symbols shown on a trip's column.
    pub fn trip_symbols(&self, trip: &FormattedTrip) -> Vec<String> {
        self.symbols_where(|scope| matches!(scope, NoteScope::Trip { trip_id } if is_trip(trip, trip_id)))
    }

    /// Symbols shown on a stop's row.
    pub fn stop_symbols(&self, stop_id: &str) -> Vec<String> {
        self.symbols_where(|scope| matches!(scope, NoteScope::Stop { stop_id: s } if s == stop_id))
    }

    /// Symbols shown in the cell of `trip` at `stop_time`.
    pub fn cell_symbols(&self, trip: &FormattedTrip, stop_time: &StopTime) -> Vec<String> {
        self.symbols_where(|scope| match scope {
            NoteScope::StopTime {
                trip_id,
                stop_id,
                stop_sequence,
            } => {
                stop_id == &stop_time.stop_id
                    && trip_id.as_deref().is_none_or(|id| is_trip(trip, id))
                    && stop_sequence.is_none_or(|seq| seq == stop_time.stop_sequence)
            }
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoardingRule, RawTrip, ServiceTime};
    use crate::store::MemoryStore;

    fn note(id: &str, symbol: Option<&str>) -> Note {
        Note {
            note_id: id.into(),
            symbol: symbol.map(Into::into),
            note: format!("Note {id}"),
        }
    }

    fn reference(note_id: &str) -> NoteReference {
        NoteReference {
            note_id: note_id.into(),
            timetable_id: None,
            route_id: None,
            trip_id: None,
            stop_id: None,
            stop_sequence: None,
            show_on_stoptime: None,
        }
    }

    fn trip(id: &str) -> FormattedTrip {
        let stop_times = ["A", "B"]
            .iter()
            .enumerate()
            .map(|(i, stop)| StopTime {
                trip_id: id.into(),
                stop_id: (*stop).into(),
                stop_sequence: i as u32 + 1,
                arrival_time: Some(ServiceTime::from_hms(8, i as u32 * 10, 0)),
                departure_time: Some(ServiceTime::from_hms(8, i as u32 * 10, 0)),
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

    fn symbols(notes: &[ResolvedNote]) -> Vec<(&str, &str)> {
        notes
            .iter()
            .map(|n| (n.note_id.as_str(), n.symbol.as_str()))
            .collect()
    }

    #[test]
    fn generated_symbols_skip_explicit_ones() {
        let notes = assign_symbols(vec![
            note("n3", None),
            note("n1", None),
            note("n2", Some("a")),
        ]);
        assert_eq!(symbols(&notes), vec![("n2", "a"), ("n1", "b"), ("n3", "c")]);
    }

    #[test]
    fn numbers_after_letters() {
        let notes: Vec<Note> = (0..28).map(|i| note(&format!("n{i:02}"), None)).collect();
        let resolved = assign_symbols(notes);
        assert_eq!(resolved[0].symbol, "a");
        assert_eq!(resolved[25].symbol, "z");
        assert_eq!(resolved[26].symbol, "1");
        assert_eq!(resolved[27].symbol, "2");
        assert_eq!(resolved[27].note_id, "n27");
    }

    #[test]
    fn numeric_symbols_sort_numerically() {
        let resolved = assign_symbols(vec![note("x", Some("10")), note("y", Some("9")), note("z", Some("*"))]);
        assert_eq!(symbols(&resolved), vec![("z", "*"), ("y", "9"), ("x", "10")]);
    }

    fn resolve(references: Vec<NoteReference>, notes: Vec<Note>) -> Outcome<ResolvedNotes> {
        let store = MemoryStore {
            note_references: references,
            notes,
            ..MemoryStore::default()
        };
        let trips = vec![trip("T1"), trip("T2")];
        let route_ids = vec!["R1".to_string()];
        let stop_ids = vec!["A".to_string(), "B".to_string()];
        let context = NoteContext {
            timetable_id: "TT1",
            route_ids: &route_ids,
            trips: &trips,
            stop_ids: &stop_ids,
        };
        resolve_notes(&store, &context).unwrap()
    }

    #[test]
    fn timetable_scoped_note_applies() {
        let mut r = reference("n1");
        r.timetable_id = Some("TT1".into());
        let outcome = resolve(vec![r], vec![note("n1", None)]);

        assert!(outcome.warnings.is_empty());
        let notes = outcome.value;
        assert_eq!(notes.notes.len(), 1);
        assert_eq!(notes.timetable_symbols(), vec!["a".to_string()]);
        assert_eq!(notes.placements[0].scope, NoteScope::Timetable);
    }

    #[test]
    fn stop_sequence_without_stop_warns() {
        let mut r = reference("n1");
        r.timetable_id = Some("TT1".into());
        r.stop_sequence = Some(2);
        let outcome = resolve(vec![r], vec![note("n1", None)]);

        assert!(outcome.value.notes.is_empty());
        assert!(matches!(
            &outcome.warnings[..],
            [DataGap::InvalidNoteReference { note_id, .. }] if note_id == "n1"
        ));
    }

    #[test]
    fn other_scopes_must_all_match() {
        let mut other_tt = reference("n1");
        other_tt.timetable_id = Some("TT2".into());
        other_tt.route_id = Some("R1".into());

        let mut wrong_seq = reference("n2");
        wrong_seq.stop_id = Some("B".into());
        wrong_seq.stop_sequence = Some(7);

        let outcome = resolve(
            vec![other_tt, wrong_seq],
            vec![note("n1", None), note("n2", None)],
        );
        assert!(outcome.value.notes.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn placements_by_level() {
        let mut on_trip = reference("n1");
        on_trip.trip_id = Some("T2".into());

        let mut on_stop = reference("n2");
        on_stop.stop_id = Some("A".into());

        let mut on_visit = reference("n3");
        on_visit.stop_id = Some("B".into());
        on_visit.stop_sequence = Some(2);
        on_visit.show_on_stoptime = Some(1);

        let outcome = resolve(
            vec![on_trip, on_stop, on_visit],
            vec![note("n1", None), note("n2", None), note("n3", None)],
        );
        let notes = outcome.value;

        let t1 = trip("T1");
        let t2 = trip("T2");
        assert!(notes.trip_symbols(&t1).is_empty());
        assert_eq!(notes.trip_symbols(&t2), vec!["a".to_string()]);
        assert_eq!(notes.stop_symbols("A"), vec!["b".to_string()]);
        assert_eq!(notes.cell_symbols(&t1, &t1.stop_times[1]), vec!["c".to_string()]);
        assert!(notes.cell_symbols(&t1, &t1.stop_times[0]).is_empty());
        assert!(notes.placements[2].show_on_stoptime);
    }

    #[test]
    fn missing_note_record_warns() {
        let mut r = reference("ghost");
        r.route_id = Some("R1".into());
        let outcome = resolve(vec![r], vec![]);
        assert!(outcome.value.notes.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn generated_symbols_are_unique(
            explicit in prop::collection::vec(prop::option::of("[a-e1-3]"), 0..40),
        ) {
            let notes: Vec<Note> = explicit
                .into_iter()
                .enumerate()
                .map(|(i, symbol)| Note {
                    note_id: format!("n{i:03}"),
                    symbol,
                    note: String::new(),
                })
                .collect();
            let explicit_symbols: HashSet<String> =
                notes.iter().filter_map(|n| n.symbol.clone()).collect();
            let generated_ids: HashSet<String> = notes
                .iter()
                .filter(|n| n.symbol.is_none())
                .map(|n| n.note_id.clone())
                .collect();

            let resolved = assign_symbols(notes);
            let generated: Vec<&str> = resolved
                .iter()
                .filter(|n| generated_ids.contains(&n.note_id))
                .map(|n| n.symbol.as_str())
                .collect();

            let unique: HashSet<&str> = generated.iter().copied().collect();
            prop_assert_eq!(unique.len(), generated.len());
            for symbol in generated {
                prop_assert!(!explicit_symbols.contains(symbol));
            }
        }
    }
}
