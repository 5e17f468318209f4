//! Canonical stop order for a timetable.
//!
//! Each trip contributes the edges between its consecutive stops. A
//! topological order of the resulting graph is a stop order every trip
//! agrees with. Trips that disagree (a cycle) make the order fall back to
//! the longest trip's own sequence.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::debug;

use super::formatted::{FormattedTrip, OrderedStop, StopKind};

/// A resolved stop order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StopOrder {
    pub stops: Vec<String>,
    /// Stops served by some trip but missing from a fallback order.
    pub omitted: Vec<String>,
    pub used_fallback: bool,
}

/// Resolve a stop order from per-trip stop sequences.
///
/// Among stops that are ready at the same time, the one seen first wins, so
/// the result is deterministic for a given input order.
pub fn resolve_stop_order(sequences: &[Vec<String>]) -> StopOrder {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut names: Vec<&str> = Vec::new();
    for stop_id in sequences.iter().flatten() {
        index.entry(stop_id.as_str()).or_insert_with(|| {
            names.push(stop_id.as_str());
            names.len() - 1
        });
    }

    let mut edges: HashSet<(usize, usize)> = HashSet::new();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); names.len()];
    let mut in_degree = vec![0usize; names.len()];
    for sequence in sequences {
        for pair in sequence.windows(2) {
            let (from, to) = (index[pair[0].as_str()], index[pair[1].as_str()]);
            if from != to && edges.insert((from, to)) {
                successors[from].push(to);
                in_degree[to] += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();
    let mut order = Vec::with_capacity(names.len());

    while let Some(Reverse(node)) = ready.pop() {
        order.push(names[node].to_string());
        for &next in &successors[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() == names.len() {
        return StopOrder {
            stops: order,
            omitted: Vec::new(),
            used_fallback: false,
        };
    }

    longest_sequence_order(sequences, &names)
}

fn longest_sequence_order(sequences: &[Vec<String>], all: &[&str]) -> StopOrder {
    let longest = sequences
        .iter()
        .fold(None, |best: Option<&Vec<String>>, seq| match best {
            Some(b) if b.len() >= seq.len() => Some(b),
            _ => Some(seq),
        });

    let mut seen = HashSet::new();
    let stops: Vec<String> = longest
        .into_iter()
        .flatten()
        .filter(|stop_id| seen.insert(stop_id.as_str()))
        .cloned()
        .collect();

    let omitted: Vec<String> = all
        .iter()
        .filter(|stop_id| !seen.contains(**stop_id))
        .map(|stop_id| (*stop_id).to_string())
        .collect();

    debug!(
        stops = stops.len(),
        omitted = omitted.len(),
        "Stop graph has a cycle; using longest trip order"
    );

    StopOrder {
        stops,
        omitted,
        used_fallback: true,
    }
}

/// Mark stop entries as arrival or departure rows.
///
/// An interior stop where some trip waits longer than `threshold_secs` gets
/// an arrival row followed by a departure row. A stop already listed twice
/// in a row is split the same way without adding another entry. Without a
/// threshold only existing adjacent repeats are split.
pub fn split_arrival_departure(
    stops: &[String],
    trips: &[FormattedTrip],
    threshold_secs: Option<u32>,
) -> Vec<OrderedStop> {
    let mut result = Vec::with_capacity(stops.len());
    let last = stops.len().saturating_sub(1);
    let mut i = 0;

    while i < stops.len() {
        let stop_id = &stops[i];

        if stops.get(i + 1) == Some(stop_id) {
            result.push(OrderedStop {
                stop_id: stop_id.clone(),
                kind: StopKind::Arrival,
            });
            result.push(OrderedStop {
                stop_id: stop_id.clone(),
                kind: StopKind::Departure,
            });
            i += 2;
            continue;
        }

        let interior = i > 0 && i < last;
        let waits = threshold_secs.is_some_and(|threshold| {
            trips.iter().any(|trip| {
                trip.stop_time_at(stop_id).is_some_and(|st| {
                    match (st.arrival_time, st.departure_time) {
                        (Some(arr), Some(dep)) => dep.abs_diff(arr) > threshold,
                        _ => false,
                    }
                })
            })
        });

        if interior && waits {
            result.push(OrderedStop {
                stop_id: stop_id.clone(),
                kind: StopKind::Arrival,
            });
            result.push(OrderedStop {
                stop_id: stop_id.clone(),
                kind: StopKind::Departure,
            });
        } else {
            result.push(OrderedStop::both(stop_id.clone()));
        }
        i += 1;
    }

    result
}
