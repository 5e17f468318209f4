//! Continuation links between trips sharing a vehicle block.
//!
//! A trip "continues from" the block trip the vehicle ran just before it,
//! and "continues as" the one it runs just after, when that trip belongs to
//! a different route, meets it at the same place and is no more than
//! `MAX_WINDOW` seconds apart. Riders can stay on board across such a link.

use std::cmp::Reverse;
use std::collections::HashMap;

use tracing::trace;

use crate::domain::{RawTrip, Route, ServiceTime, StopTime};
use crate::store::{IdFilter, StoreError, TransitStore, TripQuery};

use super::formatted::{ContinuationLink, FormattedTrip};
use super::stops::StopIndex;

/// Largest gap between two linked trips, in seconds.
pub const MAX_WINDOW: u32 = 3600;

/// Endpoints of one trip on a block.
#[derive(Debug, Clone)]
struct BlockTrip {
    trip: RawTrip,
    first_stop: String,
    last_stop: String,
    first_departure: ServiceTime,
    last_arrival: ServiceTime,
}

impl BlockTrip {
    fn from_stop_times(trip: RawTrip, stop_times: &[StopTime]) -> Option<Self> {
        let first = stop_times.first()?;
        let last = stop_times.last()?;
        Some(Self {
            first_stop: first.stop_id.clone(),
            last_stop: last.stop_id.clone(),
            first_departure: first.departure_or_arrival()?,
            last_arrival: last.arrival_or_departure()?,
            trip,
        })
    }
}

/// Both links of one trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Continuations {
    pub continues_from: Option<ContinuationLink>,
    pub continues_as: Option<ContinuationLink>,
}

/// Finds continuation links, caching each block's trips.
pub struct ContinuationLinker<'a, S: TransitStore + ?Sized> {
    store: &'a S,
    service_ids: IdFilter,
    blocks: HashMap<String, Vec<BlockTrip>>,
    route_names: HashMap<String, String>,
}

impl<'a, S: TransitStore + ?Sized> ContinuationLinker<'a, S> {
    /// Block trips are limited to `service_ids`, the services of the timetable.
    pub fn new(store: &'a S, service_ids: &[String]) -> Self {
        Self {
            store,
            service_ids: IdFilter::from(service_ids),
            blocks: HashMap::new(),
            route_names: HashMap::new(),
        }
    }

    /// Links for `trip`. Trips without a block, and frequency instances,
    /// never link.
    pub fn link(
        &mut self,
        trip: &FormattedTrip,
        stops: &mut StopIndex,
    ) -> Result<Continuations, StoreError> {
        let Some(block_id) = trip.trip.block() else {
            return Ok(Continuations::default());
        };
        if trip.frequency.is_some() {
            return Ok(Continuations::default());
        }
        self.load_block(block_id, stops)?;
        let Some(block) = self.blocks.get(block_id) else {
            return Ok(Continuations::default());
        };

        // Endpoints are taken from the block record, before display filtering.
        let own = match block.iter().find(|b| b.trip.trip_id == trip.trip.trip_id) {
            Some(own) => own.clone(),
            None => match BlockTrip::from_stop_times(trip.trip.clone(), &trip.stop_times) {
                Some(own) => own,
                None => return Ok(Continuations::default()),
            },
        };
        let others = || block.iter().filter(|b| b.trip.trip_id != own.trip.trip_id);

        // Equal times resolve to the lowest trip id.
        let predecessor = others()
            .filter(|b| b.last_arrival <= own.first_departure)
            .max_by_key(|b| (b.last_arrival, Reverse(b.trip.trip_id.as_str())))
            .filter(|b| {
                b.trip.route_id != own.trip.route_id
                    && own.first_departure.seconds() - b.last_arrival.seconds() <= MAX_WINDOW
                    && stops.same_location(&b.last_stop, &own.first_stop)
            })
            .map(|b| b.trip.clone());

        let successor = others()
            .filter(|b| b.first_departure >= own.last_arrival)
            .min_by_key(|b| (b.first_departure, b.trip.trip_id.as_str()))
            .filter(|b| {
                b.trip.route_id != own.trip.route_id
                    && b.first_departure.seconds() - own.last_arrival.seconds() <= MAX_WINDOW
                    && stops.same_location(&b.first_stop, &own.last_stop)
            })
            .map(|b| b.trip.clone());

        let continues_from = predecessor.map(|t| self.to_link(t)).transpose()?;
        let continues_as = successor.map(|t| self.to_link(t)).transpose()?;

        if continues_from.is_some() || continues_as.is_some() {
            trace!(
                trip_id = %trip.trip.trip_id,
                from = ?continues_from.as_ref().map(|l| &l.trip_id),
                to = ?continues_as.as_ref().map(|l| &l.trip_id),
                "Linked block continuation"
            );
        }

        Ok(Continuations {
            continues_from,
            continues_as,
        })
    }

    fn load_block(&mut self, block_id: &str, stops: &mut StopIndex) -> Result<(), StoreError> {
        if self.blocks.contains_key(block_id) {
            return Ok(());
        }

        let trips = self.store.trips(&TripQuery {
            block_ids: IdFilter::from(block_id),
            service_ids: self.service_ids.clone(),
            ..TripQuery::default()
        })?;
        let trip_ids: Vec<String> = trips.iter().map(|t| t.trip_id.clone()).collect();
        let stop_times = self.store.stop_times(&IdFilter::from(trip_ids))?;

        let mut by_trip: HashMap<&str, Vec<StopTime>> = HashMap::new();
        for st in &stop_times {
            by_trip.entry(st.trip_id.as_str()).or_default().push(st.clone());
        }

        let block: Vec<BlockTrip> = trips
            .into_iter()
            .filter_map(|trip| {
                let times = by_trip.get(trip.trip_id.as_str())?;
                BlockTrip::from_stop_times(trip, times)
            })
            .collect();

        stops.load(
            self.store,
            block
                .iter()
                .flat_map(|b| [b.first_stop.clone(), b.last_stop.clone()]),
        )?;

        self.blocks.insert(block_id.to_string(), block);
        Ok(())
    }

    fn to_link(&mut self, trip: RawTrip) -> Result<ContinuationLink, StoreError> {
        let route_name = match self.route_names.get(&trip.route_id) {
            Some(name) => name.clone(),
            None => {
                let name = self
                    .store
                    .routes(&IdFilter::from(trip.route_id.as_str()))?
                    .first()
                    .map(Route::display_name)
                    .unwrap_or(trip.route_id.as_str())
                    .to_string();
                self.route_names.insert(trip.route_id.clone(), name.clone());
                name
            }
        };

        Ok(ContinuationLink {
            trip_id: trip.trip_id,
            route_id: trip.route_id,
            route_name,
            headsign: trip.trip_headsign,
        })
    }
}
