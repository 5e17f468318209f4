//! Timetable and page assembly.
//!
//! `TimetableBuilder` runs the stages for each timetable of a page: service
//! resolution, trip selection, ordering and deduplication, stop ordering,
//! filtering, continuation linking and notes. Warnings from every stage are
//! collected on the timetable and rolled up onto the page.

use tracing::debug;

use crate::domain::{
    BoardingRule, DayMask, Route, Stop, StopTime, TimetableDefinition, TimetablePageRecord,
};
use crate::store::{IdFilter, TransitStore};

use super::catalog::timetables_for_page;
use super::config::TimetableConfig;
use super::continuation::ContinuationLinker;
use super::error::{DataGap, Outcome, TimetableError};
use super::formatted::{
    CellMarker, FormattedStop, FormattedTimetable, FormattedTimetablePage, FormattedTrip,
    LegendEntry, OrderedStop, StopCell, StopKind, TimetableWarning,
};
use super::notes::{NoteContext, ResolvedNotes, resolve_notes};
use super::select::{filter_to_stops, ordered_routes, select_trips};
use super::services::resolve_services;
use super::sorting::sort_and_deduplicate;
use super::stop_order::{resolve_stop_order, split_arrival_departure};
use super::stops::StopIndex;

const MARKER_ORDER: [CellMarker; 6] = [
    CellMarker::NoPickup,
    CellMarker::NoDropoff,
    CellMarker::RequestPickup,
    CellMarker::RequestDropoff,
    CellMarker::Interpolated,
    CellMarker::NoService,
];

/// Builds formatted timetables and pages from a store.
pub struct TimetableBuilder<'a, S: TransitStore + ?Sized> {
    store: &'a S,
    config: &'a TimetableConfig,
}

/// Build one page with all its timetables.
pub fn build_formatted_timetable_page<S: TransitStore + ?Sized>(
    store: &S,
    timetable_page_id: &str,
    config: &TimetableConfig,
) -> Result<FormattedTimetablePage, TimetableError> {
    TimetableBuilder::new(store, config).build_page(timetable_page_id)
}

/// Route names joined for a label.
fn route_names(routes: &[Route]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for route in routes {
        let name = route.display_name();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names.join(" and ")
}

impl<'a, S: TransitStore + ?Sized> TimetableBuilder<'a, S> {
    pub fn new(store: &'a S, config: &'a TimetableConfig) -> Self {
        Self { store, config }
    }

    /// Build every timetable assigned to a page.
    pub fn build_page(&self, page_id: &str) -> Result<FormattedTimetablePage, TimetableError> {
        let definitions = timetables_for_page(self.store, page_id)?;
        let record: Option<TimetablePageRecord> = self
            .store
            .timetable_pages(&IdFilter::from(page_id))?
            .into_iter()
            .next();

        let mut timetables = Vec::new();
        let mut warnings = Vec::new();
        for def in &definitions {
            let outcome = self.build_timetable(def)?;
            for warning in outcome.warnings {
                debug!(timetable_id = %def.timetable_id, %warning, "Timetable data gap");
                warnings.push(TimetableWarning {
                    timetable_id: def.timetable_id.clone(),
                    message: warning.to_string(),
                    warning,
                });
            }
            if let Some(timetable) = outcome.value {
                timetables.push(timetable);
            }
        }

        let mut routes: Vec<Route> = Vec::new();
        for route in timetables.iter().flat_map(|t| &t.routes) {
            if !routes.iter().any(|r| r.route_id == route.route_id) {
                routes.push(route.clone());
            }
        }
        let days = timetables
            .iter()
            .fold(DayMask::EMPTY, |acc, t| acc | t.days);

        let page_label = record
            .as_ref()
            .and_then(|r| r.page_label.clone())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| route_names(&routes));

        debug!(
            timetable_page_id = page_id,
            timetables = timetables.len(),
            warnings = warnings.len(),
            "Built timetable page"
        );

        Ok(FormattedTimetablePage {
            timetable_page_id: page_id.to_string(),
            page_label,
            filename: record.and_then(|r| r.filename),
            route_ids: routes.iter().map(|r| r.route_id.clone()).collect(),
            days,
            day_list: days.format_list(&self.config.days_short_strings),
            timetables,
            warnings,
        })
    }

    /// Build one timetable. `None` when it has no trips and empty timetables
    /// are not kept.
    pub fn build_timetable(
        &self,
        def: &TimetableDefinition,
    ) -> Result<Outcome<Option<FormattedTimetable>>, TimetableError> {
        let mut warnings = Vec::new();

        let services = resolve_services(self.store, def)?;
        let routes = ordered_routes(
            def,
            self.store
                .routes(&IdFilter::from(def.route_ids.as_slice()))?,
        );

        let selection =
            select_trips(self.store, def, &services, &routes, self.config)?.into_value(&mut warnings);
        let mut stops = selection.stops;
        let trips = sort_and_deduplicate(selection.trips, self.config.sorting_algorithm);

        let stop_ids = self.stop_order(def, &trips, &mut stops, &mut warnings)?;
        let ordered = split_arrival_departure(&stop_ids, &trips, self.config.arrival_split_secs());
        let mut trips = filter_to_stops(trips, &stop_ids);

        if trips.is_empty() && !self.config.allow_empty_timetables {
            debug!(timetable_id = %def.timetable_id, "Dropping timetable without trips");
            return Ok(Outcome::with_warnings(None, warnings));
        }

        if self.config.show_trip_continuation && def.shows_continuations() {
            let mut linker = ContinuationLinker::new(self.store, &services.service_ids);
            for trip in &mut trips {
                let links = linker.link(trip, &mut stops)?;
                trip.continues_from = links.continues_from;
                trip.continues_as = links.continues_as;
            }
        }

        let mut unique_stops: Vec<String> = stop_ids.clone();
        unique_stops.dedup();
        let notes = resolve_notes(
            self.store,
            &NoteContext {
                timetable_id: &def.timetable_id,
                route_ids: &def.route_ids,
                trips: &trips,
                stop_ids: &unique_stops,
            },
        )?
        .into_value(&mut warnings);

        for trip in &mut trips {
            trip.note_symbols = notes.trip_symbols(trip);
        }
        let formatted_stops = self.stop_rows(def, &ordered, &trips, &stops, &notes)?;

        let timetable_label = def
            .timetable_label
            .clone()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| {
                let names = route_names(&routes);
                match formatted_stops.last() {
                    Some(last) => format!("{names} to {}", last.stop.display_name()),
                    None => names,
                }
            });
        let direction_name = def
            .direction_name
            .clone()
            .filter(|d| !d.is_empty())
            .or_else(|| trips.first().and_then(|t| t.trip.trip_headsign.clone()));

        let (start_date, end_date) = services.date_range();
        let (start_date_text, end_date_text) =
            services.formatted_date_range(&self.config.date_format);
        let legend = self.legend(&formatted_stops);
        let frequency_exact_times = selection.frequencies.iter().any(|f| f.is_exact());

        debug!(
            timetable_id = %def.timetable_id,
            stops = formatted_stops.len(),
            trips = trips.len(),
            warnings = warnings.len(),
            "Built timetable"
        );

        Ok(Outcome::with_warnings(
            Some(FormattedTimetable {
                timetable_id: def.timetable_id.clone(),
                timetable_page_id: def.page_id().to_string(),
                timetable_label,
                direction_id: def.direction_id,
                direction_name,
                orientation: def.orientation.unwrap_or(self.config.default_orientation),
                routes,
                service_ids: services.service_ids.clone(),
                start_date,
                end_date,
                start_date_text,
                end_date_text,
                days: services.days,
                day_list: services.days.format_list(&self.config.days_strings),
                calendar_code: services.days.to_code(),
                stops: formatted_stops,
                ordered_trips: trips,
                note_symbols: notes.timetable_symbols(),
                notes: notes.notes,
                legend,
                note_placements: notes.placements,
                frequencies: selection.frequencies,
                frequency_exact_times,
                warnings: warnings.clone(),
            }),
            warnings,
        ))
    }

    /// The manual stop order if one is configured, else one resolved from trips.
    fn stop_order(
        &self,
        def: &TimetableDefinition,
        trips: &[FormattedTrip],
        stops: &mut StopIndex,
        warnings: &mut Vec<DataGap>,
    ) -> Result<Vec<String>, TimetableError> {
        let manual = self
            .store
            .timetable_stop_orders(&IdFilter::from(def.timetable_id.as_str()))?;

        if manual.is_empty() {
            let sequences: Vec<Vec<String>> = trips
                .iter()
                .map(|t| t.stop_times.iter().map(|st| st.stop_id.clone()).collect())
                .collect();
            let order = resolve_stop_order(&sequences);
            if order.used_fallback {
                warnings.push(DataGap::StopOrderFallback {
                    omitted: order.omitted,
                });
            }
            return Ok(order.stops);
        }

        let mut ids: Vec<String> = manual.into_iter().map(|entry| entry.stop_id).collect();
        stops.load(self.store, ids.iter().cloned())?;
        if let Some(unknown) = ids.iter().find(|id| !stops.contains(id)) {
            return Err(TimetableError::UnknownStop {
                timetable_id: def.timetable_id.clone(),
                stop_id: unknown.clone(),
            });
        }
        if self.config.use_parent_station {
            for id in &mut ids {
                *id = stops.location(id).to_string();
            }
        }
        Ok(ids)
    }

    fn stop_rows(
        &self,
        def: &TimetableDefinition,
        ordered: &[OrderedStop],
        trips: &[FormattedTrip],
        stops: &StopIndex,
        notes: &ResolvedNotes,
    ) -> Result<Vec<FormattedStop>, TimetableError> {
        ordered
            .iter()
            .map(|entry| {
                let stop: Stop = stops.get(&entry.stop_id).cloned().ok_or_else(|| {
                    TimetableError::UnknownStop {
                        timetable_id: def.timetable_id.clone(),
                        stop_id: entry.stop_id.clone(),
                    }
                })?;
                let cells = trips
                    .iter()
                    .map(|trip| self.cell(trip, entry, notes))
                    .collect();
                Ok(FormattedStop {
                    note_symbols: notes.stop_symbols(&entry.stop_id),
                    stop,
                    kind: entry.kind,
                    trips: cells,
                })
            })
            .collect()
    }

    fn cell(&self, trip: &FormattedTrip, entry: &OrderedStop, notes: &ResolvedNotes) -> StopCell {
        let config = self.config;
        let Some(stop_time) = trip.stop_time_at(&entry.stop_id) else {
            return StopCell {
                time: None,
                text: config.no_service_symbol.clone(),
                markers: vec![CellMarker::NoService],
                symbols: vec![config.no_service_symbol.clone()],
                note_symbols: Vec::new(),
            };
        };

        let time = match entry.kind {
            StopKind::Arrival => stop_time.arrival_or_departure(),
            StopKind::Departure | StopKind::Both => stop_time.departure_or_arrival(),
        };
        let markers = cell_markers(trip, stop_time, entry.kind, time.is_none());
        let symbols = markers.iter().map(|m| self.symbol(*m).to_string()).collect();

        StopCell {
            text: time
                .map(|t| t.format(&config.time_format))
                .unwrap_or_else(|| config.interpolated_stop_symbol.clone()),
            time,
            markers,
            symbols,
            note_symbols: notes.cell_symbols(trip, stop_time),
        }
    }

    /// Legend entries for the markers used in any cell.
    fn legend(&self, stops: &[FormattedStop]) -> Vec<LegendEntry> {
        MARKER_ORDER
            .iter()
            .copied()
            .filter(|marker| {
                stops
                    .iter()
                    .flat_map(|s| &s.trips)
                    .any(|cell| cell.markers.contains(marker))
            })
            .map(|marker| LegendEntry {
                marker,
                symbol: self.symbol(marker).to_string(),
                text: self.text(marker).to_string(),
            })
            .collect()
    }

    fn text(&self, marker: CellMarker) -> &str {
        let config = self.config;
        match marker {
            CellMarker::NoPickup => &config.no_pickup_text,
            CellMarker::NoDropoff => &config.no_dropoff_text,
            CellMarker::RequestPickup => &config.request_pickup_text,
            CellMarker::RequestDropoff => &config.request_dropoff_text,
            CellMarker::Interpolated => &config.interpolated_stop_text,
            CellMarker::NoService => &config.no_service_text,
        }
    }

    fn symbol(&self, marker: CellMarker) -> &str {
        let config = self.config;
        match marker {
            CellMarker::NoPickup => &config.no_pickup_symbol,
            CellMarker::NoDropoff => &config.no_dropoff_symbol,
            CellMarker::RequestPickup => &config.request_pickup_symbol,
            CellMarker::RequestDropoff => &config.request_dropoff_symbol,
            CellMarker::Interpolated => &config.interpolated_stop_symbol,
            CellMarker::NoService => &config.no_service_symbol,
        }
    }
}

/// Markers for a trip's visit shown on a row of the given kind.
///
/// Pickup rules are not shown at a trip's last stop, nor drop-off rules at
/// its first, where they are implied.
fn cell_markers(
    trip: &FormattedTrip,
    stop_time: &StopTime,
    kind: StopKind,
    missing_time: bool,
) -> Vec<CellMarker> {
    let is_first = trip
        .stop_times
        .first()
        .is_some_and(|st| st.stop_sequence == stop_time.stop_sequence);
    let is_last = trip
        .stop_times
        .last()
        .is_some_and(|st| st.stop_sequence == stop_time.stop_sequence);
    let shows_pickup = kind != StopKind::Arrival && !is_last;
    let shows_dropoff = kind != StopKind::Departure && !is_first;

    let mut markers = Vec::new();
    if shows_pickup {
        match stop_time.pickup_type {
            BoardingRule::NotAvailable => markers.push(CellMarker::NoPickup),
            rule if rule.is_on_request() => markers.push(CellMarker::RequestPickup),
            _ => {}
        }
    }
    if shows_dropoff {
        match stop_time.drop_off_type {
            BoardingRule::NotAvailable => markers.push(CellMarker::NoDropoff),
            rule if rule.is_on_request() => markers.push(CellMarker::RequestDropoff),
            _ => {}
        }
    }
    if missing_time || stop_time.is_interpolated() {
        markers.push(CellMarker::Interpolated);
    }
    markers
}
