//! Service calendars selected by a timetable definition.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{
    Calendar, DayMask, ExceptionType, TimetableDefinition, format_feed_date, parse_feed_date,
};
use crate::store::{IdFilter, TransitStore};

use super::error::TimetableError;

/// Services a timetable covers, with the weekdays each runs on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceSelection {
    pub service_ids: Vec<String>,
    pub calendars: Vec<Calendar>,
    /// Bitwise OR of every selected service's days.
    pub days: DayMask,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    service_days: HashMap<String, DayMask>,
}

impl ServiceSelection {
    /// Days a service runs on, or the timetable's days when unknown.
    pub fn days_of(&self, service_id: &str) -> DayMask {
        self.service_days
            .get(service_id)
            .copied()
            .filter(|d| !d.is_empty())
            .unwrap_or(self.days)
    }

    /// The `(start, end)` range as `YYYYMMDD` strings.
    pub fn date_range(&self) -> (Option<String>, Option<String>) {
        (
            self.start_date.map(format_feed_date),
            self.end_date.map(format_feed_date),
        )
    }

    /// The `(start, end)` range formatted with a chrono format string.
    pub fn formatted_date_range(&self, format: &str) -> (Option<String>, Option<String>) {
        let fmt = |date: NaiveDate| date.format(format).to_string();
        (self.start_date.map(fmt), self.end_date.map(fmt))
    }
}

fn parse_date(def: &TimetableDefinition, raw: Option<&str>) -> Result<Option<NaiveDate>, TimetableError> {
    raw.filter(|s| !s.is_empty())
        .map(parse_feed_date)
        .transpose()
        .map_err(|source| TimetableError::InvalidDate {
            timetable_id: def.timetable_id.clone(),
            source,
        })
}

/// Select the services of a timetable.
///
/// Explicit `service_ids` are taken as given. Otherwise a calendar is
/// selected when it runs on one of the timetable's days and its validity
/// range overlaps the timetable's dates; with `include_exceptions`, services
/// added on a matching date inside the range are selected too.
pub fn resolve_services<S: TransitStore + ?Sized>(
    store: &S,
    def: &TimetableDefinition,
) -> Result<ServiceSelection, TimetableError> {
    let start_date = parse_date(def, def.start_date.as_deref())?;
    let end_date = parse_date(def, def.end_date.as_deref())?;
    let wanted = def.days();

    let explicit = !def.service_ids.is_empty();
    let filter = if explicit {
        IdFilter::from(def.service_ids.as_slice())
    } else {
        IdFilter::Any
    };

    let calendars: Vec<Calendar> = store
        .calendars(&filter)?
        .into_iter()
        .filter(|c| explicit || (c.days().intersects(wanted) && c.overlaps(start_date, end_date)))
        .collect();

    let mut service_days: HashMap<String, DayMask> = HashMap::new();
    let mut service_ids: Vec<String> = Vec::new();
    for calendar in &calendars {
        *service_days.entry(calendar.service_id.clone()).or_default() |= calendar.days();
        service_ids.push(calendar.service_id.clone());
    }

    if explicit || def.include_exceptions {
        for exception in store.calendar_exceptions(&filter)? {
            let matches = exception.exception_type == ExceptionType::Added
                && exception.within(start_date, end_date)
                && (explicit || exception.weekday().intersects(wanted));
            if matches {
                *service_days.entry(exception.service_id.clone()).or_default() |=
                    exception.weekday();
                service_ids.push(exception.service_id);
            }
        }
    }

    if explicit {
        service_ids = def.service_ids.clone();
    }
    service_ids.sort();
    service_ids.dedup();

    let mut days = service_ids
        .iter()
        .filter_map(|id| service_days.get(id))
        .fold(DayMask::EMPTY, |acc, d| acc | *d);
    if days.is_empty() {
        days = wanted;
    }

    debug!(
        timetable_id = %def.timetable_id,
        services = service_ids.len(),
        days = %days.to_code(),
        "Resolved services"
    );

    Ok(ServiceSelection {
        service_ids,
        calendars,
        days,
        start_date,
        end_date,
        service_days,
    })
}
