//! Expansion of headway-based template trips into concrete trips.

use tracing::trace;

use crate::domain::{Frequency, RawTrip, StopTime};

use super::error::{DataGap, Outcome};
use super::formatted::{FormattedTrip, FrequencyInstance};

/// Expand a template trip into one trip per departure of its frequency windows.
///
/// Each instance moves the template's stop times so its first departure
/// falls on the instance's start offset, keeping every dwell. Instances
/// are numbered across all windows in start-time order and get the id
/// `<trip_id>_freq_<n>`.
pub fn expand_frequencies(
    template: &RawTrip,
    stop_times: &[StopTime],
    frequencies: &[Frequency],
) -> Outcome<Vec<FormattedTrip>> {
    let mut warnings = Vec::new();
    let mut instances = Vec::new();

    let Some(base) = stop_times.first().and_then(StopTime::departure_or_arrival) else {
        warnings.push(DataGap::MissingStopTimes {
            trip_id: template.trip_id.clone(),
        });
        return Outcome::with_warnings(instances, warnings);
    };
    let base = i64::from(base.seconds());
    let exact_times = frequencies.iter().any(Frequency::is_exact);

    let mut windows: Vec<&Frequency> = frequencies.iter().collect();
    windows.sort_by_key(|f| (f.start_time, f.end_time));

    let mut index = 0u32;
    for window in windows {
        if window.headway_secs == 0 {
            warnings.push(DataGap::InvalidFrequency {
                trip_id: template.trip_id.clone(),
            });
            continue;
        }

        let mut offset = window.start_time.seconds();
        while offset < window.end_time.seconds() {
            let trip_id = format!("{}_freq_{}", template.trip_id, index);
            let delta = i64::from(offset) - base;
            let times = stop_times
                .iter()
                .map(|st| StopTime {
                    trip_id: trip_id.clone(),
                    ..st.shifted(delta)
                })
                .collect();

            let mut trip = FormattedTrip::new(
                RawTrip {
                    trip_id,
                    ..template.clone()
                },
                times,
            );
            trip.frequency = Some(FrequencyInstance {
                template_trip_id: template.trip_id.clone(),
                index,
                exact_times,
            });
            instances.push(trip);

            index += 1;
            offset += window.headway_secs;
        }
    }

    trace!(
        trip_id = %template.trip_id,
        instances = instances.len(),
        "Expanded frequency template"
    );

    Outcome::with_warnings(instances, warnings)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{BoardingRule, ServiceTime};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn instance_count_matches_window(
            start in 0u32..100_000,
            span in 0u32..20_000,
            headway in 1u32..5_000,
        ) {
            let template = RawTrip {
                trip_id: "F".into(),
                route_id: "R".into(),
                service_id: "S".into(),
                direction_id: None,
                block_id: None,
                trip_headsign: None,
                trip_short_name: None,
            };
            let stop_times = vec![StopTime {
                trip_id: "F".into(),
                stop_id: "A".into(),
                stop_sequence: 1,
                arrival_time: Some(ServiceTime::from_seconds(500)),
                departure_time: Some(ServiceTime::from_seconds(500)),
                pickup_type: BoardingRule::Regular,
                drop_off_type: BoardingRule::Regular,
                timepoint: None,
            }];
            let freq = Frequency {
                trip_id: "F".into(),
                start_time: ServiceTime::from_seconds(start),
                end_time: ServiceTime::from_seconds(start + span),
                headway_secs: headway,
                exact_times: None,
            };

            let trips = expand_frequencies(&template, &stop_times, std::slice::from_ref(&freq)).value;
            prop_assert_eq!(trips.len() as u32, freq.departure_count());
            for trip in &trips {
                let dep = trip.first_departure().unwrap().seconds();
                prop_assert!(dep >= start && dep < start + span);
            }
        }
    }
}
