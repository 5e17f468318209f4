//! Configuration for timetable construction.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Orientation;

/// How trips are put into chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortingAlgorithm {
    /// Departure at a stop every trip serves.
    #[default]
    Common,
    /// First departure of each trip.
    Beginning,
    /// Last departure of each trip.
    End,
    /// Departure at the first stop of the longest trip.
    First,
    /// Departure at the last stop of the longest trip.
    Last,
}

/// Error loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options recognised when building timetables.
///
/// Field names follow the camelCase keys of the JSON config file. Every key
/// is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimetableConfig {
    pub sorting_algorithm: SortingAlgorithm,

    /// Only keep stop times that are timepoints.
    pub show_only_timepoint: bool,

    /// Show arrival and departure on separate rows when they differ by more
    /// than this many minutes. `None` disables splitting.
    pub show_arrival_on_difference: Option<f64>,

    /// Replace stops with their parent station.
    pub use_parent_station: bool,

    /// Keep timetables that end up with no trips.
    pub allow_empty_timetables: bool,

    pub default_orientation: Orientation,

    /// Link trips that continue as another route on the same vehicle.
    pub show_trip_continuation: bool,

    pub no_pickup_symbol: String,
    pub no_pickup_text: String,
    pub no_dropoff_symbol: String,
    pub no_dropoff_text: String,
    pub request_pickup_symbol: String,
    pub request_pickup_text: String,
    pub request_dropoff_symbol: String,
    pub request_dropoff_text: String,
    pub no_service_symbol: String,
    pub no_service_text: String,
    pub interpolated_stop_symbol: String,
    pub interpolated_stop_text: String,

    /// chrono format string for dates.
    pub date_format: String,

    /// chrono format string for stop times.
    pub time_format: String,

    /// Monday first.
    pub days_short_strings: Vec<String>,

    /// Monday first.
    pub days_strings: Vec<String>,
}

impl TimetableConfig {
    /// Decode a config from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Arrival/departure split threshold in seconds, if enabled.
    pub fn arrival_split_secs(&self) -> Option<u32> {
        self.show_arrival_on_difference
            .filter(|mins| mins.is_finite() && *mins >= 0.0)
            .map(|mins| (mins * 60.0).round() as u32)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            sorting_algorithm: SortingAlgorithm::Common,
            show_only_timepoint: false,
            show_arrival_on_difference: Some(0.2),
            use_parent_station: false,
            allow_empty_timetables: false,
            default_orientation: Orientation::Vertical,
            show_trip_continuation: true,
            no_pickup_symbol: "**".into(),
            no_pickup_text: "No pickup available".into(),
            no_dropoff_symbol: "‡".into(),
            no_dropoff_text: "No drop off available".into(),
            request_pickup_symbol: "***".into(),
            request_pickup_text: "Request stop - call for pickup".into(),
            request_dropoff_symbol: "¶".into(),
            request_dropoff_text: "Must request drop off".into(),
            no_service_symbol: "-".into(),
            no_service_text: "No service at this stop".into(),
            interpolated_stop_symbol: "•".into(),
            interpolated_stop_text: "Estimated time of arrival".into(),
            date_format: "%b %-d, %Y".into(),
            time_format: "%-I:%M%P".into(),
            days_short_strings: strings(&["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]),
            days_strings: strings(&[
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
                "Friday",
                "Saturday",
                "Sunday",
            ]),
        }
    }
}
