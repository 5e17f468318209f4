//! Stop and route records.

use serde::{Deserialize, Serialize};

/// A stop or station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub stop_id: String,
    #[serde(default)]
    pub stop_name: Option<String>,
    #[serde(default)]
    pub stop_code: Option<String>,
    #[serde(default)]
    pub parent_station: Option<String>,
    #[serde(default)]
    pub stop_lat: Option<f64>,
    #[serde(default)]
    pub stop_lon: Option<f64>,
}

impl Stop {
    /// Parent station id, if present and non-empty.
    pub fn parent(&self) -> Option<&str> {
        self.parent_station.as_deref().filter(|p| !p.is_empty())
    }

    /// Display name, falling back to the stop id.
    pub fn display_name(&self) -> &str {
        self.stop_name.as_deref().unwrap_or(&self.stop_id)
    }
}

/// A route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    #[serde(default)]
    pub agency_id: Option<String>,
    #[serde(default)]
    pub route_short_name: Option<String>,
    #[serde(default)]
    pub route_long_name: Option<String>,
    #[serde(default)]
    pub route_color: Option<String>,
}

impl Route {
    /// Short name if present, else long name, else the route id.
    ///
    /// # Examples
    ///
    /// ```
    /// use timetable_server::domain::Route;
    ///
    /// let route = Route {
    ///     route_id: "R1".into(),
    ///     agency_id: None,
    ///     route_short_name: Some("10".into()),
    ///     route_long_name: Some("Harbour Line".into()),
    ///     route_color: None,
    /// };
    /// assert_eq!(route.display_name(), "10");
    /// ```
    pub fn display_name(&self) -> &str {
        self.route_short_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.route_long_name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(&self.route_id)
    }
}
