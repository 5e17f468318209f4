//! Query filters.

/// Matches an id field against nothing in particular, one id, or any of several ids.
///
/// # Examples
///
/// ```
/// use timetable_server::store::IdFilter;
///
/// assert!(IdFilter::Any.matches("R1"));
/// assert!(IdFilter::from("R1").matches("R1"));
/// assert!(IdFilter::from(vec!["R1".to_string(), "R2".to_string()]).matches("R2"));
/// assert!(!IdFilter::from("R1").matches("R2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdFilter {
    /// No constraint.
    #[default]
    Any,
    One(String),
    Many(Vec<String>),
}

impl IdFilter {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            IdFilter::Any => true,
            IdFilter::One(id) => id == value,
            IdFilter::Many(ids) => ids.iter().any(|id| id == value),
        }
    }

    /// Matches an optional field; an absent value only matches `Any`.
    pub fn matches_opt(&self, value: Option<&str>) -> bool {
        match value {
            Some(v) => self.matches(v),
            None => matches!(self, IdFilter::Any),
        }
    }

    /// Whether this filter can match nothing at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdFilter::Many(ids) if ids.is_empty())
    }
}

impl From<&str> for IdFilter {
    fn from(value: &str) -> Self {
        IdFilter::One(value.to_string())
    }
}

impl From<String> for IdFilter {
    fn from(value: String) -> Self {
        IdFilter::One(value)
    }
}

impl From<Vec<String>> for IdFilter {
    fn from(value: Vec<String>) -> Self {
        IdFilter::Many(value)
    }
}

impl From<&[String]> for IdFilter {
    fn from(value: &[String]) -> Self {
        IdFilter::Many(value.to_vec())
    }
}

/// Trip query: every set filter must match.
#[derive(Debug, Clone, Default)]
pub struct TripQuery {
    pub trip_ids: IdFilter,
    pub route_ids: IdFilter,
    pub service_ids: IdFilter,
    pub block_ids: IdFilter,
    pub direction_id: Option<u8>,
}

/// Stop query: matches stops by id or by parent station (OR).
#[derive(Debug, Clone, Default)]
pub struct StopQuery {
    pub stop_ids: IdFilter,
    pub parent_stations: Option<IdFilter>,
}

impl StopQuery {
    pub fn by_ids(stop_ids: impl Into<IdFilter>) -> Self {
        Self {
            stop_ids: stop_ids.into(),
            parent_stations: None,
        }
    }

    /// Stops with any of the given ids, plus stops whose parent is one of them.
    pub fn with_children(stop_ids: Vec<String>) -> Self {
        Self {
            stop_ids: IdFilter::Many(stop_ids.clone()),
            parent_stations: Some(IdFilter::Many(stop_ids)),
        }
    }
}

/// Note reference query: a reference matches when any listed scope matches (OR).
#[derive(Debug, Clone, Default)]
pub struct NoteReferenceQuery {
    pub timetable_ids: Vec<String>,
    pub route_ids: Vec<String>,
    pub trip_ids: Vec<String>,
    pub stop_ids: Vec<String>,
}
