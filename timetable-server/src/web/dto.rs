//! Data transfer objects for web responses.

use serde::Serialize;

use crate::domain::TimetableDefinition;
use crate::engine::{FormattedTimetablePage, TimetableStats};

/// A page in the page listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageListItem {
    /// Page identifier, usable with `/timetable-pages/:id`
    pub timetable_page_id: String,

    /// Timetables on the page, in display order
    pub timetable_ids: Vec<String>,

    /// Routes covered by any timetable on the page
    pub route_ids: Vec<String>,
}

/// Response listing every page.
#[derive(Debug, Serialize)]
pub struct PageListResponse {
    pub pages: Vec<PageListItem>,
}

/// Counts for one built page.
#[derive(Debug, Serialize)]
pub struct PageStatsResponse {
    pub timetable_page_id: String,

    pub page_label: String,

    #[serde(flatten)]
    pub stats: TimetableStats,

    /// Number of data gaps found while building
    pub warnings: usize,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl PageListResponse {
    /// Group timetable definitions (already in display order) into pages.
    pub fn from_definitions(definitions: &[TimetableDefinition]) -> Self {
        let mut pages: Vec<PageListItem> = Vec::new();

        for def in definitions {
            let index = match pages
                .iter()
                .position(|p| p.timetable_page_id == def.page_id())
            {
                Some(index) => index,
                None => {
                    pages.push(PageListItem {
                        timetable_page_id: def.page_id().to_string(),
                        timetable_ids: Vec::new(),
                        route_ids: Vec::new(),
                    });
                    pages.len() - 1
                }
            };

            let page = &mut pages[index];
            page.timetable_ids.push(def.timetable_id.clone());
            for route_id in &def.route_ids {
                if !page.route_ids.contains(route_id) {
                    page.route_ids.push(route_id.clone());
                }
            }
        }

        Self { pages }
    }
}

impl PageStatsResponse {
    pub fn from_page(page: &FormattedTimetablePage, stats: TimetableStats) -> Self {
        Self {
            timetable_page_id: page.timetable_page_id.clone(),
            page_label: page.page_label.clone(),
            stats,
            warnings: page.warnings.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, page: Option<&str>, routes: &[&str]) -> TimetableDefinition {
        let mut def =
            TimetableDefinition::for_routes(id, routes.iter().map(|r| (*r).to_string()).collect());
        def.timetable_page_id = page.map(Into::into);
        def
    }

    #[test]
    fn definitions_grouped_by_page() {
        let response = PageListResponse::from_definitions(&[
            def("out", Some("P1"), &["R1"]),
            def("solo", None, &["R3"]),
            def("in", Some("P1"), &["R1", "R2"]),
        ]);

        assert_eq!(
            response.pages,
            vec![
                PageListItem {
                    timetable_page_id: "P1".into(),
                    timetable_ids: vec!["out".into(), "in".into()],
                    route_ids: vec!["R1".into(), "R2".into()],
                },
                PageListItem {
                    timetable_page_id: "solo".into(),
                    timetable_ids: vec!["solo".into()],
                    route_ids: vec!["R3".into()],
                },
            ]
        );
    }

    #[test]
    fn stats_response_is_flat() {
        let response = PageStatsResponse {
            timetable_page_id: "P1".into(),
            page_label: "1 and 2".into(),
            stats: TimetableStats {
                stops: 4,
                trips: 10,
                routes: 2,
                calendars: 1,
            },
            warnings: 0,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["trips"], 10);
        assert_eq!(json["calendars"], 1);
        assert_eq!(json["page_label"], "1 and 2");
    }
}
