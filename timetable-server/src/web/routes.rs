//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::{error, warn};

use crate::batch::BatchReport;
use crate::engine::{FormattedTimetablePage, TimetableError, all_timetables, generate_stats};
use crate::store::StoreError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/timetable-pages", get(list_pages))
        .route("/timetable-pages/:id", get(get_page))
        .route("/timetable-pages/:id/stats", get(get_page_stats))
        .route("/report", get(get_report))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Every page with its timetables.
async fn list_pages(State(state): State<AppState>) -> Result<Json<PageListResponse>, AppError> {
    let definitions = all_timetables(state.timetables.store())?;
    Ok(Json(PageListResponse::from_definitions(&definitions)))
}

/// A fully built page.
async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FormattedTimetablePage>, AppError> {
    let page = state.timetables.page(&id).await?;
    Ok(Json(page.as_ref().clone()))
}

/// Counts for a built page.
async fn get_page_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PageStatsResponse>, AppError> {
    let page = state.timetables.page(&id).await?;
    let stats = generate_stats(&page);
    Ok(Json(PageStatsResponse::from_page(&page, stats)))
}

/// The start-up batch report.
async fn get_report(State(state): State<AppState>) -> Json<BatchReport> {
    Json(state.report.as_ref().clone())
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    InvalidData { message: String },
    Internal { message: String },
}

impl From<TimetableError> for AppError {
    fn from(e: TimetableError) -> Self {
        match e {
            TimetableError::UnknownTimetablePage(_) => AppError::NotFound {
                message: e.to_string(),
            },
            TimetableError::UnknownStop { .. } | TimetableError::InvalidDate { .. } => {
                AppError::InvalidData {
                    message: e.to_string(),
                }
            }
            TimetableError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::InvalidData { message } => (StatusCode::UNPROCESSABLE_ENTITY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "Request failed");
        } else {
            warn!(%status, %message, "Request failed");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::CacheConfig;
    use crate::domain::{
        BoardingRule, Calendar, RawTrip, Route, ServiceTime, Stop, StopTime, TimetableDefinition,
        parse_feed_date,
    };
    use crate::engine::TimetableConfig;
    use crate::store::MemoryStore;

    fn state() -> AppState {
        let stop = |id: &str| Stop {
            stop_id: id.into(),
            stop_name: Some(format!("{id} Square")),
            stop_code: None,
            parent_station: None,
            stop_lat: None,
            stop_lon: None,
        };
        let call = |stop_id: &str, seq: u32, time: &str| {
            let time = ServiceTime::parse_hms(time).ok();
            StopTime {
                trip_id: "T1".into(),
                stop_id: stop_id.into(),
                stop_sequence: seq,
                arrival_time: time,
                departure_time: time,
                pickup_type: BoardingRule::Regular,
                drop_off_type: BoardingRule::Regular,
                timepoint: None,
            }
        };

        let mut broken = TimetableDefinition::for_routes("broken", vec!["R1".into()]);
        broken.end_date = Some("2024-12-31".into());

        let store = MemoryStore {
            routes: vec![Route {
                route_id: "R1".into(),
                agency_id: None,
                route_short_name: Some("7".into()),
                route_long_name: None,
                route_color: None,
            }],
            stops: vec![stop("A"), stop("B")],
            calendars: vec![Calendar {
                service_id: "WK".into(),
                monday: true,
                tuesday: true,
                wednesday: true,
                thursday: true,
                friday: true,
                saturday: false,
                sunday: false,
                start_date: parse_feed_date("20240101").unwrap(),
                end_date: parse_feed_date("20241231").unwrap(),
            }],
            trips: vec![RawTrip {
                trip_id: "T1".into(),
                route_id: "R1".into(),
                service_id: "WK".into(),
                direction_id: None,
                block_id: None,
                trip_headsign: None,
                trip_short_name: None,
            }],
            stop_times: vec![call("A", 1, "08:00:00"), call("B", 2, "08:30:00")],
            timetables: vec![
                TimetableDefinition::for_routes("TT1", vec!["R1".into()]),
                broken,
            ],
            ..MemoryStore::default()
        };

        AppState::new(
            Arc::new(store),
            Arc::new(TimetableConfig::default()),
            &CacheConfig::default(),
            BatchReport::default(),
        )
    }

    #[tokio::test]
    async fn page_is_built() {
        let Json(page) = get_page(State(state()), Path("TT1".into())).await.unwrap();
        assert_eq!(page.page_label, "7");
        assert_eq!(page.timetables.len(), 1);
        assert_eq!(page.timetables[0].timetable_label, "7 to B Square");
    }

    #[tokio::test]
    async fn stats_for_page() {
        let Json(stats) = get_page_stats(State(state()), Path("TT1".into()))
            .await
            .unwrap();
        assert_eq!(stats.stats.trips, 1);
        assert_eq!(stats.stats.stops, 2);
        assert_eq!(stats.warnings, 0);
    }

    #[tokio::test]
    async fn pages_listed() {
        let Json(list) = list_pages(State(state())).await.unwrap();
        let ids: Vec<&str> = list
            .pages
            .iter()
            .map(|p| p.timetable_page_id.as_str())
            .collect();
        assert_eq!(ids, vec!["TT1", "broken"]);
    }

    #[tokio::test]
    async fn unknown_page_is_not_found() {
        let err = get_page(State(state()), Path("nope".into()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_definition_is_unprocessable() {
        let err = get_page(State(state()), Path("broken".into()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
