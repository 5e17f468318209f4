use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use timetable_server::batch::{BatchConfig, build_all_pages};
use timetable_server::cache::CacheConfig;
use timetable_server::engine::TimetableConfig;
use timetable_server::store::MemoryStore;
use timetable_server::web::{AppState, create_router};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Feed snapshot is required
    let data_path =
        std::env::var("TIMETABLE_DATA").expect("TIMETABLE_DATA must point to a JSON feed snapshot");
    let store = Arc::new(MemoryStore::from_path(&data_path).expect("Failed to load feed snapshot"));

    let config = match std::env::var("TIMETABLE_CONFIG") {
        Ok(path) => TimetableConfig::from_path(&path).expect("Failed to load timetable config"),
        Err(_) => {
            info!("TIMETABLE_CONFIG not set, using default configuration");
            TimetableConfig::default()
        }
    };
    let config = Arc::new(config);

    // Build every page once so data problems show up at start-up
    let report = build_all_pages(Arc::clone(&store), Arc::clone(&config), &BatchConfig::default())
        .await
        .expect("No timetables to build");
    if !report.errors.is_empty() {
        warn!(failed = report.errors.len(), "Some pages failed to build");
    }

    let state = AppState::new(store, config, &CacheConfig::default(), report);
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .expect("BIND_ADDR must be a socket address");
    info!(%addr, "Timetable server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
