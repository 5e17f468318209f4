//! Application state for the web layer.

use std::sync::Arc;

use crate::batch::BatchReport;
use crate::cache::{CacheConfig, CachedTimetables};
use crate::engine::TimetableConfig;
use crate::store::TransitStore;

/// Store type shared by request handlers.
pub type SharedStore = dyn TransitStore + Send + Sync;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Page builder with its cache
    pub timetables: Arc<CachedTimetables<SharedStore>>,

    /// Report from the start-up batch build
    pub report: Arc<BatchReport>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        store: Arc<SharedStore>,
        config: Arc<TimetableConfig>,
        cache_config: &CacheConfig,
        report: BatchReport,
    ) -> Self {
        Self {
            timetables: Arc::new(CachedTimetables::new(store, config, cache_config)),
            report: Arc::new(report),
        }
    }
}
