//! Batch driver that builds every timetable page in a store.
//!
//! Pages are built on the blocking thread pool, `batch_size` at a time. A
//! page that fails is recorded in the report and its siblings still build.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::engine::{
    FormattedTimetablePage, TimetableConfig, TimetableError, TimetableStats, TimetableWarning,
    build_formatted_timetable_page, generate_stats, page_ids,
};
use crate::store::{StoreError, TransitStore};

/// Configuration for batch builds.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// How many pages are built concurrently.
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { batch_size: 8 }
    }
}

/// Errors that stop a whole batch.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("no timetables could be resolved from the store")]
    NoTimetables,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Summary of one built page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    pub timetable_page_id: String,
    pub page_label: String,
    pub timetables: usize,
    pub stats: TimetableStats,
}

/// A page that could not be built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageFailure {
    pub timetable_page_id: String,
    pub error: String,
}

/// Outcome of building every page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub pages: Vec<PageSummary>,
    pub errors: Vec<PageFailure>,
    pub warnings: Vec<TimetableWarning>,
}

impl BatchReport {
    fn record(&mut self, page_id: String, result: Result<FormattedTimetablePage, String>) {
        match result {
            Ok(page) => {
                for warning in &page.warnings {
                    warn!(
                        timetable_page_id = %page_id,
                        timetable_id = %warning.timetable_id,
                        warning = %warning.message,
                        "Timetable data gap"
                    );
                }
                self.warnings.extend(page.warnings.iter().cloned());
                self.pages.push(PageSummary {
                    stats: generate_stats(&page),
                    timetables: page.timetables.len(),
                    page_label: page.page_label,
                    timetable_page_id: page_id,
                });
            }
            Err(message) => {
                error!(timetable_page_id = %page_id, error = %message, "Failed to build page");
                self.errors.push(PageFailure {
                    timetable_page_id: page_id,
                    error: message,
                });
            }
        }
    }
}

/// Build every page in the store and report what happened.
pub async fn build_all_pages<S>(
    store: Arc<S>,
    config: Arc<TimetableConfig>,
    batch: &BatchConfig,
) -> Result<BatchReport, BatchError>
where
    S: TransitStore + Send + Sync + 'static,
{
    let ids = page_ids(store.as_ref())?;
    if ids.is_empty() {
        return Err(BatchError::NoTimetables);
    }

    let mut report = BatchReport::default();
    for chunk in ids.chunks(batch.batch_size.max(1)) {
        let builds: Vec<_> = chunk
            .iter()
            .map(|page_id| {
                let store = Arc::clone(&store);
                let config = Arc::clone(&config);
                let page_id = page_id.clone();
                async move {
                    let id = page_id.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        build_formatted_timetable_page(store.as_ref(), &id, &config)
                    })
                    .await;
                    let result = match result {
                        Ok(built) => built.map_err(|e: TimetableError| e.to_string()),
                        Err(join) => Err(join.to_string()),
                    };
                    (page_id, result)
                }
            })
            .collect();

        for (page_id, result) in join_all(builds).await {
            report.record(page_id, result);
        }
    }

    info!(
        pages = report.pages.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Built timetable pages"
    );
    Ok(report)
}
