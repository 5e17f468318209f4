//! Caching layer for built timetable pages.
//!
//! Building a page walks every trip of its timetables, so built pages are
//! kept for a while keyed by page id. The store is read-only while the
//! server runs, which makes the TTL a memory bound rather than a freshness
//! bound.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::engine::{
    FormattedTimetablePage, TimetableConfig, TimetableError, build_formatted_timetable_page,
};
use crate::store::TransitStore;

/// Cached page entry.
type PageEntry = Arc<FormattedTimetablePage>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(15 * 60),
            max_capacity: 500,
        }
    }
}

/// Cache of built pages keyed by page id.
pub struct PageCache {
    pages: MokaCache<String, PageEntry>,
}

impl PageCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let pages = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { pages }
    }

    pub async fn get(&self, page_id: &str) -> Option<PageEntry> {
        self.pages.get(page_id).await
    }

    pub async fn insert(&self, page_id: String, entry: PageEntry) {
        self.pages.insert(page_id, entry).await;
    }

    /// Approximate number of entries (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.pages.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.pages.invalidate_all();
    }

    #[cfg(test)]
    async fn sync(&self) {
        self.pages.run_pending_tasks().await;
    }
}

/// Page builder with caching.
///
/// Wraps a store and a config and caches every page it builds. Failed
/// builds are not cached.
pub struct CachedTimetables<S: TransitStore + ?Sized> {
    store: Arc<S>,
    config: Arc<TimetableConfig>,
    cache: PageCache,
}

impl<S: TransitStore + ?Sized> CachedTimetables<S> {
    pub fn new(store: Arc<S>, config: Arc<TimetableConfig>, cache_config: &CacheConfig) -> Self {
        Self {
            store,
            config,
            cache: PageCache::new(cache_config),
        }
    }

    /// Get a built page, building it if it is not cached.
    pub async fn page(&self, page_id: &str) -> Result<PageEntry, TimetableError> {
        if let Some(cached) = self.cache.get(page_id).await {
            return Ok(cached);
        }

        debug!(timetable_page_id = page_id, "Page cache miss");
        let page = Arc::new(build_formatted_timetable_page(
            self.store.as_ref(),
            page_id,
            &self.config,
        )?);
        self.cache.insert(page_id.to_string(), Arc::clone(&page)).await;

        Ok(page)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TimetableConfig {
        &self.config
    }

    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}
