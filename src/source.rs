//! Wallpaper Data Source
//!
//! Cached, deduplicated accessor for wallpaper records. Each filter gets its
//! own query key under the `"wallpapers"` root, so filtered and unfiltered
//! lists are cached independently and can be invalidated together.

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ApiError, FetchError};
use crate::fetcher::WallpaperFetcher;
use crate::query::{fetch_fn, FetchFn, QueryCache, QueryHandle, QueryKey, QueryOptions, QueryState};
use crate::types::{WallpaperFilter, WallpaperRecord};

/// Root key of every wallpaper query.
pub const WALLPAPERS_KEY: &str = "wallpapers";

pub type WallpaperList = Vec<WallpaperRecord>;

/// Observation handle for a wallpaper query.
pub type WallpaperQuery = QueryHandle<WallpaperList>;

pub struct WallpaperDataSource {
    cache: QueryCache<WallpaperList>,
    fetcher: Arc<dyn WallpaperFetcher>,
}

impl WallpaperDataSource {
    /// Build a data source with its own cache.
    pub fn new(fetcher: Arc<dyn WallpaperFetcher>, options: QueryOptions) -> Result<Self, ApiError> {
        options.validate()?;
        info!(
            source = fetcher.source_name(),
            stale_time_ms = options.stale_time.as_millis() as u64,
            stale_policy = ?options.stale_policy,
            max_retries = options.retry.max_retries,
            "Wallpaper data source created"
        );
        Ok(Self::with_cache(fetcher, QueryCache::new(options)))
    }

    /// Build a data source on top of an existing cache.
    pub fn with_cache(fetcher: Arc<dyn WallpaperFetcher>, cache: QueryCache<WallpaperList>) -> Self {
        Self { cache, fetcher }
    }

    pub fn cache(&self) -> &QueryCache<WallpaperList> {
        &self.cache
    }

    pub fn key_for(filter: &WallpaperFilter) -> QueryKey {
        let key = QueryKey::new(WALLPAPERS_KEY);
        if filter.is_empty() {
            key
        } else {
            key.with_segment(filter.to_string())
        }
    }

    fn query_fn(&self, filter: WallpaperFilter) -> FetchFn<WallpaperList> {
        let fetcher = Arc::clone(&self.fetcher);
        fetch_fn(move || {
            let fetcher = Arc::clone(&fetcher);
            async move { fetcher.fetch_wallpapers(&filter).await }
        })
    }

    /// Current state of the unfiltered list; schedules a fetch when needed.
    pub fn get_wallpapers(&self) -> QueryState<WallpaperList> {
        self.get_wallpapers_filtered(&WallpaperFilter::default())
    }

    pub fn get_wallpapers_filtered(&self, filter: &WallpaperFilter) -> QueryState<WallpaperList> {
        self.cache
            .observe(&Self::key_for(filter), &self.query_fn(*filter))
    }

    /// Observe, then wait for the result.
    pub async fn fetch_wallpapers(&self) -> Result<Arc<WallpaperList>, FetchError> {
        self.fetch_wallpapers_filtered(&WallpaperFilter::default())
            .await
    }

    pub async fn fetch_wallpapers_filtered(
        &self,
        filter: &WallpaperFilter,
    ) -> Result<Arc<WallpaperList>, FetchError> {
        self.cache
            .fetch(&Self::key_for(filter), &self.query_fn(*filter))
            .await
    }

    /// Fetch now, superseding any fetch in flight for the unfiltered list.
    pub async fn refetch(&self) -> Result<Arc<WallpaperList>, FetchError> {
        self.refetch_filtered(&WallpaperFilter::default()).await
    }

    pub async fn refetch_filtered(
        &self,
        filter: &WallpaperFilter,
    ) -> Result<Arc<WallpaperList>, FetchError> {
        self.cache
            .refetch(&Self::key_for(filter), &self.query_fn(*filter))
            .await
    }

    /// Mark the unfiltered list stale; the next observation refetches.
    pub fn invalidate(&self) -> bool {
        self.invalidate_filtered(&WallpaperFilter::default())
    }

    pub fn invalidate_filtered(&self, filter: &WallpaperFilter) -> bool {
        self.cache.invalidate(&Self::key_for(filter))
    }

    /// Mark every wallpaper query stale.
    pub fn invalidate_all(&self) -> usize {
        self.cache.invalidate_matching(&QueryKey::new(WALLPAPERS_KEY))
    }

    /// Drop filtered queries that have no live handle and no fetch in flight.
    /// The unfiltered list is kept.
    pub fn evict_unused_filters(&self) -> usize {
        self.cache.prune_unobserved(&QueryKey::new(WALLPAPERS_KEY))
    }

    pub fn handle(&self) -> WallpaperQuery {
        self.handle_filtered(&WallpaperFilter::default())
    }

    pub fn handle_filtered(&self, filter: &WallpaperFilter) -> WallpaperQuery {
        self.cache
            .observer(&Self::key_for(filter), &self.query_fn(*filter))
    }

    /// Look a wallpaper up by id in the (possibly cached) unfiltered list.
    pub async fn find(&self, id: i64) -> Result<WallpaperRecord, ApiError> {
        let wallpapers = self.fetch_wallpapers().await?;
        wallpapers
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or(ApiError::NotFound(id))
    }

    /// Tear down: abort in-flight fetches and drop cached data.
    pub fn shutdown(&self) {
        let aborted = self.cache.shutdown();
        debug!(aborted, "Wallpaper data source shut down");
    }
}
