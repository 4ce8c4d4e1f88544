//! Wallpaper Fetch Collaborators
//!
//! The query layer never talks to the network or the disk itself; it calls a
//! [`WallpaperFetcher`]. Two implementations ship with the crate: an HTTP
//! client for the wallpaper service and a JSON file reader.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::{WallpaperFilter, WallpaperRecord};

pub mod file;
pub mod http;

pub use file::JsonFileFetcher;
pub use http::{HttpFetcherConfig, HttpWallpaperFetcher};

/// Source of wallpaper records.
#[async_trait]
pub trait WallpaperFetcher: Send + Sync {
    /// Fetch every record matching `filter`.
    async fn fetch_wallpapers(
        &self,
        filter: &WallpaperFilter,
    ) -> Result<Vec<WallpaperRecord>, FetchError>;

    /// Short name used in logs.
    fn source_name(&self) -> &str;
}
