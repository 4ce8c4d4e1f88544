//! JSON file fetcher: a local stand-in for the wallpaper service.
//!
//! Accepts either a bare array of records or a page object as returned by
//! the list endpoint. Filters are applied locally.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::WallpaperFetcher;
use crate::error::FetchError;
use crate::types::{WallpaperFilter, WallpaperPage, WallpaperRecord};

#[derive(Deserialize)]
#[serde(untagged)]
enum WallpaperDocument {
    List(Vec<WallpaperRecord>),
    Page(WallpaperPage),
}

pub struct JsonFileFetcher {
    path: PathBuf,
}

impl JsonFileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_document(body: &str) -> Result<Vec<WallpaperRecord>, FetchError> {
    match serde_json::from_str::<WallpaperDocument>(body) {
        Ok(WallpaperDocument::List(records)) => Ok(records),
        Ok(WallpaperDocument::Page(page)) => Ok(page.wallpapers),
        Err(e) => Err(FetchError::Parse(format!("Invalid wallpaper document: {}", e))),
    }
}

#[async_trait]
impl WallpaperFetcher for JsonFileFetcher {
    async fn fetch_wallpapers(
        &self,
        filter: &WallpaperFilter,
    ) -> Result<Vec<WallpaperRecord>, FetchError> {
        let body = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FetchError::Transport(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let records: Vec<WallpaperRecord> = parse_document(&body)?
            .into_iter()
            .filter(|record| record.matches(filter))
            .collect();
        debug!(
            path = %self.path.display(),
            filter = %filter,
            count = records.len(),
            "Read wallpapers from file"
        );
        Ok(records)
    }

    fn source_name(&self) -> &str {
        "file"
    }
}
