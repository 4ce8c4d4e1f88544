//! HTTP fetcher for `GET /api/v1/wallpapers`.
//!
//! The endpoint is paginated (`page`, `per_page`, default 25 per page); the
//! fetcher walks every page and returns the concatenated records.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::WallpaperFetcher;
use crate::error::{ApiError, FetchError};
use crate::types::{WallpaperFilter, WallpaperPage, WallpaperRecord};

const WALLPAPERS_PATH: &str = "/api/v1/wallpapers";

/// Refuse to walk more pages than this in one fetch.
const MAX_PAGES: u32 = 10_000;

/// Connection settings for [`HttpWallpaperFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    pub base_url: String,
    pub per_page: u32,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            per_page: 25,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Deserialize)]
struct ServiceError {
    error: String,
}

fn map_http_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        FetchError::Transport(format!("Connection error: {}", error))
    } else if error.is_decode() {
        FetchError::Parse(format!("Failed to decode response: {}", error))
    } else {
        FetchError::Transport(format!("HTTP error: {}", error))
    }
}

fn status_error(status: StatusCode, body: &str) -> FetchError {
    let message = serde_json::from_str::<ServiceError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
    FetchError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Parse one page body from the list endpoint.
pub fn parse_page(body: &str) -> Result<WallpaperPage, FetchError> {
    serde_json::from_str(body)
        .map_err(|e| FetchError::Parse(format!("Invalid wallpaper page: {}", e)))
}

/// `reqwest`-backed client for the wallpaper service.
pub struct HttpWallpaperFetcher {
    client: Client,
    base_url: String,
    per_page: u32,
}

impl HttpWallpaperFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self, ApiError> {
        if config.per_page == 0 {
            return Err(ApiError::ConfigError(
                "per_page must be greater than zero".to_string(),
            ));
        }
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            per_page: config.per_page,
        })
    }

    pub fn list_url(&self) -> String {
        format!("{}{}", self.base_url, WALLPAPERS_PATH)
    }

    pub async fn fetch_page(
        &self,
        filter: &WallpaperFilter,
        page: u32,
    ) -> Result<WallpaperPage, FetchError> {
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        query.extend(filter.query_pairs());

        let response = self
            .client
            .get(self.list_url())
            .query(&query)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_http_error)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        parse_page(&body)
    }
}

#[async_trait]
impl WallpaperFetcher for HttpWallpaperFetcher {
    async fn fetch_wallpapers(
        &self,
        filter: &WallpaperFilter,
    ) -> Result<Vec<WallpaperRecord>, FetchError> {
        let first = self.fetch_page(filter, 1).await?;
        if first.total_pages > MAX_PAGES {
            return Err(FetchError::Parse(format!(
                "Service reported {} pages, more than the {} allowed",
                first.total_pages, MAX_PAGES
            )));
        }
        let total_pages = first.total_pages;
        let mut wallpapers = first.wallpapers;

        for page in 2..=total_pages {
            let next = self.fetch_page(filter, page).await?;
            wallpapers.extend(next.wallpapers);
        }

        debug!(
            url = %self.list_url(),
            filter = %filter,
            pages = total_pages.max(1),
            count = wallpapers.len(),
            "Fetched wallpapers over HTTP"
        );
        Ok(wallpapers)
    }

    fn source_name(&self) -> &str {
        "http"
    }
}
