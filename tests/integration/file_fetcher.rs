//! Integration tests for the JSON file fetcher

use papestash::error::FetchError;
use papestash::fetcher::{JsonFileFetcher, WallpaperFetcher};
use papestash::query::QueryOptions;
use papestash::types::{AspectRatio, WallpaperFilter};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use super::support::{data_source, record, wide};

#[tokio::test]
async fn test_reads_list_and_filters_locally() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wallpapers.json");
    let records = vec![
        wide(1),
        record(2, 1080, 1920, 300_000),
        record(3, 3440, 1440, 2_000_000),
    ];
    std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

    let fetcher = JsonFileFetcher::new(&path);
    let all = fetcher
        .fetch_wallpapers(&WallpaperFilter::default())
        .await
        .unwrap();
    assert_eq!(all, records);

    let tall = WallpaperFilter::new(Some(AspectRatio::Tall), None, None).unwrap();
    let only_tall = fetcher.fetch_wallpapers(&tall).await.unwrap();
    assert_eq!(only_tall.len(), 1);
    assert_eq!(only_tall[0].id, 2);

    let big = WallpaperFilter::new(None, Some(1_000_000), Some(5_000_000)).unwrap();
    let only_big = fetcher.fetch_wallpapers(&big).await.unwrap();
    assert_eq!(only_big.len(), 1);
    assert_eq!(only_big[0].id, 3);
}

#[tokio::test]
async fn test_reads_page_document_with_null_list() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("page.json");
    let body = json!({
        "wallpapers": null,
        "page": 1,
        "per_page": 25,
        "total_pages": 0,
        "total_count": 0,
    });
    std::fs::write(&path, body.to_string()).unwrap();

    let records = JsonFileFetcher::new(&path)
        .fetch_wallpapers(&WallpaperFilter::default())
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_missing_file_is_a_transport_error() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = JsonFileFetcher::new(temp_dir.path().join("absent.json"));
    let err = fetcher
        .fetch_wallpapers(&WallpaperFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_file_is_a_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    std::fs::write(&path, "[{\"id\": 1,").unwrap();

    let err = JsonFileFetcher::new(&path)
        .fetch_wallpapers(&WallpaperFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
}

#[tokio::test]
async fn test_file_edits_show_up_after_invalidate() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wallpapers.json");
    std::fs::write(&path, serde_json::to_string(&vec![wide(1)]).unwrap()).unwrap();

    let source = data_source(Arc::new(JsonFileFetcher::new(&path)), QueryOptions::default());
    assert_eq!(source.fetch_wallpapers().await.unwrap().len(), 1);

    std::fs::write(&path, serde_json::to_string(&vec![wide(1), wide(2)]).unwrap()).unwrap();
    assert_eq!(source.fetch_wallpapers().await.unwrap().len(), 1);

    source.invalidate();
    assert_eq!(source.fetch_wallpapers().await.unwrap().len(), 2);
}
