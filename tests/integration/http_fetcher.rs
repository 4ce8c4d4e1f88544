//! Integration tests for the HTTP fetcher against a local canned-response server

use papestash::error::FetchError;
use papestash::fetcher::{HttpFetcherConfig, HttpWallpaperFetcher, WallpaperFetcher};
use papestash::query::QueryOptions;
use papestash::types::{AspectRatio, WallpaperFilter, WallpaperRecord};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::support::{data_source, record, wide};

type Responder = Arc<dyn Fn(&str) -> (u16, String) + Send + Sync>;

/// Serve one canned response per connection; returns the base URL and the request targets seen.
async fn serve(responder: Responder) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_server = Arc::clone(&seen);

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let text = String::from_utf8_lossy(&request).to_string();
            let target = text
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("")
                .to_string();
            seen_by_server.lock().push(target.clone());

            let (status, body) = responder(&target);
            let response = format!(
                "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), seen)
}

fn page(records: &[WallpaperRecord], page: u32, per_page: u32, total: usize) -> String {
    let total_pages = (total as u32 + per_page - 1) / per_page;
    json!({
        "wallpapers": records,
        "page": page,
        "per_page": per_page,
        "total_pages": total_pages,
        "total_count": total,
    })
    .to_string()
}

fn page_param(target: &str) -> usize {
    target
        .split(|c| c == '?' || c == '&')
        .find_map(|pair| pair.strip_prefix("page="))
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
}

fn fetcher(base_url: String, per_page: u32) -> HttpWallpaperFetcher {
    HttpWallpaperFetcher::new(HttpFetcherConfig {
        base_url,
        per_page,
        ..HttpFetcherConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_walks_every_page() {
    let all: Vec<WallpaperRecord> = (1..=5).map(wide).collect();
    let served = all.clone();
    let (base_url, seen) = serve(Arc::new(move |target: &str| {
        let n = page_param(target);
        let start = (n - 1) * 2;
        let end = (start + 2).min(served.len());
        (200, page(&served[start..end], n as u32, 2, served.len()))
    }))
    .await;

    let records = fetcher(base_url, 2)
        .fetch_wallpapers(&WallpaperFilter::default())
        .await
        .unwrap();
    assert_eq!(records, all);

    let seen = seen.lock().clone();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|t| t.starts_with("/api/v1/wallpapers?")));
    assert!(seen.iter().all(|t| t.contains("per_page=2")));
}

#[tokio::test]
async fn test_sends_filter_parameters() {
    let (base_url, seen) = serve(Arc::new(|_: &str| {
        (200, page(&[record(7, 2560, 1440, 900)], 1, 25, 1))
    }))
    .await;

    let filter = WallpaperFilter::new(Some(AspectRatio::Wide), Some(100), Some(1000)).unwrap();
    let records = fetcher(base_url, 25)
        .fetch_wallpapers(&filter)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);

    let target = seen.lock()[0].clone();
    assert!(target.contains("aspect_ratio=16%3A9"));
    assert!(target.contains("min_size=100"));
    assert!(target.contains("max_size=1000"));
}

#[tokio::test]
async fn test_empty_catalogue() {
    let (base_url, seen) = serve(Arc::new(|_: &str| (200, page(&[], 1, 25, 0)))).await;
    let records = fetcher(base_url, 25)
        .fetch_wallpapers(&WallpaperFilter::default())
        .await
        .unwrap();
    assert!(records.is_empty());
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let (base_url, _) = serve(Arc::new(|_: &str| {
        (500, r#"{"error":"Internal Server Error"}"#.to_string())
    }))
    .await;

    let err = fetcher(base_url, 25)
        .fetch_wallpapers(&WallpaperFilter::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FetchError::Status {
            status: 500,
            message: "Internal Server Error".to_string()
        }
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_bad_request_is_not_retryable() {
    let (base_url, _) = serve(Arc::new(|_: &str| {
        (400, r#"{"error":"Invalid aspect ratio"}"#.to_string())
    }))
    .await;

    let err = fetcher(base_url, 25)
        .fetch_wallpapers(&WallpaperFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 400, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_garbage_body_maps_to_parse() {
    let (base_url, _) = serve(Arc::new(|_: &str| (200, "not json at all".to_string()))).await;

    let err = fetcher(base_url, 25)
        .fetch_wallpapers(&WallpaperFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
}

#[tokio::test]
async fn test_refused_connection_maps_to_transport() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher(format!("http://{}", addr), 25)
        .fetch_wallpapers(&WallpaperFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}

#[tokio::test]
async fn test_data_source_over_http() {
    let (base_url, seen) = serve(Arc::new(|_: &str| {
        (200, page(&[wide(1), wide(2)], 1, 25, 2))
    }))
    .await;
    let source = data_source(Arc::new(fetcher(base_url, 25)), QueryOptions::default());

    let first = source.fetch_wallpapers().await.unwrap();
    let second = source.fetch_wallpapers().await.unwrap();
    assert_eq!(first.len(), 2);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(seen.lock().len(), 1);
}
