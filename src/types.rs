//! Wallpaper domain types shared by the cache, the fetchers and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// One wallpaper as served by the wallpaper service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperRecord {
    pub id: i64,
    pub name: String,
    /// Locator of the full-size image
    pub path: String,
    pub thumbnail_path: String,
    /// Dominant color as `#rrggbb`
    pub most_frequent_color: String,
    pub height: u32,
    pub width: u32,
    /// Ratio label assigned by the service, e.g. `16:9`
    pub aspect_ratio: String,
    pub size_in_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl WallpaperRecord {
    /// Parsed ratio label, if the service sent a known one.
    pub fn aspect(&self) -> Option<AspectRatio> {
        self.aspect_ratio.parse().ok()
    }

    pub fn matches(&self, filter: &WallpaperFilter) -> bool {
        if let Some(ratio) = filter.aspect_ratio {
            if self.aspect_ratio != ratio.label() {
                return false;
            }
        }
        if let Some(range) = filter.size {
            if self.size_in_bytes < range.min_bytes || self.size_in_bytes > range.max_bytes {
                return false;
            }
        }
        true
    }
}

/// One page of `GET /api/v1/wallpapers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallpaperPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub wallpapers: Vec<WallpaperRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<WallpaperRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<WallpaperRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Aspect ratio buckets the service classifies images into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "21:9")]
    UltraWide,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    /// Candidates in classification order; earlier entries win ties.
    pub const ALL: [AspectRatio; 6] = [
        AspectRatio::Wide,
        AspectRatio::Tall,
        AspectRatio::UltraWide,
        AspectRatio::Standard,
        AspectRatio::Portrait,
        AspectRatio::Square,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Wide => "16:9",
            AspectRatio::Tall => "9:16",
            AspectRatio::UltraWide => "21:9",
            AspectRatio::Standard => "4:3",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Square => "1:1",
        }
    }

    pub fn ratio(self) -> f64 {
        let (w, h) = match self {
            AspectRatio::Wide => (16.0, 9.0),
            AspectRatio::Tall => (9.0, 16.0),
            AspectRatio::UltraWide => (21.0, 9.0),
            AspectRatio::Standard => (4.0, 3.0),
            AspectRatio::Portrait => (3.0, 4.0),
            AspectRatio::Square => (1.0, 1.0),
        };
        w / h
    }

    /// Nearest bucket for the given dimensions by absolute ratio difference.
    pub fn closest(width: u32, height: u32) -> Option<AspectRatio> {
        if height == 0 {
            return None;
        }
        let ratio = f64::from(width) / f64::from(height);
        let mut best: Option<(AspectRatio, f64)> = None;
        for candidate in Self::ALL {
            let diff = (ratio - candidate.ratio()).abs();
            match best {
                Some((_, best_diff)) if diff >= best_diff => {}
                _ => best = Some((candidate, diff)),
            }
        }
        best.map(|(ratio, _)| ratio)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AspectRatio {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.label() == s.trim())
            .ok_or_else(|| {
                ApiError::InvalidQuery(format!(
                    "Unknown aspect ratio '{}' (expected one of 16:9, 9:16, 21:9, 4:3, 3:4, 1:1)",
                    s
                ))
            })
    }
}

/// Inclusive file size range in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizeRange {
    pub min_bytes: u64,
    pub max_bytes: u64,
}

/// Server-side filters for the wallpaper list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallpaperFilter {
    pub aspect_ratio: Option<AspectRatio>,
    pub size: Option<SizeRange>,
}

impl WallpaperFilter {
    /// Build a filter, rejecting half-open or inverted size ranges.
    pub fn new(
        aspect_ratio: Option<AspectRatio>,
        min_size: Option<u64>,
        max_size: Option<u64>,
    ) -> Result<Self, ApiError> {
        let size = match (min_size, max_size) {
            (None, None) => None,
            (Some(min_bytes), Some(max_bytes)) => {
                if min_bytes > max_bytes {
                    return Err(ApiError::InvalidQuery(format!(
                        "min size {} exceeds max size {}",
                        min_bytes, max_bytes
                    )));
                }
                Some(SizeRange { min_bytes, max_bytes })
            }
            _ => {
                return Err(ApiError::InvalidQuery(
                    "min size and max size must be given together".to_string(),
                ))
            }
        };
        Ok(Self { aspect_ratio, size })
    }

    pub fn is_empty(&self) -> bool {
        self.aspect_ratio.is_none() && self.size.is_none()
    }

    /// Query parameters understood by the list endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ratio) = self.aspect_ratio {
            pairs.push(("aspect_ratio", ratio.label().to_string()));
        }
        if let Some(range) = self.size {
            pairs.push(("min_size", range.min_bytes.to_string()));
            pairs.push(("max_size", range.max_bytes.to_string()));
        }
        pairs
    }
}

impl fmt::Display for WallpaperFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}
