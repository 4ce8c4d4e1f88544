//! Papestash: cached access to a wallpaper catalogue
//!
//! A read-through query cache in front of a wallpaper service. Consumers
//! observe per-key state (idle, loading, success, error) while the cache
//! deduplicates concurrent fetches, keeps the last-initiated fetch's result,
//! and serves stale data while revalidating.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod query;
pub mod source;
pub mod types;

pub use source::{WallpaperDataSource, WallpaperList, WallpaperQuery};
