//! Observable lifecycle of a cached query result.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::FetchError;

/// Lifecycle phase of a query: `idle -> loading -> success | error`.
///
/// Re-enterable: `success` and `error` go back to `loading` on refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryStatus::Idle => "idle",
            QueryStatus::Loading => "loading",
            QueryStatus::Success => "success",
            QueryStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Point-in-time snapshot of one cache entry.
///
/// `data` is the last-known-good result and survives both refetches and
/// failures; `error` is the most recent failure and is cleared by the next
/// success.
#[derive(Debug)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<FetchError>,
    /// A fetch for this key is in flight (initial load or revalidation).
    pub is_fetching: bool,
    /// Marked stale by an invalidation and not refreshed since.
    pub is_invalidated: bool,
    pub data_updated_at: Option<DateTime<Utc>>,
    pub error_updated_at: Option<DateTime<Utc>>,
    /// Failed attempts since the last success, retries included.
    pub failure_count: u32,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            is_invalidated: self.is_invalidated,
            data_updated_at: self.data_updated_at,
            error_updated_at: self.error_updated_at,
            failure_count: self.failure_count,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T> QueryState<T> {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_fetching: false,
            is_invalidated: false,
            data_updated_at: None,
            error_updated_at: None,
            failure_count: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn error_reason(&self) -> Option<String> {
        self.error.as_ref().map(FetchError::reason)
    }
}
