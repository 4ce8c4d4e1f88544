//! Consumer-facing observation handle: `{ data, is_loading, is_error, refetch }`.

use std::sync::Arc;
use tokio::sync::watch;

use crate::error::FetchError;
use crate::query::cache::{FetchFn, QueryCache};
use crate::query::key::QueryKey;
use crate::query::state::QueryState;

/// Read-only view of one query plus the capability to refresh it.
///
/// Dropping a handle does not cancel a fetch it triggered; the result still
/// lands in the shared cache for other observers.
pub struct QueryHandle<T> {
    cache: QueryCache<T>,
    key: QueryKey,
    fetch: FetchFn<T>,
    receiver: watch::Receiver<QueryState<T>>,
}

impl<T: Send + Sync + 'static> QueryHandle<T> {
    pub(crate) fn new(
        cache: QueryCache<T>,
        key: QueryKey,
        fetch: FetchFn<T>,
        receiver: watch::Receiver<QueryState<T>>,
    ) -> Self {
        Self {
            cache,
            key,
            fetch,
            receiver,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn state(&self) -> QueryState<T> {
        self.receiver.borrow().clone()
    }

    pub fn data(&self) -> Option<Arc<T>> {
        self.receiver.borrow().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.receiver.borrow().is_loading()
    }

    pub fn is_fetching(&self) -> bool {
        self.receiver.borrow().is_fetching
    }

    pub fn is_error(&self) -> bool {
        self.receiver.borrow().is_error()
    }

    pub fn error(&self) -> Option<FetchError> {
        self.receiver.borrow().error.clone()
    }

    /// Re-observe the key, scheduling a fetch if the entry went stale.
    pub fn observe(&self) -> QueryState<T> {
        self.cache.observe(&self.key, &self.fetch)
    }

    /// Fetch now, superseding whatever is in flight.
    pub async fn refetch(&self) -> Result<Arc<T>, FetchError> {
        self.cache.refetch(&self.key, &self.fetch).await
    }

    /// Wait for the entry to settle without forcing a new fetch.
    pub async fn settled(&self) -> Result<Arc<T>, FetchError> {
        QueryCache::settle(self.receiver.clone()).await
    }

    /// Wait for the next published state. False once the entry is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}
