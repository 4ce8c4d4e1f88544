//! Keyed Query Cache
//!
//! Owns one entry per [`QueryKey`] and runs fetches for them on the ambient
//! tokio runtime. Guarantees:
//! - at most one live fetch per key; observers arriving while it runs share it
//! - results apply in initiation order: a superseded fetch is aborted and its
//!   result, should it still arrive, is discarded
//! - every state transition happens inside one critical section and is then
//!   published to subscribers, so nobody observes a half-applied update
//! - fetch failures, including panics inside the fetcher, end up in the
//!   entry's error state and never propagate to observers

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::query::handle::QueryHandle;
use crate::query::key::QueryKey;
use crate::query::options::{QueryOptions, StalePolicy};
use crate::query::state::{QueryState, QueryStatus};

/// Boxed future produced by a fetch function.
pub type FetchFuture<T> = BoxFuture<'static, Result<T, FetchError>>;

/// Re-invocable fetch function; called once per attempt.
pub type FetchFn<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// Wrap an async closure as a [`FetchFn`].
pub fn fetch_fn<T, F, Fut>(f: F) -> FetchFn<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Identifier of one fetch initiation, increasing per cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchId(u64);

impl FetchId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Fetches initiated
    pub started: u64,
    pub succeeded: u64,
    /// Fetches that ended in the error state (after retries)
    pub failed: u64,
    /// Observations that joined a fetch already in flight
    pub deduplicated: u64,
    /// In-flight fetches replaced by a later initiation
    pub superseded: u64,
    /// Results that arrived for a fetch that was no longer current
    pub discarded: u64,
    pub retries: u64,
}

struct InFlight {
    id: FetchId,
    handle: JoinHandle<()>,
    /// Started before the entry was invalidated.
    invalidated: bool,
}

struct CacheEntry<T> {
    state: QueryState<T>,
    fetched_at: Option<Instant>,
    in_flight: Option<InFlight>,
    sender: watch::Sender<QueryState<T>>,
}

impl<T> CacheEntry<T> {
    fn new() -> Self {
        let (sender, _) = watch::channel(QueryState::idle());
        Self {
            state: QueryState::idle(),
            fetched_at: None,
            in_flight: None,
            sender,
        }
    }

    fn publish(&self) {
        self.sender.send_replace(self.state.clone());
    }

    fn needs_fetch(&self, options: &QueryOptions) -> bool {
        if self.state.data.is_none() || self.state.is_invalidated {
            return true;
        }
        if self.state.status == QueryStatus::Error {
            return true;
        }
        match self.fetched_at {
            Some(at) => at.elapsed() >= options.stale_time,
            None => true,
        }
    }

    fn abort_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(previous) => {
                previous.handle.abort();
                true
            }
            None => false,
        }
    }

    fn invalidate(&mut self, policy: StalePolicy) {
        self.state.is_invalidated = true;
        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.invalidated = true;
        }
        if policy == StalePolicy::Clear {
            self.state.data = None;
            self.state.data_updated_at = None;
            self.fetched_at = None;
            if self.state.status == QueryStatus::Success {
                self.state.status = QueryStatus::Idle;
            }
        }
    }
}

struct CacheInner<T> {
    entries: HashMap<QueryKey, CacheEntry<T>>,
    stats: CacheStats,
    next_fetch_id: u64,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Schedule {
    IfNeeded,
    Force,
}

/// Process-wide query cache. Cheap to clone; clones share entries.
///
/// Create one at application start and call [`QueryCache::shutdown`] when
/// tearing the application down.
pub struct QueryCache<T> {
    inner: Arc<Mutex<CacheInner<T>>>,
    options: Arc<QueryOptions>,
}

impl<T> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            options: Arc::clone(&self.options),
        }
    }
}

impl<T: Send + Sync + 'static> QueryCache<T> {
    pub fn new(options: QueryOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
                next_fetch_id: 1,
            })),
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Current state for `key`, scheduling a fetch when the entry has no
    /// fresh result and nothing is in flight. Never blocks.
    pub fn observe(&self, key: &QueryKey, fetch: &FetchFn<T>) -> QueryState<T> {
        self.schedule(key, fetch, Schedule::IfNeeded).0
    }

    /// Observe and wait for the entry to settle.
    pub async fn fetch(&self, key: &QueryKey, fetch: &FetchFn<T>) -> Result<Arc<T>, FetchError> {
        let (_, receiver) = self.schedule(key, fetch, Schedule::IfNeeded);
        Self::settle(receiver).await
    }

    /// Start a fetch now, superseding any in flight, and wait for it.
    pub async fn refetch(
        &self,
        key: &QueryKey,
        fetch: &FetchFn<T>,
    ) -> Result<Arc<T>, FetchError> {
        let (_, receiver) = self.schedule(key, fetch, Schedule::Force);
        Self::settle(receiver).await
    }

    /// Observation handle bound to `key`; creating it counts as an observation.
    pub fn observer(&self, key: &QueryKey, fetch: &FetchFn<T>) -> QueryHandle<T> {
        let (_, receiver) = self.schedule(key, fetch, Schedule::IfNeeded);
        QueryHandle::new(self.clone(), key.clone(), Arc::clone(fetch), receiver)
    }

    /// Snapshot without scheduling anything.
    pub fn get_state(&self, key: &QueryKey) -> QueryState<T> {
        let inner = self.inner.lock();
        inner
            .entries
            .get(key)
            .map(|entry| entry.state.clone())
            .unwrap_or_else(QueryState::idle)
    }

    /// Receiver of every state published for `key`.
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<QueryState<T>> {
        let mut inner = self.inner.lock();
        let entry = inner.entries.entry(key.clone()).or_insert_with(CacheEntry::new);
        entry.sender.subscribe()
    }

    /// Mark `key` stale. Returns false if the key has no entry.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let policy = self.options.stale_policy;
        let mut inner = self.inner.lock();
        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.invalidate(policy);
                entry.publish();
                debug!(key = %key, policy = ?policy, "Invalidated query");
                true
            }
            None => false,
        }
    }

    /// Mark every key under `prefix` stale; returns how many were marked.
    pub fn invalidate_matching(&self, prefix: &QueryKey) -> usize {
        let policy = self.options.stale_policy;
        let mut inner = self.inner.lock();
        let mut count = 0;
        for (key, entry) in inner.entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidate(policy);
                entry.publish();
                count += 1;
            }
        }
        debug!(prefix = %prefix, count, "Invalidated matching queries");
        count
    }

    /// Install `data` as a fresh success, superseding any in-flight fetch.
    pub fn set_data(&self, key: &QueryKey, data: T) {
        let mut inner = self.inner.lock();
        let CacheInner { entries, stats, .. } = &mut *inner;
        let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
        if entry.abort_in_flight() {
            stats.superseded += 1;
        }
        entry.state.status = QueryStatus::Success;
        entry.state.data = Some(Arc::new(data));
        entry.state.error = None;
        entry.state.is_fetching = false;
        entry.state.is_invalidated = false;
        entry.state.failure_count = 0;
        entry.state.data_updated_at = Some(Utc::now());
        entry.fetched_at = Some(Instant::now());
        entry.publish();
    }

    /// Drop the entry for `key`, aborting its fetch. Waiters on it settle with an error.
    pub fn remove(&self, key: &QueryKey) -> bool {
        let mut inner = self.inner.lock();
        match inner.entries.remove(key) {
            Some(mut entry) => {
                entry.abort_in_flight();
                true
            }
            None => false,
        }
    }

    /// Drop entries strictly below `prefix` that nobody subscribes to and that have no
    /// fetch in flight. Returns how many were dropped.
    pub fn prune_unobserved(&self, prefix: &QueryKey) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, entry| {
            key == prefix
                || !key.starts_with(prefix)
                || entry.in_flight.is_some()
                || entry.sender.receiver_count() > 0
        });
        let pruned = before - inner.entries.len();
        if pruned > 0 {
            debug!(prefix = %prefix, pruned, "Pruned unobserved queries");
        }
        pruned
    }

    /// Abort every in-flight fetch and clear all entries.
    pub fn shutdown(&self) -> usize {
        let mut inner = self.inner.lock();
        let mut aborted = 0;
        for (_, mut entry) in inner.entries.drain() {
            if entry.abort_in_flight() {
                aborted += 1;
            }
        }
        debug!(aborted, "Query cache shut down");
        aborted
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        let inner = self.inner.lock();
        let mut keys: Vec<QueryKey> = inner.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn in_flight_count(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .entries
            .values()
            .filter(|entry| entry.in_flight.is_some())
            .count()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    fn schedule(
        &self,
        key: &QueryKey,
        fetch: &FetchFn<T>,
        mode: Schedule,
    ) -> (QueryState<T>, watch::Receiver<QueryState<T>>) {
        let mut inner = self.inner.lock();
        let CacheInner {
            entries,
            stats,
            next_fetch_id,
        } = &mut *inner;
        let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);

        let start = match mode {
            Schedule::Force => true,
            Schedule::IfNeeded => match &entry.in_flight {
                Some(in_flight) if !in_flight.invalidated => {
                    stats.deduplicated += 1;
                    debug!(
                        key = %key,
                        fetch_id = in_flight.id.as_u64(),
                        "Joined in-flight query fetch"
                    );
                    false
                }
                Some(_) => true,
                None => entry.needs_fetch(&self.options),
            },
        };

        if start {
            if entry.abort_in_flight() {
                stats.superseded += 1;
                debug!(key = %key, "Superseded in-flight query fetch");
            }
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let id = FetchId(*next_fetch_id);
                    *next_fetch_id += 1;
                    stats.started += 1;
                    entry.state.status = QueryStatus::Loading;
                    entry.state.is_fetching = true;
                    let handle = runtime.spawn(self.clone().run_fetch(
                        key.clone(),
                        id,
                        Arc::clone(fetch),
                    ));
                    entry.in_flight = Some(InFlight {
                        id,
                        handle,
                        invalidated: false,
                    });
                    debug!(key = %key, fetch_id = id.as_u64(), "Started query fetch");
                }
                Err(_) => {
                    warn!(key = %key, "No async runtime available, query fetch not started");
                    stats.failed += 1;
                    entry.state.status = QueryStatus::Error;
                    entry.state.is_fetching = false;
                    entry.state.error = Some(FetchError::Transport(
                        "no async runtime available to run the fetch".to_string(),
                    ));
                    entry.state.error_updated_at = Some(Utc::now());
                    entry.state.failure_count += 1;
                }
            }
            entry.publish();
        }

        (entry.state.clone(), entry.sender.subscribe())
    }

    async fn run_fetch(self, key: QueryKey, id: FetchId, fetch: FetchFn<T>) {
        let retry = self.options.retry.clone();
        let mut attempt: u32 = 0;
        let result = loop {
            attempt += 1;
            let call = Arc::clone(&fetch);
            let outcome = AssertUnwindSafe(async move { call().await })
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(FetchError::Transport("fetcher panicked".to_string())));

            match outcome {
                Ok(data) => break Ok(data),
                Err(err) if retry.should_retry(attempt, &err) => {
                    if !self.record_retry(&key, id, &err) {
                        return;
                    }
                    let delay = retry.delay_for(attempt);
                    debug!(
                        key = %key,
                        fetch_id = id.as_u64(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying query fetch"
                    );
                    sleep(delay).await;
                }
                Err(err) => break Err(err),
            }
        };
        self.apply_result(&key, id, result);
    }

    /// Record a failed attempt that will be retried. False if the fetch is no
    /// longer current.
    fn record_retry(&self, key: &QueryKey, id: FetchId, err: &FetchError) -> bool {
        let mut inner = self.inner.lock();
        let CacheInner { entries, stats, .. } = &mut *inner;
        let entry = match entries.get_mut(key) {
            Some(entry) => entry,
            None => return false,
        };
        if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
            return false;
        }
        stats.retries += 1;
        entry.state.failure_count += 1;
        entry.state.error = Some(err.clone());
        entry.state.error_updated_at = Some(Utc::now());
        entry.publish();
        true
    }

    fn apply_result(&self, key: &QueryKey, id: FetchId, result: Result<T, FetchError>) {
        let mut inner = self.inner.lock();
        let CacheInner { entries, stats, .. } = &mut *inner;
        let entry = match entries.get_mut(key) {
            Some(entry) => entry,
            None => {
                debug!(key = %key, fetch_id = id.as_u64(), "Discarded result for removed query");
                return;
            }
        };
        if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
            stats.discarded += 1;
            debug!(key = %key, fetch_id = id.as_u64(), "Discarded superseded query result");
            return;
        }

        // A fetch started before an invalidation must not make the entry fresh again.
        let invalidated_meanwhile = entry
            .in_flight
            .take()
            .map(|f| f.invalidated)
            .unwrap_or(false);
        entry.state.is_fetching = false;
        match result {
            Ok(data) => {
                stats.succeeded += 1;
                entry.state.status = QueryStatus::Success;
                entry.state.data = Some(Arc::new(data));
                entry.state.error = None;
                entry.state.failure_count = 0;
                entry.state.is_invalidated = invalidated_meanwhile;
                entry.state.data_updated_at = Some(Utc::now());
                if invalidated_meanwhile {
                    entry.fetched_at = None;
                    debug!(
                        key = %key,
                        fetch_id = id.as_u64(),
                        "Query fetch succeeded after invalidation; stored as stale"
                    );
                } else {
                    entry.fetched_at = Some(Instant::now());
                    debug!(key = %key, fetch_id = id.as_u64(), "Query fetch succeeded");
                }
            }
            Err(err) => {
                stats.failed += 1;
                warn!(key = %key, fetch_id = id.as_u64(), error = %err, "Query fetch failed");
                entry.state.status = QueryStatus::Error;
                entry.state.error = Some(err);
                entry.state.failure_count += 1;
                entry.state.error_updated_at = Some(Utc::now());
            }
        }
        entry.publish();
    }

    /// Wait until the entry behind `receiver` has no fetch in flight.
    pub(crate) async fn settle(
        mut receiver: watch::Receiver<QueryState<T>>,
    ) -> Result<Arc<T>, FetchError> {
        loop {
            {
                let state = receiver.borrow_and_update();
                if !state.is_fetching {
                    return match (state.status, &state.data, &state.error) {
                        (QueryStatus::Success, Some(data), _) => Ok(Arc::clone(data)),
                        (QueryStatus::Error, _, Some(err)) => Err(err.clone()),
                        _ => Err(FetchError::Transport(
                            "query was cancelled before it settled".to_string(),
                        )),
                    };
                }
            }
            if receiver.changed().await.is_err() {
                return Err(FetchError::Transport(
                    "query was removed before it settled".to_string(),
                ));
            }
        }
    }
}
