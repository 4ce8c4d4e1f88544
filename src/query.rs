//! Query Layer
//!
//! Generic cached, deduplicated asynchronous queries. [`QueryCache`] owns the
//! entries; [`QueryHandle`] is what view code holds.

pub mod cache;
pub mod handle;
pub mod key;
pub mod options;
pub mod state;

pub use cache::{fetch_fn, CacheStats, FetchFn, FetchFuture, FetchId, QueryCache};
pub use handle::QueryHandle;
pub use key::QueryKey;
pub use options::{QueryOptions, RetryPolicy, StalePolicy};
pub use state::{QueryState, QueryStatus};
