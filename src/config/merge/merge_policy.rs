//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

use crate::config::{
    default_base_delay_ms, default_base_url, default_connect_timeout_secs, default_max_delay_ms,
    default_per_page, default_request_timeout_secs, default_stale_time_ms,
};

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("api.base_url", default_base_url())?
        .set_default("api.per_page", i64::from(default_per_page()))?
        .set_default("api.connect_timeout_secs", default_connect_timeout_secs() as i64)?
        .set_default("api.request_timeout_secs", default_request_timeout_secs() as i64)?
        .set_default("query.stale_time_ms", default_stale_time_ms() as i64)?
        .set_default("query.stale_policy", "keep-previous")?
        .set_default("query.retry.max_retries", 0i64)?
        .set_default("query.retry.base_delay_ms", default_base_delay_ms() as i64)?
        .set_default("query.retry.max_delay_ms", default_max_delay_ms() as i64)
}
