//! Configuration System
//!
//! Layered configuration for the wallpaper data source: built-in defaults,
//! the global config file, an explicit `--config` file and `PAPESTASH__*`
//! environment variables, validated after merging.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ApiError;
use crate::fetcher::HttpFetcherConfig;
use crate::logging::LoggingConfig;
use crate::query::{QueryOptions, RetryPolicy, StalePolicy};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::environment::ENV_PREFIX;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PapestashConfig {
    /// Wallpaper service connection
    #[serde(default)]
    pub api: ApiConfig,

    /// Cache behavior
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Wallpaper service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Page size requested from the list endpoint
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

pub(crate) fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

pub(crate) fn default_per_page() -> u32 {
    25
}

pub(crate) fn default_connect_timeout_secs() -> u64 {
    10
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            per_page: default_per_page(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), String> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err("base_url cannot be empty".to_string());
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("base_url must be an http(s) URL: {}", url));
        }
        if self.per_page == 0 {
            return Err("per_page must be greater than zero".to_string());
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err("timeouts must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn fetcher_config(&self) -> HttpFetcherConfig {
        HttpFetcherConfig {
            base_url: self.base_url.trim().to_string(),
            per_page: self.per_page,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Cache behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// How long a successful fetch stays fresh (milliseconds)
    #[serde(default = "default_stale_time_ms")]
    pub stale_time_ms: u64,

    /// keep-previous (stale-while-revalidate) or clear
    #[serde(default)]
    pub stale_policy: StalePolicy,

    #[serde(default)]
    pub retry: RetryConfig,
}

pub(crate) fn default_stale_time_ms() -> u64 {
    30_000
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: default_stale_time_ms(),
            stale_policy: StalePolicy::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Automatic retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first failed attempt; 0 disables retry
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

pub(crate) fn default_base_delay_ms() -> u64 {
    500
}

pub(crate) fn default_max_delay_ms() -> u64 {
    8_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

impl QueryConfig {
    pub fn to_options(&self) -> Result<QueryOptions, ApiError> {
        QueryOptions::new(
            Duration::from_millis(self.stale_time_ms),
            self.stale_policy,
            self.retry.to_policy(),
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        self.retry.to_policy().validate()
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Api(String),
    Query(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Api(msg) => write!(f, "api: {}", msg),
            ValidationError::Query(msg) => write!(f, "query: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PapestashConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.api.validate() {
            errors.push(ValidationError::Api(e));
        }
        if let Err(e) = self.query.validate() {
            errors.push(ValidationError::Query(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render as TOML, e.g. for `papestash config`.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self).map_err(|e| ApiError::Serialization(e.to_string()))
    }
}
