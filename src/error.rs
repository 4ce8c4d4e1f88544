//! Error types for the papestash wallpaper data source.

use thiserror::Error;

/// Failure reported by a fetch collaborator.
///
/// Stored inside cached query state and handed to every waiter of a fetch,
/// so it is cheap to clone and carries only rendered messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Parse(String),
}

impl FetchError {
    /// User-visible reason string.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// Whether an automatic retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            FetchError::Parse(_) => false,
        }
    }
}

/// Crate-level errors for configuration, the CLI and awaited queries.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Wallpaper not found: {0}")]
    NotFound(i64),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}
