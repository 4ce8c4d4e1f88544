//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, FetchError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Fetch(fetch) => format!("Could not load wallpapers: {}", fetch.reason()),
        ApiError::NotFound(id) => format!("No wallpaper with id {}", id),
        other => other.to_string(),
    }
}

/// Process exit code per error category.
pub fn exit_code(e: &ApiError) -> i32 {
    match e {
        ApiError::ConfigError(_) | ApiError::InvalidQuery(_) => 2,
        ApiError::NotFound(_) => 3,
        ApiError::Fetch(FetchError::Transport(_)) => 4,
        ApiError::Fetch(_) => 5,
        ApiError::Io(_) | ApiError::Serialization(_) => 1,
    }
}
