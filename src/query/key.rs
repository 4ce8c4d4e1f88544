//! Stable identifiers correlating cache entries with logical queries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hierarchical query key, e.g. `["wallpapers", "aspect_ratio=16:9"]`.
///
/// Two keys are the same query exactly when their segments are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(root: impl Into<String>) -> Self {
        Self(vec![root.into()])
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn root(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True if `prefix` is this key or one of its ancestors.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.0.iter().map(|s| format!("{:?}", s)).collect();
        write!(f, "[{}]", quoted.join(", "))
    }
}
