use std::sync::Arc;

use thiserror::Error;

/// Errors produced by the query cache.
///
/// Clonable so one failed fetch can be handed to every waiter that
/// joined it.
#[derive(Error, Debug, Clone)]
pub enum QueryError {
    /// The fetch function failed. Nothing was cached.
    #[error("Fetch for '{key}' failed: {error:#}")]
    Fetch {
        key: String,
        error: Arc<anyhow::Error>,
    },

    /// The cached value under `key` has a different type than requested.
    #[error("Cached value for '{key}' has an unexpected type")]
    TypeMismatch { key: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QueryError>;
