//! Error types for loaders, the data store and resolver key parsing.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for data store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures reported by a [`DataStore`](crate::store::DataStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The write would violate a uniqueness or reference constraint.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The write carried values the store refuses.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The store could not be reached or failed mid-query.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure delivered to every request of a batch.
///
/// Cloned once per waiting caller, so the underlying fetch error is shared behind an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The batch function returned an error.
    #[error("batch load failed: {0}")]
    Fetch(Arc<dyn std::error::Error + Send + Sync>),

    /// The batch function did not finish within the configured fetch timeout.
    #[error("batch load timed out after {0:?}")]
    Timeout(Duration),

    /// The loader worker is gone (the owning loader was dropped).
    #[error("loader closed before the request was answered")]
    Closed,
}

impl LoadError {
    pub(crate) fn fetch<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        LoadError::Fetch(Arc::new(error))
    }
}

/// A resolver argument that cannot be used as a load key.
#[derive(Debug, Clone, Error)]
#[error("malformed id {raw:?}: {reason}")]
pub struct KeyError {
    pub raw: String,
    pub reason: String,
}
