//! Content fetching: the boundary between routing and storage.
//!
//! [`ContentFetcher`] calls the [`ObjectStore`] once per key and folds its
//! result into a [`FetchOutcome`], so the router matches on three explicit
//! cases instead of inspecting backend errors.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::key::ObjectKey;
use crate::store::{ObjectStore, StoreError, StoredObject};

/// Result of fetching one key.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The object exists; its body is ready to stream.
    Found(StoredObject),
    /// The backend reported that the object does not exist.
    NotFound,
    /// Any other backend failure, with its diagnostic message.
    UpstreamError(String),
}

/// Fetches objects from the shared bucket with a per-fetch deadline.
#[derive(Clone)]
pub struct ContentFetcher {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl std::fmt::Debug for ContentFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentFetcher")
            .field("store", &"...")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ContentFetcher {
    /// Create a fetcher over `store`, aborting any fetch that takes longer
    /// than `timeout`.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Fetch `key` once.
    pub async fn fetch(&self, key: &ObjectKey) -> FetchOutcome {
        debug!(key = %key, "fetching object");

        match tokio::time::timeout(self.timeout, self.store.get_object(key.as_str())).await {
            Ok(Ok(object)) => FetchOutcome::Found(object),
            Ok(Err(StoreError::NotFound { .. })) => {
                debug!(key = %key, "object not found");
                FetchOutcome::NotFound
            }
            Ok(Err(StoreError::Backend(message))) => {
                warn!(key = %key, error = %message, "backend fetch failed");
                FetchOutcome::UpstreamError(message)
            }
            Err(_) => {
                let message = format!("fetch timed out after {:?}", self.timeout);
                warn!(key = %key, error = %message, "backend fetch failed");
                FetchOutcome::UpstreamError(message)
            }
        }
    }
}
