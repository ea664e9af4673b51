//! Object storage abstraction.
//!
//! The gateway needs exactly one capability from its backend: fetch an
//! object by key. [`ObjectStore`] is that boundary; the S3 adapter lives in
//! `sitegate-s3` and [`MemoryObjectStore`] backs tests.
//!
//! The trait uses `#[async_trait]` because it is held as
//! `Arc<dyn ObjectStore>` and shared across request tasks.

mod memory;

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

pub use memory::MemoryObjectStore;

/// Byte stream of an object body.
///
/// Dropping the stream releases the underlying backend connection.
pub type ObjectBody = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// An object returned by the backend.
pub struct StoredObject {
    /// The object contents.
    pub body: ObjectBody,
    /// Content type declared by the backend, if any.
    pub content_type: Option<String>,
    /// Object size in bytes, if the backend reports it.
    pub content_length: Option<u64>,
}

impl fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredObject")
            .field("body", &"...")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish()
    }
}

/// Backend failure signal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The object does not exist.
    #[error("object does not exist: {key}")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },

    /// Any other failure: permissions, transport, malformed response.
    #[error("{0}")]
    Backend(String),
}

/// Read access to the shared bucket.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Fetch the object stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the object does not exist and
    /// [`StoreError::Backend`] for every other failure.
    async fn get_object(&self, key: &str) -> Result<StoredObject, StoreError>;
}
