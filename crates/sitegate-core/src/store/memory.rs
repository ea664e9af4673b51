//! In-memory object store for tests.

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::{ObjectStore, StoreError, StoredObject};

/// Chunk size used when replaying stored bytes as a stream.
const CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone)]
struct Entry {
    data: Bytes,
    content_type: Option<String>,
}

/// Thread-safe in-memory [`ObjectStore`].
///
/// Keys registered with [`fail_on`](Self::fail_on) return a backend error,
/// and every lookup is recorded so callers can assert on fetch order. The
/// fetch log is never truncated, so the store is meant for tests rather
/// than long-running servers.
///
/// # Examples
///
/// ```
/// use sitegate_core::{MemoryObjectStore, ObjectStore};
///
/// # tokio_test::block_on(async {
/// let store = MemoryObjectStore::new();
/// store.insert("__outputs/proj1/index.html", "<h1>hi</h1>", Some("text/html"));
///
/// let object = store.get_object("__outputs/proj1/index.html").await.unwrap();
/// assert_eq!(object.content_length, Some(11));
/// assert_eq!(store.fetched_keys(), vec!["__outputs/proj1/index.html"]);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, Entry>,
    failures: DashMap<String, String>,
    fetch_log: Mutex<Vec<String>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under `key`, replacing any previous object.
    pub fn insert(
        &self,
        key: impl Into<String>,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
    ) {
        self.objects.insert(
            key.into(),
            Entry {
                data: data.into(),
                content_type: content_type.map(ToOwned::to_owned),
            },
        );
    }

    /// Make every fetch of `key` fail with a backend error carrying `message`.
    pub fn fail_on(&self, key: impl Into<String>, message: impl Into<String>) {
        self.failures.insert(key.into(), message.into());
    }

    /// Keys looked up so far, in order.
    #[must_use]
    pub fn fetched_keys(&self) -> Vec<String> {
        self.fetch_log.lock().clone()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, key: &str) -> Result<StoredObject, StoreError> {
        self.fetch_log.lock().push(key.to_owned());

        if let Some(message) = self.failures.get(key) {
            return Err(StoreError::Backend(message.value().clone()));
        }

        let entry = self
            .objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_owned(),
            })?;

        let length = u64::try_from(entry.data.len()).ok();
        let chunks: Vec<Result<Bytes, std::io::Error>> = (0..entry.data.len())
            .step_by(CHUNK_SIZE)
            .map(|start| {
                let end = (start + CHUNK_SIZE).min(entry.data.len());
                Ok(entry.data.slice(start..end))
            })
            .collect();

        Ok(StoredObject {
            body: Box::pin(futures::stream::iter(chunks)),
            content_type: entry.content_type,
            content_length: length,
        })
    }
}
