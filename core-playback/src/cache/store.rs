//! # In-Memory Cache Store
//!
//! Bounded key → byte-buffer store implementing the [`CacheStore`] seam.
//!
//! The store is the one resource shared across sessions, so it carries its
//! own synchronization: completed entries live in an LRU map, and an
//! in-flight reservation set de-duplicates concurrent writers for the same
//! key — the second writer's call is a no-op, not an error. Only completed
//! entries are ever evicted; a reservation cannot be displaced by pressure
//! on the LRU map.

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use tracing::{debug, warn};

use session_traits::{stream, ByteStream, CacheStore, Result, SessionError};

/// Bounded in-memory implementation of [`CacheStore`].
pub struct MemoryCacheStore {
    entries: Mutex<LruCache<String, Bytes>>,
    in_flight: Mutex<HashSet<String>>,
}

impl MemoryCacheStore {
    /// Creates a store retaining at most `max_entries` completed entries.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).expect("max(1) is non-zero");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Number of completed entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops every completed entry. In-flight writes are unaffected.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Reserves `key` for writing. Returns `false` if the key is already
    /// stored or already being written.
    fn reserve(&self, key: &str) -> bool {
        if self.entries.lock().contains(key) {
            return false;
        }
        self.in_flight.lock().insert(key.to_string())
    }

    fn release(&self, key: &str) {
        self.in_flight.lock().remove(key);
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn has(&self, key: &str) -> bool {
        self.entries.lock().contains(key)
    }

    async fn get(&self, key: &str) -> Option<ByteStream> {
        let data = self.entries.lock().get(key).cloned()?;
        debug!(key, bytes = data.len(), "cache hit");
        Some(stream::from_bytes(data))
    }

    async fn write(&self, key: &str, stream: ByteStream) -> Result<()> {
        if !self.reserve(key) {
            debug!(key, "cache write skipped, entry exists or is in flight");
            return Ok(());
        }

        match stream::collect(stream).await {
            Ok(data) => {
                debug!(key, bytes = data.len(), "cache entry stored");
                self.entries.lock().put(key.to_string(), data);
                self.release(key);
                Ok(())
            }
            Err(e) => {
                warn!(key, error = %e, "cache write failed");
                self.release(key);
                Err(SessionError::Cache(format!(
                    "failed to store entry for {}: {}",
                    key, e
                )))
            }
        }
    }
}

impl std::fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("entries", &self.len())
            .field("in_flight", &self.in_flight.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_get_round_trip() {
        let store = MemoryCacheStore::new(4);
        store
            .write("track-a", stream::from_bytes(Bytes::from_static(b"audio")))
            .await
            .unwrap();

        assert!(store.has("track-a").await);
        let data = stream::collect(store.get("track-a").await.unwrap())
            .await
            .unwrap();
        assert_eq!(data.as_ref(), b"audio");
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let store = MemoryCacheStore::new(4);
        assert!(!store.has("unknown").await);
        assert!(store.get("unknown").await.is_none());
    }

    #[tokio::test]
    async fn test_second_write_for_same_key_is_a_noop() {
        let store = MemoryCacheStore::new(4);
        store
            .write("key", stream::from_bytes(Bytes::from_static(b"first")))
            .await
            .unwrap();
        store
            .write("key", stream::from_bytes(Bytes::from_static(b"second")))
            .await
            .unwrap();

        let data = stream::collect(store.get("key").await.unwrap()).await.unwrap();
        assert_eq!(data.as_ref(), b"first");
    }

    #[tokio::test]
    async fn test_lru_eviction_beyond_capacity() {
        let store = MemoryCacheStore::new(2);
        for key in ["a", "b", "c"] {
            store
                .write(key, stream::from_bytes(Bytes::from_static(b"x")))
                .await
                .unwrap();
        }

        assert_eq!(store.len(), 2);
        assert!(!store.has("a").await, "oldest entry should be evicted");
        assert!(store.has("b").await);
        assert!(store.has("c").await);
    }

    #[tokio::test]
    async fn test_get_refreshes_recency() {
        let store = MemoryCacheStore::new(2);
        store
            .write("a", stream::from_bytes(Bytes::from_static(b"x")))
            .await
            .unwrap();
        store
            .write("b", stream::from_bytes(Bytes::from_static(b"x")))
            .await
            .unwrap();

        // Touch "a" so "b" becomes the eviction candidate.
        let _ = store.get("a").await;
        store
            .write("c", stream::from_bytes(Bytes::from_static(b"x")))
            .await
            .unwrap();

        assert!(store.has("a").await);
        assert!(!store.has("b").await);
    }

    #[tokio::test]
    async fn test_concurrent_writers_store_exactly_once() {
        use std::sync::Arc;

        let store = Arc::new(MemoryCacheStore::new(4));
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let payload = Bytes::from(format!("writer-{}", i));
                store.write("shared", stream::from_bytes(payload)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.len(), 1);
        assert!(store.has("shared").await);
    }
}
