//! # Provider & Cache Seams
//!
//! Trait contracts between the session pipeline and its collaborators: the
//! per-source stream providers and the shared cache store. Both are object
//! safe so the session can hold them behind `Arc<dyn …>`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, SessionError};
use crate::model::{SourceKind, Track, TrackInfo};
use crate::stream::ByteStream;

/// One audio source integration (cloud platform, local files, …).
///
/// Implementations are stateless from the session's point of view: every call
/// carries the full locator/track, and no call depends on a previous one.
///
/// # Contract
///
/// - `fetch_info` returning `Ok(None)` means "not found" — that is a skip at
///   enqueue time, not an error.
/// - `open_stream` failing means the source cannot produce data right now;
///   the session logs, skips the track, and advances the queue.
/// - Neither call is subject to a timeout here; a stuck provider blocks only
///   the track it was asked about (prefetch decouples the rest).
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// The source kind this provider resolves.
    fn kind(&self) -> SourceKind;

    /// Fetches display metadata for a locator at enqueue time.
    ///
    /// Returns `Ok(None)` when the locator does not exist (deleted upload,
    /// missing file); errors are reserved for transport-level failures.
    async fn fetch_info(&self, locator: &str) -> Result<Option<TrackInfo>>;

    /// Opens the raw audio byte stream for a track.
    ///
    /// The track's `raw_info` payload is available for providers that
    /// pre-resolve data at enqueue time (e.g., a video format table).
    async fn open_stream(&self, track: &Track) -> Result<ByteStream>;
}

/// Key → stored byte stream map shared across sessions.
///
/// The store must tolerate concurrent use without caller-side locking, and
/// must de-duplicate concurrent `write` calls for the same key itself
/// (at-most-once-per-key semantics).
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns `true` if a completed entry exists for `key`.
    async fn has(&self, key: &str) -> bool;

    /// Opens a stream over the stored entry, or `None` on a miss.
    async fn get(&self, key: &str) -> Option<ByteStream>;

    /// Drains `stream` and stores it under `key`.
    ///
    /// A second writer for a key that is already stored or already being
    /// written is a no-op, not an error.
    async fn write(&self, key: &str, stream: ByteStream) -> Result<()>;
}

/// Source-kind → provider lookup table.
///
/// Exactly one provider per [`SourceKind`]; registering a second provider for
/// the same kind replaces the first. Lookup failure maps to
/// [`SessionError::UnsupportedTrackType`], which is how unplayable enqueue
/// requests are rejected before entering the queue.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<SourceKind, Arc<dyn SourceProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under its own `kind()`.
    pub fn register(&mut self, provider: Arc<dyn SourceProvider>) -> &mut Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, provider: Arc<dyn SourceProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Returns `true` if a provider is registered for `kind`.
    pub fn supports(&self, kind: SourceKind) -> bool {
        self.providers.contains_key(&kind)
    }

    /// Looks up the provider for `kind`.
    pub fn get(&self, kind: SourceKind) -> Result<Arc<dyn SourceProvider>> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| SessionError::UnsupportedTrackType(kind.as_str().to_string()))
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<&str> = self.providers.keys().map(|k| k.as_str()).collect();
        f.debug_struct("ProviderRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream;

    struct StubProvider(SourceKind);

    #[async_trait]
    impl SourceProvider for StubProvider {
        fn kind(&self) -> SourceKind {
            self.0
        }

        async fn fetch_info(&self, locator: &str) -> Result<Option<TrackInfo>> {
            if locator == "missing" {
                return Ok(None);
            }
            Ok(Some(TrackInfo::new(locator)))
        }

        async fn open_stream(&self, _track: &Track) -> Result<ByteStream> {
            Ok(stream::empty())
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ProviderRegistry::new()
            .with(Arc::new(StubProvider(SourceKind::LocalFile)))
            .with(Arc::new(StubProvider(SourceKind::Cloud)));

        assert_eq!(registry.len(), 2);
        assert!(registry.supports(SourceKind::Cloud));
        assert!(!registry.supports(SourceKind::VideoPlatform));
        assert!(registry.get(SourceKind::LocalFile).is_ok());
    }

    #[test]
    fn test_registry_unsupported_kind() {
        let registry = ProviderRegistry::new();
        let err = registry.get(SourceKind::Attachment).map(|_| ()).unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedTrackType(_)));
        assert!(err.is_rejected_input());
    }

    #[test]
    fn test_registry_replaces_same_kind() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubProvider(SourceKind::Cloud)));
        registry.register(Arc::new(StubProvider(SourceKind::Cloud)));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_stub_provider_info_none_is_not_error() {
        let provider = StubProvider(SourceKind::Cloud);
        let info = provider.fetch_info("missing").await.unwrap();
        assert!(info.is_none());
    }
}
