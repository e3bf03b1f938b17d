//! # Source Resolver
//!
//! Turns a queued track into a readable byte stream: cache first, then the
//! track's registered provider.
//!
//! A cache hit short-circuits the provider entirely, and the caller uses
//! the `from_cache` flag to skip the caching tee on that stream — a stored
//! entry is never read out and written straight back in.

use std::sync::Arc;
use tracing::{debug, instrument};

use core_runtime::logging::redact_locator;
use session_traits::{ByteStream, CacheStore, ProviderRegistry, Result, Track};

/// A resolved byte stream plus where it came from.
pub struct ResolvedStream {
    /// The raw (container-format) audio bytes.
    pub stream: ByteStream,
    /// `true` when served from the cache store rather than the provider.
    pub from_cache: bool,
}

impl std::fmt::Debug for ResolvedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedStream")
            .field("from_cache", &self.from_cache)
            .finish()
    }
}

/// Cache-then-provider stream resolution.
pub struct SourceResolver {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn CacheStore>,
}

impl SourceResolver {
    pub fn new(registry: Arc<ProviderRegistry>, store: Arc<dyn CacheStore>) -> Self {
        Self { registry, store }
    }

    /// The provider registry this resolver dispatches on.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Opens the byte stream for `track`.
    ///
    /// Checks the cache store under the track's locator first; on a miss,
    /// dispatches to the provider registered for the track's source kind.
    /// Fails with [`SourceUnavailable`](session_traits::SessionError::SourceUnavailable)
    /// (recoverable, the track is skipped) when the provider cannot produce
    /// data, or [`UnsupportedTrackType`](session_traits::SessionError::UnsupportedTrackType)
    /// when no provider is registered for the kind.
    #[instrument(skip(self, track), fields(track_id = %track.id, source = %track.source))]
    pub async fn resolve(&self, track: &Track) -> Result<ResolvedStream> {
        if let Some(stream) = self.store.get(&track.locator).await {
            debug!(locator = %redact_locator(&track.locator), "resolved from cache");
            return Ok(ResolvedStream {
                stream,
                from_cache: true,
            });
        }

        let provider = self.registry.get(track.source)?;
        let stream = provider.open_stream(track).await?;
        debug!(locator = %redact_locator(&track.locator), "resolved from provider");
        Ok(ResolvedStream {
            stream,
            from_cache: false,
        })
    }
}

impl std::fmt::Debug for SourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceResolver")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use core_playback::MemoryCacheStore;
    use session_traits::{stream, SessionError, SourceKind, SourceProvider, TrackInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        opens: AtomicUsize,
    }

    #[async_trait]
    impl SourceProvider for CountingProvider {
        fn kind(&self) -> SourceKind {
            SourceKind::LocalFile
        }

        async fn fetch_info(&self, locator: &str) -> Result<Option<TrackInfo>> {
            Ok(Some(TrackInfo::new(locator)))
        }

        async fn open_stream(&self, _track: &Track) -> Result<ByteStream> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(stream::from_bytes(Bytes::from_static(b"provider bytes")))
        }
    }

    fn make_resolver() -> (SourceResolver, Arc<CountingProvider>, Arc<MemoryCacheStore>) {
        let provider = Arc::new(CountingProvider {
            opens: AtomicUsize::new(0),
        });
        let registry = Arc::new(ProviderRegistry::new().with(provider.clone()));
        let store = Arc::new(MemoryCacheStore::new(8));
        let resolver = SourceResolver::new(registry, store.clone());
        (resolver, provider, store)
    }

    fn track(locator: &str) -> Track {
        Track::new(SourceKind::LocalFile, locator, "tester", TrackInfo::new("t"))
    }

    #[tokio::test]
    async fn test_miss_falls_through_to_provider() {
        let (resolver, provider, _) = make_resolver();

        let resolved = resolver.resolve(&track("/music/a.flac")).await.unwrap();
        assert!(!resolved.from_cache);
        assert_eq!(provider.opens.load(Ordering::SeqCst), 1);

        let data = stream::collect(resolved.stream).await.unwrap();
        assert_eq!(data.as_ref(), b"provider bytes");
    }

    #[tokio::test]
    async fn test_hit_short_circuits_the_provider() {
        let (resolver, provider, store) = make_resolver();
        store
            .write("/music/a.flac", stream::from_bytes(Bytes::from_static(b"cached")))
            .await
            .unwrap();

        let resolved = resolver.resolve(&track("/music/a.flac")).await.unwrap();
        assert!(resolved.from_cache);
        assert_eq!(provider.opens.load(Ordering::SeqCst), 0);

        let data = stream::collect(resolved.stream).await.unwrap();
        assert_eq!(data.as_ref(), b"cached");
    }

    #[tokio::test]
    async fn test_unregistered_kind_is_rejected() {
        let (resolver, _, _) = make_resolver();
        let mut other = track("https://a.example/clip");
        other.source = SourceKind::Attachment;

        let err = resolver.resolve(&other).await.unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedTrackType(_)));
    }
}
