//! # Player Session
//!
//! The orchestrator: owns the queue, the filter set, the playback state
//! machine, and the single active resource slot, and drives the resolve →
//! cache-tee → transcode → resource pipeline on every track activation.
//!
//! ```text
//!  add_tracks      ┌──────────────┐  on_sink_idle / skip
//! ───────────────> │ PlayerSession│ <────────────────────
//!                  └──────┬───────┘
//!          advance queue  │
//!                         ▼
//!   SourceResolver ─> CacheSink tee ─> Transcoder? ─> PlayableResource
//!   (cache/provider)  (raw bytes)      (filters/seek)       │
//!                                                           ▼
//!                                                     PlaybackSink
//! ```
//!
//! ## Concurrency model
//!
//! Plain state (queue, options, filters, state, controls handle) lives
//! behind `parking_lot` mutexes that are never held across an await.
//! The active transcode and the prefetched stream live behind `tokio`
//! mutexes because replacing them involves async shutdown. The session is
//! used as `Arc<PlayerSession>`; activation and prefetch tasks clone the
//! Arc.
//!
//! ## Rebuild semantics
//!
//! Every filter mutation and every seek tears the current pipeline down
//! and rebuilds it from a fresh resolve of the same track (served from the
//! cache when a completed entry exists). With `seek_on_filter_change` set,
//! a filter rebuild carries the pre-rebuild position into the new
//! invocation's seek so audible playback continues where it was.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use core_filters::{FilterSet, FilterValue, TranscodeArgs};
use core_playback::{
    ActiveTranscode, CacheSink, MemoryCacheStore, PlayableResource, PlaybackSink,
    ResourceControls, Transcoder,
};
use core_runtime::config::{PlayerOptions, SessionConfig, MAX_VOLUME_PERCENT};
use core_runtime::events::{EventBus, SessionEventKind};
use session_traits::{
    CacheStore, LoopMode, ProviderRegistry, Result, SessionError, Track, TrackInfo,
};

use crate::queue::TrackQueue;
use crate::resolver::{ResolvedStream, SourceResolver};
use crate::state::PlayerState;

/// An enqueue request: everything the caller knows about a track before
/// the provider has been consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRequest {
    /// Which provider should resolve this track.
    pub source: session_traits::SourceKind,
    /// Provider-specific address; becomes the cache key.
    pub locator: String,
    /// Who asked for it.
    pub requested_by: String,
    /// Opaque pre-resolved provider payload, when the caller has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_info: Option<serde_json::Value>,
}

impl TrackRequest {
    pub fn new(
        source: session_traits::SourceKind,
        locator: impl Into<String>,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            source,
            locator: locator.into(),
            requested_by: requested_by.into(),
            raw_info: None,
        }
    }

    pub fn with_raw_info(mut self, raw_info: serde_json::Value) -> Self {
        self.raw_info = Some(raw_info);
        self
    }
}

/// A stream resolved ahead of need for the next queue entry.
struct Prefetched {
    track_id: Uuid,
    resolved: ResolvedStream,
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`PlayerSession`].
pub struct PlayerSessionBuilder {
    config: SessionConfig,
    registry: ProviderRegistry,
    store: Option<Arc<dyn CacheStore>>,
    sink: Option<Arc<dyn PlaybackSink>>,
    events: Option<EventBus>,
}

impl PlayerSessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            registry: ProviderRegistry::new(),
            store: None,
            sink: None,
            events: None,
        }
    }

    /// Registers a provider for its own source kind.
    pub fn with_provider(mut self, provider: Arc<dyn session_traits::SourceProvider>) -> Self {
        self.registry.register(provider);
        self
    }

    /// Replaces the whole provider registry.
    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Uses `store` instead of a fresh per-session in-memory store. Pass a
    /// shared handle to share cached entries across sessions.
    pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// The playback sink resources are handed to. Required.
    pub fn with_sink(mut self, sink: Arc<dyn PlaybackSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Uses `events` instead of a fresh bus. Pass a shared handle when the
    /// host already holds subscribers.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Validates the configuration and assembles the session.
    pub fn build(self) -> Result<Arc<PlayerSession>> {
        self.config.validate()?;
        let sink = self
            .sink
            .ok_or_else(|| SessionError::Config("a playback sink is required".to_string()))?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryCacheStore::new(self.config.cache.max_entries)));
        let events = self.events.unwrap_or_default();

        let options = PlayerOptions {
            volume: self.config.default_volume,
            ..PlayerOptions::default()
        };

        Ok(Arc::new(PlayerSession {
            resolver: SourceResolver::new(Arc::new(self.registry), Arc::clone(&store)),
            transcoder: Transcoder::new(self.config.transcoder.clone()),
            cache_sink: CacheSink::new(store, self.config.cache.clone())
                .with_event_bus(events.clone()),
            sink,
            events,
            config: self.config,
            options: Mutex::new(options),
            queue: Mutex::new(TrackQueue::new()),
            filters: Mutex::new(FilterSet::new()),
            state: Mutex::new(PlayerState::Idle),
            controls: Mutex::new(None),
            active: AsyncMutex::new(None),
            prefetched: AsyncMutex::new(None),
            prefetch_task: Mutex::new(None),
            pending_advance: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        }))
    }
}

// ============================================================================
// Session
// ============================================================================

/// One playback session: a queue, a filter graph, and at most one active
/// resource.
pub struct PlayerSession {
    config: SessionConfig,
    resolver: SourceResolver,
    transcoder: Transcoder,
    cache_sink: CacheSink,
    sink: Arc<dyn PlaybackSink>,
    events: EventBus,

    options: Mutex<PlayerOptions>,
    queue: Mutex<TrackQueue>,
    filters: Mutex<FilterSet>,
    state: Mutex<PlayerState>,
    /// Volume/elapsed handle of the current resource, retained after the
    /// resource itself moved into the sink.
    controls: Mutex<Option<Arc<ResourceControls>>>,

    active: AsyncMutex<Option<ActiveTranscode>>,
    prefetched: AsyncMutex<Option<Prefetched>>,
    prefetch_task: Mutex<Option<JoinHandle<()>>>,
    /// Set when the sink reported idle while paused; `resume` consumes it.
    /// The sink reports a drained resource exactly once, so the advance is
    /// deferred rather than dropped.
    pending_advance: AtomicBool,
    destroyed: AtomicBool,
}

impl PlayerSession {
    pub fn builder(config: SessionConfig) -> PlayerSessionBuilder {
        PlayerSessionBuilder::new(config)
    }

    /// The session's event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PlayerState {
        *self.state.lock()
    }

    /// The track currently holding the resource slot.
    pub fn current_track(&self) -> Option<Track> {
        self.queue.lock().current().cloned()
    }

    /// Number of pending tracks (excluding the current one).
    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Snapshot of the active filter graph (`name=value`, comma-joined).
    pub fn filter_graph(&self) -> String {
        self.filters.lock().graph()
    }

    /// Current loop mode.
    pub fn loop_mode(&self) -> LoopMode {
        self.options.lock().loop_mode
    }

    /// Current volume in percent.
    pub fn volume(&self) -> u8 {
        self.options.lock().volume
    }

    /// Reported playback position of the current resource.
    ///
    /// `None` when no resource is active. After a seek to T this restarts
    /// at T even though the byte stream restarted at zero.
    pub fn elapsed(&self) -> Option<Duration> {
        self.controls.lock().as_ref().map(|c| c.elapsed())
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(SessionError::Internal(
                "session has been destroyed".to_string(),
            ));
        }
        Ok(())
    }

    /// Moves the state machine, emitting `StateChanged` on a real change.
    /// An off-diagram transition is logged and dropped.
    fn set_state(&self, to: PlayerState) {
        let mut state = self.state.lock();
        if *state == to {
            return;
        }
        if !state.can_transition_to(to) {
            warn!(from = %state, %to, "invalid state transition dropped");
            return;
        }
        let from = *state;
        *state = to;
        drop(state);
        self.events.emit(SessionEventKind::StateChanged {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        });
    }

    // ========================================================================
    // Enqueue
    // ========================================================================

    /// Validates, resolves metadata for, and enqueues a batch of requests.
    ///
    /// A request whose source kind has no registered provider rejects the
    /// whole batch before anything is enqueued. A request whose provider
    /// reports "not found" is skipped with a warning; provider transport
    /// errors likewise skip just that request. Returns the tracks that made
    /// it into the queue, in order.
    ///
    /// If the session was idle, the first enqueued track activates.
    #[instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn add_tracks(self: &Arc<Self>, requests: Vec<TrackRequest>) -> Result<Vec<Track>> {
        self.ensure_alive()?;

        // Unsupported kinds fail the batch up front, before any provider
        // round-trip.
        for request in &requests {
            if !self.resolver.registry().supports(request.source) {
                return Err(SessionError::UnsupportedTrackType(
                    request.source.as_str().to_string(),
                ));
            }
        }

        let mut enqueued = Vec::new();
        for request in requests {
            let provider = self.resolver.registry().get(request.source)?;
            let info: Option<TrackInfo> = match provider.fetch_info(&request.locator).await {
                Ok(info) => info,
                Err(e) => {
                    warn!(source = %request.source, error = %e, "metadata fetch failed, skipping");
                    self.events.emit(SessionEventKind::TrackFailed {
                        track_id: None,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            let Some(info) = info else {
                warn!(source = %request.source, "locator not found, skipping");
                continue;
            };

            let mut track = Track::new(request.source, request.locator, request.requested_by, info);
            track.raw_info = request.raw_info;
            debug!(track_id = %track.id, title = %track.info.title, "track enqueued");
            self.queue.lock().push(track.clone());
            enqueued.push(track);
        }

        let should_activate = {
            let queue = self.queue.lock();
            queue.current().is_none() && !queue.is_empty()
        };
        if should_activate && !enqueued.is_empty() {
            self.activate_next(false).await;
        }

        Ok(enqueued)
    }

    // ========================================================================
    // Activation
    // ========================================================================

    /// Advances the queue and activates the resulting track, skipping over
    /// tracks that fail to resolve until one plays or the queue runs out.
    async fn activate_next(self: &Arc<Self>, mut forced: bool) {
        // Any advance supersedes an idle deferred during pause.
        self.pending_advance.store(false, Ordering::SeqCst);
        loop {
            let loop_mode = self.options.lock().loop_mode;
            let next = self
                .queue
                .lock()
                .advance(loop_mode, forced)
                .cloned();

            let Some(track) = next else {
                info!("queue exhausted");
                self.teardown_active().await;
                *self.controls.lock() = None;
                self.set_state(PlayerState::Idle);
                self.events.emit(SessionEventKind::QueueEnded);
                return;
            };

            match self.start_track(&track).await {
                Ok(()) => return,
                Err(e) => {
                    warn!(track_id = %track.id, error = %e, "track activation failed, skipping");
                    self.events.emit(SessionEventKind::TrackFailed {
                        track_id: Some(track.id),
                        message: e.to_string(),
                    });
                    // Even a repeat-one queue must not replay a broken track.
                    forced = true;
                }
            }
        }
    }

    /// Builds and hands off the resource for `track`: resolve (prefetched
    /// stream, cache, or provider), tee into the cache, transcode when the
    /// filter graph demands it, and play.
    #[instrument(skip(self, track), fields(track_id = %track.id))]
    async fn start_track(self: &Arc<Self>, track: &Track) -> Result<()> {
        self.teardown_active().await;

        let resolved = match self.take_prefetched(track.id).await {
            Some(resolved) => {
                debug!("using prefetched stream");
                resolved
            }
            None => self.resolver.resolve(track).await?,
        };

        let loop_mode = self.options.lock().loop_mode;
        // A cache hit is already stored; teeing it back in would be a no-op
        // at best.
        let stream = if resolved.from_cache {
            resolved.stream
        } else {
            self.cache_sink
                .maybe_cache(&track.locator, loop_mode, resolved.stream)
                .await
        };

        let resource = self.build_resource(track.id, stream, None).await?;
        *self.controls.lock() = Some(resource.controls());

        self.sink.play(resource).await?;
        self.set_state(PlayerState::Playing);
        info!(title = %track.info.title, "track started");
        self.events.emit(SessionEventKind::TrackStarted {
            track_id: track.id,
            title: track.info.title.clone(),
        });

        self.spawn_prefetch();
        Ok(())
    }

    /// Wraps a resolved stream into a playable resource, spawning the
    /// transcoder when the filter graph or a pending seek requires it.
    async fn build_resource(
        &self,
        track_id: Uuid,
        stream: session_traits::ByteStream,
        seek_seconds: Option<u64>,
    ) -> Result<PlayableResource> {
        let volume = self.options.lock().volume;
        let (requires_transcode, args) = {
            let filters = self.filters.lock();
            let mut builder = TranscodeArgs::new(&filters);
            if let Some(seconds) = seek_seconds {
                builder = builder.with_seek(seconds);
            }
            (builder.requires_transcode(), builder.build())
        };

        if !requires_transcode {
            return Ok(PlayableResource::from_raw(track_id, stream, volume));
        }

        let mut active = self.transcoder.start(stream, args)?;
        let frames = active.take_frames().ok_or_else(|| {
            SessionError::Internal("transcode frame channel already taken".to_string())
        })?;
        *self.active.lock().await = Some(active);

        let mut resource = PlayableResource::from_frames(track_id, frames, volume);
        if let Some(seconds) = seek_seconds {
            resource = resource.with_elapsed_override(Duration::from_secs(seconds));
        }
        Ok(resource)
    }

    /// Cancels and joins the in-flight transcode, if any.
    async fn teardown_active(&self) {
        if let Some(mut active) = self.active.lock().await.take() {
            active.shutdown().await;
        }
    }

    // ========================================================================
    // Prefetch
    // ========================================================================

    fn spawn_prefetch(self: &Arc<Self>) {
        if !self.config.prefetch {
            return;
        }
        let Some(next) = self.queue.lock().peek_next().cloned() else {
            return;
        };

        let session = Arc::clone(self);
        let task = tokio::spawn(async move {
            match session.resolver.resolve(&next).await {
                Ok(resolved) => {
                    debug!(track_id = %next.id, "prefetch resolved");
                    *session.prefetched.lock().await = Some(Prefetched {
                        track_id: next.id,
                        resolved,
                    });
                }
                Err(e) => {
                    // Activation will retry (and report) the failure itself.
                    debug!(track_id = %next.id, error = %e, "prefetch failed");
                }
            }
        });

        if let Some(previous) = self.prefetch_task.lock().replace(task) {
            previous.abort();
        }
    }

    async fn take_prefetched(&self, track_id: Uuid) -> Option<ResolvedStream> {
        let mut slot = self.prefetched.lock().await;
        match slot.take() {
            Some(p) if p.track_id == track_id => Some(p.resolved),
            // A stale prefetch (skip jumped past it) is kept for its track.
            Some(p) => {
                *slot = Some(p);
                None
            }
            None => None,
        }
    }

    // ========================================================================
    // Sink callbacks
    // ========================================================================

    /// The sink drained the current resource.
    ///
    /// Paused sessions hold their position: the advance is deferred and
    /// [`resume`](Self::resume) performs it.
    pub async fn on_sink_idle(self: &Arc<Self>) {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }
        if self.options.lock().paused {
            debug!("sink idle while paused, deferring advance to resume");
            self.pending_advance.store(true, Ordering::SeqCst);
            return;
        }
        if let Some(track) = self.current_track() {
            self.events
                .emit(SessionEventKind::TrackFinished { track_id: track.id });
        }
        self.activate_next(false).await;
    }

    /// The sink failed while consuming the current resource.
    pub async fn on_sink_error(self: &Arc<Self>, error: SessionError) {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }
        let track_id = self.current_track().map(|t| t.id);
        warn!(?track_id, error = %error, "sink reported an error, skipping track");
        self.events.emit(SessionEventKind::TrackFailed {
            track_id,
            message: error.to_string(),
        });
        self.activate_next(true).await;
    }

    // ========================================================================
    // Transport controls
    // ========================================================================

    /// Holds playback; a drained resource will not trigger queue advance
    /// until [`resume`](Self::resume). Requires an active track.
    pub fn pause(&self) -> Result<()> {
        self.ensure_alive()?;
        if self.controls.lock().is_none() {
            return Err(SessionError::Internal(
                "pause requires an active track".to_string(),
            ));
        }
        self.options.lock().paused = true;
        self.set_state(PlayerState::Paused);
        Ok(())
    }

    /// Releases a previous [`pause`](Self::pause), performing the queue
    /// advance for any resource that drained while paused. A no-op when the
    /// session is not paused.
    pub async fn resume(self: &Arc<Self>) -> Result<()> {
        self.ensure_alive()?;
        {
            let mut options = self.options.lock();
            if !options.paused {
                return Ok(());
            }
            options.paused = false;
        }
        self.set_state(PlayerState::Playing);
        if self.pending_advance.swap(false, Ordering::SeqCst) {
            if let Some(track) = self.current_track() {
                self.events
                    .emit(SessionEventKind::TrackFinished { track_id: track.id });
            }
            self.activate_next(false).await;
        }
        Ok(())
    }

    /// Abandons the current track and activates the next one. The skipped
    /// track never replays, regardless of loop mode.
    pub async fn skip(self: &Arc<Self>) -> Result<()> {
        self.ensure_alive()?;
        self.activate_next(true).await;
        Ok(())
    }

    /// Stops playback and drops the current resource. Pending queue entries
    /// survive; a later [`add_tracks`](Self::add_tracks) or
    /// [`skip`](Self::skip) resumes from them.
    pub async fn stop(self: &Arc<Self>) -> Result<()> {
        self.ensure_alive()?;
        self.pending_advance.store(false, Ordering::SeqCst);
        self.teardown_active().await;
        self.sink.stop().await;
        *self.controls.lock() = None;
        self.queue.lock().drop_current();
        self.set_state(PlayerState::Idle);
        Ok(())
    }

    /// Sets the volume (percent, up to [`MAX_VOLUME_PERCENT`]). Applies to
    /// the current resource from its next frame and to all future ones.
    pub fn set_volume(&self, percent: u8) -> Result<()> {
        self.ensure_alive()?;
        if percent > MAX_VOLUME_PERCENT {
            return Err(SessionError::Config(format!(
                "volume must be <= {}, got {}",
                MAX_VOLUME_PERCENT, percent
            )));
        }
        self.options.lock().volume = percent;
        if let Some(controls) = self.controls.lock().as_ref() {
            controls.set_volume(percent);
        }
        self.events
            .emit(SessionEventKind::VolumeChanged { volume: percent });
        Ok(())
    }

    /// Sets the queue repeat behavior. Takes effect at the next advance;
    /// the caching policy consults it at the next resolve.
    pub fn set_loop_mode(&self, loop_mode: LoopMode) -> Result<()> {
        self.ensure_alive()?;
        self.options.lock().loop_mode = loop_mode;
        Ok(())
    }

    /// Toggles whether filter rebuilds resume from the pre-rebuild position
    /// (see [`add_filters`](Self::add_filters)) instead of restarting the
    /// track from the top.
    pub fn set_seek_on_filter_change(&self, enabled: bool) -> Result<()> {
        self.ensure_alive()?;
        self.options.lock().seek_on_filter_change = enabled;
        Ok(())
    }

    // ========================================================================
    // Filters & seek
    // ========================================================================

    /// Merges filters into the graph, all or nothing, and rebuilds the
    /// pipeline. A malformed entry leaves the previous graph active.
    pub async fn add_filters<I, N, V>(self: &Arc<Self>, additions: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<FilterValue>,
    {
        self.ensure_alive()?;
        self.filters.lock().merge(additions)?;
        self.rebuild_with_filters().await
    }

    /// Removes filters by name and rebuilds. Names not in the graph are
    /// ignored; the rebuild happens regardless so a caller can rely on the
    /// pipeline matching the graph afterwards.
    pub async fn remove_filters<I, S>(self: &Arc<Self>, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_alive()?;
        {
            let mut filters = self.filters.lock();
            for name in names {
                filters.remove(name.as_ref());
            }
        }
        self.rebuild_with_filters().await
    }

    /// Replaces the whole graph and rebuilds. Validation is all or nothing.
    pub async fn set_filters<I, N, V>(self: &Arc<Self>, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<FilterValue>,
    {
        self.ensure_alive()?;
        let mut replacement = FilterSet::new();
        replacement.merge(entries)?;
        *self.filters.lock() = replacement;
        self.rebuild_with_filters().await
    }

    /// Clears the graph and rebuilds onto the unfiltered pipeline.
    pub async fn reset_filters(self: &Arc<Self>) -> Result<()> {
        self.ensure_alive()?;
        self.filters.lock().clear();
        self.rebuild_with_filters().await
    }

    /// Jumps the current track to an absolute offset (whole seconds).
    ///
    /// Reported elapsed time restarts at the seek target, not at zero.
    pub async fn seek(self: &Arc<Self>, position_secs: u64) -> Result<()> {
        self.ensure_alive()?;
        let Some(track) = self.current_track() else {
            return Err(SessionError::Internal(
                "seek requires an active track".to_string(),
            ));
        };
        self.rebuild_pipeline(&track, Some(position_secs)).await?;
        self.events
            .emit(SessionEventKind::SeekApplied { position_secs });
        Ok(())
    }

    async fn rebuild_with_filters(self: &Arc<Self>) -> Result<()> {
        let graph = self.filters.lock().graph();
        if let Some(track) = self.current_track() {
            let seek = if self.options.lock().seek_on_filter_change {
                // Resume from where the listener was, not from the top.
                self.elapsed().map(|e| e.as_secs())
            } else {
                None
            };
            self.rebuild_pipeline(&track, seek).await?;
        }
        self.events.emit(SessionEventKind::FiltersApplied { graph });
        Ok(())
    }

    /// Tears the current pipeline down and rebuilds it for the same track
    /// from a fresh resolve, optionally seeking.
    #[instrument(skip(self, track), fields(track_id = %track.id, ?seek_seconds))]
    async fn rebuild_pipeline(
        self: &Arc<Self>,
        track: &Track,
        seek_seconds: Option<u64>,
    ) -> Result<()> {
        // The new resource supersedes any idle deferred for the old one.
        self.pending_advance.store(false, Ordering::SeqCst);
        self.teardown_active().await;

        let resolved = self.resolver.resolve(track).await?;
        let loop_mode = self.options.lock().loop_mode;
        let stream = if resolved.from_cache {
            resolved.stream
        } else {
            self.cache_sink
                .maybe_cache(&track.locator, loop_mode, resolved.stream)
                .await
        };

        let resource = self.build_resource(track.id, stream, seek_seconds).await?;
        *self.controls.lock() = Some(resource.controls());
        self.sink.play(resource).await?;
        self.set_state(PlayerState::Playing);
        Ok(())
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Tears the session down: kills the pipeline, stops the sink, joins
    /// pending cache writes, and empties the queue. Idempotent; every call
    /// after the first is a no-op.
    pub async fn destroy(self: &Arc<Self>) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("destroying session");

        if let Some(task) = self.prefetch_task.lock().take() {
            task.abort();
        }
        self.teardown_active().await;
        *self.prefetched.lock().await = None;
        self.sink.stop().await;
        self.cache_sink.join_all().await;

        self.queue.lock().clear();
        *self.controls.lock() = None;
        self.set_state(PlayerState::Stopped);
        self.events.emit(SessionEventKind::SessionDestroyed);
    }
}

impl std::fmt::Debug for PlayerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSession")
            .field("state", &self.state())
            .field("queue_len", &self.queue_len())
            .field("destroyed", &self.destroyed.load(Ordering::SeqCst))
            .finish()
    }
}
