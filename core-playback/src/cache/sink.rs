//! # Cache Sink
//!
//! Opportunistic tee of the resolved raw stream into the cache store.
//!
//! ## Policy
//!
//! A stream is teed iff caching is enabled globally, the store has no entry
//! for the locator yet, and the session's loop mode allows the track to
//! repeat. The tee is passive: it rides along on an unbounded channel and
//! can never block or slow the primary playback stream, and a failed write
//! is logged and forgotten.
//!
//! ## Completeness
//!
//! Only streams consumed to their natural end are stored. The tee marks end
//! of stream explicitly; when a pipeline is cancelled mid-track (seek,
//! filter change, skip) the marker never arrives and the partial buffer is
//! discarded instead of poisoning the store.
//!
//! The raw resolved bytes are what gets cached, never the filtered
//! transcoder output, so a cached entry is valid input for any later filter
//! graph.

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use core_runtime::config::CacheConfig;
use core_runtime::events::{EventBus, SessionEventKind};
use session_traits::{stream, ByteStream, CacheStore, LoopMode};

enum TeeMessage {
    Chunk(Bytes),
    /// Natural end of stream; without it the buffered data is discarded.
    End,
}

/// Wraps the primary stream, mirroring every read into the writer task.
struct TeeStream {
    inner: ByteStream,
    tx: Option<mpsc::UnboundedSender<TeeMessage>>,
}

impl AsyncRead for TeeStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let me = self.get_mut();
        let before = buf.filled().len();

        match Pin::new(&mut me.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let filled = &buf.filled()[before..];
                if filled.is_empty() {
                    // EOF: signal completeness and close the channel.
                    if let Some(tx) = me.tx.take() {
                        let _ = tx.send(TeeMessage::End);
                    }
                } else if let Some(tx) = &me.tx {
                    if tx
                        .send(TeeMessage::Chunk(Bytes::copy_from_slice(filled)))
                        .is_err()
                    {
                        // Writer task is gone; stop mirroring.
                        me.tx = None;
                    }
                }
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

/// Policy gate and background writer for the caching tee.
pub struct CacheSink {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
    events: Option<EventBus>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl CacheSink {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            events: None,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Emit a `CacheStored` event when a write completes.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Applies the caching policy to a freshly resolved stream.
    ///
    /// Returns the stream to play from: the original when the policy says
    /// no, or a tee that mirrors consumed bytes into a background write.
    #[instrument(skip(self, raw_stream), fields(locator = %locator))]
    pub async fn maybe_cache(
        &self,
        locator: &str,
        loop_mode: LoopMode,
        raw_stream: ByteStream,
    ) -> ByteStream {
        if !self.config.should_cache(loop_mode) {
            debug!("caching skipped by policy");
            return raw_stream;
        }
        if self.store.has(locator).await {
            debug!("caching skipped, entry already stored");
            return raw_stream;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let key = locator.to_string();

        let task = tokio::spawn(async move {
            let mut buffer = BytesMut::new();
            let mut completed = false;
            while let Some(message) = rx.recv().await {
                match message {
                    TeeMessage::Chunk(chunk) => buffer.extend_from_slice(&chunk),
                    TeeMessage::End => {
                        completed = true;
                        break;
                    }
                }
            }

            if !completed {
                debug!(locator = %key, "tee abandoned before end of stream, discarding");
                return;
            }

            let bytes = buffer.len() as u64;
            match store.write(&key, stream::from_bytes(buffer.freeze())).await {
                Ok(()) => {
                    if let Some(events) = events {
                        events.emit(SessionEventKind::CacheStored {
                            locator: key,
                            bytes,
                        });
                    }
                }
                Err(e) => {
                    // Playback is unaffected by a failed write.
                    warn!(locator = %key, error = %e, "cache write failed");
                }
            }
        });

        let mut tasks = self.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);

        Box::new(TeeStream {
            inner: raw_stream,
            tx: Some(tx),
        })
    }

    /// Waits for every in-flight cache write to settle.
    ///
    /// Called on session teardown so an in-progress write is joined rather
    /// than leaked; it never blocks playback because playback is over.
    pub async fn join_all(&self) {
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }
    }
}

impl std::fmt::Debug for CacheSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSink")
            .field("enabled", &self.config.enabled)
            .field("pending_writes", &self.tasks.lock().len())
            .finish()
    }
}
