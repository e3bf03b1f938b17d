//! # Playable Resource
//!
//! The live handle over a decoded/encoded audio byte stream, with elapsed
//! accounting and a volume control.
//!
//! A resource comes in two shapes:
//!
//! - **Framed** — fed by the transcode pipeline: fixed 20 ms PCM frames on a
//!   channel. Volume is applied per frame at consumption time and elapsed
//!   time self-advances one frame duration per consumed frame.
//! - **Raw** — the resolver's byte stream wrapped directly when no filters
//!   are active and no seek is pending. The bytes are still in the source's
//!   container format, so volume is recorded on the shared controls for the
//!   sink to honor and elapsed runs on wall-clock time from activation
//!   (there is no frame clock to count).
//!
//! At most one resource is current per session. The session hands the
//! resource itself to the playback sink but keeps the [`ResourceControls`]
//! handle, so volume changes and elapsed queries keep working after the
//! hand-off.

use bytes::{Bytes, BytesMut};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use session_traits::ByteStream;

use crate::encoder::{apply_volume, FRAME_DURATION};

/// Read size for the raw (untranscoded) consumption path.
const RAW_CHUNK_BYTES: usize = 16 * 1024;

/// Shared volume/elapsed state for one resource.
///
/// The session retains a clone of this handle after moving the resource into
/// the sink; both sides see the same values.
#[derive(Debug)]
pub struct ResourceControls {
    volume_percent: AtomicU8,
    frames_consumed: AtomicU64,
    elapsed_override: Duration,
    started_at: Instant,
    framed: bool,
}

impl ResourceControls {
    fn new(volume_percent: u8, elapsed_override: Duration, framed: bool) -> Self {
        Self {
            volume_percent: AtomicU8::new(volume_percent),
            frames_consumed: AtomicU64::new(0),
            elapsed_override,
            started_at: Instant::now(),
            framed,
        }
    }

    /// Current volume in percent.
    pub fn volume(&self) -> u8 {
        self.volume_percent.load(Ordering::Relaxed)
    }

    /// Updates the volume; takes effect from the next consumed frame.
    pub fn set_volume(&self, percent: u8) {
        self.volume_percent.store(percent, Ordering::Relaxed);
    }

    /// Reported playback position.
    ///
    /// Framed resources report the seek override plus consumed frames. Raw
    /// resources have no frame clock, so they report the override plus
    /// wall-clock time since creation. After a seek to T the byte position
    /// restarts at zero but this starts at T, so time-based UI stays
    /// consistent.
    pub fn elapsed(&self) -> Duration {
        if self.framed {
            self.elapsed_override
                + FRAME_DURATION * self.frames_consumed.load(Ordering::Relaxed) as u32
        } else {
            self.elapsed_override + self.started_at.elapsed()
        }
    }

    fn advance_frame(&self) {
        self.frames_consumed.fetch_add(1, Ordering::Relaxed);
    }
}

enum ResourceBody {
    Raw(ByteStream),
    Framed(mpsc::Receiver<Bytes>),
}

/// The playable wrapper around an audio byte stream.
pub struct PlayableResource {
    track_id: Uuid,
    body: ResourceBody,
    controls: Arc<ResourceControls>,
}

impl PlayableResource {
    /// Wraps a raw resolved stream without transcoding.
    pub fn from_raw(track_id: Uuid, stream: ByteStream, volume_percent: u8) -> Self {
        Self {
            track_id,
            body: ResourceBody::Raw(stream),
            controls: Arc::new(ResourceControls::new(volume_percent, Duration::ZERO, false)),
        }
    }

    /// Wraps the transcode pipeline's frame channel.
    pub fn from_frames(track_id: Uuid, frames: mpsc::Receiver<Bytes>, volume_percent: u8) -> Self {
        Self {
            track_id,
            body: ResourceBody::Framed(frames),
            controls: Arc::new(ResourceControls::new(volume_percent, Duration::ZERO, true)),
        }
    }

    /// Initializes reported elapsed time to `elapsed` instead of zero (the
    /// seek case).
    pub fn with_elapsed_override(mut self, elapsed: Duration) -> Self {
        let framed = matches!(self.body, ResourceBody::Framed(_));
        self.controls = Arc::new(ResourceControls::new(self.controls.volume(), elapsed, framed));
        self
    }

    /// Id of the track this resource plays.
    pub fn track_id(&self) -> Uuid {
        self.track_id
    }

    /// Shared volume/elapsed handle.
    pub fn controls(&self) -> Arc<ResourceControls> {
        Arc::clone(&self.controls)
    }

    /// Reported playback position.
    pub fn elapsed(&self) -> Duration {
        self.controls.elapsed()
    }

    /// `true` when this resource carries fixed-size PCM frames.
    pub fn is_framed(&self) -> bool {
        matches!(self.body, ResourceBody::Framed(_))
    }

    /// Pulls the next chunk of playable bytes.
    ///
    /// Framed path: one 20 ms frame with the current volume applied;
    /// elapsed accounting advances. Raw path: an opaque chunk of the source
    /// container, passed through untouched. `None` is end of stream.
    pub async fn next_chunk(&mut self) -> std::io::Result<Option<Bytes>> {
        match &mut self.body {
            ResourceBody::Framed(frames) => match frames.recv().await {
                Some(frame) => {
                    let volume = self.controls.volume();
                    let frame = if volume == 100 {
                        frame
                    } else {
                        let mut scaled = BytesMut::from(&frame[..]);
                        apply_volume(&mut scaled, volume);
                        scaled.freeze()
                    };
                    self.controls.advance_frame();
                    Ok(Some(frame))
                }
                None => Ok(None),
            },
            ResourceBody::Raw(stream) => {
                let mut buf = BytesMut::zeroed(RAW_CHUNK_BYTES);
                let n = stream.read(&mut buf).await?;
                if n == 0 {
                    return Ok(None);
                }
                buf.truncate(n);
                Ok(Some(buf.freeze()))
            }
        }
    }
}

impl std::fmt::Debug for PlayableResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayableResource")
            .field("track_id", &self.track_id)
            .field("framed", &self.is_framed())
            .field("elapsed", &self.elapsed())
            .finish()
    }
}
