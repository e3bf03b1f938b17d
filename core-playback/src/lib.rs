//! # Core Playback
//!
//! The transcode/cache half of the session pipeline:
//!
//! - [`transcoder`] — spawns the external transcoding process, pumps the
//!   raw stream in, reads framed PCM out, and kills the process on
//!   cancellation
//! - [`encoder`] — cuts the PCM stream into fixed 960-sample (20 ms)
//!   frames and applies volume scaling
//! - [`resource`] — the playable wrapper with elapsed/volume controls
//! - [`traits`] — the [`PlaybackSink`](traits::PlaybackSink) seam
//! - [`cache`] — the bounded in-memory store and the passive caching tee
//!
//! `core-session` orchestrates these pieces; nothing in this crate knows
//! about queues or playback state.

pub mod cache;
pub mod encoder;
pub mod resource;
pub mod traits;
pub mod transcoder;

pub use cache::{CacheSink, MemoryCacheStore};
pub use encoder::{FrameEncoder, FRAME_BYTES, FRAME_DURATION, FRAME_SAMPLES};
pub use resource::{PlayableResource, ResourceControls};
pub use traits::PlaybackSink;
pub use transcoder::{ActiveTranscode, Transcoder};
