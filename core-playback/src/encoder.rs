//! # Frame Encoder
//!
//! Re-frames the transcoder's raw PCM output into fixed-size playback
//! frames: 960 samples per channel at 48 kHz stereo s16le, i.e. 3840 bytes
//! and 20 ms of audio per frame.
//!
//! The encoder is a plain accumulator — bytes in, complete frames out — so
//! it can sit inside the transcoder's stdout reader task without owning any
//! I/O itself. A trailing partial frame is zero-padded on flush so the sink
//! always sees whole frames.

use bytes::{Bytes, BytesMut};
use std::time::Duration;

/// Samples per channel in one playback frame.
pub const FRAME_SAMPLES: usize = 960;

/// Output sample rate.
pub const SAMPLE_RATE_HZ: usize = 48_000;

/// Output channel count.
pub const CHANNEL_COUNT: usize = 2;

/// Bytes per sample (s16le).
pub const BYTES_PER_SAMPLE: usize = 2;

/// Size of one complete frame in bytes (960 × 2 ch × 2 B = 3840).
pub const FRAME_BYTES: usize = FRAME_SAMPLES * CHANNEL_COUNT * BYTES_PER_SAMPLE;

/// Wall-clock duration of one frame (960 / 48000 = 20 ms).
pub const FRAME_DURATION: Duration = Duration::from_millis(20);

/// Accumulates PCM bytes and cuts them into fixed-size frames.
#[derive(Debug, Default)]
pub struct FrameEncoder {
    pending: BytesMut,
}

impl FrameEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of PCM bytes; returns every complete frame now
    /// available, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::with_capacity(self.pending.len() / FRAME_BYTES);
        while self.pending.len() >= FRAME_BYTES {
            frames.push(self.pending.split_to(FRAME_BYTES).freeze());
        }
        frames
    }

    /// Flushes the trailing partial frame, zero-padded to full size.
    ///
    /// Returns `None` if the stream ended exactly on a frame boundary.
    pub fn flush(&mut self) -> Option<Bytes> {
        if self.pending.is_empty() {
            return None;
        }
        self.pending.resize(FRAME_BYTES, 0);
        Some(self.pending.split().freeze())
    }

    /// Bytes buffered but not yet emitted as a frame.
    pub fn pending_bytes(&self) -> usize {
        self.pending.len()
    }
}

/// Scales a PCM frame in place by a volume percentage.
///
/// 100 is unity gain and short-circuits; other values scale each s16le
/// sample with i32 arithmetic and saturate at the i16 bounds.
pub fn apply_volume(frame: &mut [u8], percent: u8) {
    if percent == 100 {
        return;
    }

    for sample in frame.chunks_exact_mut(BYTES_PER_SAMPLE) {
        let value = i16::from_le_bytes([sample[0], sample[1]]) as i32;
        let scaled = (value * percent as i32) / 100;
        let clamped = scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        sample.copy_from_slice(&clamped.to_le_bytes());
    }
}
