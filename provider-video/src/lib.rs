//! # Video Platform Provider
//!
//! Resolves `video-platform` tracks. The caller pre-extracts the video's
//! format table (via its downloader tooling) and attaches it to the track
//! as `raw_info`; this provider picks the best audio-only format from that
//! table and streams it. Metadata comes from the platform's oEmbed
//! endpoint.

mod formats;
mod provider;

pub use formats::{select_audio_format, FormatTable, MediaFormat};
pub use provider::VideoPlatformProvider;
