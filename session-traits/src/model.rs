//! # Session Data Model
//!
//! Core value types shared across the pipeline: track descriptors, provider
//! metadata, and playback modes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Where a track's audio bytes come from.
///
/// Provider dispatch is keyed on this enum; there is exactly one registered
/// provider per kind (see [`crate::provider::ProviderRegistry`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Cloud audio platform (metadata + progressive stream via its API).
    Cloud,
    /// File on the local filesystem.
    LocalFile,
    /// Direct URL to an uploaded attachment.
    Attachment,
    /// Video platform (audio extracted from a pre-resolved format table).
    VideoPlatform,
}

impl SourceKind {
    /// Human-readable name, stable across releases.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Cloud => "cloud",
            SourceKind::LocalFile => "local-file",
            SourceKind::Attachment => "attachment",
            SourceKind::VideoPlatform => "video-platform",
        }
    }

    /// Returns `true` if resolving this kind performs network I/O.
    pub fn is_remote(&self) -> bool {
        !matches!(self, SourceKind::LocalFile)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue repeat behavior. Drives both the advance transition and the
/// caching policy (a track that never repeats is not worth caching).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopMode {
    /// No repetition: a finished track leaves the queue.
    None,
    /// Repeat the current track indefinitely.
    Track,
    /// Rotate finished tracks to the back of the queue.
    Queue,
}

impl LoopMode {
    /// Returns `true` if tracks may be played more than once in this mode.
    pub fn repeats(&self) -> bool {
        !matches!(self, LoopMode::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoopMode::None => "none",
            LoopMode::Track => "track",
            LoopMode::Queue => "queue",
        }
    }
}

/// Provider-reported metadata for a track.
///
/// Built by [`crate::provider::SourceProvider::fetch_info`] at enqueue time.
/// A provider returning `None` means "not found" and the item is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Display title.
    pub title: String,
    /// Performing artist or uploader, when the provider reports one.
    pub artist: Option<String>,
    /// Total duration, when known ahead of playback.
    pub duration: Option<Duration>,
    /// Cover/thumbnail URL, when available.
    pub artwork_url: Option<String>,
}

impl TrackInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: None,
            duration: None,
            artwork_url: None,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_artwork_url(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }
}

/// Immutable descriptor of one queue entry.
///
/// Created when enqueued, never mutated, dropped when dequeued. The
/// `locator` doubles as the cache key, so it must be the canonical form of
/// the source address (resolved URL, absolute path, attachment URL).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique per enqueue operation (two enqueues of the same locator get
    /// distinct ids).
    pub id: Uuid,
    /// Which provider resolves this track.
    pub source: SourceKind,
    /// Provider-specific address; also the cache key.
    pub locator: String,
    /// Who asked for it.
    pub requested_by: String,
    /// Metadata fetched at enqueue time.
    pub info: TrackInfo,
    /// Opaque provider payload (e.g., a pre-resolved format table for the
    /// video platform). Never interpreted outside the owning provider.
    pub raw_info: Option<serde_json::Value>,
    /// When the track entered the queue.
    pub enqueued_at: DateTime<Utc>,
}

impl Track {
    pub fn new(
        source: SourceKind,
        locator: impl Into<String>,
        requested_by: impl Into<String>,
        info: TrackInfo,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            locator: locator.into(),
            requested_by: requested_by.into(),
            info,
            raw_info: None,
            enqueued_at: Utc::now(),
        }
    }

    pub fn with_raw_info(mut self, raw_info: serde_json::Value) -> Self {
        self.raw_info = Some(raw_info);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_names() {
        assert_eq!(SourceKind::Cloud.as_str(), "cloud");
        assert_eq!(SourceKind::LocalFile.as_str(), "local-file");
        assert_eq!(SourceKind::Attachment.as_str(), "attachment");
        assert_eq!(SourceKind::VideoPlatform.as_str(), "video-platform");
    }

    #[test]
    fn test_source_kind_remote() {
        assert!(SourceKind::Cloud.is_remote());
        assert!(SourceKind::Attachment.is_remote());
        assert!(SourceKind::VideoPlatform.is_remote());
        assert!(!SourceKind::LocalFile.is_remote());
    }

    #[test]
    fn test_loop_mode_repeats() {
        assert!(!LoopMode::None.repeats());
        assert!(LoopMode::Track.repeats());
        assert!(LoopMode::Queue.repeats());
    }

    #[test]
    fn test_track_info_builder() {
        let info = TrackInfo::new("Song")
            .with_artist("Band")
            .with_duration(Duration::from_secs(213))
            .with_artwork_url("https://img.example/cover.jpg");

        assert_eq!(info.title, "Song");
        assert_eq!(info.artist.as_deref(), Some("Band"));
        assert_eq!(info.duration, Some(Duration::from_secs(213)));
        assert_eq!(info.artwork_url.as_deref(), Some("https://img.example/cover.jpg"));
    }

    #[test]
    fn test_track_ids_are_unique() {
        let info = TrackInfo::new("Song");
        let a = Track::new(SourceKind::Cloud, "https://a.example/x", "user", info.clone());
        let b = Track::new(SourceKind::Cloud, "https://a.example/x", "user", info);
        assert_ne!(a.id, b.id);
        assert_eq!(a.locator, b.locator);
    }

    #[test]
    fn test_track_raw_info_attachment() {
        let track = Track::new(
            SourceKind::VideoPlatform,
            "https://video.example/watch?v=abc",
            "user",
            TrackInfo::new("Clip"),
        )
        .with_raw_info(serde_json::json!({ "formats": [] }));

        assert!(track.raw_info.is_some());
    }

    #[test]
    fn test_source_kind_serde_kebab_case() {
        let json = serde_json::to_string(&SourceKind::VideoPlatform).unwrap();
        assert_eq!(json, "\"video-platform\"");

        let parsed: SourceKind = serde_json::from_str("\"local-file\"").unwrap();
        assert_eq!(parsed, SourceKind::LocalFile);
    }
}
