//! API response models for the cloud audio platform.

use serde::Deserialize;

/// The platform's `/resolve` response for a track permalink.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedTrack {
    /// Display title.
    pub title: String,

    /// Track length in milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,

    /// Uploader, when the platform reports one.
    #[serde(default)]
    pub user: Option<TrackUser>,

    /// Cover image URL.
    #[serde(default)]
    pub artwork_url: Option<String>,

    /// Progressive stream URL; absent for tracks the platform refuses to
    /// stream (region locks, removed uploads).
    #[serde(default)]
    pub stream_url: Option<String>,

    /// Platform-side streamability flag.
    #[serde(default = "default_streamable")]
    pub streamable: bool,
}

fn default_streamable() -> bool {
    true
}

/// Uploader reference embedded in a resolved track.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackUser {
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_response() {
        let json = r#"{
            "title": "Night Drive",
            "duration": 213000,
            "user": { "username": "synthlord" },
            "artwork_url": "https://img.cloud.example/cover.jpg",
            "stream_url": "https://stream.cloud.example/t/123",
            "streamable": true
        }"#;

        let track: ResolvedTrack = serde_json::from_str(json).unwrap();
        assert_eq!(track.title, "Night Drive");
        assert_eq!(track.duration, Some(213_000));
        assert_eq!(track.user.unwrap().username, "synthlord");
        assert!(track.streamable);
    }

    #[test]
    fn test_parse_minimal_response() {
        let track: ResolvedTrack = serde_json::from_str(r#"{ "title": "Untitled" }"#).unwrap();
        assert_eq!(track.title, "Untitled");
        assert!(track.duration.is_none());
        assert!(track.user.is_none());
        assert!(track.stream_url.is_none());
        // Absent flag defaults to streamable; the missing stream_url is what
        // actually blocks playback.
        assert!(track.streamable);
    }
}
