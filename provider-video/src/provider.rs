//! Video platform connector.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use serde::Deserialize;
use tokio_util::io::StreamReader;
use tracing::{debug, instrument, warn};

use session_traits::{
    ByteStream, Result, SessionError, SourceKind, SourceProvider, Track, TrackInfo,
};

use crate::formats::{select_audio_format, FormatTable};

/// oEmbed metadata response.
#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: String,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

/// Video platform connector.
///
/// Metadata comes from the platform's oEmbed endpoint
/// (`GET {oembed_base}?url=<watch-url>&format=json`). The audio itself is
/// never resolved here: the caller attaches the pre-extracted format table
/// as `raw_info`, and `open_stream` picks the best audio format from it.
pub struct VideoPlatformProvider {
    client: reqwest::Client,
    oembed_base: String,
}

impl VideoPlatformProvider {
    pub fn new(client: reqwest::Client, oembed_base: impl Into<String>) -> Self {
        Self {
            client,
            oembed_base: oembed_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn oembed_url(&self, locator: &str) -> String {
        format!(
            "{}?url={}&format=json",
            self.oembed_base,
            urlencoding::encode(locator)
        )
    }
}

#[async_trait]
impl SourceProvider for VideoPlatformProvider {
    fn kind(&self) -> SourceKind {
        SourceKind::VideoPlatform
    }

    #[instrument(skip(self, locator))]
    async fn fetch_info(&self, locator: &str) -> Result<Option<TrackInfo>> {
        let response = self
            .client
            .get(self.oembed_url(locator))
            .send()
            .await
            .map_err(|e| SessionError::SourceUnavailable(format!("oembed request: {}", e)))?;

        let status = response.status();
        // The platform answers 404, 401, or 403 for deleted and private
        // videos; none of them is playable, so all map to "not found".
        if status == reqwest::StatusCode::NOT_FOUND
            || status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            debug!(%status, "video not available");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SessionError::SourceUnavailable(format!(
                "oembed returned {}",
                status
            )));
        }

        let oembed: OembedResponse = response.json().await.map_err(|e| {
            SessionError::SourceUnavailable(format!("malformed oembed response: {}", e))
        })?;

        let mut info = TrackInfo::new(oembed.title);
        if let Some(author) = oembed.author_name {
            info = info.with_artist(author);
        }
        if let Some(thumbnail) = oembed.thumbnail_url {
            info = info.with_artwork_url(thumbnail);
        }
        Ok(Some(info))
    }

    #[instrument(skip(self, track), fields(track_id = %track.id))]
    async fn open_stream(&self, track: &Track) -> Result<ByteStream> {
        let raw_info = track.raw_info.as_ref().ok_or_else(|| {
            SessionError::SourceUnavailable(format!(
                "no format table attached for {}",
                track.locator
            ))
        })?;
        let table: FormatTable = serde_json::from_value(raw_info.clone()).map_err(|e| {
            SessionError::SourceUnavailable(format!("malformed format table: {}", e))
        })?;

        let format = select_audio_format(&table).ok_or_else(|| {
            SessionError::SourceUnavailable(format!(
                "no audio format available for {}",
                track.locator
            ))
        })?;
        debug!(abr = ?format.abr, "selected audio format");

        let response = self
            .client
            .get(&format.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "format download failed");
                SessionError::SourceUnavailable(format!("format download: {}", e))
            })?;

        let body = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        Ok(Box::new(StreamReader::new(body)))
    }
}

impl std::fmt::Debug for VideoPlatformProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoPlatformProvider")
            .field("oembed_base", &self.oembed_base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> VideoPlatformProvider {
        VideoPlatformProvider::new(reqwest::Client::new(), "https://video.example/oembed/")
    }

    fn video_track(raw_info: Option<serde_json::Value>) -> Track {
        let mut track = Track::new(
            SourceKind::VideoPlatform,
            "https://video.example/watch?v=abc",
            "tester",
            TrackInfo::new("Clip"),
        );
        track.raw_info = raw_info;
        track
    }

    #[test]
    fn test_oembed_url_encodes_the_watch_url() {
        let url = provider().oembed_url("https://video.example/watch?v=abc");
        assert_eq!(
            url,
            "https://video.example/oembed?url=https%3A%2F%2Fvideo.example%2Fwatch%3Fv%3Dabc&format=json"
        );
    }

    #[test]
    fn test_oembed_parse() {
        let json = r#"{
            "title": "Live Set",
            "author_name": "someone",
            "thumbnail_url": "https://img.video.example/t.jpg",
            "width": 640
        }"#;
        let parsed: OembedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.title, "Live Set");
        assert_eq!(parsed.author_name.as_deref(), Some("someone"));
    }

    #[tokio::test]
    async fn test_open_without_format_table_fails_recoverably() {
        let err = provider()
            .open_stream(&video_track(None))
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, SessionError::SourceUnavailable(_)));
        assert!(err.is_track_recoverable());
    }

    #[tokio::test]
    async fn test_open_with_audioless_table_fails_recoverably() {
        let raw = serde_json::json!({
            "formats": [
                { "url": "https://v.example/x", "acodec": "none", "vcodec": "vp9" }
            ]
        });
        let err = provider()
            .open_stream(&video_track(Some(raw)))
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, SessionError::SourceUnavailable(_)));
    }
}
