//! Direct-URL source provider.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::{debug, instrument, warn};

use session_traits::{
    ByteStream, Result, SessionError, SourceKind, SourceProvider, Track, TrackInfo,
};

/// Streams uploaded attachments by URL.
///
/// Attachments are one-shot uploads: there is no metadata API, so the
/// title is derived from the URL's final path segment and a `HEAD` request
/// only confirms the upload still exists.
#[derive(Debug, Clone)]
pub struct AttachmentProvider {
    client: reqwest::Client,
}

impl Default for AttachmentProvider {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl AttachmentProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The last path segment of the URL, query and fragment stripped.
    fn title_from_url(url: &str) -> String {
        let trimmed = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .trim_end_matches('/');
        trimmed
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or("attachment")
            .to_string()
    }
}

#[async_trait]
impl SourceProvider for AttachmentProvider {
    fn kind(&self) -> SourceKind {
        SourceKind::Attachment
    }

    #[instrument(skip(self, locator))]
    async fn fetch_info(&self, locator: &str) -> Result<Option<TrackInfo>> {
        let response = self
            .client
            .head(locator)
            .send()
            .await
            .map_err(|e| SessionError::SourceUnavailable(format!("attachment probe: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            debug!(%status, "attachment no longer exists");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SessionError::SourceUnavailable(format!(
                "attachment probe returned {}",
                status
            )));
        }

        Ok(Some(TrackInfo::new(Self::title_from_url(locator))))
    }

    #[instrument(skip(self, track), fields(track_id = %track.id))]
    async fn open_stream(&self, track: &Track) -> Result<ByteStream> {
        let response = self
            .client
            .get(&track.locator)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "attachment download failed");
                SessionError::SourceUnavailable(format!("attachment download: {}", e))
            })?;

        let body = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        Ok(Box::new(StreamReader::new(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_the_last_path_segment() {
        assert_eq!(
            AttachmentProvider::title_from_url("https://cdn.example/uploads/abc/track.ogg"),
            "track.ogg"
        );
    }

    #[test]
    fn test_title_strips_query_and_fragment() {
        assert_eq!(
            AttachmentProvider::title_from_url(
                "https://cdn.example/uploads/track.ogg?ex=123&sig=tok#frag"
            ),
            "track.ogg"
        );
    }

    #[test]
    fn test_title_falls_back_for_bare_host() {
        assert_eq!(
            AttachmentProvider::title_from_url("https://cdn.example/"),
            "cdn.example"
        );
        assert_eq!(AttachmentProvider::title_from_url(""), "attachment");
    }

    #[test]
    fn test_kind() {
        assert_eq!(AttachmentProvider::default().kind(), SourceKind::Attachment);
    }
}
