//! Cloud audio platform connector.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use std::time::Duration;
use tokio_util::io::StreamReader;
use tracing::{debug, instrument, warn};

use session_traits::{
    ByteStream, Result, SessionError, SourceKind, SourceProvider, Track, TrackInfo,
};

use crate::types::ResolvedTrack;

/// Retry budget for transient API failures.
const MAX_RETRIES: u32 = 3;

/// Base backoff delay, doubled per attempt.
const BACKOFF_BASE_MS: u64 = 100;

/// Cloud audio platform connector.
///
/// Implements `SourceProvider` against the platform's public API:
///
/// - `GET {api_base}/resolve?url=<permalink>&client_id=<id>` turns a track
///   permalink into metadata plus a progressive `stream_url`
/// - `GET {stream_url}?client_id=<id>` serves the audio bytes
///
/// Transient failures (429, 5xx, transport errors) retry with exponential
/// backoff before giving up with `SourceUnavailable`.
pub struct CloudAudioProvider {
    client: reqwest::Client,
    api_base: String,
    client_id: String,
}

impl CloudAudioProvider {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
        }
    }

    fn resolve_url(&self, locator: &str) -> String {
        format!(
            "{}/resolve?url={}&client_id={}",
            self.api_base,
            urlencoding::encode(locator),
            urlencoding::encode(&self.client_id)
        )
    }

    /// Appends the client id to a stream URL, respecting an existing query.
    fn stream_request_url(&self, stream_url: &str) -> String {
        let separator = if stream_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}client_id={}",
            stream_url,
            separator,
            urlencoding::encode(&self.client_id)
        )
    }

    /// `GET` with bounded exponential backoff on transient failures.
    ///
    /// Returns `Ok(None)` on 404/410 so callers can distinguish "gone" from
    /// "failing"; other client errors do not retry.
    #[instrument(skip(self, url))]
    async fn get_with_retry(&self, url: &str) -> Result<Option<reqwest::Response>> {
        let mut attempt = 0;
        loop {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(Some(response));
                    }
                    if status == reqwest::StatusCode::NOT_FOUND
                        || status == reqwest::StatusCode::GONE
                    {
                        return Ok(None);
                    }
                    if status != reqwest::StatusCode::TOO_MANY_REQUESTS
                        && !status.is_server_error()
                    {
                        return Err(SessionError::SourceUnavailable(format!(
                            "cloud API returned {}",
                            status
                        )));
                    }
                    attempt += 1;
                    if attempt >= MAX_RETRIES {
                        warn!(%status, attempt, "cloud API request exhausted retries");
                        return Err(SessionError::SourceUnavailable(format!(
                            "cloud API failed after {} attempts: {}",
                            MAX_RETRIES, status
                        )));
                    }
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_RETRIES {
                        warn!(error = %e, attempt, "cloud API request exhausted retries");
                        return Err(SessionError::SourceUnavailable(format!(
                            "cloud API failed after {} attempts: {}",
                            MAX_RETRIES, e
                        )));
                    }
                }
            }

            let backoff_ms = BACKOFF_BASE_MS * 2u64.pow(attempt);
            debug!(attempt, backoff_ms, "retrying cloud API request");
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }

    async fn resolve(&self, locator: &str) -> Result<Option<ResolvedTrack>> {
        let Some(response) = self.get_with_retry(&self.resolve_url(locator)).await? else {
            return Ok(None);
        };
        let resolved: ResolvedTrack = response.json().await.map_err(|e| {
            SessionError::SourceUnavailable(format!("malformed resolve response: {}", e))
        })?;
        Ok(Some(resolved))
    }
}

#[async_trait]
impl SourceProvider for CloudAudioProvider {
    fn kind(&self) -> SourceKind {
        SourceKind::Cloud
    }

    #[instrument(skip(self, locator))]
    async fn fetch_info(&self, locator: &str) -> Result<Option<TrackInfo>> {
        let Some(resolved) = self.resolve(locator).await? else {
            return Ok(None);
        };

        let mut info = TrackInfo::new(resolved.title);
        if let Some(user) = resolved.user {
            info = info.with_artist(user.username);
        }
        if let Some(ms) = resolved.duration {
            info = info.with_duration(Duration::from_millis(ms));
        }
        if let Some(url) = resolved.artwork_url {
            info = info.with_artwork_url(url);
        }
        Ok(Some(info))
    }

    #[instrument(skip(self, track), fields(track_id = %track.id))]
    async fn open_stream(&self, track: &Track) -> Result<ByteStream> {
        let resolved = self.resolve(&track.locator).await?.ok_or_else(|| {
            SessionError::SourceUnavailable(format!("track gone: {}", track.locator))
        })?;

        let stream_url = resolved
            .stream_url
            .filter(|_| resolved.streamable)
            .ok_or_else(|| {
                SessionError::SourceUnavailable(format!(
                    "track is not streamable: {}",
                    track.locator
                ))
            })?;

        let response = self
            .get_with_retry(&self.stream_request_url(&stream_url))
            .await?
            .ok_or_else(|| {
                SessionError::SourceUnavailable(format!("stream gone: {}", track.locator))
            })?;

        let body = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        Ok(Box::new(StreamReader::new(body)))
    }
}

impl std::fmt::Debug for CloudAudioProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // client_id is a credential; keep it out of logs.
        f.debug_struct("CloudAudioProvider")
            .field("api_base", &self.api_base)
            .finish()
    }
}
