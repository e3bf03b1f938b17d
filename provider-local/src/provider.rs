//! Filesystem-backed source provider.

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

use session_traits::{
    ByteStream, Result, SessionError, SourceKind, SourceProvider, Track, TrackInfo,
};

/// Serves tracks from the local filesystem.
///
/// The locator is a path to a regular file. Metadata is what the
/// filesystem knows: the title falls back to the file stem, duration stays
/// unknown until the transcoder sees the bytes.
#[derive(Debug, Default, Clone)]
pub struct LocalFileProvider;

impl LocalFileProvider {
    pub fn new() -> Self {
        Self
    }

    fn title_for(path: &Path) -> String {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl SourceProvider for LocalFileProvider {
    fn kind(&self) -> SourceKind {
        SourceKind::LocalFile
    }

    #[instrument(skip(self))]
    async fn fetch_info(&self, locator: &str) -> Result<Option<TrackInfo>> {
        let path = Path::new(locator);
        match fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => {
                debug!(size = metadata.len(), "local file found");
                Ok(Some(TrackInfo::new(Self::title_for(path))))
            }
            Ok(_) => {
                // Directories and special files are not playable.
                debug!("locator exists but is not a regular file");
                Ok(None)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::SourceUnavailable(format!(
                "cannot stat {}: {}",
                locator, e
            ))),
        }
    }

    #[instrument(skip(self, track), fields(track_id = %track.id))]
    async fn open_stream(&self, track: &Track) -> Result<ByteStream> {
        let file = fs::File::open(&track.locator).await.map_err(|e| {
            SessionError::SourceUnavailable(format!("cannot open {}: {}", track.locator, e))
        })?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_traits::stream;
    use std::path::PathBuf;

    fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("segue-local-{}-{}", uuid::Uuid::new_v4(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn track_for(path: &Path) -> Track {
        Track::new(
            SourceKind::LocalFile,
            path.to_string_lossy().into_owned(),
            "tester",
            TrackInfo::new("t"),
        )
    }

    #[tokio::test]
    async fn test_info_uses_file_stem_as_title() {
        let path = scratch_file("morning song.flac", b"data");
        let provider = LocalFileProvider::new();

        let info = provider
            .fetch_info(&path.to_string_lossy())
            .await
            .unwrap()
            .unwrap();
        assert!(info.title.ends_with("morning song"));

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_none_not_error() {
        let provider = LocalFileProvider::new();
        let info = provider
            .fetch_info("/definitely/not/here.flac")
            .await
            .unwrap();
        assert!(info.is_none());
    }

    #[tokio::test]
    async fn test_directory_is_not_playable() {
        let provider = LocalFileProvider::new();
        let dir = std::env::temp_dir();
        let info = provider.fetch_info(&dir.to_string_lossy()).await.unwrap();
        assert!(info.is_none());
    }

    #[tokio::test]
    async fn test_open_stream_reads_file_contents() {
        let path = scratch_file("a.flac", b"flac bytes");
        let provider = LocalFileProvider::new();

        let opened = provider.open_stream(&track_for(&path)).await.unwrap();
        let data = stream::collect(opened).await.unwrap();
        assert_eq!(data.as_ref(), b"flac bytes");

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_open_missing_file_is_source_unavailable() {
        let provider = LocalFileProvider::new();
        let track = Track::new(
            SourceKind::LocalFile,
            "/definitely/not/here.flac",
            "tester",
            TrackInfo::new("t"),
        );

        let err = provider.open_stream(&track).await.map(|_| ()).unwrap_err();
        assert!(matches!(err, SessionError::SourceUnavailable(_)));
        assert!(err.is_track_recoverable());
    }
}
