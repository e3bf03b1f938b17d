//! Byte stream seam shared by providers, the cache store, and the pipeline.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

/// The raw audio byte stream flowing through the pipeline.
///
/// Providers, the cache store, and the transcoder all speak this type, so a
/// cached entry is indistinguishable from a freshly fetched one.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Wraps an in-memory buffer as a [`ByteStream`].
pub fn from_bytes(data: Bytes) -> ByteStream {
    Box::new(std::io::Cursor::new(data))
}

/// A stream that yields no bytes.
pub fn empty() -> ByteStream {
    from_bytes(Bytes::new())
}

/// Drains a stream to completion into one buffer.
///
/// Used by the cache store when persisting an entry; handy in tests.
pub async fn collect(mut stream: ByteStream) -> std::io::Result<Bytes> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_from_bytes() {
        let stream = from_bytes(Bytes::from_static(b"pcm data"));
        let collected = collect(stream).await.unwrap();
        assert_eq!(collected.as_ref(), b"pcm data");
    }

    #[tokio::test]
    async fn test_empty_stream_yields_nothing() {
        let collected = collect(empty()).await.unwrap();
        assert!(collected.is_empty());
    }
}
