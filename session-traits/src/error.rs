//! # Session Error Types
//!
//! Shared error taxonomy for the playback-session pipeline.

use thiserror::Error;

/// Errors that can occur while resolving, transcoding, or caching a track.
#[derive(Error, Debug)]
pub enum SessionError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The provider (or cache) could not produce data for the locator:
    /// network failure, missing file, deleted attachment, unplayable format.
    /// Recoverable: the caller logs, skips the track, and advances the queue.
    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(String),

    /// The track references a source kind with no registered provider.
    /// Rejected at enqueue time, before the track enters the queue.
    #[error("Unsupported track type: {0}")]
    UnsupportedTrackType(String),

    // ========================================================================
    // Transcode Errors
    // ========================================================================
    /// The external transcoding process failed to spawn, exited abnormally,
    /// or a pipe broke mid-stream. After the first frame this is treated as
    /// natural stream end; before it, resource construction has failed.
    #[error("Transcode failure: {0}")]
    TranscodeFailure(String),

    // ========================================================================
    // Filter Errors
    // ========================================================================
    /// A filter name or parameter is malformed. Surfaced synchronously at
    /// filter-apply time; the previous filter set stays active.
    #[error("Invalid filter configuration: {0}")]
    InvalidFilterConfiguration(String),

    // ========================================================================
    // Cache Errors
    // ========================================================================
    /// A cache store operation failed. Never affects playback; logged only.
    #[error("Cache error: {0}")]
    Cache(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid session configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Returns `true` if the session recovers by skipping the affected track
    /// and advancing the queue, rather than surfacing the error to a caller.
    pub fn is_track_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::SourceUnavailable(_)
                | SessionError::TranscodeFailure(_)
                | SessionError::Cache(_)
        )
    }

    /// Returns `true` if the error reflects invalid caller input and is
    /// surfaced synchronously without touching pipeline state.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidFilterConfiguration(_)
                | SessionError::UnsupportedTrackType(_)
                | SessionError::Config(_)
        )
    }
}

/// Result type for session pipeline operations.
pub type Result<T> = std::result::Result<T, SessionError>;
