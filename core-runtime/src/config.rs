//! # Session Configuration
//!
//! Configuration types for the playback-session engine.
//!
//! ## Overview
//!
//! [`SessionConfig`] is the process-level configuration handed to a session at
//! construction: cache policy, transcoder settings, and pipeline defaults.
//! [`PlayerOptions`] is the mutable per-session state the user toggles at
//! runtime (pause, loop mode, volume, seek-on-filter-change). Both are plain
//! structs passed by reference to each pipeline stage; there are no
//! process-wide singletons.
//!
//! All fields carry serde defaults so a partial JSON/TOML document
//! deserializes into a working configuration.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::SessionConfig;
//!
//! let config = SessionConfig::default();
//! config.validate().expect("default config is valid");
//! assert!(config.cache.enabled);
//! assert_eq!(config.transcoder.binary, "ffmpeg");
//! ```

use serde::{Deserialize, Serialize};
use session_traits::{LoopMode, Result, SessionError};

/// Process-level configuration for a playback session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Caching policy and store bounds.
    #[serde(default)]
    pub cache: CacheConfig,

    /// External transcoder process settings.
    #[serde(default)]
    pub transcoder: TranscoderConfig,

    /// Volume (percent) applied to the first resource of a fresh session.
    ///
    /// Default: 100.
    #[serde(default = "default_volume")]
    pub default_volume: u8,

    /// Whether the session pre-resolves the next queue entry while the
    /// current track is playing.
    ///
    /// Default: true.
    #[serde(default = "default_prefetch")]
    pub prefetch: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            transcoder: TranscoderConfig::default(),
            default_volume: default_volume(),
            prefetch: default_prefetch(),
        }
    }
}

impl SessionConfig {
    /// Configuration with caching and prefetch disabled.
    ///
    /// Every track is resolved from its provider on demand. Useful in tests
    /// and in deployments where the stream sources are already local.
    pub fn minimal() -> Self {
        Self {
            cache: CacheConfig {
                enabled: false,
                ..CacheConfig::default()
            },
            prefetch: false,
            ..Self::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.default_volume > MAX_VOLUME_PERCENT {
            return Err(SessionError::Config(format!(
                "default_volume must be <= {}, got {}",
                MAX_VOLUME_PERCENT, self.default_volume
            )));
        }
        self.cache.validate()?;
        self.transcoder.validate()?;
        Ok(())
    }
}

/// Upper bound for volume settings (percent). 100 is unity gain; values
/// above amplify.
pub const MAX_VOLUME_PERCENT: u8 = 200;

// ============================================================================
// Cache Configuration
// ============================================================================

/// Caching policy for resolved streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Global write switch. When false, resolved streams are never stored.
    /// Reads are not gated: a pre-warmed store still serves hits.
    ///
    /// Default: true.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Maximum number of completed entries the in-memory store retains
    /// before evicting the least recently used one.
    ///
    /// Default: 64.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(SessionError::Config(
                "cache.max_entries must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns `true` if a stream playing under `loop_mode` should be teed
    /// into the store. Tracks that can never repeat are not worth storing.
    pub fn should_cache(&self, loop_mode: LoopMode) -> bool {
        self.enabled && loop_mode.repeats()
    }
}

// ============================================================================
// Transcoder Configuration
// ============================================================================

/// Settings for the external transcoding process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Executable to spawn. Resolved through `PATH` unless absolute.
    ///
    /// Default: `ffmpeg`.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Capacity (in frames) of the channel between the frame encoder and the
    /// playable resource. Bounds how far transcoding runs ahead of playback.
    ///
    /// Default: 256 frames (~5s of audio).
    #[serde(default = "default_frame_channel_capacity")]
    pub frame_channel_capacity: usize,

    /// Read size (bytes) used when pumping the raw stream into the
    /// transcoder's stdin.
    ///
    /// Default: 16 KiB.
    #[serde(default = "default_stdin_chunk_bytes")]
    pub stdin_chunk_bytes: usize,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            frame_channel_capacity: default_frame_channel_capacity(),
            stdin_chunk_bytes: default_stdin_chunk_bytes(),
        }
    }
}

impl TranscoderConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.binary.trim().is_empty() {
            return Err(SessionError::Config(
                "transcoder.binary must not be empty".to_string(),
            ));
        }
        if self.frame_channel_capacity == 0 {
            return Err(SessionError::Config(
                "transcoder.frame_channel_capacity must be > 0".to_string(),
            ));
        }
        if self.stdin_chunk_bytes == 0 {
            return Err(SessionError::Config(
                "transcoder.stdin_chunk_bytes must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Per-Session Player Options
// ============================================================================

/// Mutable per-session playback options.
///
/// Owned by the session and mutated only through its control surface
/// (single-writer discipline); pipeline stages receive it by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerOptions {
    /// When paused, a finished resource does not trigger queue advance.
    ///
    /// Default: false.
    #[serde(default)]
    pub paused: bool,

    /// Queue repeat behavior.
    ///
    /// Default: [`LoopMode::None`].
    #[serde(default = "default_loop_mode")]
    pub loop_mode: LoopMode,

    /// Volume percent applied to the current and future resources.
    ///
    /// Default: 100.
    #[serde(default = "default_volume")]
    pub volume: u8,

    /// When set, a filter rebuild seeks back to the pre-rebuild position so
    /// audible playback continues where it was instead of restarting.
    ///
    /// Default: false.
    #[serde(default)]
    pub seek_on_filter_change: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            paused: false,
            loop_mode: default_loop_mode(),
            volume: default_volume(),
            seek_on_filter_change: false,
        }
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_volume() -> u8 {
    100
}

fn default_prefetch() -> bool {
    true
}

fn default_cache_enabled() -> bool {
    true
}

fn default_max_entries() -> usize {
    64
}

fn default_binary() -> String {
    "ffmpeg".to_string()
}

fn default_frame_channel_capacity() -> usize {
    256
}

fn default_stdin_chunk_bytes() -> usize {
    16 * 1024
}

fn default_loop_mode() -> LoopMode {
    LoopMode::None
}
