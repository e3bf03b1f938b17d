//! # Logging & Tracing Infrastructure
//!
//! Structured logging for the session engine, built on `tracing` and
//! `tracing-subscriber`.
//!
//! ## Overview
//!
//! - Pretty, JSON, and compact output formats
//! - Per-crate filtering with a `SEGUE_LOG` environment override
//! - Locator redaction for URLs that embed access tokens in their query
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LoggingConfig, LogFormat, LogLevel};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_level(LogLevel::Debug);
//!
//! init_logging(config).expect("failed to initialize logging");
//! tracing::info!("session engine started");
//! ```

use session_traits::{Result, SessionError};
use std::io;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable consulted for a filter override
/// (e.g. `SEGUE_LOG=core_session=trace,core_playback=debug`).
pub const ENV_FILTER_VAR: &str = "SEGUE_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors.
    Pretty,
    /// Structured JSON format for machine parsing.
    Json,
    /// Compact single-line format for production.
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Minimum log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Minimum log level for workspace crates.
    pub level: LogLevel,
    /// Custom filter string (e.g., `"core_session=trace"`). Overrides the
    /// built default; itself overridden by `SEGUE_LOG` when set.
    pub filter: Option<String>,
    /// Display target module in logs.
    pub display_target: bool,
    /// Display thread info.
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    /// Set log format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set minimum log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set custom filter string.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Enable or disable target display.
    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    /// Enable or disable thread info.
    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Initialize the logging system.
///
/// Call once during startup; a second call fails because the global
/// subscriber is already set.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    match config.format {
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(config.display_target)
                .with_thread_ids(config.display_thread_info)
                .with_thread_names(config.display_thread_info)
                .with_writer(io::stdout);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_target(config.display_target)
                .with_thread_ids(config.display_thread_info)
                .with_thread_names(config.display_thread_info)
                .with_writer(io::stdout);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Compact => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(config.display_target)
                .with_thread_ids(config.display_thread_info)
                .with_thread_names(config.display_thread_info)
                .with_writer(io::stdout);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
    }
    .map_err(|e| SessionError::Config(format!("Failed to initialize logging: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    // SEGUE_LOG wins over everything else.
    if std::env::var(ENV_FILTER_VAR).is_ok() {
        return EnvFilter::try_from_env(ENV_FILTER_VAR)
            .map_err(|e| SessionError::Config(format!("Invalid {} filter: {}", ENV_FILTER_VAR, e)));
    }

    let filter_string = if let Some(custom_filter) = &config.filter {
        custom_filter.clone()
    } else {
        // Workspace crates at the configured level, noisy dependencies at warn.
        let level = config.level.as_str();
        format!(
            "session_traits={},core_runtime={},core_filters={},core_playback={},\
             core_session={},provider_cloud={},provider_local={},\
             provider_attachment={},provider_video={},\
             h2=warn,hyper=warn,reqwest=warn",
            level, level, level, level, level, level, level, level, level
        )
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| SessionError::Config(format!("Invalid log filter: {}", e)))
}

/// Strip the query string from a locator before logging it.
///
/// Stream URLs routinely carry signed tokens in their query
/// (`…/stream?Policy=…&Signature=…`); the path alone is enough to identify
/// the track in logs.
///
/// ```rust
/// use core_runtime::logging::redact_locator;
///
/// let url = "https://cdn.example/tracks/42/stream?Signature=abc123";
/// assert_eq!(redact_locator(url), "https://cdn.example/tracks/42/stream?[REDACTED]");
/// ```
pub fn redact_locator(locator: &str) -> String {
    match locator.split_once('?') {
        Some((base, _)) => format!("{}?[REDACTED]", base),
        None => locator.to_string(),
    }
}

/// Strip full file paths to basename only for privacy.
///
/// ```rust
/// use core_runtime::logging::strip_path;
///
/// assert_eq!(strip_path("/home/user/music/song.mp3"), "song.mp3");
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .rsplit('\\')
        .next()
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_level(LogLevel::Debug)
            .with_filter("core_session=trace")
            .with_target(true)
            .with_thread_info(true);

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.filter, Some("core_session=trace".to_string()));
        assert!(config.display_target);
        assert!(config.display_thread_info);
    }

    #[test]
    fn test_build_default_filter() {
        let config = LoggingConfig::default().with_level(LogLevel::Debug);
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("core_session=debug"));
        assert!(filter.to_string().contains("hyper=warn"));
    }

    #[test]
    fn test_build_custom_filter() {
        let config = LoggingConfig::default().with_filter("core_filters=trace");
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("core_filters=trace"));
    }

    #[test]
    fn test_redact_locator_strips_query() {
        assert_eq!(
            redact_locator("https://cdn.example/a/stream?token=secret&x=1"),
            "https://cdn.example/a/stream?[REDACTED]"
        );
        assert_eq!(
            redact_locator("https://cdn.example/a/stream"),
            "https://cdn.example/a/stream"
        );
        assert_eq!(redact_locator("/music/song.flac"), "/music/song.flac");
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(strip_path("/home/user/music/song.mp3"), "song.mp3");
        assert_eq!(strip_path("C:\\Users\\Music\\song.mp3"), "song.mp3");
        assert_eq!(strip_path("song.mp3"), "song.mp3");
        assert_eq!(strip_path("/var/log/"), "");
    }

    #[test]
    fn test_default_format() {
        #[cfg(debug_assertions)]
        assert_eq!(LogFormat::default(), LogFormat::Pretty);

        #[cfg(not(debug_assertions))]
        assert_eq!(LogFormat::default(), LogFormat::Json);
    }
}
