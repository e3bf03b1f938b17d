//! Integration tests for the logging system.
//!
//! The global subscriber can only be installed once per process, so these
//! tests exercise the config builder and the redaction helpers rather than
//! repeated initialization.

use core_runtime::logging::{redact_locator, strip_path, LogFormat, LogLevel, LoggingConfig};

#[test]
fn test_logging_config_builder_round_trip() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_filter("core_session=trace");

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.filter.as_deref(), Some("core_session=trace"));
}

#[test]
fn test_locator_redaction_keeps_path() {
    let locator = "https://cdn.example/tracks/42/stream?Policy=abc&Signature=def";
    let redacted = redact_locator(locator);

    assert!(redacted.starts_with("https://cdn.example/tracks/42/stream"));
    assert!(!redacted.contains("Signature"));
    assert!(redacted.ends_with("[REDACTED]"));
}

#[test]
fn test_locator_without_query_is_unchanged() {
    assert_eq!(
        redact_locator("https://cdn.example/tracks/42/stream"),
        "https://cdn.example/tracks/42/stream"
    );
}

#[test]
fn test_strip_path_variants() {
    assert_eq!(strip_path("/music/album/track.flac"), "track.flac");
    assert_eq!(strip_path("relative/track.flac"), "track.flac");
    assert_eq!(strip_path("C:\\music\\track.flac"), "track.flac");
}
