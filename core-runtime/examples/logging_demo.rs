//! Logging system demonstration.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # With custom filter
//! cargo run --example logging_demo -- compact "core_runtime=trace"
//! ```

use core_runtime::logging::{
    init_logging, redact_locator, strip_path, LogFormat, LogLevel, LoggingConfig,
};
use std::env;
use tracing::{debug, info, warn};

fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace);

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config).expect("failed to initialize logging");

    info!(format = ?format, "logging initialized");
    debug!("debug output is enabled at trace level");

    let locator = "https://cdn.example/tracks/42/stream?Signature=super-secret";
    info!(locator = %redact_locator(locator), "resolving track");

    let path = "/home/user/music/song.flac";
    info!(file = %strip_path(path), "opening local file");

    warn!("this is what a skipped-track warning looks like");
}
