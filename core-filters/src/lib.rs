//! # Core Filters
//!
//! The audio filter-graph model: an insertion-ordered [`FilterSet`] and the
//! [`TranscodeArgs`] builder that turns it into an ffmpeg argument vector.
//!
//! Both are pure value types; nothing here touches I/O or processes. The
//! transcode pipeline in `core-playback` consumes the built argument vector
//! verbatim.

pub mod args;
pub mod filter_set;

pub use args::{TranscodeArgs, CHANNEL_COUNT, SAMPLE_RATE_HZ};
pub use filter_set::{FilterSet, FilterValue};
