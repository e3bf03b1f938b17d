//! # Cloud Audio Provider
//!
//! Resolves `cloud` tracks against a cloud audio platform's public API:
//! the locator (a permalink URL) is resolved to track metadata and a
//! progressive stream URL, and playback streams that URL's body.

mod provider;
mod types;

pub use provider::CloudAudioProvider;
pub use types::ResolvedTrack;
