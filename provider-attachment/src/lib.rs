//! # Attachment Provider
//!
//! Resolves `attachment` tracks: the locator is a direct URL to an uploaded
//! audio file. A `HEAD` probe supplies metadata at enqueue time; playback
//! streams the `GET` body.

mod provider;

pub use provider::AttachmentProvider;
