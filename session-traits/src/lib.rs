//! # Session Traits
//!
//! Shared contracts for the Segue playback-session pipeline. This crate is
//! the leaf of the workspace: every other crate depends on it and it depends
//! on no sibling, so the seams defined here (providers, cache store, byte
//! stream, error taxonomy) are the only coupling between pipeline stages.
//!
//! ## Contents
//!
//! - [`model`] — `Track`, `TrackInfo`, `SourceKind`, `LoopMode`
//! - [`stream`] — the `ByteStream` alias plus small constructors
//! - [`provider`] — `SourceProvider`, `CacheStore`, `ProviderRegistry`
//! - [`error`] — `SessionError` and the workspace `Result` alias

pub mod error;
pub mod model;
pub mod provider;
pub mod stream;

pub use error::{Result, SessionError};
pub use model::{LoopMode, SourceKind, Track, TrackInfo};
pub use provider::{CacheStore, ProviderRegistry, SourceProvider};
pub use stream::ByteStream;
