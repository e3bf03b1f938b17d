//! # Core Session
//!
//! The orchestration layer of the Segue playback engine:
//!
//! - [`session`] — [`PlayerSession`](session::PlayerSession), the public
//!   control surface: enqueue, transport, filters, seek, teardown
//! - [`queue`] — the loop-mode aware track queue
//! - [`state`] — the playback lifecycle state machine
//! - [`resolver`] — cache-then-provider stream resolution
//!
//! ## Usage
//!
//! ```ignore
//! use core_session::{PlayerSession, TrackRequest};
//! use core_runtime::config::SessionConfig;
//! use session_traits::SourceKind;
//!
//! let session = PlayerSession::builder(SessionConfig::default())
//!     .with_provider(local_files)
//!     .with_sink(voice_sink)
//!     .build()?;
//!
//! session
//!     .add_tracks(vec![TrackRequest::new(
//!         SourceKind::LocalFile,
//!         "/music/track.flac",
//!         "listener",
//!     )])
//!     .await?;
//! ```

pub mod queue;
pub mod resolver;
pub mod session;
pub mod state;

pub use queue::TrackQueue;
pub use resolver::{ResolvedStream, SourceResolver};
pub use session::{PlayerSession, PlayerSessionBuilder, TrackRequest};
pub use state::PlayerState;
