//! Playback sink seam.
//!
//! The sink is the voice-transport/output owner: it consumes resources and
//! reports their lifecycle back to the session (via the session's
//! `on_sink_idle` / `on_sink_error` callbacks) to drive queue advance.

use async_trait::async_trait;

use session_traits::Result;

use crate::resource::PlayableResource;

/// Consumer of playable resources.
///
/// `play` transfers ownership of the resource; the previous resource, if
/// any, becomes unreferenced and may be discarded once it finishes
/// draining. The sink reports `idle` (resource drained) and `error` events
/// to its owner, which forwards them to the session.
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    /// Begin (or resume) consuming `resource`, replacing any previous one.
    async fn play(&self, resource: PlayableResource) -> Result<()>;

    /// Stop consuming and discard the current resource, if any.
    async fn stop(&self);
}
