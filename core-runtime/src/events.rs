//! # Session Event Bus
//!
//! Broadcast channel for externally observable session changes, built on
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! Every state change a host application might care about — track started,
//! queue advanced, filters applied, cache stored, session destroyed — is
//! published as a [`SessionEvent`] on the bus. Subscribers are independent;
//! a slow subscriber receives `RecvError::Lagged` and keeps going, it never
//! blocks the session.
//!
//! ```text
//! ┌───────────────┐    emit     ┌───────────┐   subscribe   ┌────────────┐
//! │ PlayerSession ├────────────>│ EventBus  ├──────────────>│ Host UI    │
//! └───────────────┘             │(broadcast)├──────────────>│ Diagnostics│
//!                               └───────────┘               └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, SessionEventKind};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::with_default_capacity();
//! let mut sub = bus.subscribe();
//!
//! bus.emit(SessionEventKind::VolumeChanged { volume: 80 });
//!
//! let event = sub.recv().await.unwrap();
//! assert!(matches!(event.kind, SessionEventKind::VolumeChanged { volume: 80 }));
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall behind by more than this receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// An event envelope: a unique id, an emission timestamp, and the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Unique per emission.
    pub id: Uuid,
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    #[serde(flatten)]
    pub kind: SessionEventKind,
}

impl SessionEvent {
    /// Wraps a payload in a fresh envelope.
    pub fn new(kind: SessionEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Human-readable description of the event.
    pub fn description(&self) -> &'static str {
        self.kind.description()
    }

    /// Severity level for filtering and logging.
    pub fn severity(&self) -> EventSeverity {
        self.kind.severity()
    }
}

/// Everything a session reports to the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SessionEventKind {
    /// A resource was activated and handed to the playback sink.
    TrackStarted {
        /// Id of the track now playing.
        track_id: Uuid,
        /// Display title.
        title: String,
    },
    /// The current track reached its natural end.
    TrackFinished {
        /// Id of the finished track.
        track_id: Uuid,
    },
    /// A track could not be resolved or transcoded and was skipped.
    TrackFailed {
        /// Id of the affected track, when known.
        track_id: Option<Uuid>,
        /// Human-readable error message.
        message: String,
    },
    /// The queue is exhausted; the resource slot is empty.
    QueueEnded,
    /// A new filter graph took effect.
    FiltersApplied {
        /// The comma-joined `name=value` graph, empty when reset.
        graph: String,
    },
    /// Playback jumped to an absolute offset.
    SeekApplied {
        /// Target offset in whole seconds.
        position_secs: u64,
    },
    /// The session volume changed.
    VolumeChanged {
        /// New volume in percent.
        volume: u8,
    },
    /// A resolved stream finished writing into the cache store.
    CacheStored {
        /// Cache key (the track locator).
        locator: String,
        /// Stored size in bytes.
        bytes: u64,
    },
    /// The playback state machine transitioned.
    StateChanged {
        /// State before the transition.
        from: String,
        /// State after the transition.
        to: String,
    },
    /// The session was torn down. Final event on the bus.
    SessionDestroyed,
}

impl SessionEventKind {
    /// Human-readable description of the event.
    pub fn description(&self) -> &'static str {
        match self {
            SessionEventKind::TrackStarted { .. } => "Track started",
            SessionEventKind::TrackFinished { .. } => "Track finished",
            SessionEventKind::TrackFailed { .. } => "Track failed and was skipped",
            SessionEventKind::QueueEnded => "Queue ended",
            SessionEventKind::FiltersApplied { .. } => "Filter graph applied",
            SessionEventKind::SeekApplied { .. } => "Seek applied",
            SessionEventKind::VolumeChanged { .. } => "Volume changed",
            SessionEventKind::CacheStored { .. } => "Stream cached",
            SessionEventKind::StateChanged { .. } => "Playback state changed",
            SessionEventKind::SessionDestroyed => "Session destroyed",
        }
    }

    /// Severity level for filtering and logging.
    pub fn severity(&self) -> EventSeverity {
        match self {
            SessionEventKind::TrackFailed { .. } => EventSeverity::Warning,
            SessionEventKind::TrackStarted { .. }
            | SessionEventKind::QueueEnded
            | SessionEventKind::SessionDestroyed => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose).
    Debug,
    /// Informational events.
    Info,
    /// Warning events (recovered locally).
    Warning,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central bus for publishing and subscribing to session events.
///
/// Cloning the bus clones the sender; each `subscribe()` creates an
/// independent receiver. Emission never blocks: delivery failures (no
/// subscribers, lagging subscribers) are not errors from the session's
/// point of view.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Creates a bus with the given per-subscriber buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a bus with [`DEFAULT_EVENT_BUFFER_SIZE`].
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event payload to all subscribers.
    ///
    /// Returns the number of subscribers that received it; zero when nobody
    /// is listening, which is fine.
    pub fn emit(&self, kind: SessionEventKind) -> usize {
        self.sender.send(SessionEvent::new(kind)).unwrap_or(0)
    }

    /// Creates a new independent subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_without_subscribers_is_not_an_error() {
        let bus = EventBus::new(10);
        assert_eq!(bus.emit(SessionEventKind::QueueEnded), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(10);
        let mut sub = bus.subscribe();

        let delivered = bus.emit(SessionEventKind::VolumeChanged { volume: 50 });
        assert_eq!(delivered, 1);

        let event = sub.recv().await.unwrap();
        assert_eq!(event.kind, SessionEventKind::VolumeChanged { volume: 50 });
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        bus.emit(SessionEventKind::QueueEnded);

        assert_eq!(sub1.recv().await.unwrap().kind, SessionEventKind::QueueEnded);
        assert_eq!(sub2.recv().await.unwrap().kind, SessionEventKind::QueueEnded);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2); // very small buffer
        let mut sub = bus.subscribe();

        for volume in 0..5 {
            bus.emit(SessionEventKind::VolumeChanged { volume });
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_severity_levels() {
        let failed = SessionEventKind::TrackFailed {
            track_id: None,
            message: "gone".to_string(),
        };
        assert_eq!(failed.severity(), EventSeverity::Warning);

        let started = SessionEventKind::TrackStarted {
            track_id: Uuid::new_v4(),
            title: "Song".to_string(),
        };
        assert_eq!(started.severity(), EventSeverity::Info);

        let seek = SessionEventKind::SeekApplied { position_secs: 30 };
        assert_eq!(seek.severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = SessionEvent::new(SessionEventKind::CacheStored {
            locator: "https://audio.example/track/1".to_string(),
            bytes: 4096,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"cache-stored\""));

        let parsed: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_event_envelopes_are_unique() {
        let a = SessionEvent::new(SessionEventKind::QueueEnded);
        let b = SessionEvent::new(SessionEventKind::QueueEnded);
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, b.kind);
    }

    #[test]
    fn test_description() {
        let event = SessionEvent::new(SessionEventKind::FiltersApplied {
            graph: "speed=1.5".to_string(),
        });
        assert_eq!(event.description(), "Filter graph applied");
    }
}
