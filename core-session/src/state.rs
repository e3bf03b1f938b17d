//! # Playback State Machine
//!
//! The session's externally visible lifecycle:
//!
//! ```text
//!          activate            pause
//! ┌──────┐ ───────> ┌─────────┐ ───────> ┌────────┐
//! │ Idle │          │ Playing │          │ Paused │
//! └──────┘ <─────── └─────────┘ <─────── └────────┘
//!    │      queue        │       resume      │
//!    │      ended        │ destroy           │ destroy
//!    │ destroy           ▼                   │
//!    └──────────────> ┌─────────┐ <──────────┘
//!                     │ Stopped │   (terminal)
//!                     └─────────┘
//! ```
//!
//! `Stopped` is reached only through `destroy()` and has no outgoing
//! transitions. Every other state can reach it directly.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerState {
    /// No resource is active; the queue may or may not hold tracks.
    Idle,
    /// A resource is active and being consumed by the sink.
    Playing,
    /// A resource is active but consumption is held.
    Paused,
    /// The session was destroyed. Terminal.
    Stopped,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Idle => "idle",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Stopped => "stopped",
        }
    }

    /// Returns `true` if no further transition can leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayerState::Stopped)
    }

    /// Returns `true` if the transition `self -> to` is part of the
    /// lifecycle diagram.
    pub fn can_transition_to(&self, to: PlayerState) -> bool {
        use PlayerState::*;
        match (self, to) {
            // Destroy is reachable from everywhere but itself.
            (Stopped, _) => false,
            (_, Stopped) => true,
            (Idle, Playing) => true,
            // Replacing the active track is Playing -> Playing.
            (Playing, Playing) | (Playing, Paused) | (Playing, Idle) => true,
            (Paused, Playing) | (Paused, Idle) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlayerState::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(Idle.can_transition_to(Playing));
        assert!(Playing.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Playing));
        assert!(Playing.can_transition_to(Idle));
    }

    #[test]
    fn test_track_replacement_is_playing_to_playing() {
        assert!(Playing.can_transition_to(Playing));
    }

    #[test]
    fn test_stopped_is_terminal() {
        assert!(Stopped.is_terminal());
        for to in [Idle, Playing, Paused, Stopped] {
            assert!(!Stopped.can_transition_to(to));
        }
    }

    #[test]
    fn test_every_live_state_can_be_destroyed() {
        for from in [Idle, Playing, Paused] {
            assert!(from.can_transition_to(Stopped));
        }
    }

    #[test]
    fn test_idle_cannot_pause() {
        assert!(!Idle.can_transition_to(Paused));
        assert!(!Paused.can_transition_to(Paused));
    }

    #[test]
    fn test_serde_kebab_case() {
        assert_eq!(serde_json::to_string(&Playing).unwrap(), "\"playing\"");
        let parsed: PlayerState = serde_json::from_str("\"idle\"").unwrap();
        assert_eq!(parsed, Idle);
    }
}
