//! # Track Queue
//!
//! FIFO queue of tracks with explicit current-track tracking and loop-mode
//! aware advancement.
//!
//! The advance transition table:
//!
//! | Loop mode | Natural end              | Forced (skip/error)      |
//! |-----------|--------------------------|--------------------------|
//! | `None`    | drop current, pop next   | drop current, pop next   |
//! | `Track`   | replay current           | drop current, pop next   |
//! | `Queue`   | rotate current to back   | drop current, pop next   |
//!
//! A failed or skipped track leaves the rotation entirely, in every loop
//! mode; that is what the forced variant is for. Rotating a broken track
//! to the back in `Queue` mode would bring it straight around again.

use std::collections::VecDeque;

use session_traits::{LoopMode, Track};

/// FIFO track queue owned by the session (single-writer discipline; the
/// session wraps it in its own lock).
#[derive(Debug, Default)]
pub struct TrackQueue {
    pending: VecDeque<Track>,
    current: Option<Track>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a track to the back of the queue.
    pub fn push(&mut self, track: Track) {
        self.pending.push_back(track);
    }

    /// The track currently holding the resource slot.
    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// The track that would play after the current one (ignoring loop
    /// modes). Used by prefetch.
    pub fn peek_next(&self) -> Option<&Track> {
        self.pending.front()
    }

    /// Number of pending tracks (excluding the current one).
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops the current track without advancing. Pending entries survive.
    pub fn drop_current(&mut self) {
        self.current = None;
    }

    /// Drops all pending tracks and the current one.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.current = None;
    }

    /// Moves to the next track per the transition table and returns the new
    /// current, or `None` when the queue is exhausted.
    ///
    /// `forced` is the skip/error path: the current track is dropped in
    /// every loop mode, so a skipped or failed track does not come straight
    /// back (`Track` replay) or cycle around again (`Queue` rotation).
    pub fn advance(&mut self, loop_mode: LoopMode, forced: bool) -> Option<&Track> {
        if forced {
            self.current = self.pending.pop_front();
            return self.current.as_ref();
        }
        match loop_mode {
            LoopMode::Track if self.current.is_some() => {}
            LoopMode::Queue => {
                if let Some(finished) = self.current.take() {
                    self.pending.push_back(finished);
                }
                self.current = self.pending.pop_front();
            }
            _ => {
                self.current = self.pending.pop_front();
            }
        }
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_traits::{SourceKind, TrackInfo};

    fn track(name: &str) -> Track {
        Track::new(
            SourceKind::LocalFile,
            format!("/music/{}.flac", name),
            "tester",
            TrackInfo::new(name),
        )
    }

    #[test]
    fn test_advance_pops_in_fifo_order() {
        let mut queue = TrackQueue::new();
        queue.push(track("a"));
        queue.push(track("b"));

        assert!(queue.current().is_none());
        assert_eq!(queue.advance(LoopMode::None, false).unwrap().info.title, "a");
        assert_eq!(queue.advance(LoopMode::None, false).unwrap().info.title, "b");
        assert!(queue.advance(LoopMode::None, false).is_none());
        assert!(queue.current().is_none());
    }

    #[test]
    fn test_track_mode_replays_current() {
        let mut queue = TrackQueue::new();
        queue.push(track("a"));
        queue.push(track("b"));

        queue.advance(LoopMode::Track, false);
        assert_eq!(queue.current().unwrap().info.title, "a");
        queue.advance(LoopMode::Track, false);
        assert_eq!(queue.current().unwrap().info.title, "a");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_forced_advance_overrides_track_mode() {
        let mut queue = TrackQueue::new();
        queue.push(track("a"));
        queue.push(track("b"));

        queue.advance(LoopMode::Track, false);
        queue.advance(LoopMode::Track, true);
        assert_eq!(queue.current().unwrap().info.title, "b");
    }

    #[test]
    fn test_queue_mode_rotates() {
        let mut queue = TrackQueue::new();
        queue.push(track("a"));
        queue.push(track("b"));

        queue.advance(LoopMode::Queue, false);
        assert_eq!(queue.current().unwrap().info.title, "a");
        queue.advance(LoopMode::Queue, false);
        assert_eq!(queue.current().unwrap().info.title, "b");
        // "a" went to the back and comes around again.
        queue.advance(LoopMode::Queue, false);
        assert_eq!(queue.current().unwrap().info.title, "a");
    }

    #[test]
    fn test_forced_advance_drops_track_in_queue_mode() {
        let mut queue = TrackQueue::new();
        queue.push(track("a"));
        queue.push(track("b"));

        queue.advance(LoopMode::Queue, false);
        assert_eq!(queue.current().unwrap().info.title, "a");

        // "a" leaves the rotation instead of going to the back.
        queue.advance(LoopMode::Queue, true);
        assert_eq!(queue.current().unwrap().info.title, "b");
        assert_eq!(queue.len(), 0);

        // With "b" forced out too the queue is exhausted, not cycling.
        assert!(queue.advance(LoopMode::Queue, true).is_none());
        assert!(queue.current().is_none());
    }

    #[test]
    fn test_peek_next_ignores_current() {
        let mut queue = TrackQueue::new();
        queue.push(track("a"));
        queue.push(track("b"));

        queue.advance(LoopMode::None, false);
        assert_eq!(queue.peek_next().unwrap().info.title, "b");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut queue = TrackQueue::new();
        queue.push(track("a"));
        queue.push(track("b"));
        queue.advance(LoopMode::None, false);

        queue.clear();
        assert!(queue.current().is_none());
        assert!(queue.is_empty());
    }
}
