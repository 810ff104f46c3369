//! Feed control
//!
//! Decides whether inbound pushed events reach the views, and keeps
//! list-like views within their display caps.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::info;

/// Whether pushed events are applied at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Streaming {
    Active,
    Paused,
}

/// Whether the view shows live data or a historical replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Playback {
    Live,
    History,
}

/// The two independent feed axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMode {
    pub streaming: Streaming,
    pub playback: Playback,
}

impl Default for FeedMode {
    fn default() -> Self {
        Self {
            streaming: Streaming::Active,
            playback: Playback::Live,
        }
    }
}

impl FeedMode {
    /// A pushed event is applied iff streaming is active and playback is live.
    pub fn accepts(&self) -> bool {
        self.streaming == Streaming::Active && self.playback == Playback::Live
    }
}

/// Owns the feed mode. Acceptance is evaluated on every call, never cached.
#[derive(Debug, Default)]
pub struct FeedController {
    mode: FeedMode,
}

impl FeedController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> FeedMode {
        self.mode
    }

    pub fn is_streaming(&self) -> bool {
        self.mode.streaming == Streaming::Active
    }

    pub fn in_history(&self) -> bool {
        self.mode.playback == Playback::History
    }

    /// Whether an event arriving now should be applied
    pub fn accepts(&self) -> bool {
        self.mode.accepts()
    }

    /// Flip active <-> paused. Playback is untouched.
    pub fn toggle_streaming(&mut self) -> Streaming {
        self.mode.streaming = match self.mode.streaming {
            Streaming::Active => Streaming::Paused,
            Streaming::Paused => Streaming::Active,
        };
        info!("Data stream {:?}", self.mode.streaming);
        self.mode.streaming
    }

    /// Flip live <-> history. Streaming is untouched.
    pub fn toggle_playback(&mut self) -> Playback {
        self.mode.playback = match self.mode.playback {
            Playback::Live => Playback::History,
            Playback::History => Playback::Live,
        };
        info!("Playback mode {:?}", self.mode.playback);
        self.mode.playback
    }
}

/// Most-recent-first list with a hard display cap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedFeed<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> BoundedFeed<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert at the head, evicting the oldest displayed entry on overflow.
    /// Returns the evicted entry, if any.
    pub fn push_front(&mut self, item: T) -> Option<T> {
        self.items.push_front(item);
        if self.items.len() > self.capacity {
            self.items.pop_back()
        } else {
            None
        }
    }

    /// Full redraw: keep the first `capacity` entries in the given order.
    pub fn replace<I: IntoIterator<Item = T>>(&mut self, items: I) {
        self.items.clear();
        self.items.extend(items.into_iter().take(self.capacity));
    }

    pub fn head(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_mode_is_active_live() {
        let feed = FeedController::new();
        assert!(feed.is_streaming());
        assert!(!feed.in_history());
        assert!(feed.accepts());
    }

    #[test]
    fn test_acceptance_for_all_four_combinations() {
        let cases = [
            (Streaming::Active, Playback::Live, true),
            (Streaming::Active, Playback::History, false),
            (Streaming::Paused, Playback::Live, false),
            (Streaming::Paused, Playback::History, false),
        ];

        for (streaming, playback, expected) in cases {
            let mode = FeedMode { streaming, playback };
            assert_eq!(mode.accepts(), expected, "{:?}", mode);
        }
    }

    #[test]
    fn test_toggles_are_independent() {
        let mut feed = FeedController::new();

        assert_eq!(feed.toggle_streaming(), Streaming::Paused);
        assert_eq!(feed.mode().playback, Playback::Live);
        assert!(!feed.accepts());

        assert_eq!(feed.toggle_playback(), Playback::History);
        assert_eq!(feed.mode().streaming, Streaming::Paused);

        feed.toggle_streaming();
        assert!(!feed.accepts());
        feed.toggle_playback();
        assert!(feed.accepts());
    }

    #[test]
    fn test_bounded_feed_evicts_oldest() {
        let mut feed = BoundedFeed::new(5);
        for i in 0..5 {
            assert_eq!(feed.push_front(i), None);
        }

        assert_eq!(feed.push_front(5), Some(0));
        assert_eq!(feed.len(), 5);
        assert_eq!(feed.head(), Some(&5));
        let items: Vec<_> = feed.iter().copied().collect();
        assert_eq!(items, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_bounded_feed_replace_truncates() {
        let mut feed = BoundedFeed::new(10);
        feed.push_front(99);
        feed.replace(0..25);

        assert_eq!(feed.len(), 10);
        assert_eq!(feed.head(), Some(&0));
        assert_eq!(feed.get(9), Some(&9));
    }
}
