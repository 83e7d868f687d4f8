use std::collections::HashMap;

use campus_types::CommentId;
use serde::de::DeserializeOwned;

use crate::storage::{KeyValueStore, StoreResult};

/// Store key for the liked-flag map
pub const LIKED_KEY: &str = "comment_likes";
/// Store key for the like-count map
pub const COUNTS_KEY: &str = "comment_like_counts";

/// Result of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    pub liked: bool,
    pub count: i64,
}

/// Visitor-local comment likes.
///
/// Comment likes are simulated on the client: the flag and count maps
/// live only in the local store and are never sent to the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LikeState {
    liked: HashMap<CommentId, bool>,
    counts: HashMap<CommentId, i64>,
}

impl LikeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read both maps from the store. Each map that is missing or fails
    /// to parse falls back to empty on its own.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let liked = read_map(store, LIKED_KEY);
        let counts = read_map::<i64>(store, COUNTS_KEY)
            .into_iter()
            .map(|(id, count)| (id, count.max(0)))
            .collect();
        Self { liked, counts }
    }

    pub fn is_liked(&self, id: CommentId) -> bool {
        self.liked.get(&id).copied().unwrap_or(false)
    }

    pub fn count(&self, id: CommentId) -> i64 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    /// Whether a count entry exists for `id`
    pub fn has_count(&self, id: CommentId) -> bool {
        self.counts.contains_key(&id)
    }

    /// Add a zero count for `id` unless one is already known.
    /// Returns true when an entry was added.
    pub fn ensure_count(&mut self, id: CommentId) -> bool {
        if self.counts.contains_key(&id) {
            return false;
        }
        self.counts.insert(id, 0);
        true
    }

    /// Flip the liked flag for `id` and persist both maps together.
    ///
    /// On a failed write the in-memory entries for `id` are restored, so
    /// memory and store never disagree.
    pub fn toggle(&mut self, id: CommentId, store: &mut dyn KeyValueStore) -> StoreResult<LikeToggle> {
        let previous = (self.liked.get(&id).copied(), self.counts.get(&id).copied());

        let liked = !self.is_liked(id);
        let count = if liked {
            self.count(id) + 1
        } else {
            (self.count(id) - 1).max(0)
        };
        self.liked.insert(id, liked);
        self.counts.insert(id, count);

        if let Err(e) = self.persist(store) {
            log::warn!(target: "comments", "Failed to persist like for comment {}: {}", id, e);
            self.restore(id, previous);
            return Err(e);
        }

        Ok(LikeToggle { liked, count })
    }

    /// Write both maps in a single atomic store update
    pub fn persist(&self, store: &mut dyn KeyValueStore) -> StoreResult<()> {
        let liked = serde_json::to_string(&self.liked)?;
        let counts = serde_json::to_string(&self.counts)?;
        store.set_many(&[(LIKED_KEY, liked), (COUNTS_KEY, counts)])
    }

    fn restore(&mut self, id: CommentId, previous: (Option<bool>, Option<i64>)) {
        match previous.0 {
            Some(flag) => self.liked.insert(id, flag),
            None => self.liked.remove(&id),
        };
        match previous.1 {
            Some(count) => self.counts.insert(id, count),
            None => self.counts.remove(&id),
        };
    }
}

fn read_map<V: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> HashMap<CommentId, V> {
    let Some(raw) = store.get(key) else {
        return HashMap::new();
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        log::warn!(target: "storage", "Ignoring corrupted '{}' entry: {}", key, e);
        HashMap::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_toggle_like_and_unlike() {
        let mut store = MemoryStore::new();
        let mut likes = LikeState::new();

        let first = likes.toggle(1, &mut store).unwrap();
        assert_eq!(first, LikeToggle { liked: true, count: 1 });

        let second = likes.toggle(1, &mut store).unwrap();
        assert_eq!(second, LikeToggle { liked: false, count: 0 });
    }

    #[test]
    fn test_toggle_persists_both_maps() {
        let mut store = MemoryStore::new();
        let mut likes = LikeState::new();
        likes.toggle(7, &mut store).unwrap();

        let reloaded = LikeState::load(&store);
        assert!(reloaded.is_liked(7));
        assert_eq!(reloaded.count(7), 1);
        assert_eq!(reloaded, likes);
    }

    #[test]
    fn test_unlike_floors_count_at_zero() {
        let mut store = MemoryStore::new();
        // Liked flag set but no count recorded
        store.set(LIKED_KEY, r#"{"5": true}"#).unwrap();

        let mut likes = LikeState::load(&store);
        let result = likes.toggle(5, &mut store).unwrap();
        assert_eq!(result, LikeToggle { liked: false, count: 0 });
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let mut store = MemoryStore::new();
        let mut likes = LikeState::new();
        likes.ensure_count(3);

        store.set_fail_writes(true);
        assert!(likes.toggle(3, &mut store).is_err());
        assert!(!likes.is_liked(3));
        assert_eq!(likes.count(3), 0);
        assert!(likes.has_count(3));

        assert!(likes.toggle(4, &mut store).is_err());
        assert!(!likes.has_count(4));
        assert_eq!(store.get(LIKED_KEY), None);
    }

    #[test]
    fn test_corrupt_maps_fall_back_independently() {
        let mut store = MemoryStore::new();
        store.set(LIKED_KEY, "definitely not json").unwrap();
        store.set(COUNTS_KEY, r#"{"2": 4, "3": -2}"#).unwrap();

        let likes = LikeState::load(&store);
        assert!(!likes.is_liked(2));
        assert_eq!(likes.count(2), 4);
        assert_eq!(likes.count(3), 0);
    }

    #[test]
    fn test_ensure_count_keeps_existing_entry() {
        let mut store = MemoryStore::new();
        store.set(COUNTS_KEY, r#"{"9": 12}"#).unwrap();

        let mut likes = LikeState::load(&store);
        assert!(!likes.ensure_count(9));
        assert_eq!(likes.count(9), 12);
        assert!(likes.ensure_count(10));
        assert_eq!(likes.count(10), 0);
    }

    use proptest::prelude::*;

    proptest! {
        // Counts stay non-negative and every double toggle is an identity
        #[test]
        fn prop_toggle_sequences(ids in prop::collection::vec(0i64..5, 0..60)) {
            let mut store = MemoryStore::new();
            let mut likes = LikeState::new();

            for id in ids {
                let before = (likes.is_liked(id), likes.count(id));
                likes.toggle(id, &mut store).unwrap();
                prop_assert!(likes.count(id) >= 0);

                let mut probe = likes.clone();
                let mut probe_store = store.clone();
                probe.toggle(id, &mut probe_store).unwrap();
                prop_assert_eq!((probe.is_liked(id), probe.count(id)), before);
            }
        }
    }
}
