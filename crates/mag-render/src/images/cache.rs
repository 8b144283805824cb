//! Memoized image frames

use crate::scene::ResolvedImage;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Source identity plus the frame position for video thumbnails
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameKey {
    pub source: String,
    pub time_offset_ms: Option<u64>,
}

impl FrameKey {
    pub fn new(source: impl Into<String>, time_offset_ms: Option<u64>) -> Self {
        Self {
            source: source.into(),
            time_offset_ms,
        }
    }
}

/// Shared store of resolved frames, injected into the image resolver
pub trait FrameCache: Send + Sync {
    fn get(&self, key: &FrameKey) -> Option<Arc<ResolvedImage>>;
    fn insert(&self, key: FrameKey, image: Arc<ResolvedImage>);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct LruState {
    entries: HashMap<FrameKey, Arc<ResolvedImage>>,
    order: VecDeque<FrameKey>,
}

/// Least-recently-used cache with a fixed entry capacity
#[derive(Debug)]
pub struct LruFrameCache {
    capacity: usize,
    state: Mutex<LruState>,
}

impl LruFrameCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LruState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl FrameCache for LruFrameCache {
    fn get(&self, key: &FrameKey) -> Option<Arc<ResolvedImage>> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let image = state.entries.get(key).cloned()?;
        // Move to most recently used
        state.order.retain(|k| k != key);
        state.order.push_back(key.clone());
        Some(image)
    }

    fn insert(&self, key: FrameKey, image: Arc<ResolvedImage>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.entries.contains_key(&key) {
            state.order.retain(|k| k != &key);
        }

        while state.order.len() >= self.capacity {
            if let Some(old_key) = state.order.pop_front() {
                state.entries.remove(&old_key);
            }
        }

        state.entries.insert(key.clone(), image);
        state.order.push_back(key);
    }

    fn len(&self) -> usize {
        self.state
            .lock()
            .map(|s| s.entries.len())
            .unwrap_or_else(|e| e.into_inner().entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32) -> Arc<ResolvedImage> {
        Arc::new(ResolvedImage {
            mime: "image/png".into(),
            bytes: vec![],
            width,
            height: 1,
        })
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = LruFrameCache::new(2);
        cache.insert(FrameKey::new("a", None), image(1));
        cache.insert(FrameKey::new("b", None), image(2));
        assert!(cache.get(&FrameKey::new("a", None)).is_some());
        cache.insert(FrameKey::new("c", None), image(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&FrameKey::new("b", None)).is_none());
        assert!(cache.get(&FrameKey::new("a", None)).is_some());
    }

    #[test]
    fn frame_offset_is_part_of_the_key() {
        let cache = LruFrameCache::new(4);
        cache.insert(FrameKey::new("clip.mp4", Some(1000)), image(1));
        assert!(cache.get(&FrameKey::new("clip.mp4", Some(2000))).is_none());
        assert_eq!(
            cache.get(&FrameKey::new("clip.mp4", Some(1000))).map(|i| i.width),
            Some(1)
        );
    }
}
