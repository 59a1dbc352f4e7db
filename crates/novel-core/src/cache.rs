//! Chapter preload cache.
//!
//! Holds normalized text for a window of chapters around the reading position
//! and tracks which chapter indices have a fetch in flight. The cache has a
//! single owner (the reading session); workers never touch it directly, they
//! hand results back to the owner, which decides whether to keep them.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::ops::RangeInclusive;

use lru::LruCache;

use crate::types::ChapterText;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub chapter_index: usize,
    pub text: ChapterText,
    /// Monotonic insertion stamp.
    pub inserted_at: u64,
}

/// Why a chapter fetch was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPurpose {
    Preload,
    /// The reader is waiting for this chapter.
    Foreground,
}

pub struct PreloadCache {
    entries: LruCache<usize, CacheEntry>,
    in_flight: HashMap<usize, FetchPurpose>,
    clock: u64,
}

impl PreloadCache {
    /// Room for `behind + ahead` neighbours plus the current chapter.
    pub fn new(ahead: usize, behind: usize) -> Self {
        let capacity = NonZeroUsize::new(ahead.saturating_add(behind).saturating_add(1))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            in_flight: HashMap::new(),
            clock: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Non-blocking lookup. Does not touch recency.
    pub fn get(&self, chapter_index: usize) -> Option<ChapterText> {
        self.entries.peek(&chapter_index).map(|e| e.text.clone())
    }

    pub fn entry(&self, chapter_index: usize) -> Option<&CacheEntry> {
        self.entries.peek(&chapter_index)
    }

    pub fn contains(&self, chapter_index: usize) -> bool {
        self.entries.contains(&chapter_index)
    }

    /// Cached chapter indices, ascending.
    pub fn indices(&self) -> Vec<usize> {
        let mut keys: Vec<usize> = self.entries.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        keys
    }

    /// Inserts or overwrites. At capacity the oldest insertion makes room.
    pub fn put(&mut self, chapter_index: usize, text: ChapterText) {
        self.clock += 1;
        let entry = CacheEntry {
            chapter_index,
            text,
            inserted_at: self.clock,
        };
        if let Some((evicted, _)) = self.entries.push(chapter_index, entry) {
            if evicted != chapter_index {
                log::debug!("cache full; dropped chapter {}", evicted);
            }
        }
    }

    /// Evicts every entry outside `window(current, last, ahead, behind)` and
    /// returns the evicted indices.
    pub fn reconcile_window(
        &mut self,
        current: usize,
        last: usize,
        ahead: usize,
        behind: usize,
    ) -> Vec<usize> {
        let keep = window(current, last, ahead, behind);
        let evict: Vec<usize> = self
            .indices()
            .into_iter()
            .filter(|i| !keep.contains(i))
            .collect();
        for index in &evict {
            self.entries.pop(index);
        }
        if !evict.is_empty() {
            log::debug!("evicted chapters {:?} outside {:?}", evict, keep);
        }
        evict
    }

    /// Drops all cached text. Running fetches stay tracked until their
    /// outcome is handed to [`PreloadCache::finish_fetch`].
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_in_flight(&self, chapter_index: usize) -> bool {
        self.in_flight.contains_key(&chapter_index)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn in_flight_purpose(&self, chapter_index: usize) -> Option<FetchPurpose> {
        self.in_flight.get(&chapter_index).copied()
    }

    /// Marks a fetch for `chapter_index` as started. Returns `false` when one
    /// is already running; a foreground request then takes over the running
    /// fetch instead of starting a second one.
    pub fn begin_fetch(&mut self, chapter_index: usize, purpose: FetchPurpose) -> bool {
        match self.in_flight.get_mut(&chapter_index) {
            Some(existing) => {
                if purpose == FetchPurpose::Foreground {
                    *existing = FetchPurpose::Foreground;
                }
                false
            }
            None => {
                self.in_flight.insert(chapter_index, purpose);
                true
            }
        }
    }

    pub fn finish_fetch(&mut self, chapter_index: usize) -> Option<FetchPurpose> {
        self.in_flight.remove(&chapter_index)
    }

    /// Starts one background fetch for each chapter in
    /// `current + 1 ..= current + ahead` (bounded by `last`) that is neither
    /// cached, in flight, nor rejected by `skip`. `launch` returns `false` if
    /// the fetch could not be started. Returns the indices launched.
    pub fn schedule_preload(
        &mut self,
        current: usize,
        last: usize,
        ahead: usize,
        skip: impl Fn(usize) -> bool,
        mut launch: impl FnMut(usize) -> bool,
    ) -> Vec<usize> {
        let end = current.saturating_add(ahead).min(last);
        let mut launched = Vec::new();
        for index in current.saturating_add(1)..=end {
            if self.contains(index) || self.is_in_flight(index) || skip(index) {
                continue;
            }
            self.in_flight.insert(index, FetchPurpose::Preload);
            if launch(index) {
                launched.push(index);
            } else {
                self.in_flight.remove(&index);
            }
        }
        if !launched.is_empty() {
            log::debug!("preloading chapters {:?}", launched);
        }
        launched
    }
}

/// Chapter indices kept around `current`: `behind` before and `ahead` after,
/// clamped to `0..=last`.
pub fn window(current: usize, last: usize, ahead: usize, behind: usize) -> RangeInclusive<usize> {
    let start = current.saturating_sub(behind).min(last);
    let end = current.saturating_add(ahead).min(last);
    start..=end
}
