//! Content bundle cache
//!
//! In-memory store for generated content, injected through AppState and
//! shared by Arc. A bundle is one value, so the story, quiz, and summary
//! become visible together or not at all. Capacity is bounded with
//! oldest-first eviction; insertion order also serves `latest()`.
//!
//! All operations are O(1) apart from `latest()`, which skips stale order
//! markers left behind by re-inserted ids.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// A complete generated content triple under one engine-assigned id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBundle {
    pub id: String,
    pub story: Value,
    pub quiz: Value,
    pub summary: Value,
}

/// Cache tuning knobs
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of bundles held; oldest evicted first
    pub max_bundles: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_bundles: 128 }
    }
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_bundles: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct CacheEntry {
    bundle: ContentBundle,
    seq: u64,
}

pub struct ContentCache {
    entries: DashMap<String, CacheEntry>,
    /// Insertion order as (seq, id); markers go stale when an id is
    /// re-inserted and are skipped during eviction and `latest()`
    order: Mutex<VecDeque<(u64, String)>>,
    seq: AtomicU64,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ContentCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            seq: AtomicU64::new(0),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Insert a whole bundle. Re-inserting an id replaces its value and
    /// promotes it to most recent.
    pub fn put(&self, bundle: ContentBundle) {
        let id = bundle.id.clone();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);

        self.entries.insert(id.clone(), CacheEntry { bundle, seq });

        let mut order = match self.order.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        order.push_back((seq, id));

        while self.entries.len() > self.config.max_bundles {
            let Some((old_seq, old_id)) = order.pop_front() else {
                break;
            };
            let current = self.entries.get(&old_id).map(|e| e.seq);
            if current == Some(old_seq) {
                self.entries.remove(&old_id);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(id = %old_id, "Evicted oldest content bundle");
            }
            // Stale marker from a re-inserted id, nothing to evict
        }
    }

    /// Look up a bundle by id. A miss is not an error.
    pub fn get(&self, id: &str) -> Option<ContentBundle> {
        match self.entries.get(id) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.bundle.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// The most recently inserted bundle still resident
    pub fn latest(&self) -> Option<ContentBundle> {
        let order = match self.order.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        for (seq, id) in order.iter().rev() {
            if let Some(entry) = self.entries.get(id) {
                if entry.seq == *seq {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.bundle.clone());
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Ids of all resident bundles, oldest first
    pub fn ids(&self) -> Vec<String> {
        let order = match self.order.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        order
            .iter()
            .filter(|(seq, id)| self.entries.get(id).map(|e| e.seq) == Some(*seq))
            .map(|(_, id)| id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            max_bundles: self.config.max_bundles,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
