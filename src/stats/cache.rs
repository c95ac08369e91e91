// src/stats/cache.rs
//
// Per-day result cache. An entry computed on a given calendar day stays
// valid until local midnight rollover, regardless of elapsed hours. The
// cache knows nothing about request rates; the refresh cooldown lives in
// the service layer.

use crate::stats::aggregate::{AggregateResult, View};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub doc_id: String,
    pub view: View,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    computed_for: String,
    result: AggregateResult,
}

/// Capacity-bounded LRU mapping from (document, view) to the day's
/// computed result. Eviction only happens on insert, so lookups keep the
/// contract of the unbounded original.
#[derive(Debug)]
pub struct StatsCache {
    capacity: usize,
    entries: HashMap<CacheKey, CacheEntry>,
    // front = least recently used
    order: VecDeque<CacheKey>,
}

impl StatsCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Return the cached result if it was computed today and no refresh is
    /// forced; otherwise run `compute`, store under today's label and return.
    pub fn get_or_compute<F>(
        &mut self,
        key: CacheKey,
        force: bool,
        today: &str,
        compute: F,
    ) -> AggregateResult
    where
        F: FnOnce() -> AggregateResult,
    {
        if !force {
            let fresh = self
                .entries
                .get(&key)
                .map(|entry| entry.computed_for == today)
                .unwrap_or(false);
            if fresh {
                self.touch(&key);
                return self.entries[&key].result.clone();
            }
        }

        let result = compute();
        self.insert(
            key,
            CacheEntry {
                computed_for: today.to_string(),
                result: result.clone(),
            },
        );
        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: CacheKey, entry: CacheEntry) {
        if self.entries.insert(key.clone(), entry).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
                log::debug!("Evicted stats cache entry for '{}'", evicted.doc_id);
            }
        }
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let key = self.order.remove(pos).unwrap_or_else(|| key.clone());
            self.order.push_back(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(doc_id: &str) -> CacheKey {
        CacheKey {
            doc_id: doc_id.to_string(),
            view: View::AllHistory,
        }
    }

    fn result_with_pv(pv: u64) -> AggregateResult {
        AggregateResult {
            days: vec![],
            pv_series: vec![],
            uv_series: vec![],
            total_pv: pv,
            total_uv: 0,
            yesterday_dau: None,
            wau: None,
        }
    }

    #[test]
    fn test_same_day_hit_skips_recompute() {
        let mut cache = StatsCache::new(8);
        let mut computations = 0;

        let first = cache.get_or_compute(key("doc1"), false, "2024-05-01", || {
            computations += 1;
            result_with_pv(1)
        });
        // Second call the same day must return the cached object even though
        // the compute closure would now produce something different.
        let second = cache.get_or_compute(key("doc1"), false, "2024-05-01", || {
            computations += 1;
            result_with_pv(99)
        });

        assert_eq!(computations, 1);
        assert_eq!(first, second);
        assert_eq!(second.total_pv, 1);
    }

    #[test]
    fn test_day_rollover_recomputes() {
        let mut cache = StatsCache::new(8);
        cache.get_or_compute(key("doc1"), false, "2024-05-01", || result_with_pv(1));
        let rolled = cache.get_or_compute(key("doc1"), false, "2024-05-02", || result_with_pv(2));
        assert_eq!(rolled.total_pv, 2);
    }

    #[test]
    fn test_force_overwrites_fresh_entry() {
        let mut cache = StatsCache::new(8);
        cache.get_or_compute(key("doc1"), false, "2024-05-01", || result_with_pv(1));
        let forced = cache.get_or_compute(key("doc1"), true, "2024-05-01", || result_with_pv(5));
        assert_eq!(forced.total_pv, 5);

        // The forced result replaces the cached one.
        let after = cache.get_or_compute(key("doc1"), false, "2024-05-01", || result_with_pv(9));
        assert_eq!(after.total_pv, 5);
    }

    #[test]
    fn test_views_cache_independently() {
        let mut cache = StatsCache::new(8);
        let windowed = CacheKey {
            doc_id: "doc1".into(),
            view: View::TrailingWindow(10),
        };
        cache.get_or_compute(key("doc1"), false, "2024-05-01", || result_with_pv(1));
        let other = cache.get_or_compute(windowed, false, "2024-05-01", || result_with_pv(2));
        assert_eq!(other.total_pv, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_eviction_respects_capacity() {
        let mut cache = StatsCache::new(2);
        cache.get_or_compute(key("a"), false, "2024-05-01", || result_with_pv(1));
        cache.get_or_compute(key("b"), false, "2024-05-01", || result_with_pv(2));
        // Touch "a" so "b" becomes the eviction candidate.
        cache.get_or_compute(key("a"), false, "2024-05-01", || result_with_pv(0));
        cache.get_or_compute(key("c"), false, "2024-05-01", || result_with_pv(3));

        assert_eq!(cache.len(), 2);
        let mut recomputed = false;
        cache.get_or_compute(key("b"), false, "2024-05-01", || {
            recomputed = true;
            result_with_pv(2)
        });
        assert!(recomputed, "evicted entry should recompute");

        let mut c_recomputed = false;
        cache.get_or_compute(key("c"), false, "2024-05-01", || {
            c_recomputed = true;
            result_with_pv(0)
        });
        assert!(!c_recomputed, "c should still be cached");
    }
}
