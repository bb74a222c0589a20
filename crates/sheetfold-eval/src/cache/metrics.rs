//! Lightweight counters for collection cache behaviour

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters updated as the caches are used.
#[derive(Default, Debug)]
pub struct CacheMetrics {
    pub hits: AtomicUsize,
    pub misses: AtomicUsize,
    /// Inserts that found the key already filled by nested evaluation.
    pub replacements: AtomicUsize,
    pub evictions: AtomicUsize,
    pub teardowns: AtomicUsize,
    /// Fills computed across a teardown and returned without being stored.
    pub stale_fills: AtomicUsize,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_replacement(&self) {
        self.replacements.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_teardown(&self) {
        self.teardowns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_stale_fill(&self) {
        self.stale_fills.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            replacements: self.replacements.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            teardowns: self.teardowns.load(Ordering::Relaxed),
            stale_fills: self.stale_fills.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.replacements.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.teardowns.store(0, Ordering::Relaxed);
        self.stale_fills.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub replacements: usize,
    pub evictions: usize,
    pub teardowns: usize,
    pub stale_fills: usize,
}

impl CacheStats {
    /// Fraction of cacheable lookups served from cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}
