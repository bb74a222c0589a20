//! Keyed stores for collected arrays with running size accounting.

use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use sheetfold_common::ExcelError;

use super::key::{PairKey, SingleKey};
use crate::flags::CollectFlags;

/// Budget units an entry occupies. Every entry costs at least one unit so
/// cached errors are not free.
pub trait CacheSize {
    fn cache_size(&self) -> usize;
}

/// Cached outcome of collecting one range.
#[derive(Clone, Debug)]
pub struct SingleEntry {
    pub outcome: Result<Arc<[f64]>, ExcelError>,
}

impl SingleEntry {
    pub fn values(values: Vec<f64>) -> Self {
        Self {
            outcome: Ok(Arc::from(values)),
        }
    }

    pub fn error(err: ExcelError) -> Self {
        Self { outcome: Err(err) }
    }
}

impl CacheSize for SingleEntry {
    fn cache_size(&self) -> usize {
        self.outcome.as_ref().map_or(0, |v| v.len()) + 1
    }
}

/// Reconciled pair of arrays, or the marker for ranges of unequal size.
#[derive(Clone, Debug)]
pub enum PairData {
    Matched { xs: Arc<[f64]>, ys: Arc<[f64]> },
    Mismatch,
}

/// Cached outcome of collecting two ranges together.
#[derive(Clone, Debug)]
pub struct PairEntry {
    pub outcome: Result<PairData, ExcelError>,
}

impl CacheSize for PairEntry {
    fn cache_size(&self) -> usize {
        match &self.outcome {
            Ok(PairData::Matched { xs, .. }) => xs.len() + 1,
            Ok(PairData::Mismatch) | Err(_) => 1,
        }
    }
}

/// Map from key to entry. Sizes are tracked by the owner.
pub struct EntryCache<K, E> {
    map: FxHashMap<K, E>,
}

impl<K: Hash + Eq, E: CacheSize> EntryCache<K, E> {
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    /// Exact-match lookup.
    pub fn get(&self, key: &K) -> Option<&E> {
        self.map.get(key)
    }

    /// Store `entry`, handing back whatever was stored under `key` before.
    pub fn insert_or_replace(&mut self, key: K, entry: E) -> Option<E> {
        self.map.insert(key, entry)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Hash + Eq, E: CacheSize> Default for EntryCache<K, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Both caches plus the total size they account for.
#[derive(Default)]
pub struct CacheStore {
    single: EntryCache<SingleKey, SingleEntry>,
    pair: EntryCache<PairKey, PairEntry>,
    total_size: usize,
}

/// What an insert did to the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An entry for the key appeared since the caller's miss (nested
    /// evaluation filled it) and was replaced.
    Replaced { old_size: usize },
}

impl CacheStore {
    pub fn lookup_single(&self, key: &SingleKey) -> Option<SingleEntry> {
        self.single.get(key).cloned()
    }

    /// Exact lookup, then for an order-irrelevant request the sorted
    /// variant of the same key.
    pub fn lookup_single_or_fallback(
        &self,
        key: &SingleKey,
        requested: CollectFlags,
    ) -> Option<SingleEntry> {
        self.lookup_single(key).or_else(|| {
            if requested.contains(CollectFlags::ORDER_IRRELEVANT)
                && !key.flags().contains(CollectFlags::SORT)
            {
                self.lookup_single(&key.with_flags(key.flags() | CollectFlags::SORT))
            } else {
                None
            }
        })
    }

    pub fn insert_single(&mut self, key: SingleKey, entry: SingleEntry) -> InsertOutcome {
        let size = entry.cache_size();
        let old = self.single.insert_or_replace(key, entry);
        self.account(size, old.as_ref().map(CacheSize::cache_size))
    }

    pub fn lookup_pair(&self, key: &PairKey) -> Option<PairEntry> {
        self.pair.get(key).cloned()
    }

    pub fn insert_pair(&mut self, key: PairKey, entry: PairEntry) -> InsertOutcome {
        let size = entry.cache_size();
        let old = self.pair.insert_or_replace(key, entry);
        self.account(size, old.as_ref().map(CacheSize::cache_size))
    }

    fn account(&mut self, added: usize, removed: Option<usize>) -> InsertOutcome {
        match removed {
            Some(old_size) => {
                self.total_size = self.total_size - old_size + added;
                InsertOutcome::Replaced { old_size }
            }
            None => {
                self.total_size += added;
                InsertOutcome::Inserted
            }
        }
    }

    /// Drop every entry in both caches.
    pub fn clear(&mut self) {
        self.single.clear();
        self.pair.clear();
        self.total_size = 0;
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn single_len(&self) -> usize {
        self.single.len()
    }

    pub fn pair_len(&self) -> usize {
        self.pair.len()
    }
}
