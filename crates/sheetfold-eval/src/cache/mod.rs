//! Cached collection.
//!
//! A [`CollectCache`] belongs to one recalculation session. It subscribes to
//! the session's [`RecalcSignal`] on first use and drops everything when the
//! signal fires. Collection may re-enter the cache through nested formula
//! evaluation, so the store is only borrowed around individual lookups and
//! inserts, never across a call into the evaluation context.

pub mod key;
pub mod metrics;
pub mod signal;
pub mod store;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use sheetfold_common::{EvalPos, ExcelError, ExcelErrorKind, LiteralValue};

use crate::collect::merge::MissingIndexList;
use crate::collect::{
    FloatCollection, FloatPairs, Floats, Ownership, collect_float_pairs_uncached,
    collect_floats_uncached, collect_raw,
};
use crate::config::CollectConfig;
use crate::flags::CollectFlags;
use crate::traits::{ArgExpr, EvaluationContext};

pub use key::{PairKey, RangeKey, SingleKey};
pub use metrics::{CacheMetrics, CacheStats};
pub use signal::{HandlerId, RecalcListener, RecalcSignal};
pub use store::{CacheStore, InsertOutcome, PairData, PairEntry, SingleEntry};

struct CacheState {
    store: CacheStore,
    handler: HandlerId,
}

pub struct CollectCache {
    config: CollectConfig,
    signal: Rc<RecalcSignal>,
    self_ref: Weak<CollectCache>,
    state: RefCell<Option<CacheState>>,
    // Bumped on every teardown. A fill that started under an older epoch
    // is returned to its caller but not stored.
    epoch: Cell<u64>,
    metrics: CacheMetrics,
}

impl CollectCache {
    /// Create a cache for the session that owns `signal`. Nothing is
    /// allocated or subscribed until the first cacheable request.
    pub fn new(config: CollectConfig, signal: &Rc<RecalcSignal>) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            config,
            signal: Rc::clone(signal),
            self_ref: me.clone(),
            state: RefCell::new(None),
            epoch: Cell::new(0),
            metrics: CacheMetrics::new(),
        })
    }

    pub fn config(&self) -> &CollectConfig {
        &self.config
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    /// Whether the caches exist and the signal subscription is live.
    pub fn is_initialized(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Combined size of both caches in budget units.
    pub fn total_size(&self) -> usize {
        self.state
            .borrow()
            .as_ref()
            .map_or(0, |s| s.store.total_size())
    }

    /// Number of (single, pair) entries currently stored.
    pub fn entry_counts(&self) -> (usize, usize) {
        self.state
            .borrow()
            .as_ref()
            .map_or((0, 0), |s| (s.store.single_len(), s.store.pair_len()))
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut CacheStore) -> R) -> R {
        let mut state = self.state.borrow_mut();
        let state = state.get_or_insert_with(|| {
            let listener: Weak<dyn RecalcListener> = self.self_ref.clone();
            let handler = self.signal.connect(listener);
            #[cfg(feature = "tracing")]
            tracing::debug!(?handler, "collection caches initialised");
            CacheState {
                store: CacheStore::default(),
                handler,
            }
        });
        f(&mut state.store)
    }

    /// Clear both caches when their combined size is over budget. The signal
    /// subscription is kept.
    pub fn evict_if_over_budget(&self) -> bool {
        let budget = self.config.size_budget();
        let mut state = self.state.borrow_mut();
        let Some(state) = state.as_mut() else {
            return false;
        };
        if state.store.total_size() <= budget {
            return false;
        }
        #[cfg(feature = "tracing")]
        tracing::info!(
            total = state.store.total_size(),
            budget,
            singles = state.store.single_len(),
            pairs = state.store.pair_len(),
            "collection caches over budget, clearing"
        );
        state.store.clear();
        self.metrics.inc_eviction();
        true
    }

    /// Unsubscribe and drop both caches. The next cacheable request starts
    /// a fresh epoch.
    pub fn teardown(&self) {
        let Some(state) = self.state.borrow_mut().take() else {
            return;
        };
        self.signal.disconnect(state.handler);
        self.epoch.set(self.epoch.get() + 1);
        self.metrics.inc_teardown();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            freed = state.store.total_size(),
            "collection caches torn down"
        );
    }

    fn single_key(
        &self,
        args: &[ArgExpr],
        pos: &EvalPos,
        flags: CollectFlags,
    ) -> Option<SingleKey> {
        if !self.config.cache_enabled || !flags.cacheable() {
            return None;
        }
        let [arg] = args else {
            return None;
        };
        RangeKey::for_arg(arg, pos, &self.config).map(|r| SingleKey::new(r, flags))
    }

    fn pair_key(
        &self,
        x: &ArgExpr,
        y: &ArgExpr,
        pos: &EvalPos,
        flags: CollectFlags,
    ) -> Option<PairKey> {
        if !self.config.cache_enabled || !flags.cacheable() {
            return None;
        }
        let kx = RangeKey::for_arg(x, pos, &self.config)?;
        let ky = RangeKey::for_arg(y, pos, &self.config)?;
        Some(PairKey::new(kx, ky, flags))
    }

    /// Whether a fill that started at `epoch` may still be stored.
    fn same_epoch(&self, epoch: u64) -> bool {
        if self.epoch.get() == epoch {
            return true;
        }
        self.metrics.inc_stale_fill();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            epoch,
            now = self.epoch.get(),
            "caches torn down during fill, not storing"
        );
        false
    }

    fn note_insert(&self, outcome: InsertOutcome) {
        if let InsertOutcome::Replaced { old_size } = outcome {
            self.metrics.inc_replacement();
            #[cfg(feature = "tracing")]
            tracing::debug!(old_size, "entry filled by nested evaluation replaced");
            #[cfg(not(feature = "tracing"))]
            let _ = old_size;
        }
    }

    /// Collect `args` into a flat numeric array under `flags`.
    ///
    /// A single range that is large enough is served from, or stored in, the
    /// single-range cache; cached errors are returned again on later hits.
    /// `ownership` only matters for cached results: `Shared` hands out the
    /// cache's own storage, `Owned` a private copy.
    pub fn collect_floats<C: EvaluationContext + ?Sized>(
        &self,
        ctx: &C,
        args: &[ArgExpr],
        pos: &EvalPos,
        flags: CollectFlags,
        ownership: Ownership,
    ) -> Result<FloatCollection, ExcelError> {
        let Some(key) = self.single_key(args, pos, flags) else {
            return collect_floats_uncached(ctx, args, pos, flags);
        };

        self.evict_if_over_budget();
        if let Some(entry) = self.with_store(|s| s.lookup_single_or_fallback(&key, flags)) {
            self.metrics.inc_hit();
            #[cfg(feature = "tracing")]
            tracing::trace!(range = %key.range.rect, "single cache hit");
            return single_result(&entry, ownership);
        }
        self.metrics.inc_miss();
        let epoch = self.epoch.get();

        // Cacheable requests never track missing positions, so the raw
        // collection is already compact.
        let entry = match collect_raw(ctx, args, pos, flags) {
            Ok(raw) => SingleEntry::values(raw.values),
            Err(e) => SingleEntry::error(e),
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(range = %key.range.rect, ok = entry.outcome.is_ok(), "single cache miss");
        if self.same_epoch(epoch) {
            let outcome = self.with_store(|s| s.insert_single(key, entry.clone()));
            self.note_insert(outcome);
        }
        single_result(&entry, ownership)
    }

    /// [`collect_floats`](Self::collect_floats) for a single argument.
    pub fn collect_floats_value<C: EvaluationContext + ?Sized>(
        &self,
        ctx: &C,
        value: &ArgExpr,
        pos: &EvalPos,
        flags: CollectFlags,
        ownership: Ownership,
    ) -> Result<FloatCollection, ExcelError> {
        self.collect_floats(ctx, std::slice::from_ref(value), pos, flags, ownership)
    }

    /// Collect `x` and `y` into element-aligned arrays.
    ///
    /// Positions skipped on either side are dropped from both. Two ranges
    /// that visit different numbers of elements give
    /// [`FloatPairs::Mismatch`].
    pub fn collect_float_pairs<C: EvaluationContext + ?Sized>(
        &self,
        ctx: &C,
        x: &ArgExpr,
        y: &ArgExpr,
        pos: &EvalPos,
        flags: CollectFlags,
        ownership: Ownership,
    ) -> Result<FloatPairs, ExcelError> {
        let flags = flags - CollectFlags::TRACK_MISSING;
        let Some(key) = self.pair_key(x, y, pos, flags) else {
            return collect_float_pairs_uncached(ctx, x, y, pos, flags);
        };

        self.evict_if_over_budget();
        if let Some(entry) = self.with_store(|s| s.lookup_pair(&key)) {
            self.metrics.inc_hit();
            #[cfg(feature = "tracing")]
            tracing::trace!(x = %key.x.rect, y = %key.y.rect, "pair cache hit");
            return pair_result(&entry, ownership);
        }
        self.metrics.inc_miss();
        let epoch = self.epoch.get();

        let outcome =
            collect_float_pairs_uncached(ctx, x, y, pos, flags).map(|pairs| match pairs {
                FloatPairs::Matched { xs, ys } => PairData::Matched {
                    xs: Arc::from(xs.into_vec()),
                    ys: Arc::from(ys.into_vec()),
                },
                FloatPairs::Mismatch => PairData::Mismatch,
            });
        let entry = PairEntry { outcome };
        if self.same_epoch(epoch) {
            let inserted = self.with_store(|s| s.insert_pair(key, entry.clone()));
            self.note_insert(inserted);
        }
        pair_result(&entry, ownership)
    }

    /// Collect `args`, then reduce. A reducer returning `None` becomes
    /// `func_error`.
    pub fn float_range_function<C, F>(
        &self,
        ctx: &C,
        args: &[ArgExpr],
        pos: &EvalPos,
        reducer: F,
        flags: CollectFlags,
        func_error: ExcelErrorKind,
    ) -> Result<LiteralValue, ExcelError>
    where
        C: EvaluationContext + ?Sized,
        F: FnOnce(&[f64]) -> Option<f64>,
    {
        let collected = self.collect_floats(ctx, args, pos, flags, Ownership::Shared)?;
        reducer(&collected.values)
            .map(LiteralValue::Number)
            .ok_or_else(|| ExcelError::new(func_error).at(pos))
    }

    /// Collect a pair, then reduce. Mismatched sizes give `#N/A`; no pairs
    /// at all or a reducer returning `None` give `func_error`.
    pub fn float_range_function2d<C, F>(
        &self,
        ctx: &C,
        x: &ArgExpr,
        y: &ArgExpr,
        pos: &EvalPos,
        reducer: F,
        flags: CollectFlags,
        func_error: ExcelErrorKind,
    ) -> Result<LiteralValue, ExcelError>
    where
        C: EvaluationContext + ?Sized,
        F: FnOnce(&[f64], &[f64]) -> Option<f64>,
    {
        let pairs = self.collect_float_pairs(ctx, x, y, pos, flags, Ownership::Shared)?;
        let Some((xs, ys)) = pairs.as_slices() else {
            return Err(ExcelError::new(ExcelErrorKind::Na).at(pos));
        };
        if xs.is_empty() {
            return Err(ExcelError::new(func_error).at(pos));
        }
        reducer(xs, ys)
            .map(LiteralValue::Number)
            .ok_or_else(|| ExcelError::new(func_error).at(pos))
    }
}

impl RecalcListener for CollectCache {
    fn caches_cleared(&self) {
        self.teardown();
    }
}

fn single_result(
    entry: &SingleEntry,
    ownership: Ownership,
) -> Result<FloatCollection, ExcelError> {
    match &entry.outcome {
        Ok(values) => Ok(FloatCollection {
            values: Floats::from_shared(values, ownership),
            missing: MissingIndexList::new(),
        }),
        Err(e) => Err(e.clone()),
    }
}

fn pair_result(entry: &PairEntry, ownership: Ownership) -> Result<FloatPairs, ExcelError> {
    match &entry.outcome {
        Ok(PairData::Matched { xs, ys }) => Ok(FloatPairs::Matched {
            xs: Floats::from_shared(xs, ownership),
            ys: Floats::from_shared(ys, ownership),
        }),
        Ok(PairData::Mismatch) => Ok(FloatPairs::Mismatch),
        Err(e) => Err(e.clone()),
    }
}
