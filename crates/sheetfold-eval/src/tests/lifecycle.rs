use std::cell::Cell;
use std::rc::Rc;

use sheetfold_common::{ExcelErrorKind, LiteralValue};

use super::{n, numbers, session};
use crate::collect::Ownership;
use crate::config::CollectConfig;
use crate::flags::CollectFlags;
use crate::rangefunc;
use crate::test_workbook::{TestWorkbook, pos_a1, range};

fn sum_of(cache: &crate::CollectCache, wb: &TestWorkbook, a1: &str) -> LiteralValue {
    cache
        .float_range_function(
            wb,
            &[range(a1)],
            &pos_a1("Z1"),
            rangefunc::sum,
            CollectFlags::IGNORE_BLANKS,
            ExcelErrorKind::Value,
        )
        .unwrap_or_else(LiteralValue::from)
}

#[test]
fn subscribes_lazily_and_once() {
    let (signal, cache) = session(CollectConfig::default());
    let wb = TestWorkbook::new().with_column(0, "A1", numbers(1..=40));
    assert!(!cache.is_initialized());
    assert_eq!(signal.listener_count(), 0);

    sum_of(&cache, &wb, "A1:A40");
    sum_of(&cache, &wb, "A1:A20");
    assert!(cache.is_initialized());
    assert_eq!(signal.listener_count(), 1);
}

#[test]
fn recalc_signal_drops_stale_entries() {
    let (signal, cache) = session(CollectConfig::default());
    let wb = TestWorkbook::new().with_column(0, "A1", numbers(1..=40));

    assert_eq!(sum_of(&cache, &wb, "A1:A40"), n(820.0));
    wb.set_value(0, "A1", n(101.0));
    // Still the cached epoch.
    assert_eq!(sum_of(&cache, &wb, "A1:A40"), n(820.0));

    signal.emit();
    assert!(!cache.is_initialized());
    assert_eq!(cache.total_size(), 0);
    assert_eq!(signal.listener_count(), 0);
    assert_eq!(cache.stats().teardowns, 1);

    assert_eq!(sum_of(&cache, &wb, "A1:A40"), n(920.0));
    assert_eq!(signal.listener_count(), 1);
}

#[test]
fn explicit_teardown_is_idempotent() {
    let (signal, cache) = session(CollectConfig::default());
    let wb = TestWorkbook::new().with_column(0, "A1", numbers(1..=40));
    sum_of(&cache, &wb, "A1:A40");
    cache.teardown();
    cache.teardown();
    assert_eq!(cache.stats().teardowns, 1);
    assert_eq!(signal.listener_count(), 0);
    // Nothing left to notify.
    signal.emit();
    assert_eq!(cache.stats().teardowns, 1);
}

#[test]
fn dropped_cache_leaves_no_live_listener() {
    let (signal, cache) = session(CollectConfig::default());
    let wb = TestWorkbook::new().with_column(0, "A1", numbers(1..=40));
    sum_of(&cache, &wb, "A1:A40");
    drop(cache);
    assert_eq!(signal.listener_count(), 0);
    signal.emit();
}

#[test]
fn over_budget_clears_both_caches_on_next_lookup() {
    // Budget of 64 units: one 40-cell entry fits, two do not.
    let cfg = CollectConfig {
        rows_limit: 2,
        ..CollectConfig::default()
    };
    let (signal, cache) = session(cfg);
    let wb = TestWorkbook::new()
        .with_column(0, "A1", numbers(1..=40))
        .with_column(0, "B1", numbers(1..=40));

    sum_of(&cache, &wb, "A1:A40");
    cache
        .collect_float_pairs(
            &wb,
            &range("A1:A4"),
            &range("B1:B4"),
            &pos_a1("Z1"),
            CollectFlags::empty(),
            Ownership::Shared,
        )
        .unwrap();
    assert_eq!(cache.total_size(), 41 + 5);
    sum_of(&cache, &wb, "A1:A40");
    assert_eq!(cache.stats().hits, 1);

    sum_of(&cache, &wb, "B1:B40");
    assert_eq!(cache.total_size(), 41 + 5 + 41);

    // Would have been a hit.
    sum_of(&cache, &wb, "A1:A40");
    let stats = cache.stats();
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 4);
    assert_eq!(cache.entry_counts(), (1, 0));
    assert_eq!(cache.total_size(), 41);
    // Eviction keeps the subscription.
    assert_eq!(signal.listener_count(), 1);
}

#[test]
fn nested_fill_of_the_same_key_is_replaced_not_leaked() {
    let (_signal, cache) = session(CollectConfig::default());
    let depth = Rc::new(Cell::new(0u32));
    let wb = TestWorkbook::new()
        .with_column(0, "A1", numbers(1..=40))
        .with_formula(0, "A20", {
            let cache = Rc::clone(&cache);
            let depth = Rc::clone(&depth);
            move |wb, _| {
                if depth.get() == 0 {
                    depth.set(1);
                    // Collects A1:A40 again while the outer collection of
                    // the same range is still walking it.
                    let inner = sum_of(&cache, wb, "A1:A40");
                    depth.set(0);
                    assert_eq!(inner, n(820.0));
                }
                n(20.0)
            }
        });

    assert_eq!(sum_of(&cache, &wb, "A1:A40"), n(820.0));
    let stats = cache.stats();
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.replacements, 1);
    assert_eq!(cache.entry_counts(), (1, 0));
    assert_eq!(cache.total_size(), 41);

    let reads = wb.reads();
    assert_eq!(sum_of(&cache, &wb, "A1:A40"), n(820.0));
    assert_eq!(wb.reads(), reads);
}

#[test]
fn signal_fired_during_collection_starts_a_new_epoch() {
    let (signal, cache) = session(CollectConfig::default());
    let fired = Rc::new(Cell::new(false));
    let wb = TestWorkbook::new()
        .with_column(0, "A1", numbers(1..=40))
        .with_column(0, "B1", numbers(1..=40))
        .with_formula(0, "B20", {
            let signal = Rc::clone(&signal);
            let fired = Rc::clone(&fired);
            move |wb, _| {
                if !fired.replace(true) {
                    // B1 was already read by the walk in progress.
                    wb.set_value(0, "B1", n(100.0));
                    signal.emit();
                }
                n(20.0)
            }
        });

    sum_of(&cache, &wb, "A1:A40");
    // The caller still gets what was collected.
    assert_eq!(sum_of(&cache, &wb, "B1:B40"), n(820.0));
    let stats = cache.stats();
    assert_eq!(stats.teardowns, 1);
    assert_eq!(stats.stale_fills, 1);
    // Neither epoch kept anything.
    assert_eq!(cache.entry_counts(), (0, 0));
    assert_eq!(cache.total_size(), 0);
    assert!(!cache.is_initialized());
    assert_eq!(signal.listener_count(), 0);

    let reads = wb.reads();
    assert_eq!(sum_of(&cache, &wb, "B1:B40"), n(919.0));
    assert!(wb.reads() > reads, "next request must walk the range again");
    assert_eq!(cache.entry_counts(), (1, 0));
    assert_eq!(signal.listener_count(), 1);
}

#[test]
fn pair_fill_straddling_a_signal_is_not_stored() {
    let (signal, cache) = session(CollectConfig::default());
    let fired = Rc::new(Cell::new(false));
    let wb = TestWorkbook::new()
        .with_column(0, "A1", numbers(1..=8))
        .with_column(0, "B1", numbers(1..=8))
        .with_formula(0, "B8", {
            let signal = Rc::clone(&signal);
            let fired = Rc::clone(&fired);
            move |wb, _| {
                if !fired.replace(true) {
                    wb.set_value(0, "A1", n(10.0));
                    signal.emit();
                }
                n(8.0)
            }
        });
    let sumproduct = |cache: &crate::CollectCache| {
        cache
            .float_range_function2d(
                &wb,
                &range("A1:A8"),
                &range("B1:B8"),
                &pos_a1("Z1"),
                rangefunc::sumproduct,
                CollectFlags::empty(),
                ExcelErrorKind::Value,
            )
            .unwrap()
    };

    // 1*1 + 2*2 + ... + 8*8
    assert_eq!(sumproduct(&cache), n(204.0));
    assert_eq!(cache.stats().stale_fills, 1);
    assert_eq!(cache.entry_counts(), (0, 0));

    assert_eq!(sumproduct(&cache), n(213.0));
    assert_eq!(cache.entry_counts(), (0, 1));
    assert_eq!(cache.stats().hits, 0);
}
