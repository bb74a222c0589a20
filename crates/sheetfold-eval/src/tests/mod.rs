mod lifecycle;

use std::rc::Rc;

use sheetfold_common::LiteralValue;

use crate::cache::{CollectCache, RecalcSignal};
use crate::config::CollectConfig;

fn n(x: f64) -> LiteralValue {
    LiteralValue::Number(x)
}

fn numbers(range: std::ops::RangeInclusive<i32>) -> Vec<LiteralValue> {
    range.map(|i| n(i as f64)).collect()
}

pub(crate) fn session(cfg: CollectConfig) -> (Rc<RecalcSignal>, Rc<CollectCache>) {
    let signal = RecalcSignal::new();
    let cache = CollectCache::new(cfg, &signal);
    (signal, cache)
}
