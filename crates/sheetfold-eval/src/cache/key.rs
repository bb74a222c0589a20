//! Cache keys for collected ranges.
//!
//! A key is a range resolved at the evaluation position (so `A1:A40` and a
//! relative reference landing on the same cells collide) plus the policy bits
//! that affect the collected array.

use sheetfold_common::{EvalPos, GridRect, SheetId};

use crate::config::CollectConfig;
use crate::flags::CollectFlags;
use crate::traits::ArgExpr;

/// A 2-D range on one sheet, independent of how it was written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RangeKey {
    pub sheet: SheetId,
    pub rect: GridRect,
}

impl RangeKey {
    /// Fingerprint `arg` at `pos`, or `None` when it should not be cached:
    /// not a single range, spanning sheets, or too small to be worth it.
    pub fn for_arg(arg: &ArgExpr, pos: &EvalPos, cfg: &CollectConfig) -> Option<Self> {
        let norm = arg.as_range()?.normalize(pos);
        if norm.is_3d() {
            return None;
        }
        let (h, w) = (norm.rect.height(), norm.rect.width());
        if h < cfg.min_cached_side
            && w < cfg.min_cached_side
            && (h as u64 * w as u64) < cfg.min_cached_cells as u64
        {
            return None;
        }
        Some(Self {
            sheet: norm.sheet,
            rect: norm.rect,
        })
    }
}

/// Key of the single-range cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SingleKey {
    flags: CollectFlags,
    pub range: RangeKey,
}

impl SingleKey {
    pub fn new(range: RangeKey, flags: CollectFlags) -> Self {
        Self {
            flags: flags.key_bits(),
            range,
        }
    }

    pub fn flags(&self) -> CollectFlags {
        self.flags
    }

    /// The same range under a different policy.
    pub fn with_flags(self, flags: CollectFlags) -> Self {
        Self::new(self.range, flags)
    }
}

/// Key of the paired-range cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PairKey {
    flags: CollectFlags,
    pub x: RangeKey,
    pub y: RangeKey,
}

impl PairKey {
    pub fn new(x: RangeKey, y: RangeKey, flags: CollectFlags) -> Self {
        Self {
            flags: flags.key_bits(),
            x,
            y,
        }
    }

    pub fn flags(&self) -> CollectFlags {
        self.flags
    }
}
