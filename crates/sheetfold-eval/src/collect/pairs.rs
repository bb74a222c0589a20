//! Collecting two ranges into element-aligned arrays.

use sheetfold_common::{EvalPos, ExcelError};

use super::merge::{compact_by_indices, merge_sorted_dedup};
use super::{Floats, RawFloats, collect_raw};
use crate::flags::CollectFlags;
use crate::traits::{ArgExpr, EvaluationContext};

/// Outcome of a paired collection that did not fail with an error.
#[derive(Clone, Debug, PartialEq)]
pub enum FloatPairs {
    /// `xs[i]` and `ys[i]` come from the same offset in their ranges.
    Matched { xs: Floats, ys: Floats },
    /// The ranges visited different numbers of elements.
    Mismatch,
}

impl FloatPairs {
    /// Number of aligned pairs, or `None` on a mismatch.
    pub fn len(&self) -> Option<usize> {
        match self {
            FloatPairs::Matched { xs, .. } => Some(xs.len()),
            FloatPairs::Mismatch => None,
        }
    }

    pub fn as_slices(&self) -> Option<(&[f64], &[f64])> {
        match self {
            FloatPairs::Matched { xs, ys } => Some((xs.as_slice(), ys.as_slice())),
            FloatPairs::Mismatch => None,
        }
    }
}

/// Collect `x` and `y` and drop every position skipped in either.
///
/// Sizes are compared before compaction: two ranges of different shapes are
/// a mismatch even if the same number of values survive in each.
pub fn collect_float_pairs_uncached<C: EvaluationContext + ?Sized>(
    ctx: &C,
    x: &ArgExpr,
    y: &ArgExpr,
    pos: &EvalPos,
    flags: CollectFlags,
) -> Result<FloatPairs, ExcelError> {
    let flags = (flags | CollectFlags::TRACK_MISSING) - CollectFlags::SORT;
    let RawFloats {
        values: mut xs,
        missing: mx,
    } = collect_raw(ctx, std::slice::from_ref(x), pos, flags)?;
    let RawFloats {
        values: mut ys,
        missing: my,
    } = collect_raw(ctx, std::slice::from_ref(y), pos, flags)?;

    if xs.len() != ys.len() {
        return Ok(FloatPairs::Mismatch);
    }

    let missing = merge_sorted_dedup(&mx, &my);
    compact_by_indices(&mut xs, &missing);
    compact_by_indices(&mut ys, &missing);
    Ok(FloatPairs::Matched {
        xs: Floats::Owned(xs),
        ys: Floats::Owned(ys),
    })
}
