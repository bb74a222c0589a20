//! Turning argument lists into flat numeric arrays.
//!
//! This module holds the uncached collectors. [`crate::cache::CollectCache`]
//! wraps them with lookup and storage.

pub mod merge;
pub mod pairs;
pub mod strings;

use std::ops::Deref;
use std::sync::Arc;

use sheetfold_common::{EvalPos, ExcelError, LiteralValue, parse_number_invariant};

use crate::flags::CollectFlags;
use crate::traits::{ArgExpr, EvaluationContext};
use merge::{MissingIndexList, compact_by_indices};

pub use pairs::{FloatPairs, collect_float_pairs_uncached};
pub use strings::{collect_strings, string_range_function};

/// How the caller wants to hold a collected array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Ownership {
    /// A read-only view that may share storage with the cache.
    #[default]
    Shared,
    /// A private, mutable copy.
    Owned,
}

/// A collected array, either shared with the cache or owned by the caller.
#[derive(Clone, Debug)]
pub enum Floats {
    Shared(Arc<[f64]>),
    Owned(Vec<f64>),
}

impl Floats {
    /// Hand out `values` the way the caller asked for it.
    pub(crate) fn from_shared(values: &Arc<[f64]>, ownership: Ownership) -> Self {
        match ownership {
            Ownership::Shared => Floats::Shared(Arc::clone(values)),
            Ownership::Owned => Floats::Owned(values.to_vec()),
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        match self {
            Floats::Shared(a) => a,
            Floats::Owned(v) => v,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Floats::Shared(_))
    }

    /// Take the values as a vector, copying only when shared.
    pub fn into_vec(self) -> Vec<f64> {
        match self {
            Floats::Shared(a) => a.to_vec(),
            Floats::Owned(v) => v,
        }
    }
}

impl Deref for Floats {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        self.as_slice()
    }
}

impl PartialEq for Floats {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl From<Vec<f64>> for Floats {
    fn from(v: Vec<f64>) -> Self {
        Floats::Owned(v)
    }
}

/// Result of [`collect_floats_uncached`] and its cached counterpart.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatCollection {
    pub values: Floats,
    /// Positions (in visiting order) of skipped elements. Only filled under
    /// [`CollectFlags::TRACK_MISSING`].
    pub missing: MissingIndexList,
}

impl FloatCollection {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Classify one element under `flags`.
///
/// `Ok(None)` means the element is skipped.
pub(crate) fn classify(
    v: &LiteralValue,
    at: &EvalPos,
    flags: CollectFlags,
) -> Result<Option<f64>, ExcelError> {
    match v {
        LiteralValue::Empty => {
            if flags.contains(CollectFlags::IGNORE_BLANKS) {
                Ok(None)
            } else if flags.contains(CollectFlags::ZERO_BLANKS) {
                Ok(Some(0.0))
            } else {
                Err(ExcelError::value_at(at))
            }
        }
        LiteralValue::Boolean(b) => {
            if flags.contains(CollectFlags::IGNORE_BOOLS) {
                Ok(None)
            } else if flags.contains(CollectFlags::ZEROONE_BOOLS) {
                Ok(Some(if *b { 1.0 } else { 0.0 }))
            } else {
                Err(ExcelError::value_at(at))
            }
        }
        LiteralValue::Error(e) => {
            if flags.contains(CollectFlags::IGNORE_ERRORS) {
                Ok(None)
            } else if flags.contains(CollectFlags::ZERO_ERRORS) {
                Ok(Some(0.0))
            } else {
                Err(e.clone())
            }
        }
        LiteralValue::Text(s) => {
            if flags.contains(CollectFlags::COERCE_STRINGS)
                && let Some(n) = parse_number_invariant(s)
            {
                return Ok(Some(n));
            }
            if flags.contains(CollectFlags::IGNORE_STRINGS) {
                Ok(None)
            } else if flags.contains(CollectFlags::ZERO_STRINGS) {
                Ok(Some(0.0))
            } else {
                Err(ExcelError::value_at(at))
            }
        }
        LiteralValue::Array(_) => Err(ExcelError::value_at(at)
            .with_message("nested array where a scalar was expected")),
        other => other
            .as_serial_number()
            .map(Some)
            .ok_or_else(|| ExcelError::value_at(at)),
    }
}

/// Collection before compaction. Under `TRACK_MISSING` every visited element
/// owns a slot; skipped ones hold `0.0` and are listed in `missing`.
pub(crate) struct RawFloats {
    pub values: Vec<f64>,
    pub missing: MissingIndexList,
}

pub(crate) fn collect_raw<C: EvaluationContext + ?Sized>(
    ctx: &C,
    args: &[ArgExpr],
    pos: &EvalPos,
    flags: CollectFlags,
) -> Result<RawFloats, ExcelError> {
    let track = flags.contains(CollectFlags::TRACK_MISSING);
    let mut values = Vec::new();
    let mut missing = MissingIndexList::new();

    ctx.iterate_argument_values(pos, args, false, flags.iter_flags(), &mut |at, v| {
        match classify(v, at, flags)? {
            Some(x) => values.push(x),
            None if track => {
                missing.push(values.len());
                values.push(0.0);
            }
            None => {}
        }
        Ok(())
    })?;

    if flags.contains(CollectFlags::SORT) && !track {
        values.sort_unstable_by(f64::total_cmp);
    }
    Ok(RawFloats { values, missing })
}

/// Collect `args` without consulting any cache.
///
/// On error nothing is returned but the error of the first element that did
/// not qualify.
pub fn collect_floats_uncached<C: EvaluationContext + ?Sized>(
    ctx: &C,
    args: &[ArgExpr],
    pos: &EvalPos,
    flags: CollectFlags,
) -> Result<FloatCollection, ExcelError> {
    let RawFloats {
        mut values,
        missing,
    } = collect_raw(ctx, args, pos, flags)?;
    compact_by_indices(&mut values, &missing);
    Ok(FloatCollection {
        values: Floats::Owned(values),
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetfold_common::{Coord, ExcelErrorKind};

    fn here() -> EvalPos {
        EvalPos::new(0, Coord::new(7, 2))
    }

    fn cls(v: LiteralValue, flags: CollectFlags) -> Result<Option<f64>, ExcelError> {
        classify(&v, &here(), flags)
    }

    #[test]
    fn numbers_and_dates_are_taken_as_is() {
        assert_eq!(cls(LiteralValue::Int(3), CollectFlags::empty()), Ok(Some(3.0)));
        assert_eq!(cls(LiteralValue::Number(2.5), CollectFlags::empty()), Ok(Some(2.5)));
        let d = chrono::NaiveDate::from_ymd_opt(1900, 1, 2).unwrap();
        assert_eq!(cls(LiteralValue::Date(d), CollectFlags::empty()), Ok(Some(2.0)));
    }

    #[test]
    fn strict_kinds_raise_value_at_element() {
        let err = cls(LiteralValue::Empty, CollectFlags::empty()).unwrap_err();
        assert_eq!(err, ExcelErrorKind::Value);
        let ctx = err.context.unwrap();
        assert_eq!((ctx.row, ctx.col), (Some(7), Some(2)));
        assert!(cls(LiteralValue::Boolean(true), CollectFlags::empty()).is_err());
        assert!(cls(LiteralValue::Text("x".into()), CollectFlags::empty()).is_err());
        assert!(cls(LiteralValue::Array(vec![]), CollectFlags::all()).is_err());
    }

    #[test]
    fn strict_error_propagates_itself() {
        let div = ExcelError::new(ExcelErrorKind::Div);
        assert_eq!(cls(LiteralValue::Error(div.clone()), CollectFlags::empty()), Err(div));
    }

    #[test]
    fn ignore_wins_over_zero() {
        let both = CollectFlags::IGNORE_BOOLS | CollectFlags::ZEROONE_BOOLS;
        assert_eq!(cls(LiteralValue::Boolean(true), both), Ok(None));
        assert_eq!(
            cls(LiteralValue::Boolean(true), CollectFlags::ZEROONE_BOOLS),
            Ok(Some(1.0))
        );
        let errs = CollectFlags::IGNORE_ERRORS | CollectFlags::ZERO_ERRORS;
        let na = LiteralValue::Error(ExcelError::new(ExcelErrorKind::Na));
        assert_eq!(cls(na.clone(), errs), Ok(None));
        assert_eq!(cls(na, CollectFlags::ZERO_ERRORS), Ok(Some(0.0)));
        assert_eq!(cls(LiteralValue::Empty, CollectFlags::ZERO_BLANKS), Ok(Some(0.0)));
    }

    #[test]
    fn coerce_falls_back_for_unparsable_text() {
        let f = CollectFlags::COERCE_STRINGS;
        assert_eq!(cls(LiteralValue::Text("12".into()), f), Ok(Some(12.0)));
        assert!(cls(LiteralValue::Text("abc".into()), f).is_err());
        assert_eq!(
            cls(LiteralValue::Text("abc".into()), f | CollectFlags::IGNORE_STRINGS),
            Ok(None)
        );
        assert_eq!(
            cls(LiteralValue::Text("abc".into()), f | CollectFlags::ZERO_STRINGS),
            Ok(Some(0.0))
        );
        assert_eq!(
            cls(LiteralValue::Text("7".into()), CollectFlags::ZERO_STRINGS),
            Ok(Some(0.0))
        );
    }

    #[test]
    fn floats_ownership_views() {
        let shared: Arc<[f64]> = Arc::from(vec![1.0, 2.0]);
        let a = Floats::from_shared(&shared, Ownership::Shared);
        let b = Floats::from_shared(&shared, Ownership::Owned);
        assert!(a.is_shared());
        assert!(!b.is_shared());
        assert_eq!(a, b);
        assert_eq!(b.into_vec(), vec![1.0, 2.0]);
        assert_eq!(a.iter().sum::<f64>(), 3.0);
    }
}
