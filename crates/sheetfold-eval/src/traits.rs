//! sheetfold-eval – evaluator-facing traits
//!
//! The collector never touches cell storage directly. It asks an
//! [`EvaluationContext`] to walk the values reachable from an argument list,
//! which is also where nested formula evaluation (and therefore cache
//! re-entrancy) happens.

use sheetfold_common::{Coord, EvalPos, ExcelError, LiteralValue, RangeRef, SheetId};

use crate::flags::IterFlags;

/* ───────────────────────────── Arguments ───────────────────────────── */

/// One already-parsed function argument.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgExpr {
    /// A constant: scalar or inline array.
    Literal(LiteralValue),
    /// A single contiguous range reference (`A1:B9`, `Sheet2!C3`).
    Reference(RangeRef),
    /// A union of references (`(A1:A3,C1:C3)`).
    Union(Vec<RangeRef>),
}

impl ArgExpr {
    /// The range this argument reduces to, if it is exactly one reference.
    pub fn as_range(&self) -> Option<&RangeRef> {
        match self {
            ArgExpr::Reference(r) => Some(r),
            ArgExpr::Union(refs) if refs.len() == 1 => refs.first(),
            _ => None,
        }
    }
}

impl From<LiteralValue> for ArgExpr {
    fn from(v: LiteralValue) -> Self {
        ArgExpr::Literal(v)
    }
}

impl From<RangeRef> for ArgExpr {
    fn from(r: RangeRef) -> Self {
        ArgExpr::Reference(r)
    }
}

/* ───────────────────────────── Visiting ───────────────────────────── */

/// Callback invoked for each visited value with the position it came from.
///
/// Returning an error stops the walk and is passed back to the caller.
pub type CellVisitor<'v> = dyn FnMut(&EvalPos, &LiteralValue) -> Result<(), ExcelError> + 'v;

/* ───────────────────────── EvaluationContext ───────────────────────── */

pub trait EvaluationContext {
    /// Value of a cell, evaluating its formula first when it has one.
    fn cell_value(&self, sheet: SheetId, at: Coord) -> LiteralValue;

    /// Whether the cell holds a formula whose top-level call is a subtotal.
    fn is_subtotal_cell(&self, _sheet: SheetId, _at: Coord) -> bool {
        false
    }

    /// Walk every value reachable from `args` as seen from `pos`.
    ///
    /// Ranges are walked sheet by sheet in row-major order and inline arrays
    /// row by row. With `strict`, an error value ends the walk with that
    /// error before the visitor sees it.
    fn iterate_argument_values(
        &self,
        pos: &EvalPos,
        args: &[ArgExpr],
        strict: bool,
        iter: IterFlags,
        visit: &mut CellVisitor<'_>,
    ) -> Result<(), ExcelError> {
        for arg in args {
            match arg {
                ArgExpr::Literal(LiteralValue::Array(rows)) => {
                    for v in rows.iter().flatten() {
                        visit_one(pos, v, strict, iter, visit)?;
                    }
                }
                ArgExpr::Literal(v) => visit_one(pos, v, strict, iter, visit)?,
                ArgExpr::Reference(r) => self.iterate_range(pos, r, strict, iter, visit)?,
                ArgExpr::Union(refs) => {
                    for r in refs {
                        self.iterate_range(pos, r, strict, iter, visit)?;
                    }
                }
            }
        }
        Ok(())
    }

    #[doc(hidden)]
    fn iterate_range(
        &self,
        pos: &EvalPos,
        range: &RangeRef,
        strict: bool,
        iter: IterFlags,
        visit: &mut CellVisitor<'_>,
    ) -> Result<(), ExcelError> {
        let norm = range.normalize(pos);
        let (lo, hi) = if norm.sheet <= norm.end_sheet {
            (norm.sheet, norm.end_sheet)
        } else {
            (norm.end_sheet, norm.sheet)
        };
        for sheet in lo..=hi {
            for at in norm.rect.cells() {
                if iter.contains(IterFlags::IGNORE_SUBTOTAL) && self.is_subtotal_cell(sheet, at) {
                    continue;
                }
                let v = self.cell_value(sheet, at);
                visit_one(&EvalPos::new(sheet, at), &v, strict, iter, visit)?;
            }
        }
        Ok(())
    }
}

fn visit_one(
    pos: &EvalPos,
    v: &LiteralValue,
    strict: bool,
    iter: IterFlags,
    visit: &mut CellVisitor<'_>,
) -> Result<(), ExcelError> {
    match v {
        LiteralValue::Empty if iter.contains(IterFlags::IGNORE_BLANK) => Ok(()),
        LiteralValue::Error(e) if strict => Err(e.clone()),
        _ => visit(pos, v),
    }
}
