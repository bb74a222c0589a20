//! Text collection. Never cached.

use sheetfold_common::{EvalPos, ExcelError, ExcelErrorKind, LiteralValue};

use crate::flags::CollectFlags;
use crate::traits::{ArgExpr, EvaluationContext};

/// Render every value reachable from `args` as text.
///
/// Blanks are skipped under `IGNORE_BLANKS` and become `""` otherwise.
/// Errors are skipped under `IGNORE_ERRORS` and abort the walk otherwise.
pub fn collect_strings<C: EvaluationContext + ?Sized>(
    ctx: &C,
    args: &[ArgExpr],
    pos: &EvalPos,
    flags: CollectFlags,
) -> Result<Vec<String>, ExcelError> {
    let strict = !flags.contains(CollectFlags::IGNORE_ERRORS);
    let mut out = Vec::new();
    ctx.iterate_argument_values(pos, args, strict, flags.iter_flags(), &mut |_, v| {
        match v {
            LiteralValue::Empty => {
                if !flags.contains(CollectFlags::IGNORE_BLANKS) {
                    out.push(String::new());
                }
            }
            LiteralValue::Error(_) => {}
            other => out.push(other.to_string()),
        }
        Ok(())
    })?;
    Ok(out)
}

/// Collect strings and reduce them, mapping a failed reduction to
/// `func_error`.
pub fn string_range_function<C, F>(
    ctx: &C,
    args: &[ArgExpr],
    pos: &EvalPos,
    reducer: F,
    flags: CollectFlags,
    func_error: ExcelErrorKind,
) -> Result<LiteralValue, ExcelError>
where
    C: EvaluationContext + ?Sized,
    F: FnOnce(&[String]) -> Option<LiteralValue>,
{
    let strs = collect_strings(ctx, args, pos, flags)?;
    reducer(&strs).ok_or_else(|| ExcelError::new(func_error).at(pos))
}
