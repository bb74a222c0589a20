//! Spreadsheet-visible error values.
//!
//! - **`ExcelErrorKind`** : the canonical set of error codes
//! - **`ErrorContext`**   : where the error was raised (sheet, row, col)
//! - **`ExcelError`**     : kind + optional message + optional context
//!
//! Collection code returns `Result<_, ExcelError>` so the first offending
//! element can short-circuit with `?`.

use std::{error::Error, fmt};

use crate::{EvalPos, LiteralValue, SheetId};

/// All recognised error codes.
///
/// **Note:** names are CamelCase while `Display` renders them exactly as a
/// spreadsheet shows them (`#DIV/0!`, …).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExcelErrorKind {
    Null,
    Ref,
    Name,
    Value,
    Div,
    Na,
    Num,
    NImpl,
    Calc,
    Circ,
}

impl fmt::Display for ExcelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "#NULL!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Value => "#VALUE!",
            Self::Div => "#DIV/0!",
            Self::Na => "#N/A",
            Self::Num => "#NUM!",
            Self::NImpl => "#N/IMPL!",
            Self::Calc => "#CALC!",
            Self::Circ => "#CIRC!",
        })
    }
}

impl ExcelErrorKind {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "#null!" => Self::Null,
            "#ref!" => Self::Ref,
            "#name?" => Self::Name,
            "#value!" => Self::Value,
            "#div/0!" => Self::Div,
            "#n/a" => Self::Na,
            "#num!" => Self::Num,
            "#n/impl!" => Self::NImpl,
            "#calc!" => Self::Calc,
            "#circ!" => Self::Circ,
            _ => return None,
        })
    }
}

/// Location metadata attached to an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ErrorContext {
    pub sheet: Option<SheetId>,
    pub row: Option<u32>,
    pub col: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExcelError {
    pub kind: ExcelErrorKind,
    pub message: Option<String>,
    pub context: Option<ErrorContext>,
}

/* ───────────────────── Constructors & helpers ─────────────────────── */

impl From<ExcelErrorKind> for ExcelError {
    fn from(kind: ExcelErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
        }
    }
}

impl ExcelError {
    pub fn new(kind: ExcelErrorKind) -> Self {
        kind.into()
    }

    /// `#VALUE!` raised at `pos`: the generic "wrong value type" error.
    pub fn value_at(pos: &EvalPos) -> Self {
        Self::new(ExcelErrorKind::Value).at(pos)
    }

    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Attach a full evaluation position.
    pub fn at(mut self, pos: &EvalPos) -> Self {
        self.context = Some(ErrorContext {
            sheet: Some(pos.sheet),
            row: Some(pos.coord.row()),
            col: Some(pos.coord.col()),
        });
        self
    }
}

/* ───────────────────────── Display / Error ────────────────────────── */

impl fmt::Display for ExcelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(ref msg) = self.message {
            write!(f, ": {msg}")?;
        }

        if let Some(ref ctx) = self.context {
            if let (Some(r), Some(c)) = (ctx.row, ctx.col) {
                match ctx.sheet {
                    Some(sheet) => write!(f, " (sheet {sheet}, row {r}, col {c})")?,
                    None => write!(f, " (row {r}, col {c})")?,
                }
            }
        }
        Ok(())
    }
}

impl Error for ExcelError {}

impl From<ExcelError> for LiteralValue {
    fn from(error: ExcelError) -> Self {
        LiteralValue::Error(error)
    }
}

impl PartialEq<ExcelErrorKind> for ExcelError {
    fn eq(&self, other: &ExcelErrorKind) -> bool {
        self.kind == *other
    }
}

impl PartialEq<&str> for ExcelError {
    fn eq(&self, other: &&str) -> bool {
        self.kind.to_string() == *other
    }
}
