//! Grid coordinates and evaluation positions.
//!
//! `Coord` is an absolute, 0-based cell position bounded like Excel
//! (1,048,576 rows × 16,384 columns). `RelativeCoord` is a cell reference as
//! written in a formula: each axis is either absolute or an offset from the
//! position the formula is evaluated at.

use core::fmt;

use thiserror::Error;

/// Stable sheet identifier used across the workspace.
pub type SheetId = u16;

const ROW_BITS: u32 = 20;
const COL_BITS: u32 = 14;

/// Number of rows in a sheet.
pub const SHEET_ROWS: u32 = 1 << ROW_BITS;
/// Number of columns in a sheet.
pub const SHEET_COLS: u32 = 1 << COL_BITS;

pub const ROW_MAX: u32 = SHEET_ROWS - 1;
pub const COL_MAX: u32 = SHEET_COLS - 1;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum CoordError {
    #[error("row {0} exceeds the sheet row limit")]
    RowOverflow(i64),
    #[error("col {0} exceeds the sheet column limit")]
    ColOverflow(i64),
    #[error("A1 reference {0:?} is malformed")]
    BadA1(String),
}

/// Absolute grid coordinate (row, column), 0-based.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
pub struct Coord {
    row: u32,
    col: u32,
}

impl Coord {
    /// Construct a coordinate, clamping into sheet bounds.
    pub fn new(row: u32, col: u32) -> Self {
        Self {
            row: row.min(ROW_MAX),
            col: col.min(COL_MAX),
        }
    }

    /// Fallible constructor that reports overflow rather than clamping.
    pub fn try_new(row: u32, col: u32) -> Result<Self, CoordError> {
        if row > ROW_MAX {
            return Err(CoordError::RowOverflow(row as i64));
        }
        if col > COL_MAX {
            return Err(CoordError::ColOverflow(col as i64));
        }
        Ok(Self { row, col })
    }

    /// Parse an A1-style cell name (`B7`, `$C$3`).
    pub fn parse_a1(a1: &str) -> Result<Self, CoordError> {
        let bad = || CoordError::BadA1(a1.to_string());
        let s = a1.replace('$', "").to_ascii_uppercase();
        let split = s.find(|c: char| c.is_ascii_digit()).ok_or_else(bad)?;
        let (letters, digits) = s.split_at(split);
        let col = letters_to_column_index(letters).ok_or_else(bad)?;
        let row: u32 = digits.parse().map_err(|_| bad())?;
        if row == 0 {
            return Err(bad());
        }
        Self::try_new(row - 1, col)
    }

    #[inline]
    pub fn row(self) -> u32 {
        self.row
    }

    #[inline]
    pub fn col(self) -> u32 {
        self.col
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row + 1)
    }
}

impl From<Coord> for (u32, u32) {
    fn from(coord: Coord) -> Self {
        (coord.row, coord.col)
    }
}

/// Where a formula is being evaluated: the sheet and the cell.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EvalPos {
    pub sheet: SheetId,
    pub coord: Coord,
}

impl EvalPos {
    pub fn new(sheet: SheetId, coord: Coord) -> Self {
        Self { sheet, coord }
    }
}

/// Cell reference with per-axis anchoring.
///
/// An absolute axis stores the 0-based index itself; a relative axis stores a
/// signed offset from the evaluation position. Resolution wraps around the
/// sheet edges the way a relative reference copied past the border does.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RelativeCoord {
    row: i32,
    col: i32,
    row_abs: bool,
    col_abs: bool,
}

impl RelativeCoord {
    pub fn new(row: i32, col: i32, row_abs: bool, col_abs: bool) -> Self {
        Self {
            row,
            col,
            row_abs,
            col_abs,
        }
    }

    /// Fully anchored reference (`$A$1` style).
    pub fn absolute(coord: Coord) -> Self {
        Self::new(coord.row() as i32, coord.col() as i32, true, true)
    }

    /// Fully relative reference that points at `target` when evaluated at `origin`.
    pub fn relative_to(target: Coord, origin: Coord) -> Self {
        Self::new(
            target.row() as i32 - origin.row() as i32,
            target.col() as i32 - origin.col() as i32,
            false,
            false,
        )
    }

    #[inline]
    pub fn row_abs(self) -> bool {
        self.row_abs
    }

    #[inline]
    pub fn col_abs(self) -> bool {
        self.col_abs
    }

    /// Resolve against an evaluation position.
    pub fn resolve(self, origin: Coord) -> Coord {
        let row = if self.row_abs {
            self.row.clamp(0, ROW_MAX as i32) as u32
        } else {
            (origin.row() as i64 + self.row as i64).rem_euclid(SHEET_ROWS as i64) as u32
        };
        let col = if self.col_abs {
            self.col.clamp(0, COL_MAX as i32) as u32
        } else {
            (origin.col() as i64 + self.col as i64).rem_euclid(SHEET_COLS as i64) as u32
        };
        Coord::new(row, col)
    }
}

impl From<Coord> for RelativeCoord {
    fn from(coord: Coord) -> Self {
        Self::absolute(coord)
    }
}

pub fn column_to_letters(mut col: u32) -> String {
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(b'A' + rem);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

pub fn letters_to_column_index(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for (idx, ch) in s.bytes().enumerate() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        let val = (ch - b'A') as u32;
        col = col.checked_mul(26)?;
        col = col.checked_add(val)?;
        if idx != s.len() - 1 {
            col = col.checked_add(1)?;
        }
    }
    Some(col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_reports_overflow() {
        assert!(Coord::try_new(ROW_MAX, COL_MAX).is_ok());
        assert_eq!(
            Coord::try_new(ROW_MAX + 1, 0),
            Err(CoordError::RowOverflow((ROW_MAX + 1) as i64))
        );
        assert_eq!(
            Coord::try_new(0, COL_MAX + 1),
            Err(CoordError::ColOverflow((COL_MAX + 1) as i64))
        );
    }

    #[test]
    fn a1_parse_and_display() {
        let c = Coord::parse_a1("$AB$6").unwrap();
        assert_eq!((c.row(), c.col()), (5, 27));
        assert_eq!(c.to_string(), "AB6");
        assert!(Coord::parse_a1("A0").is_err());
        assert!(Coord::parse_a1("12").is_err());
    }

    #[test]
    fn relative_resolves_against_origin() {
        let origin = Coord::new(10, 3);
        let r = RelativeCoord::new(-2, 1, false, false);
        assert_eq!(r.resolve(origin), Coord::new(8, 4));
        let mixed = RelativeCoord::new(0, 1, true, false);
        assert_eq!(mixed.resolve(origin), Coord::new(0, 4));
    }

    #[test]
    fn relative_wraps_past_sheet_edge() {
        let origin = Coord::new(0, 0);
        let r = RelativeCoord::new(-1, -1, false, false);
        assert_eq!(r.resolve(origin), Coord::new(ROW_MAX, COL_MAX));
    }

    #[test]
    fn relative_to_roundtrips() {
        let origin = Coord::new(5, 5);
        let target = Coord::new(1, 9);
        assert_eq!(RelativeCoord::relative_to(target, origin).resolve(origin), target);
    }

    #[test]
    fn column_letter_roundtrip() {
        assert_eq!(column_to_letters(27), "AB");
        assert_eq!(letters_to_column_index("AB"), Some(27));
        assert!(letters_to_column_index("a1").is_none());
    }
}
