use std::fmt;

use crate::coord::{Coord, CoordError, EvalPos, RelativeCoord, SheetId};

/// Inclusive rectangle of cells on one sheet, with `start` above/left of `end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridRect {
    start: Coord,
    end: Coord,
}

impl GridRect {
    /// Build from two corners in any order.
    pub fn from_corners(a: Coord, b: Coord) -> Self {
        Self {
            start: Coord::new(a.row().min(b.row()), a.col().min(b.col())),
            end: Coord::new(a.row().max(b.row()), a.col().max(b.col())),
        }
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn end(&self) -> Coord {
        self.end
    }

    pub fn width(&self) -> u32 {
        self.end.col() - self.start.col() + 1
    }

    pub fn height(&self) -> u32 {
        self.end.row() - self.start.row() + 1
    }

    pub fn cell_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn contains(&self, c: Coord) -> bool {
        (self.start.row()..=self.end.row()).contains(&c.row())
            && (self.start.col()..=self.end.col()).contains(&c.col())
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        let (c0, c1) = (self.start.col(), self.end.col());
        (self.start.row()..=self.end.row())
            .flat_map(move |r| (c0..=c1).map(move |c| Coord::new(r, c)))
    }
}

impl fmt::Display for GridRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// A range reference as written in a formula.
///
/// `sheet`/`end_sheet` of `None` mean "the sheet being evaluated". A
/// reference whose sheets resolve differently is a 3-D reference.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RangeRef {
    pub sheet: Option<SheetId>,
    pub end_sheet: Option<SheetId>,
    pub start: RelativeCoord,
    pub end: RelativeCoord,
}

/// A range reference resolved at an evaluation position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NormalizedRange {
    pub sheet: SheetId,
    pub end_sheet: SheetId,
    pub rect: GridRect,
}

impl NormalizedRange {
    pub fn is_3d(&self) -> bool {
        self.sheet != self.end_sheet
    }
}

impl RangeRef {
    pub fn new(sheet: Option<SheetId>, start: RelativeCoord, end: RelativeCoord) -> Self {
        Self {
            sheet,
            end_sheet: sheet,
            start,
            end,
        }
    }

    /// A reference spanning `sheet..=end_sheet`.
    pub fn three_d(sheet: SheetId, end_sheet: SheetId, start: Coord, end: Coord) -> Self {
        Self {
            sheet: Some(sheet),
            end_sheet: Some(end_sheet),
            start: start.into(),
            end: end.into(),
        }
    }

    /// Fully anchored reference between two absolute corners.
    pub fn absolute(sheet: Option<SheetId>, start: Coord, end: Coord) -> Self {
        Self::new(sheet, start.into(), end.into())
    }

    /// Parse `A1:B9` (or a single cell `C3`) into an absolute reference.
    pub fn parse_a1(sheet: Option<SheetId>, text: &str) -> Result<Self, CoordError> {
        let (a, b) = text.split_once(':').unwrap_or((text, text));
        Ok(Self::absolute(sheet, Coord::parse_a1(a)?, Coord::parse_a1(b)?))
    }

    /// Resolve relative parts at `pos` and order the corners.
    pub fn normalize(&self, pos: &EvalPos) -> NormalizedRange {
        let sheet = self.sheet.unwrap_or(pos.sheet);
        let end_sheet = self.end_sheet.unwrap_or(sheet);
        let a = self.start.resolve(pos.coord);
        let b = self.end.resolve(pos.coord);
        NormalizedRange {
            sheet,
            end_sheet,
            rect: GridRect::from_corners(a, b),
        }
    }
}
