//! Lightweight in-memory workbook for unit/prop tests.
//!
//! Formula cells are closures evaluated on every read, which lets tests
//! call back into a [`crate::cache::CollectCache`] from inside a collection.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use sheetfold_common::{Coord, EvalPos, LiteralValue, RangeRef, SheetId};

use crate::traits::{ArgExpr, EvaluationContext};

type V = LiteralValue;
type CellKey = (SheetId, u32, u32); // 0-based (sheet, row, col)

pub type FormulaFn = Rc<dyn Fn(&TestWorkbook, &EvalPos) -> V>;

#[derive(Clone)]
enum Slot {
    Value(V),
    Formula { eval: FormulaFn, subtotal: bool },
}

#[derive(Default)]
pub struct TestWorkbook {
    cells: RefCell<FxHashMap<CellKey, Slot>>,
    reads: Cell<usize>,
    evaluations: Cell<usize>,
}

pub fn parse_a1(a1: &str) -> Coord {
    Coord::parse_a1(a1).expect("bad A1 ref")
}

/// Absolute reference to `a1` on the evaluating sheet.
pub fn range(a1: &str) -> ArgExpr {
    ArgExpr::Reference(RangeRef::parse_a1(None, a1).expect("bad A1 range"))
}

/// Absolute reference to `a1` on `sheet`.
pub fn range_on(sheet: SheetId, a1: &str) -> ArgExpr {
    ArgExpr::Reference(RangeRef::parse_a1(Some(sheet), a1).expect("bad A1 range"))
}

/// Evaluation position on sheet 0.
pub fn pos_a1(a1: &str) -> EvalPos {
    EvalPos::new(0, parse_a1(a1))
}

impl TestWorkbook {
    /* ─────────────── constructors ─────────────── */
    pub fn new() -> Self {
        Self::default()
    }

    /* ─────────────── cell helpers ─────────────── */
    pub fn with_cell(self, sheet: SheetId, row: u32, col: u32, v: V) -> Self {
        self.cells.borrow_mut().insert((sheet, row, col), Slot::Value(v));
        self
    }

    pub fn with_cell_a1(self, sheet: SheetId, a1: &str, v: V) -> Self {
        let at = parse_a1(a1);
        self.with_cell(sheet, at.row(), at.col(), v)
    }

    pub fn with_range(self, sheet: SheetId, row: u32, col: u32, data: Vec<Vec<V>>) -> Self {
        {
            let mut cells = self.cells.borrow_mut();
            for (r_off, r) in data.into_iter().enumerate() {
                for (c_off, v) in r.into_iter().enumerate() {
                    cells.insert(
                        (sheet, row + r_off as u32, col + c_off as u32),
                        Slot::Value(v),
                    );
                }
            }
        }
        self
    }

    /// Fill a column starting at `a1` with `values`.
    pub fn with_column(
        self,
        sheet: SheetId,
        a1: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let at = parse_a1(a1);
        self.with_range(
            sheet,
            at.row(),
            at.col(),
            values.into_iter().map(|v| vec![v]).collect(),
        )
    }

    /* ─────────────── formula helpers ─────────────── */
    pub fn with_formula<F>(self, sheet: SheetId, a1: &str, f: F) -> Self
    where
        F: Fn(&TestWorkbook, &EvalPos) -> V + 'static,
    {
        self.insert_formula(sheet, a1, Rc::new(f), false)
    }

    /// A formula cell whose top-level call is a subtotal.
    pub fn with_subtotal<F>(self, sheet: SheetId, a1: &str, f: F) -> Self
    where
        F: Fn(&TestWorkbook, &EvalPos) -> V + 'static,
    {
        self.insert_formula(sheet, a1, Rc::new(f), true)
    }

    fn insert_formula(self, sheet: SheetId, a1: &str, eval: FormulaFn, subtotal: bool) -> Self {
        let at = parse_a1(a1);
        self.cells
            .borrow_mut()
            .insert((sheet, at.row(), at.col()), Slot::Formula { eval, subtotal });
        self
    }

    /* ─────────────── mutation & counters ─────────────── */
    pub fn set_value(&self, sheet: SheetId, a1: &str, v: V) {
        let at = parse_a1(a1);
        self.cells
            .borrow_mut()
            .insert((sheet, at.row(), at.col()), Slot::Value(v));
    }

    /// Number of cell reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Number of formula evaluations so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.get()
    }
}

/* ─────────────────────── trait impls ─────────────────────── */
impl EvaluationContext for TestWorkbook {
    fn cell_value(&self, sheet: SheetId, at: Coord) -> V {
        self.reads.set(self.reads.get() + 1);
        let slot = self.cells.borrow().get(&(sheet, at.row(), at.col())).cloned();
        match slot {
            None => V::Empty,
            Some(Slot::Value(v)) => v,
            Some(Slot::Formula { eval, .. }) => {
                self.evaluations.set(self.evaluations.get() + 1);
                eval(self, &EvalPos::new(sheet, at))
            }
        }
    }

    fn is_subtotal_cell(&self, sheet: SheetId, at: Coord) -> bool {
        matches!(
            self.cells.borrow().get(&(sheet, at.row(), at.col())),
            Some(Slot::Formula { subtotal: true, .. })
        )
    }
}
