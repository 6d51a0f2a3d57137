use std::collections::BTreeMap;

use tracing::debug;

use crate::address::{CellAddress, Range};
use crate::excel::cell::{Cell, CellValue};
use crate::excel::metadata::{
    AutoFilter, ColInfo, ConditionalFormat, DataValidation, MarginInfo, OutlineSettings,
    PrintSettings, ProtectInfo, RowInfo, SheetType, Visibility,
};
use crate::excel::style::{RangeStyle, Style};

const ORIGIN: Range = Range::single(CellAddress::new(0, 0));

/// Sparse cell store with its used range and sheet-level metadata.
///
/// Only occupied addresses have entries; a [`Cell::stub`] is present but
/// empty, which is not the same as an absent address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    cells: BTreeMap<CellAddress, Cell>,
    /// Bounding box of occupied addresses. May over-cover after removals
    /// until `recalculate_used_range` runs.
    bounds: Option<Range>,
    dimension: Option<Range>,

    pub cols: BTreeMap<u32, ColInfo>,
    pub rows: BTreeMap<u32, RowInfo>,
    pub merges: Vec<Range>,
    pub validations: Vec<DataValidation>,
    pub conditional_formats: Vec<ConditionalFormat>,
    pub protection: Option<ProtectInfo>,
    pub autofilter: Option<AutoFilter>,
    pub print: Option<PrintSettings>,
    pub margins: Option<MarginInfo>,
    pub outline: OutlineSettings,
    pub sheet_type: SheetType,
    pub visibility: Visibility,
    pub code_name: Option<String>,
    /// Extent of the source data when an import was truncated by a row cap.
    pub full_range: Option<Range>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// No occupied addresses and no declared dimension.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.dimension.is_none()
    }

    pub fn get(&self, addr: CellAddress) -> Option<&Cell> {
        self.cells.get(&addr)
    }

    pub fn cell_mut(&mut self, addr: CellAddress) -> Option<&mut Cell> {
        self.cells.get_mut(&addr)
    }

    /// Insert or overwrite a cell, growing the used range when needed.
    pub fn set(&mut self, addr: CellAddress, cell: Cell) -> Option<Cell> {
        self.grow(addr);
        self.cells.insert(addr, cell)
    }

    pub fn remove(&mut self, addr: CellAddress) -> Option<Cell> {
        let removed = self.cells.remove(&addr)?;
        let on_edge = self.bounds.is_some_and(|b| {
            addr.row == b.start.row
                || addr.row == b.end.row
                || addr.col == b.start.col
                || addr.col == b.end.col
        });
        if on_edge {
            self.recalculate_used_range();
        }
        Some(removed)
    }

    /// Existing cell at `addr`, or a fresh stub inserted there.
    pub fn get_or_insert_stub(&mut self, addr: CellAddress) -> &mut Cell {
        self.grow(addr);
        self.cells.entry(addr).or_insert_with(Cell::stub)
    }

    /// Occupied cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells.iter().map(|(addr, cell)| (*addr, cell))
    }

    /// Occupied cells of one row, left to right.
    pub fn row_cells(&self, row: u32) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells
            .range(CellAddress::new(row, 0)..=CellAddress::new(row, u32::MAX))
            .map(|(addr, cell)| (*addr, cell))
    }

    /// Minimal range covering every occupied address and the declared
    /// dimension. Without a declared dimension the range is anchored at `A1`,
    /// so an empty sheet reports `A1:A1`.
    pub fn used_range(&self) -> Range {
        let base = self.dimension.unwrap_or(ORIGIN);
        match self.bounds {
            Some(bounds) => base.union(&bounds),
            None => base,
        }
    }

    pub fn dimension(&self) -> Option<Range> {
        self.dimension
    }

    /// Declare a used range independent of occupancy.
    pub fn set_dimension_override(&mut self, range: Range) {
        self.dimension = Some(range);
    }

    pub fn clear_dimension_override(&mut self) {
        self.dimension = None;
    }

    /// Recompute the occupied bounding box from scratch.
    pub fn recalculate_used_range(&mut self) {
        self.bounds = self.cells.keys().fold(None, |acc: Option<Range>, addr| {
            Some(match acc {
                Some(mut range) => {
                    range.extend_to(*addr);
                    range
                }
                None => Range::single(*addr),
            })
        });
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.rows.get(&row).is_some_and(|info| info.hidden)
    }

    pub fn is_col_hidden(&self, col: u32) -> bool {
        self.cols.get(&col).is_some_and(|info| info.hidden)
    }

    /// Merged range whose top-left corner or body contains `addr`.
    pub fn merge_at(&self, addr: CellAddress) -> Option<&Range> {
        self.merges.iter().find(|range| range.contains(addr))
    }

    /// Write staged cells in one step. Callers validate before staging, so
    /// either every cell lands or none does.
    pub(crate) fn commit(&mut self, staged: Vec<(CellAddress, Cell)>) {
        debug!(cells = staged.len(), "committing staged cells");
        for (addr, cell) in staged {
            self.set(addr, cell);
        }
    }

    fn grow(&mut self, addr: CellAddress) {
        match &mut self.bounds {
            Some(bounds) => bounds.extend_to(addr),
            None => self.bounds = Some(Range::single(addr)),
        }
    }
}

/// Mark `range` as an array formula: the top-left cell carries `formula`,
/// every cell in the range carries the enclosing range and loses its value.
pub fn sheet_set_array_formula(sheet: &mut Sheet, range: Range, formula: &str) {
    let formula = formula.strip_prefix('=').unwrap_or(formula);
    for addr in range.cells() {
        let cell = sheet.get_or_insert_stub(addr);
        cell.value = CellValue::Stub;
        cell.text = None;
        cell.array_range = Some(range);
        cell.formula = (addr == range.start).then(|| formula.to_string());
    }
}

/// Apply a style across every cell in `range`, creating stubs where needed.
///
/// Outer edges take the style's own borders; edges shared between two cells
/// inside the range take `inrow` (horizontal) or `incol` (vertical).
pub fn sheet_set_range_style(sheet: &mut Sheet, range: Range, range_style: &RangeStyle) {
    let base = &range_style.style;

    for addr in range.cells() {
        let mut delta = base.clone();
        delta.top = edge(addr.row == range.start.row, &base.top, &range_style.inrow);
        delta.bottom = edge(addr.row == range.end.row, &base.bottom, &range_style.inrow);
        delta.left = edge(addr.col == range.start.col, &base.left, &range_style.incol);
        delta.right = edge(addr.col == range.end.col, &base.right, &range_style.incol);

        let cell = sheet.get_or_insert_stub(addr);
        cell.style.get_or_insert_with(Style::default).apply_delta(&delta);
        if let Some(format) = &range_style.number_format {
            cell.number_format = Some(format.clone());
        }
    }
}

fn edge<T: Clone>(outer: bool, outer_value: &Option<T>, inner_value: &Option<T>) -> Option<T> {
    if outer {
        outer_value.clone()
    } else {
        inner_value.clone()
    }
}

/// Effective style at `addr`: the column style overlaid by the cell style.
pub fn get_computed_style(sheet: &Sheet, addr: CellAddress) -> Style {
    let mut style = sheet
        .cols
        .get(&addr.col)
        .and_then(|col| col.style.clone())
        .unwrap_or_default();
    if let Some(cell_style) = sheet.get(addr).and_then(|cell| cell.style.as_ref()) {
        style.apply_delta(cell_style);
    }
    style
}
