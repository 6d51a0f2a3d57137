use std::str::FromStr;

use crate::address::{CellAddress, decode_cell};
use crate::error::{Result, SheetError};
use crate::excel::date::DateSystem;
use crate::excel::sheet::Sheet;

/// Top-left cell of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cell(CellAddress),
    /// Column `A` of the given 0-based row.
    Row(u32),
    /// First column of the row below the sheet's current used range.
    Append,
}

impl Default for Origin {
    fn default() -> Self {
        Origin::Cell(CellAddress::default())
    }
}

impl Origin {
    pub(crate) fn resolve(self, sheet: &Sheet, operation: &'static str) -> Result<CellAddress> {
        match self {
            Origin::Cell(addr) => Ok(addr),
            Origin::Row(row) => Ok(CellAddress::new(row, 0)),
            Origin::Append if sheet.is_empty() => Ok(CellAddress::default()),
            Origin::Append => CellAddress::new(sheet.used_range().end.row, 0).offset(1, 0, operation),
        }
    }
}

impl From<CellAddress> for Origin {
    fn from(addr: CellAddress) -> Self {
        Origin::Cell(addr)
    }
}

impl FromStr for Origin {
    type Err = SheetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        decode_cell(s).map(Origin::Cell)
    }
}

/// Options for the array-of-arrays importer. The record importer reuses them
/// for per-value typing.
#[derive(Debug, Clone, PartialEq)]
pub struct AoaOptions {
    pub origin: Origin,
    /// Create stub cells for null values.
    pub sheet_stubs: bool,
    /// Store dates as timestamps; when off they become numeric serials.
    pub cell_dates: bool,
    /// Number format attached to date cells instead of the built-in `m/d/yy`.
    pub date_nf: Option<String>,
    /// Treat strings starting with `=` as formulas.
    pub formulas: bool,
    /// Store null values as `#NULL!` errors.
    pub null_error: bool,
    /// Fail on values that cannot be typed instead of stringifying them.
    pub strict: bool,
    pub date_system: DateSystem,
    /// Layout hint, accepted for compatibility. Storage is always sparse.
    pub dense: bool,
}

impl Default for AoaOptions {
    fn default() -> Self {
        Self {
            origin: Origin::default(),
            sheet_stubs: false,
            cell_dates: true,
            date_nf: None,
            formulas: true,
            null_error: false,
            strict: false,
            date_system: DateSystem::default(),
            dense: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonImportOptions {
    /// Origin and value typing.
    pub base: AoaOptions,
    /// Column order. Keys not listed are not written.
    pub header: Option<Vec<String>>,
    /// Leave out the header row; the header still fixes column order.
    pub skip_header: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    pub origin: Origin,
    /// Keep every value as text.
    pub raw: bool,
    /// Never guess dates from text.
    pub raw_dates: bool,
    /// Read at most this many rows.
    pub sheet_rows: Option<u32>,
    /// Skip hidden rows and cells instead of recording them as hidden.
    pub display: bool,
    /// Translate CSS borders into cell border styles.
    pub borders: bool,
    pub sheet_stubs: bool,
    pub cell_dates: bool,
    pub date_nf: Option<String>,
    pub date_system: DateSystem,
    pub dense: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            origin: Origin::default(),
            raw: false,
            raw_dates: false,
            sheet_rows: None,
            display: false,
            borders: false,
            sheet_stubs: false,
            cell_dates: true,
            date_nf: None,
            date_system: DateSystem::default(),
            dense: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvImportOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub table: TableOptions,
}

impl Default for CsvImportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            table: TableOptions::default(),
        }
    }
}

/// CSS border declarations of a table cell, one per side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssBorders {
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
}

/// One cell of a host-tokenized table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    /// Decoded text content.
    pub text: String,
    pub colspan: u32,
    pub rowspan: u32,
    pub hidden: bool,
    /// Explicit type tag (`s`, `n`, `b`, `e`, `d`, `z`).
    pub data_t: Option<char>,
    /// Explicit raw value, used instead of `text`.
    pub data_v: Option<String>,
    /// Explicit number format.
    pub data_z: Option<String>,
    /// First link target inside the cell.
    pub href: Option<String>,
    pub borders: CssBorders,
}

impl TableCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            colspan: 1,
            rowspan: 1,
            hidden: false,
            data_t: None,
            data_v: None,
            data_z: None,
            href: None,
            borders: CssBorders::default(),
        }
    }

    pub fn with_span(mut self, rowspan: u32, colspan: u32) -> Self {
        self.rowspan = rowspan.max(1);
        self.colspan = colspan.max(1);
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn typed(mut self, data_t: char, data_v: impl Into<String>) -> Self {
        self.data_t = Some(data_t);
        self.data_v = Some(data_v.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

impl From<&str> for TableCell {
    fn from(text: &str) -> Self {
        TableCell::new(text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub hidden: bool,
}

impl TableRow {
    pub fn new<I, C>(cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<TableCell>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
            hidden: false,
        }
    }
}
