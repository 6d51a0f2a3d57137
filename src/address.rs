//! A1-notation address algebra.
//!
//! Rows and columns are 0-indexed in structural form: `CellAddress { row: 0, col: 0 }`
//! is `A1`. Columns use bijective base-26 (`Z` is followed by `AA`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SheetError};

/// Number of rows a full-column reference (`A:A`) spans.
pub const MAX_ROWS: u32 = 1_048_576;

/// Number of columns a full-row reference (`1:1`) spans.
pub const MAX_COLS: u32 = 16_384;

/// Structural cell coordinate. Ordering is row-major.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    pub fn to_a1(self) -> String {
        encode_cell(self)
    }

    pub fn from_a1(text: &str) -> Result<Self> {
        decode_cell(text)
    }

    /// The address `rows` down and `cols` right of this one.
    ///
    /// Fails with `InvalidRange` when either coordinate leaves the `u32` space.
    pub fn offset(self, rows: usize, cols: usize, operation: &'static str) -> Result<Self> {
        let shift =
            |base: u32, by: usize| u32::try_from(by).ok().and_then(|by| base.checked_add(by));
        match (shift(self.row, rows), shift(self.col, cols)) {
            (Some(row), Some(col)) => Ok(Self::new(row, col)),
            _ => Err(SheetError::InvalidRange {
                input: format!("{self} offset by {rows} rows and {cols} columns"),
                operation,
            }),
        }
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", encode_col(self.col), encode_row(self.row))
    }
}

/// Inclusive rectangular region, normalized so that `start <= end` on both axes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl Range {
    /// Construct a range from two corners in any order.
    pub const fn new(a: CellAddress, b: CellAddress) -> Self {
        let (start_row, end_row) = if a.row <= b.row { (a.row, b.row) } else { (b.row, a.row) };
        let (start_col, end_col) = if a.col <= b.col { (a.col, b.col) } else { (b.col, a.col) };
        Self {
            start: CellAddress::new(start_row, start_col),
            end: CellAddress::new(end_row, end_col),
        }
    }

    /// Construct a range whose corners must already be ordered.
    pub fn try_new(start: CellAddress, end: CellAddress) -> Result<Self> {
        if end.row < start.row || end.col < start.col {
            return Err(SheetError::InvalidRange {
                input: format!("{start}:{end}"),
                operation: "Range::try_new",
            });
        }
        Ok(Self { start, end })
    }

    pub const fn single(cell: CellAddress) -> Self {
        Self {
            start: cell,
            end: cell,
        }
    }

    #[inline]
    pub const fn contains(&self, cell: CellAddress) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.col >= self.start.col
            && cell.col <= self.end.col
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.end.col.saturating_sub(self.start.col).saturating_add(1)
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.end.row.saturating_sub(self.start.row).saturating_add(1)
    }

    #[inline]
    pub const fn is_single_cell(&self) -> bool {
        self.start.row == self.end.row && self.start.col == self.end.col
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(&self, other: &Range) -> Range {
        Range {
            start: CellAddress::new(
                self.start.row.min(other.start.row),
                self.start.col.min(other.start.col),
            ),
            end: CellAddress::new(
                self.end.row.max(other.end.row),
                self.end.col.max(other.end.col),
            ),
        }
    }

    /// Grow the range so that it covers `cell`.
    pub fn extend_to(&mut self, cell: CellAddress) {
        self.start.row = self.start.row.min(cell.row);
        self.start.col = self.start.col.min(cell.col);
        self.end.row = self.end.row.max(cell.row);
        self.end.col = self.end.col.max(cell.col);
    }

    /// Row-major iterator over every address in the range.
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> + use<> {
        let Range { start, end } = *self;
        (start.row..=end.row)
            .flat_map(move |row| (start.col..=end.col).map(move |col| CellAddress::new(row, col)))
    }

    pub fn to_a1(&self) -> String {
        encode_range(*self)
    }

    pub fn from_a1(text: &str) -> Result<Self> {
        decode_range(text)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

#[must_use]
pub fn encode_col(col: u32) -> String {
    let mut n = col as u64 + 1;
    let mut letters = Vec::with_capacity(4);

    while n > 0 {
        let remainder = (n - 1) % 26;
        letters.push(b'A' + remainder as u8);
        n = (n - 1) / 26;
    }

    letters.iter().rev().map(|&b| b as char).collect()
}

/// Parse a column name such as `A`, `aa` or `$XFD`.
pub fn decode_col(text: &str) -> Result<u32> {
    let name = text.trim().strip_prefix('$').unwrap_or(text.trim());
    parse_col_letters(name).ok_or_else(|| SheetError::malformed(text, "decode_col"))
}

#[must_use]
pub fn encode_row(row: u32) -> String {
    (row as u64 + 1).to_string()
}

/// Parse a 1-based row number such as `1` or `$10`.
pub fn decode_row(text: &str) -> Result<u32> {
    let digits = text.trim().strip_prefix('$').unwrap_or(text.trim());
    parse_row_digits(digits).ok_or_else(|| SheetError::malformed(text, "decode_row"))
}

#[must_use]
pub fn encode_cell(addr: CellAddress) -> String {
    addr.to_string()
}

/// Parse `[$]letters[$]digits`; anchors are accepted and dropped.
pub fn decode_cell(text: &str) -> Result<CellAddress> {
    split_cell(text.trim()).ok_or_else(|| SheetError::malformed(text, "decode_cell"))
}

#[must_use]
pub fn encode_range(range: Range) -> String {
    range.to_string()
}

/// Parse `CELL:CELL`, a single `CELL`, a full-column `A:C` or a full-row `1:3` reference.
pub fn decode_range(text: &str) -> Result<Range> {
    let s = text.trim();
    let malformed = || SheetError::malformed(text, "decode_range");

    let Some((left, right)) = s.split_once(':') else {
        let cell = split_cell(s).ok_or_else(malformed)?;
        return Ok(Range::single(cell));
    };

    if let (Some(a), Some(b)) = (split_cell(left), split_cell(right)) {
        return Ok(Range::new(a, b));
    }

    let strip = |part: &str| part.strip_prefix('$').unwrap_or(part).to_string();
    let (left, right) = (strip(left), strip(right));

    if let (Some(a), Some(b)) = (parse_col_letters(&left), parse_col_letters(&right)) {
        return Ok(Range::new(
            CellAddress::new(0, a),
            CellAddress::new(MAX_ROWS - 1, b),
        ));
    }

    if let (Some(a), Some(b)) = (parse_row_digits(&left), parse_row_digits(&right)) {
        return Ok(Range::new(
            CellAddress::new(a, 0),
            CellAddress::new(b, MAX_COLS - 1),
        ));
    }

    Err(malformed())
}

fn split_cell(s: &str) -> Option<CellAddress> {
    let bytes = s.as_bytes();
    let mut idx = usize::from(bytes.first() == Some(&b'$'));

    let col_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_alphabetic() {
        idx += 1;
    }
    let col = parse_col_letters(&s[col_start..idx])?;

    if bytes.get(idx) == Some(&b'$') {
        idx += 1;
    }

    let row = parse_row_digits(&s[idx..])?;
    Some(CellAddress::new(row, col))
}

fn parse_col_letters(name: &str) -> Option<u32> {
    if name.is_empty() {
        return None;
    }

    let mut result: u32 = 0;
    for c in name.bytes() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let val = (c.to_ascii_uppercase() - b'A') as u32 + 1;
        result = result.checked_mul(26)?.checked_add(val)?;
    }

    Some(result - 1)
}

fn parse_row_digits(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let one_based: u32 = digits.parse().ok()?;
    one_based.checked_sub(1)
}
