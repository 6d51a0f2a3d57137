use std::str::FromStr;

use indexmap::IndexMap;

use crate::address::{MAX_COLS, MAX_ROWS, Range, decode_range};
use crate::error::Result;
use crate::excel::cell::{DataValue, Record};
use crate::excel::date::DateSystem;
use crate::excel::sheet::Sheet;

pub type OrderedSheetData = Vec<Record>;

/// Every sheet's records, keyed by sheet name in workbook order.
pub type WorkbookData = IndexMap<String, OrderedSheetData>;

/// Where record keys come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HeaderMode {
    /// The first row of the range supplies the keys.
    #[default]
    FirstRow,
    /// Column letters (`A`, `B`, ..); every row is data.
    Letters,
    /// Caller-supplied keys by column position; every row is data.
    Custom(Vec<String>),
}

impl FromStr for HeaderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "A" | "letters" => Ok(HeaderMode::Letters),
            "keys" | "first" | "first-row" => Ok(HeaderMode::FirstRow),
            other => Err(format!("unknown header mode `{other}` (expected keys or A)")),
        }
    }
}

/// Region an exporter walks instead of the used range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSelector {
    Range(Range),
    A1(String),
    /// The used range starting at this 0-based row.
    StartRow(u32),
}

impl RangeSelector {
    /// The region to walk. Full-column and full-row references stop at the
    /// sheet's used range.
    pub(crate) fn resolve(&self, sheet: &Sheet) -> Result<Range> {
        match self {
            RangeSelector::Range(range) => Ok(clamp_open_ends(*range, sheet.used_range())),
            RangeSelector::A1(text) => {
                Ok(clamp_open_ends(decode_range(text)?, sheet.used_range()))
            }
            RangeSelector::StartRow(row) => {
                let mut range = sheet.used_range();
                range.start.row = *row;
                range.end.row = range.end.row.max(*row);
                Ok(range)
            }
        }
    }
}

fn clamp_open_ends(mut range: Range, used: Range) -> Range {
    if range.end.row >= MAX_ROWS - 1 {
        range.end.row = used.end.row.max(range.start.row);
    }
    if range.end.col >= MAX_COLS - 1 {
        range.end.col = used.end.col.max(range.start.col);
    }
    range
}

pub(crate) fn export_range(sheet: &Sheet, selector: Option<&RangeSelector>) -> Result<Range> {
    selector.map_or_else(|| Ok(sheet.used_range()), |selector| selector.resolve(sheet))
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonExportOptions {
    pub header: HeaderMode,
    pub range: Option<RangeSelector>,
    /// Emit rows with no values. Defaults to skipping them for records and
    /// keeping them for row arrays.
    pub blank_rows: Option<bool>,
    /// Stand-in for absent cells.
    pub defval: Option<DataValue>,
    /// Raw values; when off the formatted text is used.
    pub raw: bool,
    /// Keep numbers raw even when `raw` is off.
    pub raw_numbers: bool,
    pub skip_hidden: bool,
    pub date_system: DateSystem,
    /// Number format for date cells in formatted output.
    pub date_nf: Option<String>,
}

impl Default for JsonExportOptions {
    fn default() -> Self {
        Self {
            header: HeaderMode::default(),
            range: None,
            blank_rows: None,
            defval: None,
            raw: true,
            raw_numbers: false,
            skip_hidden: false,
            date_system: DateSystem::default(),
            date_nf: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvExportOptions {
    /// Field separator.
    pub fs: String,
    /// Record separator, written after every record.
    pub rs: String,
    /// Drop trailing empty fields.
    pub strip: bool,
    pub blank_rows: bool,
    pub skip_hidden: bool,
    /// Quote every non-empty field.
    pub force_quotes: bool,
    /// Write numbers raw instead of their formatted text.
    pub raw_numbers: bool,
    pub range: Option<RangeSelector>,
    pub date_system: DateSystem,
    /// Number format for date cells; their cached text is ignored.
    pub date_nf: Option<String>,
}

impl Default for CsvExportOptions {
    fn default() -> Self {
        Self {
            fs: ",".to_string(),
            rs: "\n".to_string(),
            strip: false,
            blank_rows: true,
            skip_hidden: false,
            force_quotes: false,
            raw_numbers: false,
            range: None,
            date_system: DateSystem::default(),
            date_nf: None,
        }
    }
}

pub const DEFAULT_HTML_HEADER: &str =
    "<html><head><meta charset=\"utf-8\"/><title>Sheet Export</title></head><body>";
pub const DEFAULT_HTML_FOOTER: &str = "</body></html>";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlExportOptions {
    /// Table id, also the prefix of every cell id.
    pub id: Option<String>,
    /// Wrap cell content in `contenteditable` spans.
    pub editable: bool,
    /// Document prologue; the built-in one when unset.
    pub header: Option<String>,
    pub footer: Option<String>,
    /// Border color of the grid lines; no borders when unset.
    pub gridcolor: Option<String>,
    pub range: Option<RangeSelector>,
    /// Epoch for numbers carrying a date format.
    pub date_system: DateSystem,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::CellAddress;
    use crate::excel::cell::Cell;

    #[test]
    fn header_modes_parse() {
        assert_eq!("A".parse::<HeaderMode>(), Ok(HeaderMode::Letters));
        assert_eq!("keys".parse::<HeaderMode>(), Ok(HeaderMode::FirstRow));
        assert!("sideways".parse::<HeaderMode>().is_err());
    }

    #[test]
    fn start_row_keeps_used_columns() {
        let mut sheet = Sheet::new();
        sheet.set(CellAddress::new(4, 2), Cell::number(1.0));
        let range = RangeSelector::StartRow(2).resolve(&sheet).unwrap();
        assert_eq!(range.to_a1(), "A3:C5");
    }

    #[test]
    fn open_ended_references_are_clamped() {
        let mut sheet = Sheet::new();
        sheet.set(CellAddress::new(2, 3), Cell::number(1.0));
        let resolve = |a1: &str| RangeSelector::A1(a1.into()).resolve(&sheet).unwrap().to_a1();

        assert_eq!(resolve("B:C"), "B1:C3");
        assert_eq!(resolve("2:2"), "A2:D2");
        assert_eq!(resolve("F:G"), "F1:G3");
        assert_eq!(resolve("B2:E9"), "B2:E9");
    }

    #[test]
    fn a1_ranges_must_parse() {
        let sheet = Sheet::new();
        assert!(RangeSelector::A1("B2:??".into()).resolve(&sheet).is_err());
        assert_eq!(
            export_range(&sheet, Some(&RangeSelector::A1("B2:C3".into()))).unwrap().to_a1(),
            "B2:C3"
        );
    }
}
