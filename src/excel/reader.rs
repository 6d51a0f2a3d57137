use std::path::Path;

use calamine::{CellErrorType, Data, Reader, SheetVisible, open_workbook_auto};
use tracing::{debug, info};

use crate::address::{CellAddress, Range};
use crate::error::{Result, SheetError};
use crate::excel::cell::{Cell, ErrorCode, NumberFormat, format_cell};
use crate::excel::metadata::Visibility;
use crate::excel::sheet::Sheet;
use crate::excel::workbook::{DefinedName, Workbook, book_append_sheet, book_new};
use crate::import::infer::fuzzy_date;

/// Options honored when materializing a workbook from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Keep date cells as timestamps instead of numeric serials.
    pub cell_dates: bool,
    /// Attach formula source text to cells.
    pub cell_formula: bool,
    /// Fill each cell's formatted text.
    pub cell_text: bool,
    /// Accepted for compatibility; the reader carries no style records.
    pub cell_styles: bool,
    /// Keep at most this many rows per sheet.
    pub sheet_rows: Option<u32>,
    /// Materialize empty cells inside the source range as stubs.
    pub sheet_stubs: bool,
    /// Storage layout hint; the store is always sparse.
    pub dense: bool,
    /// Only load these sheets, in workbook order.
    pub sheets: Option<Vec<String>>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            cell_dates: true,
            cell_formula: true,
            cell_text: true,
            cell_styles: false,
            sheet_rows: None,
            sheet_stubs: false,
            dense: false,
            sheets: None,
        }
    }
}

/// Read an `xlsx`/`xlsm`/`xlsb`/`xls`/`ods` file into a [`Workbook`].
pub fn read_workbook<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Workbook> {
    let path_str = path.as_ref().to_string_lossy().to_string();
    let reader_err = |source| SheetError::Reader {
        path: path_str.clone(),
        source,
    };

    info!(path = %path_str, "reading workbook");
    let mut source = open_workbook_auto(&path).map_err(reader_err)?;

    let metadata = source.sheets_metadata().to_vec();
    let defined_names = source.defined_names().to_vec();
    let mut wb = book_new();

    for meta in &metadata {
        if let Some(wanted) = &options.sheets {
            if !wanted.iter().any(|name| name == &meta.name) {
                continue;
            }
        }

        let range = source.worksheet_range(&meta.name).map_err(reader_err)?;
        let formulas = if options.cell_formula {
            Some(source.worksheet_formula(&meta.name).map_err(reader_err)?)
        } else {
            None
        };

        let mut sheet = sheet_from_range(&range, formulas.as_ref(), options);
        sheet.visibility = match meta.visible {
            SheetVisible::Visible => Visibility::Visible,
            SheetVisible::Hidden => Visibility::Hidden,
            SheetVisible::VeryHidden => Visibility::VeryHidden,
        };

        debug!(sheet = %meta.name, cells = sheet.len(), "loaded worksheet");
        book_append_sheet(&mut wb, sheet, Some(&meta.name))?;
    }

    wb.defined_names = defined_names
        .into_iter()
        .map(|(name, reference)| DefinedName {
            name,
            reference,
            sheet: None,
            comment: None,
            hidden: false,
        })
        .collect();

    info!(path = %path_str, sheets = wb.len(), "workbook loaded");
    Ok(wb)
}

fn sheet_from_range(
    range: &calamine::Range<Data>,
    formulas: Option<&calamine::Range<String>>,
    options: &ReadOptions,
) -> Sheet {
    let mut sheet = Sheet::new();
    let Some((start_row, start_col)) = range.start() else {
        return sheet;
    };
    let (end_row, end_col) = range.end().unwrap_or((start_row, start_col));
    let source_range = Range::new(
        CellAddress::new(start_row, start_col),
        CellAddress::new(end_row, end_col),
    );

    let row_cap = options.sheet_rows.map(|rows| rows.saturating_sub(1));
    let within_cap = |row: u32| row_cap.is_none_or(|cap| row <= cap);

    let mut dimension = source_range;
    if let Some(cap) = row_cap {
        if end_row > cap {
            dimension.end.row = cap.max(start_row);
            sheet.full_range = Some(source_range);
        }
    }
    sheet.set_dimension_override(dimension);

    let cells: Box<dyn Iterator<Item = (usize, usize, &Data)>> = if options.sheet_stubs {
        Box::new(range.cells())
    } else {
        Box::new(range.used_cells())
    };

    for (row, col, value) in cells {
        let addr = CellAddress::new(start_row + row as u32, start_col + col as u32);
        if !within_cap(addr.row) {
            continue;
        }
        if let Some(mut cell) = convert_data(value, options) {
            if options.cell_text && !cell.is_stub() {
                cell.text = Some(format_cell(&cell));
            }
            sheet.set(addr, cell);
        }
    }

    if let Some(formulas) = formulas {
        if let Some((f_row, f_col)) = formulas.start() {
            for (row, col, formula) in formulas.used_cells() {
                if formula.is_empty() {
                    continue;
                }
                let addr = CellAddress::new(f_row + row as u32, f_col + col as u32);
                if !within_cap(addr.row) {
                    continue;
                }
                match sheet.cell_mut(addr) {
                    Some(cell) => cell.formula = Some(formula.clone()),
                    None => {
                        sheet.set(addr, Cell::formula_pending(formula.as_str()));
                    }
                }
            }
        }
    }

    sheet
}

fn convert_data(value: &Data, options: &ReadOptions) -> Option<Cell> {
    let cell = match value {
        Data::Empty => {
            if !options.sheet_stubs {
                return None;
            }
            Cell::stub()
        }
        Data::String(s) => Cell::string(s.as_str()),
        Data::Float(f) => Cell::number(*f),
        Data::Int(i) => Cell::number(*i as f64),
        Data::Bool(b) => Cell::boolean(*b),
        Data::Error(e) => Cell::error(convert_error(e)),
        Data::DateTime(dt) => {
            let mut cell = match dt.as_datetime() {
                Some(timestamp) if options.cell_dates => Cell::date(timestamp),
                _ => Cell::number(dt.as_f64()),
            };
            cell.number_format = Some(NumberFormat::default_date());
            cell
        }
        Data::DateTimeIso(s) => {
            match fuzzy_date(s) {
                Some(timestamp) => {
                    let mut cell = Cell::date(timestamp);
                    cell.number_format = Some(NumberFormat::default_date());
                    cell
                }
                None => Cell::string(s.as_str()),
            }
        }
        Data::DurationIso(s) => Cell::string(s.as_str()),
    };
    Some(cell)
}

fn convert_error(e: &CellErrorType) -> ErrorCode {
    match e {
        CellErrorType::Div0 => ErrorCode::Div0,
        CellErrorType::NA => ErrorCode::NA,
        CellErrorType::Name => ErrorCode::Name,
        CellErrorType::Null => ErrorCode::Null,
        CellErrorType::Num => ErrorCode::Num,
        CellErrorType::Ref => ErrorCode::Ref,
        CellErrorType::Value => ErrorCode::Value,
        CellErrorType::GettingData => ErrorCode::GettingData,
    }
}
