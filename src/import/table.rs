use chrono::NaiveDateTime;
use tracing::debug;

use crate::address::{CellAddress, Range};
use crate::error::{Result, SheetError};
use crate::excel::cell::{Cell, CellValue, ErrorCode, NumberFormat};
use crate::excel::sheet::Sheet;
use crate::excel::style::{Border, Style};
use crate::excel::workbook::{Workbook, book_append_sheet, book_new};
use crate::import::aoa::cover_range;
use crate::import::infer::{date_cell, fuzzy_date, fuzzy_number, infer_text, parse_bool};
use crate::import::types::{CsvImportOptions, TableCell, TableOptions, TableRow};

const OPERATION: &str = "sheet_add_table";

/// Build a sheet from host-tokenized table rows.
pub fn table_to_sheet(rows: &[TableRow], opts: &TableOptions) -> Result<Sheet> {
    let mut sheet = Sheet::new();
    sheet_add_table(&mut sheet, rows, opts)?;
    Ok(sheet)
}

/// Wrap a converted table in a single-sheet workbook.
pub fn table_to_book(rows: &[TableRow], opts: &TableOptions) -> Result<Workbook> {
    let mut wb = book_new();
    wb.date_system = opts.date_system;
    book_append_sheet(&mut wb, table_to_sheet(rows, opts)?, None)?;
    Ok(wb)
}

/// Merge table rows into `sheet`.
///
/// Cells covered by a row span from an earlier row are skipped over, spans
/// become merges, and `sheet_rows` caps the rows read (the full extent is
/// recorded in `full_range`).
pub fn sheet_add_table(sheet: &mut Sheet, rows: &[TableRow], opts: &TableOptions) -> Result<()> {
    let origin = opts.origin.resolve(sheet, OPERATION)?;
    let row_cap = opts.sheet_rows.filter(|&cap| cap > 0).unwrap_or(u32::MAX);

    let mut merges = sheet.merges.clone();
    let mut hidden_rows = Vec::new();
    let mut staged = Vec::new();
    let mut extent = Range::single(origin);
    let mut r: u32 = 0;
    let mut consumed = 0;

    for table_row in rows {
        if r >= row_cap {
            break;
        }
        consumed += 1;

        let row = origin.offset(r as usize, 0, OPERATION)?.row;
        if table_row.hidden {
            if opts.display {
                continue;
            }
            hidden_rows.push(row);
        }

        let mut c: u32 = 0;
        for table_cell in &table_row.cells {
            if opts.display && table_cell.hidden {
                continue;
            }

            // Step past positions owned by a span opened in an earlier row.
            let mut addr = CellAddress::new(row, origin.col).offset(0, c as usize, OPERATION)?;
            while let Some(span) = merges
                .iter()
                .find(|m| m.start.col == addr.col && m.start.row < row && row <= m.end.row)
            {
                addr = CellAddress::new(row, span.end.col).offset(0, 1, OPERATION)?;
            }
            c = addr.col - origin.col;

            let (rowspan, colspan) = (table_cell.rowspan.max(1), table_cell.colspan.max(1));
            if rowspan > 1 || colspan > 1 {
                let end = addr.offset((rowspan - 1) as usize, (colspan - 1) as usize, OPERATION)?;
                merges.push(Range::new(addr, end));
            }

            if let Some(cell) = table_cell_to_cell(table_cell, opts) {
                staged.push((addr, cell));
            }
            extent.extend_to(addr);
            c = c.saturating_add(colspan);
        }
        extent.extend_to(CellAddress::new(row, origin.col));
        r += 1;
    }

    debug!(rows = r, cells = staged.len(), merges = merges.len(), "table staged");

    sheet.commit(staged);
    sheet.merges = merges;
    for row in hidden_rows {
        sheet.rows.entry(row).or_default().hidden = true;
    }
    if r > 0 {
        cover_range(sheet, extent);
    }

    if consumed < rows.len() {
        let mut full = sheet.used_range();
        let skipped = u32::try_from(rows.len() - consumed).unwrap_or(u32::MAX);
        full.end.row = extent.end.row.saturating_add(skipped);
        sheet.full_range = Some(full);
    }
    Ok(())
}

fn table_cell_to_cell(source: &TableCell, opts: &TableOptions) -> Option<Cell> {
    let text = source.data_v.as_deref().unwrap_or(&source.text);

    let mut cell = if text.is_empty() {
        match source.data_t {
            Some('s') => Cell::string(""),
            _ if opts.sheet_stubs || source.data_t == Some('z') => Cell::stub(),
            _ => return None,
        }
    } else {
        typed_cell(text, source.data_t, opts)
    };

    if cell.number_format.is_none() {
        if let Some(z) = &source.data_z {
            cell.number_format = Some(NumberFormat::from(z.as_str()));
        }
    }

    if let Some(href) = &source.href {
        let lower = href.to_ascii_lowercase();
        if !href.starts_with('#') && !lower.starts_with("javascript:") {
            crate::excel::cell::cell_set_hyperlink(&mut cell, href.as_str(), None);
        }
    }

    if opts.borders {
        let style = Style {
            top: source.borders.top.as_deref().and_then(Border::from_css),
            bottom: source.borders.bottom.as_deref().and_then(Border::from_css),
            left: source.borders.left.as_deref().and_then(Border::from_css),
            right: source.borders.right.as_deref().and_then(Border::from_css),
            ..Style::default()
        };
        if !style.is_empty() {
            cell.style = Some(style);
        }
    }

    Some(cell)
}

fn typed_cell(text: &str, data_t: Option<char>, opts: &TableOptions) -> Cell {
    let explicit = match data_t {
        Some('s') => Some(Cell::string(text)),
        Some('n') => fuzzy_number(text).map(Cell::number),
        Some('b') => match text {
            "1" => Some(Cell::boolean(true)),
            "0" => Some(Cell::boolean(false)),
            _ => parse_bool(text).map(Cell::boolean),
        },
        Some('e') => parse_error(text).map(|code| {
            let mut cell = Cell::error(code);
            cell.text = Some(text.to_string());
            cell
        }),
        Some('d') => fuzzy_date(text).map(|d| dated(d, opts)),
        Some('z') => Some(Cell::stub()),
        _ => None,
    };
    if let Some(cell) = explicit {
        return cell;
    }

    if opts.raw {
        return Cell::string(text);
    }
    match infer_text(text, opts.raw_dates) {
        CellValue::Date(d) => dated(d, opts),
        value => Cell::new(value),
    }
}

/// Error text (`#N/A`) or its numeric record code (`42`).
fn parse_error(text: &str) -> Option<ErrorCode> {
    text.parse::<ErrorCode>()
        .ok()
        .or_else(|| text.trim().parse::<u8>().ok().and_then(ErrorCode::from_code))
}

fn dated(value: NaiveDateTime, opts: &TableOptions) -> Cell {
    date_cell(value, opts.cell_dates, opts.date_nf.as_deref(), opts.date_system)
}

/// Tokenize delimited text and feed it through the table pipeline.
pub fn csv_to_sheet(text: &str, opts: &CsvImportOptions) -> Result<Sheet> {
    let mut sheet = Sheet::new();
    sheet_add_csv(&mut sheet, text, opts)?;
    Ok(sheet)
}

pub fn sheet_add_csv(sheet: &mut Sheet, text: &str, opts: &CsvImportOptions) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .quote(opts.quote)
        .has_headers(false)
        // Ragged records are kept as they are.
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| SheetError::Csv {
            operation: "csv_to_sheet",
            source,
        })?;
        rows.push(TableRow::new(record.iter()));
    }

    sheet_add_table(sheet, &rows, &opts.table)
}
