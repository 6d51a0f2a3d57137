use crate::address::CellAddress;
use crate::error::Result;
use crate::excel::cell::{Cell, CellValue, format_number};
use crate::excel::sheet::Sheet;
use crate::export::converters::display_text;
use crate::export::types::{CsvExportOptions, export_range};

/// Export a sheet as delimited text. Every record, the last included, ends
/// with `rs`.
///
/// Fields containing `fs`, `rs`, a quote or a line break are wrapped in
/// quotes with inner quotes doubled. Formulas without a cached value are
/// written as `=FORMULA`; styles and rich text are dropped.
pub fn sheet_to_csv(sheet: &Sheet, opts: &CsvExportOptions) -> Result<String> {
    let range = export_range(sheet, opts.range.as_ref())?;
    let cols: Vec<u32> = (range.start.col..=range.end.col)
        .filter(|&col| !(opts.skip_hidden && sheet.is_col_hidden(col)))
        .collect();

    let mut out = String::new();
    for row in range.start.row..=range.end.row {
        if opts.skip_hidden && sheet.is_row_hidden(row) {
            continue;
        }

        let mut blank = true;
        let mut fields = Vec::with_capacity(cols.len());
        for &col in &cols {
            let field = sheet
                .get(CellAddress::new(row, col))
                .and_then(|cell| field_text(cell, opts))
                .unwrap_or_default();
            blank &= field.is_empty();
            fields.push(field);
        }

        if blank && !opts.blank_rows {
            continue;
        }
        if opts.strip {
            while fields.last().is_some_and(String::is_empty) {
                fields.pop();
            }
        }

        out.push_str(&fields.join(&opts.fs));
        out.push_str(&opts.rs);
    }
    Ok(out)
}

/// Tab-separated text.
pub fn sheet_to_txt(sheet: &Sheet, opts: &CsvExportOptions) -> Result<String> {
    let opts = CsvExportOptions {
        fs: "\t".to_string(),
        ..opts.clone()
    };
    sheet_to_csv(sheet, &opts)
}

fn field_text(cell: &Cell, opts: &CsvExportOptions) -> Option<String> {
    match &cell.value {
        CellValue::Stub => {
            let formula = cell.formula.as_deref().filter(|_| cell.array_range.is_none())?;
            Some(escape(format!("={formula}"), opts))
        }
        CellValue::Number(n) if opts.raw_numbers => Some(escape(format_number(*n), opts)),
        _ => {
            let text = display_text(cell, opts.date_system, opts.date_nf.as_deref());
            Some(escape(text, opts))
        }
    }
}

fn escape(text: String, opts: &CsvExportOptions) -> String {
    let needs_quotes = (opts.force_quotes && !text.is_empty())
        || holds(&text, &opts.fs)
        || holds(&text, &opts.rs)
        || text.contains(['"', '\r', '\n']);
    if needs_quotes { quote(&text) } else { text }
}

fn holds(text: &str, separator: &str) -> bool {
    !separator.is_empty() && text.contains(separator)
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}
