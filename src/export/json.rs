use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::address::{CellAddress, Range, encode_col};
use crate::error::{Result, SheetError};
use crate::excel::cell::{DataValue, Record};
use crate::excel::sheet::Sheet;
use crate::excel::workbook::Workbook;
use crate::export::converters::{ValuePolicy, display_text, extract};
use crate::export::types::{
    HeaderMode, JsonExportOptions, OrderedSheetData, WorkbookData, export_range,
};

const EMPTY_HEADER: &str = "__EMPTY";

pub fn serialize_to_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data).map_err(|source| SheetError::Serialization {
        operation: "serialize_to_json",
        source,
    })
}

/// Export a sheet as keyed records.
///
/// Blank rows are skipped unless `blank_rows` is `Some(true)`.
pub fn sheet_to_json(sheet: &Sheet, opts: &JsonExportOptions) -> Result<OrderedSheetData> {
    let range = export_range(sheet, opts.range.as_ref())?;
    let cols = visible_cols(sheet, range, opts.skip_hidden);

    let policy = policy(opts);
    let (keys, first_row) = match &opts.header {
        HeaderMode::FirstRow => (
            header_keys(sheet, range.start.row, &cols, policy),
            range.start.row.saturating_add(1),
        ),
        HeaderMode::Letters => (
            cols.iter().map(|&c| Some(encode_col(c))).collect(),
            range.start.row,
        ),
        HeaderMode::Custom(names) => (
            cols.iter()
                .map(|&c| names.get((c - range.start.col) as usize).cloned())
                .collect(),
            range.start.row,
        ),
    };

    let keep_blank = opts.blank_rows.unwrap_or(false);
    let mut records = Vec::new();

    for row in first_row..=range.end.row {
        if opts.skip_hidden && sheet.is_row_hidden(row) {
            continue;
        }
        let mut record = Record::with_capacity(keys.len());
        let mut blank = true;

        for (&col, key) in cols.iter().zip(&keys) {
            let Some(key) = key else {
                continue;
            };
            match sheet.get(CellAddress::new(row, col)).and_then(|cell| extract(cell, policy)) {
                Some(DataValue::Null) => {
                    record.insert(key.clone(), DataValue::Null);
                }
                Some(value) => {
                    blank = false;
                    record.insert(key.clone(), value);
                }
                None => {
                    if let Some(defval) = &opts.defval {
                        record.insert(key.clone(), defval.clone());
                    }
                }
            }
        }

        if !blank || keep_blank {
            records.push(record);
        }
    }

    debug!(range = %range, records = records.len(), "sheet exported as records");
    Ok(records)
}

/// Export a sheet as full-width rows; absent cells are `defval` or null.
///
/// Blank rows are kept unless `blank_rows` is `Some(false)`. The header mode
/// is ignored: every row of the range is data.
pub fn sheet_to_aoa(sheet: &Sheet, opts: &JsonExportOptions) -> Result<Vec<Vec<DataValue>>> {
    let range = export_range(sheet, opts.range.as_ref())?;
    let cols = visible_cols(sheet, range, opts.skip_hidden);
    let policy = policy(opts);
    let keep_blank = opts.blank_rows.unwrap_or(true);
    let fill = opts.defval.clone().unwrap_or_default();

    let mut rows = Vec::new();
    for row in range.start.row..=range.end.row {
        if opts.skip_hidden && sheet.is_row_hidden(row) {
            continue;
        }
        let mut blank = true;
        let values: Vec<DataValue> = cols
            .iter()
            .map(|&col| {
                let cell = sheet.get(CellAddress::new(row, col));
                match cell.and_then(|cell| extract(cell, policy)) {
                    Some(value) => {
                        blank &= value.is_null();
                        value
                    }
                    None => fill.clone(),
                }
            })
            .collect();

        if !blank || keep_blank {
            rows.push(values);
        }
    }
    Ok(rows)
}

/// Records of every sheet, keyed by sheet name.
pub fn workbook_to_json(wb: &Workbook, opts: &JsonExportOptions) -> Result<WorkbookData> {
    let mut data = WorkbookData::with_capacity(wb.len());
    for (name, sheet) in wb.sheets() {
        data.insert(name.to_string(), sheet_to_json(sheet, opts)?);
    }
    Ok(data)
}

fn policy(opts: &JsonExportOptions) -> ValuePolicy<'_> {
    ValuePolicy {
        raw: opts.raw,
        raw_numbers: opts.raw_numbers,
        date_system: opts.date_system,
        date_nf: opts.date_nf.as_deref(),
    }
}

fn visible_cols(sheet: &Sheet, range: Range, skip_hidden: bool) -> Vec<u32> {
    (range.start.col..=range.end.col)
        .filter(|&col| !(skip_hidden && sheet.is_col_hidden(col)))
        .collect()
}

/// Keys from the header row. Empty headers become `__EMPTY`; repeats get
/// `_1`, `_2`, .. suffixes.
fn header_keys(
    sheet: &Sheet,
    row: u32,
    cols: &[u32],
    policy: ValuePolicy<'_>,
) -> Vec<Option<String>> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    cols.iter()
        .map(|&col| {
            let base = sheet
                .get(CellAddress::new(row, col))
                .filter(|cell| !cell.is_stub())
                .map_or_else(
                    || EMPTY_HEADER.to_string(),
                    |cell| display_text(cell, policy.date_system, policy.date_nf),
                );

            let count = seen.get(&base).copied().unwrap_or(0);
            if count == 0 {
                seen.insert(base.clone(), 1);
                return Some(base);
            }

            let mut n = count;
            let key = loop {
                let candidate = format!("{base}_{n}");
                n += 1;
                if !seen.contains_key(&candidate) {
                    break candidate;
                }
            };
            seen.insert(base, n);
            seen.insert(key.clone(), 1);
            Some(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::cell::{Cell, ErrorCode};
    use crate::import::{AoaOptions, aoa_to_sheet};
    use pretty_assertions::assert_eq;

    fn sheet(rows: Vec<Vec<DataValue>>) -> Sheet {
        aoa_to_sheet(rows, &AoaOptions::default()).unwrap()
    }

    fn keys(record: &Record) -> Vec<&str> {
        record.keys().map(String::as_str).collect()
    }

    #[test]
    fn header_row_becomes_keys() {
        let ws = sheet(vec![
            vec!["name".into(), "qty".into()],
            vec!["bolt".into(), 4.into()],
            vec!["nut".into(), 9.into()],
        ]);
        let records = sheet_to_json(&ws, &JsonExportOptions::default()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(keys(&records[0]), ["name", "qty"]);
        assert_eq!(records[1]["name"], DataValue::from("nut"));
        assert_eq!(records[1]["qty"], DataValue::from(9.0));
    }

    #[test]
    fn empty_and_repeated_headers_are_disambiguated() {
        let ws = sheet(vec![
            vec!["a".into(), DataValue::Null, "a".into(), "a".into()],
            vec![1.into(), 2.into(), 3.into(), 4.into()],
        ]);
        let records = sheet_to_json(&ws, &JsonExportOptions::default()).unwrap();
        assert_eq!(keys(&records[0]), ["a", "__EMPTY", "a_1", "a_2"]);
    }

    #[test]
    fn letter_keys_use_every_row() {
        let ws = sheet(vec![vec!["x".into(), 1.into()], vec!["y".into(), 2.into()]]);
        let opts = JsonExportOptions {
            header: HeaderMode::Letters,
            ..JsonExportOptions::default()
        };
        let records = sheet_to_json(&ws, &opts).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(keys(&records[0]), ["A", "B"]);
        assert_eq!(records[0]["A"], DataValue::from("x"));
    }

    #[test]
    fn custom_keys_follow_column_position() {
        let ws = sheet(vec![vec![1.into(), 2.into(), 3.into()]]);
        let opts = JsonExportOptions {
            header: HeaderMode::Custom(vec!["one".into(), "two".into()]),
            ..JsonExportOptions::default()
        };
        let records = sheet_to_json(&ws, &opts).unwrap();
        assert_eq!(keys(&records[0]), ["one", "two"]);
    }

    #[test]
    fn defval_fills_absent_cells() {
        let ws = sheet(vec![
            vec!["a".into(), "b".into()],
            vec![1.into(), DataValue::Null],
        ]);
        let plain = sheet_to_json(&ws, &JsonExportOptions::default()).unwrap();
        assert_eq!(keys(&plain[0]), ["a"]);

        let filled = sheet_to_json(
            &ws,
            &JsonExportOptions {
                defval: Some(DataValue::from("")),
                ..JsonExportOptions::default()
            },
        )
        .unwrap();
        assert_eq!(filled[0]["b"], DataValue::from(""));
    }

    #[test]
    fn blank_rows_differ_between_records_and_arrays() {
        let ws = sheet(vec![
            vec!["a".into()],
            vec![1.into()],
            vec![DataValue::Null],
            vec![3.into()],
        ]);
        assert_eq!(sheet_to_json(&ws, &JsonExportOptions::default()).unwrap().len(), 2);
        assert_eq!(sheet_to_aoa(&ws, &JsonExportOptions::default()).unwrap().len(), 4);

        let with_blanks = JsonExportOptions {
            blank_rows: Some(true),
            ..JsonExportOptions::default()
        };
        assert_eq!(sheet_to_json(&ws, &with_blanks).unwrap().len(), 3);
    }

    #[test]
    fn aoa_rows_are_full_width() {
        let mut ws = sheet(vec![vec!["x".into()], vec![DataValue::Null, 2.into()]]);
        ws.set(CellAddress::new(0, 2), Cell::error(ErrorCode::Null));
        let rows = sheet_to_aoa(&ws, &JsonExportOptions::default()).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![DataValue::from("x"), DataValue::Null, DataValue::Null],
                vec![DataValue::Null, DataValue::from(2.0), DataValue::Null],
            ]
        );
    }

    #[test]
    fn formatted_mode_prefers_cached_text() {
        let mut ws = sheet(vec![vec!["pct".into()], vec![0.5.into()]]);
        ws.cell_mut(CellAddress::new(1, 0)).unwrap().text = Some("50%".into());
        let opts = JsonExportOptions {
            raw: false,
            ..JsonExportOptions::default()
        };
        let records = sheet_to_json(&ws, &opts).unwrap();
        assert_eq!(records[0]["pct"], DataValue::from("50%"));
    }

    #[test]
    fn hidden_rows_and_columns_can_be_skipped() {
        let mut ws = sheet(vec![
            vec!["a".into(), "b".into()],
            vec![1.into(), 2.into()],
            vec![3.into(), 4.into()],
        ]);
        ws.cols.entry(1).or_default().hidden = true;
        ws.rows.entry(1).or_default().hidden = true;
        let opts = JsonExportOptions {
            skip_hidden: true,
            ..JsonExportOptions::default()
        };
        let records = sheet_to_json(&ws, &opts).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(keys(&records[0]), ["a"]);
        assert_eq!(records[0]["a"], DataValue::from(3.0));
    }

    #[test]
    fn workbook_records_are_keyed_by_sheet() {
        use crate::excel::workbook::{book_append_sheet, book_new};

        let mut wb = book_new();
        let ws = sheet(vec![vec!["k".into()], vec![1.into()]]);
        book_append_sheet(&mut wb, ws, Some("Data")).unwrap();
        let data = workbook_to_json(&wb, &JsonExportOptions::default()).unwrap();
        let text = serialize_to_json(&data).unwrap();
        assert!(text.contains("\"Data\""));
        assert!(text.contains("\"k\": 1"));
    }
}
