use indexmap::IndexSet;
use serde::Serialize;
use serde_json::Value;

use crate::address::Range;
use crate::error::{Result, SheetError};
use crate::excel::cell::{Cell, DataValue, Record};
use crate::excel::sheet::Sheet;
use crate::import::aoa::cover_range;
use crate::import::infer::value_to_cell;
use crate::import::types::JsonImportOptions;

const OPERATION: &str = "sheet_add_json";

/// Build a sheet from keyed records: one header row, then one row per record.
pub fn json_to_sheet(records: &[Record], opts: &JsonImportOptions) -> Result<Sheet> {
    let mut sheet = Sheet::new();
    sheet_add_json(&mut sheet, records, opts)?;
    Ok(sheet)
}

/// Merge keyed records into `sheet`.
///
/// Column order is `opts.header` when given (other keys are dropped),
/// otherwise the union of keys in first-seen order. A key missing from a
/// record leaves its cell absent.
pub fn sheet_add_json(
    sheet: &mut Sheet,
    records: &[Record],
    opts: &JsonImportOptions,
) -> Result<()> {
    let header: Vec<String> = match &opts.header {
        Some(header) => header.clone(),
        None => records
            .iter()
            .flat_map(|record| record.keys().cloned())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect(),
    };

    let origin = opts.base.origin.resolve(sheet, OPERATION)?;
    let offset = usize::from(!opts.skip_header);
    let mut staged = Vec::new();

    if !opts.skip_header {
        for (c, key) in header.iter().enumerate() {
            let addr = origin.offset(0, c, OPERATION)?;
            staged.push((addr, Cell::string(key.as_str())));
        }
    }

    for (r, record) in records.iter().enumerate() {
        for (c, key) in header.iter().enumerate() {
            let Some(value) = record.get(key) else {
                continue;
            };
            let addr = origin.offset(offset + r, c, OPERATION)?;
            let existing = sheet.get(addr);
            if let Some(cell) = value_to_cell(value, &opts.base, existing, OPERATION)? {
                staged.push((addr, cell));
            }
        }
    }

    let rows = records.len() + offset;
    let extent = match (rows, header.len()) {
        (0, _) | (_, 0) => None,
        (rows, cols) => Some(Range::new(origin, origin.offset(rows - 1, cols - 1, OPERATION)?)),
    };

    sheet.commit(staged);
    if let Some(extent) = extent {
        cover_range(sheet, extent);
    }
    Ok(())
}

/// Build a sheet from any serializable record type; key order is the
/// serialized field order.
pub fn records_to_sheet<T: Serialize>(records: &[T], opts: &JsonImportOptions) -> Result<Sheet> {
    let records = records
        .iter()
        .map(to_record)
        .collect::<Result<Vec<_>>>()?;
    json_to_sheet(&records, opts)
}

fn to_record<T: Serialize>(record: &T) -> Result<Record> {
    let value = serde_json::to_value(record).map_err(|source| SheetError::Serialization {
        operation: "records_to_sheet",
        source,
    })?;
    match value {
        Value::Object(fields) => Ok(fields
            .into_iter()
            .map(|(key, value)| (key, DataValue::from(value)))
            .collect()),
        other => Err(SheetError::TypeCoercionFailure {
            value: other.to_string(),
            operation: "records_to_sheet",
        }),
    }
}
