use crate::address::Range;
use crate::error::Result;
use crate::excel::cell::DataValue;
use crate::excel::sheet::Sheet;
use crate::import::infer::value_to_cell;
use crate::import::types::AoaOptions;

/// Build a sheet from rows of values.
pub fn aoa_to_sheet<I, R, V>(data: I, opts: &AoaOptions) -> Result<Sheet>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = V>,
    V: Into<DataValue>,
{
    let mut sheet = Sheet::new();
    sheet_add_aoa(&mut sheet, data, opts)?;
    Ok(sheet)
}

/// Merge rows of values into `sheet` starting at `opts.origin`.
///
/// Existing cells outside the written positions are kept. On error the sheet
/// is left untouched.
pub fn sheet_add_aoa<I, R, V>(sheet: &mut Sheet, data: I, opts: &AoaOptions) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = V>,
    V: Into<DataValue>,
{
    let origin = opts.origin.resolve(sheet, "sheet_add_aoa")?;
    let mut staged = Vec::new();
    let mut touched: Option<Range> = None;

    for (r, row) in data.into_iter().enumerate() {
        for (c, value) in row.into_iter().enumerate() {
            let addr = origin.offset(r, c, "sheet_add_aoa")?;
            let value = value.into();

            // Nulls extend the range even when no cell is written for them.
            match &mut touched {
                Some(range) => range.extend_to(addr),
                None => touched = Some(Range::single(addr)),
            }

            if let Some(cell) = value_to_cell(&value, opts, sheet.get(addr), "sheet_add_aoa")? {
                staged.push((addr, cell));
            }
        }
    }

    sheet.commit(staged);
    if let Some(touched) = touched {
        cover_range(sheet, touched);
    }
    Ok(())
}

/// Make the used range cover `range`, declaring a dimension only when the
/// written cells alone do not reach it.
pub(crate) fn cover_range(sheet: &mut Sheet, range: Range) {
    let used = sheet.used_range();
    let covered = used.union(&range);
    if covered != used {
        sheet.set_dimension_override(covered);
    }
}
