use crate::address::CellAddress;
use crate::excel::cell::{Cell, CellValue, format_number};
use crate::excel::date::format_iso;
use crate::excel::sheet::Sheet;

/// List every cell as an assignment, in row-major order.
///
/// Formulas are written as `A1=SUM(B1:B3)`, array formulas once under their
/// range (`A1:A3=B1:B3*2`), numbers and booleans bare, and text with a
/// leading `'`.
pub fn sheet_to_formulae(sheet: &Sheet) -> Vec<String> {
    sheet
        .cells()
        .filter_map(|(addr, cell)| assignment(addr, cell))
        .collect()
}

fn assignment(addr: CellAddress, cell: &Cell) -> Option<String> {
    if let Some(array) = cell.array_range {
        let formula = cell.formula.as_deref()?;
        return Some(format!("{}:{}={formula}", array.start, array.end));
    }
    if let Some(formula) = &cell.formula {
        return Some(format!("{addr}={formula}"));
    }

    let value = match &cell.value {
        CellValue::Stub => return None,
        CellValue::Number(n) => format_number(*n),
        CellValue::Boolean(true) => "TRUE".to_string(),
        CellValue::Boolean(false) => "FALSE".to_string(),
        _ if cell.text.is_some() => format!("'{}", cell.text.as_deref().unwrap_or_default()),
        CellValue::String(s) => format!("'{s}"),
        CellValue::Date(d) => format_iso(d),
        CellValue::Error(e) => e.to_string(),
    };
    Some(format!("{addr}={value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Range;
    use crate::excel::cell::ErrorCode;
    use crate::excel::sheet::sheet_set_array_formula;
    use pretty_assertions::assert_eq;

    #[test]
    fn cells_are_listed_row_major() {
        let mut ws = Sheet::new();
        ws.set(CellAddress::new(1, 0), Cell::boolean(true));
        ws.set(CellAddress::new(0, 1), Cell::string("label"));
        ws.set(CellAddress::new(0, 0), Cell::number(3.5));
        ws.set(CellAddress::new(1, 1), Cell::formula_pending("=A1*2"));
        ws.set(CellAddress::new(2, 0), Cell::error(ErrorCode::NA));
        ws.set(CellAddress::new(2, 1), Cell::stub());

        assert_eq!(
            sheet_to_formulae(&ws),
            ["A1=3.5", "B1='label", "A2=TRUE", "B2=A1*2", "A3=#N/A"]
        );
    }

    #[test]
    fn array_formulas_are_listed_once() {
        let mut ws = Sheet::new();
        sheet_set_array_formula(&mut ws, Range::from_a1("C1:C2").unwrap(), "A1:A2*2");
        sheet_set_array_formula(&mut ws, Range::from_a1("D1").unwrap(), "1+1");
        assert_eq!(sheet_to_formulae(&ws), ["C1:C2=A1:A2*2", "D1:D1=1+1"]);
    }
}
