use crate::excel::cell::{Cell, CellValue, DataValue, ErrorCode, format_value};
use crate::excel::date::{DateSystem, format_date, format_iso};

/// How a cell is turned into an exported value.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValuePolicy<'a> {
    pub raw: bool,
    pub raw_numbers: bool,
    pub date_system: DateSystem,
    pub date_nf: Option<&'a str>,
}

/// Exported value of a cell.
///
/// `None` means the position is treated as absent: stubs, pending formulas
/// and error cells other than `#NULL!`, which exports as an explicit null.
pub(crate) fn extract(cell: &Cell, policy: ValuePolicy<'_>) -> Option<DataValue> {
    match &cell.value {
        CellValue::Stub => None,
        CellValue::Error(ErrorCode::Null) => Some(DataValue::Null),
        CellValue::Error(_) => None,
        value => {
            let keep_raw =
                policy.raw || (policy.raw_numbers && matches!(value, CellValue::Number(_)));
            Some(if keep_raw {
                raw_value(cell, policy.date_system)
            } else {
                DataValue::String(display_text(cell, policy.date_system, policy.date_nf))
            })
        }
    }
}

/// Raw value; numbers carrying a date format come back as timestamps.
pub fn raw_value(cell: &Cell, date_system: DateSystem) -> DataValue {
    match &cell.value {
        CellValue::Boolean(b) => DataValue::Bool(*b),
        CellValue::Number(n) => match date_serial(cell, *n, date_system) {
            Some(date) => DataValue::Date(date),
            None => DataValue::Number(*n),
        },
        CellValue::String(s) => DataValue::String(s.clone()),
        CellValue::Date(d) => DataValue::Date(*d),
        CellValue::Error(e) => DataValue::String(e.to_string()),
        CellValue::Stub => DataValue::Null,
    }
}

/// Formatted text when cached, otherwise a best-effort rendering.
///
/// A `date_nf` code replaces the rendering of date cells, cached text
/// included.
pub fn display_text(cell: &Cell, date_system: DateSystem, date_nf: Option<&str>) -> String {
    let date = match &cell.value {
        CellValue::Date(date) => Some(*date),
        CellValue::Number(n) => date_serial(cell, *n, date_system),
        _ => None,
    };
    if let (Some(date), Some(code)) = (date, date_nf) {
        return format_date(&date, code);
    }
    if let Some(text) = &cell.text {
        return text.clone();
    }
    match (date, &cell.value) {
        (Some(date), CellValue::Number(_)) => format_iso(&date),
        (_, value) => format_value(value),
    }
}

fn date_serial(cell: &Cell, serial: f64, date_system: DateSystem) -> Option<chrono::NaiveDateTime> {
    cell.number_format
        .as_ref()
        .filter(|format| format.is_date())
        .and_then(|_| date_system.from_serial(serial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::cell::NumberFormat;
    use chrono::NaiveDate;

    const RAW: ValuePolicy<'static> = ValuePolicy {
        raw: true,
        raw_numbers: false,
        date_system: DateSystem::Excel1900,
        date_nf: None,
    };
    const FORMATTED: ValuePolicy<'static> = ValuePolicy { raw: false, ..RAW };

    #[test]
    fn dated_numbers_export_as_dates() {
        let mut cell = Cell::number(45293.0);
        cell.number_format = Some(NumberFormat::default_date());
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(extract(&cell, RAW), Some(DataValue::Date(expected)));
        assert_eq!(extract(&cell, FORMATTED), Some(DataValue::String("2024-01-02".into())));
    }

    #[test]
    fn date_nf_overrides_date_rendering() {
        let mut serial = Cell::number(45293.0);
        serial.number_format = Some(NumberFormat::default_date());
        serial.text = Some("1/2/24".into());
        let stamped = Cell::date(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(9, 30, 0).unwrap(),
        );
        let policy = ValuePolicy { date_nf: Some("dd.mm.yyyy"), ..FORMATTED };

        assert_eq!(extract(&serial, policy), Some(DataValue::String("02.01.2024".into())));
        assert_eq!(extract(&stamped, policy), Some(DataValue::String("02.01.2024".into())));
        assert_eq!(extract(&Cell::number(7.0), policy), Some(DataValue::String("7".into())));
        assert_eq!(display_text(&serial, DateSystem::Excel1900, None), "1/2/24");
    }

    #[test]
    fn cached_text_wins_when_formatted() {
        let mut cell = Cell::number(0.5);
        cell.text = Some("50%".into());
        assert_eq!(extract(&cell, FORMATTED), Some(DataValue::String("50%".into())));
        assert_eq!(extract(&cell, RAW), Some(DataValue::Number(0.5)));
        assert_eq!(
            extract(&cell, ValuePolicy { raw_numbers: true, ..FORMATTED }),
            Some(DataValue::Number(0.5))
        );
    }

    #[test]
    fn errors_and_stubs_are_absent() {
        assert_eq!(extract(&Cell::stub(), RAW), None);
        assert_eq!(extract(&Cell::formula_pending("A1+1"), RAW), None);
        assert_eq!(extract(&Cell::error(ErrorCode::NA), RAW), None);
        assert_eq!(extract(&Cell::error(ErrorCode::Null), RAW), Some(DataValue::Null));
    }
}
