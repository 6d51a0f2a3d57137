//! Value classification shared by the importers.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::error::{Result, SheetError};
use crate::excel::cell::{Cell, CellValue, DataValue, ErrorCode, NumberFormat};
use crate::excel::date::DateSystem;
use crate::import::types::AoaOptions;

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%m/%d/%y", "%d-%b-%Y"];

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Build the cell for one structured value.
///
/// `Ok(None)` means no cell is written at that position. `existing` is the cell
/// currently stored there; its number format survives the overwrite.
pub(crate) fn value_to_cell(
    value: &DataValue,
    opts: &AoaOptions,
    existing: Option<&Cell>,
    operation: &'static str,
) -> Result<Option<Cell>> {
    let mut cell = match value {
        DataValue::Cell(cell) => return Ok(Some((**cell).clone())),
        DataValue::Null if opts.null_error => Cell::error(ErrorCode::Null),
        DataValue::Null if opts.sheet_stubs => Cell::stub(),
        DataValue::Null => return Ok(None),
        DataValue::Bool(b) => Cell::boolean(*b),
        DataValue::Number(n) if n.is_finite() => Cell::number(*n),
        DataValue::Number(n) => {
            if opts.strict {
                return Err(coercion_failure(n.to_string(), operation));
            }
            let code = if n.is_nan() { ErrorCode::Num } else { ErrorCode::Div0 };
            warn!(value = %n, %code, "non-finite number stored as error");
            Cell::error(code)
        }
        DataValue::Date(d) => {
            date_cell(*d, opts.cell_dates, opts.date_nf.as_deref(), opts.date_system)
        }
        DataValue::String(s) => match s.strip_prefix('=') {
            Some(formula) if opts.formulas && !formula.is_empty() => Cell::formula_pending(formula),
            _ => Cell::string(s.as_str()),
        },
        DataValue::List(_) | DataValue::Map(_) => {
            let text = value.to_text();
            if opts.strict {
                return Err(coercion_failure(text, operation));
            }
            warn!(value = %text, "composite value stored as text");
            Cell::string(text)
        }
    };

    if let Some(format) = existing.and_then(|prev| prev.number_format.as_ref()) {
        cell.number_format = Some(format.clone());
    }
    Ok(Some(cell))
}

fn coercion_failure(value: String, operation: &'static str) -> SheetError {
    SheetError::TypeCoercionFailure { value, operation }
}

/// Date cell honoring the timestamp/serial choice and the date format override.
pub(crate) fn date_cell(
    value: NaiveDateTime,
    cell_dates: bool,
    date_nf: Option<&str>,
    date_system: DateSystem,
) -> Cell {
    let mut cell = if cell_dates {
        Cell::date(value)
    } else {
        Cell::number(date_system.to_serial(value))
    };
    cell.number_format = Some(date_nf.map_or_else(NumberFormat::default_date, NumberFormat::from));
    cell
}

/// Classify free text: booleans, numbers, dates (unless `raw_dates`), else text.
pub fn infer_text(text: &str, raw_dates: bool) -> CellValue {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return CellValue::String(text.to_string());
    }
    if let Some(b) = parse_bool(trimmed) {
        return CellValue::Boolean(b);
    }
    if let Some(n) = fuzzy_number(trimmed) {
        return CellValue::Number(n);
    }
    if !raw_dates {
        if let Some(d) = fuzzy_date(trimmed) {
            return CellValue::Date(d);
        }
    }
    CellValue::String(text.to_string())
}

pub fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse numbers written for people: `1,234.5`, `$12`, `45%`, `(3.5)`.
pub fn fuzzy_number(text: &str) -> Option<f64> {
    let s = text.trim();
    if let Some(n) = plain_number(s) {
        return Some(n);
    }
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut scale = 1.0;
    let mut cleaned = String::with_capacity(s.len());
    let chars: Vec<char> = s.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        match c {
            ',' => {
                let between_digits = i > 0
                    && chars[i - 1].is_ascii_digit()
                    && chars.get(i + 1).is_some_and(char::is_ascii_digit);
                if !between_digits {
                    return None;
                }
            }
            '$' => {}
            '%' => scale *= 100.0,
            _ => cleaned.push(c),
        }
    }

    if let Some(n) = plain_number(&cleaned) {
        return Some(n / scale);
    }

    let inner = cleaned.strip_prefix('(')?.strip_suffix(')')?;
    plain_number(inner).map(|n| -n / scale)
}

/// Strict decimal grammar; rejects `inf`, `nan` and hex forms the std parser or
/// a permissive caller might accept.
fn plain_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty()
        || !s
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
        || !s.bytes().any(|b| b.is_ascii_digit())
    {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn fuzzy_date(text: &str) -> Option<NaiveDateTime> {
    let s = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn fuzzy_numbers_accept_human_notation() {
        assert_eq!(fuzzy_number("1,234.5"), Some(1234.5));
        assert_eq!(fuzzy_number("$12"), Some(12.0));
        assert_eq!(fuzzy_number("45%"), Some(0.45));
        assert_eq!(fuzzy_number("(3.5)"), Some(-3.5));
        assert_eq!(fuzzy_number("-7e2"), Some(-700.0));
        assert_eq!(fuzzy_number("1,2,3"), Some(123.0));
    }

    #[test]
    fn fuzzy_numbers_reject_non_numbers() {
        for text in ["inf", "NaN", "infinity", "1,", ",5", "abc", "12abc", "0x1F", "--"] {
            assert_eq!(fuzzy_number(text), None, "{text}");
        }
    }

    #[test]
    fn fuzzy_dates_cover_common_layouts() {
        assert_eq!(fuzzy_date("2024-01-02"), Some(ymd(2024, 1, 2)));
        assert_eq!(fuzzy_date("1/2/2024"), Some(ymd(2024, 1, 2)));
        assert_eq!(fuzzy_date("2024/1/2"), Some(ymd(2024, 1, 2)));
        assert_eq!(fuzzy_date("2-Jan-2024"), Some(ymd(2024, 1, 2)));
        assert_eq!(
            fuzzy_date("2024-01-02T03:04:05"),
            Some(ymd(2024, 1, 2) + chrono::Duration::seconds(3 * 3600 + 4 * 60 + 5))
        );
        assert_eq!(fuzzy_date("tomorrow"), None);
    }

    #[test]
    fn text_inference_order() {
        assert_eq!(infer_text("TRUE", false), CellValue::Boolean(true));
        assert_eq!(infer_text("42", false), CellValue::Number(42.0));
        assert_eq!(infer_text("2024-01-02", false), CellValue::Date(ymd(2024, 1, 2)));
        assert_eq!(
            infer_text("2024-01-02", true),
            CellValue::String("2024-01-02".to_string())
        );
        assert_eq!(infer_text("hello", false), CellValue::String("hello".to_string()));
    }

    #[test]
    fn strict_mode_rejects_composites() {
        let opts = AoaOptions {
            strict: true,
            ..AoaOptions::default()
        };
        let list = DataValue::List(vec![DataValue::from(1.0)]);
        let err = value_to_cell(&list, &opts, None, "test").unwrap_err();
        assert!(matches!(err, SheetError::TypeCoercionFailure { .. }));

        let lenient = value_to_cell(&list, &AoaOptions::default(), None, "test").unwrap();
        assert_eq!(lenient.unwrap().value, CellValue::String("[1]".to_string()));
    }

    #[test]
    fn overwrites_keep_the_existing_number_format() {
        let mut prev = Cell::number(1.0);
        prev.number_format = Some("0.00%".into());
        let cell = value_to_cell(&DataValue::from(0.5), &AoaOptions::default(), Some(&prev), "test")
            .unwrap()
            .unwrap();
        assert_eq!(cell.number_format, Some("0.00%".into()));
    }

    #[test]
    fn dates_become_serials_when_cell_dates_is_off() {
        let opts = AoaOptions {
            cell_dates: false,
            date_nf: Some("yyyy-mm-dd".to_string()),
            ..AoaOptions::default()
        };
        let cell = value_to_cell(&DataValue::from(ymd(2024, 1, 2)), &opts, None, "test")
            .unwrap()
            .unwrap();
        assert_eq!(cell.value, CellValue::Number(45293.0));
        assert_eq!(cell.number_format, Some("yyyy-mm-dd".into()));
    }
}
