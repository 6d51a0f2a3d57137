use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sheet_interchange::import::{TableCell, TableRow};
use sheet_interchange::{
    AoaOptions, CellAddress, CellValue, CsvImportOptions, DataValue, ErrorCode, JsonImportOptions,
    Origin, Record, SheetError, TableOptions, aoa_to_sheet, csv_to_sheet, json_to_sheet,
    records_to_sheet, sheet_add_aoa, sheet_add_json, table_to_sheet,
};

fn at(a1: &str) -> CellAddress {
    CellAddress::from_a1(a1).unwrap()
}

fn record(pairs: &[(&str, DataValue)]) -> Record {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn aoa_dates_keep_their_timestamp() {
    let when = NaiveDate::from_ymd_opt(2023, 6, 30).unwrap().and_hms_opt(12, 0, 0).unwrap();
    let sheet = aoa_to_sheet(vec![vec![DataValue::from(when)]], &AoaOptions::default()).unwrap();
    let cell = sheet.get(at("A1")).unwrap();
    assert_eq!(cell.value, CellValue::Date(when));
    assert!(cell.number_format.as_ref().is_some_and(|f| f.is_date()));
}

#[test]
fn formula_detection_can_be_disabled() {
    let opts = AoaOptions {
        formulas: false,
        ..AoaOptions::default()
    };
    let sheet = aoa_to_sheet(vec![vec!["=1+1"]], &opts).unwrap();
    let cell = sheet.get(at("A1")).unwrap();
    assert_eq!(cell.value, CellValue::String("=1+1".into()));
    assert!(cell.formula.is_none());
}

#[test]
fn strict_mode_rejects_unclassifiable_values() {
    let opts = AoaOptions {
        strict: true,
        ..AoaOptions::default()
    };
    let err = aoa_to_sheet(vec![vec![DataValue::from(f64::INFINITY)]], &opts).unwrap_err();
    match err {
        SheetError::TypeCoercionFailure { operation, .. } => assert_eq!(operation, "sheet_add_aoa"),
        other => panic!("unexpected error {other:?}"),
    }

    let lenient = aoa_to_sheet(vec![vec![DataValue::from(f64::INFINITY)]], &AoaOptions::default()).unwrap();
    assert_eq!(lenient.get(at("A1")).unwrap().value, CellValue::Error(ErrorCode::Div0));
}

#[test]
fn row_origin_starts_at_column_a() {
    let mut sheet = aoa_to_sheet(vec![vec!["top"]], &AoaOptions::default()).unwrap();
    let opts = AoaOptions {
        origin: Origin::Row(4),
        ..AoaOptions::default()
    };
    sheet_add_aoa(&mut sheet, vec![vec!["below"]], &opts).unwrap();
    assert_eq!(sheet.get(at("A5")).unwrap().value, CellValue::String("below".into()));
    assert_eq!(sheet.used_range().to_a1(), "A1:A5");
}

#[test]
fn json_key_union_leaves_missing_keys_absent() {
    let records = [
        record(&[("a", DataValue::from(1))]),
        record(&[("b", DataValue::from(2))]),
    ];
    let sheet = json_to_sheet(&records, &JsonImportOptions::default()).unwrap();

    assert_eq!(sheet.get(at("A1")).unwrap().value, CellValue::String("a".into()));
    assert_eq!(sheet.get(at("B1")).unwrap().value, CellValue::String("b".into()));
    assert_eq!(sheet.get(at("A2")).unwrap().value, CellValue::Number(1.0));
    assert!(sheet.get(at("B2")).is_none());
    assert!(sheet.get(at("A3")).is_none());
    assert_eq!(sheet.get(at("B3")).unwrap().value, CellValue::Number(2.0));
}

#[test]
fn json_append_adds_rows_under_existing_data() {
    let mut sheet = json_to_sheet(&[record(&[("id", DataValue::from(1))])], &JsonImportOptions::default()).unwrap();
    let opts = JsonImportOptions {
        base: AoaOptions {
            origin: Origin::Append,
            ..AoaOptions::default()
        },
        header: Some(vec!["id".into()]),
        skip_header: true,
    };
    sheet_add_json(&mut sheet, &[record(&[("id", DataValue::from(2))])], &opts).unwrap();
    assert_eq!(sheet.get(at("A3")).unwrap().value, CellValue::Number(2.0));
    assert_eq!(sheet.used_range().to_a1(), "A1:A3");
}

#[test]
fn json_values_from_serde_are_typed() {
    let records: Vec<serde_json::Value> = serde_json::from_str(
        r#"[{"name": "a", "ok": true, "n": 1.5, "missing": null, "tags": ["x"]}]"#,
    )
    .unwrap();
    let sheet = records_to_sheet(&records, &JsonImportOptions::default()).unwrap();

    assert_eq!(sheet.get(at("B2")).unwrap().value, CellValue::Boolean(true));
    assert_eq!(sheet.get(at("C2")).unwrap().value, CellValue::Number(1.5));
    assert!(sheet.get(at("D2")).is_none());
    assert_eq!(sheet.get(at("E2")).unwrap().value, CellValue::String("[\"x\"]".into()));
}

#[test]
fn tables_honor_display_and_spans() {
    let mut hidden_row = TableRow::new(["skip", "me"]);
    hidden_row.hidden = true;
    let rows = [
        TableRow::new([TableCell::new("Title").with_span(1, 3)]),
        hidden_row,
        TableRow::new([TableCell::from("1"), TableCell::new("2").hidden(), TableCell::from("3")]),
    ];
    let opts = TableOptions {
        display: true,
        ..TableOptions::default()
    };
    let sheet = table_to_sheet(&rows, &opts).unwrap();

    assert_eq!(sheet.merges, vec![sheet_interchange::Range::from_a1("A1:C1").unwrap()]);
    assert_eq!(sheet.get(at("A2")).unwrap().value, CellValue::Number(1.0));
    assert_eq!(sheet.get(at("B2")).unwrap().value, CellValue::Number(3.0));
    assert!(sheet.get(at("A3")).is_none());
}

#[test]
fn csv_quotes_and_custom_delimiters() {
    let opts = CsvImportOptions {
        delimiter: b';',
        ..CsvImportOptions::default()
    };
    let sheet = csv_to_sheet("a;\"b;c\";\"say \"\"hi\"\"\"\n", &opts).unwrap();
    assert_eq!(sheet.get(at("B1")).unwrap().value, CellValue::String("b;c".into()));
    assert_eq!(sheet.get(at("C1")).unwrap().value, CellValue::String("say \"hi\"".into()));
}

#[test]
fn csv_ragged_rows_keep_their_width() {
    let sheet = csv_to_sheet("a,b,c\nd\n", &CsvImportOptions::default()).unwrap();
    assert_eq!(sheet.used_range().to_a1(), "A1:C2");
    assert!(sheet.get(at("B2")).is_none());
}

#[test]
fn raw_tables_keep_text() {
    let opts = TableOptions {
        raw: true,
        ..TableOptions::default()
    };
    let sheet = table_to_sheet(&[TableRow::new(["007", "TRUE"])], &opts).unwrap();
    assert_eq!(sheet.get(at("A1")).unwrap().value, CellValue::String("007".into()));
    assert_eq!(sheet.get(at("B1")).unwrap().value, CellValue::String("TRUE".into()));
}
