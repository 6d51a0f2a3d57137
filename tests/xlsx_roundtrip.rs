use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sheet_interchange::{
    Cell, CellAddress, CellValue, Range, ReadOptions, Sheet, Visibility, book_append_sheet,
    book_new, book_set_sheet_visibility, read_workbook, write_xlsx,
};
use sheet_interchange::excel::metadata::{
    AutoFilter, ComparisonOperator, ConditionalFormat, ConditionalRule, DataValidation,
    ProtectInfo, Threshold, ValidationRule,
};
use sheet_interchange::excel::style::{Color, Style};
use tempfile::TempDir;

fn at(a1: &str) -> CellAddress {
    CellAddress::from_a1(a1).unwrap()
}

#[test]
fn written_workbooks_read_back() {
    let when = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();

    let mut data = Sheet::new();
    data.set(at("A1"), Cell::string("name"));
    data.set(at("B1"), Cell::number(2.0));
    data.set(at("C1"), Cell::boolean(true));
    data.set(at("A2"), Cell::date(when));
    let mut doubled = Cell::number(4.0);
    doubled.formula = Some("B1*2".into());
    data.set(at("B2"), doubled);
    data.set(at("A3"), Cell::string("merged"));
    data.merges.push(Range::from_a1("A3:B3").unwrap());

    let mut wb = book_new();
    book_append_sheet(&mut wb, data, Some("Data")).unwrap();
    book_append_sheet(&mut wb, Sheet::new(), Some("Notes")).unwrap();
    book_set_sheet_visibility(&mut wb, "Notes".into(), Visibility::Hidden).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.xlsx");
    write_xlsx(&wb, &path).unwrap();

    let back = read_workbook(&path, &ReadOptions::default()).unwrap();
    assert_eq!(back.sheet_names().collect::<Vec<_>>(), ["Data", "Notes"]);
    assert_eq!(back.sheet("Notes").unwrap().visibility, Visibility::Hidden);

    let sheet = back.sheet("Data").unwrap();
    assert_eq!(sheet.get(at("A1")).unwrap().value, CellValue::String("name".into()));
    assert_eq!(sheet.get(at("B1")).unwrap().value, CellValue::Number(2.0));
    assert_eq!(sheet.get(at("B1")).unwrap().text.as_deref(), Some("2"));
    assert_eq!(sheet.get(at("C1")).unwrap().value, CellValue::Boolean(true));
    assert_eq!(sheet.get(at("A2")).unwrap().value, CellValue::Date(when));

    let formula = sheet.get(at("B2")).unwrap();
    assert_eq!(formula.formula.as_deref(), Some("B1*2"));
    assert_eq!(formula.value, CellValue::Number(4.0));
}

#[test]
fn sheet_selection_and_row_caps_apply() {
    let mut tall = Sheet::new();
    for row in 0..10 {
        tall.set(CellAddress::new(row, 0), Cell::number(f64::from(row)));
    }
    let mut wb = book_new();
    book_append_sheet(&mut wb, Sheet::new(), Some("Skip")).unwrap();
    book_append_sheet(&mut wb, tall, Some("Tall")).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tall.xlsx");
    write_xlsx(&wb, &path).unwrap();

    let opts = ReadOptions {
        sheets: Some(vec!["Tall".into()]),
        sheet_rows: Some(3),
        ..ReadOptions::default()
    };
    let back = read_workbook(&path, &opts).unwrap();
    assert_eq!(back.len(), 1);

    let sheet = back.sheet(0usize).unwrap();
    assert_eq!(sheet.len(), 3);
    assert_eq!(sheet.used_range().to_a1(), "A1:A3");
    assert_eq!(sheet.full_range.map(|r| r.to_a1()).as_deref(), Some("A1:A10"));
}

fn sheet_xml(path: &Path) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut xml = String::new();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

#[test]
fn sheet_rules_and_protection_are_written() {
    let mut sheet = Sheet::new();
    sheet.set(at("A1"), Cell::string("score"));
    sheet.set(at("B1"), Cell::string("ok"));
    sheet.set(at("A2"), Cell::number(7.0));
    sheet.set(at("A3"), Cell::number(12.0));

    let mut choice = DataValidation::new(
        Range::from_a1("B2:B3").unwrap(),
        ValidationRule::List { values: vec!["yes".into(), "no".into()], formula: None },
    );
    choice.prompt = Some("pick one".into());
    sheet.validations.push(choice);
    sheet.validations.push(DataValidation::new(
        Range::from_a1("A2:A3").unwrap(),
        ValidationRule::Whole {
            operator: ComparisonOperator::Between,
            formula1: "0".into(),
            formula2: Some("100".into()),
        },
    ));

    let mut fill = Style::default();
    fill.fg_color = Some(Color::Rgb(0xFFC7CE));
    sheet.conditional_formats.push(ConditionalFormat {
        range: Range::from_a1("A2:A3").unwrap(),
        rule: ConditionalRule::CellValue {
            operator: ComparisonOperator::GreaterThan,
            formula1: "10".into(),
            formula2: None,
        },
        style: Some(fill),
        priority: 1,
        stop_if_true: false,
    });
    sheet.conditional_formats.push(ConditionalFormat {
        range: Range::from_a1("A2:A3").unwrap(),
        rule: ConditionalRule::IconSet {
            icon_style: "3Arrows".into(),
            thresholds: vec![Threshold::Percent(0.0), Threshold::Percent(33.0), Threshold::Percent(67.0)],
            reverse: false,
            show_value: true,
        },
        style: None,
        priority: 2,
        stop_if_true: false,
    });

    sheet.autofilter = Some(AutoFilter { range: Range::from_a1("A1:B3").unwrap() });
    sheet.protection = Some(ProtectInfo {
        select_locked_cells: true,
        select_unlocked_cells: true,
        format_rows: true,
        ..ProtectInfo::default()
    });

    let mut wb = book_new();
    book_append_sheet(&mut wb, sheet, Some("Rules")).unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.xlsx");
    write_xlsx(&wb, &path).unwrap();

    let xml = sheet_xml(&path);
    assert!(xml.contains(r#"<autoFilter ref="A1:B3"/>"#), "{xml}");
    assert!(xml.contains(r#"<dataValidation type="list""#), "{xml}");
    assert!(xml.contains(r#"<formula1>"yes,no"</formula1>"#), "{xml}");
    assert!(xml.contains(r#"<dataValidation type="whole""#), "{xml}");
    assert!(xml.contains(r#"<conditionalFormatting sqref="A2:A3">"#), "{xml}");
    assert!(xml.contains(r#"type="cellIs""#), "{xml}");
    assert!(xml.contains(r#"iconSet="3Arrows""#), "{xml}");
    assert!(xml.contains("<sheetProtection"), "{xml}");
    assert!(xml.contains(r#"formatRows="0""#), "{xml}");

    // Cells still read back alongside the rules.
    let back = read_workbook(&path, &ReadOptions::default()).unwrap();
    let rules = back.sheet("Rules").unwrap();
    assert_eq!(rules.get(at("A3")).unwrap().value, CellValue::Number(12.0));
}

#[test]
fn missing_files_report_their_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.xlsx");
    let err = read_workbook(&path, &ReadOptions::default()).unwrap_err();
    assert!(err.to_string().contains("absent.xlsx"), "{err}");
}
