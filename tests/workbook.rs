use pretty_assertions::assert_eq;
use sheet_interchange::excel::NameCollision;
use sheet_interchange::{
    Sheet, SheetError, SheetRef, Visibility, Workbook, WorkbookConfig, book_append_sheet, book_new,
    book_set_sheet_visibility,
};

fn names(wb: &Workbook) -> Vec<String> {
    wb.sheet_names().map(str::to_string).collect()
}

#[test]
fn duplicate_appends_never_share_a_name() {
    let mut wb = book_new();
    let first = book_append_sheet(&mut wb, Sheet::new(), Some("Sheet1")).unwrap();
    let second = book_append_sheet(&mut wb, Sheet::new(), Some("Sheet1")).unwrap();

    assert_eq!(first, "Sheet1");
    assert_ne!(first, second);
    assert_eq!(names(&wb), ["Sheet1", "Sheet2"]);
}

#[test]
fn collisions_can_be_rejected() {
    let mut wb = Workbook::with_config(WorkbookConfig {
        on_name_collision: NameCollision::Error,
        ..WorkbookConfig::default()
    });
    book_append_sheet(&mut wb, Sheet::new(), Some("Data")).unwrap();
    let err = book_append_sheet(&mut wb, Sheet::new(), Some("Data")).unwrap_err();
    assert!(matches!(err, SheetError::DuplicateSheetName { .. }));
    assert_eq!(wb.len(), 1);
}

#[test]
fn case_insensitive_policy_detects_collisions() {
    let mut wb = Workbook::with_config(WorkbookConfig {
        case_sensitive_names: false,
        ..WorkbookConfig::default()
    });
    book_append_sheet(&mut wb, Sheet::new(), Some("Report")).unwrap();
    let renamed = book_append_sheet(&mut wb, Sheet::new(), Some("REPORT")).unwrap();
    assert_eq!(renamed, "REPORT1");
    assert!(wb.sheet("report").is_ok());
}

#[test]
fn visibility_by_index_or_name() {
    let mut wb = book_new();
    book_append_sheet(&mut wb, Sheet::new(), None).unwrap();
    book_append_sheet(&mut wb, Sheet::new(), Some("Hidden")).unwrap();

    book_set_sheet_visibility(&mut wb, SheetRef::Name("Hidden"), Visibility::Hidden).unwrap();
    book_set_sheet_visibility(&mut wb, SheetRef::Index(0), Visibility::VeryHidden).unwrap();

    assert_eq!(wb.sheet("Hidden").unwrap().visibility, Visibility::Hidden);
    assert_eq!(wb.sheet(0usize).unwrap().visibility, Visibility::VeryHidden);
}

#[test]
fn unknown_sheets_are_reported() {
    let mut wb = book_new();
    let err = book_set_sheet_visibility(&mut wb, SheetRef::Name("Nope"), Visibility::Hidden).unwrap_err();
    match err {
        SheetError::UnknownSheet { sheet, .. } => assert_eq!(sheet, "Nope"),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(book_set_sheet_visibility(&mut wb, SheetRef::Index(3), Visibility::Visible).is_err());
}

#[test]
fn visibility_codes_are_checked() {
    assert_eq!(Visibility::try_from(2u8).unwrap(), Visibility::VeryHidden);
    assert!(matches!(
        Visibility::try_from(3u8),
        Err(SheetError::InvalidVisibility { value: 3, .. })
    ));
}

#[test]
fn invalid_names_are_rejected() {
    let mut wb = book_new();
    for bad in ["", "a/b", "'quoted'", "x[1]"] {
        let err = book_append_sheet(&mut wb, Sheet::new(), Some(bad)).unwrap_err();
        assert!(matches!(err, SheetError::InvalidSheetName { .. }), "{bad:?}");
    }
    assert!(wb.is_empty());
}

#[test]
fn removed_sheets_come_back_out() {
    let mut wb = book_new();
    book_append_sheet(&mut wb, Sheet::new(), Some("A")).unwrap();
    book_append_sheet(&mut wb, Sheet::new(), Some("B")).unwrap();
    let (name, _) = wb.remove_sheet("A").unwrap();
    assert_eq!(name, "A");
    assert_eq!(names(&wb), ["B"]);
    assert_eq!(wb.resolve(SheetRef::Name("B")).unwrap(), 0);
}
