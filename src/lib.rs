//! In-memory spreadsheet model and the conversions around it.
//!
//! A [`Workbook`] holds named [`Sheet`]s; each sheet is a sparse map from
//! [`CellAddress`] to [`Cell`]. Importers build sheets from rows of values,
//! keyed records, tokenized tables and delimited text. Exporters turn them
//! back into records, rows, delimited text, HTML and formula listings.
//! `read_workbook` and `write_xlsx` connect the model to spreadsheet files.

pub mod address;
pub mod error;
pub mod excel;
pub mod export;
pub mod import;

pub use address::{
    CellAddress, Range, decode_cell, decode_col, decode_range, decode_row, encode_cell, encode_col,
    encode_range, encode_row,
};
pub use error::{Result, SheetError};
pub use excel::{
    Cell, CellType, CellValue, DataValue, DateSystem, ErrorCode, NumberFormat, ReadOptions, Record,
    Sheet, SheetRef, Visibility, Workbook, WorkbookConfig, book_append_sheet, book_new,
    book_set_sheet_visibility, read_workbook, write_xlsx,
};
pub use export::{
    CsvExportOptions, HeaderMode, HtmlExportOptions, JsonExportOptions, RangeSelector,
    serialize_to_json, sheet_to_aoa, sheet_to_csv, sheet_to_formulae, sheet_to_html,
    sheet_to_json, sheet_to_txt, workbook_to_json,
};
pub use import::{
    AoaOptions, CsvImportOptions, JsonImportOptions, Origin, TableOptions, aoa_to_sheet,
    csv_to_sheet, json_to_sheet, records_to_sheet, sheet_add_aoa, sheet_add_json, sheet_add_table,
    table_to_book, table_to_sheet,
};
