mod aoa;
pub mod infer;
mod json;
mod table;
mod types;

pub use aoa::{aoa_to_sheet, sheet_add_aoa};
pub use json::{json_to_sheet, records_to_sheet, sheet_add_json};
pub use table::{csv_to_sheet, sheet_add_csv, sheet_add_table, table_to_book, table_to_sheet};
pub use types::{
    AoaOptions, CssBorders, CsvImportOptions, JsonImportOptions, Origin, TableCell, TableOptions,
    TableRow,
};
