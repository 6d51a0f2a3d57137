pub mod cell;
pub mod date;
pub mod metadata;
pub mod reader;
pub mod sheet;
pub mod style;
pub mod workbook;
pub mod writer;

pub use cell::{
    Cell, CellType, CellValue, DataValue, ErrorCode, NumberFormat, Record, cell_add_comment,
    cell_set_hyperlink, cell_set_internal_link, cell_set_number_format, format_cell,
};
pub use date::DateSystem;
pub use metadata::{ColInfo, RowInfo, Visibility};
pub use reader::{ReadOptions, read_workbook};
pub use sheet::{Sheet, get_computed_style, sheet_set_array_formula, sheet_set_range_style};
pub use style::{Border, BorderStyle, Color, RangeStyle, Style, apply_style_delta};
pub use workbook::{
    NameCollision, SheetRef, Workbook, WorkbookConfig, book_append_sheet, book_new,
    book_set_sheet_visibility,
};
pub use writer::write_xlsx;
