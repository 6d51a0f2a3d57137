mod converters;
mod csv;
mod formulae;
mod html;
mod json;
mod types;

pub use converters::{display_text, raw_value};
pub use csv::{sheet_to_csv, sheet_to_txt};
pub use formulae::sheet_to_formulae;
pub use html::{escape_html, sheet_to_html};
pub use json::{serialize_to_json, sheet_to_aoa, sheet_to_json, workbook_to_json};
pub use types::{
    CsvExportOptions, DEFAULT_HTML_FOOTER, DEFAULT_HTML_HEADER, HeaderMode, HtmlExportOptions,
    JsonExportOptions, OrderedSheetData, RangeSelector, WorkbookData,
};
