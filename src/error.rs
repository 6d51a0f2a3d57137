use thiserror::Error;

pub type Result<T> = std::result::Result<T, SheetError>;

/// Failures surfaced by the interchange core.
///
/// Every variant that stems from caller input carries the offending input and
/// the name of the operation that rejected it.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("{operation}: malformed address `{input}`")]
    MalformedAddress {
        input: String,
        operation: &'static str,
    },

    #[error("{operation}: unknown sheet `{sheet}`")]
    UnknownSheet {
        sheet: String,
        operation: &'static str,
    },

    #[error("{operation}: sheet name `{name}` is already in use")]
    DuplicateSheetName {
        name: String,
        operation: &'static str,
    },

    #[error("{operation}: invalid sheet name `{name}`: {reason}")]
    InvalidSheetName {
        name: String,
        reason: &'static str,
        operation: &'static str,
    },

    #[error("{operation}: invalid range `{input}`")]
    InvalidRange {
        input: String,
        operation: &'static str,
    },

    #[error("{operation}: cannot classify value `{value}`")]
    TypeCoercionFailure {
        value: String,
        operation: &'static str,
    },

    #[error("{operation}: invalid sheet visibility {value} (expected 0, 1 or 2)")]
    InvalidVisibility { value: u8, operation: &'static str },

    #[error("{operation}: serialization failed")]
    Serialization {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation}: delimited text could not be tokenized")]
    Csv {
        operation: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("unable to read workbook `{path}`")]
    Reader {
        path: String,
        #[source]
        source: calamine::Error,
    },

    #[error("unable to write workbook `{path}`")]
    Writer {
        path: String,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SheetError {
    pub(crate) fn malformed(input: impl Into<String>, operation: &'static str) -> Self {
        SheetError::MalformedAddress {
            input: input.into(),
            operation,
        }
    }

    pub(crate) fn unknown_sheet(sheet: impl Into<String>, operation: &'static str) -> Self {
        SheetError::UnknownSheet {
            sheet: sheet.into(),
            operation,
        }
    }
}
