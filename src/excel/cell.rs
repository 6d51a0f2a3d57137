use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

use crate::address::Range;
use crate::excel::date::{format_iso, is_date_format};
use crate::excel::style::{Comment, Comments, Hyperlink, RichTextRun, Style};

/// Built-in format index used for dates when no explicit pattern is given (`m/d/yy`).
pub const DEFAULT_DATE_FORMAT: u16 = 14;

/// Spreadsheet error values, with their binary record codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    NA,
    GettingData,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::Null,
        ErrorCode::Div0,
        ErrorCode::Value,
        ErrorCode::Ref,
        ErrorCode::Name,
        ErrorCode::Num,
        ErrorCode::NA,
        ErrorCode::GettingData,
    ];

    pub fn code(self) -> u8 {
        match self {
            ErrorCode::Null => 0x00,
            ErrorCode::Div0 => 0x07,
            ErrorCode::Value => 0x0F,
            ErrorCode::Ref => 0x17,
            ErrorCode::Name => 0x1D,
            ErrorCode::Num => 0x24,
            ErrorCode::NA => 0x2A,
            ErrorCode::GettingData => 0x2B,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Null => "#NULL!",
            ErrorCode::Div0 => "#DIV/0!",
            ErrorCode::Value => "#VALUE!",
            ErrorCode::Ref => "#REF!",
            ErrorCode::Name => "#NAME?",
            ErrorCode::Num => "#NUM!",
            ErrorCode::NA => "#N/A",
            ErrorCode::GettingData => "#GETTING_DATA",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// Raw value of a cell. `Stub` marks a present cell without a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum CellValue {
    #[serde(rename = "b")]
    Boolean(bool),
    #[serde(rename = "n")]
    Number(f64),
    #[serde(rename = "e")]
    Error(ErrorCode),
    #[serde(rename = "s")]
    String(String),
    #[serde(rename = "d")]
    Date(NaiveDateTime),
    #[serde(rename = "z")]
    Stub,
}

impl CellValue {
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Boolean(_) => CellType::Boolean,
            CellValue::Number(_) => CellType::Number,
            CellValue::Error(_) => CellType::Error,
            CellValue::String(_) => CellType::String,
            CellValue::Date(_) => CellType::Date,
            CellValue::Stub => CellType::Stub,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Boolean,
    Number,
    Error,
    String,
    Date,
    Stub,
}

impl CellType {
    /// Single-letter tag (`b`, `n`, `e`, `s`, `d`, `z`).
    pub fn as_char(self) -> char {
        match self {
            CellType::Boolean => 'b',
            CellType::Number => 'n',
            CellType::Error => 'e',
            CellType::String => 's',
            CellType::Date => 'd',
            CellType::Stub => 'z',
        }
    }

    pub fn from_char(tag: char) -> Option<Self> {
        match tag {
            'b' => Some(CellType::Boolean),
            'n' => Some(CellType::Number),
            'e' => Some(CellType::Error),
            's' => Some(CellType::String),
            'd' => Some(CellType::Date),
            'z' => Some(CellType::Stub),
            _ => None,
        }
    }
}

/// Explicit number format: a pattern or an index into the built-in table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberFormat {
    Index(u16),
    Code(String),
}

impl NumberFormat {
    pub fn default_date() -> Self {
        NumberFormat::Index(DEFAULT_DATE_FORMAT)
    }

    /// Pattern text; built-in indexes without a fixed pattern yield `None`.
    pub fn code(&self) -> Option<&str> {
        match self {
            NumberFormat::Code(code) => Some(code),
            NumberFormat::Index(idx) => builtin_format(*idx),
        }
    }

    pub fn is_date(&self) -> bool {
        self.code().is_some_and(is_date_format)
    }
}

impl From<&str> for NumberFormat {
    fn from(code: &str) -> Self {
        NumberFormat::Code(code.to_string())
    }
}

impl From<String> for NumberFormat {
    fn from(code: String) -> Self {
        NumberFormat::Code(code)
    }
}

impl From<u16> for NumberFormat {
    fn from(idx: u16) -> Self {
        NumberFormat::Index(idx)
    }
}

pub fn builtin_format(idx: u16) -> Option<&'static str> {
    let code = match idx {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "m/d/yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// A present cell: raw value plus optional caches and attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(flatten)]
    pub value: CellValue,
    /// Formatted text cache.
    #[serde(rename = "w", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Formula source without the leading `=`.
    #[serde(rename = "f", default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Enclosing range of an array formula.
    #[serde(rename = "F", default, skip_serializing_if = "Option::is_none")]
    pub array_range: Option<Range>,
    #[serde(rename = "R", default, skip_serializing_if = "Vec::is_empty")]
    pub rich_text: Vec<RichTextRun>,
    #[serde(rename = "h", default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Comments>,
    #[serde(rename = "z", default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<NumberFormat>,
    #[serde(rename = "l", default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<Hyperlink>,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            text: None,
            formula: None,
            array_range: None,
            rich_text: Vec::new(),
            html: None,
            comments: None,
            number_format: None,
            hyperlink: None,
            style: None,
        }
    }

    pub fn stub() -> Self {
        Self::new(CellValue::Stub)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(CellValue::Boolean(value))
    }

    pub fn number(value: f64) -> Self {
        Self::new(CellValue::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(CellValue::String(value.into()))
    }

    pub fn error(code: ErrorCode) -> Self {
        Self::new(CellValue::Error(code))
    }

    pub fn date(value: NaiveDateTime) -> Self {
        Self::new(CellValue::Date(value))
    }

    /// Formula cell with no cached result; recalculation is left to the consumer.
    pub fn formula_pending(formula: impl Into<String>) -> Self {
        let formula = formula.into();
        let mut cell = Self::stub();
        cell.formula = Some(formula.strip_prefix('=').map(str::to_string).unwrap_or(formula));
        cell
    }

    pub fn cell_type(&self) -> CellType {
        self.value.cell_type()
    }

    pub fn is_stub(&self) -> bool {
        matches!(self.value, CellValue::Stub)
    }

    pub fn has_formula(&self) -> bool {
        self.formula.is_some()
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            CellValue::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl From<CellValue> for Cell {
    fn from(value: CellValue) -> Self {
        Cell::new(value)
    }
}

pub fn cell_set_number_format(cell: &mut Cell, format: impl Into<NumberFormat>) -> &mut Cell {
    cell.number_format = Some(format.into());
    cell
}

pub fn cell_set_hyperlink<'a>(
    cell: &'a mut Cell,
    target: impl Into<String>,
    tooltip: Option<&str>,
) -> &'a mut Cell {
    cell.hyperlink = Some(Hyperlink {
        target: target.into(),
        tooltip: tooltip.map(str::to_string),
    });
    cell
}

/// Link to a location inside the workbook, e.g. `Sheet2!A1`.
pub fn cell_set_internal_link<'a>(
    cell: &'a mut Cell,
    target: &str,
    tooltip: Option<&str>,
) -> &'a mut Cell {
    let target = if target.starts_with('#') {
        target.to_string()
    } else {
        format!("#{target}")
    };
    cell_set_hyperlink(cell, target, tooltip)
}

pub fn cell_add_comment<'a>(
    cell: &'a mut Cell,
    text: impl Into<String>,
    author: Option<&str>,
) -> &'a mut Cell {
    cell.comments.get_or_insert_with(Comments::default).items.push(Comment {
        author: author.map(str::to_string),
        text: text.into(),
        rich_text: Vec::new(),
    });
    cell
}

/// Display text of a cell: the formatted cache if present, otherwise a plain rendering.
pub fn format_cell(cell: &Cell) -> String {
    if let Some(text) = &cell.text {
        return text.clone();
    }
    format_value(&cell.value)
}

pub fn format_value(value: &CellValue) -> String {
    match value {
        CellValue::Boolean(true) => "TRUE".to_string(),
        CellValue::Boolean(false) => "FALSE".to_string(),
        CellValue::Number(n) => format_number(*n),
        CellValue::Error(e) => e.to_string(),
        CellValue::String(s) => s.clone(),
        CellValue::Date(d) => format_iso(d),
        CellValue::Stub => String::new(),
    }
}

/// Shortest decimal text that round-trips; integral values carry no fraction.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return ErrorCode::Num.to_string();
    }
    if n.is_infinite() {
        return ErrorCode::Div0.to_string();
    }
    n.to_string()
}

/// Structured value exchanged with callers by importers and exporters.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(NaiveDateTime),
    List(Vec<DataValue>),
    Map(IndexMap<String, DataValue>),
    /// A fully-formed cell stored as given.
    Cell(Box<Cell>),
}

/// One keyed record, in column order.
pub type Record = IndexMap<String, DataValue>;

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text form used for header keys and lossy coercions.
    pub fn to_text(&self) -> String {
        match self {
            DataValue::Null => String::new(),
            DataValue::Bool(true) => "TRUE".to_string(),
            DataValue::Bool(false) => "FALSE".to_string(),
            DataValue::Number(n) => n.to_string(),
            DataValue::String(s) => s.clone(),
            DataValue::Date(d) => format_iso(d),
            DataValue::Cell(cell) => format_cell(cell),
            DataValue::List(_) | DataValue::Map(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

impl Serialize for DataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DataValue::Null => serializer.serialize_unit(),
            DataValue::Bool(b) => serializer.serialize_bool(*b),
            DataValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            DataValue::String(s) => serializer.serialize_str(s),
            DataValue::Date(d) => serializer.serialize_str(&format_iso(d)),
            DataValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DataValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            DataValue::Cell(cell) => cell.serialize(serializer),
        }
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Number(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Number(f64::from(value))
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Number(value as f64)
    }
}

impl From<u32> for DataValue {
    fn from(value: u32) -> Self {
        DataValue::Number(f64::from(value))
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(value)
    }
}

impl From<NaiveDateTime> for DataValue {
    fn from(value: NaiveDateTime) -> Self {
        DataValue::Date(value)
    }
}

impl From<Cell> for DataValue {
    fn from(value: Cell) -> Self {
        DataValue::Cell(Box::new(value))
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DataValue::Null, Into::into)
    }
}

impl<T: Into<DataValue>> From<Vec<T>> for DataValue {
    fn from(value: Vec<T>) -> Self {
        DataValue::List(value.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for DataValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => DataValue::Null,
            Value::Bool(b) => DataValue::Bool(b),
            Value::Number(n) => n.as_f64().map_or(DataValue::Null, DataValue::Number),
            Value::String(s) => DataValue::String(s),
            Value::Array(items) => {
                DataValue::List(items.into_iter().map(DataValue::from).collect())
            }
            Value::Object(entries) => DataValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, DataValue::from(v)))
                    .collect(),
            ),
        }
    }
}
