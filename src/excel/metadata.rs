//! Sheet-level metadata kept alongside the cell store.
//!
//! None of these lists are derived from cell contents; they are carried
//! verbatim between readers, importers and writers.

use serde::{Deserialize, Serialize};

use crate::address::Range;
use crate::excel::cell::NumberFormat;
use crate::excel::style::{Color, Style};

/// Column sizing and visibility override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColInfo {
    /// Width in the format's native units.
    pub width: Option<f64>,
    /// Width in screen pixels.
    pub wpx: Option<f64>,
    /// Width in characters.
    pub wch: Option<f64>,
    #[serde(default)]
    pub hidden: bool,
    /// Outline level, 0 when not grouped.
    #[serde(default)]
    pub level: u8,
    pub style: Option<Style>,
    pub number_format: Option<NumberFormat>,
}

/// Row sizing and visibility override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowInfo {
    #[serde(default)]
    pub hidden: bool,
    /// Height in screen pixels.
    pub hpx: Option<f64>,
    /// Height in points.
    pub hpt: Option<f64>,
    #[serde(default)]
    pub level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonOperator {
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValidationRule {
    Any,
    Whole {
        operator: ComparisonOperator,
        formula1: String,
        formula2: Option<String>,
    },
    Decimal {
        operator: ComparisonOperator,
        formula1: String,
        formula2: Option<String>,
    },
    Date {
        operator: ComparisonOperator,
        formula1: String,
        formula2: Option<String>,
    },
    Time {
        operator: ComparisonOperator,
        formula1: String,
        formula2: Option<String>,
    },
    TextLength {
        operator: ComparisonOperator,
        formula1: String,
        formula2: Option<String>,
    },
    /// Either a literal list of choices or a formula (`$A$1:$A$5`).
    List {
        values: Vec<String>,
        formula: Option<String>,
    },
    Custom {
        formula: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorAlertStyle {
    #[default]
    Stop,
    Warning,
    Information,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidation {
    pub range: Range,
    pub rule: ValidationRule,
    #[serde(default)]
    pub allow_blank: bool,
    pub prompt_title: Option<String>,
    pub prompt: Option<String>,
    pub error_title: Option<String>,
    pub error: Option<String>,
    #[serde(default)]
    pub error_style: ErrorAlertStyle,
}

impl DataValidation {
    pub fn new(range: Range, rule: ValidationRule) -> Self {
        Self {
            range,
            rule,
            allow_blank: true,
            prompt_title: None,
            prompt: None,
            error_title: None,
            error: None,
            error_style: ErrorAlertStyle::Stop,
        }
    }
}

/// Threshold of a color scale, data bar or icon set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Threshold {
    Min,
    Max,
    Number(f64),
    Percent(f64),
    Percentile(f64),
    Formula(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextMatch {
    Contains,
    NotContains,
    BeginsWith,
    EndsWith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePeriod {
    Yesterday,
    Today,
    Tomorrow,
    Last7Days,
    LastWeek,
    ThisWeek,
    NextWeek,
    LastMonth,
    ThisMonth,
    NextMonth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConditionalRule {
    Formula {
        formula: String,
    },
    CellValue {
        operator: ComparisonOperator,
        formula1: String,
        formula2: Option<String>,
    },
    Text {
        operator: TextMatch,
        text: String,
    },
    Blank {
        negate: bool,
    },
    Error {
        negate: bool,
    },
    Duplicate,
    Unique,
    Average {
        above: bool,
        equal: bool,
        std_dev: Option<u8>,
    },
    Rank {
        top: bool,
        rank: u32,
        percent: bool,
    },
    Date {
        period: DatePeriod,
    },
    DataBar {
        min: Threshold,
        max: Threshold,
        color: Color,
    },
    IconSet {
        icon_style: String,
        thresholds: Vec<Threshold>,
        reverse: bool,
        show_value: bool,
    },
    ColorScale {
        stops: Vec<(Threshold, Color)>,
    },
}

/// Conditional format: a rule plus the differential style it applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalFormat {
    pub range: Range,
    pub rule: ConditionalRule,
    pub style: Option<Style>,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub stop_if_true: bool,
}

/// Worksheet protection. `true` on a permission flag means the action is allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtectInfo {
    /// Opaque password hash; hashing itself is a codec concern.
    pub password_hash: Option<String>,
    pub select_locked_cells: bool,
    pub select_unlocked_cells: bool,
    pub format_cells: bool,
    pub format_columns: bool,
    pub format_rows: bool,
    pub insert_columns: bool,
    pub insert_rows: bool,
    pub insert_hyperlinks: bool,
    pub delete_columns: bool,
    pub delete_rows: bool,
    pub sort: bool,
    pub auto_filter: bool,
    pub pivot_tables: bool,
    pub objects: bool,
    pub scenarios: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoFilter {
    pub range: Range,
}

/// Page margins in inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginInfo {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for MarginInfo {
    fn default() -> Self {
        Self {
            left: 0.7,
            right: 0.7,
            top: 0.75,
            bottom: 0.75,
            header: 0.3,
            footer: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintSettings {
    pub area: Option<Range>,
    pub repeat_rows: Option<(u32, u32)>,
    pub repeat_cols: Option<(u32, u32)>,
    pub orientation: Orientation,
    pub paper_size: Option<u8>,
    pub scale: Option<u16>,
    pub fit_to_width: Option<u16>,
    pub fit_to_height: Option<u16>,
    pub gridlines: bool,
    pub header: Option<String>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineSettings {
    /// Summary rows appear below their detail rows.
    pub summary_below: bool,
    /// Summary columns appear right of their detail columns.
    pub summary_right: bool,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            summary_below: true,
            summary_right: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetType {
    #[default]
    Worksheet,
    Chartsheet,
    Macrosheet,
    Dialogsheet,
}

/// Sheet visibility as stored in workbook files (0, 1, 2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible = 0,
    Hidden = 1,
    VeryHidden = 2,
}

impl TryFrom<u8> for Visibility {
    type Error = crate::error::SheetError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Visibility::Visible),
            1 => Ok(Visibility::Hidden),
            2 => Ok(Visibility::VeryHidden),
            _ => Err(crate::error::SheetError::InvalidVisibility {
                value,
                operation: "Visibility::try_from",
            }),
        }
    }
}

impl From<Visibility> for u8 {
    fn from(value: Visibility) -> Self {
        value as u8
    }
}
