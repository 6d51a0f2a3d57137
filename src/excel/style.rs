use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cell or text color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// `RRGGBB` packed into the low 24 bits.
    Rgb(u32),
    Theme { theme: u32, tint: Option<f64> },
    Indexed(u8),
}

impl Color {
    /// Parse `#RRGGBB`, `RRGGBB` or `#RGB`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            // ARGB; alpha is dropped
            8 => hex.get(2..)?.to_string(),
            _ => return None,
        };
        u32::from_str_radix(&expanded, 16).ok().map(Color::Rgb)
    }

    pub fn to_css(&self) -> Option<String> {
        match self {
            Color::Rgb(rgb) => Some(format!("#{:06X}", rgb & 0x00FF_FFFF)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderStyle {
    #[default]
    Thin,
    Medium,
    Thick,
    Dotted,
    Hair,
    Dashed,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
    Double,
}

impl BorderStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            BorderStyle::Thin => "thin",
            BorderStyle::Medium => "medium",
            BorderStyle::Thick => "thick",
            BorderStyle::Dotted => "dotted",
            BorderStyle::Hair => "hair",
            BorderStyle::Dashed => "dashed",
            BorderStyle::MediumDashed => "mediumDashed",
            BorderStyle::DashDot => "dashDot",
            BorderStyle::MediumDashDot => "mediumDashDot",
            BorderStyle::DashDotDot => "dashDotDot",
            BorderStyle::MediumDashDotDot => "mediumDashDotDot",
            BorderStyle::SlantDashDot => "slantDashDot",
            BorderStyle::Double => "double",
        }
    }
}

impl fmt::Display for BorderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BorderStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let style = match s {
            "thin" => BorderStyle::Thin,
            "medium" => BorderStyle::Medium,
            "thick" => BorderStyle::Thick,
            "dotted" => BorderStyle::Dotted,
            "hair" => BorderStyle::Hair,
            "dashed" => BorderStyle::Dashed,
            "mediumDashed" => BorderStyle::MediumDashed,
            "dashDot" => BorderStyle::DashDot,
            "mediumDashDot" => BorderStyle::MediumDashDot,
            "dashDotDot" => BorderStyle::DashDotDot,
            "mediumDashDotDot" => BorderStyle::MediumDashDotDot,
            "slantDashDot" => BorderStyle::SlantDashDot,
            "double" => BorderStyle::Double,
            _ => return Err(()),
        };
        Ok(style)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub style: BorderStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Border {
    pub fn new(style: BorderStyle) -> Self {
        Self { style, color: None }
    }

    /// Translate a CSS border shorthand (`1px solid #000`) into a border.
    ///
    /// Returns `None` for `none`/`hidden` borders or when no line style is present.
    pub fn from_css(text: &str) -> Option<Self> {
        let mut width_px: Option<f64> = None;
        let mut line: Option<&str> = None;
        let mut color = None;

        for token in text.split_whitespace() {
            let lower = token.to_ascii_lowercase();
            match lower.as_str() {
                "none" | "hidden" => return None,
                "solid" | "dotted" | "dashed" | "double" => line = Some(token),
                "thin" => width_px = Some(1.0),
                "medium" => width_px = Some(2.0),
                "thick" => width_px = Some(3.0),
                _ if lower.ends_with("px") => {
                    width_px = lower.trim_end_matches("px").parse().ok();
                }
                _ if lower.starts_with('#') => color = Color::from_hex(&lower),
                _ => {}
            }
        }

        let width = width_px.unwrap_or(1.0);
        let style = match line? {
            "dotted" => BorderStyle::Dotted,
            "double" => BorderStyle::Double,
            "dashed" if width >= 2.0 => BorderStyle::MediumDashed,
            "dashed" => BorderStyle::Dashed,
            _ if width >= 3.0 => BorderStyle::Thick,
            _ if width >= 2.0 => BorderStyle::Medium,
            _ => BorderStyle::Thin,
        };

        Some(Border { style, color })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub indent: Option<u8>,
    pub wrap_text: Option<bool>,
    pub horizontal: Option<HorizontalAlignment>,
    pub vertical: Option<VerticalAlignment>,
    pub text_rotation: Option<i16>,
    pub shrink_to_fit: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Underline {
    Single,
    Double,
    SingleAccounting,
    DoubleAccounting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalTextAlign {
    Subscript,
    Superscript,
}

/// Font-level formatting, shared by cell styles and rich-text runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<Underline>,
    pub strike: Option<bool>,
    pub size: Option<f64>,
    pub name: Option<String>,
    pub color: Option<Color>,
    pub valign: Option<VerticalTextAlign>,
}

impl TextStyle {
    fn apply_delta(&mut self, delta: &TextStyle) {
        overlay(&mut self.bold, &delta.bold);
        overlay(&mut self.italic, &delta.italic);
        overlay(&mut self.underline, &delta.underline);
        overlay(&mut self.strike, &delta.strike);
        overlay(&mut self.size, &delta.size);
        overlay(&mut self.name, &delta.name);
        overlay(&mut self.color, &delta.color);
        overlay(&mut self.valign, &delta.valign);
    }
}

/// Cell style. Every field is optional so the same type doubles as a
/// differential style applied on top of a base style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(flatten)]
    pub font: TextStyle,
    pub top: Option<Border>,
    pub bottom: Option<Border>,
    pub left: Option<Border>,
    pub right: Option<Border>,
    pub pattern_type: Option<String>,
    pub fg_color: Option<Color>,
    pub bg_color: Option<Color>,
    pub alignment: Option<Alignment>,
    /// Formula hidden when the sheet is protected.
    pub hidden: Option<bool>,
    /// Editable when the sheet is protected (inverse of "locked").
    pub editable: Option<bool>,
    #[serde(rename = "style_name")]
    pub name: Option<String>,
}

impl Style {
    /// Overlay every field set in `delta` onto this style.
    pub fn apply_delta(&mut self, delta: &Style) {
        self.font.apply_delta(&delta.font);
        overlay(&mut self.top, &delta.top);
        overlay(&mut self.bottom, &delta.bottom);
        overlay(&mut self.left, &delta.left);
        overlay(&mut self.right, &delta.right);
        overlay(&mut self.pattern_type, &delta.pattern_type);
        overlay(&mut self.fg_color, &delta.fg_color);
        overlay(&mut self.bg_color, &delta.bg_color);
        overlay(&mut self.alignment, &delta.alignment);
        overlay(&mut self.hidden, &delta.hidden);
        overlay(&mut self.editable, &delta.editable);
        overlay(&mut self.name, &delta.name);
    }

    pub fn is_empty(&self) -> bool {
        *self == Style::default()
    }
}

/// Overlay a differential style onto `base`.
pub fn apply_style_delta(base: &mut Style, delta: &Style) {
    base.apply_delta(delta);
}

fn overlay<T: Clone>(base: &mut Option<T>, delta: &Option<T>) {
    if let Some(value) = delta {
        *base = Some(value.clone());
    }
}

/// Style applied across a range: outer edges take `top`/`bottom`/`left`/`right`,
/// interior edges take `inrow` (horizontal) and `incol` (vertical).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeStyle {
    pub style: Style,
    pub number_format: Option<super::cell::NumberFormat>,
    pub incol: Option<Border>,
    pub inrow: Option<Border>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextRun {
    pub text: String,
    pub style: Option<TextStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rich_text: Vec<RichTextRun>,
}

/// Comment thread attached to a cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comments {
    pub items: Vec<Comment>,
    pub hidden: bool,
    pub fill: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub target: String,
    pub tooltip: Option<String>,
}

impl Hyperlink {
    /// Links into the workbook itself (`#Sheet2!A1`).
    pub fn is_internal(&self) -> bool {
        self.target.starts_with('#')
    }
}
