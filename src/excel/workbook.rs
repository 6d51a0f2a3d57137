use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SheetError};
use crate::excel::cell::DataValue;
use crate::excel::date::DateSystem;
use crate::excel::metadata::Visibility;
use crate::excel::sheet::Sheet;

pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_NAME_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

/// What `book_append_sheet` does when the requested name is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameCollision {
    /// Pick the next free numeric suffix (`Sheet1` -> `Sheet2`, `Data` -> `Data1`).
    #[default]
    Rename,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookConfig {
    pub case_sensitive_names: bool,
    pub on_name_collision: NameCollision,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            case_sensitive_names: true,
            on_name_collision: NameCollision::Rename,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentProperties {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub manager: Option<String>,
    pub company: Option<String>,
    pub category: Option<String>,
    pub keywords: Option<String>,
    pub comments: Option<String>,
    pub last_author: Option<String>,
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinedName {
    pub name: String,
    /// Reference or formula text, e.g. `Sheet1!$A$1:$B$4`.
    pub reference: String,
    /// Index of the owning sheet for sheet-scoped names.
    pub sheet: Option<usize>,
    pub comment: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookView {
    pub right_to_left: bool,
    pub active_tab: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookProtection {
    pub lock_structure: bool,
    pub lock_windows: bool,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomXml {
    pub id: Option<String>,
    pub content: String,
}

/// Sheet lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetRef<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for SheetRef<'_> {
    fn from(index: usize) -> Self {
        SheetRef::Index(index)
    }
}

impl<'a> From<&'a str> for SheetRef<'a> {
    fn from(name: &'a str) -> Self {
        SheetRef::Name(name)
    }
}

impl std::fmt::Display for SheetRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetRef::Index(index) => write!(f, "#{index}"),
            SheetRef::Name(name) => f.write_str(name),
        }
    }
}

/// Ordered, uniquely named sheets plus workbook-level metadata.
///
/// The `IndexMap` keeps the display order and the name lookup in one
/// structure, so the two can never disagree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: IndexMap<String, Sheet>,
    pub config: WorkbookConfig,
    pub props: DocumentProperties,
    pub custom_props: IndexMap<String, DataValue>,
    pub custom_xml: Vec<CustomXml>,
    pub defined_names: Vec<DefinedName>,
    pub views: Vec<WorkbookView>,
    pub protection: Option<WorkbookProtection>,
    pub date_system: DateSystem,
    pub code_name: Option<String>,
    /// Embedded macro project, passed through unexamined.
    pub vba_raw: Option<Vec<u8>>,
}

impl Workbook {
    pub fn with_config(config: WorkbookConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    pub fn sheets(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.sheets.iter().map(|(name, sheet)| (name.as_str(), sheet))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Position of a sheet by index or name.
    pub fn resolve(&self, sheet: SheetRef<'_>) -> Result<usize> {
        let index = match sheet {
            SheetRef::Index(index) => (index < self.sheets.len()).then_some(index),
            SheetRef::Name(name) => self.find(name),
        };
        index.ok_or_else(|| SheetError::unknown_sheet(sheet.to_string(), "Workbook::resolve"))
    }

    pub fn sheet<'a>(&self, sheet: impl Into<SheetRef<'a>>) -> Result<&Sheet> {
        let index = self.resolve(sheet.into())?;
        self.sheets
            .get_index(index)
            .map(|(_, sheet)| sheet)
            .ok_or_else(|| SheetError::unknown_sheet(index.to_string(), "Workbook::sheet"))
    }

    pub fn sheet_mut<'a>(&mut self, sheet: impl Into<SheetRef<'a>>) -> Result<&mut Sheet> {
        let index = self.resolve(sheet.into())?;
        self.sheets
            .get_index_mut(index)
            .map(|(_, sheet)| sheet)
            .ok_or_else(|| SheetError::unknown_sheet(index.to_string(), "Workbook::sheet_mut"))
    }

    /// Name stored for a sheet reference, with the stored casing.
    pub fn sheet_name<'a>(&self, sheet: impl Into<SheetRef<'a>>) -> Result<&str> {
        let index = self.resolve(sheet.into())?;
        self.sheets
            .get_index(index)
            .map(|(name, _)| name.as_str())
            .ok_or_else(|| SheetError::unknown_sheet(index.to_string(), "Workbook::sheet_name"))
    }

    /// Detach a sheet, keeping the order of the rest.
    pub fn remove_sheet<'a>(&mut self, sheet: impl Into<SheetRef<'a>>) -> Result<(String, Sheet)> {
        let index = self.resolve(sheet.into())?;
        self.sheets
            .shift_remove_index(index)
            .ok_or_else(|| SheetError::unknown_sheet(index.to_string(), "Workbook::remove_sheet"))
    }

    fn find(&self, name: &str) -> Option<usize> {
        if self.config.case_sensitive_names {
            self.sheets.get_index_of(name)
        } else {
            let wanted = name.to_lowercase();
            self.sheets.keys().position(|k| k.to_lowercase() == wanted)
        }
    }

    /// Smallest `SheetN` not yet in use.
    fn next_default_name(&self) -> String {
        (1u64..)
            .map(|n| format!("Sheet{n}"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_default()
    }

    /// Replace the trailing number of `name` with the next free one.
    fn next_free_variant(&self, name: &str) -> String {
        let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
        let start: u64 = name[stem.len()..].parse().unwrap_or(0);

        (start.saturating_add(1)..)
            .map(|n| {
                let suffix = n.to_string();
                let keep = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
                let stem: String = stem.chars().take(keep).collect();
                format!("{stem}{suffix}")
            })
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_default()
    }
}

/// Check the naming rules spreadsheet applications enforce for sheet tabs.
pub fn check_sheet_name(name: &str) -> Result<()> {
    let invalid = |reason| SheetError::InvalidSheetName {
        name: name.to_string(),
        reason,
        operation: "check_sheet_name",
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(invalid("name is longer than 31 characters"));
    }
    if name.contains(FORBIDDEN_NAME_CHARS) {
        return Err(invalid("name contains one of : \\ / ? * [ ]"));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(invalid("name starts or ends with an apostrophe"));
    }
    Ok(())
}

pub fn book_new() -> Workbook {
    Workbook::default()
}

/// Append `sheet` at the end of the workbook and return the name it was stored under.
///
/// Without a name the smallest unused `SheetN` is chosen. A taken name is
/// renamed or rejected according to [`WorkbookConfig::on_name_collision`].
pub fn book_append_sheet(wb: &mut Workbook, sheet: Sheet, name: Option<&str>) -> Result<String> {
    let name = match name {
        None => wb.next_default_name(),
        Some(requested) => {
            check_sheet_name(requested)?;
            if !wb.contains(requested) {
                requested.to_string()
            } else {
                match wb.config.on_name_collision {
                    NameCollision::Error => {
                        return Err(SheetError::DuplicateSheetName {
                            name: requested.to_string(),
                            operation: "book_append_sheet",
                        });
                    }
                    NameCollision::Rename => {
                        let renamed = wb.next_free_variant(requested);
                        warn!(requested, renamed = %renamed, "sheet name in use, renaming");
                        renamed
                    }
                }
            }
        }
    };

    wb.sheets.insert(name.clone(), sheet);
    Ok(name)
}

pub fn book_set_sheet_visibility(
    wb: &mut Workbook,
    sheet: SheetRef<'_>,
    visibility: Visibility,
) -> Result<()> {
    let index = wb.resolve(sheet)?;
    if let Some((_, target)) = wb.sheets.get_index_mut(index) {
        target.visibility = visibility;
    }
    Ok(())
}
