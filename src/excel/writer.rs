use std::path::Path;

use rust_xlsxwriter::{
    self as xlsx, ConditionalFormatAverageRule, ConditionalFormatCellRule,
    ConditionalFormatDateRule, ConditionalFormatIconType, ConditionalFormatTextRule,
    ConditionalFormatTopRule, ConditionalFormatType, ConditionalFormatValue, DataValidationErrorStyle,
    DataValidationRule, DocProperties, Format, FormatPattern, Formula, Note, ProtectionOptions, Url,
    Workbook as XlsxWorkbook, Worksheet, XlsxError,
};
use tracing::{debug, info, warn};

use crate::address::{CellAddress, Range};
use crate::error::{Result, SheetError};
use crate::excel::cell::{Cell, CellValue, NumberFormat, format_cell};
use crate::excel::date::DateSystem;
use crate::excel::metadata::{
    ComparisonOperator, ConditionalFormat, ConditionalRule, DataValidation, DatePeriod,
    ErrorAlertStyle, ProtectInfo, TextMatch, Threshold, ValidationRule, Visibility,
};
use crate::excel::sheet::Sheet;
use crate::excel::style::{Color, Style};
use crate::excel::workbook::Workbook;

/// Write a workbook as `xlsx`.
///
/// Dates are stored as serials with a date format. The output always uses
/// the 1900 epoch; serials of a 1904 workbook are shifted on the way out.
pub fn write_xlsx<P: AsRef<Path>>(wb: &Workbook, path: P) -> Result<()> {
    let path_str = path.as_ref().to_string_lossy().to_string();
    let writer_err = |source| SheetError::Writer {
        path: path_str.clone(),
        source,
    };

    info!(path = %path_str, sheets = wb.len(), "writing workbook");
    let mut out = XlsxWorkbook::new();

    for (name, sheet) in wb.sheets() {
        let worksheet = out.add_worksheet();
        worksheet.set_name(name).map_err(writer_err)?;
        write_sheet(worksheet, sheet, wb.date_system).map_err(writer_err)?;
        debug!(sheet = name, cells = sheet.len(), "worksheet written");
    }

    for defined in &wb.defined_names {
        let name = match defined.sheet.and_then(|idx| wb.sheet_name(idx).ok()) {
            Some(scope) => format!("'{scope}'!{}", defined.name),
            None => defined.name.clone(),
        };
        out.define_name(name, &defined.reference).map_err(writer_err)?;
    }

    let props = &wb.props;
    let mut doc = DocProperties::new();
    if let Some(title) = &props.title {
        doc = doc.set_title(title);
    }
    if let Some(author) = &props.author {
        doc = doc.set_author(author);
    }
    if let Some(subject) = &props.subject {
        doc = doc.set_subject(subject);
    }
    if let Some(company) = &props.company {
        doc = doc.set_company(company);
    }
    if let Some(keywords) = &props.keywords {
        doc = doc.set_keywords(keywords);
    }
    out.set_properties(&doc);

    out.save(path.as_ref()).map_err(writer_err)?;
    Ok(())
}

fn write_sheet(
    ws: &mut Worksheet,
    sheet: &Sheet,
    date_system: DateSystem,
) -> std::result::Result<(), XlsxError> {
    match sheet.visibility {
        Visibility::Visible => {}
        Visibility::Hidden | Visibility::VeryHidden => {
            ws.set_hidden(true);
        }
    }

    for (col, info) in &sheet.cols {
        let col = col_index(*col);
        if let Some(width) = info.wch.or(info.width) {
            ws.set_column_width(col, width)?;
        }
        if info.hidden {
            ws.set_column_hidden(col)?;
        }
    }

    for (row, info) in &sheet.rows {
        if let Some(height) = info.hpt {
            ws.set_row_height(*row, height)?;
        }
        if info.hidden {
            ws.set_row_hidden(*row)?;
        }
    }

    for merge in &sheet.merges {
        if merge.is_single_cell() {
            continue;
        }
        let text = sheet.get(merge.start).map(format_cell).unwrap_or_default();
        ws.merge_range(
            merge.start.row,
            col_index(merge.start.col),
            merge.end.row,
            col_index(merge.end.col),
            &text,
            &Format::new(),
        )?;
    }

    for (addr, cell) in sheet.cells() {
        write_cell(ws, addr, cell, date_system)?;
    }

    write_metadata(ws, sheet)
}

fn write_cell(
    ws: &mut Worksheet,
    addr: CellAddress,
    cell: &Cell,
    date_system: DateSystem,
) -> std::result::Result<(), XlsxError> {
    let (row, col) = (addr.row, col_index(addr.col));

    if let Some(array) = cell.array_range {
        if addr == array.start {
            if let Some(formula) = &cell.formula {
                ws.write_array_formula(
                    array.start.row,
                    col_index(array.start.col),
                    array.end.row,
                    col_index(array.end.col),
                    Formula::new(formula.as_str()),
                )?;
            }
        }
        return Ok(());
    }

    let format = cell_format(cell);

    if let Some(formula) = &cell.formula {
        let mut formula = Formula::new(formula.as_str());
        if !cell.is_stub() {
            formula = formula.set_result(format_cell(cell));
        }
        match &format {
            Some(format) => ws.write_formula_with_format(row, col, formula, format)?,
            None => ws.write_formula(row, col, formula)?,
        };
    } else {
        match &cell.value {
            CellValue::Boolean(b) => {
                ws.write_boolean(row, col, *b)?;
            }
            CellValue::Number(n) => {
                let serial = shift_serial(*n, cell, date_system);
                match &format {
                    Some(format) => ws.write_number_with_format(row, col, serial, format)?,
                    None => ws.write_number(row, col, serial)?,
                };
            }
            CellValue::Error(code) => {
                let formula = Formula::new(code.as_str()).set_result(code.as_str());
                ws.write_formula(row, col, formula)?;
            }
            CellValue::String(s) => {
                ws.write_string(row, col, s)?;
            }
            CellValue::Date(d) => {
                let serial = DateSystem::Excel1900.to_serial(*d);
                let format = format.unwrap_or_else(|| number_format(&NumberFormat::default_date()));
                ws.write_number_with_format(row, col, serial, &format)?;
            }
            CellValue::Stub => {
                if let Some(format) = &format {
                    ws.write_blank(row, col, format)?;
                }
            }
        }
    }

    if let Some(link) = &cell.hyperlink {
        let target = match link.target.strip_prefix('#') {
            Some(location) => format!("internal:{location}"),
            None => link.target.clone(),
        };
        let mut url = Url::new(target).set_text(format_cell(cell));
        if let Some(tip) = &link.tooltip {
            url = url.set_tip(tip);
        }
        ws.write_url(row, col, url)?;
    }

    if let Some(comments) = &cell.comments {
        let text = comments
            .items
            .iter()
            .map(|comment| comment.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let mut note = Note::new(text);
        if let Some(author) = comments.items.iter().find_map(|c| c.author.as_deref()) {
            note = note.set_author(author);
        }
        if !comments.hidden {
            note = note.set_visible(true);
        }
        ws.insert_note(row, col, &note)?;
    }

    Ok(())
}

/// Validations, conditional formats, the autofilter and protection.
///
/// Conditional formats are emitted in priority order; the writer numbers
/// them itself, so only the relative order survives. A stored password
/// hash cannot be carried over and the sheet is written unlocked by password.
fn write_metadata(ws: &mut Worksheet, sheet: &Sheet) -> std::result::Result<(), XlsxError> {
    for validation in &sheet.validations {
        let (r1, c1, r2, c2) = bounds(validation.range);
        ws.add_data_validation(r1, c1, r2, c2, &data_validation(validation)?)?;
    }

    let mut formats: Vec<&ConditionalFormat> = sheet.conditional_formats.iter().collect();
    formats.sort_by_key(|cf| cf.priority);
    for cf in formats {
        write_conditional_format(ws, cf)?;
    }

    if let Some(filter) = &sheet.autofilter {
        let (r1, c1, r2, c2) = bounds(filter.range);
        ws.autofilter(r1, c1, r2, c2)?;
    }

    if let Some(protect) = &sheet.protection {
        if protect.password_hash.is_some() {
            warn!("sheet protection password hash dropped on write");
        }
        ws.protect_with_options(&protection_options(protect));
    }

    Ok(())
}

fn bounds(range: Range) -> (u32, u16, u32, u16) {
    (
        range.start.row,
        col_index(range.start.col),
        range.end.row,
        col_index(range.end.col),
    )
}

fn data_validation(rule: &DataValidation) -> std::result::Result<xlsx::DataValidation, XlsxError> {
    let out = xlsx::DataValidation::new();
    let mut out = match &rule.rule {
        ValidationRule::Any => out.allow_any_value(),
        ValidationRule::Whole { operator, formula1, formula2 } => out
            .allow_whole_number_formula(validation_rule(*operator, formula1, formula2.as_deref())),
        ValidationRule::Decimal { operator, formula1, formula2 } => out
            .allow_decimal_number_formula(validation_rule(*operator, formula1, formula2.as_deref())),
        ValidationRule::Date { operator, formula1, formula2 } => {
            out.allow_date_formula(validation_rule(*operator, formula1, formula2.as_deref()))
        }
        ValidationRule::Time { operator, formula1, formula2 } => {
            out.allow_time_formula(validation_rule(*operator, formula1, formula2.as_deref()))
        }
        ValidationRule::TextLength { operator, formula1, formula2 } => out
            .allow_text_length_formula(validation_rule(*operator, formula1, formula2.as_deref())),
        ValidationRule::List { formula: Some(formula), .. } => {
            out.allow_list_formula(Formula::new(formula))
        }
        ValidationRule::List { values, formula: None } => out.allow_list_strings(values.as_slice())?,
        ValidationRule::Custom { formula } => out.allow_custom(Formula::new(formula)),
    };

    out = out
        .ignore_blank(rule.allow_blank)
        .set_error_style(match rule.error_style {
            ErrorAlertStyle::Stop => DataValidationErrorStyle::Stop,
            ErrorAlertStyle::Warning => DataValidationErrorStyle::Warning,
            ErrorAlertStyle::Information => DataValidationErrorStyle::Information,
        });
    if let Some(title) = &rule.prompt_title {
        out = out.set_input_title(title)?;
    }
    if let Some(prompt) = &rule.prompt {
        out = out.set_input_message(prompt)?;
    }
    if let Some(title) = &rule.error_title {
        out = out.set_error_title(title)?;
    }
    if let Some(error) = &rule.error {
        out = out.set_error_message(error)?;
    }
    Ok(out)
}

// A missing upper bound on a two-sided operator falls back to the lower one.
fn validation_rule(
    operator: ComparisonOperator,
    formula1: &str,
    formula2: Option<&str>,
) -> DataValidationRule<Formula> {
    let first = Formula::new(formula1);
    let second = || Formula::new(formula2.unwrap_or(formula1));
    match operator {
        ComparisonOperator::Between => DataValidationRule::Between(first, second()),
        ComparisonOperator::NotBetween => DataValidationRule::NotBetween(first, second()),
        ComparisonOperator::Equal => DataValidationRule::EqualTo(first),
        ComparisonOperator::NotEqual => DataValidationRule::NotEqualTo(first),
        ComparisonOperator::GreaterThan => DataValidationRule::GreaterThan(first),
        ComparisonOperator::LessThan => DataValidationRule::LessThan(first),
        ComparisonOperator::GreaterThanOrEqual => DataValidationRule::GreaterThanOrEqualTo(first),
        ComparisonOperator::LessThanOrEqual => DataValidationRule::LessThanOrEqualTo(first),
    }
}

fn cell_rule(
    operator: ComparisonOperator,
    formula1: &str,
    formula2: Option<&str>,
) -> ConditionalFormatCellRule<Formula> {
    let first = Formula::new(formula1);
    let second = || Formula::new(formula2.unwrap_or(formula1));
    match operator {
        ComparisonOperator::Between => ConditionalFormatCellRule::Between(first, second()),
        ComparisonOperator::NotBetween => ConditionalFormatCellRule::NotBetween(first, second()),
        ComparisonOperator::Equal => ConditionalFormatCellRule::EqualTo(first),
        ComparisonOperator::NotEqual => ConditionalFormatCellRule::NotEqualTo(first),
        ComparisonOperator::GreaterThan => ConditionalFormatCellRule::GreaterThan(first),
        ComparisonOperator::LessThan => ConditionalFormatCellRule::LessThan(first),
        ComparisonOperator::GreaterThanOrEqual => {
            ConditionalFormatCellRule::GreaterThanOrEqualTo(first)
        }
        ComparisonOperator::LessThanOrEqual => ConditionalFormatCellRule::LessThanOrEqualTo(first),
    }
}

fn write_conditional_format(
    ws: &mut Worksheet,
    cf: &ConditionalFormat,
) -> std::result::Result<(), XlsxError> {
    let (r1, c1, r2, c2) = bounds(cf.range);
    let format = cf.style.as_ref().map(style_format).unwrap_or_default();
    let stop = cf.stop_if_true;

    macro_rules! place {
        ($rule:expr) => {{
            ws.add_conditional_format(r1, c1, r2, c2, &$rule.set_stop_if_true(stop))?;
        }};
    }

    match &cf.rule {
        ConditionalRule::Formula { formula } => place!(
            xlsx::ConditionalFormatFormula::new()
                .set_rule(formula.as_str())
                .set_format(format)
        ),
        ConditionalRule::CellValue { operator, formula1, formula2 } => place!(
            xlsx::ConditionalFormatCell::new()
                .set_rule(cell_rule(*operator, formula1, formula2.as_deref()))
                .set_format(format)
        ),
        ConditionalRule::Text { operator, text } => {
            let text = text.clone();
            let rule = match operator {
                TextMatch::Contains => ConditionalFormatTextRule::Contains(text),
                TextMatch::NotContains => ConditionalFormatTextRule::DoesNotContain(text),
                TextMatch::BeginsWith => ConditionalFormatTextRule::BeginsWith(text),
                TextMatch::EndsWith => ConditionalFormatTextRule::EndsWith(text),
            };
            place!(xlsx::ConditionalFormatText::new().set_rule(rule).set_format(format))
        }
        ConditionalRule::Blank { negate } => {
            let mut rule = xlsx::ConditionalFormatBlank::new().set_format(format);
            if *negate {
                rule = rule.invert();
            }
            place!(rule)
        }
        ConditionalRule::Error { negate } => {
            let mut rule = xlsx::ConditionalFormatError::new().set_format(format);
            if *negate {
                rule = rule.invert();
            }
            place!(rule)
        }
        ConditionalRule::Duplicate => {
            place!(xlsx::ConditionalFormatDuplicate::new().set_format(format))
        }
        ConditionalRule::Unique => {
            place!(xlsx::ConditionalFormatDuplicate::new().invert().set_format(format))
        }
        ConditionalRule::Average { above, equal, std_dev } => place!(
            xlsx::ConditionalFormatAverage::new()
                .set_rule(average_rule(*above, *equal, *std_dev))
                .set_format(format)
        ),
        ConditionalRule::Rank { top, rank, percent } => {
            let rank = u16::try_from(*rank).unwrap_or(u16::MAX);
            let rule = match (top, percent) {
                (true, false) => ConditionalFormatTopRule::Top(rank),
                (false, false) => ConditionalFormatTopRule::Bottom(rank),
                (true, true) => ConditionalFormatTopRule::TopPercent(rank),
                (false, true) => ConditionalFormatTopRule::BottomPercent(rank),
            };
            place!(xlsx::ConditionalFormatTop::new().set_rule(rule).set_format(format))
        }
        ConditionalRule::Date { period } => place!(
            xlsx::ConditionalFormatDate::new()
                .set_rule(date_rule(*period))
                .set_format(format)
        ),
        ConditionalRule::DataBar { min, max, color } => {
            let (min_type, min_value) = threshold(min);
            let (max_type, max_value) = threshold(max);
            let mut rule = xlsx::ConditionalFormatDataBar::new()
                .set_minimum(min_type, min_value)
                .set_maximum(max_type, max_value);
            if let Some(color) = rgb(color) {
                rule = rule.set_fill_color(color);
            }
            place!(rule)
        }
        ConditionalRule::IconSet { icon_style, thresholds, reverse, show_value } => {
            let Some(icon_type) = icon_type(icon_style) else {
                warn!(icon_style = %icon_style, "unsupported icon set skipped on write");
                return Ok(());
            };
            let mut rule = xlsx::ConditionalFormatIconSet::new()
                .set_icon_type(icon_type)
                .reverse_icons(*reverse)
                .show_icons_only(!*show_value);
            if !thresholds.is_empty() {
                let icons: Vec<_> = thresholds
                    .iter()
                    .map(|t| {
                        let (kind, value) = threshold(t);
                        xlsx::ConditionalFormatCustomIcon::new().set_rule(kind, value)
                    })
                    .collect();
                rule = rule.set_icons(&icons);
            }
            place!(rule)
        }
        ConditionalRule::ColorScale { stops } => match stops.as_slice() {
            [(low, low_color), (high, high_color)] => {
                let (low_type, low_value) = threshold(low);
                let (high_type, high_value) = threshold(high);
                let mut rule = xlsx::ConditionalFormat2ColorScale::new()
                    .set_minimum(low_type, low_value)
                    .set_maximum(high_type, high_value);
                if let Some(color) = rgb(low_color) {
                    rule = rule.set_minimum_color(color);
                }
                if let Some(color) = rgb(high_color) {
                    rule = rule.set_maximum_color(color);
                }
                place!(rule)
            }
            [(low, low_color), (mid, mid_color), (high, high_color)] => {
                let (low_type, low_value) = threshold(low);
                let (mid_type, mid_value) = threshold(mid);
                let (high_type, high_value) = threshold(high);
                let mut rule = xlsx::ConditionalFormat3ColorScale::new()
                    .set_minimum(low_type, low_value)
                    .set_midpoint(mid_type, mid_value)
                    .set_maximum(high_type, high_value);
                if let Some(color) = rgb(low_color) {
                    rule = rule.set_minimum_color(color);
                }
                if let Some(color) = rgb(mid_color) {
                    rule = rule.set_midpoint_color(color);
                }
                if let Some(color) = rgb(high_color) {
                    rule = rule.set_maximum_color(color);
                }
                place!(rule)
            }
            _ => warn!(stops = stops.len(), "color scale needs 2 or 3 stops; skipped"),
        },
    }

    Ok(())
}

fn average_rule(above: bool, equal: bool, std_dev: Option<u8>) -> ConditionalFormatAverageRule {
    use ConditionalFormatAverageRule as Avg;
    match (std_dev.filter(|n| *n > 0), above) {
        (Some(1), true) => Avg::OneStandardDeviationAbove,
        (Some(1), false) => Avg::OneStandardDeviationBelow,
        (Some(2), true) => Avg::TwoStandardDeviationsAbove,
        (Some(2), false) => Avg::TwoStandardDeviationsBelow,
        (Some(_), true) => Avg::ThreeStandardDeviationsAbove,
        (Some(_), false) => Avg::ThreeStandardDeviationsBelow,
        (None, true) if equal => Avg::EqualOrAboveAverage,
        (None, true) => Avg::AboveAverage,
        (None, false) if equal => Avg::EqualOrBelowAverage,
        (None, false) => Avg::BelowAverage,
    }
}

fn date_rule(period: DatePeriod) -> ConditionalFormatDateRule {
    match period {
        DatePeriod::Yesterday => ConditionalFormatDateRule::Yesterday,
        DatePeriod::Today => ConditionalFormatDateRule::Today,
        DatePeriod::Tomorrow => ConditionalFormatDateRule::Tomorrow,
        DatePeriod::Last7Days => ConditionalFormatDateRule::Last7Days,
        DatePeriod::LastWeek => ConditionalFormatDateRule::LastWeek,
        DatePeriod::ThisWeek => ConditionalFormatDateRule::ThisWeek,
        DatePeriod::NextWeek => ConditionalFormatDateRule::NextWeek,
        DatePeriod::LastMonth => ConditionalFormatDateRule::LastMonth,
        DatePeriod::ThisMonth => ConditionalFormatDateRule::ThisMonth,
        DatePeriod::NextMonth => ConditionalFormatDateRule::NextMonth,
    }
}

fn threshold(threshold: &Threshold) -> (ConditionalFormatType, ConditionalFormatValue) {
    match threshold {
        Threshold::Min => (ConditionalFormatType::Lowest, 0.into()),
        Threshold::Max => (ConditionalFormatType::Highest, 0.into()),
        Threshold::Number(n) => (ConditionalFormatType::Number, (*n).into()),
        Threshold::Percent(n) => (ConditionalFormatType::Percent, (*n).into()),
        Threshold::Percentile(n) => (ConditionalFormatType::Percentile, (*n).into()),
        Threshold::Formula(f) => (ConditionalFormatType::Formula, Formula::new(f).into()),
    }
}

/// Icon set by its stored OOXML name (`3Arrows`, `4Rating`, ...).
fn icon_type(name: &str) -> Option<ConditionalFormatIconType> {
    use ConditionalFormatIconType as Icon;
    Some(match name {
        "3Arrows" => Icon::ThreeArrows,
        "3ArrowsGray" => Icon::ThreeArrowsGray,
        "3Flags" => Icon::ThreeFlags,
        "3TrafficLights1" => Icon::ThreeTrafficLights,
        "3TrafficLights2" => Icon::ThreeTrafficLightsWithRim,
        "3Signs" => Icon::ThreeSigns,
        "3Symbols" => Icon::ThreeSymbolsCircled,
        "3Symbols2" => Icon::ThreeSymbols,
        "3Stars" => Icon::ThreeStars,
        "3Triangles" => Icon::ThreeTriangles,
        "4Arrows" => Icon::FourArrows,
        "4ArrowsGray" => Icon::FourArrowsGray,
        "4RedToBlack" => Icon::FourRedToBlack,
        "4Rating" => Icon::FourHistograms,
        "4TrafficLights" => Icon::FourTrafficLights,
        "5Arrows" => Icon::FiveArrows,
        "5ArrowsGray" => Icon::FiveArrowsGray,
        "5Rating" => Icon::FiveHistograms,
        "5Quarters" => Icon::FiveQuadrants,
        "5Boxes" => Icon::FiveBoxes,
        _ => return None,
    })
}

// Theme and indexed colors need the workbook palette; only RGB is written.
fn rgb(color: &Color) -> Option<xlsx::Color> {
    match color {
        Color::Rgb(value) => Some(xlsx::Color::RGB(*value)),
        Color::Theme { .. } | Color::Indexed(_) => None,
    }
}

/// Differential format of a conditional rule: font emphasis and solid fill.
fn style_format(style: &Style) -> Format {
    let mut format = Format::new();
    if style.font.bold == Some(true) {
        format = format.set_bold();
    }
    if style.font.italic == Some(true) {
        format = format.set_italic();
    }
    if style.font.strike == Some(true) {
        format = format.set_font_strikethrough();
    }
    if let Some(color) = style.font.color.as_ref().and_then(rgb) {
        format = format.set_font_color(color);
    }
    if let Some(fill) = style.fg_color.as_ref().or(style.bg_color.as_ref()).and_then(rgb) {
        format = format
            .set_foreground_color(fill)
            .set_background_color(fill)
            .set_pattern(FormatPattern::Solid);
    }
    format
}

fn protection_options(protect: &ProtectInfo) -> ProtectionOptions {
    ProtectionOptions {
        select_locked_cells: protect.select_locked_cells,
        select_unlocked_cells: protect.select_unlocked_cells,
        format_cells: protect.format_cells,
        format_columns: protect.format_columns,
        format_rows: protect.format_rows,
        insert_columns: protect.insert_columns,
        insert_rows: protect.insert_rows,
        insert_links: protect.insert_hyperlinks,
        delete_columns: protect.delete_columns,
        delete_rows: protect.delete_rows,
        sort: protect.sort,
        use_autofilter: protect.auto_filter,
        use_pivot_tables: protect.pivot_tables,
        edit_objects: protect.objects,
        edit_scenarios: protect.scenarios,
        ..ProtectionOptions::default()
    }
}

fn cell_format(cell: &Cell) -> Option<Format> {
    cell.number_format.as_ref().map(number_format)
}

fn number_format(format: &NumberFormat) -> Format {
    match format {
        NumberFormat::Code(code) => Format::new().set_num_format(code),
        NumberFormat::Index(idx) => {
            Format::new().set_num_format_index(u8::try_from(*idx).unwrap_or(0))
        }
    }
}

/// Re-base a date serial from a 1904 workbook onto the 1900 epoch.
fn shift_serial(serial: f64, cell: &Cell, date_system: DateSystem) -> f64 {
    let is_date = cell.number_format.as_ref().is_some_and(NumberFormat::is_date);
    if !is_date || !date_system.is_1904() {
        return serial;
    }
    date_system
        .from_serial(serial)
        .map_or(serial, |timestamp| DateSystem::Excel1900.to_serial(timestamp))
}

fn col_index(col: u32) -> u16 {
    u16::try_from(col).unwrap_or(u16::MAX)
}
