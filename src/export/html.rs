use crate::address::CellAddress;
use crate::error::Result;
use crate::excel::cell::{Cell, CellValue, format_number};
use crate::excel::date::format_iso;
use crate::excel::sheet::Sheet;
use crate::export::converters::display_text;
use crate::export::types::{
    DEFAULT_HTML_FOOTER, DEFAULT_HTML_HEADER, HtmlExportOptions, export_range,
};

const DEFAULT_ID_PREFIX: &str = "sheet";

/// Render a sheet as an HTML table.
///
/// Merged ranges become `rowspan`/`colspan` on their top-left cell and the
/// covered positions are omitted.
pub fn sheet_to_html(sheet: &Sheet, opts: &HtmlExportOptions) -> Result<String> {
    let range = export_range(sheet, opts.range.as_ref())?;

    let mut out = String::new();
    out.push_str(opts.header.as_deref().unwrap_or(DEFAULT_HTML_HEADER));
    out.push_str(&table_open(opts));
    for row in range.start.row..=range.end.row {
        out.push_str("<tr>");
        for col in range.start.col..=range.end.col {
            let addr = CellAddress::new(row, col);
            let Some(span) = span_at(sheet, addr) else {
                continue;
            };
            out.push_str(&cell_tag(sheet.get(addr), addr, span, opts));
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
    out.push_str(opts.footer.as_deref().unwrap_or(DEFAULT_HTML_FOOTER));
    Ok(out)
}

fn table_open(opts: &HtmlExportOptions) -> String {
    let mut tag = String::from("<table");
    if let Some(id) = &opts.id {
        tag.push_str(&format!(" id=\"{}\"", escape_html(id)));
    }
    if opts.gridcolor.is_some() {
        tag.push_str(" style=\"border-collapse:collapse\"");
    }
    tag.push('>');
    tag
}

/// `(rows, cols)` spanned from `addr`, or `None` when a merge covers it
/// from another cell.
fn span_at(sheet: &Sheet, addr: CellAddress) -> Option<(u32, u32)> {
    match sheet.merge_at(addr) {
        Some(merge) if merge.start != addr => None,
        Some(merge) => Some((merge.height(), merge.width())),
        None => Some((1, 1)),
    }
}

fn cell_tag(
    cell: Option<&Cell>,
    addr: CellAddress,
    (rows, cols): (u32, u32),
    opts: &HtmlExportOptions,
) -> String {
    let mut attrs = Vec::new();
    if rows > 1 {
        attrs.push(("rowspan", rows.to_string()));
    }
    if cols > 1 {
        attrs.push(("colspan", cols.to_string()));
    }

    let mut content = match cell {
        Some(cell) if !cell.is_stub() => cell
            .html
            .clone()
            .unwrap_or_else(|| escape_html(&display_text(cell, opts.date_system, None))),
        _ => String::new(),
    };

    if opts.editable {
        content = format!("<span contenteditable=\"true\">{content}</span>");
    } else if let Some(cell) = cell {
        attrs.push(("data-t", cell.cell_type().as_char().to_string()));
        if let Some(raw) = raw_text(&cell.value) {
            attrs.push(("data-v", escape_html(&raw)));
        }
        if let Some(code) = cell.number_format.as_ref().and_then(|format| format.code()) {
            attrs.push(("data-z", escape_html(code)));
        }
        if let Some(link) = cell.hyperlink.as_ref().filter(|link| !link.is_internal()) {
            content = format!("<a href=\"{}\">{content}</a>", escape_html(&link.target));
        }
    }

    let prefix = opts.id.as_deref().unwrap_or(DEFAULT_ID_PREFIX);
    attrs.push(("id", format!("{}-{addr}", escape_html(prefix))));
    if let Some(color) = &opts.gridcolor {
        attrs.push(("style", format!("border:1px solid {}", escape_html(color))));
    }

    let attrs: String = attrs
        .iter()
        .map(|(name, value)| format!(" {name}=\"{value}\""))
        .collect();
    format!("<td{attrs}>{content}</td>")
}

fn raw_text(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Boolean(b) => Some(b.to_string()),
        CellValue::Number(n) => Some(format_number(*n)),
        CellValue::String(s) => Some(s.clone()),
        CellValue::Date(d) => Some(format_iso(d)),
        CellValue::Error(e) => Some(e.to_string()),
        CellValue::Stub => None,
    }
}

/// Escape markup characters; line breaks become `<br/>`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '\n' => out.push_str("<br/>"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Range;
    use crate::excel::cell::{DataValue, cell_set_hyperlink};
    use crate::import::{AoaOptions, aoa_to_sheet};

    fn bare(opts: HtmlExportOptions) -> HtmlExportOptions {
        HtmlExportOptions {
            header: Some(String::new()),
            footer: Some(String::new()),
            ..opts
        }
    }

    #[test]
    fn cells_carry_type_value_and_id() {
        let ws = aoa_to_sheet(vec![vec![DataValue::from("a<b"), DataValue::from(2)]], &AoaOptions::default()).unwrap();
        let html = sheet_to_html(&ws, &bare(HtmlExportOptions::default())).unwrap();
        assert_eq!(
            html,
            "<table><tr>\
             <td data-t=\"s\" data-v=\"a&lt;b\" id=\"sheet-A1\">a&lt;b</td>\
             <td data-t=\"n\" data-v=\"2\" id=\"sheet-B1\">2</td>\
             </tr></table>"
        );
    }

    #[test]
    fn merges_become_spans() {
        let mut ws = aoa_to_sheet(
            vec![vec![DataValue::from("wide"), DataValue::Null], vec![DataValue::from(1), DataValue::from(2)]],
            &AoaOptions::default(),
        )
        .unwrap();
        ws.merges.push(Range::from_a1("A1:B1").unwrap());
        let html = sheet_to_html(&ws, &bare(HtmlExportOptions::default())).unwrap();
        assert!(html.contains("<td colspan=\"2\" data-t=\"s\""));
        assert!(!html.contains("sheet-B1"));
        assert!(html.contains("sheet-B2"));
    }

    #[test]
    fn editable_links_and_line_breaks() {
        let mut ws = aoa_to_sheet(vec![vec![DataValue::from("one\ntwo"), DataValue::from("site")]], &AoaOptions::default()).unwrap();
        cell_set_hyperlink(ws.cell_mut(CellAddress::new(0, 1)).unwrap(), "https://example.com", None);

        let html = sheet_to_html(&ws, &bare(HtmlExportOptions::default())).unwrap();
        assert!(html.contains(">one<br/>two</td>"));
        assert!(html.contains("<a href=\"https://example.com\">site</a>"));

        let editable = sheet_to_html(
            &ws,
            &bare(HtmlExportOptions {
                editable: true,
                id: Some("grid".into()),
                ..HtmlExportOptions::default()
            }),
        )
        .unwrap();
        assert!(editable.starts_with("<table id=\"grid\">"));
        assert!(editable.contains("<td id=\"grid-A1\"><span contenteditable=\"true\">one<br/>two</span></td>"));
        assert!(!editable.contains("data-t"));
    }

    #[test]
    fn dated_serials_follow_the_date_system() {
        let mut ws = Sheet::new();
        let mut serial = Cell::number(43831.0);
        serial.number_format = Some(crate::excel::cell::NumberFormat::default_date());
        ws.set(CellAddress::new(0, 0), serial);

        let html_1900 = sheet_to_html(&ws, &bare(HtmlExportOptions::default())).unwrap();
        assert!(html_1900.contains(">2020-01-01</td>"), "{html_1900}");

        let opts = bare(HtmlExportOptions {
            date_system: crate::excel::date::DateSystem::Excel1904,
            ..HtmlExportOptions::default()
        });
        let html_1904 = sheet_to_html(&ws, &opts).unwrap();
        assert!(html_1904.contains(">2024-01-02</td>"), "{html_1904}");
    }

    #[test]
    fn full_column_ranges_stop_at_the_used_rows() {
        let ws = aoa_to_sheet(vec![vec!["a", "b", "c"], vec!["d", "e", "f"]], &AoaOptions::default())
            .unwrap();
        let opts = bare(HtmlExportOptions {
            range: Some(crate::export::RangeSelector::A1("A:B".into())),
            ..HtmlExportOptions::default()
        });
        let html = sheet_to_html(&ws, &opts).unwrap();
        assert_eq!(html.matches("<tr>").count(), 2);
        assert!(html.contains("sheet-B2"));
        assert!(!html.contains("sheet-C1"));
    }

    #[test]
    fn default_document_wraps_the_table() {
        let ws = Sheet::new();
        let html = sheet_to_html(&ws, &HtmlExportOptions::default()).unwrap();
        assert!(html.starts_with(DEFAULT_HTML_HEADER));
        assert!(html.ends_with(DEFAULT_HTML_FOOTER));
    }
}
