use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use indexmap::IndexMap;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sheet_interchange::{
    CsvExportOptions, CsvImportOptions, DataValue, HeaderMode, HtmlExportOptions,
    JsonExportOptions, JsonImportOptions, ReadOptions, Sheet, Workbook, book_append_sheet,
    book_new, csv_to_sheet, read_workbook, records_to_sheet, serialize_to_json, sheet_to_aoa,
    sheet_to_csv, sheet_to_formulae, sheet_to_html, sheet_to_json, sheet_to_txt, workbook_to_json,
    write_xlsx,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Txt,
    Json,
    Aoa,
    Html,
    Formulae,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file: a spreadsheet (xlsx, xls, ods, ..), delimited text or a JSON array of records
    #[arg(required = true)]
    input: PathBuf,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Sheet to export (defaults to the first sheet)
    #[arg(long, short = 's')]
    sheet: Option<String>,

    /// Export every sheet, keyed by sheet name (json and aoa only)
    #[arg(long, short = 'a')]
    all_sheets: bool,

    /// Write to this file instead of stdout; a `.xlsx` path writes a workbook
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Field separator for delimited output
    #[arg(long, default_value = ",")]
    fs: String,

    /// Record separator for delimited output
    #[arg(long, default_value = "\n")]
    rs: String,

    /// Drop trailing empty fields from each record
    #[arg(long)]
    strip: bool,

    /// Leave out hidden rows and columns
    #[arg(long)]
    skip_hidden: bool,

    /// Export formatted text instead of raw values
    #[arg(long)]
    formatted: bool,

    /// Number format for date cells in text output, e.g. yyyy-mm-dd
    #[arg(long)]
    date_nf: Option<String>,

    /// Record keys: 'keys' for the first row, 'A' for column letters
    #[arg(long, default_value = "keys")]
    header: HeaderMode,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let workbook = load_workbook(&cli.input)?;

    if let Some(output) = &cli.output {
        if has_extension(output, &["xlsx"]) {
            write_xlsx(&workbook, output)?;
            info!(path = %output.display(), "workbook written");
            return Ok(());
        }
    }

    let rendered = render(&cli, &workbook)?;
    match &cli.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write to file: {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn has_extension(path: &Path, wanted: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| wanted.iter().any(|w| ext.eq_ignore_ascii_case(w)))
}

fn load_workbook(path: &Path) -> Result<Workbook> {
    if has_extension(path, &["csv", "tsv"]) {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let opts = CsvImportOptions {
            delimiter: if has_extension(path, &["tsv"]) { b'\t' } else { b',' },
            ..CsvImportOptions::default()
        };
        return single_sheet(csv_to_sheet(&text, &opts)?);
    }

    if has_extension(path, &["json"]) {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let records: Vec<serde_json::Value> = serde_json::from_str(&text)
            .with_context(|| format!("Expected a JSON array of records in {}", path.display()))?;
        return single_sheet(records_to_sheet(&records, &JsonImportOptions::default())?);
    }

    Ok(read_workbook(path, &ReadOptions::default())?)
}

fn single_sheet(sheet: Sheet) -> Result<Workbook> {
    let mut wb = book_new();
    book_append_sheet(&mut wb, sheet, None)?;
    Ok(wb)
}

fn render(cli: &Cli, workbook: &Workbook) -> Result<String> {
    let json_opts = JsonExportOptions {
        header: cli.header.clone(),
        raw: !cli.formatted,
        skip_hidden: cli.skip_hidden,
        date_system: workbook.date_system,
        date_nf: cli.date_nf.clone(),
        ..JsonExportOptions::default()
    };

    if cli.all_sheets {
        return match cli.format {
            Format::Json => json_text(&workbook_to_json(workbook, &json_opts)?),
            Format::Aoa => {
                let mut rows: IndexMap<&str, Vec<Vec<DataValue>>> = IndexMap::new();
                for (name, sheet) in workbook.sheets() {
                    rows.insert(name, sheet_to_aoa(sheet, &json_opts)?);
                }
                json_text(&rows)
            }
            other => bail!("--all-sheets is not supported for {other:?} output"),
        };
    }

    let sheet = match &cli.sheet {
        Some(name) => workbook.sheet(name.as_str())?,
        None => match workbook.sheets().next() {
            Some((_, sheet)) => sheet,
            None => bail!("Workbook has no sheets: {}", cli.input.display()),
        },
    };

    let csv_opts = CsvExportOptions {
        fs: cli.fs.clone(),
        rs: cli.rs.clone(),
        strip: cli.strip,
        skip_hidden: cli.skip_hidden,
        raw_numbers: !cli.formatted,
        date_system: workbook.date_system,
        date_nf: cli.date_nf.clone(),
        ..CsvExportOptions::default()
    };

    let text = match cli.format {
        Format::Csv => sheet_to_csv(sheet, &csv_opts)?,
        Format::Txt => sheet_to_txt(sheet, &csv_opts)?,
        Format::Json => json_text(&sheet_to_json(sheet, &json_opts)?)?,
        Format::Aoa => json_text(&sheet_to_aoa(sheet, &json_opts)?)?,
        Format::Html => {
            let html_opts = HtmlExportOptions {
                date_system: workbook.date_system,
                ..HtmlExportOptions::default()
            };
            sheet_to_html(sheet, &html_opts)?
        }
        Format::Formulae => {
            let mut lines = sheet_to_formulae(sheet).join("\n");
            lines.push('\n');
            lines
        }
    };
    Ok(text)
}

fn json_text<T: serde::Serialize>(data: &T) -> Result<String> {
    let mut text = serialize_to_json(data)?;
    text.push('\n');
    Ok(text)
}
