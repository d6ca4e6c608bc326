//! spreadsheet-to CLI - convert workbooks to one CSV file per worksheet

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use spreadsheet_to::prelude::*;
use spreadsheet_to::{export_workbook, CsvWriteOptions, ExportOptions, LineTerminator};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "spreadsheet-to")]
#[command(author, version, about = "Convert spreadsheets to other formats")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every worksheet to <destination>/<source name>-<sheet name>.csv
    #[command(alias = "csv")]
    ToCsv {
        /// The spreadsheet to convert (xls, xlsx)
        source: PathBuf,

        /// Directory for the output files (default: the source's directory)
        #[arg(short, long)]
        destination: Option<PathBuf>,

        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Row terminator
        #[arg(long, value_enum, default_value_t = LineEnding::Crlf)]
        line_ending: LineEnding,

        /// Read every sheet while opening instead of on demand
        #[arg(long)]
        eager: bool,
    },

    /// List the worksheets of a workbook
    Sheets {
        /// Input spreadsheet file
        source: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LineEnding {
    Lf,
    Crlf,
    Cr,
}

impl From<LineEnding> for LineTerminator {
    fn from(ending: LineEnding) -> Self {
        match ending {
            LineEnding::Lf => LineTerminator::LF,
            LineEnding::Crlf => LineTerminator::CRLF,
            LineEnding::Cr => LineTerminator::CR,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::ToCsv {
            source,
            destination,
            delimiter,
            line_ending,
            eager,
        } => to_csv(&source, destination, delimiter, line_ending, eager),
        Commands::Sheets { source } => list_sheets(&source),
    }
}

fn open(source: &Path, options: &OpenOptions) -> Result<Box<dyn Workbook>> {
    open_spreadsheet_with(source, options)
        .with_context(|| format!("Failed to open '{}'", source.display()))
}

fn to_csv(
    source: &Path,
    destination: Option<PathBuf>,
    delimiter: char,
    line_ending: LineEnding,
    eager: bool,
) -> Result<()> {
    if !delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character, got '{delimiter}'");
    }

    let options = if eager {
        OpenOptions::eager()
    } else {
        OpenOptions::default()
    };
    let workbook = open(source, &options)?;

    let export = ExportOptions {
        destination,
        csv: CsvWriteOptions {
            delimiter: delimiter as u8,
            line_terminator: line_ending.into(),
            ..Default::default()
        },
    };
    let written = export_workbook(&*workbook, source, &export)
        .with_context(|| format!("Failed to convert '{}'", source.display()))?;

    for path in &written {
        eprintln!("Wrote '{}'", path.display());
    }
    if written.is_empty() {
        eprintln!("Warning: '{}' has no worksheets", source.display());
    }

    Ok(())
}

fn list_sheets(source: &Path) -> Result<()> {
    let workbook = open(source, &OpenOptions::default())?;

    for (i, sheet) in workbook.worksheets().enumerate() {
        println!(
            "{}\t{}\t{} x {}",
            i,
            sheet.name().unwrap_or("(unnamed)"),
            sheet.row_count(),
            sheet.column_count()
        );
    }

    Ok(())
}
