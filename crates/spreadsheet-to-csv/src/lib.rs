//! # spreadsheet-to-csv
//!
//! Writes worksheets as delimited text, one file per worksheet.

mod error;
mod export;
mod options;
mod writer;

pub use error::{CsvError, CsvResult};
pub use export::{export_workbook, output_dir, sheet_file_name};
pub use options::{CsvWriteOptions, ExportOptions, LineTerminator};
pub use writer::CsvWriter;
