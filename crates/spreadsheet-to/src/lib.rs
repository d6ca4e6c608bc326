//! # spreadsheet-to
//!
//! Open legacy binary (.xls) and Office Open XML (.xlsx) workbooks through a
//! single interface, walk their worksheets and rows, and write them out as
//! CSV.
//!
//! The format is chosen from the file extension. Rows are numbered from 1,
//! and both worksheet and row iteration can be repeated any number of times.
//!
//! ## Example
//!
//! ```no_run
//! use spreadsheet_to::prelude::*;
//!
//! let book = open_spreadsheet("report.xlsx")?;
//! for sheet in book.worksheets() {
//!     println!("{}: {} rows", sheet.name().unwrap_or("?"), sheet.row_count());
//!     for row in sheet.rows() {
//!         let row = row?;
//!         println!("{:?}", row.cell(1));
//!     }
//! }
//!
//! // Row 1 is the first row
//! let first = book.get(SheetKey::Index(0))?.row(1)?;
//! # let _ = first;
//! # Ok::<(), spreadsheet_to::Error>(())
//! ```
//!
//! ## Features
//!
//! - `xls` (default): legacy binary workbooks
//! - `xlsx` (default): Office Open XML workbooks
//! - `serde`: serialization for cell values and rows

mod dispatch;
pub mod prelude;

pub use dispatch::{
    content_type_for, open_spreadsheet, open_spreadsheet_with, registry, resolve, Opener,
    Registration,
};

// Re-export core types
pub use spreadsheet_to_core::{
    CellError, CellValue, Error, Format, OpenOptions, Result, Row, RowLoading, Rows, SheetKey,
    Workbook, WorkbookExt, Worksheet, WorksheetExt, Worksheets, XLSX_CONTENT_TYPE,
    XLS_CONTENT_TYPE,
};

// Re-export I/O types
pub use spreadsheet_to_csv::{
    export_workbook, CsvError, CsvWriteOptions, CsvWriter, ExportOptions, LineTerminator,
};
#[cfg(feature = "xls")]
pub use spreadsheet_to_xls::{XlsWorkbook, XlsWorksheet};
#[cfg(feature = "xlsx")]
pub use spreadsheet_to_xlsx::{XlsxWorkbook, XlsxWorksheet};
