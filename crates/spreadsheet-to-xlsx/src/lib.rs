//! # spreadsheet-to-xlsx
//!
//! Reader for Office Open XML workbooks (.xlsx).
//!
//! The ZIP archive stays open for as long as the workbook is alive. Sheet
//! sizes are read from each sheet's `<dimension>` element when the workbook
//! is opened; cell data is parsed the first time a row is requested.

pub mod error;
pub mod package;
pub mod reader;
pub mod sheet;
pub mod strings;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxWorkbook;
pub use sheet::XlsxWorksheet;
