//! # spreadsheet-to-xls
//!
//! Reader for the legacy Excel binary format (.xls, BIFF8).
//!
//! The `Workbook` stream is read once when the file is opened. Each
//! worksheet keeps its raw records and decodes them into rows the first
//! time a row is requested.

pub mod biff;
pub mod error;
pub mod reader;
pub mod sheet;

pub use error::{XlsError, XlsResult};
pub use reader::XlsWorkbook;
pub use sheet::XlsWorksheet;
