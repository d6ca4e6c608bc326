//! # spreadsheet-to-core
//!
//! Format-independent model shared by the spreadsheet-to readers:
//! - [`CellValue`] - A raw cell value (number, string, boolean, error, empty)
//! - [`Row`], [`RowGrid`] and [`SheetRows`] - Rows and the sparse store that builds them
//! - [`Worksheet`] and [`Workbook`] - The traits every format implements
//! - [`Error`] - The error taxonomy surfaced to callers
//!
//! Rows are addressed from 1, like a spreadsheet application shows them.
//!
//! ## Example
//!
//! ```rust
//! use spreadsheet_to_core::{Row, RowCache, Worksheet, WorksheetExt, Result};
//!
//! struct Static {
//!     cache: RowCache,
//! }
//!
//! impl Worksheet for Static {
//!     fn name(&self) -> Option<&str> { Some("Static") }
//!     fn row_count(&self) -> usize { 2 }
//!     fn column_count(&self) -> usize { 1 }
//!     fn row(&self, index: usize) -> Result<&Row> {
//!         self.cache.row(index, 2, || {
//!             Ok(vec![Row::new(vec!["a".into()]), Row::new(vec![1.0.into()])].into())
//!         })
//!     }
//!     fn is_loaded(&self) -> bool { self.cache.is_loaded() }
//! }
//!
//! let sheet = Static { cache: RowCache::new() };
//! assert!(sheet.row(0).is_err());
//! assert_eq!(sheet.rows().count(), 2);
//! ```

pub mod address;
pub mod cell;
pub mod error;
pub mod format;
pub mod row;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use address::{CellRef, CellSpan};
pub use cell::{CellError, CellValue};
pub use error::{BackendError, Error, Result};
pub use format::{Format, OpenOptions, RowLoading, XLSX_CONTENT_TYPE, XLS_CONTENT_TYPE};
pub use row::{Extent, Row, RowGrid, SheetRows};
pub use workbook::{SheetKey, SheetList, Workbook, WorkbookExt, Worksheets};
pub use worksheet::{row_position, RowCache, Rows, Worksheet, WorksheetExt};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
