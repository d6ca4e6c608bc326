//! Prelude module - common imports for spreadsheet-to users
//!
//! ```rust
//! use spreadsheet_to::prelude::*;
//! ```

pub use crate::{
    open_spreadsheet,
    open_spreadsheet_with,
    CellValue,
    Error,
    OpenOptions,
    Result,
    Row,
    SheetKey,
    // Traits and their iteration helpers
    Workbook,
    WorkbookExt,
    Worksheet,
    WorksheetExt,
};
