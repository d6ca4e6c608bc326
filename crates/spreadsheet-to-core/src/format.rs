//! Supported file formats and their content types

use std::fmt;

/// Content type of legacy binary workbooks (`.xls`)
pub const XLS_CONTENT_TYPE: &str = "application/vnd.ms-excel";

/// Content type of zipped-XML workbooks (`.xlsx`)
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The workbook formats a reader exists for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Legacy binary workbook (BIFF8 inside a compound file)
    Xls,
    /// Office Open XML workbook (SpreadsheetML inside a ZIP archive)
    Xlsx,
}

impl Format {
    /// The single content type this format is registered under
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Xls => XLS_CONTENT_TYPE,
            Format::Xlsx => XLSX_CONTENT_TYPE,
        }
    }

    /// Match a content type against the known formats
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            XLS_CONTENT_TYPE => Some(Format::Xls),
            XLSX_CONTENT_TYPE => Some(Format::Xlsx),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Xls => f.write_str("xls"),
            Format::Xlsx => f.write_str("xlsx"),
        }
    }
}

/// When worksheet rows are materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowLoading {
    /// Convert a sheet's rows on its first row access
    #[default]
    Lazy,
    /// Convert every sheet while the workbook is opened
    Eager,
}

/// Options for opening a workbook
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Row materialization policy (default: lazy)
    pub rows: RowLoading,
}

impl OpenOptions {
    /// Options that materialize every sheet during open
    pub fn eager() -> Self {
        Self {
            rows: RowLoading::Eager,
        }
    }
}
