//! Test workbooks built in memory.
//!
//! [`xls_bytes`] writes a minimal BIFF8 compound file and [`xlsx_bytes`] a
//! minimal SpreadsheetML package. Both take the same [`FixtureSheet`] list so
//! the readers can be checked against identical content.

use std::io;
use std::path::{Path, PathBuf};

use spreadsheet_to_core::CellValue;

mod xls;
mod xlsx;

pub use xls::{xls_bytes, XlsFixtureOptions};
pub use xlsx::{xlsx_bytes, XlsxFixtureOptions};

/// One worksheet of a fixture workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSheet {
    pub name: String,
    /// Rows top to bottom; `CellValue::Empty` entries are written as blank
    /// cells so they still count toward the sheet's width.
    pub rows: Vec<Vec<CellValue>>,
}

impl FixtureSheet {
    pub fn new<S: Into<String>>(name: S, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// A sheet with no cells at all
    pub fn empty<S: Into<String>>(name: S) -> Self {
        Self::new(name, Vec::new())
    }

    pub(crate) fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// The two-column sheet used by the CSV round-trip checks:
/// `a,1` / `b,2`.
pub fn letters_and_numbers(name: &str) -> FixtureSheet {
    FixtureSheet::new(
        name,
        vec![
            vec![CellValue::string("a"), CellValue::Number(1.0)],
            vec![CellValue::string("b"), CellValue::Number(2.0)],
        ],
    )
}

/// Write `bytes` to `dir/file_name` and return the full path.
pub fn write_fixture(dir: &Path, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}
