//! Workbook abstraction

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::worksheet::Worksheet;

/// Selects a worksheet by position or by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKey<'a> {
    /// 0-based position in the workbook's native sheet order
    Index(usize),
    /// Declared sheet name
    Name(&'a str),
}

impl From<usize> for SheetKey<'_> {
    fn from(index: usize) -> Self {
        SheetKey::Index(index)
    }
}

impl<'a> From<&'a str> for SheetKey<'a> {
    fn from(name: &'a str) -> Self {
        SheetKey::Name(name)
    }
}

impl<'a> From<&'a String> for SheetKey<'a> {
    fn from(name: &'a String) -> Self {
        SheetKey::Name(name)
    }
}

impl fmt::Display for SheetKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetKey::Index(i) => write!(f, "index {}", i),
            SheetKey::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// A read-only view of a spreadsheet file: an ordered, named collection
/// of worksheets.
pub trait Workbook {
    /// Format of the underlying file
    fn format(&self) -> Format;

    /// Path the workbook was opened from, if it came from a file
    fn source(&self) -> Option<&Path>;

    /// Number of worksheets
    fn sheet_count(&self) -> usize;

    /// Get a worksheet by 0-based position
    fn worksheet(&self, index: usize) -> Option<&dyn Worksheet>;

    /// Get a worksheet by its declared name
    fn worksheet_by_name(&self, name: &str) -> Option<&dyn Worksheet>;

    /// Get a worksheet by position or name, failing with [`Error::NotFound`].
    fn get(&self, key: SheetKey<'_>) -> Result<&dyn Worksheet> {
        let sheet = match key {
            SheetKey::Index(index) => self.worksheet(index),
            SheetKey::Name(name) => self.worksheet_by_name(name),
        };
        sheet.ok_or_else(|| Error::NotFound(key.to_string()))
    }
}

impl fmt::Debug for dyn Workbook + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workbook")
            .field("format", &self.format())
            .field("source", &self.source())
            .field("sheet_count", &self.sheet_count())
            .finish()
    }
}

/// Iteration helpers available on every [`Workbook`], including `dyn Workbook`.
pub trait WorkbookExt: Workbook {
    /// Iterate over worksheets in native order; every call starts a new pass.
    fn worksheets(&self) -> Worksheets<'_, Self> {
        Worksheets {
            book: self,
            next: 0,
        }
    }
}

impl<B: Workbook + ?Sized> WorkbookExt for B {}

/// Forward iterator over a workbook's worksheets
#[derive(Debug)]
pub struct Worksheets<'a, B: ?Sized> {
    book: &'a B,
    next: usize,
}

impl<'a, B: Workbook + ?Sized> Iterator for Worksheets<'a, B> {
    type Item = &'a dyn Worksheet;

    fn next(&mut self) -> Option<Self::Item> {
        let book: &'a B = self.book;
        let sheet = book.worksheet(self.next)?;
        self.next += 1;
        Some(sheet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.book.sheet_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<'a, B: Workbook + ?Sized> ExactSizeIterator for Worksheets<'a, B> {}

/// Ordered worksheet storage with a name index, shared by the readers.
#[derive(Debug)]
pub struct SheetList<S> {
    sheets: Vec<S>,
    by_name: HashMap<String, usize>,
}

impl<S: Worksheet> SheetList<S> {
    /// An empty list
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Append a sheet, registering its name.
    ///
    /// If the name is already taken the first sheet keeps it; the new one
    /// is still reachable by position.
    pub fn push(&mut self, sheet: S) {
        let index = self.sheets.len();
        if let Some(name) = sheet.name() {
            if self.by_name.contains_key(name) {
                log::warn!("duplicate sheet name '{name}' at position {index}; keeping the first");
            } else {
                self.by_name.insert(name.to_string(), index);
            }
        }
        self.sheets.push(sheet);
    }

    /// Number of sheets
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Check if there are no sheets
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Get a sheet by 0-based position
    pub fn get(&self, index: usize) -> Option<&S> {
        self.sheets.get(index)
    }

    /// Get a sheet by name
    pub fn by_name(&self, name: &str) -> Option<&S> {
        self.by_name.get(name).and_then(|&i| self.sheets.get(i))
    }

    /// Iterate over the concrete sheets
    pub fn iter(&self) -> std::slice::Iter<'_, S> {
        self.sheets.iter()
    }
}

impl<S: Worksheet> Default for SheetList<S> {
    fn default() -> Self {
        Self::new()
    }
}
