//! Worksheet abstraction
//!
//! A [`Worksheet`] exposes its dimensions and 1-based row access. Readers
//! may defer row extraction until the first [`Worksheet::row`] call; they
//! keep the result in a [`RowCache`] so the whole sheet is converted once.

use std::fmt;

use once_cell::unsync::OnceCell;

use crate::error::{Error, Result};
use crate::row::{Row, SheetRows};

/// A single sheet within a workbook.
pub trait Worksheet {
    /// Sheet name as declared by the file, if it has one
    fn name(&self) -> Option<&str>;

    /// Number of rows, counted from row 1
    fn row_count(&self) -> usize;

    /// Number of columns, counted from column A
    fn column_count(&self) -> usize;

    /// Get a row by 1-based index.
    ///
    /// Index 0 and indices past [`Worksheet::row_count`] fail with
    /// [`Error::InvalidIndex`]. The returned row has exactly
    /// [`Worksheet::column_count`] cells.
    fn row(&self, index: usize) -> Result<&Row>;

    /// Whether row data has been materialized yet
    fn is_loaded(&self) -> bool;
}

impl fmt::Debug for dyn Worksheet + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worksheet")
            .field("name", &self.name())
            .field("row_count", &self.row_count())
            .field("column_count", &self.column_count())
            .finish()
    }
}

/// Iteration helpers available on every [`Worksheet`], including `dyn Worksheet`.
pub trait WorksheetExt: Worksheet {
    /// Iterate over rows `1..=row_count`.
    ///
    /// Every call starts a new pass from row 1.
    fn rows(&self) -> Rows<'_, Self> {
        Rows::new(self)
    }
}

impl<S: Worksheet + ?Sized> WorksheetExt for S {}

/// Forward iterator over a worksheet's rows
#[derive(Debug)]
pub struct Rows<'a, S: ?Sized> {
    sheet: &'a S,
    next: usize,
    end: usize,
}

impl<'a, S: Worksheet + ?Sized> Rows<'a, S> {
    fn new(sheet: &'a S) -> Self {
        Self {
            sheet,
            next: 1,
            end: sheet.row_count(),
        }
    }
}

impl<'a, S: Worksheet + ?Sized> Iterator for Rows<'a, S> {
    type Item = Result<&'a Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        let sheet: &'a S = self.sheet;
        Some(sheet.row(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end + 1).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<'a, S: Worksheet + ?Sized> ExactSizeIterator for Rows<'a, S> {}

/// Translate a 1-based row index into a position in a row vector.
pub fn row_position(index: usize, row_count: usize) -> Result<usize> {
    if index == 0 || index > row_count {
        return Err(Error::InvalidIndex { index, row_count });
    }
    Ok(index - 1)
}

/// Once-populated store for a worksheet's materialized rows.
///
/// A failed load leaves the cache empty, so the next access retries and
/// reports the failure again.
#[derive(Debug, Default)]
pub struct RowCache {
    rows: OnceCell<SheetRows>,
}

impl RowCache {
    /// An empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that already holds `rows`
    pub fn with_rows(rows: SheetRows) -> Self {
        Self {
            rows: OnceCell::with_value(rows),
        }
    }

    /// Whether rows have been stored
    pub fn is_loaded(&self) -> bool {
        self.rows.get().is_some()
    }

    /// Rows, running `load` first if nothing is stored yet.
    pub fn get_or_load<F>(&self, load: F) -> Result<&SheetRows>
    where
        F: FnOnce() -> Result<SheetRows>,
    {
        self.rows.get_or_try_init(load)
    }

    /// Look up the 1-based `index`, loading on first use.
    ///
    /// The bounds check happens before loading, so an invalid index never
    /// triggers materialization.
    pub fn row<F>(&self, index: usize, row_count: usize, load: F) -> Result<&Row>
    where
        F: FnOnce() -> Result<SheetRows>,
    {
        let pos = row_position(index, row_count)?;
        let rows = self.get_or_load(load)?;
        rows.get(pos)
            .ok_or(Error::InvalidIndex { index, row_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    /// Sheet whose loads are counted, to observe caching.
    struct CountingSheet {
        rows: Vec<Row>,
        loads: Cell<usize>,
        cache: RowCache,
    }

    impl CountingSheet {
        fn new(rows: Vec<Row>) -> Self {
            Self {
                rows,
                loads: Cell::new(0),
                cache: RowCache::new(),
            }
        }
    }

    impl Worksheet for CountingSheet {
        fn name(&self) -> Option<&str> {
            Some("Counting")
        }

        fn row_count(&self) -> usize {
            self.rows.len()
        }

        fn column_count(&self) -> usize {
            self.rows.first().map_or(0, Row::len)
        }

        fn row(&self, index: usize) -> Result<&Row> {
            self.cache.row(index, self.row_count(), || {
                self.loads.set(self.loads.get() + 1);
                Ok(self.rows.clone().into())
            })
        }

        fn is_loaded(&self) -> bool {
            self.cache.is_loaded()
        }
    }

    fn two_rows() -> Vec<Row> {
        vec![
            Row::new(vec!["a".into(), 1.0.into()]),
            Row::new(vec!["b".into(), 2.0.into()]),
        ]
    }

    #[test]
    fn test_row_zero_is_invalid() {
        let sheet = CountingSheet::new(two_rows());
        let err = sheet.row(0).unwrap_err();
        assert!(err.is_invalid_index());
        assert!(!sheet.is_loaded(), "bounds check must not load rows");
    }

    #[test]
    fn test_row_past_end_is_invalid() {
        let sheet = CountingSheet::new(two_rows());
        assert!(matches!(
            sheet.row(3),
            Err(Error::InvalidIndex {
                index: 3,
                row_count: 2
            })
        ));
    }

    #[test]
    fn test_rows_load_once() {
        let sheet = CountingSheet::new(two_rows());
        assert_eq!(sheet.row(1).unwrap()[0], CellValue::string("a"));
        assert_eq!(sheet.row(2).unwrap()[0], CellValue::string("b"));
        assert_eq!(sheet.row(1).unwrap()[0], CellValue::string("a"));
        assert_eq!(sheet.loads.get(), 1);
    }

    #[test]
    fn test_rows_iteration_restarts() {
        let sheet = CountingSheet::new(two_rows());
        let first: Vec<Row> = sheet.rows().map(|r| r.unwrap().clone()).collect();
        let second: Vec<Row> = sheet.rows().map(|r| r.unwrap().clone()).collect();
        assert_eq!(first, two_rows());
        assert_eq!(first, second);
    }

    #[test]
    fn test_rows_exact_size() {
        let sheet = CountingSheet::new(two_rows());
        let mut rows = sheet.rows();
        assert_eq!(rows.len(), 2);
        rows.next();
        assert_eq!(rows.len(), 1);
        rows.next();
        assert_eq!(rows.len(), 0);
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_empty_sheet_iterates_zero_times() {
        let sheet = CountingSheet::new(Vec::new());
        assert_eq!(sheet.rows().count(), 0);
        assert!(!sheet.is_loaded());
    }

    #[test]
    fn test_rows_through_trait_object() {
        let sheet = CountingSheet::new(two_rows());
        let dynamic: &dyn Worksheet = &sheet;
        assert_eq!(dynamic.rows().count(), 2);
    }

    #[test]
    fn test_failed_load_is_retried() {
        let cache = RowCache::new();
        let err = cache
            .row(1, 1, || Err(Error::open("broken.xlsx", "truncated part")))
            .unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        assert!(!cache.is_loaded());

        let row = cache.row(1, 1, || Ok(vec![Row::blank(1)].into())).unwrap();
        assert_eq!(row, &Row::blank(1));
        assert!(cache.is_loaded());
    }

    #[test]
    fn test_with_rows_is_preloaded() {
        let cache = RowCache::with_rows(two_rows().into());
        assert!(cache.is_loaded());
        let row = cache
            .row(2, 2, || panic!("preloaded cache must not load"))
            .unwrap();
        assert_eq!(row[1], CellValue::Number(2.0));
    }
}
