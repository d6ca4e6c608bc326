//! Rows, and the grid that normalizes sparse cells into them

use std::collections::BTreeMap;
use std::ops::Index;

use crate::cell::CellValue;

/// A materialized worksheet row: one value per column, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    cells: Vec<CellValue>,
}

impl Row {
    /// Create a row from its values
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// A row of `width` empty cells
    pub fn blank(width: usize) -> Self {
        Self {
            cells: vec![CellValue::Empty; width],
        }
    }

    /// Number of cells in the row
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row has no cells at all
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Get a cell by 1-based column number
    pub fn cell(&self, column: usize) -> Option<&CellValue> {
        column.checked_sub(1).and_then(|idx| self.cells.get(idx))
    }

    /// All values, in column order
    pub fn values(&self) -> &[CellValue] {
        &self.cells
    }

    /// Iterate over the values
    pub fn iter(&self) -> std::slice::Iter<'_, CellValue> {
        self.cells.iter()
    }

    /// Consume the row, returning its values
    pub fn into_values(self) -> Vec<CellValue> {
        self.cells
    }
}

impl Index<usize> for Row {
    type Output = CellValue;

    /// 0-based indexing into the underlying values.
    fn index(&self, idx: usize) -> &CellValue {
        &self.cells[idx]
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a CellValue;
    type IntoIter = std::slice::Iter<'a, CellValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

impl From<Vec<CellValue>> for Row {
    fn from(cells: Vec<CellValue>) -> Self {
        Row::new(cells)
    }
}

/// The rows of a worksheet, stored sparsely.
///
/// Only rows that hold at least one cell are kept; every other position in
/// `0..len()` resolves to a single shared blank row of the sheet's width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRows {
    rows: BTreeMap<usize, Row>,
    row_count: usize,
    blank: Row,
}

impl SheetRows {
    /// `row_count` blank rows of `column_count` cells
    pub fn new(row_count: usize, column_count: usize) -> Self {
        Self {
            rows: BTreeMap::new(),
            row_count,
            blank: Row::blank(column_count),
        }
    }

    /// Number of rows, populated or not
    pub fn len(&self) -> usize {
        self.row_count
    }

    /// Check if there are no rows
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Width of a blank row
    pub fn column_count(&self) -> usize {
        self.blank.len()
    }

    /// Number of rows actually holding cells
    pub fn populated(&self) -> usize {
        self.rows.len()
    }

    /// Get a row by 0-based position
    pub fn get(&self, pos: usize) -> Option<&Row> {
        if pos >= self.row_count {
            return None;
        }
        Some(self.rows.get(&pos).unwrap_or(&self.blank))
    }

    /// Iterate over all rows in order, blanks included
    pub fn iter(&self) -> impl Iterator<Item = &Row> + '_ {
        (0..self.row_count).map(move |pos| self.rows.get(&pos).unwrap_or(&self.blank))
    }
}

impl From<Vec<Row>> for SheetRows {
    fn from(rows: Vec<Row>) -> Self {
        let column_count = rows.iter().map(Row::len).max().unwrap_or(0);
        Self {
            row_count: rows.len(),
            rows: rows.into_iter().enumerate().collect(),
            blank: Row::blank(column_count),
        }
    }
}

/// Collects sparse cells into [`SheetRows`] of a fixed size.
///
/// Row storage is allocated only for rows that receive a cell, so a large
/// declared size with few cells stays small.
#[derive(Debug)]
pub struct RowGrid {
    rows: BTreeMap<usize, Row>,
    row_count: usize,
    column_count: usize,
    dropped: usize,
}

impl RowGrid {
    /// An empty grid of the given size
    pub fn new(row_count: usize, column_count: usize) -> Self {
        Self {
            rows: BTreeMap::new(),
            row_count,
            column_count,
            dropped: 0,
        }
    }

    /// Store a value at 0-based `(row, col)`.
    ///
    /// Cells outside the grid are counted and discarded.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if row >= self.row_count || col >= self.column_count {
            self.dropped += 1;
            return;
        }
        let width = self.column_count;
        let cells = &mut self
            .rows
            .entry(row)
            .or_insert_with(|| Row::blank(width))
            .cells;
        cells[col] = value;
    }

    /// Number of rows in the grid
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns in every row
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Number of cells discarded by [`RowGrid::set`] so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Finish the grid, logging how many out-of-bounds cells were discarded.
    pub fn into_rows(self, sheet: &str) -> SheetRows {
        if self.dropped > 0 {
            log::warn!(
                "sheet '{sheet}': discarded {} cell(s) outside its {}x{} dimensions",
                self.dropped,
                self.row_count,
                self.column_count
            );
        }
        SheetRows {
            rows: self.rows,
            row_count: self.row_count,
            blank: Row::blank(self.column_count),
        }
    }
}

/// Tracks the furthest cell seen, for sheets that do not declare their size.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    /// Rows counted from the first row through the last occupied one
    pub rows: usize,
    /// Columns counted from the first column through the last occupied one
    pub columns: usize,
}

impl Extent {
    /// Record a 0-based cell position
    pub fn include(&mut self, row: usize, col: usize) {
        self.rows = self.rows.max(row + 1);
        self.columns = self.columns.max(col + 1);
    }

    /// Component-wise maximum of two extents
    pub fn union(self, other: Extent) -> Extent {
        Extent {
            rows: self.rows.max(other.rows),
            columns: self.columns.max(other.columns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_row_cell_is_one_based() {
        let row = Row::new(vec!["a".into(), 1.0.into()]);
        assert_eq!(row.cell(0), None);
        assert_eq!(row.cell(1), Some(&CellValue::string("a")));
        assert_eq!(row.cell(2), Some(&CellValue::Number(1.0)));
        assert_eq!(row.cell(3), None);
        assert_eq!(row[1], CellValue::Number(1.0));
    }

    #[test]
    fn test_grid_pads_sparse_cells() {
        let mut grid = RowGrid::new(2, 3);
        grid.set(0, 0, "a".into());
        grid.set(1, 2, 2.0.into());

        let rows = grid.into_rows("Sheet1");
        assert_eq!(
            rows.iter().cloned().collect::<Vec<_>>(),
            vec![
                Row::new(vec!["a".into(), CellValue::Empty, CellValue::Empty]),
                Row::new(vec![CellValue::Empty, CellValue::Empty, 2.0.into()]),
            ]
        );
    }

    #[test]
    fn test_grid_drops_out_of_bounds_cells() {
        let mut grid = RowGrid::new(1, 1);
        grid.set(0, 1, "right".into());
        grid.set(1, 0, "below".into());
        grid.set(0, 0, "kept".into());
        assert_eq!(grid.dropped(), 2);

        let rows = grid.into_rows("Sheet1");
        assert_eq!(rows.get(0), Some(&Row::new(vec!["kept".into()])));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_empty_grid() {
        let grid = RowGrid::new(0, 0);
        assert_eq!(grid.row_count(), 0);
        assert!(grid.into_rows("Empty").is_empty());
    }

    #[test]
    fn test_grid_stores_only_populated_rows() {
        let mut grid = RowGrid::new(1_048_576, 16_384);
        grid.set(0, 0, 1.0.into());
        grid.set(1_048_575, 16_383, "last".into());

        let rows = grid.into_rows("Sparse");
        assert_eq!(rows.len(), 1_048_576);
        assert_eq!(rows.populated(), 2);
        assert_eq!(rows.get(0).unwrap().cell(1), Some(&CellValue::Number(1.0)));
        assert_eq!(rows.get(0).unwrap().len(), 16_384);

        let middle = rows.get(500_000).unwrap();
        assert_eq!(middle.len(), 16_384);
        assert!(middle.iter().all(CellValue::is_empty));

        let last = rows.get(1_048_575).unwrap();
        assert_eq!(last.cell(16_384), Some(&CellValue::string("last")));
        assert_eq!(rows.get(1_048_576), None);
    }

    #[test]
    fn test_sheet_rows_from_dense() {
        let rows = SheetRows::from(vec![
            Row::new(vec!["a".into()]),
            Row::new(vec!["b".into(), 2.0.into()]),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.column_count(), 2);
        assert_eq!(rows.get(1).unwrap().cell(2), Some(&CellValue::Number(2.0)));
        assert_eq!(rows.iter().count(), 2);
    }

    #[test]
    fn test_extent() {
        let mut extent = Extent::default();
        assert_eq!(extent, Extent { rows: 0, columns: 0 });
        extent.include(4, 1);
        extent.include(0, 6);
        assert_eq!(extent, Extent { rows: 5, columns: 7 });
        let merged = extent.union(Extent { rows: 9, columns: 2 });
        assert_eq!(merged, Extent { rows: 9, columns: 7 });
    }
}
