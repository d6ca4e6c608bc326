//! A1-style cell references and ranges
//!
//! Only the pieces the readers need to size worksheets: column letters,
//! row numbers, and `start:end` ranges as found in `<dimension ref>`.

use std::fmt;

use crate::{MAX_COLS, MAX_ROWS};

/// A cell position, 0-based internally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u32,
}

impl CellRef {
    /// Create a new cell reference from 0-based indices
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style reference such as `B7` or `$AA$10`.
    ///
    /// Returns `None` for anything that is not a single in-bounds cell.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let bytes = s.as_bytes();
        let mut pos = 0;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        if pos == col_start {
            return None;
        }
        let col = letters_to_column(&s[col_start..pos])?;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let row: u32 = s[pos..].parse().ok()?;
        // Excel rows are 1-based, we use 0-based internally
        if row == 0 || row > MAX_ROWS || col >= MAX_COLS {
            return None;
        }

        Some(Self { row: row - 1, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row + 1)
    }
}

/// A rectangular block of cells, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellSpan {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellSpan {
    /// Parse `A1:C10`, or a lone `A1` which spans a single cell.
    pub fn parse(s: &str) -> Option<Self> {
        match s.split_once(':') {
            Some((start, end)) => {
                let start = CellRef::parse(start)?;
                let end = CellRef::parse(end)?;
                Some(Self {
                    start: CellRef::new(start.row.min(end.row), start.col.min(end.col)),
                    end: CellRef::new(start.row.max(end.row), start.col.max(end.col)),
                })
            }
            None => {
                let cell = CellRef::parse(s)?;
                Some(Self {
                    start: cell,
                    end: cell,
                })
            }
        }
    }

    /// Rows counted from row 1 through the last row of the span
    pub fn row_extent(&self) -> usize {
        self.end.row as usize + 1
    }

    /// Columns counted from column A through the last column of the span
    pub fn column_extent(&self) -> usize {
        self.end.col as usize + 1
    }
}

/// Convert column letters (`A`, `Z`, `AA`, ...) to a 0-based index.
pub fn letters_to_column(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut col: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (b.to_ascii_uppercase() - b'A') as u32 + 1;
    }
    Some(col - 1)
}

/// Convert a 0-based column index to letters.
pub fn column_to_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_to_column() {
        assert_eq!(letters_to_column("A"), Some(0));
        assert_eq!(letters_to_column("z"), Some(25));
        assert_eq!(letters_to_column("AA"), Some(26));
        assert_eq!(letters_to_column("XFD"), Some(16383));
        assert_eq!(letters_to_column(""), None);
        assert_eq!(letters_to_column("ABCD"), None);
    }

    #[test]
    fn test_column_to_letters() {
        assert_eq!(column_to_letters(0), "A");
        assert_eq!(column_to_letters(25), "Z");
        assert_eq!(column_to_letters(26), "AA");
        assert_eq!(column_to_letters(16383), "XFD");
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(CellRef::parse("A1"), Some(CellRef::new(0, 0)));
        assert_eq!(CellRef::parse("$B$2"), Some(CellRef::new(1, 1)));
        assert_eq!(CellRef::parse("AA10"), Some(CellRef::new(9, 26)));
        assert_eq!(CellRef::parse("A0"), None);
        assert_eq!(CellRef::parse("12"), None);
        assert_eq!(CellRef::parse("B"), None);
        assert_eq!(CellRef::new(9, 26).to_string(), "AA10");
    }

    #[test]
    fn test_parse_span() {
        let span = CellSpan::parse("A1:C10").unwrap();
        assert_eq!(span.row_extent(), 10);
        assert_eq!(span.column_extent(), 3);

        let single = CellSpan::parse("A1").unwrap();
        assert_eq!(single.row_extent(), 1);
        assert_eq!(single.column_extent(), 1);

        // Extent always counts from A1, not from the span start
        let offset = CellSpan::parse("B3:D4").unwrap();
        assert_eq!(offset.row_extent(), 4);
        assert_eq!(offset.column_extent(), 4);

        assert_eq!(CellSpan::parse("A1:"), None);
    }
}
