//! XLS worksheets
//!
//! A worksheet keeps the raw records of its substream. Dimensions come from
//! a cheap scan of the cell record headers when the workbook is opened; the
//! cell values themselves are decoded into rows on first access.

use std::rc::Rc;

use spreadsheet_to_core::{
    CellError, CellValue, Error, Extent, Result, Row, RowCache, RowGrid, SheetRows, Worksheet,
};

use crate::biff::parser::RecordReader;
use crate::biff::records;
use crate::biff::strings::read_unicode_string;
use crate::biff::BiffRecord;
use crate::error::{XlsError, XlsResult};

/// Largest row count a BIFF8 sheet can hold
const BIFF8_MAX_ROWS: usize = 65_536;
/// Largest column count a BIFF8 sheet can hold
const BIFF8_MAX_COLS: usize = 256;

/// A worksheet from a legacy binary workbook
#[derive(Debug)]
pub struct XlsWorksheet {
    name: String,
    origin: Rc<str>,
    records: Vec<BiffRecord>,
    sst: Rc<[String]>,
    row_count: usize,
    column_count: usize,
    cache: RowCache,
}

impl XlsWorksheet {
    pub(crate) fn new(
        name: String,
        origin: Rc<str>,
        records: Vec<BiffRecord>,
        sst: Rc<[String]>,
    ) -> XlsResult<Self> {
        let extent = sheet_extent(&records)?;
        let row_count = extent.rows.min(BIFF8_MAX_ROWS);
        let column_count = extent.columns.min(BIFF8_MAX_COLS);
        if (row_count, column_count) != (extent.rows, extent.columns) {
            log::warn!(
                "sheet '{name}': declared size {}x{} exceeds BIFF8 limits, clamping",
                extent.rows,
                extent.columns
            );
        }

        Ok(Self {
            name,
            origin,
            records,
            sst,
            row_count,
            column_count,
            cache: RowCache::new(),
        })
    }

    /// Decode every cell record into rows now instead of on first access.
    pub(crate) fn preload(&self) -> Result<()> {
        self.cache.get_or_load(|| self.load_rows()).map(|_| ())
    }

    fn load_rows(&self) -> Result<SheetRows> {
        log::debug!(
            "sheet '{}': decoding {} records into {}x{} rows",
            self.name,
            self.records.len(),
            self.row_count,
            self.column_count
        );
        let mut grid = RowGrid::new(self.row_count, self.column_count);
        decode_cells(&self.records, &self.sst, &mut grid)
            .map_err(|e| Error::open(&*self.origin, e))?;
        Ok(grid.into_rows(&self.name))
    }
}

impl Worksheet for XlsWorksheet {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn row(&self, index: usize) -> Result<&Row> {
        self.cache
            .row(index, self.row_count, || self.load_rows())
    }

    fn is_loaded(&self) -> bool {
        self.cache.is_loaded()
    }
}

/// Sheet size: the DIMENSION record combined with the positions of the
/// cell records actually present.
fn sheet_extent(records: &[BiffRecord]) -> XlsResult<Extent> {
    let mut declared = Extent::default();
    let mut seen = Extent::default();

    for rec in records {
        let mut r = RecordReader::new(rec);
        match rec.record_type {
            // DIMENSION: first_row(4) + last_row_plus1(4) + first_col(2) + last_col_plus1(2) + reserved(2)
            records::DIMENSION => {
                let _first_row = r.u32()?;
                let rows_end = r.u32()? as usize;
                let _first_col = r.u16()?;
                let cols_end = r.u16()? as usize;
                declared = Extent {
                    rows: rows_end,
                    columns: cols_end,
                };
            }
            records::LABELSST
            | records::LABEL
            | records::RSTRING
            | records::NUMBER
            | records::RK
            | records::BOOLERR
            | records::FORMULA
            | records::BLANK => {
                let row = r.u16()? as usize;
                let col = r.u16()? as usize;
                seen.include(row, col);
            }
            // MULRK / MULBLANK: row(2) + first_col(2) + ... + last_col(2)
            records::MULRK | records::MULBLANK => {
                let row = r.u16()? as usize;
                let first_col = r.u16()? as usize;
                let last_col = trailing_column(&rec.data)?;
                seen.include(row, first_col.max(last_col));
            }
            _ => {}
        }
    }

    Ok(declared.union(seen))
}

/// The last-column field that closes MULRK and MULBLANK records.
fn trailing_column(data: &[u8]) -> XlsResult<usize> {
    if data.len() < 6 {
        return Err(XlsError::Parse("multi-cell record too short".into()));
    }
    Ok(u16::from_le_bytes([data[data.len() - 2], data[data.len() - 1]]) as usize)
}

/// Decode all value-carrying cell records into `grid`.
fn decode_cells(records: &[BiffRecord], sst: &[String], grid: &mut RowGrid) -> XlsResult<()> {
    // A STRING record carries the cached text of the FORMULA right before it
    let mut pending_formula_cell: Option<(usize, usize)> = None;

    for rec in records {
        let mut r = RecordReader::new(rec);
        match rec.record_type {
            // LABELSST: row(2) + col(2) + xf(2) + sst_index(4)
            records::LABELSST => {
                let (row, col) = cell_header(&mut r)?;
                let sst_idx = r.u32()? as usize;
                match sst.get(sst_idx) {
                    Some(s) => grid.set(row, col, CellValue::string(s.as_str())),
                    None => log::warn!("cell ({row}, {col}) references missing SST entry {sst_idx}"),
                }
                pending_formula_cell = None;
            }
            // LABEL / RSTRING: row(2) + col(2) + xf(2) + unicode_string (+ runs)
            records::LABEL | records::RSTRING => {
                let (row, col) = cell_header(&mut r)?;
                let text = read_unicode_string(&mut r)?;
                grid.set(row, col, CellValue::String(text));
                pending_formula_cell = None;
            }
            // NUMBER: row(2) + col(2) + xf(2) + f64(8)
            records::NUMBER => {
                let (row, col) = cell_header(&mut r)?;
                grid.set(row, col, CellValue::Number(r.f64()?));
                pending_formula_cell = None;
            }
            // RK: row(2) + col(2) + xf(2) + rk(4)
            records::RK => {
                let (row, col) = cell_header(&mut r)?;
                grid.set(row, col, CellValue::Number(r.rk()?));
                pending_formula_cell = None;
            }
            // MULRK: row(2) + first_col(2) + [xf(2) + rk(4)]* + last_col(2)
            records::MULRK => {
                let row = r.u16()? as usize;
                let first_col = r.u16()? as usize;
                let last_col = trailing_column(&rec.data)?;
                let rk_data_end = rec.data.len() - 2;

                let mut col = first_col;
                while r.pos() + 6 <= rk_data_end && col <= last_col {
                    let _xf = r.u16()?;
                    grid.set(row, col, CellValue::Number(r.rk()?));
                    col += 1;
                }
                pending_formula_cell = None;
            }
            // BOOLERR: row(2) + col(2) + xf(2) + value(1) + is_error(1)
            records::BOOLERR => {
                let (row, col) = cell_header(&mut r)?;
                let val = r.u8()?;
                let is_error = r.u8()?;
                let value = if is_error != 0 {
                    CellValue::Error(CellError::from_code(val))
                } else {
                    CellValue::Boolean(val != 0)
                };
                grid.set(row, col, value);
                pending_formula_cell = None;
            }
            records::FORMULA => {
                let (row, col) = cell_header(&mut r)?;
                match formula_result(r.bytes(8)?) {
                    FormulaResult::Value(value) => {
                        grid.set(row, col, value);
                        pending_formula_cell = None;
                    }
                    FormulaResult::StringFollows => {
                        pending_formula_cell = Some((row, col));
                    }
                }
            }
            records::STRING => {
                if let Some((row, col)) = pending_formula_cell.take() {
                    let text = read_unicode_string(&mut r)?;
                    grid.set(row, col, CellValue::String(text));
                }
            }
            records::BLANK | records::MULBLANK => {
                pending_formula_cell = None;
            }
            _ => {
                // Formatting and structural records carry no values
            }
        }
    }

    Ok(())
}

/// Read the `row(2) + col(2) + xf(2)` prefix shared by single-cell records.
fn cell_header(r: &mut RecordReader<'_>) -> XlsResult<(usize, usize)> {
    let row = r.u16()? as usize;
    let col = r.u16()? as usize;
    let _xf = r.u16()?;
    Ok((row, col))
}

enum FormulaResult {
    Value(CellValue),
    /// The cached result is text, stored in the next STRING record
    StringFollows,
}

/// Decode the 8-byte cached result of a FORMULA record.
///
/// When bytes 6-7 are 0xFFFF the first byte is a type tag; otherwise the
/// field is an IEEE 754 double.
fn formula_result(bytes: &[u8]) -> FormulaResult {
    if bytes[6] == 0xFF && bytes[7] == 0xFF {
        match bytes[0] {
            0x00 => FormulaResult::StringFollows,
            0x01 => FormulaResult::Value(CellValue::Boolean(bytes[2] != 0)),
            0x02 => FormulaResult::Value(CellValue::Error(CellError::from_code(bytes[2]))),
            // 0x03 is an empty string result; anything else is unknown
            _ => FormulaResult::Value(CellValue::Empty),
        }
    } else {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        FormulaResult::Value(CellValue::Number(f64::from_le_bytes(raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(record_type: u16, data: Vec<u8>) -> BiffRecord {
        BiffRecord {
            record_type,
            data,
            continues: Vec::new(),
            stream_offset: 0,
        }
    }

    fn header(row: u16, col: u16) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&row.to_le_bytes());
        v.extend_from_slice(&col.to_le_bytes());
        v.extend_from_slice(&15u16.to_le_bytes());
        v
    }

    fn number(row: u16, col: u16, value: f64) -> BiffRecord {
        let mut data = header(row, col);
        data.extend_from_slice(&value.to_le_bytes());
        rec(records::NUMBER, data)
    }

    fn formula(row: u16, col: u16, result: [u8; 8]) -> BiffRecord {
        let mut data = header(row, col);
        data.extend_from_slice(&result);
        data.extend_from_slice(&[0; 6]); // options + reserved
        data.extend_from_slice(&[0; 2]); // empty token array
        rec(records::FORMULA, data)
    }

    fn sheet(records: Vec<BiffRecord>, sst: &[&str]) -> XlsWorksheet {
        let sst: Vec<String> = sst.iter().map(|s| s.to_string()).collect();
        XlsWorksheet::new("Test".into(), Rc::from("test.xls"), records, Rc::from(sst)).unwrap()
    }

    #[test]
    fn test_extent_uses_cells_when_dimension_missing() {
        let ws = sheet(vec![number(0, 0, 1.0), number(4, 2, 2.0)], &[]);
        assert_eq!(ws.row_count(), 5);
        assert_eq!(ws.column_count(), 3);
        assert!(!ws.is_loaded());
    }

    #[test]
    fn test_extent_from_dimension() {
        let mut dim = Vec::new();
        dim.extend_from_slice(&0u32.to_le_bytes());
        dim.extend_from_slice(&7u32.to_le_bytes());
        dim.extend_from_slice(&0u16.to_le_bytes());
        dim.extend_from_slice(&4u16.to_le_bytes());
        dim.extend_from_slice(&0u16.to_le_bytes());
        let ws = sheet(vec![rec(records::DIMENSION, dim), number(1, 1, 1.0)], &[]);
        assert_eq!((ws.row_count(), ws.column_count()), (7, 4));
    }

    #[test]
    fn test_decode_mulrk_and_sst() {
        let mut mulrk = Vec::new();
        mulrk.extend_from_slice(&0u16.to_le_bytes()); // row
        mulrk.extend_from_slice(&1u16.to_le_bytes()); // first col
        for value in [10u32, 20u32] {
            mulrk.extend_from_slice(&15u16.to_le_bytes());
            mulrk.extend_from_slice(&((value << 2) | 0x02).to_le_bytes());
        }
        mulrk.extend_from_slice(&2u16.to_le_bytes()); // last col

        let mut label = header(0, 0);
        label.extend_from_slice(&1u32.to_le_bytes());

        let ws = sheet(
            vec![rec(records::LABELSST, label), rec(records::MULRK, mulrk)],
            &["zero", "one"],
        );
        assert_eq!(ws.column_count(), 3);
        assert_eq!(
            ws.row(1).unwrap().values(),
            &[CellValue::string("one"), CellValue::Number(10.0), CellValue::Number(20.0)]
        );
        assert!(ws.is_loaded());
    }

    #[test]
    fn test_decode_boolerr() {
        let mut boolean = header(0, 0);
        boolean.extend_from_slice(&[1, 0]);
        let mut error = header(0, 1);
        error.extend_from_slice(&[0x07, 1]);

        let ws = sheet(
            vec![rec(records::BOOLERR, boolean), rec(records::BOOLERR, error)],
            &[],
        );
        assert_eq!(
            ws.row(1).unwrap().values(),
            &[CellValue::Boolean(true), CellValue::Error(CellError::Div0)]
        );
    }

    #[test]
    fn test_decode_formula_results() {
        let mut string_rec = Vec::new();
        string_rec.extend_from_slice(&[0x03, 0x00, 0x00]);
        string_rec.extend_from_slice(b"abc");

        let ws = sheet(
            vec![
                formula(0, 0, 6.5_f64.to_le_bytes()),
                formula(0, 1, [0x00, 0, 0, 0, 0, 0, 0xFF, 0xFF]),
                rec(records::STRING, string_rec),
                formula(0, 2, [0x01, 0, 1, 0, 0, 0, 0xFF, 0xFF]),
                formula(0, 3, [0x03, 0, 0, 0, 0, 0, 0xFF, 0xFF]),
            ],
            &[],
        );
        assert_eq!(
            ws.row(1).unwrap().values(),
            &[
                CellValue::Number(6.5),
                CellValue::string("abc"),
                CellValue::Boolean(true),
                CellValue::Empty,
            ]
        );
    }

    #[test]
    fn test_row_index_bounds() {
        let ws = sheet(vec![number(0, 0, 1.0)], &[]);
        assert!(ws.row(0).unwrap_err().is_invalid_index());
        assert!(ws.row(2).unwrap_err().is_invalid_index());
        assert!(!ws.is_loaded());
    }

    #[test]
    fn test_empty_sheet() {
        let ws = sheet(Vec::new(), &[]);
        assert_eq!((ws.row_count(), ws.column_count()), (0, 0));
        assert!(ws.row(1).unwrap_err().is_invalid_index());
    }

    #[test]
    fn test_truncated_cell_record_fails_on_load() {
        let mut bad = header(0, 0);
        bad.extend_from_slice(&[0, 0, 0]); // NUMBER needs 8 value bytes
        let ws = sheet(vec![rec(records::NUMBER, bad)], &[]);
        let err = ws.row(1).unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        assert!(!ws.is_loaded());
    }
}
