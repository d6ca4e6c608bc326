//! XLSX worksheets
//!
//! Each worksheet keeps a handle to the workbook's open archive. Opening a
//! sheet reads only the head of its part, up to `<sheetData>`, to find the
//! declared `<dimension>`. Cell data is parsed on the first row access.

use std::cell::RefCell;
use std::fmt;
use std::io::{BufRead, BufReader, Read, Seek};
use std::rc::Rc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use spreadsheet_to_core::{
    CellError, CellRef, CellSpan, CellValue, Error, Extent, Result, Row, RowCache, RowGrid,
    SheetRows, Worksheet,
};
use zip::ZipArchive;

use crate::error::{XlsxError, XlsxResult};
use crate::strings::decode_excel_escapes;

/// The archive shared by a workbook and all of its worksheets
pub(crate) type SharedArchive<R> = Rc<RefCell<ZipArchive<R>>>;

/// A worksheet from an Office Open XML workbook
pub struct XlsxWorksheet<R> {
    name: Option<String>,
    part: String,
    origin: Rc<str>,
    archive: SharedArchive<R>,
    shared_strings: Rc<[String]>,
    row_count: usize,
    column_count: usize,
    cache: RowCache,
}

impl<R: Read + Seek> XlsxWorksheet<R> {
    pub(crate) fn open(
        name: Option<String>,
        part: String,
        origin: Rc<str>,
        archive: SharedArchive<R>,
        shared_strings: Rc<[String]>,
    ) -> XlsxResult<Self> {
        let declared = read_dimension(&mut *archive.borrow_mut(), &part)?;

        let mut sheet = Self {
            name,
            part,
            origin,
            archive,
            shared_strings,
            row_count: 0,
            column_count: 0,
            cache: RowCache::new(),
        };

        match declared {
            Some(span) => {
                sheet.row_count = span.row_extent();
                sheet.column_count = span.column_extent();
            }
            None => {
                // No usable size on record: the cells themselves decide it
                log::debug!("{}: no dimension, reading cells to size the sheet", sheet.label());
                let rows = sheet.scan_rows()?;
                sheet.row_count = rows.len();
                sheet.column_count = rows.column_count();
                sheet.cache = RowCache::with_rows(rows);
            }
        }

        Ok(sheet)
    }

    /// Parse every cell now instead of on first access.
    pub(crate) fn preload(&self) -> Result<()> {
        self.cache.get_or_load(|| self.load_rows()).map(|_| ())
    }

    /// Archive path of the sheet part
    pub fn part(&self) -> &str {
        &self.part
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.part)
    }

    fn load_rows(&self) -> Result<SheetRows> {
        log::debug!(
            "{}: reading {}x{} cells from {}",
            self.label(),
            self.row_count,
            self.column_count,
            self.part
        );
        let mut grid = RowGrid::new(self.row_count, self.column_count);
        read_cells(
            &mut *self.archive.borrow_mut(),
            &self.part,
            &self.shared_strings,
            &mut |row, col, value| grid.set(row, col, value),
        )
        .map_err(|e| Error::open(&*self.origin, e))?;
        Ok(grid.into_rows(self.label()))
    }

    /// Read all cells and size the sheet from the furthest one.
    fn scan_rows(&self) -> XlsxResult<SheetRows> {
        let mut cells = Vec::new();
        let mut extent = Extent::default();
        read_cells(
            &mut *self.archive.borrow_mut(),
            &self.part,
            &self.shared_strings,
            &mut |row, col, value| {
                extent.include(row, col);
                cells.push((row, col, value));
            },
        )?;

        let mut grid = RowGrid::new(extent.rows, extent.columns);
        for (row, col, value) in cells {
            grid.set(row, col, value);
        }
        Ok(grid.into_rows(self.label()))
    }
}

impl<R: Read + Seek> Worksheet for XlsxWorksheet<R> {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn row(&self, index: usize) -> Result<&Row> {
        self.cache.row(index, self.row_count, || self.load_rows())
    }

    fn is_loaded(&self) -> bool {
        self.cache.is_loaded()
    }
}

impl<R> fmt::Debug for XlsxWorksheet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XlsxWorksheet")
            .field("name", &self.name)
            .field("part", &self.part)
            .field("row_count", &self.row_count)
            .field("column_count", &self.column_count)
            .field("loaded", &self.cache.is_loaded())
            .finish()
    }
}

fn open_part<'a, R: Read + Seek>(
    archive: &'a mut ZipArchive<R>,
    part: &str,
) -> XlsxResult<impl BufRead + 'a> {
    let file = archive
        .by_name(part)
        .map_err(|_| XlsxError::MissingPart(part.to_string()))?;
    Ok(BufReader::new(file))
}

/// The span declared by `<dimension ref>`, if it is usable.
///
/// Excel writes `A1` for empty sheets too, so a single-cell `A1` span is
/// treated the same as a missing element.
fn read_dimension<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
) -> XlsxResult<Option<CellSpan>> {
    scan_dimension(open_part(archive, part)?, part)
}

fn scan_dimension<B: BufRead>(input: B, part: &str) -> XlsxResult<Option<CellSpan>> {
    let mut xml_reader = Reader::from_reader(input);
    xml_reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"dimension" => {
                    let Some(reference) = attribute(&e, b"ref")? else {
                        return Ok(None);
                    };
                    return Ok(match CellSpan::parse(&reference) {
                        Some(span) if span.end == CellRef::new(0, 0) => None,
                        Some(span) => Some(span),
                        None => {
                            log::warn!("{part}: ignoring unreadable dimension '{reference}'");
                            None
                        }
                    });
                }
                b"sheetData" => return Ok(None),
                _ => {}
            },
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> XlsxResult<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Position and raw content of the `<c>` element being read.
#[derive(Debug, Default)]
struct PendingCell {
    row: usize,
    col: usize,
    cell_type: Option<String>,
    value: Option<String>,
    inline: Option<String>,
}

/// Tracks where cells without an `r` attribute land.
#[derive(Debug, Default)]
struct Position {
    row: usize,
    next_row: usize,
    next_col: usize,
}

impl Position {
    fn start_row(&mut self, e: &BytesStart<'_>) -> XlsxResult<()> {
        let declared = attribute(e, b"r")?
            .and_then(|r| r.parse::<usize>().ok())
            .filter(|&r| r > 0);
        self.row = declared.map_or(self.next_row, |r| r - 1);
        self.next_row = self.row + 1;
        self.next_col = 0;
        Ok(())
    }

    fn start_cell(&mut self, e: &BytesStart<'_>) -> XlsxResult<PendingCell> {
        let mut cell = PendingCell {
            row: self.row,
            col: self.next_col,
            ..Default::default()
        };
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => {
                    let reference = attr.unescape_value()?;
                    match CellRef::parse(&reference) {
                        Some(r) => {
                            cell.row = r.row as usize;
                            cell.col = r.col as usize;
                        }
                        None => log::warn!("ignoring malformed cell reference '{reference}'"),
                    }
                }
                b"t" => cell.cell_type = Some(attr.unescape_value()?.into_owned()),
                _ => {}
            }
        }
        self.next_col = cell.col + 1;
        Ok(cell)
    }
}

/// Stream every cell of a sheet part into `sink` as `(row0, col0, value)`.
fn read_cells<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    shared_strings: &[String],
    sink: &mut dyn FnMut(usize, usize, CellValue),
) -> XlsxResult<()> {
    parse_cells(open_part(archive, part)?, shared_strings, sink)
}

fn parse_cells<B: BufRead>(
    input: B,
    shared_strings: &[String],
    sink: &mut dyn FnMut(usize, usize, CellValue),
) -> XlsxResult<()> {
    let mut xml_reader = Reader::from_reader(input);
    let mut buf = Vec::new();

    let mut position = Position::default();
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline = false;
    let mut in_inline_text = false;
    let mut in_phonetic = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => position.start_row(&e)?,
                b"c" => cell = Some(position.start_cell(&e)?),
                b"v" if cell.is_some() => in_value = true,
                b"is" if cell.is_some() => in_inline = true,
                b"rPh" if in_inline => in_phonetic = true,
                b"t" if in_inline && !in_phonetic => {
                    in_inline_text = true;
                    if let Some(c) = cell.as_mut() {
                        c.inline.get_or_insert_with(String::new);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => position.start_row(&e)?,
                b"c" => {
                    let empty = position.start_cell(&e)?;
                    sink(empty.row, empty.col, CellValue::Empty);
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_value || in_inline_text => {
                let text = e.unescape()?;
                if let Some(c) = cell.as_mut() {
                    let target = if in_value { &mut c.value } else { &mut c.inline };
                    target.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(done) = cell.take() {
                        let value = cell_value(&done, shared_strings)?;
                        sink(done.row, done.col, value);
                    }
                    in_value = false;
                    in_inline = false;
                    in_inline_text = false;
                    in_phonetic = false;
                }
                b"v" => in_value = false,
                b"is" => in_inline = false,
                b"rPh" => in_phonetic = false,
                b"t" => in_inline_text = false,
                b"sheetData" => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Interpret a finished `<c>` element according to its `t` attribute.
fn cell_value(cell: &PendingCell, shared_strings: &[String]) -> XlsxResult<CellValue> {
    let cell_type = cell.cell_type.as_deref();

    if cell_type == Some("inlineStr") {
        if let Some(text) = cell.inline.as_deref() {
            return Ok(CellValue::String(decode_excel_escapes(text)));
        }
    }

    let Some(raw) = cell.value.as_deref() else {
        return Ok(CellValue::Empty);
    };

    let value = match cell_type {
        Some("s") => {
            let idx: usize = raw.trim().parse().map_err(|_| {
                XlsxError::Parse(format!("invalid shared string index: {raw}"))
            })?;
            let s = shared_strings.get(idx).ok_or_else(|| {
                XlsxError::Parse(format!("shared string index {idx} out of bounds"))
            })?;
            CellValue::String(s.clone())
        }
        Some("b") => CellValue::Boolean(raw == "1" || raw.eq_ignore_ascii_case("true")),
        Some("e") => CellError::from_literal(raw)
            .map(CellValue::Error)
            .unwrap_or_else(|| CellValue::String(raw.to_string())),
        Some("str") | Some("inlineStr") => CellValue::String(decode_excel_escapes(raw)),
        None | Some("n") => match raw.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::String(raw.to_string()),
        },
        // ISO 8601 dates ("d") and unknown types keep their raw text
        Some(_) => CellValue::String(raw.to_string()),
    };
    Ok(value)
}
