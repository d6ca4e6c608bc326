//! XLS (BIFF8) reader.
//!
//! Opens a Compound File Binary (CFB/OLE2) container, reads the `Workbook`
//! stream into memory, and splits it into the globals substream and one
//! substream per worksheet. The container file is closed before `open`
//! returns.

use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use spreadsheet_to_core::{
    Error, Format, OpenOptions, Result, RowLoading, SheetList, Workbook, Worksheet,
};

use crate::biff::parser::RecordReader;
use crate::biff::records;
use crate::biff::strings::{parse_sst, read_short_string};
use crate::biff::{self, BiffRecord, Substream};
use crate::error::{XlsError, XlsResult};
use crate::sheet::XlsWorksheet;

/// Label used in errors for workbooks that were not read from a file
const MEMORY_SOURCE: &str = "<memory>";

/// Metadata for a sheet parsed from the BOUNDSHEET record.
#[derive(Debug)]
struct SheetInfo {
    /// Absolute byte offset of the sheet's BOF in the Workbook stream.
    offset: u32,
    /// Sheet type: 0 = worksheet, 2 = chart, 6 = macro/VBA.
    sheet_type: u8,
    /// Sheet name.
    name: String,
}

/// A legacy binary (.xls) workbook.
#[derive(Debug)]
pub struct XlsWorkbook {
    source: Option<PathBuf>,
    sheets: SheetList<XlsWorksheet>,
}

impl XlsWorkbook {
    /// Open an XLS file from a filesystem path.
    pub fn open<P: AsRef<Path>>(path: P, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        let label: Rc<str> = Rc::from(path.display().to_string());
        log::debug!("opening xls workbook {label}");

        let file = std::fs::File::open(path).map_err(|e| Error::open(&*label, e))?;
        let mut book = Self::load(file, label, options)?;
        book.source = Some(path.to_path_buf());
        Ok(book)
    }

    /// Read an XLS workbook from any `Read + Seek` source.
    pub fn from_reader<R: Read + Seek>(reader: R, options: &OpenOptions) -> Result<Self> {
        Self::load(reader, Rc::from(MEMORY_SOURCE), options)
    }

    fn load<R: Read + Seek>(reader: R, label: Rc<str>, options: &OpenOptions) -> Result<Self> {
        let sheets = read_sheets(reader, &label).map_err(|e| Error::open(&*label, e))?;

        let mut list = SheetList::new();
        for sheet in sheets {
            list.push(sheet);
        }

        let book = Self {
            source: None,
            sheets: list,
        };
        if options.rows == RowLoading::Eager {
            for sheet in book.sheets.iter() {
                sheet.preload()?;
            }
        }
        Ok(book)
    }
}

impl Workbook for XlsWorkbook {
    fn format(&self) -> Format {
        Format::Xls
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    fn worksheet(&self, index: usize) -> Option<&dyn Worksheet> {
        self.sheets.get(index).map(|s| s as &dyn Worksheet)
    }

    fn worksheet_by_name(&self, name: &str) -> Option<&dyn Worksheet> {
        self.sheets.by_name(name).map(|s| s as &dyn Worksheet)
    }
}

/// Read the whole `Workbook` stream out of the CFB container.
fn read_stream<R: Read + Seek>(reader: R) -> XlsResult<Vec<u8>> {
    let mut cfb = cfb::CompoundFile::open(reader)?;

    let stream_path = if cfb.exists("/Workbook") {
        "/Workbook"
    } else if cfb.exists("/Book") {
        // BIFF5 stream name
        "/Book"
    } else {
        return Err(XlsError::InvalidFormat(
            "no Workbook or Book stream found in CFB".into(),
        ));
    };

    let mut stream_data = Vec::new();
    let mut stream = cfb.open_stream(stream_path)?;
    stream.read_to_end(&mut stream_data)?;
    Ok(stream_data)
}

fn read_sheets<R: Read + Seek>(reader: R, label: &Rc<str>) -> XlsResult<Vec<XlsWorksheet>> {
    let stream_data = read_stream(reader)?;
    let all_records = biff::read_all_records(&mut Cursor::new(&stream_data))?;
    let mut substreams = biff::split_substreams(all_records)?.into_iter();

    // Phase 1: workbook globals
    let globals = match substreams.next() {
        Some(sub) if sub.kind == records::BOF_WORKBOOK_GLOBALS => sub,
        _ => {
            return Err(XlsError::InvalidFormat(
                "no workbook globals BOF found".into(),
            ))
        }
    };
    if globals.version != records::BIFF8_VERSION {
        return Err(XlsError::UnsupportedVersion(format!(
            "expected BIFF8 (0x0600), got 0x{:04X}",
            globals.version
        )));
    }

    let mut sst: Vec<String> = Vec::new();
    let mut infos: Vec<SheetInfo> = Vec::new();
    for rec in &globals.records {
        match rec.record_type {
            records::SST => sst = parse_sst(&mut RecordReader::new(rec))?,
            records::BOUNDSHEET => infos.push(parse_boundsheet(rec)?),
            _ => {}
        }
    }
    log::debug!(
        "{label}: {} sheet entries, {} shared strings",
        infos.len(),
        sst.len()
    );

    // Phase 2: match every worksheet entry to its substream
    let mut bodies: Vec<Option<Substream>> = substreams.map(Some).collect();
    let sst: Rc<[String]> = Rc::from(sst);
    let mut sheets = Vec::new();

    for (ordinal, info) in infos.into_iter().enumerate() {
        let slot = bodies
            .iter()
            .position(|b| matches!(b, Some(sub) if sub.offset == u64::from(info.offset)))
            .or_else(|| {
                log::debug!(
                    "sheet '{}': no substream at offset {}, using position {ordinal}",
                    info.name,
                    info.offset
                );
                bodies.get(ordinal).filter(|b| b.is_some()).map(|_| ordinal)
            });
        let body = slot.and_then(|i| bodies[i].take());

        if info.sheet_type != records::SHEET_TYPE_WORKSHEET {
            log::debug!(
                "skipping sheet '{}' of type {}",
                info.name,
                info.sheet_type
            );
            continue;
        }

        let records = match body {
            Some(sub) => sub.records,
            None => {
                log::warn!("sheet '{}' has no substream, treating it as empty", info.name);
                Vec::new()
            }
        };
        sheets.push(XlsWorksheet::new(
            info.name,
            Rc::clone(label),
            records,
            Rc::clone(&sst),
        )?);
    }

    Ok(sheets)
}

/// Parse a BOUNDSHEET record.
///
/// Layout: offset(4) + visibility(1) + type(1) + name (short unicode string)
fn parse_boundsheet(rec: &BiffRecord) -> XlsResult<SheetInfo> {
    let mut r = RecordReader::new(rec);
    let offset = r.u32()?;
    let _visibility = r.u8()?;
    let sheet_type = r.u8()?;
    let name = read_short_string(&mut r)?;

    Ok(SheetInfo {
        offset,
        sheet_type,
        name,
    })
}
