//! XLSX reader

use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use spreadsheet_to_core::{
    Error, Format, OpenOptions, Result, RowLoading, SheetList, Workbook, Worksheet,
};
use zip::ZipArchive;

use crate::error::{XlsxError, XlsxResult};
use crate::package::{check_content_types, read_workbook_rels, read_workbook_xml};
use crate::sheet::XlsxWorksheet;
use crate::strings::read_shared_strings;

/// Label used in errors for workbooks that were not read from a file
const MEMORY_SOURCE: &str = "<memory>";

/// An Office Open XML (.xlsx) workbook.
///
/// The archive stays open until the workbook is dropped.
pub struct XlsxWorkbook<R = BufReader<File>> {
    source: Option<PathBuf>,
    sheets: SheetList<XlsxWorksheet<R>>,
}

impl XlsxWorkbook {
    /// Open an XLSX file from a filesystem path.
    pub fn open<P: AsRef<Path>>(path: P, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        let label: Rc<str> = Rc::from(path.display().to_string());
        log::debug!("opening xlsx workbook {label}");

        let file = File::open(path).map_err(|e| Error::open(&*label, e))?;
        let mut book = Self::load(BufReader::new(file), label, options)?;
        book.source = Some(path.to_path_buf());
        Ok(book)
    }
}

impl<R: Read + Seek> XlsxWorkbook<R> {
    /// Read an XLSX workbook from any `Read + Seek` source.
    pub fn from_reader(reader: R, options: &OpenOptions) -> Result<Self> {
        Self::load(reader, Rc::from(MEMORY_SOURCE), options)
    }

    fn load(reader: R, label: Rc<str>, options: &OpenOptions) -> Result<Self> {
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

impl<R: Read + Seek> Workbook for XlsxWorkbook<R> {
    fn format(&self) -> Format {
        Format::Xlsx
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

impl<R: Read + Seek> fmt::Debug for XlsxWorkbook<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XlsxWorkbook")
            .field("source", &self.source)
            .field("sheets", &self.sheets.iter().collect::<Vec<_>>())
            .finish()
    }
}

fn read_sheets<R: Read + Seek>(reader: R, label: &Rc<str>) -> XlsxResult<Vec<XlsxWorksheet<R>>> {
    let mut archive = ZipArchive::new(reader)?;
    check_content_types(&mut archive)?;

    let shared_strings: Rc<[String]> = Rc::from(read_shared_strings(&mut archive)?);
    let entries = read_workbook_xml(&mut archive)?;
    let paths = read_workbook_rels(&mut archive)?;
    log::debug!(
        "{label}: {} sheets, {} shared strings",
        entries.len(),
        shared_strings.len()
    );

    let archive = Rc::new(RefCell::new(archive));
    let mut sheets = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let part = entry
            .r_id
            .as_ref()
            .and_then(|id| paths.get(id))
            .cloned()
            .ok_or_else(|| {
                XlsxError::InvalidFormat(format!(
                    "sheet {} ({}) has no worksheet part",
                    position + 1,
                    entry.name.as_deref().unwrap_or("unnamed")
                ))
            })?;

        sheets.push(XlsxWorksheet::open(
            entry.name,
            part,
            Rc::clone(label),
            Rc::clone(&archive),
            Rc::clone(&shared_strings),
        )?);
    }

    Ok(sheets)
}
