//! Minimal BIFF8 workbook writer.

use std::io::{self, Cursor, Write};

use spreadsheet_to_core::CellValue;

use crate::FixtureSheet;

const BOF: u16 = 0x0809;
const EOF: u16 = 0x000A;
const BOUNDSHEET: u16 = 0x0085;
const SST: u16 = 0x00FC;
const DIMENSION: u16 = 0x0200;
const LABELSST: u16 = 0x00FD;
const LABEL: u16 = 0x0204;
const NUMBER: u16 = 0x0203;
const RK: u16 = 0x027E;
const BLANK: u16 = 0x0201;
const BOOLERR: u16 = 0x0205;

const BOF_GLOBALS: u16 = 0x0005;
const BOF_WORKSHEET: u16 = 0x0010;
const BOF_CHART: u16 = 0x0020;

const MAX_RECORD_BODY: usize = 8224;
/// Cell format index every written cell points at
const DEFAULT_XF: u16 = 15;

/// Knobs for [`xls_bytes`].
#[derive(Debug, Clone)]
pub struct XlsFixtureOptions {
    /// Write a DIMENSION record for each sheet
    pub dimension: bool,
    /// Store small integers as RK records instead of NUMBER
    pub rk_integers: bool,
    /// Store text as LABEL records instead of going through the SST
    pub inline_labels: bool,
    /// Write real BOF offsets into BOUNDSHEET; when false every offset is 0
    pub sheet_offsets: bool,
    /// Add a chart sheet with this name ahead of the worksheets
    pub chart_sheet: Option<String>,
    /// Rows and columns written to DIMENSION instead of the sheet's own size
    pub declared_size: Option<(u32, u16)>,
}

impl Default for XlsFixtureOptions {
    fn default() -> Self {
        Self {
            dimension: true,
            rk_integers: true,
            inline_labels: false,
            sheet_offsets: true,
            chart_sheet: None,
            declared_size: None,
        }
    }
}

/// Build a `.xls` file containing `sheets`.
pub fn xls_bytes(sheets: &[FixtureSheet], options: &XlsFixtureOptions) -> io::Result<Vec<u8>> {
    let stream = workbook_stream(sheets, options)?;

    let mut comp = cfb::CompoundFile::create(Cursor::new(Vec::new()))?;
    {
        let mut out = comp.create_stream("/Workbook")?;
        out.write_all(&stream)?;
        out.flush()?;
    }
    comp.flush()?;
    Ok(comp.into_inner().into_inner())
}

/// The raw BIFF8 `Workbook` stream.
fn workbook_stream(sheets: &[FixtureSheet], options: &XlsFixtureOptions) -> io::Result<Vec<u8>> {
    let mut sst = Vec::new();
    let mut bodies = Vec::new();
    if options.chart_sheet.is_some() {
        let mut chart = Vec::new();
        push_record(&mut chart, BOF, &bof_body(BOF_CHART))?;
        push_record(&mut chart, EOF, &[])?;
        bodies.push(chart);
    }
    for sheet in sheets {
        bodies.push(sheet_stream(sheet, &mut sst, options)?);
    }

    let mut entries: Vec<(&str, u8)> = Vec::new();
    if let Some(chart) = &options.chart_sheet {
        entries.push((chart.as_str(), 2));
    }
    entries.extend(sheets.iter().map(|s| (s.name.as_str(), 0)));

    // BOUNDSHEET offsets are fixed width, so the globals length does not
    // depend on their values
    let placeholder = vec![0u32; entries.len()];
    let globals_len = globals_stream(&entries, &placeholder, &sst)?.len();

    let mut offsets = Vec::with_capacity(bodies.len());
    let mut next = globals_len;
    for body in &bodies {
        offsets.push(if options.sheet_offsets { next as u32 } else { 0 });
        next += body.len();
    }

    let mut stream = globals_stream(&entries, &offsets, &sst)?;
    for body in bodies {
        stream.extend_from_slice(&body);
    }
    Ok(stream)
}

fn globals_stream(entries: &[(&str, u8)], offsets: &[u32], sst: &[String]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    push_record(&mut out, BOF, &bof_body(BOF_GLOBALS))?;

    for ((name, sheet_type), offset) in entries.iter().zip(offsets) {
        let mut body = Vec::new();
        body.extend_from_slice(&offset.to_le_bytes());
        body.push(0); // visible
        body.push(*sheet_type);
        let (flags, chars, count) = encode_chars(name);
        body.push(count as u8);
        body.push(flags);
        body.extend_from_slice(&chars);
        push_record(&mut out, BOUNDSHEET, &body)?;
    }

    if !sst.is_empty() {
        let mut body = Vec::new();
        body.extend_from_slice(&(sst.len() as u32).to_le_bytes());
        body.extend_from_slice(&(sst.len() as u32).to_le_bytes());
        for s in sst {
            body.extend_from_slice(&unicode_string(s));
        }
        push_record(&mut out, SST, &body)?;
    }

    push_record(&mut out, EOF, &[])?;
    Ok(out)
}

fn sheet_stream(
    sheet: &FixtureSheet,
    sst: &mut Vec<String>,
    options: &XlsFixtureOptions,
) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    push_record(&mut out, BOF, &bof_body(BOF_WORKSHEET))?;

    if options.dimension {
        let (rows, columns) = options
            .declared_size
            .unwrap_or((sheet.rows.len() as u32, sheet.width() as u16));
        let mut body = Vec::new();
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&rows.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&columns.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        push_record(&mut out, DIMENSION, &body)?;
    }

    for (r, row) in sheet.rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            let mut body = Vec::new();
            body.extend_from_slice(&(r as u16).to_le_bytes());
            body.extend_from_slice(&(c as u16).to_le_bytes());
            body.extend_from_slice(&DEFAULT_XF.to_le_bytes());

            let record_type = match value {
                CellValue::Empty => BLANK,
                CellValue::Number(n) => match rk_integer(*n).filter(|_| options.rk_integers) {
                    Some(rk) => {
                        body.extend_from_slice(&rk.to_le_bytes());
                        RK
                    }
                    None => {
                        body.extend_from_slice(&n.to_le_bytes());
                        NUMBER
                    }
                },
                CellValue::String(s) if options.inline_labels => {
                    body.extend_from_slice(&unicode_string(s));
                    LABEL
                }
                CellValue::String(s) => {
                    let index = match sst.iter().position(|e| e == s) {
                        Some(i) => i,
                        None => {
                            sst.push(s.clone());
                            sst.len() - 1
                        }
                    };
                    body.extend_from_slice(&(index as u32).to_le_bytes());
                    LABELSST
                }
                CellValue::Boolean(b) => {
                    body.extend_from_slice(&[u8::from(*b), 0]);
                    BOOLERR
                }
                CellValue::Error(e) => {
                    body.extend_from_slice(&[e.code(), 1]);
                    BOOLERR
                }
            };
            push_record(&mut out, record_type, &body)?;
        }
    }

    push_record(&mut out, EOF, &[])?;
    Ok(out)
}

fn bof_body(kind: u16) -> Vec<u8> {
    let mut body = Vec::with_capacity(16);
    body.extend_from_slice(&0x0600u16.to_le_bytes());
    body.extend_from_slice(&kind.to_le_bytes());
    body.extend_from_slice(&0x0DBBu16.to_le_bytes()); // build
    body.extend_from_slice(&0x07CCu16.to_le_bytes()); // year
    body.extend_from_slice(&0u32.to_le_bytes()); // file history
    body.extend_from_slice(&0x0006u32.to_le_bytes()); // lowest version
    body
}

fn push_record(out: &mut Vec<u8>, record_type: u16, body: &[u8]) -> io::Result<()> {
    if body.len() > MAX_RECORD_BODY {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("record 0x{record_type:04X} body of {} bytes needs CONTINUE records", body.len()),
        ));
    }
    out.extend_from_slice(&record_type.to_le_bytes());
    out.extend_from_slice(&(body.len() as u16).to_le_bytes());
    out.extend_from_slice(body);
    Ok(())
}

/// RK encoding for integers that fit in 30 bits
fn rk_integer(n: f64) -> Option<u32> {
    let limit = f64::from(1 << 29);
    if n.fract() == 0.0 && n > -limit && n < limit {
        Some((((n as i32) << 2) | 0x02) as u32)
    } else {
        None
    }
}

/// BIFF8 string with a 2-byte character count.
fn unicode_string(s: &str) -> Vec<u8> {
    let (flags, chars, count) = encode_chars(s);
    let mut out = Vec::with_capacity(chars.len() + 3);
    out.extend_from_slice(&(count as u16).to_le_bytes());
    out.push(flags);
    out.extend_from_slice(&chars);
    out
}

/// Returns `(flags, character bytes, character count)`, compressing to one
/// byte per character when every character fits.
fn encode_chars(s: &str) -> (u8, Vec<u8>, usize) {
    if s.chars().all(|c| (c as u32) < 0x100) {
        let bytes: Vec<u8> = s.chars().map(|c| c as u8).collect();
        let count = bytes.len();
        (0x00, bytes, count)
    } else {
        let units: Vec<u16> = s.encode_utf16().collect();
        let bytes = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        (0x01, bytes, units.len())
    }
}
