//! BIFF8 (Binary Interchange File Format) handling.
//!
//! A BIFF8 stream is a sequence of records, each with a 4-byte header
//! (2 bytes record type + 2 bytes body length) followed by the body.
//!
//! CONTINUE records (type 0x003C) extend the body of the preceding record
//! beyond the 8224-byte per-record limit. They are merged into their parent
//! here, but the positions where each continuation started are kept because
//! strings in the SST change encoding at those boundaries.

pub mod parser;
pub mod records;
pub mod strings;

use crate::error::{XlsError, XlsResult};
use std::io::{Read, Seek};

/// A single BIFF8 record (with CONTINUE bodies already merged).
#[derive(Debug, Clone)]
pub struct BiffRecord {
    /// Record type ID (e.g. `records::SST`, `records::NUMBER`).
    pub record_type: u16,
    /// Record body bytes (CONTINUE records have been concatenated).
    pub data: Vec<u8>,
    /// Offsets into `data` where a CONTINUE body begins.
    pub continues: Vec<usize>,
    /// Byte offset of this record's header in the stream.
    pub stream_offset: u64,
}

/// Reads all BIFF8 records from a byte stream, merging CONTINUE records
/// into their parent.
pub fn read_all_records<R: Read + Seek>(stream: &mut R) -> XlsResult<Vec<BiffRecord>> {
    let mut records: Vec<BiffRecord> = Vec::new();
    let mut header_buf = [0u8; 4];

    loop {
        let stream_offset = stream.stream_position()?;

        match stream.read_exact(&mut header_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(XlsError::Io(e)),
        }

        let record_type = u16::from_le_bytes([header_buf[0], header_buf[1]]);
        let body_len = u16::from_le_bytes([header_buf[2], header_buf[3]]) as usize;

        let mut body = vec![0u8; body_len];
        if body_len > 0 {
            stream.read_exact(&mut body).map_err(|e| {
                XlsError::InvalidFormat(format!(
                    "record 0x{record_type:04X} at offset {stream_offset} is truncated: {e}"
                ))
            })?;
        }

        if record_type == records::CONTINUE {
            match records.last_mut() {
                Some(prev) => {
                    prev.continues.push(prev.data.len());
                    prev.data.extend_from_slice(&body);
                }
                None => log::debug!("dropping orphaned CONTINUE at offset {stream_offset}"),
            }
        } else {
            records.push(BiffRecord {
                record_type,
                data: body,
                continues: Vec::new(),
                stream_offset,
            });
        }
    }

    Ok(records)
}

/// Extract the BOF record fields from a record body.
///
/// Returns `(version, substream_type)`.
/// - `version` should be `0x0600` for BIFF8
/// - `substream_type`: 0x0005 = workbook globals, 0x0010 = worksheet, etc.
pub fn parse_bof(data: &[u8]) -> XlsResult<(u16, u16)> {
    if data.len() < 4 {
        return Err(XlsError::InvalidFormat("BOF record too short".into()));
    }
    let version = u16::from_le_bytes([data[0], data[1]]);
    let dt = u16::from_le_bytes([data[2], data[3]]);
    Ok((version, dt))
}

/// One BOF..EOF section of the workbook stream.
#[derive(Debug)]
pub struct Substream {
    /// Stream offset of the opening BOF record
    pub offset: u64,
    /// `dt` field of the opening BOF
    pub kind: u16,
    /// BIFF version of the opening BOF
    pub version: u16,
    /// Records between BOF and EOF, excluding both; nested substreams
    /// (embedded charts) are left in place
    pub records: Vec<BiffRecord>,
}

/// Split a record list into its top-level substreams.
///
/// Records outside any BOF..EOF pair are discarded. A substream missing its
/// EOF is closed at the end of the stream.
pub fn split_substreams(records: Vec<BiffRecord>) -> XlsResult<Vec<Substream>> {
    let mut substreams: Vec<Substream> = Vec::new();
    let mut current: Option<Substream> = None;
    let mut depth = 0usize;

    for rec in records {
        match rec.record_type {
            records::BOF => {
                if depth == 0 {
                    let (version, kind) = parse_bof(&rec.data)?;
                    current = Some(Substream {
                        offset: rec.stream_offset,
                        kind,
                        version,
                        records: Vec::new(),
                    });
                } else if let Some(sub) = current.as_mut() {
                    sub.records.push(rec);
                }
                depth += 1;
            }
            records::EOF if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    substreams.extend(current.take());
                } else if let Some(sub) = current.as_mut() {
                    sub.records.push(rec);
                }
            }
            _ => {
                if let Some(sub) = current.as_mut() {
                    sub.records.push(rec);
                }
            }
        }
    }

    if let Some(sub) = current {
        log::warn!("substream at offset {} has no EOF record", sub.offset);
        substreams.push(sub);
    }

    Ok(substreams)
}
